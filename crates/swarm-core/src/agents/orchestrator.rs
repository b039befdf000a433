//! Swarm orchestrator
//!
//! Coordinates many sub-agents with concurrency controls: single swarm
//! operations fan one task out across the registry (or a target subset),
//! mass swarm operations run a batch of tasks with an independent
//! task-level concurrency cap. Each operation yields a structured report
//! and appends a compact entry to the context's `swarm_history`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::registry::SubAgentRegistry;
use super::strategy::{run_parallel, run_sequential, DispatchPolicy, Target};
use super::types::{SubAgent, SwarmStrategy};
use crate::config::{normalize_timeout, SwarmConfig};
use crate::context::{AgentContext, SWARM_HISTORY_KEY};
use crate::metrics::{
    MassSwarmMetrics, MetricsHistory, MetricsSink, SwarmMetrics, TracingMetricsSink,
};
use crate::report::{HistoryEntry, MassSwarmReport, SwarmReport};
use crate::{Error, Result};

/// Per-call overrides for one swarm operation.
///
/// Every `None` field falls back to the orchestrator's construction-time
/// configuration for that call only.
#[derive(Debug, Clone, Default)]
pub struct SwarmOptions {
    /// Restrict the fan-out to these agents, in the given order
    pub target_agents: Option<Vec<String>>,
    /// Per-agent task overrides replacing the common task
    pub sub_tasks: Option<HashMap<String, String>>,
    pub strategy: Option<SwarmStrategy>,
    pub max_concurrency: Option<usize>,
    /// Per-attempt timeout override in seconds; <= 0 disables the timeout
    pub timeout: Option<f64>,
    pub retries: Option<u32>,
    pub fail_fast: Option<bool>,
}

impl SwarmOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_agents = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn sub_task(mut self, agent: impl Into<String>, task: impl Into<String>) -> Self {
        self.sub_tasks
            .get_or_insert_with(HashMap::new)
            .insert(agent.into(), task.into());
        self
    }

    pub fn strategy(mut self, strategy: SwarmStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn max_concurrency(mut self, cap: usize) -> Self {
        self.max_concurrency = Some(cap);
        self
    }

    pub fn timeout(mut self, secs: f64) -> Self {
        self.timeout = Some(secs);
        self
    }

    /// Disable the per-attempt timeout for this call
    pub fn no_timeout(self) -> Self {
        self.timeout(0.0)
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = Some(fail_fast);
        self
    }
}

/// Per-call overrides for a mass swarm operation
#[derive(Debug, Clone)]
pub struct MassSwarmOptions {
    /// Settings forwarded to every per-task swarm
    pub swarm: SwarmOptions,
    /// Run per-task swarms concurrently (bounded by the task cap)
    pub parallel_tasks: bool,
    pub max_task_concurrency: Option<usize>,
}

impl Default for MassSwarmOptions {
    fn default() -> Self {
        Self {
            swarm: SwarmOptions::default(),
            parallel_tasks: true,
            max_task_concurrency: None,
        }
    }
}

impl MassSwarmOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn swarm(mut self, options: SwarmOptions) -> Self {
        self.swarm = options;
        self
    }

    pub fn parallel_tasks(mut self, parallel: bool) -> Self {
        self.parallel_tasks = parallel;
        self
    }

    pub fn max_task_concurrency(mut self, cap: usize) -> Self {
        self.max_task_concurrency = Some(cap);
        self
    }
}

/// Coordinates named sub-agents with per-attempt timeouts, bounded
/// retries, bounded concurrency, context isolation and fail-fast
/// cancellation.
pub struct SwarmOrchestrator {
    name: String,
    config: SwarmConfig,
    registry: RwLock<SubAgentRegistry>,
    metrics_sinks: RwLock<Vec<Arc<dyn MetricsSink>>>,
    history: MetricsHistory,
}

impl SwarmOrchestrator {
    /// Create an orchestrator with default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, SwarmConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: SwarmConfig) -> Self {
        let name = name.into();
        let mut sinks: Vec<Arc<dyn MetricsSink>> = Vec::new();
        if config.metrics_logging {
            sinks.push(Arc::new(TracingMetricsSink));
        }

        Self {
            registry: RwLock::new(SubAgentRegistry::new(name.clone())),
            history: MetricsHistory::new(config.metrics_history_limit),
            metrics_sinks: RwLock::new(sinks),
            name,
            config,
        }
    }

    /// Create an orchestrator from a plain JSON configuration map
    pub fn from_value(name: impl Into<String>, config: &Value) -> Result<Self> {
        Ok(Self::with_config(name, SwarmConfig::from_value(config)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Register a sub-agent. Re-registering a name replaces the previous
    /// agent silently; the orchestrator's own name is rejected.
    pub fn add_sub_agent(&self, agent: Arc<dyn SubAgent>) -> Result<()> {
        self.registry.write().unwrap().add(agent)
    }

    /// Register several sub-agents in iteration order
    pub fn add_sub_agents(
        &self,
        agents: impl IntoIterator<Item = Arc<dyn SubAgent>>,
    ) -> Result<()> {
        self.registry.write().unwrap().add_many(agents)
    }

    /// Remove a sub-agent by name; returns whether it was registered
    pub fn remove_sub_agent(&self, name: &str) -> bool {
        self.registry.write().unwrap().remove(name)
    }

    /// Registered sub-agent names in registration order
    pub fn list_sub_agents(&self) -> Vec<String> {
        self.registry.read().unwrap().names()
    }

    /// Add a receiver for per-operation metrics payloads
    pub fn register_metrics_sink(&self, sink: Arc<dyn MetricsSink>) {
        self.metrics_sinks.write().unwrap().push(sink);
    }

    /// Recent metrics payloads, oldest first
    pub fn metrics_history(&self, limit: Option<usize>) -> Vec<Value> {
        self.history.snapshot(limit)
    }

    /// Execute one orchestrated swarm operation
    pub async fn execute_swarm(
        &self,
        task: &str,
        context: &AgentContext,
        options: SwarmOptions,
    ) -> Result<SwarmReport> {
        self.run_swarm(task, context, &options, None, None).await
    }

    /// Execute a batch of swarm operations, one per input task.
    ///
    /// Per-task reports come back in input order regardless of execution
    /// order. The per-task swarms share one correlation id; each gets a
    /// fresh operation id derived from the mass operation id.
    pub async fn execute_mass_swarm(
        &self,
        tasks: &[String],
        context: &AgentContext,
        options: MassSwarmOptions,
    ) -> Result<MassSwarmReport> {
        let started_at = now_utc();
        let clock = Instant::now();
        let operation_id = new_id("mass_swarm");
        let correlation_id = correlation_from_metadata(context).unwrap_or_else(|| new_id("corr"));

        // Unknown targets surface before any swarm starts.
        self.ensure_targets_known(&options.swarm)?;

        let max_task_concurrency = options
            .max_task_concurrency
            .unwrap_or(self.config.max_task_concurrency)
            .max(1);

        info!(
            "Mass swarm started: {} [{}] tasks={} parallel_tasks={}",
            operation_id,
            correlation_id,
            tasks.len(),
            options.parallel_tasks
        );

        let mut operations = Vec::with_capacity(tasks.len());
        if options.parallel_tasks {
            let runs = tasks.iter().enumerate().map(|(index, task)| {
                let swarm_operation_id = format!("{operation_id}_task_{}", index + 1);
                let swarm_correlation_id = correlation_id.clone();
                let swarm_options = &options.swarm;
                async move {
                    self.run_swarm(
                        task,
                        context,
                        swarm_options,
                        Some(swarm_operation_id),
                        Some(swarm_correlation_id),
                    )
                    .await
                }
            });
            let collected: Vec<Result<SwarmReport>> =
                stream::iter(runs).buffered(max_task_concurrency).collect().await;
            for report in collected {
                operations.push(report?);
            }
        } else {
            for (index, task) in tasks.iter().enumerate() {
                let report = self
                    .run_swarm(
                        task,
                        context,
                        &options.swarm,
                        Some(format!("{operation_id}_task_{}", index + 1)),
                        Some(correlation_id.clone()),
                    )
                    .await?;
                operations.push(report);
            }
        }

        let duration_ms = clock.elapsed().as_secs_f64() * 1000.0;
        let finished_at = now_utc();
        let report = MassSwarmReport::from_operations(
            operations,
            started_at,
            finished_at,
            duration_ms,
            operation_id,
            correlation_id,
        );

        let metrics = MassSwarmMetrics::from_report(&self.name, now_utc(), &report);
        self.publish_metrics(serde_json::to_value(&metrics)?);

        let entry = HistoryEntry::for_mass_swarm(&report, tasks);
        context.append_bounded(
            SWARM_HISTORY_KEY,
            serde_json::to_value(&entry)?,
            self.config.metrics_history_limit,
        );

        info!(
            "Mass swarm completed: {} success={} successful_tasks={} failed_tasks={} duration_ms={:.1}",
            report.operation_id,
            report.success,
            report.successful_tasks,
            report.failed_tasks,
            report.duration_ms
        );

        Ok(report)
    }

    async fn run_swarm(
        &self,
        task: &str,
        context: &AgentContext,
        options: &SwarmOptions,
        operation_id: Option<String>,
        correlation_id: Option<String>,
    ) -> Result<SwarmReport> {
        let started_at = now_utc();
        let clock = Instant::now();
        let operation_id = operation_id.unwrap_or_else(|| new_id("swarm"));
        let correlation_id = correlation_id
            .or_else(|| correlation_from_metadata(context))
            .unwrap_or_else(|| new_id("corr"));

        let strategy = options.strategy.unwrap_or(self.config.strategy);
        let timeout = match options.timeout {
            Some(secs) => normalize_timeout(Some(secs)),
            None => self.config.effective_timeout(),
        };
        let retries = options.retries.unwrap_or(self.config.sub_agent_retries);
        let fail_fast = options.fail_fast.unwrap_or(self.config.fail_fast);
        let max_concurrency = options
            .max_concurrency
            .unwrap_or(self.config.max_concurrency)
            .max(1);

        let targets = self.resolve_targets(task, options)?;

        info!(
            "Swarm operation started: {} [{}] strategy={} targets={}",
            operation_id,
            correlation_id,
            strategy,
            targets.len()
        );

        let policy = DispatchPolicy {
            orchestrator: self.name.clone(),
            timeout,
            retries,
            fail_fast,
            isolate_context: self.config.isolate_context,
            max_concurrency,
        };

        let results = match strategy {
            SwarmStrategy::Sequential => run_sequential(targets, context, &policy).await,
            SwarmStrategy::Parallel => run_parallel(targets, context, &policy).await,
        };

        let duration_ms = clock.elapsed().as_secs_f64() * 1000.0;
        let finished_at = now_utc();
        let report = SwarmReport::from_results(
            strategy,
            results,
            started_at,
            finished_at,
            duration_ms,
            operation_id,
            correlation_id,
        );

        let metrics = SwarmMetrics::from_report(&self.name, now_utc(), &report);
        self.publish_metrics(serde_json::to_value(&metrics)?);

        let entry = HistoryEntry::for_swarm(&report, task);
        context.append_bounded(
            SWARM_HISTORY_KEY,
            serde_json::to_value(&entry)?,
            self.config.metrics_history_limit,
        );

        info!(
            "Swarm operation completed: {} success={} successful={} failed={} duration_ms={:.1}",
            report.operation_id,
            report.success,
            report.successful_agents,
            report.failed_agents,
            report.duration_ms
        );

        Ok(report)
    }

    /// Resolve the ordered dispatch targets for one swarm call
    fn resolve_targets(&self, task: &str, options: &SwarmOptions) -> Result<Vec<Target>> {
        let registry = self.registry.read().unwrap();
        let names = match &options.target_agents {
            Some(filter) => {
                let unknown: Vec<String> = filter
                    .iter()
                    .filter(|name| registry.get(name).is_none())
                    .cloned()
                    .collect();
                if !unknown.is_empty() {
                    return Err(Error::UnknownAgents(unknown.join(", ")));
                }
                filter.clone()
            }
            None => registry.names(),
        };

        let mut targets = Vec::with_capacity(names.len());
        for name in names {
            let Some(agent) = registry.get(&name) else {
                continue;
            };
            let agent_task = options
                .sub_tasks
                .as_ref()
                .and_then(|map| map.get(&name))
                .cloned()
                .unwrap_or_else(|| task.to_string());
            targets.push(Target {
                name,
                agent,
                task: agent_task,
            });
        }
        Ok(targets)
    }

    fn ensure_targets_known(&self, options: &SwarmOptions) -> Result<()> {
        if let Some(filter) = &options.target_agents {
            let registry = self.registry.read().unwrap();
            let unknown: Vec<String> = filter
                .iter()
                .filter(|name| registry.get(name).is_none())
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Err(Error::UnknownAgents(unknown.join(", ")));
            }
        }
        Ok(())
    }

    fn publish_metrics(&self, payload: Value) {
        self.history.push(payload.clone());
        let sinks = self.metrics_sinks.read().unwrap();
        for sink in sinks.iter() {
            sink.record(&payload);
        }
    }
}

/// Orchestrators satisfy the same contract as any sub-agent, so they can
/// be composed as sub-agents of other orchestrators. Nothing defends
/// against an orchestrator indirectly containing itself.
#[async_trait]
impl SubAgent for SwarmOrchestrator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, task: &str, context: &AgentContext) -> Result<Value> {
        let report = self
            .execute_swarm(task, context, SwarmOptions::default())
            .await?;
        Ok(serde_json::to_value(report)?)
    }
}

fn correlation_from_metadata(context: &AgentContext) -> Option<String> {
    context
        .metadata
        .get("correlation_id")
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn new_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &hex[..12])
}
