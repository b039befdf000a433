//! Metrics payloads and sinks
//!
//! The core builds one serializable payload per operation and hands it to
//! every registered [`MetricsSink`]. Transport is the host's problem; the
//! default sink just routes the JSON line through `tracing`.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::agents::SwarmStrategy;
use crate::report::{MassSwarmReport, SwarmReport};

/// Receiver for per-operation metrics payloads
pub trait MetricsSink: Send + Sync {
    /// Record one payload. Implementations must not block the scheduler.
    fn record(&self, payload: &Value);
}

/// Default sink: emits each payload as a JSON log line
#[derive(Debug, Default)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn record(&self, payload: &Value) {
        info!(target: "swarm_core::metrics", "{payload}");
    }
}

/// Metrics for one swarm operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmMetrics {
    pub event: String,
    pub timestamp: String,
    pub orchestrator: String,
    pub operation_id: String,
    pub correlation_id: String,
    pub strategy: SwarmStrategy,
    pub duration_ms: f64,
    pub successes: usize,
    pub failures: usize,
    pub timeouts: usize,
    pub retries_used: u32,
    pub attempts_total: u32,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub sub_agent_duration_p95_ms: f64,
}

impl SwarmMetrics {
    pub(crate) fn from_report(orchestrator: &str, timestamp: String, report: &SwarmReport) -> Self {
        let durations: Vec<f64> = report.results.iter().map(|r| r.duration_ms).collect();
        let timeouts = report.results.iter().filter(|r| r.timed_out).count();
        let retries_used: u32 = report
            .results
            .iter()
            .map(|r| r.attempts.saturating_sub(1))
            .sum();
        let attempts_total: u32 = report.results.iter().map(|r| r.attempts).sum();
        let (success_rate, failure_rate) = rates(report.successful_agents, report.failed_agents);

        Self {
            event: "swarm_operation".to_string(),
            timestamp,
            orchestrator: orchestrator.to_string(),
            operation_id: report.operation_id.clone(),
            correlation_id: report.correlation_id.clone(),
            strategy: report.strategy,
            duration_ms: report.duration_ms,
            successes: report.successful_agents,
            failures: report.failed_agents,
            timeouts,
            retries_used,
            attempts_total,
            success_rate,
            failure_rate,
            sub_agent_duration_p95_ms: percentile(&durations, 95),
        }
    }
}

/// Metrics for one mass-swarm operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassSwarmMetrics {
    pub event: String,
    pub timestamp: String,
    pub orchestrator: String,
    pub operation_id: String,
    pub correlation_id: String,
    pub duration_ms: f64,
    pub total_tasks: usize,
    pub successes: usize,
    pub failures: usize,
    pub timeouts: usize,
    pub retries_used: u32,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub operation_duration_p95_ms: f64,
}

impl MassSwarmMetrics {
    pub(crate) fn from_report(orchestrator: &str, timestamp: String, report: &MassSwarmReport) -> Self {
        let durations: Vec<f64> = report.operations.iter().map(|op| op.duration_ms).collect();
        let timeouts = report
            .operations
            .iter()
            .flat_map(|op| op.results.iter())
            .filter(|r| r.timed_out)
            .count();
        let retries_used: u32 = report
            .operations
            .iter()
            .flat_map(|op| op.results.iter())
            .map(|r| r.attempts.saturating_sub(1))
            .sum();
        let (success_rate, failure_rate) = rates(report.successful_tasks, report.failed_tasks);

        Self {
            event: "mass_swarm_operation".to_string(),
            timestamp,
            orchestrator: orchestrator.to_string(),
            operation_id: report.operation_id.clone(),
            correlation_id: report.correlation_id.clone(),
            duration_ms: report.duration_ms,
            total_tasks: report.total_tasks,
            successes: report.successful_tasks,
            failures: report.failed_tasks,
            timeouts,
            retries_used,
            success_rate,
            failure_rate,
            operation_duration_p95_ms: percentile(&durations, 95),
        }
    }
}

fn rates(successes: usize, failures: usize) -> (f64, f64) {
    let total = successes + failures;
    if total == 0 {
        return (1.0, 0.0);
    }
    let success_rate = successes as f64 / total as f64;
    (round4(success_rate), round4(1.0 - success_rate))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Nearest-rank percentile over `values`; 0 for an empty population.
pub(crate) fn percentile(values: &[f64], pct: u8) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut ordered = values.to_vec();
    ordered.sort_by(|a, b| a.total_cmp(b));
    let rank = ((f64::from(pct) / 100.0) * ordered.len() as f64).ceil().max(1.0) as usize;
    ordered[rank.min(ordered.len()) - 1]
}

/// Bounded in-memory record of recent metrics payloads
#[derive(Debug)]
pub(crate) struct MetricsHistory {
    entries: Mutex<VecDeque<Value>>,
    limit: usize,
}

impl MetricsHistory {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            limit: limit.max(1),
        }
    }

    pub(crate) fn push(&self, payload: Value) {
        let mut entries = self.entries.lock().unwrap();
        entries.push_back(payload);
        while entries.len() > self.limit {
            entries.pop_front();
        }
    }

    /// Most recent entries, oldest first; `limit` trims from the back.
    pub(crate) fn snapshot(&self, limit: Option<usize>) -> Vec<Value> {
        let entries = self.entries.lock().unwrap();
        let take = limit.unwrap_or(entries.len()).min(entries.len());
        entries.iter().skip(entries.len() - take).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SubAgentResult;
    use serde_json::json;

    #[test]
    fn test_percentile_nearest_rank() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&values, 95), 95.0);
        assert_eq!(percentile(&values, 100), 100.0);

        assert_eq!(percentile(&[7.0], 95), 7.0);
        assert_eq!(percentile(&[], 95), 0.0);
        assert_eq!(percentile(&[10.0, 20.0], 50), 10.0);
    }

    #[test]
    fn test_swarm_metrics_aggregation() {
        let results = vec![
            SubAgentResult::succeeded("a", json!(1), 2, 10.0),
            SubAgentResult::failed("b", "Timed out after 1s", 1, true, 20.0),
            SubAgentResult::skipped("c"),
        ];
        let report = SwarmReport::from_results(
            SwarmStrategy::Parallel,
            results,
            "start".into(),
            "end".into(),
            30.0,
            "swarm_1".into(),
            "corr_1".into(),
        );
        let metrics = SwarmMetrics::from_report("orchestrator", "ts".into(), &report);

        assert_eq!(metrics.successes, 1);
        assert_eq!(metrics.failures, 2);
        assert_eq!(metrics.timeouts, 1);
        assert_eq!(metrics.retries_used, 1);
        assert_eq!(metrics.attempts_total, 3);
        assert_eq!(metrics.success_rate, 0.3333);
        assert_eq!(metrics.failure_rate, 0.6667);
    }

    #[test]
    fn test_empty_population_rates() {
        let report = SwarmReport::from_results(
            SwarmStrategy::Parallel,
            vec![],
            "start".into(),
            "end".into(),
            0.0,
            "swarm_1".into(),
            "corr_1".into(),
        );
        let metrics = SwarmMetrics::from_report("orchestrator", "ts".into(), &report);

        assert_eq!(metrics.success_rate, 1.0);
        assert_eq!(metrics.failure_rate, 0.0);
        assert_eq!(metrics.sub_agent_duration_p95_ms, 0.0);
    }

    #[test]
    fn test_history_ring_bounds() {
        let history = MetricsHistory::new(2);
        history.push(json!(1));
        history.push(json!(2));
        history.push(json!(3));

        assert_eq!(history.snapshot(None), vec![json!(2), json!(3)]);
        assert_eq!(history.snapshot(Some(1)), vec![json!(3)]);
    }
}
