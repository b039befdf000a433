//! Result records and aggregated swarm reports

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::SwarmStrategy;

/// Error marker for agents skipped by the sequential fail-fast policy.
pub const FAIL_FAST_SKIP_MARKER: &str = "Skipped due to fail_fast policy";

/// Error marker for agents cancelled by the parallel fail-fast policy.
pub const FAIL_FAST_CANCEL_MARKER: &str = "Cancelled by fail_fast";

/// Prefix every per-attempt timeout error starts with.
pub const TIMEOUT_ERROR_PREFIX: &str = "Timed out after ";

/// Execution result for a single sub-agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAgentResult {
    /// Sub-agent's registered name
    pub agent: String,
    /// Whether an attempt returned without error or timeout
    pub success: bool,
    /// Output from the successful attempt
    pub output: Option<Value>,
    /// Error message from the final attempt
    pub error: Option<String>,
    /// Attempts actually executed (0 = never started)
    pub attempts: u32,
    /// Whether the final attempt ended by per-attempt timeout
    pub timed_out: bool,
    /// Wall time spent executing this sub-agent
    pub duration_ms: f64,
}

impl SubAgentResult {
    /// Create a successful result
    pub fn succeeded(agent: impl Into<String>, output: Value, attempts: u32, duration_ms: f64) -> Self {
        Self {
            agent: agent.into(),
            success: true,
            output: Some(output),
            error: None,
            attempts,
            timed_out: false,
            duration_ms,
        }
    }

    /// Create a failed result
    pub fn failed(
        agent: impl Into<String>,
        error: impl Into<String>,
        attempts: u32,
        timed_out: bool,
        duration_ms: f64,
    ) -> Self {
        Self {
            agent: agent.into(),
            success: false,
            output: None,
            error: Some(error.into()),
            attempts,
            timed_out,
            duration_ms,
        }
    }

    /// Skip record for a sequential fail-fast stop
    pub fn skipped(agent: impl Into<String>) -> Self {
        Self::failed(agent, FAIL_FAST_SKIP_MARKER, 0, false, 0.0)
    }

    /// Cancellation record for a unit that never started executing
    pub fn cancelled(agent: impl Into<String>) -> Self {
        Self::failed(agent, FAIL_FAST_CANCEL_MARKER, 0, false, 0.0)
    }

    /// Cancellation record for a unit interrupted mid-attempt
    pub fn cancelled_mid_flight(agent: impl Into<String>, attempts: u32, duration_ms: f64) -> Self {
        Self::failed(agent, FAIL_FAST_CANCEL_MARKER, attempts, false, duration_ms)
    }
}

/// Aggregated report for one swarm operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmReport {
    /// True iff every attempted sub-agent succeeded
    pub success: bool,
    /// Strategy the operation ran under
    pub strategy: SwarmStrategy,
    pub total_agents: usize,
    pub successful_agents: usize,
    pub failed_agents: usize,
    /// Per-agent results in target order
    pub results: Vec<SubAgentResult>,
    /// ISO-8601 UTC timestamps
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: f64,
    pub operation_id: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl SwarmReport {
    pub(crate) fn from_results(
        strategy: SwarmStrategy,
        results: Vec<SubAgentResult>,
        started_at: String,
        finished_at: String,
        duration_ms: f64,
        operation_id: String,
        correlation_id: String,
    ) -> Self {
        let successful_agents = results.iter().filter(|result| result.success).count();
        let failed_agents = results.len() - successful_agents;
        let summary = format!(
            "Swarm executed {} agents: {} succeeded, {} failed",
            results.len(),
            successful_agents,
            failed_agents
        );

        Self {
            success: failed_agents == 0,
            strategy,
            total_agents: results.len(),
            successful_agents,
            failed_agents,
            results,
            started_at,
            finished_at,
            duration_ms,
            operation_id,
            correlation_id,
            summary: Some(summary),
        }
    }
}

/// Aggregated report for a batch of swarm operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassSwarmReport {
    /// True iff every per-task swarm succeeded
    pub success: bool,
    pub total_tasks: usize,
    pub successful_tasks: usize,
    pub failed_tasks: usize,
    /// Per-task swarm reports in input order
    pub operations: Vec<SwarmReport>,
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: f64,
    pub operation_id: String,
    pub correlation_id: String,
}

impl MassSwarmReport {
    pub(crate) fn from_operations(
        operations: Vec<SwarmReport>,
        started_at: String,
        finished_at: String,
        duration_ms: f64,
        operation_id: String,
        correlation_id: String,
    ) -> Self {
        let successful_tasks = operations.iter().filter(|op| op.success).count();
        let failed_tasks = operations.len() - successful_tasks;

        Self {
            success: failed_tasks == 0,
            total_tasks: operations.len(),
            successful_tasks,
            failed_tasks,
            operations,
            started_at,
            finished_at,
            duration_ms,
            operation_id,
            correlation_id,
        }
    }
}

/// Kind discriminator for operation history entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Swarm,
    MassSwarm,
}

/// Compact operation record appended to `context.state["swarm_history"]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub operation_id: String,
    pub kind: HistoryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<String>>,
    pub success: bool,
    pub started_at: String,
    pub duration_ms: f64,
    pub successful: usize,
    pub failed: usize,
}

impl HistoryEntry {
    pub(crate) fn for_swarm(report: &SwarmReport, task: &str) -> Self {
        Self {
            operation_id: report.operation_id.clone(),
            kind: HistoryKind::Swarm,
            task: Some(task.to_string()),
            tasks: None,
            success: report.success,
            started_at: report.started_at.clone(),
            duration_ms: report.duration_ms,
            successful: report.successful_agents,
            failed: report.failed_agents,
        }
    }

    pub(crate) fn for_mass_swarm(report: &MassSwarmReport, tasks: &[String]) -> Self {
        Self {
            operation_id: report.operation_id.clone(),
            kind: HistoryKind::MassSwarm,
            task: None,
            tasks: Some(tasks.to_vec()),
            success: report.success,
            started_at: report.started_at.clone(),
            duration_ms: report.duration_ms,
            successful: report.successful_tasks,
            failed: report.failed_tasks,
        }
    }
}
