//! swarm-core: Swarm Orchestration Engine
//!
//! Dispatches tasks across named sets of sub-agents with per-attempt
//! timeouts, bounded retries, bounded concurrency, context isolation and
//! fail-fast cancellation, and reports structured per-agent outcomes.

pub mod agents;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod report;

pub use agents::{
    FailureMode, MassSwarmOptions, SubAgent, SubAgentRegistry, SwarmOptions, SwarmOrchestrator,
    SwarmStrategy, SyntheticWorker, SyntheticWorkerConfig,
};
pub use config::SwarmConfig;
pub use context::AgentContext;
pub use error::{Error, Result};
pub use metrics::{MassSwarmMetrics, MetricsSink, SwarmMetrics, TracingMetricsSink};
pub use report::{HistoryEntry, HistoryKind, MassSwarmReport, SubAgentResult, SwarmReport};
