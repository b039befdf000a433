//! Sub-agent trait and strategy definitions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::context::AgentContext;
use crate::Result;

/// Execution strategy for dispatching sub-agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SwarmStrategy {
    #[default]
    Parallel,
    Sequential,
}

impl SwarmStrategy {
    /// Resolve a strategy from a string; unrecognized values fall back to
    /// parallel. Case and surrounding whitespace are ignored.
    pub fn resolve(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "sequential" => Self::Sequential,
            _ => Self::Parallel,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Sequential => "sequential",
        }
    }
}

impl fmt::Display for SwarmStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability contract every swarm participant satisfies.
///
/// A sub-agent is identified by a stable name and exposes one asynchronous
/// `execute` call. Output is any serializable value; failure is signaled by
/// returning an error, whose display string becomes the recorded message.
#[async_trait]
pub trait SubAgent: Send + Sync + 'static {
    /// The agent's registered name (unique within one orchestrator)
    fn name(&self) -> &str;

    /// Execute a task under the given context
    async fn execute(&self, task: &str, context: &AgentContext) -> Result<Value>;
}
