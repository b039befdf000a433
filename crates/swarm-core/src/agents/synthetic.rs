//! Synthetic worker agents
//!
//! Configurable stand-in sub-agents for load scenarios and tests: an
//! artificial delay, scripted failure modes, and a payload merged into the
//! success output.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::time::{sleep, Duration};

use super::types::SubAgent;
use crate::context::AgentContext;
use crate::{Error, Result};

/// When a synthetic worker raises a forced failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Never fail
    #[default]
    Never,
    /// Fail on every call
    Always,
    /// Fail on the first call only
    FirstAttempt,
}

/// Behavior knobs for a [`SyntheticWorker`]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyntheticWorkerConfig {
    /// Artificial latency before any other behavior
    pub delay_ms: u64,
    pub failure_mode: FailureMode,
    /// Call numbers (1-indexed) that fail regardless of `failure_mode`
    pub fail_on_calls: Vec<u32>,
    /// Extra fields merged into the success output
    pub result_payload: Map<String, Value>,
}

/// Configurable worker used by swarm scenarios and tests
pub struct SyntheticWorker {
    name: String,
    config: SyntheticWorkerConfig,
    calls: AtomicU32,
}

impl SyntheticWorker {
    /// Create a worker that always succeeds immediately
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, SyntheticWorkerConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: SyntheticWorkerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            calls: AtomicU32::new(0),
        }
    }

    /// Convenience constructor for a worker with latency only
    pub fn with_delay(name: impl Into<String>, delay_ms: u64) -> Self {
        Self::with_config(
            name,
            SyntheticWorkerConfig {
                delay_ms,
                ..Default::default()
            },
        )
    }

    /// Number of `execute` calls observed so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubAgent for SyntheticWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, task: &str, context: &AgentContext) -> Result<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if self.config.delay_ms > 0 {
            sleep(Duration::from_millis(self.config.delay_ms)).await;
        }

        match self.config.failure_mode {
            FailureMode::Always => {
                return Err(Error::Execution(format!(
                    "Synthetic worker '{}' forced failure (always)",
                    self.name
                )));
            }
            FailureMode::FirstAttempt if call == 1 => {
                return Err(Error::Execution(format!(
                    "Synthetic worker '{}' forced failure (first_attempt)",
                    self.name
                )));
            }
            _ => {}
        }
        if self.config.fail_on_calls.contains(&call) {
            return Err(Error::Execution(format!(
                "Synthetic worker '{}' forced failure on call {}",
                self.name, call
            )));
        }

        let mut output = json!({
            "success": true,
            "agent": self.name,
            "task": task,
            "call_count": call,
            "session_id": context.session_id,
        });
        if let Some(object) = output.as_object_mut() {
            for (key, value) in &self.config.result_payload {
                object.insert(key.clone(), value.clone());
            }
        }

        Ok(output)
    }
}
