//! Single sub-agent execution
//!
//! Runs one sub-agent under a per-attempt timeout, retrying immediately on
//! failure up to the retry budget, and classifies the outcome into a
//! [`SubAgentResult`]. The executor knows nothing about fail-fast policy;
//! it only honors the cancellation token the scheduler hands it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::types::SubAgent;
use crate::context::AgentContext;
use crate::report::{SubAgentResult, TIMEOUT_ERROR_PREFIX};

enum AttemptOutcome {
    Success(Value),
    TimedOut,
    Failed(String),
}

/// Execute `agent` with retries and a per-attempt timeout.
///
/// `timeout_secs` bounds a single `execute` call, not the whole retry
/// budget; `None` disables the bound. The result's `timed_out` flag
/// reflects the final attempt only.
pub(crate) async fn run_sub_agent(
    agent: &Arc<dyn SubAgent>,
    agent_name: &str,
    task: &str,
    context: &AgentContext,
    timeout_secs: Option<f64>,
    retries: u32,
    cancel: &CancellationToken,
) -> SubAgentResult {
    let started = Instant::now();
    let mut attempts: u32 = 0;
    let mut timed_out = false;
    let mut last_error: Option<String> = None;

    while attempts <= retries {
        attempts += 1;
        timed_out = false;

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                return SubAgentResult::cancelled_mid_flight(
                    agent_name,
                    attempts,
                    elapsed_ms(started),
                );
            }
            outcome = run_attempt(agent, task, context, timeout_secs) => outcome,
        };

        match outcome {
            AttemptOutcome::Success(output) => {
                return SubAgentResult::succeeded(agent_name, output, attempts, elapsed_ms(started));
            }
            AttemptOutcome::TimedOut => {
                timed_out = true;
                let secs = timeout_secs.unwrap_or_default();
                last_error = Some(format!("{TIMEOUT_ERROR_PREFIX}{secs}s"));
                warn!(
                    "Sub-agent '{}' timed out on attempt {} (limit {}s)",
                    agent_name, attempts, secs
                );
            }
            AttemptOutcome::Failed(message) => {
                warn!(
                    "Sub-agent '{}' failed on attempt {}: {}",
                    agent_name, attempts, message
                );
                last_error = Some(message);
            }
        }
    }

    SubAgentResult::failed(
        agent_name,
        last_error.unwrap_or_else(|| "Unknown execution error".to_string()),
        attempts,
        timed_out,
        elapsed_ms(started),
    )
}

async fn run_attempt(
    agent: &Arc<dyn SubAgent>,
    task: &str,
    context: &AgentContext,
    timeout_secs: Option<f64>,
) -> AttemptOutcome {
    match timeout_secs {
        Some(secs) => {
            let limit = Duration::from_secs_f64(secs);
            match tokio::time::timeout(limit, agent.execute(task, context)).await {
                Ok(Ok(output)) => AttemptOutcome::Success(output),
                Ok(Err(err)) => AttemptOutcome::Failed(err.to_string()),
                Err(_) => AttemptOutcome::TimedOut,
            }
        }
        None => match agent.execute(task, context).await {
            Ok(output) => AttemptOutcome::Success(output),
            Err(err) => AttemptOutcome::Failed(err.to_string()),
        },
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::synthetic::{FailureMode, SyntheticWorker, SyntheticWorkerConfig};
    use crate::report::FAIL_FAST_CANCEL_MARKER;

    fn worker(config: SyntheticWorkerConfig) -> Arc<dyn SubAgent> {
        Arc::new(SyntheticWorker::with_config("worker", config))
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let agent = worker(SyntheticWorkerConfig::default());
        let context = AgentContext::new("session");
        let cancel = CancellationToken::new();

        let result =
            run_sub_agent(&agent, "worker", "task", &context, Some(5.0), 0, &cancel).await;

        assert!(result.success);
        assert_eq!(result.attempts, 1);
        assert!(!result.timed_out);
        assert!(result.error.is_none());
        assert!(result.duration_ms >= 0.0);
        assert_eq!(result.output.as_ref().unwrap()["task"], "task");
    }

    #[tokio::test]
    async fn test_retry_recovers_first_attempt_failure() {
        let agent = worker(SyntheticWorkerConfig {
            failure_mode: FailureMode::FirstAttempt,
            ..Default::default()
        });
        let context = AgentContext::new("session");
        let cancel = CancellationToken::new();

        let result =
            run_sub_agent(&agent, "worker", "task", &context, None, 1, &cancel).await;

        assert!(result.success);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_keep_last_error() {
        let agent = worker(SyntheticWorkerConfig {
            failure_mode: FailureMode::Always,
            ..Default::default()
        });
        let context = AgentContext::new("session");
        let cancel = CancellationToken::new();

        let result =
            run_sub_agent(&agent, "worker", "task", &context, None, 2, &cancel).await;

        assert!(!result.success);
        assert_eq!(result.attempts, 3);
        assert!(!result.timed_out);
        assert!(result.error.unwrap().contains("forced failure"));
    }

    #[tokio::test]
    async fn test_timeout_sets_marker_and_flag() {
        let agent = worker(SyntheticWorkerConfig {
            delay_ms: 50,
            ..Default::default()
        });
        let context = AgentContext::new("session");
        let cancel = CancellationToken::new();

        let result =
            run_sub_agent(&agent, "worker", "task", &context, Some(0.01), 0, &cancel).await;

        assert!(!result.success);
        assert!(result.timed_out);
        assert_eq!(result.attempts, 1);
        let error = result.error.unwrap();
        assert!(error.starts_with(TIMEOUT_ERROR_PREFIX), "got: {error}");
        assert!(error.contains("0.01"));
    }

    #[tokio::test]
    async fn test_timed_out_flag_reflects_final_attempt_only() {
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicU32, Ordering};

        // First attempt sleeps past the limit, second errors immediately.
        struct SlowThenErroring {
            calls: AtomicU32,
        }

        #[async_trait]
        impl SubAgent for SlowThenErroring {
            fn name(&self) -> &str {
                "slow_then_erroring"
            }

            async fn execute(
                &self,
                _task: &str,
                _context: &AgentContext,
            ) -> crate::Result<Value> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(Value::Null)
                } else {
                    Err(crate::Error::Execution("hard failure".to_string()))
                }
            }
        }

        let agent: Arc<dyn SubAgent> = Arc::new(SlowThenErroring {
            calls: AtomicU32::new(0),
        });
        let context = AgentContext::new("session");
        let cancel = CancellationToken::new();

        let result =
            run_sub_agent(&agent, "slow_then_erroring", "task", &context, Some(0.02), 1, &cancel)
                .await;

        assert!(!result.success);
        assert_eq!(result.attempts, 2);
        assert!(!result.timed_out, "final attempt errored, it did not time out");
        assert_eq!(result.error.as_deref(), Some("hard failure"));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_attempt() {
        let agent = worker(SyntheticWorkerConfig {
            delay_ms: 200,
            ..Default::default()
        });
        let context = AgentContext::new("session");
        let cancel = CancellationToken::new();

        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel_clone.cancel();
        });

        let result =
            run_sub_agent(&agent, "worker", "task", &context, None, 0, &cancel).await;

        assert!(!result.success);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.error.as_deref(), Some(FAIL_FAST_CANCEL_MARKER));
    }
}
