//! Dispatch strategies
//!
//! Sequential and bounded-parallel dispatch of resolved targets through the
//! single-agent executor, including the fail-fast policy. Results always
//! come back in target order regardless of completion order.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::executor;
use super::types::SubAgent;
use crate::context::AgentContext;
use crate::report::SubAgentResult;

/// One resolved dispatch target: an agent and the task it will receive
pub(crate) struct Target {
    pub name: String,
    pub agent: Arc<dyn SubAgent>,
    pub task: String,
}

/// Effective settings for one dispatch round
#[derive(Debug, Clone)]
pub(crate) struct DispatchPolicy {
    pub orchestrator: String,
    pub timeout: Option<f64>,
    pub retries: u32,
    pub fail_fast: bool,
    pub isolate_context: bool,
    pub max_concurrency: usize,
}

/// Run targets one at a time in order. A fail-fast stop appends a skip
/// record for every remaining target.
pub(crate) async fn run_sequential(
    targets: Vec<Target>,
    context: &AgentContext,
    policy: &DispatchPolicy,
) -> Vec<SubAgentResult> {
    let mut results = Vec::with_capacity(targets.len());
    let inert = CancellationToken::new();

    for (index, target) in targets.iter().enumerate() {
        let sub_context = context.derive(&policy.orchestrator, &target.name, policy.isolate_context);
        let result = executor::run_sub_agent(
            &target.agent,
            &target.name,
            &target.task,
            &sub_context,
            policy.timeout,
            policy.retries,
            &inert,
        )
        .await;

        let failed = !result.success;
        results.push(result);

        if policy.fail_fast && failed {
            warn!(
                "Fail-fast triggered by sub-agent '{}'; skipping {} remaining",
                targets[index].name,
                targets.len() - index - 1
            );
            for remaining in &targets[index + 1..] {
                results.push(SubAgentResult::skipped(&remaining.name));
            }
            break;
        }
    }

    results
}

/// Fan targets out under a concurrency cap. The first non-successful
/// result under fail-fast cancels every unit that has not finished;
/// cancelled units that never started record `attempts == 0`.
pub(crate) async fn run_parallel(
    targets: Vec<Target>,
    context: &AgentContext,
    policy: &DispatchPolicy,
) -> Vec<SubAgentResult> {
    let names: Vec<String> = targets.iter().map(|target| target.name.clone()).collect();
    let semaphore = Arc::new(Semaphore::new(policy.max_concurrency.max(1)));
    let cancel = CancellationToken::new();
    let mut join_set = JoinSet::new();

    for (index, target) in targets.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();
        let parent = context.clone();
        let orchestrator = policy.orchestrator.clone();
        let timeout = policy.timeout;
        let retries = policy.retries;
        let isolate = policy.isolate_context;

        join_set.spawn(async move {
            let _permit = tokio::select! {
                _ = cancel.cancelled() => {
                    return (index, SubAgentResult::cancelled(&target.name));
                }
                permit = semaphore.acquire_owned() => permit.unwrap(),
            };
            // Fail-fast may have landed between the select arms resolving.
            if cancel.is_cancelled() {
                return (index, SubAgentResult::cancelled(&target.name));
            }

            let sub_context = parent.derive(&orchestrator, &target.name, isolate);
            let result = executor::run_sub_agent(
                &target.agent,
                &target.name,
                &target.task,
                &sub_context,
                timeout,
                retries,
                &cancel,
            )
            .await;
            (index, result)
        });
    }

    let mut slots: Vec<Option<SubAgentResult>> = names.iter().map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        let Ok((index, result)) = joined else {
            continue;
        };
        if policy.fail_fast && !result.success && !cancel.is_cancelled() {
            warn!(
                "Fail-fast triggered by sub-agent '{}'; cancelling outstanding work",
                result.agent
            );
            cancel.cancel();
        }
        slots[index] = Some(result);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.unwrap_or_else(|| SubAgentResult::cancelled(&names[index])))
        .collect()
}
