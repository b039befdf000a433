//! Swarm orchestration
//!
//! This module provides the orchestration engine: a registry of named
//! sub-agents and a scheduler that fans tasks out across them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SwarmOrchestrator                        │
//! │  execute_swarm / execute_mass_swarm / execute                │
//! └───────┬─────────────────────────────────────────────────────┘
//!         │ resolves targets against
//! ┌───────▼─────────────────────────────────────────────────────┐
//! │                     SubAgentRegistry                         │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐        │
//! │  │ Agent 1 │  │ Agent 2 │  │ Agent 3 │  │ Agent N │        │
//! │  └─────────┘  └─────────┘  └─────────┘  └─────────┘        │
//! └───────┬─────────────────────────────────────────────────────┘
//!         │ dispatched by
//! ┌───────▼─────────────────────────────────────────────────────┐
//! │            strategy (sequential | parallel)                  │
//! │  - semaphore-bounded fan-out                                 │
//! │  - fail-fast cancellation                                    │
//! │  - per-target context derivation                             │
//! └───────┬─────────────────────────────────────────────────────┘
//!         │ one unit per target
//! ┌───────▼─────────────────────────────────────────────────────┐
//! │                    executor (one agent)                      │
//! │  - per-attempt timeout                                       │
//! │  - immediate retries up to the budget                        │
//! │  - outcome classification into SubAgentResult                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use swarm_core::{AgentContext, SwarmOrchestrator, SwarmOptions, SyntheticWorker};
//!
//! let orchestrator = SwarmOrchestrator::new("orchestrator");
//! orchestrator.add_sub_agent(Arc::new(SyntheticWorker::new("worker_a")))?;
//! orchestrator.add_sub_agent(Arc::new(SyntheticWorker::new("worker_b")))?;
//!
//! let context = AgentContext::new("session-1");
//! let report = orchestrator
//!     .execute_swarm("collect inventory", &context, SwarmOptions::default())
//!     .await?;
//! println!("{} of {} succeeded", report.successful_agents, report.total_agents);
//! ```

pub mod executor;
pub mod orchestrator;
pub mod registry;
pub mod strategy;
pub mod synthetic;
pub mod types;

// Re-exports
pub use orchestrator::{MassSwarmOptions, SwarmOptions, SwarmOrchestrator};
pub use registry::SubAgentRegistry;
pub use synthetic::{FailureMode, SyntheticWorker, SyntheticWorkerConfig};
pub use types::{SubAgent, SwarmStrategy};
