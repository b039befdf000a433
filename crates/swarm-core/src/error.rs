//! Error types for swarm-core

use thiserror::Error;

/// Main error type for swarm-core
#[derive(Error, Debug)]
pub enum Error {
    /// A sub-agent was registered under a name reserved by the orchestrator
    #[error("Naming conflict: {0}")]
    NamingConflict(String),

    /// A target filter named agents that are not in the registry
    #[error("Unknown sub-agent(s): {0}")]
    UnknownAgents(String),

    /// A configuration value could not be coerced to its required type
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A sub-agent reported a failure from its `execute` call
    #[error("{0}")]
    Execution(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for swarm-core
pub type Result<T> = std::result::Result<T, Error>;
