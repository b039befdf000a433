//! Execution context for agents
//!
//! An [`AgentContext`] travels with every `execute` call. The `state` map is
//! behind an `Arc`, so cloning a context shares state; that is the
//! isolation-off pass-through. [`AgentContext::derive`] with isolation on
//! replaces the `Arc` with a deep copy so sub-agent mutations stay local.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

/// State key the orchestrator appends operation history entries to.
pub const SWARM_HISTORY_KEY: &str = "swarm_history";

/// Metadata key naming the orchestrator that derived a sub-context.
pub const SWARM_PARENT_KEY: &str = "swarm_parent";

/// Metadata key naming the sub-agent a derived context was built for.
pub const SUB_AGENT_KEY: &str = "sub_agent";

/// Execution context for agents
#[derive(Debug, Clone)]
pub struct AgentContext {
    /// Caller-assigned session identifier
    pub session_id: String,
    /// Optional user the session belongs to
    pub user_id: Option<String>,
    /// Read-only annotations; the orchestrator never writes the caller's copy
    pub metadata: HashMap<String, Value>,
    /// Mutable state shared by everyone holding a clone of this context
    state: Arc<RwLock<HashMap<String, Value>>>,
}

impl AgentContext {
    /// Create a context for a session
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: None,
            metadata: HashMap::new(),
            state: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set the user id
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Seed the state map
    pub fn with_state(self, state: HashMap<String, Value>) -> Self {
        *self.state.write().unwrap() = state;
        self
    }

    /// Read one state value (cloned out of the shared map)
    pub fn state_get(&self, key: &str) -> Option<Value> {
        self.state.read().unwrap().get(key).cloned()
    }

    /// Write one state value
    pub fn state_set(&self, key: impl Into<String>, value: Value) {
        self.state.write().unwrap().insert(key.into(), value);
    }

    /// Snapshot the full state map
    pub fn state_snapshot(&self) -> HashMap<String, Value> {
        self.state.read().unwrap().clone()
    }

    /// Derive the context a sub-agent will execute under.
    ///
    /// With isolation off the parent is passed through unchanged (clones
    /// share the same state map, so concurrent sub-agents see each other's
    /// writes). With isolation on, the returned context carries a deep copy
    /// of the state plus `swarm_parent` / `sub_agent` metadata markers.
    pub fn derive(&self, orchestrator_name: &str, sub_agent_name: &str, isolate: bool) -> Self {
        if !isolate {
            return self.clone();
        }

        let mut metadata = self.metadata.clone();
        metadata.insert(
            SWARM_PARENT_KEY.to_string(),
            Value::String(orchestrator_name.to_string()),
        );
        metadata.insert(
            SUB_AGENT_KEY.to_string(),
            Value::String(sub_agent_name.to_string()),
        );

        // Value::clone is recursive, so this reproduces nested containers
        // without aliasing the parent's state.
        let state = self.state.read().unwrap().clone();

        Self {
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
            metadata,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Append `item` to the list stored at `key`, creating the list if
    /// absent and dropping the oldest entries beyond `limit`.
    pub(crate) fn append_bounded(&self, key: &str, item: Value, limit: usize) {
        let mut state = self.state.write().unwrap();
        let entry = state
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        if let Value::Array(items) = entry {
            items.push(item);
            if items.len() > limit {
                let excess = items.len() - limit;
                items.drain(..excess);
            }
        }
    }
}
