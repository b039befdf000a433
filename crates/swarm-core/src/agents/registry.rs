//! Sub-agent registry
//!
//! Holds the orchestrator's named sub-agents and preserves registration
//! order, which target resolution depends on.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::types::SubAgent;
use crate::{Error, Result};

/// Named registry of sub-agents
pub struct SubAgentRegistry {
    /// Name no sub-agent may use (the owning orchestrator's own name)
    reserved_name: String,
    agents: HashMap<String, Arc<dyn SubAgent>>,
    /// Names in registration order; re-registration keeps the original slot
    order: Vec<String>,
}

impl SubAgentRegistry {
    pub fn new(reserved_name: impl Into<String>) -> Self {
        Self {
            reserved_name: reserved_name.into(),
            agents: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a sub-agent under its own name.
    ///
    /// Registering a second agent under an existing name replaces the first
    /// silently. The reserved (orchestrator) name is rejected.
    pub fn add(&mut self, agent: Arc<dyn SubAgent>) -> Result<()> {
        let name = agent.name().to_string();
        if name == self.reserved_name {
            return Err(Error::NamingConflict(format!(
                "orchestrator '{}' cannot register itself as a sub-agent",
                self.reserved_name
            )));
        }

        if self.agents.insert(name.clone(), agent).is_none() {
            self.order.push(name.clone());
        }
        info!("Added sub-agent: {}", name);
        Ok(())
    }

    /// Register several sub-agents in iteration order
    pub fn add_many(&mut self, agents: impl IntoIterator<Item = Arc<dyn SubAgent>>) -> Result<()> {
        for agent in agents {
            self.add(agent)?;
        }
        Ok(())
    }

    /// Remove a sub-agent by name; returns whether it was present
    pub fn remove(&mut self, name: &str) -> bool {
        let existed = self.agents.remove(name).is_some();
        if existed {
            self.order.retain(|entry| entry != name);
        }
        existed
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Look up a sub-agent by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn SubAgent>> {
        self.agents.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AgentContext;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct NamedAgent {
        name: String,
        tag: &'static str,
    }

    impl NamedAgent {
        fn new(name: &str, tag: &'static str) -> Arc<dyn SubAgent> {
            Arc::new(Self {
                name: name.to_string(),
                tag,
            })
        }
    }

    #[async_trait]
    impl SubAgent for NamedAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn execute(&self, _task: &str, _context: &AgentContext) -> crate::Result<Value> {
            Ok(json!(self.tag))
        }
    }

    #[test]
    fn test_add_list_lookup_round_trip() {
        let mut registry = SubAgentRegistry::new("orchestrator");
        registry.add(NamedAgent::new("alpha", "a")).unwrap();
        registry.add(NamedAgent::new("beta", "b")).unwrap();

        assert_eq!(registry.names(), vec!["alpha", "beta"]);
        assert_eq!(registry.get("alpha").unwrap().name(), "alpha");
        assert!(registry.get("gamma").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_reserved_name_rejected() {
        let mut registry = SubAgentRegistry::new("orchestrator");
        let err = registry.add(NamedAgent::new("orchestrator", "x")).unwrap_err();
        assert!(matches!(err, Error::NamingConflict(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_replacement_is_silent_and_keeps_order() {
        let mut registry = SubAgentRegistry::new("orchestrator");
        registry.add(NamedAgent::new("alpha", "first")).unwrap();
        registry.add(NamedAgent::new("beta", "b")).unwrap();
        registry.add(NamedAgent::new("alpha", "second")).unwrap();

        assert_eq!(registry.names(), vec!["alpha", "beta"]);
        assert_eq!(registry.len(), 2);

        let context = AgentContext::new("session");
        let output = registry
            .get("alpha")
            .unwrap()
            .execute("task", &context)
            .await
            .unwrap();
        assert_eq!(output, json!("second"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = SubAgentRegistry::new("orchestrator");
        registry.add(NamedAgent::new("alpha", "a")).unwrap();

        assert!(registry.remove("alpha"));
        assert!(!registry.remove("alpha"));
        assert!(registry.names().is_empty());
    }
}
