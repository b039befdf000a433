//! Orchestrator configuration
//!
//! `SwarmConfig` carries the construction-time defaults for swarm execution.
//! It can be built directly, deserialized, or coerced from a plain JSON map
//! via [`SwarmConfig::from_value`], the form hosts hand the core after doing
//! their own config loading.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::SwarmStrategy;
use crate::{Error, Result};

/// Configuration for a [`SwarmOrchestrator`](crate::SwarmOrchestrator)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Default dispatch strategy
    pub strategy: SwarmStrategy,

    /// Maximum in-flight sub-agent calls in parallel strategy
    pub max_concurrency: usize,

    /// Per-attempt timeout in seconds (`None` or <= 0 disables)
    pub sub_agent_timeout: Option<f64>,

    /// Additional attempts after the first for a failing sub-agent
    pub sub_agent_retries: u32,

    /// Stop dispatching on the first non-successful result
    pub fail_fast: bool,

    /// Give each sub-agent an isolated deep-copied context state
    pub isolate_context: bool,

    /// Maximum in-flight tasks for mass-swarm execution
    pub max_task_concurrency: usize,

    /// Emit metrics payloads through the default tracing sink
    pub metrics_logging: bool,

    /// Maximum in-memory metric records and history entries retained
    pub metrics_history_limit: usize,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            strategy: SwarmStrategy::Parallel,
            max_concurrency: 8,
            sub_agent_timeout: Some(30.0),
            sub_agent_retries: 0,
            fail_fast: false,
            isolate_context: true,
            max_task_concurrency: 4,
            metrics_logging: true,
            metrics_history_limit: 200,
        }
    }
}

impl SwarmConfig {
    /// Build a configuration from a plain JSON map.
    ///
    /// Unknown keys are ignored. Values are coerced leniently: numeric
    /// strings count as numbers and truthy strings ("1", "true", "yes",
    /// "on") count as booleans. Concurrency caps that cannot be coerced to
    /// a positive integer are an [`Error::InvalidConfig`]; other malformed
    /// values fall back to their defaults.
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut config = Self::default();
        let Some(map) = value.as_object() else {
            if value.is_null() {
                return Ok(config);
            }
            return Err(Error::InvalidConfig(
                "configuration must be a JSON object".to_string(),
            ));
        };

        if let Some(raw) = map.get("strategy") {
            if let Some(text) = raw.as_str() {
                config.strategy = SwarmStrategy::resolve(text);
            }
        }
        if let Some(raw) = map.get("max_concurrency") {
            config.max_concurrency = coerce_concurrency("max_concurrency", raw)?;
        }
        if let Some(raw) = map.get("max_task_concurrency") {
            config.max_task_concurrency = coerce_concurrency("max_task_concurrency", raw)?;
        }
        if let Some(raw) = map.get("sub_agent_timeout") {
            config.sub_agent_timeout = coerce_timeout(raw);
        }
        if let Some(raw) = map.get("sub_agent_retries") {
            config.sub_agent_retries = coerce_int(raw)
                .map(|n| n.max(0) as u32)
                .unwrap_or(config.sub_agent_retries);
        }
        if let Some(raw) = map.get("fail_fast") {
            config.fail_fast = coerce_bool(raw);
        }
        if let Some(raw) = map.get("isolate_context") {
            config.isolate_context = coerce_bool(raw);
        }
        if let Some(raw) = map.get("metrics_logging") {
            config.metrics_logging = coerce_bool(raw);
        }
        if let Some(raw) = map.get("metrics_history_limit") {
            config.metrics_history_limit = coerce_int(raw)
                .map(|n| n.max(1) as usize)
                .unwrap_or(config.metrics_history_limit);
        }

        Ok(config)
    }

    /// Per-attempt timeout with the disable rule applied (<= 0 means none).
    pub fn effective_timeout(&self) -> Option<f64> {
        normalize_timeout(self.sub_agent_timeout)
    }
}

/// Clamp a timeout to the "positive seconds or disabled" contract.
pub(crate) fn normalize_timeout(timeout: Option<f64>) -> Option<f64> {
    timeout.filter(|secs| secs.is_finite() && *secs > 0.0)
}

fn coerce_concurrency(key: &str, raw: &Value) -> Result<usize> {
    let parsed = coerce_int(raw).ok_or_else(|| {
        Error::InvalidConfig(format!("{key} must be a positive integer, got {raw}"))
    })?;
    Ok(parsed.max(1) as usize)
}

fn coerce_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn coerce_bool(raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

fn coerce_timeout(raw: &Value) -> Option<f64> {
    let secs = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    normalize_timeout(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_documented_table() {
        let config = SwarmConfig::default();
        assert_eq!(config.strategy, SwarmStrategy::Parallel);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.sub_agent_timeout, Some(30.0));
        assert_eq!(config.sub_agent_retries, 0);
        assert!(!config.fail_fast);
        assert!(config.isolate_context);
        assert_eq!(config.max_task_concurrency, 4);
    }

    #[test]
    fn test_from_value_coerces_lenient_types() {
        let config = SwarmConfig::from_value(&json!({
            "strategy": "  SEQUENTIAL ",
            "max_concurrency": "6",
            "sub_agent_timeout": "2.5",
            "sub_agent_retries": 3,
            "fail_fast": "yes",
            "isolate_context": "0",
        }))
        .unwrap();

        assert_eq!(config.strategy, SwarmStrategy::Sequential);
        assert_eq!(config.max_concurrency, 6);
        assert_eq!(config.sub_agent_timeout, Some(2.5));
        assert_eq!(config.sub_agent_retries, 3);
        assert!(config.fail_fast);
        assert!(!config.isolate_context);
    }

    #[test]
    fn test_from_value_clamps_concurrency_to_one() {
        let config = SwarmConfig::from_value(&json!({
            "max_concurrency": -4,
            "max_task_concurrency": 0,
        }))
        .unwrap();

        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.max_task_concurrency, 1);
    }

    #[test]
    fn test_from_value_rejects_non_numeric_concurrency() {
        let err = SwarmConfig::from_value(&json!({"max_concurrency": "lots"})).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = SwarmConfig::from_value(&json!({"max_task_concurrency": []})).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_non_positive_timeout_disables() {
        let config = SwarmConfig::from_value(&json!({"sub_agent_timeout": 0})).unwrap();
        assert_eq!(config.effective_timeout(), None);

        let config = SwarmConfig::from_value(&json!({"sub_agent_timeout": -1.5})).unwrap();
        assert_eq!(config.effective_timeout(), None);

        let config = SwarmConfig::from_value(&json!({"sub_agent_timeout": null})).unwrap();
        assert_eq!(config.effective_timeout(), None);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = SwarmConfig::from_value(&json!({"unrelated": {"nested": true}})).unwrap();
        assert_eq!(config.max_concurrency, 8);
    }

    #[test]
    fn test_null_config_uses_defaults() {
        let config = SwarmConfig::from_value(&Value::Null).unwrap();
        assert_eq!(config.metrics_history_limit, 200);
    }
}
