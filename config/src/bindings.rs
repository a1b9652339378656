//! Agent-binding schema (§6.2): `{agent_name -> {provider, model,
//! temperature, max_tokens, timeout_seconds, description}}`, loaded from a
//! JSON file and validated (required fields, `provider` enum).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const VALID_PROVIDERS: &[&str] = &["openai", "anthropic", "perplexity"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingSpec {
    pub provider: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_seconds() -> u64 {
    60
}

/// Loads and validates `path` as a JSON map of agent name to [`BindingSpec`].
pub fn load_bindings(path: &Path) -> Result<HashMap<String, BindingSpec>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
    let bindings: HashMap<String, BindingSpec> =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;

    for (agent_name, binding) in &bindings {
        validate_binding(agent_name, binding)?;
    }

    Ok(bindings)
}

fn validate_binding(agent_name: &str, binding: &BindingSpec) -> Result<(), ConfigError> {
    if !VALID_PROVIDERS.contains(&binding.provider.as_str()) {
        return Err(ConfigError::InvalidBinding {
            agent_name: agent_name.to_string(),
            message: format!("unknown provider {:?}, expected one of {VALID_PROVIDERS:?}", binding.provider),
        });
    }
    if binding.model.trim().is_empty() {
        return Err(ConfigError::InvalidBinding { agent_name: agent_name.to_string(), message: "model must not be empty".into() });
    }
    if binding.max_tokens == 0 {
        return Err(ConfigError::InvalidBinding { agent_name: agent_name.to_string(), message: "max_tokens must be greater than 0".into() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a well-formed bindings file loads one entry per agent name.
    #[test]
    fn load_bindings_parses_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.json");
        std::fs::write(
            &path,
            r#"{"research": {"provider": "perplexity", "model": "sonar-pro", "max_tokens": 2000}}"#,
        )
        .unwrap();

        let bindings = load_bindings(&path).unwrap();
        assert_eq!(bindings["research"].model, "sonar-pro");
        assert_eq!(bindings["research"].temperature, 0.2);
    }

    /// **Scenario**: an unknown provider is rejected at load time, not deferred to runtime.
    #[test]
    fn load_bindings_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.json");
        std::fs::write(&path, r#"{"research": {"provider": "bogus", "model": "x", "max_tokens": 100}}"#).unwrap();

        let err = load_bindings(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBinding { .. }));
    }
}
