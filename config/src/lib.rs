//! Configuration (§6.2): XDG `config.toml` + project `.env`, precedence
//! env > .env > XDG; agent-binding and MCP-server-registry schema loading.
//! Secrets are read from the process environment only — never from config
//! JSON (§6.2).

mod dotenv;
mod xdg_toml;

pub mod bindings;
pub mod error;
pub mod mcp_registry;

use std::path::Path;

pub use bindings::{load_bindings, BindingSpec};
pub use error::{ConfigError, LoadError};
pub use mcp_registry::{load_mcp_registry, McpServerSpec};

/// Loads config from XDG `config.toml` and optional project `.env`, then
/// sets environment variables only for keys not already set in the process
/// environment (so existing env wins).
///
/// Precedence when a key is missing from the process environment:
/// 1. Project `.env` (current directory, or `override_dir` if given)
/// 2. `$XDG_CONFIG_HOME/<app_name>/config.toml`'s `[env]` table
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir)?;

    let mut keys: std::collections::HashSet<String> = xdg_map.keys().cloned().collect();
    keys.extend(dotenv_map.keys().cloned());

    for key in keys {
        if std::env::var(&key).is_ok() {
            continue;
        }
        if let Some(value) = dotenv_map.get(&key).or_else(|| xdg_map.get(&key)) {
            std::env::set_var(&key, value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// **Scenario**: a key already set in the process environment is never
    /// overwritten by `.env` or XDG values.
    #[test]
    fn existing_env_wins() {
        env::set_var("KIAGENT_CONFIG_TEST_EXISTING", "from_env");
        let _ = load_and_apply("kiagent-test", None);
        assert_eq!(env::var("KIAGENT_CONFIG_TEST_EXISTING").as_deref(), Ok("from_env"));
        env::remove_var("KIAGENT_CONFIG_TEST_EXISTING");
    }

    /// **Scenario**: no XDG file and no `.env` is a no-op, not an error.
    #[test]
    fn load_and_apply_no_config_ok() {
        let r = load_and_apply("kiagent-nonexistent-app-xyz", None::<&Path>);
        assert!(r.is_ok());
    }

    /// **Scenario**: `.env` outranks the XDG `config.toml` value for the
    /// same key.
    #[test]
    fn dotenv_overrides_xdg() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let app_dir = xdg_dir.path().join("kiagent");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.toml"), "[env]\nKIAGENT_CONFIG_TEST_PRIORITY = \"from_xdg\"\n").unwrap();

        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(dotenv_dir.path().join(".env"), "KIAGENT_CONFIG_TEST_PRIORITY=from_dotenv\n").unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        env::remove_var("KIAGENT_CONFIG_TEST_PRIORITY");

        let _ = load_and_apply("kiagent", Some(dotenv_dir.path()));
        let val = env::var("KIAGENT_CONFIG_TEST_PRIORITY").unwrap();
        env::remove_var("KIAGENT_CONFIG_TEST_PRIORITY");
        match prev_xdg {
            Some(p) => env::set_var("XDG_CONFIG_HOME", p),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(val, "from_dotenv");
    }
}
