//! Loads a project `.env` file into a map, without touching the process
//! environment (the caller in `lib.rs` decides precedence).

use std::collections::HashMap;
use std::path::Path;

use crate::error::LoadError;

fn dotenv_path(override_dir: Option<&Path>) -> Option<std::path::PathBuf> {
    let dir = override_dir.map(Path::to_path_buf).or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Loads `.env` from `override_dir` or the current directory. A missing file
/// returns an empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = dotenv_path(override_dir) else {
        return Ok(HashMap::new());
    };
    dotenv::from_path_iter(&path)?.collect::<Result<HashMap<_, _>, _>>().map_err(LoadError::DotenvRead)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: no `.env` present in the target directory yields an empty map.
    #[test]
    fn load_env_map_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert!(m.is_empty());
    }

    /// **Scenario**: `KEY=value` pairs round-trip into the map.
    #[test]
    fn load_env_map_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "A=1\nB=2\n").unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(m.get("A"), Some(&"1".to_string()));
        assert_eq!(m.get("B"), Some(&"2".to_string()));
    }
}
