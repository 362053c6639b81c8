use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Defaults read from `<config_dir>/sonar-batch/config.toml`.
/// Command-line flags and environment variables take precedence.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    /// Quality profile forced for every project (`sonar.profile`)
    pub profile: Option<String>,
}

/// Returns the path to the config file: `<config_dir>/sonar-batch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sonar-batch").join("config.toml"))
}

/// Load config from the default path. Returns default if missing or malformed.
pub fn load() -> StoredConfig {
    match config_path() {
        Some(p) => load_from(&p),
        None => {
            tracing::warn!("Could not determine config directory");
            StoredConfig::default()
        }
    }
}

pub fn load_from(path: &Path) -> StoredConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("Malformed config at {}: {e}", path.display());
                StoredConfig::default()
            }
        },
        Err(_) => StoredConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_returns_default() {
        let dir = std::env::temp_dir().join("sonar-batch-test-load-nonexistent");
        let path = dir.join("config.toml");
        let _ = std::fs::remove_file(&path);

        let cfg = load_from(&path);
        assert!(cfg.url.is_none());
        assert!(cfg.token.is_none());
        assert!(cfg.profile.is_none());
    }

    #[test]
    fn test_load_all_fields() {
        let dir = std::env::temp_dir().join("sonar-batch-test-all-fields");
        let path = dir.join("config.toml");
        let _ = std::fs::create_dir_all(&dir);
        std::fs::write(
            &path,
            "url = \"https://sonar.example.com\"\n\
             token = \"squ_abc123\"\n\
             profile = \"Sonar way\"\n",
        )
        .unwrap();

        let loaded = load_from(&path);
        assert_eq!(loaded.url.as_deref(), Some("https://sonar.example.com"));
        assert_eq!(loaded.token.as_deref(), Some("squ_abc123"));
        assert_eq!(loaded.profile.as_deref(), Some("Sonar way"));

        // cleanup
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn test_load_malformed_returns_default() {
        let dir = std::env::temp_dir().join("sonar-batch-test-malformed");
        let path = dir.join("config.toml");
        let _ = std::fs::create_dir_all(&dir);
        std::fs::write(&path, "this is not valid toml {{{{").unwrap();

        let cfg = load_from(&path);
        assert!(cfg.url.is_none());
        assert!(cfg.token.is_none());

        // cleanup
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let dir = std::env::temp_dir().join("sonar-batch-test-unknown-keys");
        let path = dir.join("config.toml");
        let _ = std::fs::create_dir_all(&dir);
        std::fs::write(&path, "url = \"http://x\"\nstrategy = \"cache_first\"\n").unwrap();

        let cfg = load_from(&path);
        assert_eq!(cfg.url.as_deref(), Some("http://x"));

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }
}
