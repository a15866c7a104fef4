use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::catalog::Catalog;
use crate::storage::JsonStore;
use crate::Result;

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the session and user directory files live (`KITTY_HOME`).
    pub data_dir: PathBuf,
    /// Replacement catalog file (`KITTY_CATALOG`); the embedded one otherwise.
    pub catalog_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = match non_empty(lookup("KITTY_HOME")) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let dir = default_data_dir();
                info!("KITTY_HOME not set, using default: {}", dir.display());
                dir
            }
        };
        let catalog_path = non_empty(lookup("KITTY_CATALOG")).map(PathBuf::from);
        if let Some(path) = &catalog_path {
            info!("Using catalog file {}", path.display());
        }
        Self {
            data_dir,
            catalog_path,
        }
    }

    pub fn store(&self) -> JsonStore {
        JsonStore::new(&self.data_dir)
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::from_json(&std::fs::read_to_string(path)?),
            None => Catalog::builtin(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// ~/.kitty/
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kitty")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.data_dir, default_data_dir());
        assert_eq!(config.catalog_path, None);
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(|key| match key {
            "KITTY_HOME" => Some("/tmp/kitty".to_string()),
            "KITTY_CATALOG" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.data_dir, PathBuf::from("/tmp/kitty"));
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.store().dir(), PathBuf::from("/tmp/kitty").as_path());
    }

    #[test]
    fn test_catalog_file_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"products":[]}"#).unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            catalog_path: Some(path),
        };
        assert!(config.load_catalog().unwrap().products().is_empty());
    }
}
