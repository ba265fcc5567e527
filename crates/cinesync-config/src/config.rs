use cinesync_models::Identity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Collection holding one document per user (`{collection}/{uid}`).
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Where the local document store is persisted. Defaults to
    /// `<data_dir>/documents.json`.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    /// Keep documents in memory only; nothing survives the process.
    #[serde(default)]
    pub in_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// User to sign in as when `--user` is not given.
    #[serde(default)]
    pub default_uid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Force JSON (true) or plain (false) logs; unset picks JSON when stdout
    /// is not a terminal.
    #[serde(default)]
    pub json: Option<bool>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

pub fn default_collection() -> String {
    "users".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            data_file: None,
            in_memory: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: None,
            file: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let collection = self.store.collection.trim();
        if collection.is_empty() {
            return Err(anyhow::anyhow!("store.collection cannot be empty"));
        }
        if collection.contains('/') {
            return Err(anyhow::anyhow!(
                "store.collection must be a single path segment, got '{}'",
                collection
            ));
        }

        if let Some(uid) = &self.user.default_uid {
            Identity::new(uid.as_str())
                .map_err(|e| anyhow::anyhow!("user.default_uid is invalid: {}", e))?;
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(anyhow::anyhow!("Invalid logging.level: {}", self.logging.level));
        }

        Ok(())
    }

    /// Resolved location of the persisted document store, or `None` when the
    /// store is in-memory only.
    pub fn documents_file(&self, default: PathBuf) -> Option<PathBuf> {
        if self.store.in_memory {
            return None;
        }
        Some(self.store.data_file.clone().unwrap_or(default))
    }

    pub fn default_identity(&self) -> Option<Identity> {
        self.user
            .default_uid
            .as_deref()
            .and_then(|uid| Identity::new(uid).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let config = Config {
            store: StoreConfig {
                collection: "profiles".to_string(),
                data_file: Some(PathBuf::from("/tmp/docs.json")),
                in_memory: false,
            },
            user: UserConfig {
                default_uid: Some("u1".to_string()),
            },
            logging: LoggingConfig::default(),
        };

        config.save_to_file(file.path()).unwrap();
        let loaded = Config::load_from_file(file.path()).unwrap();

        assert_eq!(loaded.store.collection, "profiles");
        assert_eq!(loaded.store.data_file, Some(PathBuf::from("/tmp/docs.json")));
        assert_eq!(loaded.user.default_uid.as_deref(), Some("u1"));
        assert_eq!(loaded.logging.level, "info");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.store.collection, "users");
        assert!(!config.store.in_memory);
        assert!(config.user.default_uid.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: Config = toml::from_str("[store]\nin_memory = true\n").unwrap();
        assert_eq!(config.store.collection, "users");
        assert!(config.store.in_memory);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.store.collection, "users");
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.store.collection = "users/nested".to_string();
        assert!(config.validate().is_err());

        config.store.collection = "  ".to_string();
        assert!(config.validate().is_err());

        config.store.collection = "users".to_string();
        config.user.default_uid = Some("".to_string());
        assert!(config.validate().is_err());

        config.user.default_uid = Some("u1".to_string());
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_documents_file_resolution() {
        let default = PathBuf::from("/data/documents.json");
        let mut config = Config::default();
        assert_eq!(config.documents_file(default.clone()), Some(default.clone()));

        config.store.data_file = Some(PathBuf::from("/elsewhere.json"));
        assert_eq!(
            config.documents_file(default.clone()),
            Some(PathBuf::from("/elsewhere.json"))
        );

        config.store.in_memory = true;
        assert_eq!(config.documents_file(default), None);
    }

    #[test]
    fn test_default_identity() {
        let mut config = Config::default();
        assert!(config.default_identity().is_none());
        config.user.default_uid = Some("u1".to_string());
        assert_eq!(config.default_identity().unwrap().uid(), "u1");
    }
}
