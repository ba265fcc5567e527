use anyhow::Result;
use std::path::{Path, PathBuf};

const BASE_PATH_ENV: &str = "CINESYNC_BASE_PATH";

/// Base directory from `CINESYNC_BASE_PATH`, if set.
pub fn base_path_override() -> Option<PathBuf> {
    std::env::var(BASE_PATH_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("cinesync");
        Ok(Self::from_base(base_dir))
    }

    /// Config file at the base, data in a subdirectory.
    pub fn from_base(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Default location of the persisted document store.
    pub fn documents_file(&self) -> PathBuf {
        self.data_dir.join("documents.json")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        if let Some(base) = base_path_override() {
            return Self::from_base(base);
        }

        // Platform config directory (e.g. ~/.config/cinesync on Linux), or the
        // working directory when there is none.
        Self::new().unwrap_or_else(|_| Self::from_base(".cinesync"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_from_base() {
        let paths = PathManager::from_base("/tmp/cs");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/cs/config.toml"));
        assert_eq!(paths.documents_file(), PathBuf::from("/tmp/cs/data/documents.json"));
    }

    #[test]
    fn test_ensure_directories() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::from_base(dir.path().join("cinesync"));
        paths.ensure_directories().unwrap();
        assert!(paths.data_dir().is_dir());
        assert!(paths.config_dir().is_dir());
    }
}
