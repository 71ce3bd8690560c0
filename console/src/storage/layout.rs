//! Storage layout configuration

use std::path::PathBuf;

use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// Environment variable overriding the base directory
pub const HOME_ENV: &str = "FLUX_ACTION_HOME";

/// Storage layout for the console
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all storage
    pub base_dir: PathBuf,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the settings file path
    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    /// Directory backing the key-value store
    pub fn store_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("store"))
    }

    /// Default destination for downloaded workflows
    pub fn downloads_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("downloads"))
    }

    /// Get the logs directory
    pub fn logs_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("logs"))
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::new(home);
        }
        match std::env::var_os("HOME").filter(|v| !v.is_empty()) {
            Some(home) => Self::new(PathBuf::from(home).join(".flux-action")),
            None => Self::new(".flux-action"),
        }
    }
}
