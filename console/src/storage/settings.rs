//! Settings file management

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,

    /// Also write logs to the layout's logs directory
    #[serde(default)]
    pub log_to_file: bool,

    /// Remote webhook call settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Listing defaults
    #[serde(default)]
    pub view: ViewSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            json_logs: false,
            log_to_file: false,
            http: HttpSettings::default(),
            view: ViewSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings, using defaults when the file is missing or unreadable
    pub async fn load(file: &File) -> Self {
        if !file.exists().await {
            return Self::default();
        }
        match file.read_json::<Settings>().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Unable to read settings file {:?}: {}", file.path(), e);
                Self::default()
            }
        }
    }
}

/// Webhook HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Page sizes offered by the console
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [5, 10, 20, 50, 100];

/// Listing defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Default page size
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
}

fn default_items_per_page() -> usize {
    20
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
        }
    }
}
