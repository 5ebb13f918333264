use serde::{Deserialize, Serialize};

/// Top-level settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Remote gist and scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    pub api_base_url: String,
    pub gist_filename: String,
    pub gist_description: String,
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    format!("tabshelf/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            gist_filename: "tabshelf-collections.json".to_string(),
            gist_description: "tabshelf collections".to_string(),
            interval_secs: 300,
            request_timeout_secs: 30,
            user_agent: default_user_agent(),
        }
    }
}

/// Local persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    pub debounce_ms: u64,
    pub database_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            database_file: "tabshelf.db".to_string(),
        }
    }
}
