use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{DeskError, DeskResult};

// Default configuration values
const DEFAULT_API_ROOT: &str = "http://localhost:8000/api/";
const SESSION_FILE: &str = "session.json";
const CACHE_FILE: &str = "cache.json";

/// Main configuration struct for eventdesk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Where session and cache files live
    #[serde(default)]
    pub storage: StorageConfig,
    /// Collection cache behaviour
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root that request paths are appended to
    #[serde(default = "default_api_root")]
    pub root_url: String,
    /// Per-request timeout; none is enforced when unset
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: Option<u64>,
}

/// Locations of persisted client state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the session and cache files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(CACHE_FILE)
    }
}

/// What an empty successful list response means for the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyListPolicy {
    /// An empty list is real: show it and overwrite the cache
    Authoritative,
    /// Keep the cache and show it instead of an empty list
    Fallback,
}

impl std::str::FromStr for EmptyListPolicy {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authoritative" => Ok(EmptyListPolicy::Authoritative),
            "fallback" => Ok(EmptyListPolicy::Fallback),
            other => Err(DeskError::Config(format!(
                "unknown empty list policy '{}'",
                other
            ))),
        }
    }
}

/// Collection cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether task/event lists are cached at all
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_empty_list_policy")]
    pub empty_list_policy: EmptyListPolicy,
}

// Default functions
fn default_api_root() -> String {
    std::env::var("EVENTDESK_API_ROOT").unwrap_or_else(|_| DEFAULT_API_ROOT.to_string())
}

fn default_timeout() -> Option<u64> {
    std::env::var("EVENTDESK_TIMEOUT_SECONDS")
        .ok()
        .and_then(|val| val.parse().ok())
}

fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("EVENTDESK_DATA_DIR") {
        return PathBuf::from(path);
    }

    dirs_next::data_dir()
        .map(|dir| dir.join("eventdesk"))
        .unwrap_or_else(|| PathBuf::from(".eventdesk"))
}

fn default_cache_enabled() -> bool {
    std::env::var("EVENTDESK_CACHE_ENABLED")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(true)
}

fn default_empty_list_policy() -> EmptyListPolicy {
    match std::env::var("EVENTDESK_EMPTY_LIST_POLICY") {
        Ok(val) => val.parse().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring EVENTDESK_EMPTY_LIST_POLICY");
            EmptyListPolicy::Authoritative
        }),
        Err(_) => EmptyListPolicy::Authoritative,
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            root_url: default_api_root(),
            request_timeout_seconds: default_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            empty_list_policy: default_empty_list_policy(),
        }
    }
}

/// Manages configuration for the application
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<Config>>,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a configuration manager using the default config location
    pub async fn new() -> DeskResult<Self> {
        let config_path = get_config_path()?;
        Self::with_path(config_path).await
    }

    /// Create a configuration manager for an explicit config file
    pub async fn with_path(config_path: impl Into<PathBuf>) -> DeskResult<Self> {
        let config_path = config_path.into();
        let config = load_or_create_config(&config_path).await?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    /// Get a clone of the current configuration
    pub async fn get_config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Update the configuration
    pub async fn update_config(&self, new_config: Config) -> DeskResult<()> {
        *self.config.write().await = new_config.clone();
        save_config(&self.config_path, &new_config).await
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Get the path to the configuration file
fn get_config_path() -> DeskResult<PathBuf> {
    // Check for explicit config path from environment
    if let Ok(path) = std::env::var("EVENTDESK_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }

    if let Some(user_config_dir) = dirs_next::config_dir() {
        return Ok(user_config_dir.join("eventdesk").join("config.json"));
    }

    // Fallback to current directory
    Ok(PathBuf::from("eventdesk.json"))
}

/// Load configuration from file or create default
async fn load_or_create_config(path: &Path) -> DeskResult<Config> {
    if !path.exists() {
        let default_config = Config::default();
        save_config(path, &default_config).await?;
        info!("Created default configuration at {}", path.display());
        return Ok(default_config);
    }

    let config_str = fs::read_to_string(path)
        .await
        .map_err(|e| DeskError::Config(format!("{}: {}", path.display(), e)))?;
    let config: Config = serde_json::from_str(&config_str)
        .map_err(|e| DeskError::Config(format!("{}: {}", path.display(), e)))?;
    debug!("Loaded configuration from {}", path.display());

    Ok(config)
}

/// Save configuration to file
async fn save_config(path: &Path, config: &Config) -> DeskResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DeskError::Config(e.to_string()))?;
        }
    }

    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(path, config_str)
        .await
        .map_err(|e| DeskError::Config(e.to_string()))?;
    debug!("Saved configuration to {}", path.display());

    Ok(())
}
