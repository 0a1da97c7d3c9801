//! Configuration types for post-harvest

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Harvest behavior configuration (pacing, batching, concurrency)
///
/// Groups settings related to how tasks traverse the platform and how
/// aggressively requests are issued. Used as a nested sub-config within
/// [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HarvestConfig {
    /// Minimum delay between item saves (default: 500 ms)
    #[serde(default = "default_min_delay", with = "duration_ms_serde")]
    pub min_delay: Duration,

    /// Maximum delay between item saves (default: 1000 ms)
    ///
    /// Each inter-item pause is drawn uniformly from
    /// `[min_delay, max_delay]`.
    #[serde(default = "default_max_delay", with = "duration_ms_serde")]
    pub max_delay: Duration,

    /// Fixed pause after a fetch error before the next attempt (default: 10 s)
    #[serde(default = "default_error_backoff", with = "duration_serde")]
    pub error_backoff: Duration,

    /// Page size used when fetching listings (default: 100)
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Upper bound accepted for a task's target_count (default: 100 000)
    #[serde(default = "default_max_target_count")]
    pub max_target_count: u32,

    /// Consecutive fetch failures tolerated before a task is marked
    /// failed (default: 3)
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,

    /// Maximum tasks running at once (default: 4)
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            min_delay: default_min_delay(),
            max_delay: default_max_delay(),
            error_backoff: default_error_backoff(),
            batch_size: default_batch_size(),
            max_target_count: default_max_target_count(),
            retry_budget: default_retry_budget(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
        }
    }
}

/// A platform API credential (application id/secret plus user agent)
///
/// Each credential gets its own source client; the pool picks one at
/// random per request so traffic spreads across the set.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialConfig {
    /// Application client id
    pub client_id: String,

    /// Application client secret
    pub client_secret: String,

    /// User agent string sent with every request
    pub user_agent: String,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "post-harvest.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Append-only export log path (default: "data.txt")
    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            export_path: default_export_path(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8642)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Platform endpoint configuration
///
/// Points the HTTP source at the platform. Overridable so tests can aim
/// at a local mock server.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SourceConfig {
    /// Base URL of the platform listing API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the platform token endpoint
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,

    /// Request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            auth_base_url: default_auth_base_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Main configuration for the harvester
///
/// Fields are organized into logical sub-configs:
/// - [`harvest`](HarvestConfig) - pacing, batching, retry budget, worker pool
/// - [`credentials`](CredentialConfig) - platform API credentials (at least one required)
/// - [`source`](SourceConfig) - platform endpoints and HTTP timeouts
/// - [`persistence`](PersistenceConfig) - database and export log paths
/// - [`api`](ApiConfig) - embedded REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Platform API credentials (at least one required)
    pub credentials: Vec<CredentialConfig>,

    /// Harvest behavior settings
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Platform endpoint settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

// Default value functions
fn default_min_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_millis(1000)
}

fn default_error_backoff() -> Duration {
    Duration::from_secs(10)
}

fn default_batch_size() -> u32 {
    100
}

fn default_max_target_count() -> u32 {
    100_000
}

fn default_retry_budget() -> u32 {
    3
}

fn default_max_concurrent_tasks() -> usize {
    4
}

fn default_database_path() -> PathBuf {
    PathBuf::from("post-harvest.db")
}

fn default_export_path() -> PathBuf {
    PathBuf::from("data.txt")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8642))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_auth_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper (integer seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (integer milliseconds, for sub-second delays)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
