//! Bootstrap configuration loading and credential resolution
//!
//! Configuration file resolution follows this priority order:
//! 1. Explicit path (command-line argument or `FOURPLAY_CONFIG`)
//! 2. User config: `~/.config/fourplay/fourplay.toml`
//! 3. System config: `/etc/fourplay/fourplay.toml` (Linux only)
//! 4. Compiled defaults (a missing file is a warning, never fatal)
//!
//! Provider credentials resolve Environment → TOML.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file name looked up in the platform config directories
pub const CONFIG_FILE_NAME: &str = "fourplay.toml";

/// Environment variable overriding the Last.fm API key
pub const LASTFM_API_KEY_ENV: &str = "FOURPLAY_LASTFM_API_KEY";

/// Environment variable overriding the Discogs personal token
pub const DISCOGS_TOKEN_ENV: &str = "FOURPLAY_DISCOGS_TOKEN";

/// Bootstrap configuration loaded from TOML file
///
/// Every field has a compiled default, so an empty file (or no file at all)
/// yields a runnable configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TomlConfig {
    /// Interface to bind the HTTP server on
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// User-Agent sent to providers that require one (MusicBrainz, Discogs)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub providers: ProviderUrls,

    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Interval between active purges of expired entries (0 = lazy expiry only)
    #[serde(default)]
    pub sweep_interval_secs: u64,
}

/// Backoff strategy between fetch attempts
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Same delay before every retry
    #[default]
    Fixed,
    /// Delay multiplied by `backoff_factor` after each retry, capped at `max_delay_ms`
    Exponential,
}

/// Provider fetch retry policy
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FetchConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Deadline for a single attempt (milliseconds)
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    /// Delay separating attempts (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default)]
    pub backoff: BackoffKind,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Base URLs of the four upstream providers
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProviderUrls {
    #[serde(default = "default_musicbrainz_url")]
    pub musicbrainz: String,

    #[serde(default = "default_listenbrainz_url")]
    pub listenbrainz: String,

    #[serde(default = "default_discogs_url")]
    pub discogs: String,

    #[serde(default = "default_lastfm_url")]
    pub lastfm: String,
}

/// Provider credentials as written in the TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub lastfm_api_key: Option<String>,

    #[serde(default)]
    pub discogs_token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_user_agent() -> String {
    "FOURplay-Microservice/1.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_max_attempts() -> u32 {
    3
}

fn default_attempt_timeout_ms() -> u64 {
    6000
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_musicbrainz_url() -> String {
    "https://musicbrainz.org/ws/2".to_string()
}

fn default_listenbrainz_url() -> String {
    "https://api.listenbrainz.org".to_string()
}

fn default_discogs_url() -> String {
    "https://api.discogs.com".to_string()
}

fn default_lastfm_url() -> String {
    "https://ws.audioscrobbler.com".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user_agent: default_user_agent(),
            logging: LoggingConfig::default(),
            cache: CacheConfig::default(),
            fetch: FetchConfig::default(),
            providers: ProviderUrls::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            sweep_interval_secs: 0,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff: BackoffKind::default(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for ProviderUrls {
    fn default() -> Self {
        Self {
            musicbrainz: default_musicbrainz_url(),
            listenbrainz: default_listenbrainz_url(),
            discogs: default_discogs_url(),
            lastfm: default_lastfm_url(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_attempts == 0 {
            return Err(Error::Config("fetch.max_attempts must be at least 1".to_string()));
        }
        if self.fetch.attempt_timeout_ms == 0 {
            return Err(Error::Config("fetch.attempt_timeout_ms must be non-zero".to_string()));
        }
        if self.fetch.backoff == BackoffKind::Exponential && self.fetch.backoff_factor < 1.0 {
            return Err(Error::Config(format!(
                "fetch.backoff_factor must be >= 1.0, got {}",
                self.fetch.backoff_factor
            )));
        }
        Ok(())
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    TomlConfig::from_toml_str(&content)
}

/// Find the config file to load, if any
///
/// An explicit path is returned as-is (existence is checked by the loader).
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let user_config = dirs::config_dir().map(|d| d.join("fourplay").join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/fourplay").join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load bootstrap configuration
///
/// A missing explicit file or a malformed file is an error. When no file is
/// found in the default locations, compiled defaults are used.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    match locate_config_file(explicit) {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => {
            warn!("No {} found, using compiled defaults", CONFIG_FILE_NAME);
            Ok(TomlConfig::default())
        }
    }
}

/// Validate credential value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve one credential with Environment → TOML priority
///
/// Returns `None` when neither source holds a valid value.
pub fn resolve_credential(name: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} found in both environment ({}) and TOML. Using environment (highest priority).",
            name, env_var
        );
    }

    if let Some(key) = env_key {
        info!("{} loaded from environment variable", name);
        return Some(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!("{} loaded from TOML config", name);
        return Some(key.trim().to_string());
    }

    warn!("{} not configured; provider will be skipped", name);
    None
}

/// Resolved provider credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub lastfm_api_key: Option<String>,
    pub discogs_token: Option<String>,
}

impl Credentials {
    /// Resolve all provider credentials from environment and TOML
    pub fn resolve(config: &CredentialsConfig) -> Self {
        Self {
            lastfm_api_key: resolve_credential(
                "Last.fm API key",
                LASTFM_API_KEY_ENV,
                config.lastfm_api_key.as_deref(),
            ),
            discogs_token: resolve_credential(
                "Discogs token",
                DISCOGS_TOKEN_ENV,
                config.discogs_token.as_deref(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.attempt_timeout_ms, 6000);
        assert_eq!(config.fetch.retry_delay_ms, 500);
        assert_eq!(config.fetch.backoff, BackoffKind::Fixed);
    }

    #[test]
    fn test_partial_sections_keep_field_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            port = 9090

            [fetch]
            backoff = "exponential"

            [providers]
            lastfm = "http://localhost:1234"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.fetch.backoff, BackoffKind::Exponential);
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.providers.lastfm, "http://localhost:1234");
        assert_eq!(config.providers.musicbrainz, "https://musicbrainz.org/ws/2");
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = TomlConfig::from_toml_str("[fetch]\nmax_attempts = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_shrinking_backoff_rejected() {
        let result = TomlConfig::from_toml_str(
            "[fetch]\nbackoff = \"exponential\"\nbackoff_factor = 0.5\n",
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("port = \"not a number\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }
}
