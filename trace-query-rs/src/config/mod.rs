//! Configuration management for the translation pipeline
//!
//! Values are read through a `ConfigProvider` so the same loaders work for
//! environment variables (the default, prefixed `TRACE_QUERY_`) and for
//! in-memory maps in tests.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TranslateError};

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;

    /// Whether `key` has a value at all
    fn contains(&self, key: &str) -> bool;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.trim().parse::<i64>().map_err(|e| {
            TranslateError::configuration(format!("Invalid integer for key {}: {}", key, e))
        })
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(TranslateError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an integer configuration value; `default` only when the key is unset
    fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        if self.contains(key) {
            self.get_int(key)
        } else {
            Ok(default)
        }
    }

    /// Get a boolean configuration value; `default` only when the key is unset
    fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        if self.contains(key) {
            self.get_bool(key)
        } else {
            Ok(default)
        }
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                TranslateError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => TranslateError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }

    fn contains(&self, key: &str) -> bool {
        env::var_os(self.format_key(key)).is_some()
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values.get(key).cloned().ok_or_else(|| {
            TranslateError::configuration(format!("Configuration key not found: {}", key))
        })
    }

    fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Negative durations are clamped to zero, which `validate` then rejects
fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Global default configuration provider
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("TRACE_QUERY")));

/// Trait for remote-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;
}

pub const DEFAULT_METADATA_BASE_URL: &str = "http://localhost:16686/api";
pub const DEFAULT_GENERATION_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_HEALTH_PATH: &str = "/api/tags";
pub const DEFAULT_GENERATE_PATH: &str = "/api/generate";
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Liveness must fail fast.
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 5_000;

/// Model inference is slow and rare.
pub const DEFAULT_GENERATE_TIMEOUT_MS: u64 = 30_000;

/// Configuration for the trace-metadata API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Base URL the `/services` routes hang off
    pub base_url: String,

    /// Timeout for each metadata request in seconds
    pub timeout_seconds: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_METADATA_BASE_URL.to_string(),
            timeout_seconds: 10,
        }
    }
}

impl MetadataConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self {
            base_url: provider.get_string_or("metadata_base_url", DEFAULT_METADATA_BASE_URL),
            timeout_seconds: non_negative(provider.get_int_or("metadata_timeout_seconds", 10)?),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ServiceConfig for MetadataConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(TranslateError::configuration("Metadata base URL is required"));
        }

        if self.timeout_seconds == 0 {
            return Err(TranslateError::configuration("Metadata timeout must be positive"));
        }

        Ok(())
    }
}

/// Configuration for the local generation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the generation service
    pub base_url: String,

    /// Liveness path, probed with GET
    pub health_path: String,

    /// Completion path, called with POST
    pub generate_path: String,

    /// Model name sent with every completion
    pub model: String,

    /// Liveness timeout in milliseconds
    pub health_timeout_ms: u64,

    /// Completion timeout in milliseconds
    pub generate_timeout_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GENERATION_BASE_URL.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            generate_path: DEFAULT_GENERATE_PATH.to_string(),
            model: DEFAULT_MODEL.to_string(),
            health_timeout_ms: DEFAULT_HEALTH_TIMEOUT_MS,
            generate_timeout_ms: DEFAULT_GENERATE_TIMEOUT_MS,
        }
    }
}

impl GenerationConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self {
            base_url: provider.get_string_or("generation_base_url", DEFAULT_GENERATION_BASE_URL),
            health_path: provider.get_string_or("generation_health_path", DEFAULT_HEALTH_PATH),
            generate_path: provider.get_string_or("generation_generate_path", DEFAULT_GENERATE_PATH),
            model: provider.get_string_or("generation_model", DEFAULT_MODEL),
            health_timeout_ms: non_negative(provider.get_int_or(
                "generation_health_timeout_ms",
                DEFAULT_HEALTH_TIMEOUT_MS as i64,
            )?),
            generate_timeout_ms: non_negative(provider.get_int_or(
                "generation_generate_timeout_ms",
                DEFAULT_GENERATE_TIMEOUT_MS as i64,
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_millis(self.generate_timeout_ms)
    }
}

impl ServiceConfig for GenerationConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(TranslateError::configuration("Generation base URL is required"));
        }

        if self.model.trim().is_empty() {
            return Err(TranslateError::configuration("Generation model name is required"));
        }

        if self.health_timeout_ms == 0 || self.generate_timeout_ms == 0 {
            return Err(TranslateError::configuration("Generation timeouts must be positive"));
        }

        Ok(())
    }
}

/// Top-level configuration of a `Translator`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub metadata: MetadataConfig,
    pub generation: GenerationConfig,

    /// Fold operations into `http.route` tags and check them against known routes
    pub route_validation: bool,
}

impl TranslatorConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        Ok(Self {
            metadata: MetadataConfig::from_provider(provider)?,
            generation: GenerationConfig::from_provider(provider)?,
            route_validation: provider.get_bool_or("route_validation", false)?,
        })
    }

    /// Load configuration from the process environment, reading `.env` first
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_provider(&**DEFAULT_PROVIDER)
    }
}
