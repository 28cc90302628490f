//! Configuration types for the rosdns system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Ownership tag stamped on every record this system creates
pub const DEFAULT_OWNERSHIP_TAG: &str = "Managed By ExternalDNS";

/// TTL applied when an endpoint does not carry one (seconds)
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Default HTTP timeout for remote API requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosDnsConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Values applied to every mutation
    #[serde(default)]
    pub defaults: RecordDefaults,
}

impl RosDnsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.defaults.validate()?;
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// MikroTik RouterOS REST API
    Mikrotik {
        /// Base URL of the router (e.g. "https://192.168.88.1")
        base_url: String,
        /// API user name
        username: String,
        /// API password
        password: String,
        /// Accept self-signed router certificates
        #[serde(default)]
        skip_tls_verify: bool,
        /// Per-request timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Mikrotik {
                base_url,
                username,
                skip_tls_verify,
                timeout_secs,
                ..
            } => f
                .debug_struct("Mikrotik")
                .field("base_url", base_url)
                .field("username", username)
                .field("password", &"<REDACTED>")
                .field("skip_tls_verify", skip_tls_verify)
                .field("timeout_secs", timeout_secs)
                .finish(),
            ProviderConfig::Custom { factory, config } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", config)
                .finish(),
        }
    }
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Mikrotik {
                base_url,
                username,
                timeout_secs,
                ..
            } => {
                if base_url.is_empty() {
                    return Err(crate::Error::config("MikroTik base URL cannot be empty"));
                }
                if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "MikroTik base URL must use HTTP or HTTPS scheme. Got: {}",
                        base_url
                    )));
                }
                if username.is_empty() {
                    return Err(crate::Error::config("MikroTik username cannot be empty"));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("MikroTik request timeout must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Mikrotik { .. } => "mikrotik",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Mikrotik {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            skip_tls_verify: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Values supplied once at construction and applied to every mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDefaults {
    /// TTL used when an endpoint carries none (seconds)
    #[serde(default = "default_ttl_secs")]
    pub default_ttl: u64,

    /// Marker distinguishing managed records from everything else in the store
    ///
    /// Records whose comment differs are never listed, modified or deleted.
    #[serde(default = "default_ownership_tag")]
    pub ownership_tag: String,
}

impl RecordDefaults {
    /// Create defaults with an explicit ownership tag
    pub fn new(ownership_tag: impl Into<String>) -> Self {
        Self {
            default_ttl: default_ttl_secs(),
            ownership_tag: ownership_tag.into(),
        }
    }

    /// Set the default TTL
    pub fn with_default_ttl(mut self, default_ttl: u64) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Validate the defaults
    ///
    /// An empty ownership tag is rejected: without it managed records cannot
    /// be told apart from unmanaged ones.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ownership_tag.is_empty() {
            return Err(crate::Error::config(
                "Ownership tag cannot be empty - it identifies the records managed by this system",
            ));
        }
        Ok(())
    }
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self::new(default_ownership_tag())
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

fn default_ownership_tag() -> String {
    DEFAULT_OWNERSHIP_TAG.to_string()
}
