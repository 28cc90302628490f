// # rosdns-inventory
//
// Thin integration binary: it checks that the router is reachable with the
// configured credentials and prints the endpoints owned by this system as
// JSON on stdout. All DNS logic lives in the library crates.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Router
// - `MIKROTIK_BASEURL`: Router URL, e.g. `https://192.168.88.1` (required)
// - `MIKROTIK_USERNAME`: API user (required)
// - `MIKROTIK_PASSWORD`: API password (required)
// - `MIKROTIK_SKIP_TLS_VERIFY`: Accept self-signed certificates (default false)
// - `MIKROTIK_TIMEOUT_SECS`: Per-request timeout (default 30)
//
// ### Records
// - `MIKROTIK_DEFAULT_TTL`: TTL for records created without one (default 3600)
// - `MIKROTIK_DEFAULT_COMMENT`: Ownership tag (default "Managed By ExternalDNS")
//
// ### Logging
// - `ROSDNS_LOG_LEVEL`: trace, debug, info, warn or error (default info)
//
// ## Example
//
// ```bash
// export MIKROTIK_BASEURL=https://192.168.88.1
// export MIKROTIK_USERNAME=external-dns
// export MIKROTIK_PASSWORD=...
//
// rosdns-inventory                 # every owned endpoint
// rosdns-inventory www.example.com # only this name
// ```

use anyhow::{Context, Result};
use rosdns_core::config::{
    DEFAULT_OWNERSHIP_TAG, DEFAULT_TIMEOUT_SECS, DEFAULT_TTL_SECS, ProviderConfig, RecordDefaults,
    RosDnsConfig,
};
use rosdns_core::ProviderRegistry;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Inventory printed
/// - 1: Configuration or startup error
/// - 2: Runtime error (router unreachable, request failed)
#[derive(Debug, Clone, Copy)]
enum InventoryExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<InventoryExitCode> for ExitCode {
    fn from(code: InventoryExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    base_url: String,
    username: String,
    password: String,
    skip_tls_verify: bool,
    timeout_secs: u64,
    default_ttl: u64,
    ownership_tag: String,
    log_level: String,
    name_filter: String,
}

impl Config {
    /// Load configuration from environment variables and arguments
    fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env::var("MIKROTIK_BASEURL").context("MIKROTIK_BASEURL is required")?,
            username: env::var("MIKROTIK_USERNAME").context("MIKROTIK_USERNAME is required")?,
            password: env::var("MIKROTIK_PASSWORD").context("MIKROTIK_PASSWORD is required")?,
            skip_tls_verify: parse_bool_var("MIKROTIK_SKIP_TLS_VERIFY")?,
            timeout_secs: parse_u64_var("MIKROTIK_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            default_ttl: parse_u64_var("MIKROTIK_DEFAULT_TTL", DEFAULT_TTL_SECS)?,
            ownership_tag: env::var("MIKROTIK_DEFAULT_COMMENT")
                .unwrap_or_else(|_| DEFAULT_OWNERSHIP_TAG.to_string()),
            log_level: env::var("ROSDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            name_filter: env::args().nth(1).unwrap_or_default(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ROSDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.to_rosdns_config()
            .validate()
            .context("Invalid provider configuration")?;

        Ok(())
    }

    fn to_rosdns_config(&self) -> RosDnsConfig {
        RosDnsConfig {
            provider: ProviderConfig::Mikrotik {
                base_url: self.base_url.clone(),
                username: self.username.clone(),
                password: self.password.clone(),
                skip_tls_verify: self.skip_tls_verify,
                timeout_secs: self.timeout_secs,
            },
            defaults: RecordDefaults::new(self.ownership_tag.clone())
                .with_default_ttl(self.default_ttl),
        }
    }
}

fn parse_bool_var(key: &str) -> Result<bool> {
    match env::var(key) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => anyhow::bail!("{} must be true or false. Got: {}", key, other),
        },
        Err(_) => Ok(false),
    }
}

fn parse_u64_var(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number. Got: {}", key, value)),
        Err(_) => Ok(default),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return InventoryExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return InventoryExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only the inventory
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return InventoryExitCode::ConfigError.into();
    }

    info!("Starting rosdns-inventory");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return InventoryExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config).await {
            Ok(()) => InventoryExitCode::Success,
            Err(e) => {
                error!("Inventory failed: {:#}", e);
                InventoryExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the provider, probe the router and print owned endpoints
async fn run(config: Config) -> Result<()> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "mikrotik")]
    {
        info!("Registering MikroTik provider");
        rosdns_provider_mikrotik::register(&registry);
    }

    let rosdns_config = config.to_rosdns_config();
    let provider = registry
        .create_provider(&rosdns_config.provider, &rosdns_config.defaults)
        .context("Failed to create provider")?;

    provider
        .check_connection()
        .await
        .context("Router connectivity check failed")?;

    let endpoints = provider.list_owned(&config.name_filter).await?;
    info!(
        "Found {} endpoint(s) owned by '{}'",
        endpoints.len(),
        rosdns_config.defaults.ownership_tag
    );

    println!("{}", serde_json::to_string_pretty(&endpoints)?);
    Ok(())
}
