// # MikroTik RouterOS DNS Provider
//
// This crate manages static DNS entries on a MikroTik router through the
// RouterOS REST API (`/rest/ip/dns/static`).
//
// ## Capabilities
//
// - A, AAAA, CNAME, TXT, MX, SRV and NS entries
// - Multi-target endpoints: one router entry per target
// - Ownership isolation: only entries whose comment equals the configured
//   ownership tag are ever listed or deleted
// - Renumbering-safe deletion: ids are re-resolved after every delete
// - NO retry logic (callers wrap calls themselves)
// - NO caching (every operation starts from a fresh read)
//
// ## Security Requirements
//
// - The router password NEVER appears in logs or Debug output
// - Credentials come from configuration only
//
// ## Modules
//
// - `record`: entry codec and matcher
// - `ttl`: RouterOS duration strings
// - `transport`: authenticated HTTP
// - `system`: `/system/resource` probe
// - `provider`: the reconciling provider

pub mod provider;
pub mod record;
pub mod system;
pub mod transport;
pub mod ttl;

use rosdns_core::config::{ProviderConfig, RecordDefaults};
use rosdns_core::{DnsProvider, DnsProviderFactory, Error, ProviderRegistry, Result};

pub use provider::{MikrotikProvider, PartialCreate};
pub use record::{RecordData, RemoteRecord};
pub use system::SystemInfo;
pub use transport::Transport;

/// Factory for creating MikroTik providers
pub struct MikrotikFactory;

impl DnsProviderFactory for MikrotikFactory {
    fn create(
        &self,
        config: &ProviderConfig,
        defaults: &RecordDefaults,
    ) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Mikrotik { .. } => {
                Ok(Box::new(MikrotikProvider::from_config(config, defaults)?))
            }
            _ => Err(Error::config("Invalid config for MikroTik provider")),
        }
    }
}

/// Register the MikroTik provider with a registry
///
/// # Example
///
/// ```rust
/// use rosdns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// rosdns_provider_mikrotik::register(&registry);
/// assert!(registry.has_provider("mikrotik"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider("mikrotik", Box::new(MikrotikFactory));
}
