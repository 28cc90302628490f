// # DNS Provider Trait
//
// Defines the contract a record backend offers to the orchestrating
// controller. The controller decides *what* changes; providers only carry
// out already-decided creates and removals.
//
// ## Implementations
//
// - MikroTik RouterOS: `rosdns-provider-mikrotik` crate
//
// ## Usage
//
// ```rust,ignore
// use rosdns_core::{DnsProvider, Endpoint, RecordKind};
//
// async fn replace(provider: &dyn DnsProvider) -> rosdns_core::Result<()> {
//     let old = Endpoint::new("www.example.com", RecordKind::A, ["192.0.2.1"]);
//     let new = Endpoint::new("www.example.com", RecordKind::A, ["192.0.2.2"]);
//
//     provider.remove(&old).await?;
//     provider.apply(&new).await?;
//     Ok(())
// }
// ```

use crate::config::{ProviderConfig, RecordDefaults};
use crate::endpoint::{AppliedRecord, Changes, Endpoint};
use crate::error::Result;
use async_trait::async_trait;

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks. The
/// controller may call any method concurrently.
///
/// # Ownership
///
/// Every provider is constructed with an ownership tag. Records carrying a
/// different tag are invisible to `list_owned` and untouchable by `remove`.
///
/// # No Retry
///
/// Providers return errors instead of retrying. Callers that need retries
/// wrap the calls themselves.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List owned endpoints, grouping records that share name and kind
    ///
    /// # Parameters
    ///
    /// - `name`: Restrict to this DNS name; empty lists every owned record
    ///
    /// # Returns
    ///
    /// One endpoint per distinct `(name, kind)` observed in a fresh read.
    async fn list_owned(&self, name: &str) -> Result<Vec<Endpoint>>;

    /// Create one remote record per target of `endpoint`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<AppliedRecord>)`: every record was created
    /// - `Err(Error::PartialApply { .. })`: creation stopped at the first
    ///   failure; the records already created are carried in the error and
    ///   are not rolled back
    async fn apply(&self, endpoint: &Endpoint) -> Result<Vec<AppliedRecord>>;

    /// Remove the owned records backing `endpoint`
    ///
    /// An empty target list removes every owned record with the endpoint's
    /// name and kind. Records that are already gone are not an error.
    async fn remove(&self, endpoint: &Endpoint) -> Result<()>;

    /// Apply an already-decided change set
    ///
    /// Removals run first (`delete`, then `update_old`), followed by
    /// creations (`update_new`, then `create`). The first failure stops the
    /// sequence; earlier steps are not undone.
    async fn apply_changes(&self, changes: &Changes) -> Result<()> {
        if changes.is_empty() {
            tracing::debug!("No changes to apply");
            return Ok(());
        }

        tracing::info!(
            "Applying changes: {} create, {} update, {} delete",
            changes.create.len(),
            changes.update_new.len(),
            changes.delete.len()
        );

        for endpoint in changes.delete.iter().chain(&changes.update_old) {
            self.remove(endpoint).await?;
        }

        for endpoint in changes.update_new.iter().chain(&changes.create) {
            self.apply(endpoint).await?;
        }

        Ok(())
    }

    /// Verify the backend is reachable with the configured credentials
    ///
    /// The default implementation assumes it is.
    async fn check_connection(&self) -> Result<()> {
        Ok(())
    }

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    /// - `defaults`: Ownership tag and default TTL for every mutation
    fn create(
        &self,
        config: &ProviderConfig,
        defaults: &RecordDefaults,
    ) -> Result<Box<dyn DnsProvider>>;
}
