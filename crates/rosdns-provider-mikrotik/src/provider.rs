// # MikroTik Provider
//
// Reconciles logical endpoints against the RouterOS static DNS table.
//
// ## Identifier Renumbering
//
// RouterOS renumbers `.id` values after every deletion. An id is therefore
// only valid for the read that produced it. The delete loop re-reads the
// table before every deletion after the first and re-identifies its target
// with `record::matches`, never with a cached id.
//
// ## Delete Lock
//
// Deletes on one provider instance are serialized by `delete_lock`. The
// lock does NOT protect against other provider instances, other processes
// or people editing the same router: their deletions renumber ids too.
// The re-verify step turns most of those races into skipped records, but
// a concurrent delete landing between a re-read and our DELETE can still
// shift the id under us.
//
// ## API Reference
//
// - List entries: GET `/rest/ip/dns/static?type=...&comment=...&name=...`
// - Create entry: PUT `/rest/ip/dns/static`
// - Delete entry: DELETE `/rest/ip/dns/static/:id`
// - System info: GET `/rest/system/resource`

use async_trait::async_trait;
use rosdns_core::config::{ProviderConfig, RecordDefaults};
use rosdns_core::{AppliedRecord, DnsProvider, Endpoint, Error, RecordKind, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::record::{self, RecordData, RemoteRecord};
use crate::system::SystemInfo;
use crate::transport::Transport;

/// REST path of the static DNS table
pub const STATIC_DNS_PATH: &str = "ip/dns/static";

/// REST path of the system resource summary
pub const SYSTEM_RESOURCE_PATH: &str = "system/resource";

/// A multi-target create that stopped at the first failing record
///
/// Records in `created` exist on the router and are not rolled back.
#[derive(Debug, thiserror::Error)]
#[error("Created {} of {total} records: {source}", .created.len())]
pub struct PartialCreate {
    /// Records created before the failure, as echoed by the router
    pub created: Vec<RemoteRecord>,
    /// Number of records the endpoint asked for
    pub total: usize,
    /// The failure that stopped the pipeline
    pub source: Error,
}

impl From<PartialCreate> for Error {
    fn from(partial: PartialCreate) -> Self {
        if partial.created.is_empty() {
            return partial.source;
        }
        Error::PartialApply {
            created: partial.created.iter().map(RemoteRecord::to_applied).collect(),
            total: partial.total,
            source: Box::new(partial.source),
        }
    }
}

/// MikroTik RouterOS DNS provider
///
/// Stateless apart from the delete lock: every call re-reads the router.
pub struct MikrotikProvider {
    /// HTTP access to the router
    transport: Transport,

    /// Ownership tag and default TTL
    defaults: RecordDefaults,

    /// Serializes delete loops on this instance only
    delete_lock: Mutex<()>,
}

impl std::fmt::Debug for MikrotikProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MikrotikProvider")
            .field("transport", &self.transport)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl MikrotikProvider {
    /// Create a provider on top of an existing transport
    ///
    /// Fails if the ownership tag is empty.
    pub fn new(transport: Transport, defaults: RecordDefaults) -> Result<Self> {
        defaults.validate()?;

        tracing::info!(
            "Creating MikroTik provider for {} (ownership tag: '{}', default TTL: {}s)",
            transport.base_url(),
            defaults.ownership_tag,
            defaults.default_ttl
        );

        Ok(Self {
            transport,
            defaults,
            delete_lock: Mutex::new(()),
        })
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProviderConfig, defaults: &RecordDefaults) -> Result<Self> {
        match config {
            ProviderConfig::Mikrotik {
                base_url,
                username,
                password,
                skip_tls_verify,
                timeout_secs,
            } => {
                config.validate()?;
                let transport = Transport::new(
                    base_url.clone(),
                    username.clone(),
                    password.clone(),
                    *skip_tls_verify,
                    Duration::from_secs(*timeout_secs),
                )?;
                Self::new(transport, defaults.clone())
            }
            _ => Err(Error::config("Invalid config for MikroTik provider")),
        }
    }

    /// The ownership tag stamped on every created record
    pub fn ownership_tag(&self) -> &str {
        &self.defaults.ownership_tag
    }

    /// Fetch router system information
    pub async fn system_info(&self) -> Result<SystemInfo> {
        tracing::debug!("Fetching system information");
        let info: SystemInfo = self.transport.get_json(SYSTEM_RESOURCE_PATH, &[]).await?;
        tracing::debug!("Got system info: {:?}", info);
        Ok(info)
    }

    /// Fetch owned entries, optionally restricted to one name
    ///
    /// Filtering by supported types, ownership tag and name happens on the
    /// router. The ids in the result are valid only until the next deletion.
    pub async fn fetch_records(&self, name: &str) -> Result<Vec<RemoteRecord>> {
        let types = RecordKind::ALL
            .iter()
            .map(RecordKind::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let mut query = vec![
            ("type", types.as_str()),
            ("comment", self.defaults.ownership_tag.as_str()),
        ];

        if name.is_empty() {
            tracing::debug!("Fetching all DNS records managed by this system");
        } else {
            tracing::debug!("Fetching DNS records for name: {}", name);
            query.push(("name", name));
        }

        let records: Vec<RemoteRecord> = self.transport.get_json(STATIC_DNS_PATH, &query).await?;
        tracing::debug!("Fetched {} DNS records using server-side filtering", records.len());
        Ok(records)
    }

    /// List owned endpoints, grouping entries by name and kind
    ///
    /// An empty `name` lists every owned entry. Entries that are not owned,
    /// not of a managed kind, or carry no target are skipped.
    pub async fn list_endpoints(&self, name: &str) -> Result<Vec<Endpoint>> {
        let records = self.fetch_records(name).await?;

        let mut endpoints: Vec<Endpoint> = Vec::new();
        let mut index: HashMap<(String, RecordKind), usize> = HashMap::new();

        for remote in &records {
            if remote.comment != self.defaults.ownership_tag {
                tracing::debug!(
                    "Skipping record {} with foreign comment '{}'",
                    remote.name,
                    remote.comment
                );
                continue;
            }
            if !name.is_empty() && remote.name != name {
                continue;
            }
            let Some(kind) = remote.data.kind() else {
                tracing::debug!(
                    "Skipping record {} of unmanaged type {}",
                    remote.name,
                    remote.data.type_name()
                );
                continue;
            };
            let target = record::decode(remote);
            if target.is_empty() {
                tracing::warn!("Skipping {} record {} without a target", kind, remote.name);
                continue;
            }

            let ttl = remote.ttl.as_deref().map(crate::ttl::parse_ttl).unwrap_or(0);
            let key = (remote.name.clone(), kind);
            match index.get(&key) {
                Some(&i) => {
                    let endpoint = &mut endpoints[i];
                    if ttl != endpoint.ttl
                        || record::properties(remote) != endpoint.provider_properties
                    {
                        tracing::debug!(
                            "{} record {} ({}) differs in TTL or properties from its siblings; \
                             reporting those of the first entry",
                            kind,
                            remote.name,
                            target
                        );
                    }
                    endpoint.targets.push(target);
                }
                None => {
                    let mut endpoint = Endpoint::new(remote.name.clone(), kind, [target]);
                    endpoint.ttl = ttl;
                    endpoint.provider_properties = record::properties(remote);
                    index.insert(key, endpoints.len());
                    endpoints.push(endpoint);
                }
            }
        }

        tracing::debug!(
            "Aggregated {} records into {} endpoints",
            records.len(),
            endpoints.len()
        );
        Ok(endpoints)
    }

    /// Create one entry per target of `endpoint`, in order
    ///
    /// Every entry is stamped with the ownership tag; a caller-supplied
    /// `comment` property is discarded. All targets are encoded before the
    /// first request, so a malformed target creates nothing. Requests are
    /// sequential and the first failure stops the pipeline without rolling
    /// back what was already created.
    pub async fn create_records(
        &self,
        endpoint: &Endpoint,
    ) -> std::result::Result<Vec<RemoteRecord>, PartialCreate> {
        tracing::info!("Creating DNS records for endpoint: {}", endpoint);

        let total = endpoint.targets.len();
        let partial = |created: Vec<RemoteRecord>, source: Error| PartialCreate {
            created,
            total,
            source,
        };

        let mut records = Vec::with_capacity(total);
        for target in &endpoint.targets {
            let mut remote = record::encode(endpoint, target, self.defaults.default_ttl)
                .map_err(|e| partial(Vec::new(), e))?;
            remote.comment = self.defaults.ownership_tag.clone();
            records.push(remote);
        }

        if records.is_empty() {
            tracing::warn!("Endpoint {} has no targets, nothing to create", endpoint.name);
            return Ok(Vec::new());
        }

        let mut created = Vec::with_capacity(total);
        for (i, remote) in records.iter().enumerate() {
            tracing::debug!(
                "Creating DNS record {}/{}: {} {} {}",
                i + 1,
                total,
                remote.name,
                remote.data.type_name(),
                record::decode(remote)
            );

            match self.create_record(remote).await {
                Ok(echoed) => created.push(echoed),
                Err(e) => {
                    tracing::error!("Failed to create DNS record {}/{}: {}", i + 1, total, e);
                    return Err(partial(created, e));
                }
            }
        }

        tracing::info!("Successfully created {} DNS records", created.len());
        Ok(created)
    }

    /// Create a single entry and return the router's echo (with its id)
    async fn create_record(&self, remote: &RemoteRecord) -> Result<RemoteRecord> {
        let body = serde_json::to_value(remote)?;
        let echoed: RemoteRecord = self
            .transport
            .put_json(STATIC_DNS_PATH, &body)
            .await
            .map_err(|e| match e {
                // The router accepted the PUT; only its echo was unreadable
                Error::Json(source) => Error::provider(
                    "mikrotik",
                    format!(
                        "record {} may have been created, but the response could not be decoded: {}",
                        remote.name, source
                    ),
                ),
                other => other,
            })?;
        tracing::debug!("Created record {} with id {:?}", echoed.name, echoed.id);
        Ok(echoed)
    }

    /// Delete the owned entries backing `endpoint`
    ///
    /// With explicit targets only entries whose decoded target is listed are
    /// removed; with none, every owned entry of the endpoint's name and kind
    /// is. Entries that vanish mid-loop are skipped. Any request failure
    /// aborts the loop; entries deleted before it stay deleted.
    ///
    /// # Returns
    ///
    /// The number of entries actually deleted.
    pub async fn delete_records(&self, endpoint: &Endpoint) -> Result<usize> {
        if endpoint.name.is_empty() {
            return Err(Error::invalid_input("Cannot delete records without a name"));
        }

        let _guard = self.delete_lock.lock().await;

        tracing::info!("Deleting DNS records for endpoint: {}", endpoint);

        let snapshot = self.fetch_records(&endpoint.name).await.map_err(|e| {
            tracing::error!("Failed to get DNS records for {}: {}", endpoint.name, e);
            e
        })?;

        let wanted = wanted_data(endpoint);
        let candidates: Vec<RemoteRecord> = snapshot
            .into_iter()
            .filter(|remote| self.is_delete_candidate(remote, endpoint, &wanted))
            .collect();

        if candidates.is_empty() {
            tracing::warn!("No DNS records found to delete for endpoint {}", endpoint.name);
            return Ok(0);
        }

        let total = candidates.len();
        let mut deleted = 0;

        for (i, candidate) in candidates.iter().enumerate() {
            // The first candidate comes from a fresh read; every later one
            // must be re-resolved because earlier deletions renumbered ids.
            let current = if i == 0 {
                candidate.clone()
            } else {
                tracing::debug!("Re-fetching records to get updated IDs after previous deletions");
                let refreshed = self.fetch_records(&endpoint.name).await.map_err(|e| {
                    tracing::error!("Failed to re-fetch DNS records during deletion: {}", e);
                    e
                })?;

                match refreshed.into_iter().find(|remote| {
                    remote.comment == self.defaults.ownership_tag && record::matches(candidate, remote)
                }) {
                    Some(remote) => remote,
                    None => {
                        tracing::warn!(
                            "Record {} {} no longer exists (may have been deleted already), skipping",
                            candidate.name,
                            record::decode(candidate)
                        );
                        continue;
                    }
                }
            };

            let Some(id) = current.id.as_deref() else {
                tracing::warn!("Record {} has no id, skipping", current.name);
                continue;
            };

            tracing::debug!("Deleting DNS record {}/{}: {}", i + 1, total, id);
            self.transport
                .delete(&format!("{}/{}", STATIC_DNS_PATH, id))
                .await?;
            deleted += 1;
            tracing::debug!("Record deleted: {}", id);
        }

        tracing::info!("Successfully deleted {} DNS records", deleted);
        Ok(deleted)
    }

    /// Name, kind and ownership must agree; listed targets narrow further
    ///
    /// Targets are compared in parsed form, so `"010  mail.example.com"`
    /// selects the entry stored as preference 10.
    fn is_delete_candidate(
        &self,
        remote: &RemoteRecord,
        endpoint: &Endpoint,
        wanted: &[RecordData],
    ) -> bool {
        if remote.name != endpoint.name || remote.data.kind() != Some(endpoint.kind) {
            return false;
        }

        if remote.comment != self.defaults.ownership_tag {
            tracing::debug!(
                "Skipping record with different comment: {} (expected: '{}', found: '{}')",
                remote.name,
                self.defaults.ownership_tag,
                remote.comment
            );
            return false;
        }

        if endpoint.targets.is_empty() {
            return true;
        }

        !record::decode(remote).is_empty() && wanted.contains(&remote.data)
    }
}

/// Parse the targets of `endpoint` into their router field form
///
/// A target that does not parse cannot match any stored entry and is
/// dropped with a warning.
fn wanted_data(endpoint: &Endpoint) -> Vec<RecordData> {
    endpoint
        .targets
        .iter()
        .filter_map(|target| match RecordData::parse(endpoint.kind, target) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("Ignoring delete target of {}: {}", endpoint.name, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl DnsProvider for MikrotikProvider {
    async fn list_owned(&self, name: &str) -> Result<Vec<Endpoint>> {
        self.list_endpoints(name).await
    }

    async fn apply(&self, endpoint: &Endpoint) -> Result<Vec<AppliedRecord>> {
        let created = self.create_records(endpoint).await?;
        Ok(created.iter().map(RemoteRecord::to_applied).collect())
    }

    async fn remove(&self, endpoint: &Endpoint) -> Result<()> {
        self.delete_records(endpoint).await?;
        Ok(())
    }

    async fn check_connection(&self) -> Result<()> {
        let info = self.system_info().await?;
        tracing::info!(
            "Connected to {} running RouterOS {} (uptime {})",
            info.board_name,
            info.version,
            info.uptime
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mikrotik"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(tag: &str) -> MikrotikProvider {
        let transport = Transport::new(
            "https://192.168.88.1",
            "admin",
            "hunter2-router",
            true,
            crate::transport::DEFAULT_HTTP_TIMEOUT,
        )
        .unwrap();
        MikrotikProvider::new(transport, RecordDefaults::new(tag)).unwrap()
    }

    fn a(name: &str, address: &str, comment: &str) -> RemoteRecord {
        RemoteRecord {
            id: Some("*1".to_string()),
            name: name.to_string(),
            data: RecordData::A {
                address: address.to_string(),
            },
            ttl: None,
            comment: comment.to_string(),
            disabled: false,
            address_list: None,
            match_subdomain: false,
        }
    }

    #[test]
    fn test_empty_ownership_tag_rejected() {
        let transport = Transport::new(
            "https://192.168.88.1",
            "admin",
            "password",
            false,
            crate::transport::DEFAULT_HTTP_TIMEOUT,
        )
        .unwrap();
        assert!(MikrotikProvider::new(transport, RecordDefaults::new("")).is_err());
    }

    #[test]
    fn test_from_config_rejects_foreign_config() {
        let config = ProviderConfig::Custom {
            factory: "other".to_string(),
            config: serde_json::json!({}),
        };
        assert!(MikrotikProvider::from_config(&config, &RecordDefaults::default()).is_err());
    }

    #[test]
    fn test_delete_candidate_rules() {
        let provider = provider("tag");
        let all = Endpoint::new("multi.example.com", RecordKind::A, Vec::<String>::new());
        let one = Endpoint::new("multi.example.com", RecordKind::A, ["1.2.3.4"]);

        let owned = a("multi.example.com", "1.2.3.4", "tag");
        let sibling = a("multi.example.com", "5.6.7.8", "tag");
        let foreign = a("multi.example.com", "1.2.3.4", "someone else");
        let other_name = a("other.example.com", "1.2.3.4", "tag");

        let is_candidate = |remote: &RemoteRecord, endpoint: &Endpoint| {
            provider.is_delete_candidate(remote, endpoint, &wanted_data(endpoint))
        };

        assert!(is_candidate(&owned, &all));
        assert!(is_candidate(&sibling, &all));
        assert!(is_candidate(&owned, &one));
        assert!(!is_candidate(&sibling, &one));
        assert!(!is_candidate(&foreign, &all));
        assert!(!is_candidate(&other_name, &all));

        let aaaa = Endpoint::new("multi.example.com", RecordKind::Aaaa, Vec::<String>::new());
        assert!(!is_candidate(&owned, &aaaa));
    }

    #[test]
    fn test_delete_candidate_compares_parsed_targets() {
        let provider = provider("tag");
        let mut mx = a("example.com", "", "tag");
        mx.data = RecordData::Mx {
            preference: 10,
            exchange: "mail.example.com".to_string(),
        };

        for target in ["10 mail.example.com", "10   mail.example.com", "010 mail.example.com"] {
            let endpoint = Endpoint::new("example.com", RecordKind::Mx, [target]);
            assert!(
                provider.is_delete_candidate(&mx, &endpoint, &wanted_data(&endpoint)),
                "target '{}' should select the entry",
                target
            );
        }

        let other = Endpoint::new("example.com", RecordKind::Mx, ["20 mail.example.com"]);
        assert!(!provider.is_delete_candidate(&mx, &other, &wanted_data(&other)));

        // A malformed target must not widen into "delete everything"
        let malformed = Endpoint::new("example.com", RecordKind::Mx, ["mail.example.com"]);
        assert!(wanted_data(&malformed).is_empty());
        assert!(!provider.is_delete_candidate(&mx, &malformed, &wanted_data(&malformed)));
    }

    #[test]
    fn test_partial_create_conversion() {
        let empty = PartialCreate {
            created: Vec::new(),
            total: 2,
            source: Error::request("PUT", STATIC_DNS_PATH, 400, "bad"),
        };
        assert!(matches!(Error::from(empty), Error::Request { status: 400, .. }));

        let some = PartialCreate {
            created: vec![a("multi.example.com", "1.2.3.4", "tag")],
            total: 2,
            source: Error::request("PUT", STATIC_DNS_PATH, 500, ""),
        };
        let err = Error::from(some);
        assert_eq!(err.partially_created().len(), 1);
        assert_eq!(err.partially_created()[0].target, "1.2.3.4");
    }

    #[test]
    fn test_debug_hides_password() {
        let debug_str = format!("{:?}", provider("tag"));
        assert!(debug_str.contains("MikrotikProvider"));
        assert!(!debug_str.contains("hunter2-router"));
    }
}
