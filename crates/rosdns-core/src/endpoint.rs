// # Endpoint Model
//
// The logical view of a DNS record set: one name and record kind owning an
// ordered list of target values. Providers translate endpoints to and from
// whatever flat representation their backend stores.
//
// Target order is preserved when an endpoint is decomposed, but backends do
// not guarantee it survives a write-then-read round trip. Compare target
// sets, not sequences, when checking what a provider returned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// DNS record kinds handled by the reconciliation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    /// IPv4 address record
    #[serde(rename = "A")]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
    /// Canonical name record
    #[serde(rename = "CNAME")]
    Cname,
    /// Text record
    #[serde(rename = "TXT")]
    Txt,
    /// Mail exchange record, target form `"<preference> <exchange>"`
    #[serde(rename = "MX")]
    Mx,
    /// Service record, target form `"<priority> <weight> <port> <target>"`
    #[serde(rename = "SRV")]
    Srv,
    /// Name server record
    #[serde(rename = "NS")]
    Ns,
}

impl RecordKind {
    /// Every supported kind, in the order used for server-side type filters
    pub const ALL: [RecordKind; 7] = [
        RecordKind::A,
        RecordKind::Aaaa,
        RecordKind::Cname,
        RecordKind::Txt,
        RecordKind::Mx,
        RecordKind::Srv,
        RecordKind::Ns,
    ];

    /// Wire name of the kind (e.g. `"AAAA"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
            RecordKind::Cname => "CNAME",
            RecordKind::Txt => "TXT",
            RecordKind::Mx => "MX",
            RecordKind::Srv => "SRV",
            RecordKind::Ns => "NS",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::invalid_input(format!("Unsupported record type: {}", s)))
    }
}

/// A logical DNS record: one name and kind with one or more targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Fully-qualified domain name
    #[serde(rename = "dnsName")]
    pub name: String,

    /// Record kind
    #[serde(rename = "recordType")]
    pub kind: RecordKind,

    /// Target values; an empty list on removal means "every owned record"
    #[serde(default)]
    pub targets: Vec<String>,

    /// TTL in seconds, 0 meaning "use the provider default"
    #[serde(rename = "recordTTL", default, skip_serializing_if = "is_zero")]
    pub ttl: u64,

    /// Provider-specific properties (`disabled`, `address-list`, ...)
    #[serde(
        rename = "providerSpecific",
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        with = "provider_specific"
    )]
    pub provider_properties: BTreeMap<String, String>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl Endpoint {
    /// Create an endpoint with the given targets and no TTL or properties
    pub fn new<I, T>(name: impl Into<String>, kind: RecordKind, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            targets: targets.into_iter().map(Into::into).collect(),
            ttl: 0,
            provider_properties: BTreeMap::new(),
        }
    }

    /// Set the TTL in seconds
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set a provider-specific property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.provider_properties.insert(key.into(), value.into());
        self
    }

    /// Look up a provider-specific property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.provider_properties.get(key).map(String::as_str)
    }

    /// Whether the endpoint names `target` among its targets
    pub fn has_target(&self, target: &str) -> bool {
        self.targets.iter().any(|t| t == target)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.name, self.kind, self.targets.join(", "))
    }
}

/// Summary of one remote record created on behalf of an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    /// Identifier assigned by the backend at creation time
    ///
    /// Only valid until the next deletion in the same store.
    pub id: String,
    /// Record name
    pub name: String,
    /// Record kind
    pub kind: RecordKind,
    /// The single target value this record carries
    pub target: String,
}

/// An already-decided set of changes supplied by the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Changes {
    /// Endpoints to create
    #[serde(default)]
    pub create: Vec<Endpoint>,
    /// Previous state of updated endpoints (removed first)
    #[serde(default)]
    pub update_old: Vec<Endpoint>,
    /// New state of updated endpoints (applied after removal)
    #[serde(default)]
    pub update_new: Vec<Endpoint>,
    /// Endpoints to delete
    #[serde(default)]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// True when there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty()
    }
}

/// Serializes the property map as a list of `{name, value}` pairs
mod provider_specific {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    struct Property {
        name: String,
        value: String,
    }

    pub fn serialize<S>(map: &BTreeMap<String, String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let list: Vec<Property> = map
            .iter()
            .map(|(name, value)| Property {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list: Option<Vec<Property>> = Option::deserialize(deserializer)?;
        Ok(list
            .unwrap_or_default()
            .into_iter()
            .map(|p| (p.name, p.value))
            .collect())
    }
}
