// # Record Codec
//
// Translates between logical endpoints and RouterOS static DNS entries.
//
// RouterOS stores exactly one target per entry and spreads the target over
// kind-specific fields (`address`, `cname`, `mx-preference` + `mx-exchange`,
// ...). `RecordData` models that as a sum type so every codec and matcher
// call site is checked for exhaustiveness.
//
// ## Wire Format
//
// `GET /rest/ip/dns/static` returns entries like:
//
// ```json
// {".id": "*3", "name": "mail.example.com", "type": "MX",
//  "mx-preference": "10", "mx-exchange": "smtp.example.com",
//  "ttl": "1h", "comment": "Managed By ExternalDNS", "disabled": "false"}
// ```
//
// Every scalar is a string. An entry without `type` is an A record.

use rosdns_core::{AppliedRecord, Endpoint, Error, RecordKind, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ttl;

/// Provider property: free-text comment (always replaced by the ownership tag on create)
pub const PROPERTY_COMMENT: &str = "comment";
/// Provider property: `"true"` to create the entry disabled
pub const PROPERTY_DISABLED: &str = "disabled";
/// Provider property: firewall address list populated on resolution
pub const PROPERTY_ADDRESS_LIST: &str = "address-list";
/// Provider property: `"true"` to also answer for subdomains
pub const PROPERTY_MATCH_SUBDOMAIN: &str = "match-subdomain";

/// Kind-specific payload of a RouterOS DNS entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A { address: String },
    Aaaa { address: String },
    Cname { cname: String },
    Txt { text: String },
    Mx { preference: u16, exchange: String },
    Srv { priority: u16, weight: u16, port: u16, target: String },
    Ns { ns: String },
    /// Entry types this system does not manage (FWD, NXDOMAIN, ...)
    Other { kind: String },
}

impl RecordData {
    /// Build the payload for one target string of the given kind
    ///
    /// MX targets are `"<preference> <exchange>"` and SRV targets are
    /// `"<priority> <weight> <port> <target>"`, split on whitespace.
    pub fn parse(kind: RecordKind, target: &str) -> Result<Self> {
        let data = match kind {
            RecordKind::A => RecordData::A {
                address: target.to_string(),
            },
            RecordKind::Aaaa => RecordData::Aaaa {
                address: target.to_string(),
            },
            RecordKind::Cname => RecordData::Cname {
                cname: target.to_string(),
            },
            RecordKind::Txt => RecordData::Txt {
                text: target.to_string(),
            },
            RecordKind::Mx => {
                let [preference, exchange] = split_fields::<2>(kind, target)?;
                RecordData::Mx {
                    preference: parse_number(kind, "preference", preference)?,
                    exchange: exchange.to_string(),
                }
            }
            RecordKind::Srv => {
                let [priority, weight, port, srv_target] = split_fields::<4>(kind, target)?;
                RecordData::Srv {
                    priority: parse_number(kind, "priority", priority)?,
                    weight: parse_number(kind, "weight", weight)?,
                    port: parse_number(kind, "port", port)?,
                    target: srv_target.to_string(),
                }
            }
            RecordKind::Ns => RecordData::Ns {
                ns: target.to_string(),
            },
        };
        Ok(data)
    }

    /// The managed kind of this payload, `None` for unmanaged entry types
    pub fn kind(&self) -> Option<RecordKind> {
        match self {
            RecordData::A { .. } => Some(RecordKind::A),
            RecordData::Aaaa { .. } => Some(RecordKind::Aaaa),
            RecordData::Cname { .. } => Some(RecordKind::Cname),
            RecordData::Txt { .. } => Some(RecordKind::Txt),
            RecordData::Mx { .. } => Some(RecordKind::Mx),
            RecordData::Srv { .. } => Some(RecordKind::Srv),
            RecordData::Ns { .. } => Some(RecordKind::Ns),
            RecordData::Other { .. } => None,
        }
    }

    /// RouterOS `type` value
    pub fn type_name(&self) -> &str {
        match self {
            RecordData::Other { kind } => kind.as_str(),
            _ => self.kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }

    /// The single target value carried by this payload
    ///
    /// Unmanaged entry types yield an empty string, which must never be
    /// matched against an endpoint target.
    pub fn target(&self) -> String {
        match self {
            RecordData::A { address } | RecordData::Aaaa { address } => address.clone(),
            RecordData::Cname { cname } => cname.clone(),
            RecordData::Txt { text } => text.clone(),
            RecordData::Mx {
                preference,
                exchange,
            } => format!("{} {}", preference, exchange),
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => format!("{} {} {} {}", priority, weight, port, target),
            RecordData::Ns { ns } => ns.clone(),
            RecordData::Other { .. } => String::new(),
        }
    }
}

fn split_fields<const N: usize>(kind: RecordKind, target: &str) -> Result<[&str; N]> {
    let fields: Vec<&str> = target.split_whitespace().collect();
    <[&str; N]>::try_from(fields).map_err(|fields| {
        Error::invalid_input(format!(
            "Malformed {} target '{}': expected {} fields, got {}",
            kind,
            target,
            N,
            fields.len()
        ))
    })
}

fn parse_number(kind: RecordKind, field: &str, value: &str) -> Result<u16> {
    value.parse().map_err(|_| {
        Error::invalid_input(format!(
            "Malformed {} target: {} '{}' is not a number in 0..=65535",
            kind, field, value
        ))
    })
}

/// One RouterOS static DNS entry
///
/// The `id` is assigned by the router and is only meaningful for the read
/// that produced it: deleting any entry renumbers the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireRecord", into = "WireRecord")]
pub struct RemoteRecord {
    /// Router-assigned identifier (`None` before creation)
    pub id: Option<String>,
    /// DNS name
    pub name: String,
    /// Kind-specific payload
    pub data: RecordData,
    /// Compact duration string (`1h`, `30m`, ...)
    pub ttl: Option<String>,
    /// Ownership tag plus optional free text
    pub comment: String,
    /// Entry is disabled on the router
    pub disabled: bool,
    /// Firewall address list populated on resolution
    pub address_list: Option<String>,
    /// Entry also answers for subdomains
    pub match_subdomain: bool,
}

impl RemoteRecord {
    /// Summary of this record for the provider-neutral contract
    pub fn to_applied(&self) -> AppliedRecord {
        AppliedRecord {
            id: self.id.clone().unwrap_or_default(),
            name: self.name.clone(),
            // Only records built from an endpoint are summarised
            kind: self.data.kind().unwrap_or(RecordKind::A),
            target: self.data.target(),
        }
    }
}

/// Encode one target of `endpoint` as a RouterOS entry
///
/// A zero endpoint TTL falls back to `default_ttl`; if that is zero too the
/// entry carries no TTL and the router default applies.
pub fn encode(endpoint: &Endpoint, target: &str, default_ttl: u64) -> Result<RemoteRecord> {
    let data = RecordData::parse(endpoint.kind, target)?;

    let ttl_secs = if endpoint.ttl > 0 {
        endpoint.ttl
    } else {
        default_ttl
    };

    Ok(RemoteRecord {
        id: None,
        name: endpoint.name.clone(),
        data,
        ttl: (ttl_secs > 0).then(|| ttl::format_ttl(ttl_secs)),
        comment: endpoint
            .property(PROPERTY_COMMENT)
            .unwrap_or_default()
            .to_string(),
        disabled: endpoint.property(PROPERTY_DISABLED).is_some_and(parse_flag),
        address_list: endpoint
            .property(PROPERTY_ADDRESS_LIST)
            .filter(|list| !list.is_empty())
            .map(str::to_string),
        match_subdomain: endpoint
            .property(PROPERTY_MATCH_SUBDOMAIN)
            .is_some_and(parse_flag),
    })
}

/// Extract the single target value of a RouterOS entry
///
/// Empty for entry types outside the managed set.
pub fn decode(record: &RemoteRecord) -> String {
    record.data.target()
}

/// Whether two entries describe the same logical record
///
/// Name and type must agree, then exactly the kind-specific fields are
/// compared. Unmanaged types fall back to the comment. This is the only way
/// to re-identify a record whose `id` may have changed.
pub fn matches(a: &RemoteRecord, b: &RemoteRecord) -> bool {
    if a.name != b.name || a.data.type_name() != b.data.type_name() {
        return false;
    }

    match (&a.data, &b.data) {
        (RecordData::A { address: x }, RecordData::A { address: y })
        | (RecordData::Aaaa { address: x }, RecordData::Aaaa { address: y }) => x == y,
        (RecordData::Cname { cname: x }, RecordData::Cname { cname: y }) => x == y,
        (RecordData::Txt { text: x }, RecordData::Txt { text: y }) => x == y,
        (
            RecordData::Mx {
                preference: p1,
                exchange: e1,
            },
            RecordData::Mx {
                preference: p2,
                exchange: e2,
            },
        ) => e1 == e2 && p1 == p2,
        (
            RecordData::Srv {
                priority: pr1,
                weight: w1,
                port: po1,
                target: t1,
            },
            RecordData::Srv {
                priority: pr2,
                weight: w2,
                port: po2,
                target: t2,
            },
        ) => t1 == t2 && po1 == po2 && pr1 == pr2 && w1 == w2,
        (RecordData::Ns { ns: x }, RecordData::Ns { ns: y }) => x == y,
        (RecordData::Other { .. }, RecordData::Other { .. }) => a.comment == b.comment,
        _ => false,
    }
}

/// Provider properties reported for an entry read back from the router
///
/// Only non-default values are reported; the comment is omitted since it
/// always equals the ownership tag for listed records.
pub fn properties(record: &RemoteRecord) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    if record.disabled {
        properties.insert(PROPERTY_DISABLED.to_string(), "true".to_string());
    }
    if let Some(list) = &record.address_list {
        properties.insert(PROPERTY_ADDRESS_LIST.to_string(), list.clone());
    }
    if record.match_subdomain {
        properties.insert(PROPERTY_MATCH_SUBDOMAIN.to_string(), "true".to_string());
    }
    properties
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "yes")
}

/// Flat JSON shape used by the RouterOS REST API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct WireRecord {
    #[serde(rename = ".id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mx_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mx_exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    srv_priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    srv_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    srv_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    srv_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ttl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    disabled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address_list: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    match_subdomain: Option<String>,
}

fn wire_number(field: &str, value: Option<String>) -> std::result::Result<u16, String> {
    match value {
        None => Ok(0),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| format!("invalid {} value '{}'", field, v)),
    }
}

impl TryFrom<WireRecord> for RemoteRecord {
    type Error = String;

    fn try_from(wire: WireRecord) -> std::result::Result<Self, Self::Error> {
        let kind = wire.kind.unwrap_or_else(|| "A".to_string());

        let data = match kind.parse::<RecordKind>() {
            Ok(RecordKind::A) => RecordData::A {
                address: wire.address.unwrap_or_default(),
            },
            Ok(RecordKind::Aaaa) => RecordData::Aaaa {
                address: wire.address.unwrap_or_default(),
            },
            Ok(RecordKind::Cname) => RecordData::Cname {
                cname: wire.cname.unwrap_or_default(),
            },
            Ok(RecordKind::Txt) => RecordData::Txt {
                text: wire.text.unwrap_or_default(),
            },
            Ok(RecordKind::Mx) => RecordData::Mx {
                preference: wire_number("mx-preference", wire.mx_preference)?,
                exchange: wire.mx_exchange.unwrap_or_default(),
            },
            Ok(RecordKind::Srv) => RecordData::Srv {
                priority: wire_number("srv-priority", wire.srv_priority)?,
                weight: wire_number("srv-weight", wire.srv_weight)?,
                port: wire_number("srv-port", wire.srv_port)?,
                target: wire.srv_target.unwrap_or_default(),
            },
            Ok(RecordKind::Ns) => RecordData::Ns {
                ns: wire.ns.unwrap_or_default(),
            },
            Err(_) => RecordData::Other { kind },
        };

        Ok(RemoteRecord {
            id: wire.id,
            name: wire.name,
            data,
            ttl: wire.ttl,
            comment: wire.comment.unwrap_or_default(),
            disabled: wire.disabled.as_deref().is_some_and(parse_flag),
            address_list: wire.address_list.filter(|list| !list.is_empty()),
            match_subdomain: wire.match_subdomain.as_deref().is_some_and(parse_flag),
        })
    }
}

impl From<RemoteRecord> for WireRecord {
    fn from(record: RemoteRecord) -> Self {
        let mut wire = WireRecord {
            kind: Some(record.data.type_name().to_string()),
            id: record.id,
            name: record.name,
            ttl: record.ttl,
            comment: Some(record.comment).filter(|c| !c.is_empty()),
            disabled: record.disabled.then(|| "true".to_string()),
            address_list: record.address_list,
            match_subdomain: record.match_subdomain.then(|| "true".to_string()),
            ..WireRecord::default()
        };

        match record.data {
            RecordData::A { address } | RecordData::Aaaa { address } => {
                wire.address = Some(address)
            }
            RecordData::Cname { cname } => wire.cname = Some(cname),
            RecordData::Txt { text } => wire.text = Some(text),
            RecordData::Mx {
                preference,
                exchange,
            } => {
                wire.mx_preference = Some(preference.to_string());
                wire.mx_exchange = Some(exchange);
            }
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => {
                wire.srv_priority = Some(priority.to_string());
                wire.srv_weight = Some(weight.to_string());
                wire.srv_port = Some(port.to_string());
                wire.srv_target = Some(target);
            }
            RecordData::Ns { ns } => wire.ns = Some(ns),
            RecordData::Other { .. } => {}
        }

        wire
    }
}
