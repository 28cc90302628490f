//! RouterOS system resource information
//!
//! Read from `GET /rest/system/resource`; used as a connectivity probe.

use serde::{Deserialize, Serialize};

/// Subset of `/system/resource` reported by RouterOS
///
/// All values are strings on the wire and kept as such.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SystemInfo {
    pub architecture_name: String,
    pub board_name: String,
    pub platform: String,
    pub version: String,
    pub uptime: String,
    pub cpu: String,
    pub cpu_count: String,
    pub cpu_load: String,
    pub free_memory: String,
    pub total_memory: String,
}
