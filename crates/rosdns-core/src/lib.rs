// # rosdns-core
//
// Core library for reconciling logical DNS endpoints against flat record
// stores.
//
// ## Architecture Overview
//
// - **Endpoint**: One name and record kind owning one or more targets
// - **DnsProvider**: Trait for listing, creating and removing records
// - **ProviderRegistry**: Plugin-based registry for DNS providers
// - **RosDnsConfig**: Provider connection settings and record defaults
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The model and contract live here, backends
//    live in provider crates
// 2. **Ownership Boundary**: Providers only touch records carrying their tag
// 3. **No Hidden State**: Providers re-read the backend on every call
// 4. **Surfaced Failures**: Partial results are reported, never rolled back

pub mod config;
pub mod endpoint;
pub mod error;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{ProviderConfig, RecordDefaults, RosDnsConfig};
pub use endpoint::{AppliedRecord, Changes, Endpoint, RecordKind};
pub use error::{Error, Result};
pub use registry::ProviderRegistry;
pub use traits::{DnsProvider, DnsProviderFactory};
