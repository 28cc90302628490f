//! Core traits for the rosdns system
//!
//! - [`DnsProvider`]: Read, create and remove DNS records via a provider API
//! - [`DnsProviderFactory`]: Build providers from configuration

pub mod dns_provider;

pub use dns_provider::{DnsProvider, DnsProviderFactory};
