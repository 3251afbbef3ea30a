//! Breeze DNS Domain Layer
pub mod client_subnet;
pub mod config;
pub mod dns_query;
pub mod dns_response;
pub mod errors;

pub use client_subnet::ClientSubnet;
pub use config::{CacheConfig, ConfigError};
pub use dns_query::{DnsQuery, RecordClass, RecordType};
pub use dns_response::{DnsAnswer, DnsResponse};
pub use errors::CacheError;
