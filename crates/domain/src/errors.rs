use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Upstream exchange failed: {0}")]
    UpstreamFailed(String),

    #[error("Upstream exchange timed out")]
    UpstreamTimeout,

    #[error("Invalid client subnet: {0}")]
    InvalidClientSubnet(String),

    #[error("Corrupt cache entry: {0}")]
    CorruptEntry(String),
}
