use crate::dns_query::RecordType;
use std::sync::Arc;

/// Single answer record: opaque rdata plus the TTL the upstream returned.
/// The cache never interprets the rdata bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub ttl: u32,
    pub rdata: Arc<[u8]>,
}

impl DnsAnswer {
    pub fn new(
        name: impl Into<Arc<str>>,
        record_type: RecordType,
        ttl: u32,
        rdata: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl,
            rdata: rdata.into(),
        }
    }
}

/// Opaque answer set for a query. Only the per-record TTLs matter to the
/// cache; everything else passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsResponse {
    pub answers: Vec<DnsAnswer>,
}

impl DnsResponse {
    pub fn new(answers: Vec<DnsAnswer>) -> Self {
        Self { answers }
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Smallest record TTL, the lifetime the whole answer set lives by.
    /// Zero when there are no answers, which callers treat as not cacheable.
    pub fn min_ttl(&self) -> u32 {
        self.answers.iter().map(|a| a.ttl).min().unwrap_or(0)
    }

    /// Copy of this response with every record TTL rewritten to `ttl`.
    /// Used when serving from cache: clients see remaining lifetime, not
    /// the TTL the upstream originally returned.
    pub fn with_ttl(&self, ttl: u32) -> Self {
        Self {
            answers: self
                .answers
                .iter()
                .map(|a| DnsAnswer {
                    ttl,
                    ..a.clone()
                })
                .collect(),
        }
    }
}
