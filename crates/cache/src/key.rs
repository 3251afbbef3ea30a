use breeze_dns_domain::DnsQuery;
use std::fmt;

/// Opaque cache key: case-folded query name, record type, class and, when
/// subnet-aware caching is on, the masked client subnet prefix.
///
/// Two queries a client considers equivalent produce identical keys;
/// queries that must be answered independently (A vs AAAA, different
/// class, different subnet) never collide on the name alone.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Box<[u8]>);

impl CacheKey {
    pub fn from_query(query: &DnsQuery, subnet_aware: bool) -> Self {
        let mut buf = Vec::with_capacity(query.name.len() + 8);
        for b in query.name.bytes() {
            buf.push(b.to_ascii_lowercase());
        }
        buf.push(0);
        buf.extend_from_slice(&query.record_type.to_u16().to_be_bytes());
        buf.extend_from_slice(&query.class.to_u16().to_be_bytes());
        if subnet_aware {
            if let Some(subnet) = &query.client_subnet {
                buf.extend_from_slice(&subnet.key_bytes());
            }
        }
        Self(buf.into_boxed_slice())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", String::from_utf8_lossy(&self.0))
    }
}
