use crate::ttl::effective_ttl;
use breeze_dns_domain::{CacheError, DnsAnswer, DnsResponse, RecordType};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::sync::Arc;

/// Version tag leading every packed entry.
const FORMAT_VERSION: u8 = 1;

/// A stored cache entry: the answer set, the upstream that produced it and
/// the effective TTL used for lifetime accounting.
///
/// The effective TTL is always the TTL policy output, never the raw
/// upstream TTL. The per-record TTLs returned to clients are recomputed as
/// remaining lifetime at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheItem {
    pub response: DnsResponse,
    pub upstream: Arc<str>,
    pub ttl: u32,
}

impl CacheItem {
    /// Builds an item from an upstream response, applying the TTL override
    /// policy. Returns `None` when the response is not cacheable.
    pub fn from_response(
        response: &DnsResponse,
        upstream: &str,
        min_ttl: u32,
        max_ttl: u32,
    ) -> Option<Self> {
        let ttl = effective_ttl(response.min_ttl(), min_ttl, max_ttl);
        if ttl == 0 {
            return None;
        }
        Some(Self {
            response: response.clone(),
            upstream: Arc::from(upstream),
            ttl,
        })
    }

    /// Packs the item into the storage layout. Entries are stored packed so
    /// the byte budget is accounted honestly and corruption is detectable
    /// on read.
    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64 + self.upstream.len());
        buf.put_u8(FORMAT_VERSION);
        buf.put_u32(self.ttl);
        buf.put_u16(self.upstream.len() as u16);
        buf.put_slice(self.upstream.as_bytes());
        buf.put_u16(self.response.answers.len() as u16);
        for answer in &self.response.answers {
            buf.put_u16(answer.record_type.to_u16());
            buf.put_u32(answer.ttl);
            buf.put_u16(answer.name.len() as u16);
            buf.put_slice(answer.name.as_bytes());
            buf.put_u16(answer.rdata.len() as u16);
            buf.put_slice(&answer.rdata);
        }
        buf.freeze()
    }

    /// Reverses [`CacheItem::pack`]. Every length is checked; a short or
    /// malformed buffer yields `CacheError::CorruptEntry`.
    pub fn unpack(mut buf: &[u8]) -> Result<Self, CacheError> {
        need(buf, 7)?;
        let version = buf.get_u8();
        if version != FORMAT_VERSION {
            return Err(CacheError::CorruptEntry(format!(
                "unknown entry format version {version}"
            )));
        }
        let ttl = buf.get_u32();
        let upstream_len = buf.get_u16() as usize;
        need(buf, upstream_len)?;
        let upstream = str_field(&buf[..upstream_len], "upstream")?;
        buf.advance(upstream_len);

        need(buf, 2)?;
        let count = buf.get_u16() as usize;
        let mut answers = Vec::with_capacity(count);
        for _ in 0..count {
            need(buf, 8)?;
            let record_type = RecordType::from_u16(buf.get_u16());
            let answer_ttl = buf.get_u32();
            let name_len = buf.get_u16() as usize;
            need(buf, name_len)?;
            let name = str_field(&buf[..name_len], "answer name")?;
            buf.advance(name_len);
            need(buf, 2)?;
            let rdata_len = buf.get_u16() as usize;
            need(buf, rdata_len)?;
            let rdata: Arc<[u8]> = Arc::from(&buf[..rdata_len]);
            buf.advance(rdata_len);
            answers.push(DnsAnswer {
                name,
                record_type,
                ttl: answer_ttl,
                rdata,
            });
        }
        if buf.has_remaining() {
            return Err(CacheError::CorruptEntry(format!(
                "{} trailing bytes after last answer",
                buf.remaining()
            )));
        }
        Ok(Self {
            response: DnsResponse::new(answers),
            upstream,
            ttl,
        })
    }
}

fn need(buf: &[u8], n: usize) -> Result<(), CacheError> {
    if buf.remaining() < n {
        return Err(CacheError::CorruptEntry(format!(
            "truncated entry: need {n} bytes, have {}",
            buf.remaining()
        )));
    }
    Ok(())
}

fn str_field(bytes: &[u8], what: &str) -> Result<Arc<str>, CacheError> {
    std::str::from_utf8(bytes)
        .map(Arc::from)
        .map_err(|_| CacheError::CorruptEntry(format!("{what} is not valid UTF-8")))
}
