//! Storage-lifetime policy for cached answers.

/// Cooldown threshold substituted when the configured value is zero.
pub const DEFAULT_COOLDOWN_THRESHOLD: u32 = 3;

/// Client-visible TTL attached to answers served stale in optimistic mode,
/// so clients re-ask soon while the refreshed answer lands.
pub const STALE_ANSWER_TTL: u32 = 10;

/// Effective storage lifetime after the min/max overrides.
///
/// A zero `response_ttl` means the response is not cacheable and callers
/// must not store it. The overrides clamp, they never accumulate: feeding
/// the output back in yields the same value.
///
/// This must be applied when the cache item is built. Applying it only to
/// the client-visible answer leaves the stored entry expiring at the raw
/// upstream TTL while clients are told a longer one, which shows up as
/// silent cache misses.
pub fn effective_ttl(response_ttl: u32, min_ttl: u32, max_ttl: u32) -> u32 {
    if response_ttl == 0 {
        return 0;
    }
    if min_ttl > 0 && response_ttl < min_ttl {
        return min_ttl;
    }
    if max_ttl > 0 && response_ttl > max_ttl {
        return max_ttl;
    }
    response_ttl
}
