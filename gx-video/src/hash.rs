//! Content fingerprints for cache validity checks.
//!
//! xxHash3 is SIMD-optimized and fast enough to hash full texture ranges
//! every load at the default setting. A nonzero sample count switches to a
//! strided subset of the range, trading fidelity for speed: two different
//! buffers can legitimately produce the same sampled fingerprint, which
//! surfaces as a stale texture on screen, never as a fault.
//!
//! Sampled and full fingerprints are not comparable with each other, so
//! the active sample count can only change together with a full cache
//! invalidation.

use xxhash_rust::xxh3::{Xxh3, xxh3_64};

/// 64-bit content fingerprint.
///
/// The zero value is the "invalid" sentinel: it is never reliably
/// comparable, and [`TexHash::matches`] against it always fails. Entries
/// carry the sentinel when their content deliberately cannot be trusted
/// (fresh framebuffer copies, ranges made dynamic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TexHash(u64);

impl TexHash {
    pub const INVALID: TexHash = TexHash(0);

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn low32(self) -> u32 {
        self.0 as u32
    }

    pub fn high32(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// True only when both fingerprints are valid and equal. The invalid
    /// sentinel never matches anything, including itself.
    pub fn matches(self, other: TexHash) -> bool {
        self.is_valid() && other.is_valid() && self.0 == other.0
    }

    /// XOR-fold another fingerprint in (palette identity folding).
    pub fn fold(self, other: TexHash) -> TexHash {
        TexHash(self.0 ^ other.0)
    }
}

/// Bytes hashed per sample position.
const SAMPLE_CHUNK: usize = 8;

/// Fingerprint a byte range.
///
/// `samples == 0` hashes every byte. `samples > 0` hashes roughly that
/// many 8-byte chunks at a fixed stride, always including the start and
/// end of the range; buffers too small to meaningfully sample are hashed
/// in full. Deterministic for a given (buffer, samples) pair.
pub fn hash_range(buf: &[u8], samples: u32) -> TexHash {
    if samples == 0 || buf.len() <= samples as usize * SAMPLE_CHUNK * 2 {
        return TexHash(xxh3_64(buf));
    }

    let stride = ((buf.len() / samples as usize) & !(SAMPLE_CHUNK - 1)).max(SAMPLE_CHUNK);
    let mut hasher = Xxh3::new();
    let mut offset = 0;
    while offset + SAMPLE_CHUNK <= buf.len() {
        hasher.update(&buf[offset..offset + SAMPLE_CHUNK]);
        offset += stride;
    }
    // Tail chunk always participates so edits at the end are seen.
    hasher.update(&buf[buf.len() - SAMPLE_CHUNK..]);
    TexHash(hasher.digest())
}
