//! Replacement asset lookup (external collaborator).
//!
//! A replacement provider supplies pre-decoded pixel data keyed by
//! content hash, consulted before the decode path on a cache miss. The
//! file-system scanning behind it is out of scope; this is the seam.

use gx_common::SourceFormat;

use crate::decode::DecodedFormat;
use crate::hash::TexHash;

/// Optional source of pre-decoded replacement pixels.
pub trait ReplacementProvider {
    /// Look up a replacement by its derived name. On a hit, write pixels
    /// into `out`, update `width`/`height` to the replacement's
    /// dimensions, and return the produced layout.
    fn fetch(
        &self,
        name: &str,
        width: &mut u32,
        height: &mut u32,
        out: &mut [u8],
    ) -> Option<DecodedFormat>;
}

/// Deterministic asset name shared by replacement lookup and texture
/// dumping: title namespace, low content-hash bits, source format code.
pub fn replacement_name(namespace: &str, content_hash: TexHash, format: SourceFormat) -> String {
    format!("{}_{:08x}_{}", namespace, content_hash.low32(), format.code())
}
