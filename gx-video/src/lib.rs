//! GX texture-memory pipeline.
//!
//! Emulates the texture cache of the GX graphics processor: decides, for
//! every texture a draw references, whether a previously decoded copy in
//! fast storage is still valid, and otherwise produces one from source
//! memory, from a framebuffer snapshot, or from a replacement asset.
//!
//! # Architecture
//!
//! **SystemMemory** (emulated RAM/TMEM) → **TextureCache** (validity +
//! lifecycle) → **VideoBackend** (storage upload/bind)
//!
//! - `identity` folds source address, content hash, palette hash, and
//!   format into one cache key
//! - `entry` holds per-texture cached state and the copy provenance
//!   state machine
//! - `copy` selects the per-format color transform for framebuffer copies
//! - `texture_cache` orchestrates load, copy, invalidation, and eviction
//!
//! There is no explicit invalidate signal from the producer of texture
//! memory; staleness is inferred from content hashes, which makes the
//! hash policy (`hash`) a correctness/performance trade-off rather than
//! an implementation detail.
//!
//! All operations are synchronous and single-threaded by design; the
//! cache runs on the graphics command-processing thread.

pub mod backend;
pub mod config;
pub mod copy;
pub mod decode;
pub mod entry;
pub mod hash;
pub mod identity;
pub mod memory;
pub mod mip;
pub mod replacement;
pub mod texture_cache;

pub use backend::{SoftwareBackend, SoftwareFramebuffer, SoftwareTexture, TextureStorage, VideoBackend};
pub use config::{CacheConfig, ConfigError};
pub use copy::{CopySourceKind, CopyTransform, SourceRect, copy_transform};
pub use decode::{DecodedFormat, RawDecoder, TextureDecoder};
pub use entry::{CacheEntry, CopyState, ram_load_transition};
pub use hash::TexHash;
pub use identity::fold_palette_identity;
pub use memory::SystemMemory;
pub use replacement::{ReplacementProvider, replacement_name};
pub use texture_cache::{FRAME_KILL_THRESHOLD, SCRATCH_SIZE, TextureCache};
