//! Shared format metadata for the GX video pipeline.
//!
//! Pure lookup tables and size math for the texture unit's source formats,
//! palette formats, and framebuffer-copy destination codes. No I/O, no
//! state; everything here is usable from tools and tests without a cache.

pub mod formats;

pub use formats::copy;
pub use formats::texture::{
    GxTextureHeader, PaletteFormat, SourceFormat, expand_to_block, texture_size_bytes,
};
