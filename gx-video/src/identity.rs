//! Cache identity resolution.
//!
//! A load request is identified by more than its source address: the same
//! address may back several logically distinct textures depending on
//! which palette is currently bound. Palette identity is therefore folded
//! into both the lookup key and the reference hash, which distinguishes
//! the slots without widening the key space.

use gx_common::{PaletteFormat, SourceFormat, expand_to_block, texture_size_bytes};

use crate::hash::{TexHash, hash_range};
use crate::memory::SystemMemory;

/// Everything the table lookup and validity test need for one request.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedIdentity {
    /// Table key: the source address, with palette identity folded in
    /// for palette-indexed formats.
    pub key: u32,
    /// Reference hash over the source bytes, folded with the palette
    /// hash for palette-indexed formats.
    pub content_hash: TexHash,
    pub palette_hash: TexHash,
    /// Base format with the palette format folded into the high bits.
    pub full_format: u32,
    pub texture_size: usize,
    pub expanded_width: u32,
    pub expanded_height: u32,
}

/// Fold palette identity into a base key: XOR with the low and high 32
/// bits of the palette hash. Pure; collision behavior is tested directly.
pub fn fold_palette_identity(base_key: u32, palette_hash: TexHash) -> u32 {
    base_key ^ palette_hash.low32() ^ palette_hash.high32()
}

/// Derive the cache key and reference hash for a load request.
pub fn resolve(
    mem: &SystemMemory,
    address: u32,
    width: u32,
    height: u32,
    format: SourceFormat,
    palette_addr: u32,
    palette_format: PaletteFormat,
    hash_samples: u32,
) -> ResolvedIdentity {
    let expanded_width = expand_to_block(width, format.block_width());
    let expanded_height = expand_to_block(height, format.block_height());
    let texture_size = texture_size_bytes(expanded_width, expanded_height, format);

    let content_hash = hash_range(mem.ram_slice(address, texture_size), hash_samples);

    let mut identity = ResolvedIdentity {
        key: address,
        content_hash,
        palette_hash: TexHash::INVALID,
        full_format: format.code(),
        texture_size,
        expanded_width,
        expanded_height,
    };

    if let Some(palette_size) = format.palette_size_bytes() {
        let palette_hash = hash_range(mem.tmem_slice(palette_addr, palette_size), hash_samples);
        identity.palette_hash = palette_hash;
        identity.key = fold_palette_identity(address, palette_hash);
        identity.content_hash = content_hash.fold(palette_hash);
        identity.full_format = format.code() | (palette_format.code() << 16);
    }

    identity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with_texture() -> SystemMemory {
        let mut mem = SystemMemory::new(64 * 1024);
        let pixels: Vec<u8> = (0..8 * 8).map(|i| (i * 3) as u8).collect();
        mem.write_ram(0x1000, &pixels);
        mem.write_tmem(0x100, &[0xAA; 512]);
        mem
    }

    #[test]
    fn test_direct_color_key_is_address() {
        let mem = memory_with_texture();
        let id = resolve(
            &mem,
            0x1000,
            8,
            8,
            SourceFormat::Rgba8,
            0,
            PaletteFormat::Ia8,
            0,
        );
        assert_eq!(id.key, 0x1000);
        assert_eq!(id.full_format, SourceFormat::Rgba8.code());
        assert!(!id.palette_hash.is_valid());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mem = memory_with_texture();
        let a = resolve(&mem, 0x1000, 8, 8, SourceFormat::C8, 0x100, PaletteFormat::Rgb565, 0);
        let b = resolve(&mem, 0x1000, 8, 8, SourceFormat::C8, 0x100, PaletteFormat::Rgb565, 0);
        assert_eq!(a.key, b.key);
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn test_palette_contents_change_key_and_hash() {
        let mut mem = memory_with_texture();
        let a = resolve(&mem, 0x1000, 8, 8, SourceFormat::C8, 0x100, PaletteFormat::Rgb565, 0);
        mem.write_tmem(0x100, &[0x55; 512]);
        let b = resolve(&mem, 0x1000, 8, 8, SourceFormat::C8, 0x100, PaletteFormat::Rgb565, 0);
        assert_ne!(a.key, b.key);
        assert!(!a.content_hash.matches(b.content_hash));
    }

    #[test]
    fn test_palette_format_folds_into_high_bits() {
        let mem = memory_with_texture();
        let id = resolve(&mem, 0x1000, 8, 8, SourceFormat::C8, 0x100, PaletteFormat::Rgb5A3, 0);
        assert_eq!(id.full_format & 0xFFFF, SourceFormat::C8.code());
        assert_eq!(id.full_format >> 16, PaletteFormat::Rgb5A3.code());
    }

    #[test]
    fn test_fold_is_involutive() {
        let palette_hash = hash_range(&[1, 2, 3, 4], 0);
        let folded = fold_palette_identity(0x1000, palette_hash);
        assert_ne!(folded, 0x1000);
        assert_eq!(fold_palette_identity(folded, palette_hash), 0x1000);
    }

    #[test]
    fn test_block_expansion_feeds_size() {
        let mem = memory_with_texture();
        // 30x30 I4 expands to 32x32 at 1 nibble per texel.
        let id = resolve(&mem, 0x1000, 30, 30, SourceFormat::I4, 0, PaletteFormat::Ia8, 0);
        assert_eq!(id.expanded_width, 32);
        assert_eq!(id.expanded_height, 32);
        assert_eq!(id.texture_size, 32 * 32 / 2);
    }
}
