//! Mip chain length and source layout helpers.

use gx_common::SourceFormat;

/// Number of mip levels to load for a request.
///
/// Native mips are only usable when the requested ceiling is nonzero, the
/// storage dimensions match the native dimensions (a replacement asset
/// may have substituted larger ones), and both dimensions are powers of
/// two. The full chain is `log2(max(w, h)) + 1` levels, capped at
/// `max_level + 1`; anything else loads the base level only.
pub fn mip_chain_levels(
    width: u32,
    height: u32,
    native_width: u32,
    native_height: u32,
    use_native_mips: bool,
    max_level: u32,
) -> u32 {
    let native_dims = width == native_width && height == native_height;
    let pow2 = width.is_power_of_two() && height.is_power_of_two();
    if max_level == 0 || !use_native_mips || !native_dims || !pow2 || width == 0 || height == 0 {
        return 1;
    }
    (width.max(height).ilog2() + 1).min(max_level + 1)
}

/// Source bytes occupied by one mip level in memory.
///
/// Levels are stored back to back, each padded out to the format's block
/// geometry even when the mip dimensions have shrunk below a block.
pub fn mip_level_source_bytes(mip_width: u32, mip_height: u32, format: SourceFormat) -> usize {
    let w = mip_width.max(format.block_width()) as usize;
    let h = mip_height.max(format.block_height()) as usize;
    w * h * format.texel_size_nibbles() as usize / 2
}
