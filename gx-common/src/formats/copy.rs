//! Framebuffer-copy destination format codes.
//!
//! Copy destination formats are raw 4-bit codes whose meaning depends on
//! the copy source: code 1 is R8 for a color copy but Z8 for a depth copy,
//! code 3 is RA8 or Z16, and so on. They are kept as plain `u32` codes
//! rather than an enum so the copy pipeline can pass unknown codes through
//! to its fallback path the way real command streams do.

pub const R4: u32 = 0;
pub const R8: u32 = 1;
pub const RA4: u32 = 2;
pub const RA8: u32 = 3;
pub const RGB565: u32 = 4;
pub const RGB5A3: u32 = 5;
pub const RGBA8: u32 = 6;
pub const A8: u32 = 7;
/// Alias for R8; some command streams use code 8 interchangeably.
pub const R8_ALIAS: u32 = 8;
pub const G8: u32 = 9;
pub const B8: u32 = 10;
pub const RG8: u32 = 11;
pub const GB8: u32 = 12;

// Depth-copy interpretations of the same code space.
pub const Z4: u32 = 0;
pub const Z8: u32 = 1;
pub const Z16: u32 = 3;
pub const Z24X8: u32 = 6;
pub const Z8M: u32 = 9;
pub const Z8L: u32 = 10;
/// Z16 with reversed byte order.
pub const Z16_REVERSED: u32 = 11;
/// Lower 16 depth bits, read back as an IA8 texture.
pub const Z16L: u32 = 12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_space_overlaps_by_source_kind() {
        // The same code means different formats depending on source kind.
        assert_eq!(R8, Z8);
        assert_eq!(RA8, Z16);
        assert_eq!(RGBA8, Z24X8);
        assert_eq!(GB8, Z16L);
    }

    #[test]
    fn test_codes_fit_four_bits() {
        for code in [R4, R8, RA4, RA8, RGB565, RGB5A3, RGBA8, A8, R8_ALIAS, G8, B8, RG8, GB8] {
            assert!(code < 16);
        }
    }
}
