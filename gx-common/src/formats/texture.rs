//! Source texture format metadata.
//!
//! The texture unit stores textures in main memory as tiled blocks; every
//! format has a fixed block geometry and texel size. Dimensions are always
//! expanded to block multiples before any size computation, so the byte
//! size of a texture depends on the expanded dimensions, not the native
//! ones.

/// Source texture format codes as programmed into the texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SourceFormat {
    /// 4-bit intensity
    I4 = 0x0,
    /// 8-bit intensity
    I8 = 0x1,
    /// 4-bit intensity + 4-bit alpha
    Ia4 = 0x2,
    /// 8-bit intensity + 8-bit alpha
    Ia8 = 0x3,
    /// 16-bit color, no alpha
    Rgb565 = 0x4,
    /// 16-bit color, 3-bit alpha or opaque RGB5
    Rgb5A3 = 0x5,
    /// 32-bit color
    Rgba8 = 0x6,
    /// 4-bit palette index
    C4 = 0x8,
    /// 8-bit palette index
    C8 = 0x9,
    /// 14-bit palette index (2 bits unused)
    C14X2 = 0xA,
    /// S3TC-style block compression
    Cmpr = 0xE,
}

impl SourceFormat {
    /// Decode a raw format code. Unknown codes yield `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x0 => Some(SourceFormat::I4),
            0x1 => Some(SourceFormat::I8),
            0x2 => Some(SourceFormat::Ia4),
            0x3 => Some(SourceFormat::Ia8),
            0x4 => Some(SourceFormat::Rgb565),
            0x5 => Some(SourceFormat::Rgb5A3),
            0x6 => Some(SourceFormat::Rgba8),
            0x8 => Some(SourceFormat::C4),
            0x9 => Some(SourceFormat::C8),
            0xA => Some(SourceFormat::C14X2),
            0xE => Some(SourceFormat::Cmpr),
            _ => None,
        }
    }

    /// Raw format code as programmed into the texture unit.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Block width in texels.
    pub fn block_width(self) -> u32 {
        match self {
            SourceFormat::I4 | SourceFormat::C4 | SourceFormat::Cmpr => 8,
            SourceFormat::I8 | SourceFormat::Ia4 | SourceFormat::C8 => 8,
            _ => 4,
        }
    }

    /// Block height in texels.
    pub fn block_height(self) -> u32 {
        match self {
            SourceFormat::I4 | SourceFormat::C4 | SourceFormat::Cmpr => 8,
            _ => 4,
        }
    }

    /// Texel size in nibbles (half-bytes). CMPR averages to half a byte
    /// per texel over a block.
    pub fn texel_size_nibbles(self) -> u32 {
        match self {
            SourceFormat::I4 | SourceFormat::C4 | SourceFormat::Cmpr => 1,
            SourceFormat::I8 | SourceFormat::Ia4 | SourceFormat::C8 => 2,
            SourceFormat::Ia8 | SourceFormat::Rgb565 | SourceFormat::Rgb5A3 | SourceFormat::C14X2 => 4,
            SourceFormat::Rgba8 => 8,
        }
    }

    /// True for formats whose texels are palette indices.
    pub fn is_palette_indexed(self) -> bool {
        matches!(self, SourceFormat::C4 | SourceFormat::C8 | SourceFormat::C14X2)
    }

    /// Palette size in bytes (2 bytes per entry), `None` for direct-color
    /// formats.
    pub fn palette_size_bytes(self) -> Option<usize> {
        match self {
            SourceFormat::C4 => Some(16 * 2),
            SourceFormat::C8 => Some(256 * 2),
            SourceFormat::C14X2 => Some(16384 * 2),
            _ => None,
        }
    }
}

/// Palette (TLUT) entry formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PaletteFormat {
    Ia8 = 0,
    Rgb565 = 1,
    Rgb5A3 = 2,
}

impl PaletteFormat {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(PaletteFormat::Ia8),
            1 => Some(PaletteFormat::Rgb565),
            2 => Some(PaletteFormat::Rgb5A3),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Expand a dimension to the next multiple of `block` (power of two).
pub fn expand_to_block(dim: u32, block: u32) -> u32 {
    debug_assert!(block.is_power_of_two());
    (dim + block - 1) & !(block - 1)
}

/// Source byte size of a texture with block-expanded dimensions.
pub fn texture_size_bytes(expanded_width: u32, expanded_height: u32, format: SourceFormat) -> usize {
    (expanded_width as usize * expanded_height as usize * format.texel_size_nibbles() as usize) / 2
}

/// Header for raw dumped texture images (4 bytes, little-endian).
///
/// POD format, no magic bytes: width u16, height u16, then RGBA8 pixel
/// data for the base level.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct GxTextureHeader {
    pub width: u16,
    pub height: u16,
}

impl GxTextureHeader {
    pub const SIZE: usize = 4;

    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Create header from u32 dimensions (truncates to u16)
    pub fn from_u32(width: u32, height: u32) -> Self {
        Self {
            width: width as u16,
            height: height as u16,
        }
    }

    /// RGBA8 pixel data size for the base level (4 bytes per pixel)
    pub fn rgba8_size(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.width.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.height.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            width: u16::from_le_bytes([bytes[0], bytes[1]]),
            height: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_code_roundtrip() {
        for code in 0..16 {
            if let Some(format) = SourceFormat::from_code(code) {
                assert_eq!(format.code(), code);
            }
        }
        assert_eq!(SourceFormat::from_code(0x7), None);
        assert_eq!(SourceFormat::from_code(0xB), None);
        assert_eq!(SourceFormat::from_code(0xFF), None);
    }

    #[test]
    fn test_block_geometry() {
        // 4-bit formats pack 8x8 texel blocks, 8-bit formats 8x4,
        // 16/32-bit formats 4x4
        assert_eq!(SourceFormat::I4.block_width(), 8);
        assert_eq!(SourceFormat::I4.block_height(), 8);
        assert_eq!(SourceFormat::I8.block_width(), 8);
        assert_eq!(SourceFormat::I8.block_height(), 4);
        assert_eq!(SourceFormat::Rgba8.block_width(), 4);
        assert_eq!(SourceFormat::Rgba8.block_height(), 4);
        assert_eq!(SourceFormat::Cmpr.block_width(), 8);
        assert_eq!(SourceFormat::Cmpr.block_height(), 8);
    }

    #[test]
    fn test_expand_to_block() {
        assert_eq!(expand_to_block(64, 4), 64);
        assert_eq!(expand_to_block(65, 4), 68);
        assert_eq!(expand_to_block(1, 8), 8);
        assert_eq!(expand_to_block(30, 8), 32);
        assert_eq!(expand_to_block(0, 4), 0);
    }

    #[test]
    fn test_texture_size_bytes() {
        // 64x64 RGBA8: 8 nibbles per texel = 4 bytes
        assert_eq!(texture_size_bytes(64, 64, SourceFormat::Rgba8), 64 * 64 * 4);
        // 64x64 I4: 1 nibble per texel
        assert_eq!(texture_size_bytes(64, 64, SourceFormat::I4), 64 * 64 / 2);
        // 8x8 C8: 1 byte per texel
        assert_eq!(texture_size_bytes(8, 8, SourceFormat::C8), 64);
    }

    #[test]
    fn test_palette_sizes() {
        assert_eq!(SourceFormat::C4.palette_size_bytes(), Some(32));
        assert_eq!(SourceFormat::C8.palette_size_bytes(), Some(512));
        assert_eq!(SourceFormat::C14X2.palette_size_bytes(), Some(32768));
        assert_eq!(SourceFormat::Rgba8.palette_size_bytes(), None);
        assert_eq!(SourceFormat::I4.palette_size_bytes(), None);
    }

    #[test]
    fn test_palette_indexed_flags() {
        assert!(SourceFormat::C4.is_palette_indexed());
        assert!(SourceFormat::C8.is_palette_indexed());
        assert!(SourceFormat::C14X2.is_palette_indexed());
        assert!(!SourceFormat::Rgba8.is_palette_indexed());
        assert!(!SourceFormat::Cmpr.is_palette_indexed());
    }

    #[test]
    fn test_header_roundtrip() {
        let header = GxTextureHeader::new(128, 256);
        let bytes = header.to_bytes();
        let parsed = GxTextureHeader::from_bytes(&bytes).unwrap();

        assert_eq!(parsed.width, 128);
        assert_eq!(parsed.height, 256);
    }

    #[test]
    fn test_header_short_input() {
        assert!(GxTextureHeader::from_bytes(&[1, 2, 3]).is_none());
    }

    #[test]
    fn test_header_rgba8_size() {
        let header = GxTextureHeader::new(64, 64);
        assert_eq!(header.rgba8_size(), 64 * 64 * 4);
    }
}
