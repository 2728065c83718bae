//! Decode collaborator contract.
//!
//! Turning a tiled source format into linear pixels is an external
//! transform with a known output size; the cache consumes it as a black
//! box writing into its scratch buffer. The per-format numeric decode
//! algorithms are deliberately not part of this crate.

use gx_common::{PaletteFormat, SourceFormat};

/// Pixel layout a decode produced in the scratch buffer.
///
/// `None` means the decoder has no native target format for the request
/// and a generic fallback is required (e.g. a replacement asset or a
/// conversion pass in the backend).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedFormat {
    None,
    Rgba8,
    Bgra8,
    Rgb565,
    Ia8,
    I8,
}

/// External decode transform.
///
/// Writes linear pixels for `expanded_width` x `expanded_height` texels
/// into `out` and reports the produced layout. `palette` holds the raw
/// palette bytes for palette-indexed formats (empty otherwise);
/// `want_rgba` asks the decoder to prefer an RGBA8 target when it has a
/// choice.
pub trait TextureDecoder {
    #[allow(clippy::too_many_arguments)]
    fn decode(
        &self,
        out: &mut [u8],
        src: &[u8],
        expanded_width: u32,
        expanded_height: u32,
        format: SourceFormat,
        palette: &[u8],
        palette_format: PaletteFormat,
        want_rgba: bool,
    ) -> DecodedFormat;
}

/// Minimal decoder for headless use: RGBA8 source bytes pass through,
/// every other format yields opaque black of the right size. Real decode
/// routines plug in through [`TextureDecoder`].
pub struct RawDecoder;

impl TextureDecoder for RawDecoder {
    fn decode(
        &self,
        out: &mut [u8],
        src: &[u8],
        expanded_width: u32,
        expanded_height: u32,
        format: SourceFormat,
        _palette: &[u8],
        _palette_format: PaletteFormat,
        _want_rgba: bool,
    ) -> DecodedFormat {
        let out_size = (expanded_width as usize * expanded_height as usize * 4).min(out.len());
        let out = &mut out[..out_size];
        match format {
            SourceFormat::Rgba8 => {
                let n = src.len().min(out.len());
                out[..n].copy_from_slice(&src[..n]);
                out[n..].fill(0);
            }
            _ => {
                out.fill(0);
                for px in out.chunks_exact_mut(4) {
                    px[3] = 0xFF;
                }
            }
        }
        DecodedFormat::Rgba8
    }
}
