//! Framebuffer-copy color transforms.
//!
//! A framebuffer copy converts a source rectangle of the rendered output
//! into texture pixels through a linear per-pixel transform: four matrix
//! rows applied to source RGBA, a constant add, and a quantization mask
//! pair that rounds channels to the destination format's bit depth. The
//! table is fixed and exhaustively enumerated per (source kind, intensity,
//! destination format); nothing here is computed at runtime beyond
//! selecting a row set.
//!
//! Each transform also carries a small `variant` id naming the
//! precomputed constant-buffer slot the render backend uses for the same
//! conversion, so backend and software paths stay in agreement.

use glam::Vec4;

/// What the copy reads from: the color buffer or the depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopySourceKind {
    Color,
    Depth,
}

/// Source rectangle in framebuffer coordinates (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl SourceRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Linear color transform for one copy: `out[i] = rows[i] . rgba +
/// const_add[i]`, then quantized as `round(out * color_mask[0]) *
/// color_mask[1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CopyTransform {
    pub rows: [Vec4; 4],
    pub const_add: Vec4,
    /// Quantization scale and its inverse, per channel.
    pub color_mask: [Vec4; 2],
    /// Precomputed constant-buffer slot for this conversion.
    pub variant: u32,
}

impl CopyTransform {
    fn identity(variant: u32) -> Self {
        Self {
            rows: [
                Vec4::new(1.0, 0.0, 0.0, 0.0),
                Vec4::new(0.0, 1.0, 0.0, 0.0),
                Vec4::new(0.0, 0.0, 1.0, 0.0),
                Vec4::new(0.0, 0.0, 0.0, 1.0),
            ],
            const_add: Vec4::ZERO,
            color_mask: [Vec4::splat(255.0), Vec4::splat(1.0 / 255.0)],
            variant,
        }
    }

    fn with_rows(r0: Vec4, r1: Vec4, r2: Vec4, r3: Vec4, variant: u32) -> Self {
        Self {
            rows: [r0, r1, r2, r3],
            ..Self::identity(variant)
        }
    }

    /// Apply the transform to one normalized RGBA value, including
    /// quantization to the destination bit depth.
    pub fn apply(&self, rgba: Vec4) -> Vec4 {
        let out = Vec4::new(
            self.rows[0].dot(rgba),
            self.rows[1].dot(rgba),
            self.rows[2].dot(rgba),
            self.rows[3].dot(rgba),
        ) + self.const_add;
        ((out * self.color_mask[0]).round() * self.color_mask[1]).clamp(Vec4::ZERO, Vec4::ONE)
    }
}

// Broadcast-channel row sets (every output channel reads one source
// channel), used by the single-channel destination formats.
const R: Vec4 = Vec4::new(1.0, 0.0, 0.0, 0.0);
const G: Vec4 = Vec4::new(0.0, 1.0, 0.0, 0.0);
const B: Vec4 = Vec4::new(0.0, 0.0, 1.0, 0.0);
const A: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);
const ZERO: Vec4 = Vec4::ZERO;

/// BT.601 luma coefficients used by intensity copies.
const LUMA: Vec4 = Vec4::new(0.257, 0.504, 0.098, 0.0);

/// Select the color transform for a copy.
///
/// Unknown destination codes are reported as a recoverable warning and
/// degrade to the RGBA8-identity transform (or the documented depth
/// fallback); the copy proceeds.
pub fn copy_transform(dst_format: u32, kind: CopySourceKind, is_intensity: bool) -> CopyTransform {
    match kind {
        CopySourceKind::Depth => depth_transform(dst_format),
        CopySourceKind::Color if is_intensity => intensity_transform(dst_format),
        CopySourceKind::Color => color_transform(dst_format),
    }
}

fn depth_transform(dst_format: u32) -> CopyTransform {
    match dst_format {
        0 => CopyTransform::with_rows(A, A, A, A, 0),      // Z4
        1 | 8 => CopyTransform::with_rows(R, R, R, R, 1),  // Z8
        3 => CopyTransform::with_rows(G, G, G, R, 24),     // Z16
        11 => CopyTransform::with_rows(R, R, R, G, 2),     // Z16 (reversed)
        6 => CopyTransform::with_rows(R, G, B, ZERO, 3),   // Z24X8
        9 => CopyTransform::with_rows(G, G, G, G, 4),      // Z8M
        10 => CopyTransform::with_rows(B, B, B, B, 5),     // Z8L
        12 => CopyTransform::with_rows(G, G, G, B, 6),     // Z16L
        _ => {
            tracing::warn!("Unknown copy zbuf format: {:#x}", dst_format);
            CopyTransform::with_rows(B, G, R, ZERO, 7)
        }
    }
}

fn intensity_transform(dst_format: u32) -> CopyTransform {
    match dst_format {
        // I4 / I8 / IA4 / IA8 share the luma rows and differ in how the
        // alpha output and quantization are set up.
        0 | 1 | 2 | 3 | 8 => {
            let mut t = CopyTransform::with_rows(LUMA, LUMA, LUMA, ZERO, 0);
            t.const_add = Vec4::new(16.0 / 255.0, 16.0 / 255.0, 16.0 / 255.0, 0.0);
            if dst_format < 2 || dst_format == 8 {
                // Intensity-only: alpha also carries luma.
                t.rows[3] = LUMA;
                t.const_add.w = 16.0 / 255.0;
                if dst_format == 0 {
                    t.color_mask = [
                        Vec4::new(15.0, 15.0, 15.0, 255.0),
                        Vec4::new(1.0 / 15.0, 1.0 / 15.0, 1.0 / 15.0, 1.0 / 255.0),
                    ];
                    t.variant = 8;
                } else {
                    t.variant = 9;
                }
            } else {
                // Intensity + alpha: alpha passes through.
                t.rows[3] = A;
                if dst_format == 2 {
                    t.color_mask = [Vec4::splat(15.0), Vec4::splat(1.0 / 15.0)];
                    t.variant = 10;
                } else {
                    t.variant = 11;
                }
            }
            t
        }
        _ => {
            tracing::warn!("Unknown copy intensity format: {:#x}", dst_format);
            CopyTransform::identity(23)
        }
    }
}

fn color_transform(dst_format: u32) -> CopyTransform {
    match dst_format {
        0 => {
            // R4
            let mut t = CopyTransform::with_rows(R, R, R, R, 12);
            t.color_mask[0].x = 15.0;
            t.color_mask[1].x = 1.0 / 15.0;
            t
        }
        1 | 8 => CopyTransform::with_rows(R, R, R, R, 13), // R8
        2 => {
            // RA4
            let mut t = CopyTransform::with_rows(R, R, R, A, 14);
            t.color_mask[0].x = 15.0;
            t.color_mask[0].w = 15.0;
            t.color_mask[1].x = 1.0 / 15.0;
            t.color_mask[1].w = 1.0 / 15.0;
            t
        }
        3 => CopyTransform::with_rows(R, R, R, A, 15), // RA8
        7 => CopyTransform::with_rows(A, A, A, A, 16), // A8
        9 => CopyTransform::with_rows(G, G, G, G, 17), // G8
        10 => CopyTransform::with_rows(B, B, B, B, 18), // B8
        11 => CopyTransform::with_rows(R, R, R, G, 19), // RG8
        12 => CopyTransform::with_rows(G, G, G, B, 20), // GB8
        4 => {
            // RGB565: 5/6/5 quantization, alpha forced opaque
            let mut t = CopyTransform::with_rows(R, G, B, ZERO, 21);
            t.color_mask[0] = Vec4::new(31.0, 63.0, 31.0, 255.0);
            t.color_mask[1] = Vec4::new(1.0 / 31.0, 1.0 / 63.0, 1.0 / 31.0, 1.0 / 255.0);
            t.const_add.w = 1.0;
            t
        }
        5 => {
            // RGB5A3 (quantized as RGB5 + 3-bit alpha)
            let mut t = CopyTransform::identity(22);
            t.color_mask[0] = Vec4::new(31.0, 31.0, 31.0, 7.0);
            t.color_mask[1] = Vec4::new(1.0 / 31.0, 1.0 / 31.0, 1.0 / 31.0, 1.0 / 7.0);
            t
        }
        6 => CopyTransform::identity(23), // RGBA8
        _ => {
            tracing::warn!("Unknown copy color format: {:#x}", dst_format);
            CopyTransform::identity(23)
        }
    }
}
