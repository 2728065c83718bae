//! Backend storage abstraction and the software reference backend.
//!
//! The cache owns pixel storage only through [`TextureStorage`]; it never
//! depends on a concrete representation, so GPU backends and the software
//! backend below are interchangeable. [`VideoBackend`] creates storage and
//! brackets framebuffer copies with the pipeline-stall pair
//! `reset_api_state` / `restore_api_state`.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use glam::Vec4;

use gx_common::GxTextureHeader;

use crate::copy::{CopySourceKind, CopyTransform, SourceRect};
use crate::decode::DecodedFormat;

/// Backend-owned pixel storage for one cache entry.
///
/// Exclusively owned by its entry and dropped with it.
pub trait TextureStorage {
    /// Upload one mip level. `data` is laid out with `expanded_width`
    /// texels per row; only the leading `width` texels of each row are
    /// meaningful.
    fn upload_level(&mut self, data: &[u8], width: u32, height: u32, expanded_width: u32, level: u32);

    /// Bind the texture to a sampler stage.
    fn bind(&self, stage: u32);

    /// Write the base level to disk (texture dumping).
    fn save(&self, path: &Path) -> anyhow::Result<()>;

    /// Populate storage from a framebuffer snapshot through the given
    /// color transform.
    fn from_framebuffer_copy(
        &mut self,
        kind: CopySourceKind,
        rect: SourceRect,
        scale_by_half: bool,
        transform: &CopyTransform,
    );
}

/// Storage factory plus the render-state bracket for copies.
pub trait VideoBackend {
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        expanded_width: u32,
        levels: u32,
        format: DecodedFormat,
    ) -> Box<dyn TextureStorage>;

    fn create_render_target(&mut self, width: u32, height: u32) -> Box<dyn TextureStorage>;

    /// Reset any draw-specific render state before a copy executes.
    fn reset_api_state(&mut self) {}

    /// Restore render state after a copy.
    fn restore_api_state(&mut self) {}
}

/// CPU-resident framebuffer the software backend copies from.
///
/// `color` and `depth` are RGBA8 planes (depth pre-swizzled into channels
/// the way the copy transforms expect).
#[derive(Debug, Default)]
pub struct SoftwareFramebuffer {
    pub width: u32,
    pub height: u32,
    pub color: Vec<u8>,
    pub depth: Vec<u8>,
}

impl SoftwareFramebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize * 4;
        Self {
            width,
            height,
            color: vec![0; size],
            depth: vec![0; size],
        }
    }

    fn sample(&self, kind: CopySourceKind, x: u32, y: u32) -> Vec4 {
        if x >= self.width || y >= self.height {
            return Vec4::ZERO;
        }
        let plane = match kind {
            CopySourceKind::Color => &self.color,
            CopySourceKind::Depth => &self.depth,
        };
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        Vec4::new(
            plane[idx] as f32,
            plane[idx + 1] as f32,
            plane[idx + 2] as f32,
            plane[idx + 3] as f32,
        ) / 255.0
    }
}

struct LevelPixels {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Software texture storage: RGBA8 pixels per level in plain vectors.
pub struct SoftwareTexture {
    levels: Vec<Option<LevelPixels>>,
    framebuffer: Option<Rc<RefCell<SoftwareFramebuffer>>>,
    width: u32,
    height: u32,
}

impl SoftwareTexture {
    pub fn new(width: u32, height: u32, levels: u32) -> Self {
        Self {
            levels: (0..levels.max(1)).map(|_| None).collect(),
            framebuffer: None,
            width,
            height,
        }
    }

    /// Base-level pixels, if uploaded or copied.
    pub fn base_level(&self) -> Option<&[u8]> {
        self.levels.first()?.as_ref().map(|l| l.data.as_slice())
    }

    /// Number of levels with resident pixels.
    pub fn resident_levels(&self) -> usize {
        self.levels.iter().filter(|l| l.is_some()).count()
    }
}

impl TextureStorage for SoftwareTexture {
    fn upload_level(&mut self, data: &[u8], width: u32, height: u32, expanded_width: u32, level: u32) {
        let level = level as usize;
        if level >= self.levels.len() {
            self.levels.resize_with(level + 1, || None);
        }
        let row_bytes = width as usize * 4;
        let src_stride = expanded_width as usize * 4;
        let mut pixels = vec![0u8; row_bytes * height as usize];
        for y in 0..height as usize {
            let src_start = y * src_stride;
            if src_start >= data.len() {
                break;
            }
            let src_end = (src_start + row_bytes).min(data.len());
            let n = src_end - src_start;
            pixels[y * row_bytes..y * row_bytes + n].copy_from_slice(&data[src_start..src_end]);
        }
        self.levels[level] = Some(LevelPixels {
            width,
            height,
            data: pixels,
        });
    }

    fn bind(&self, _stage: u32) {}

    fn save(&self, path: &Path) -> anyhow::Result<()> {
        let base = self
            .levels
            .first()
            .and_then(|l| l.as_ref())
            .context("no base level to save")?;
        let header = GxTextureHeader::from_u32(base.width, base.height);
        let mut bytes = Vec::with_capacity(GxTextureHeader::SIZE + base.data.len());
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(&base.data);
        std::fs::write(path, bytes)
            .with_context(|| format!("failed to write texture dump {}", path.display()))?;
        Ok(())
    }

    fn from_framebuffer_copy(
        &mut self,
        kind: CopySourceKind,
        rect: SourceRect,
        _scale_by_half: bool,
        transform: &CopyTransform,
    ) {
        let Some(fb) = &self.framebuffer else {
            return;
        };
        let fb = fb.borrow();
        let (w, h) = (self.width.max(1), self.height.max(1));
        let mut pixels = vec![0u8; w as usize * h as usize * 4];
        for y in 0..h {
            for x in 0..w {
                // Nearest sampling through the dims ratio; half-scale and
                // display-scaled copies both fall out of the ratio since
                // the destination dimensions already reflect them.
                let sx = rect.left + x * rect.width() / w;
                let sy = rect.top + y * rect.height() / h;
                let out = transform.apply(fb.sample(kind, sx, sy));
                let idx = (y as usize * w as usize + x as usize) * 4;
                pixels[idx] = (out.x * 255.0).round() as u8;
                pixels[idx + 1] = (out.y * 255.0).round() as u8;
                pixels[idx + 2] = (out.z * 255.0).round() as u8;
                pixels[idx + 3] = (out.w * 255.0).round() as u8;
            }
        }
        if self.levels.is_empty() {
            self.levels.push(None);
        }
        self.levels[0] = Some(LevelPixels {
            width: w,
            height: h,
            data: pixels,
        });
    }
}

/// Reference backend storing everything on the CPU.
///
/// Used by tests and headless tools; GPU backends implement the same
/// traits against device textures. Single-threaded (the cache runs on the
/// command-processing thread), hence `Rc<RefCell<...>>` for the shared
/// framebuffer.
pub struct SoftwareBackend {
    framebuffer: Rc<RefCell<SoftwareFramebuffer>>,
}

impl SoftwareBackend {
    pub fn new(framebuffer: SoftwareFramebuffer) -> Self {
        Self {
            framebuffer: Rc::new(RefCell::new(framebuffer)),
        }
    }

    /// Handle to the framebuffer for writing test patterns.
    pub fn framebuffer(&self) -> Rc<RefCell<SoftwareFramebuffer>> {
        Rc::clone(&self.framebuffer)
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(SoftwareFramebuffer::new(640, 528))
    }
}

impl VideoBackend for SoftwareBackend {
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        _expanded_width: u32,
        levels: u32,
        _format: DecodedFormat,
    ) -> Box<dyn TextureStorage> {
        Box::new(SoftwareTexture::new(width, height, levels))
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> Box<dyn TextureStorage> {
        let mut texture = SoftwareTexture::new(width, height, 1);
        texture.framebuffer = Some(Rc::clone(&self.framebuffer));
        Box::new(texture)
    }
}
