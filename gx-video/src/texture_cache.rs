//! The texture cache orchestrator.
//!
//! Owns the entry table, the shared scratch decode buffer, and the
//! collaborator handles, and composes identity resolution, the validity
//! test, the mip chain loader, and the copy pipeline into the public
//! Load/Copy/Invalidate/Evict operations.
//!
//! All operations run to completion on the command-processing thread;
//! nothing here blocks or suspends. The scratch buffer is reused across
//! loads, which is sound because every decode-then-upload sequence drains
//! it before the next load begins.

use hashbrown::HashMap;

use gx_common::{PaletteFormat, SourceFormat, expand_to_block, texture_size_bytes};

use crate::backend::VideoBackend;
use crate::config::CacheConfig;
use crate::copy::{CopySourceKind, SourceRect, copy_transform};
use crate::decode::{DecodedFormat, TextureDecoder};
use crate::entry::{CacheEntry, CopyState, ram_load_transition};
use crate::hash::TexHash;
use crate::identity;
use crate::memory::SystemMemory;
use crate::mip;
use crate::replacement::{ReplacementProvider, replacement_name};

/// Scratch decode buffer size: the largest supported texture at 4 bytes
/// per texel.
pub const SCRATCH_SIZE: usize = 2048 * 2048 * 4;

/// Entries unused for more than this many frames are evicted by
/// [`TextureCache::cleanup`].
pub const FRAME_KILL_THRESHOLD: u32 = 200;

/// The texture cache.
///
/// Generic over the storage backend; tests and headless tools use
/// [`crate::backend::SoftwareBackend`].
pub struct TextureCache<B: VideoBackend> {
    backend: B,
    entries: HashMap<u32, CacheEntry>,
    /// Shared decode target, allocated once at construction.
    scratch: Vec<u8>,
    config: CacheConfig,
    decoder: Box<dyn TextureDecoder>,
    replacements: Option<Box<dyn ReplacementProvider>>,
    frame_count: u32,
    deferred_invalidate: bool,
    textures_created: u64,
}

impl<B: VideoBackend> TextureCache<B> {
    pub fn new(backend: B, config: CacheConfig, decoder: Box<dyn TextureDecoder>) -> Self {
        Self {
            backend,
            entries: HashMap::new(),
            scratch: vec![0; SCRATCH_SIZE],
            config,
            decoder,
            replacements: None,
            frame_count: 0,
            deferred_invalidate: false,
            textures_created: 0,
        }
    }

    /// Attach a replacement asset provider (consulted when the
    /// `replacements` config flag is set).
    pub fn with_replacements(mut self, provider: Box<dyn ReplacementProvider>) -> Self {
        self.replacements = Some(provider);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Swap the configuration. Invalidate everything first: fingerprints
    /// computed under a different hash density are not comparable with
    /// the new ones.
    pub fn reload_config(&mut self, config: CacheConfig) {
        self.invalidate_all(false);
        self.config = config;
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn textures_created(&self) -> u64 {
        self.textures_created
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn advance_frame(&mut self) {
        self.frame_count += 1;
    }

    /// Resolve a texture for a draw.
    ///
    /// Returns `None` iff `address` is zero (caller-contract violation,
    /// absorbed rather than faulted). Everything else returns a bound
    /// entry: a hit reuses resident storage, a miss decodes from RAM or
    /// fetches a replacement asset.
    #[allow(clippy::too_many_arguments)]
    pub fn load(
        &mut self,
        mem: &SystemMemory,
        stage: u32,
        address: u32,
        width: u32,
        height: u32,
        format: SourceFormat,
        palette_addr: u32,
        palette_format: PaletteFormat,
        use_native_mips: bool,
        max_level: u32,
    ) -> Option<&CacheEntry> {
        if address == 0 {
            return None;
        }

        // The copy mode is sampled once per operation so the trust tier
        // and the provenance transition below cannot disagree.
        let copy_to_texture = self.config.copy_to_texture;

        let id = identity::resolve(
            mem,
            address,
            width,
            height,
            format,
            palette_addr,
            palette_format,
            self.config.hash_samples,
        );
        let native_width = width;
        let native_height = height;

        // Two-tier match test, then a storage-reuse test on mismatch.
        let mut reuse_storage = false;
        if let Some(entry) = self.entries.get(&id.key) {
            let hit = if entry.copy_state == CopyState::CopyReady && copy_to_texture {
                // Resident copies carry no RAM-comparable hash; they are
                // trusted by address until reinterpreted or invalidated.
                address == entry.address
            } else {
                address == entry.address
                    && id.content_hash.matches(entry.hash)
                    && id.full_format == entry.format
                    && entry.requested_max_level == max_level
                    && entry.native_width == native_width
                    && entry.native_height == native_height
            };

            if hit {
                let entry = self.entries.get_mut(&id.key)?;
                entry.last_used_frame = self.frame_count;
                entry.storage.bind(stage);
                return self.entries.get(&id.key);
            }

            // Storage can survive the re-decode when geometry, format,
            // and mip request are unchanged and provenance allows it.
            reuse_storage = (entry.copy_state == CopyState::NotACopy
                && entry.native_width == width
                && entry.native_height == height
                && entry.format == id.full_format
                && entry.requested_max_level == max_level)
                || (entry.is_copy()
                    && entry.native_width == width
                    && entry.native_height == height);
            if !reuse_storage {
                self.entries.remove(&id.key);
            }
        }

        // Replacement assets take priority over the decode path; their
        // dimensions override the expanded dimensions for storage.
        let mut width = width;
        let mut height = height;
        let mut expanded_width = id.expanded_width;
        let mut expanded_height = id.expanded_height;
        let mut decoded = DecodedFormat::None;
        if self.config.replacements {
            if let Some(provider) = &self.replacements {
                let name = replacement_name(&self.config.namespace, id.content_hash, format);
                let mut new_width = width;
                let mut new_height = height;
                if let Some(fmt) =
                    provider.fetch(&name, &mut new_width, &mut new_height, &mut self.scratch)
                {
                    decoded = fmt;
                    width = new_width;
                    height = new_height;
                    expanded_width = new_width;
                    expanded_height = new_height;
                }
            }
        }

        let palette_size = format.palette_size_bytes().unwrap_or(0);
        if decoded == DecodedFormat::None {
            decoded = self.decoder.decode(
                &mut self.scratch,
                mem.ram_slice(address, id.texture_size),
                expanded_width,
                expanded_height,
                format,
                mem.tmem_slice(palette_addr, palette_size),
                palette_format,
                true,
            );
        }

        let levels = mip::mip_chain_levels(
            width,
            height,
            native_width,
            native_height,
            use_native_mips,
            max_level,
        );

        if !reuse_storage {
            let storage =
                self.backend
                    .create_texture(width, height, expanded_width, levels, decoded);
            let mut entry = CacheEntry::new(id.key, storage);
            // The mip ceiling is recorded at creation only; storing fewer
            // levels than requested is not a reason to recreate.
            entry.requested_max_level = max_level;
            self.entries.insert(id.key, entry);
            self.textures_created += 1;
            tracing::debug!(
                "Created texture entry {:08x}: {}x{} format {:#x}, {} levels",
                id.key,
                width,
                height,
                id.full_format,
                levels
            );
        }

        let entry = self.entries.get_mut(&id.key)?;
        entry.set_general_parameters(address, id.texture_size, id.full_format);
        entry.set_dimensions(native_width, native_height, width, height);
        entry.hash = id.content_hash;
        entry.palette_hash = id.palette_hash;
        entry.copy_state = ram_load_transition(entry.copy_state, copy_to_texture);
        entry.mip_levels_stored = levels;

        entry.storage.upload_level(&self.scratch, width, height, expanded_width, 0);

        // Mip levels follow the base level back to back in source memory.
        if levels > 1 && decoded != DecodedFormat::None {
            let mut src_address = address as usize + id.texture_size;
            let mut mip_width = (width + 1) >> 1;
            let mut mip_height = (height + 1) >> 1;
            let mut level = 1;
            while (mip_width > 0 || mip_height > 0) && level < levels {
                let current_width = mip_width.max(1);
                let current_height = mip_height.max(1);
                let mip_expanded_w = expand_to_block(current_width, format.block_width());
                let mip_expanded_h = expand_to_block(current_height, format.block_height());
                let mip_size = texture_size_bytes(mip_expanded_w, mip_expanded_h, format);
                self.decoder.decode(
                    &mut self.scratch,
                    mem.ram_slice(src_address as u32, mip_size),
                    mip_expanded_w,
                    mip_expanded_h,
                    format,
                    mem.tmem_slice(palette_addr, palette_size),
                    palette_format,
                    true,
                );
                entry
                    .storage
                    .upload_level(&self.scratch, current_width, current_height, mip_expanded_w, level);

                src_address += mip::mip_level_source_bytes(mip_width, mip_height, format);
                mip_width >>= 1;
                mip_height >>= 1;
                level += 1;
            }
        }

        if self.config.dump_textures {
            if let Some(dir) = &self.config.dump_dir {
                let name = replacement_name(&self.config.namespace, id.content_hash, format);
                let path = dir.join(format!("{name}.tex"));
                if !path.exists() {
                    if let Err(err) = entry.storage.save(&path) {
                        tracing::warn!("Failed to dump texture {}: {err:#}", path.display());
                    }
                }
            }
        }

        entry.last_used_frame = self.frame_count;
        entry.storage.bind(stage);
        self.entries.get(&id.key)
    }

    /// Copy a framebuffer rectangle into a texture at `dst_addr`.
    ///
    /// Stalls the GPU pipeline: the backend's render state is reset for
    /// the duration of the copy and restored afterwards.
    pub fn copy(
        &mut self,
        dst_addr: u32,
        dst_format: u32,
        kind: CopySourceKind,
        src_rect: SourceRect,
        is_intensity: bool,
        scale_by_half: bool,
    ) {
        let transform = copy_transform(dst_format, kind, is_intensity);

        let tex_width = if scale_by_half {
            src_rect.width() / 2
        } else {
            src_rect.width()
        };
        let tex_height = if scale_by_half {
            src_rect.height() / 2
        } else {
            src_rect.height()
        };

        let mut scaled_width = tex_width;
        let mut scaled_height = tex_height;
        if self.config.scaled_copies {
            scaled_width = tex_width * self.config.copy_scale;
            scaled_height = tex_height * self.config.copy_scale;
        }

        // Reuse prior storage when the scaled dimensions still fit it;
        // otherwise recreate as a fresh render target.
        let mut recreate = true;
        if let Some(entry) = self.entries.get(&dst_addr) {
            if (entry.copy_state == CopyState::CopyReady
                && entry.stored_width == scaled_width
                && entry.stored_height == scaled_height)
                || (entry.copy_state == CopyState::CopyDynamic
                    && entry.native_width == tex_width
                    && entry.native_height == tex_height)
            {
                recreate = false;
            }
        }

        if recreate {
            self.entries.remove(&dst_addr);
            let storage = self.backend.create_render_target(scaled_width, scaled_height);
            let mut entry = CacheEntry::new(dst_addr, storage);
            entry.set_general_parameters(dst_addr, 0, dst_format);
            entry.set_dimensions(tex_width, tex_height, scaled_width, scaled_height);
            // Copies are trusted by address; the hash stays invalid so a
            // later RAM-validated load can never mistake stale content
            // for a match.
            entry.hash = TexHash::INVALID;
            entry.copy_state = CopyState::CopyReady;
            self.entries.insert(dst_addr, entry);
            self.textures_created += 1;
            tracing::debug!(
                "Created copy entry {:08x}: {}x{} dst format {:#x} variant {}",
                dst_addr,
                scaled_width,
                scaled_height,
                dst_format,
                transform.variant
            );
        }

        let Some(entry) = self.entries.get_mut(&dst_addr) else {
            return;
        };
        entry.last_used_frame = self.frame_count;

        self.backend.reset_api_state();
        entry
            .storage
            .from_framebuffer_copy(kind, src_rect, scale_by_half, &transform);
        self.backend.restore_api_state();
    }

    /// Destroy every entry overlapping `[start, start + size)`.
    pub fn invalidate_range(&mut self, start: u32, size: u32) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.overlaps_range(start, size));
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(
                "Invalidated {} entries in [{:08x}, {:08x})",
                removed,
                start,
                start.wrapping_add(size)
            );
        }
    }

    /// Force overlapping entries to re-validate on their next load
    /// instead of destroying them.
    pub fn make_range_dynamic(&mut self, start: u32, size: u32) {
        for entry in self.entries.values_mut() {
            if entry.overlaps_range(start, size) {
                entry.hash = TexHash::INVALID;
            }
        }
    }

    /// Evict entries unused for more than [`FRAME_KILL_THRESHOLD`] frames.
    pub fn cleanup(&mut self, current_frame: u32) {
        self.entries.retain(|_, entry| {
            current_frame.wrapping_sub(entry.last_used_frame) <= FRAME_KILL_THRESHOLD
        });
    }

    /// Destroy every entry. During shutdown, source addresses are zeroed
    /// first so no external reference is left pointing at freed source
    /// memory.
    pub fn invalidate_all(&mut self, shutdown: bool) {
        if shutdown {
            for entry in self.entries.values_mut() {
                entry.address = 0;
            }
        }
        self.entries.clear();
        self.deferred_invalidate = false;
    }

    /// Request a full invalidation at the next frame boundary.
    pub fn invalidate_defer(&mut self) {
        self.deferred_invalidate = true;
    }

    /// Perform a deferred invalidation if one was requested.
    pub fn flush_deferred(&mut self) {
        if self.deferred_invalidate {
            self.invalidate_all(false);
        }
    }

    /// Demote every copy-provenance entry to a plain texture; used on
    /// render-target reconfiguration.
    pub fn clear_copy_states(&mut self) {
        for entry in self.entries.values_mut() {
            entry.copy_state = CopyState::NotACopy;
        }
    }
}
