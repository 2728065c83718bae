//! Cache entry state and the copy provenance state machine.
//!
//! An entry is the unit of cached state: geometry, composite format,
//! fingerprints, provenance, and the backend storage it exclusively owns.
//! Entries never outlive their removal from the table.

use crate::backend::TextureStorage;
use crate::hash::TexHash;

/// Provenance of an entry's pixel content.
///
/// A framebuffer copy is trusted (`CopyReady`) until its source range is
/// observed to diverge from the cached content; after that it re-validates
/// like an ordinary texture on every load (`CopyDynamic`). There is no
/// terminal state; entries cycle until destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyState {
    /// Ordinary RAM-sourced texture.
    NotACopy,
    /// Framebuffer copy resident in fast storage, source range untouched.
    CopyReady,
    /// Framebuffer copy whose source range diverged at least once.
    CopyDynamic,
}

/// Provenance transition applied when an entry is (re)loaded from RAM.
///
/// With the copy-to-texture mode active, copies carry no RAM-comparable
/// content, so a RAM load reclassifies the entry as a plain texture. With
/// the mode off, a RAM load over a copy means the copy has diverged and
/// becomes dynamic.
pub fn ram_load_transition(state: CopyState, copy_to_texture: bool) -> CopyState {
    if copy_to_texture {
        CopyState::NotACopy
    } else if state != CopyState::NotACopy {
        CopyState::CopyDynamic
    } else {
        state
    }
}

/// One cached texture.
pub struct CacheEntry {
    /// Table key. Not always the source address: palette-indexed sources
    /// fold the palette hash in and may occupy several keys at once.
    pub key: u32,
    /// Source-memory address, or the copy destination address for
    /// framebuffer-copy entries.
    pub address: u32,
    /// Source bytes covered by the content hash. Zero for copy entries.
    pub size_in_bytes: usize,
    /// Composite format: base format code, palette format in the high
    /// bits for palette-indexed sources.
    pub format: u32,
    pub hash: TexHash,
    pub palette_hash: TexHash,
    /// Dimensions as requested by the caller.
    pub native_width: u32,
    pub native_height: u32,
    /// Dimensions actually backing the storage (block padding or copy
    /// rescaling may differ from native).
    pub stored_width: u32,
    pub stored_height: u32,
    /// Resident mip levels, always >= 1.
    pub mip_levels_stored: u32,
    /// Caller's requested mip ceiling; decoupled from levels stored.
    pub requested_max_level: u32,
    pub copy_state: CopyState,
    /// Frame of the last successful bind.
    pub last_used_frame: u32,
    /// Backend pixel storage, destroyed with the entry.
    pub storage: Box<dyn TextureStorage>,
}

impl CacheEntry {
    pub fn new(key: u32, storage: Box<dyn TextureStorage>) -> Self {
        Self {
            key,
            address: 0,
            size_in_bytes: 0,
            format: 0,
            hash: TexHash::INVALID,
            palette_hash: TexHash::INVALID,
            native_width: 0,
            native_height: 0,
            stored_width: 0,
            stored_height: 0,
            mip_levels_stored: 1,
            requested_max_level: 0,
            copy_state: CopyState::NotACopy,
            last_used_frame: 0,
            storage,
        }
    }

    pub fn is_copy(&self) -> bool {
        self.copy_state != CopyState::NotACopy
    }

    pub fn set_general_parameters(&mut self, address: u32, size_in_bytes: usize, format: u32) {
        self.address = address;
        self.size_in_bytes = size_in_bytes;
        self.format = format;
    }

    pub fn set_dimensions(
        &mut self,
        native_width: u32,
        native_height: u32,
        stored_width: u32,
        stored_height: u32,
    ) {
        self.native_width = native_width;
        self.native_height = native_height;
        self.stored_width = stored_width;
        self.stored_height = stored_height;
    }

    /// Half-open overlap test against `[start, start + size)`.
    ///
    /// Adjacent ranges do not overlap. Copy entries record a zero source
    /// size but still occupy their destination address, so the entry
    /// range covers at least one byte.
    pub fn overlaps_range(&self, start: u32, size: u32) -> bool {
        let entry_start = self.address as u64;
        let entry_end = entry_start + (self.size_in_bytes as u64).max(1);
        let range_start = start as u64;
        let range_end = range_start + size as u64;
        entry_start < range_end && range_start < entry_end
    }
}
