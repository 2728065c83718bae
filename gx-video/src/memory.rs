//! Emulated system memory visible to the texture unit.
//!
//! Textures are read from main RAM; palettes live in a dedicated 64 KiB
//! texture memory (TMEM). Both are owned here as explicit state and passed
//! by reference into cache operations, so there are no ambient globals and
//! a memory-write hook can invalidate the cache it was constructed with.

/// Main RAM plus palette TMEM.
pub struct SystemMemory {
    ram: Vec<u8>,
    tmem: Vec<u8>,
}

impl SystemMemory {
    pub const TMEM_SIZE: usize = 64 * 1024;

    pub fn new(ram_size: usize) -> Self {
        Self {
            ram: vec![0; ram_size],
            tmem: vec![0; Self::TMEM_SIZE],
        }
    }

    pub fn ram_len(&self) -> usize {
        self.ram.len()
    }

    /// Borrow `len` bytes of RAM starting at `address`, clamped to the end
    /// of RAM. Out-of-range addresses yield an empty slice.
    pub fn ram_slice(&self, address: u32, len: usize) -> &[u8] {
        let start = (address as usize).min(self.ram.len());
        let end = start.saturating_add(len).min(self.ram.len());
        &self.ram[start..end]
    }

    /// Borrow `len` bytes of TMEM starting at `offset`, clamped.
    pub fn tmem_slice(&self, offset: u32, len: usize) -> &[u8] {
        let start = (offset as usize).min(self.tmem.len());
        let end = start.saturating_add(len).min(self.tmem.len());
        &self.tmem[start..end]
    }

    /// Write bytes into RAM, clamped to the end of RAM.
    pub fn write_ram(&mut self, address: u32, bytes: &[u8]) {
        let start = (address as usize).min(self.ram.len());
        let end = start.saturating_add(bytes.len()).min(self.ram.len());
        self.ram[start..end].copy_from_slice(&bytes[..end - start]);
    }

    /// Write bytes into TMEM, clamped.
    pub fn write_tmem(&mut self, offset: u32, bytes: &[u8]) {
        let start = (offset as usize).min(self.tmem.len());
        let end = start.saturating_add(bytes.len()).min(self.tmem.len());
        self.tmem[start..end].copy_from_slice(&bytes[..end - start]);
    }
}
