//! Texture cache configuration.
//!
//! Settings are stored in TOML format. Changing `hash_samples` at runtime
//! requires a full cache invalidation: fingerprints computed under
//! different sampling densities are not comparable, and mixing them in
//! one table is forbidden (`TextureCache::reload_config` enforces this).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Texture cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Content hash sample count; 0 hashes every byte (default: 0)
    #[serde(default)]
    pub hash_samples: u32,
    /// Keep framebuffer copies resident in fast storage and trust them
    /// by address (default: true)
    #[serde(default = "default_true")]
    pub copy_to_texture: bool,
    /// Scale framebuffer copies by the display resolution factor
    /// (default: false)
    #[serde(default)]
    pub scaled_copies: bool,
    /// Display resolution factor applied when `scaled_copies` is set
    /// (default: 1)
    #[serde(default = "default_copy_scale")]
    pub copy_scale: u32,
    /// Consult the replacement provider before decoding (default: false)
    #[serde(default)]
    pub replacements: bool,
    /// Dump newly created textures to `dump_dir` (default: false)
    #[serde(default)]
    pub dump_textures: bool,
    /// Directory for dumped textures
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,
    /// Per-title namespace used in replacement and dump names
    #[serde(default)]
    pub namespace: String,
}

fn default_true() -> bool {
    true
}

fn default_copy_scale() -> u32 {
    1
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            hash_samples: 0,
            copy_to_texture: default_true(),
            scaled_copies: false,
            copy_scale: default_copy_scale(),
            replacements: false,
            dump_textures: false,
            dump_dir: None,
            namespace: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl CacheConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
