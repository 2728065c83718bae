//! Format metadata modules.
//!
//! - [`texture`]: source texture formats, palette formats, block geometry
//! - [`copy`]: framebuffer-copy destination format codes

pub mod copy;
pub mod texture;
