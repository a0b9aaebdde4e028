//! Interlace compositing module
//!
//! Selection of the contributing image per output pixel and assembly of the
//! composite raster.

mod compositor;
pub mod types;

#[cfg(test)]
mod tests;

pub use compositor::{composite, InterlaceCompositor};
pub use types::{InterlaceMode, InterlaceSpec, Source};
