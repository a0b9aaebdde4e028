//! Pipeline conversions module
//!
//! This module contains orchestration logic for interlacing TIFF files, plus
//! the one-call entry points used by embedding front ends.

mod embed;
mod interlace_tiff;
pub mod types;


pub use embed::{interlace_files, tiff_info, tiff_to_rgba};
pub use interlace_tiff::InterlacePipeline;
pub use types::{InterlaceConfig, InterlaceConfigBuilder, InterlaceSummary, RgbaImage};
