//! Raster model module
//!
//! In-memory rasters, per-sample storage access and pixel format conversion.

pub mod convert;
pub mod sample;
pub mod types;

pub use convert::{convert_pixel, rescale};
pub use sample::{read_sample, write_sample, SampleUnit};
pub use types::{OutputFormat, Photometric, PixelLayout, RasterImage};
