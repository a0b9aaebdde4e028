//! Image processing pipeline module
//!
//! This module provides a structured approach to interlacing raster images,
//! with separate modules for the raster model, pixel selection, TIFF
//! reading/writing, and conversion orchestration.

pub mod raster;
pub mod interlace;
pub mod tiff;
pub mod conversions;
pub mod common;

pub use common::{
    InterlaceError,
    Result,
};

pub use raster::{
    OutputFormat,
    Photometric,
    PixelLayout,
    RasterImage,
    SampleUnit,
};

pub use interlace::{
    InterlaceCompositor,
    InterlaceMode,
    InterlaceSpec,
    Source,
};

pub use tiff::{
    RasterReader,
    RasterWriter,
    TiffRasterReader,
    StandardTiffWriter,
};

pub use conversions::{
    InterlaceConfig,
    InterlaceConfigBuilder,
    InterlacePipeline,
    InterlaceSummary,
    RgbaImage,
    interlace_files,
    tiff_info,
    tiff_to_rgba,
};
