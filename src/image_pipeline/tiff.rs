//! TIFF codec module
//!
//! This module provides TIFF decoding into rasters and uncompressed TIFF writing.

mod reader;
mod writer;
mod tiff_reader;
mod standard_tiff_writer;

pub use reader::RasterReader;
pub use writer::RasterWriter;
pub use tiff_reader::TiffRasterReader;
pub use standard_tiff_writer::StandardTiffWriter;
