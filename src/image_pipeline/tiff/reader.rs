use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raster::RasterImage;

pub trait RasterReader {
    /// Decodes `data`; `name` identifies the source in errors and logs.
    fn read_raster(&self, data: &[u8], name: &str) -> Result<RasterImage>;
}
