//! One-call entry points for embedding the interlacer in other front ends.

use std::path::Path;

use tracing::debug;

use crate::image_pipeline::common::error::{InterlaceError, Result};
use crate::image_pipeline::conversions::interlace_tiff::InterlacePipeline;
use crate::image_pipeline::conversions::types::{InterlaceConfig, InterlaceSummary, RgbaImage};
use crate::image_pipeline::raster::types::alloc_buffer;
use crate::image_pipeline::raster::{convert_pixel, Photometric, PixelLayout, RasterImage};
use crate::image_pipeline::tiff::TiffRasterReader;

/// Interlaces `first` and `second` into `output`. A zero interval disables
/// that axis; both zero copies `first`.
pub fn interlace_files<P, Q, O>(
    first: P,
    second: Q,
    output: O,
    row_interval: u32,
    col_interval: u32,
) -> Result<InterlaceSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    O: AsRef<Path>,
{
    let config = InterlaceConfig::builder()
        .row_interval(row_interval)
        .col_interval(col_interval)
        .build();
    InterlacePipeline::new(config).interlace_files(first, second, output)
}

/// Width and height of the TIFF at `path`.
pub fn tiff_info<P: AsRef<Path>>(path: P) -> Result<(u32, u32)> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let data = std::fs::read(path).map_err(|e| InterlaceError::CannotOpenInput {
        file: name.clone(),
        reason: e.to_string(),
    })?;
    TiffRasterReader.dimensions(&data, &name)
}

/// Decodes the TIFF at `path` into 8-bit RGBA for previewing.
pub fn tiff_to_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    let image = TiffRasterReader.load(path)?;
    to_rgba(&image)
}

fn to_rgba(image: &RasterImage) -> Result<RgbaImage> {
    let source = image.layout();
    let gray = match (image.photometric(), source.samples_per_pixel()) {
        (Photometric::Grayscale, 1 | 2) => true,
        (Photometric::Rgb, 3 | 4) => false,
        (photometric, samples) => {
            return Err(InterlaceError::UnsupportedPixelFormat(format!(
                "cannot preview {photometric:?} with {samples} channels as RGBA"
            )));
        }
    };

    let rgba_layout = PixelLayout::new(8, 4)?;
    let mut data = alloc_buffer(image.width() * image.height() * rgba_layout.bytes_per_pixel())?;
    let width = image.width();
    for (pixel, dst) in data.chunks_exact_mut(4).enumerate() {
        let src = image.pixel(pixel / width, pixel % width);
        if gray {
            // Replicate luminance into RGB, carrying alpha when present
            let mut luma_alpha = [0u8; 2];
            convert_pixel(src, source, &mut luma_alpha, PixelLayout::new(8, 2)?)?;
            dst.copy_from_slice(&[luma_alpha[0], luma_alpha[0], luma_alpha[0], luma_alpha[1]]);
        } else {
            convert_pixel(src, source, dst, rgba_layout)?;
        }
    }

    debug!("Converted {}x{} image to RGBA", image.width(), image.height());
    Ok(RgbaImage {
        width: image.width() as u32,
        height: image.height() as u32,
        data,
    })
}
