use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::interlace::types::{InterlaceSpec, Source};
use crate::image_pipeline::raster::{convert_pixel, OutputFormat, PixelLayout, RasterImage};

/// Builds one raster from two by taking every output pixel wholesale from
/// whichever input the [`InterlaceSpec`] selects, converted to the common format.
pub struct InterlaceCompositor {
    spec: InterlaceSpec,
    parallel: bool,
}

impl InterlaceCompositor {
    pub fn new(spec: InterlaceSpec) -> Self {
        Self {
            spec,
            parallel: false,
        }
    }

    /// Process output rows on the rayon thread pool. The result is identical
    /// to the sequential path.
    pub fn parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    #[instrument(skip_all, fields(mode = %self.spec.mode(), parallel = self.parallel))]
    pub fn composite(&self, a: &RasterImage, b: &RasterImage) -> Result<RasterImage> {
        let format = OutputFormat::derive(a, b)?;

        if a.layout() != b.layout() {
            warn!(
                "different formats, converting to {}-bit {} channels",
                format.layout.bits_per_sample(),
                format.layout.samples_per_pixel()
            );
        }
        if a.width() != b.width() || a.height() != b.height() {
            warn!(
                "different dimensions, using minimum ({}x{})",
                format.width, format.height
            );
        }
        info!("mode: {}", self.spec.mode());

        let mut output =
            RasterImage::zeroed(format.width, format.height, format.layout, format.photometric)?;
        let stride = output.stride();
        if stride == 0 || format.height == 0 {
            debug!("Empty output extent, nothing to composite");
            return Ok(output);
        }

        let layout = format.layout;
        if self.parallel {
            output
                .data_mut()
                .par_chunks_mut(stride)
                .enumerate()
                .try_for_each(|(row, line)| self.fill_row(a, b, layout, row, line))?;
        } else {
            output
                .data_mut()
                .chunks_mut(stride)
                .enumerate()
                .try_for_each(|(row, line)| self.fill_row(a, b, layout, row, line))?;
        }

        debug!(
            width = format.width,
            height = format.height,
            bits = layout.bits_per_sample(),
            channels = layout.samples_per_pixel(),
            "Composite complete"
        );
        Ok(output)
    }

    fn fill_row(
        &self,
        a: &RasterImage,
        b: &RasterImage,
        layout: PixelLayout,
        row: usize,
        line: &mut [u8],
    ) -> Result<()> {
        for (col, dst) in line.chunks_exact_mut(layout.bytes_per_pixel()).enumerate() {
            let src = match self.spec.select(row, col) {
                Source::A => a,
                Source::B => b,
            };
            convert_pixel(src.pixel(row, col), src.layout(), dst, layout)?;
        }
        Ok(())
    }
}

/// Composites `a` and `b` sequentially with the given pattern.
pub fn composite(a: &RasterImage, b: &RasterImage, spec: &InterlaceSpec) -> Result<RasterImage> {
    InterlaceCompositor::new(*spec).composite(a, b)
}
