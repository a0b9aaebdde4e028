//! In-memory raster types

use crate::image_pipeline::common::error::{InterlaceError, Result};
use crate::image_pipeline::raster::sample::SampleUnit;

/// Color interpretation of a raster's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Photometric {
    Grayscale,
    Rgb,
    /// Any other interpretation, carrying the raw `PhotometricInterpretation` tag value
    Other(u16),
}

impl Photometric {
    pub fn from_tag(value: u16) -> Self {
        match value {
            0 | 1 => Photometric::Grayscale,
            2 => Photometric::Rgb,
            other => Photometric::Other(other),
        }
    }
}

/// Depth and channel count of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    bits_per_sample: u16,
    samples_per_pixel: u16,
    unit: SampleUnit,
}

impl PixelLayout {
    pub fn new(bits_per_sample: u16, samples_per_pixel: u16) -> Result<Self> {
        let unit = SampleUnit::for_bits(bits_per_sample)?;
        if samples_per_pixel == 0 {
            return Err(InterlaceError::UnsupportedPixelFormat(
                "0 samples per pixel".to_string(),
            ));
        }
        Ok(Self {
            bits_per_sample,
            samples_per_pixel,
            unit,
        })
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    pub fn samples_per_pixel(&self) -> u16 {
        self.samples_per_pixel
    }

    pub fn unit(&self) -> SampleUnit {
        self.unit
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.samples_per_pixel as usize * self.unit.bytes()
    }

    /// Largest sample value, `2^bits - 1`.
    pub fn max_value(&self) -> u32 {
        ((1u64 << self.bits_per_sample) - 1) as u32
    }
}

/// Decoded raster with one storage unit per sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    layout: PixelLayout,
    photometric: Photometric,
    stride: usize,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wraps `data` using the tightly packed stride `width * bytes_per_pixel`.
    pub fn new(
        width: usize,
        height: usize,
        layout: PixelLayout,
        photometric: Photometric,
        data: Vec<u8>,
    ) -> Result<Self> {
        let stride = packed_stride(width, &layout)?;
        Self::with_stride(width, height, layout, photometric, stride, data)
    }

    /// Wraps `data` using a stride reported by the codec, which may include padding.
    pub fn with_stride(
        width: usize,
        height: usize,
        layout: PixelLayout,
        photometric: Photometric,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let min_stride = packed_stride(width, &layout)?;
        if stride < min_stride {
            return Err(InterlaceError::InvalidBuffer {
                needed: min_stride,
                actual: stride,
            });
        }
        let needed = stride.checked_mul(height).ok_or(InterlaceError::OutOfMemory)?;
        if data.len() < needed {
            return Err(InterlaceError::InvalidBuffer {
                needed,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            photometric,
            stride,
            data,
        })
    }

    /// Allocates a zero-filled raster, reporting allocation failure as `OutOfMemory`.
    pub fn zeroed(
        width: usize,
        height: usize,
        layout: PixelLayout,
        photometric: Photometric,
    ) -> Result<Self> {
        let stride = packed_stride(width, &layout)?;
        let len = stride.checked_mul(height).ok_or(InterlaceError::OutOfMemory)?;
        let data = alloc_buffer(len)?;
        Self::with_stride(width, height, layout, photometric, stride, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.layout.bits_per_sample()
    }

    pub fn samples_per_pixel(&self) -> u16 {
        self.layout.samples_per_pixel()
    }

    pub fn photometric(&self) -> Photometric {
        self.photometric
    }

    /// Byte length of one scanline.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.layout.bytes_per_pixel()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Scanline `row` without stride padding.
    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.stride;
        &self.data[start..start + self.width * self.bytes_per_pixel()]
    }

    /// Raw sample units of the pixel at (`row`, `col`).
    pub fn pixel(&self, row: usize, col: usize) -> &[u8] {
        let bpp = self.bytes_per_pixel();
        let start = row * self.stride + col * bpp;
        &self.data[start..start + bpp]
    }

    pub fn sample(&self, row: usize, col: usize, channel: usize) -> Result<u32> {
        self.layout.unit().read(self.pixel(row, col), channel)
    }
}

/// Format of a composite of two rasters: the deeper depth, the wider channel
/// count, the shared extent and the first raster's photometric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub photometric: Photometric,
}

impl OutputFormat {
    pub fn derive(a: &RasterImage, b: &RasterImage) -> Result<Self> {
        let layout = PixelLayout::new(
            a.bits_per_sample().max(b.bits_per_sample()),
            a.samples_per_pixel().max(b.samples_per_pixel()),
        )?;
        Ok(Self {
            width: a.width().min(b.width()),
            height: a.height().min(b.height()),
            layout,
            photometric: a.photometric(),
        })
    }
}

fn packed_stride(width: usize, layout: &PixelLayout) -> Result<usize> {
    width
        .checked_mul(layout.bytes_per_pixel())
        .ok_or(InterlaceError::OutOfMemory)
}

/// Zero-filled byte buffer, allocated fallibly.
pub(crate) fn alloc_buffer(len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| InterlaceError::OutOfMemory)?;
    data.resize(len, 0);
    Ok(data)
}
