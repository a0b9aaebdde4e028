//! Raster reader implementation using the tiff library.
//!
//! Decodes grayscale, RGB(A), CMYK and multiband TIFF images into a
//! [`RasterImage`] with one storage unit per sample. Palette images are
//! resolved through their color map into 8-bit RGBA so downstream stages never
//! see indices.

use std::io::Cursor;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::{ColorType, TiffError};
use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{InterlaceError, Result};
use crate::image_pipeline::raster::types::alloc_buffer;
use crate::image_pipeline::raster::{Photometric, PixelLayout, RasterImage};
use crate::image_pipeline::tiff::reader::RasterReader;

/// Layout reported for palette images after color map expansion.
const PALETTE_BITS: u16 = 8;
const PALETTE_SAMPLES: u16 = 4;

const PLANAR_CONTIG: u32 = 1;
const PHOTOMETRIC_PALETTE: u32 = 3;
const COMPRESSION_NONE: u32 = 1;

/// Raster reader backed by the `tiff` crate decoder.
pub struct TiffRasterReader;

impl TiffRasterReader {
    /// Reads and decodes the TIFF at `path`.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<RasterImage> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let data = std::fs::read(path).map_err(|e| InterlaceError::CannotOpenInput {
            file: name.clone(),
            reason: e.to_string(),
        })?;
        self.read_raster(&data, &name)
    }

    /// Reads only the image dimensions from TIFF bytes.
    pub fn dimensions(&self, data: &[u8], name: &str) -> Result<(u32, u32)> {
        Decoder::new(Cursor::new(data))
            .and_then(|mut decoder| decoder.dimensions())
            .map_err(|e| open_error(name, e))
    }
}

impl RasterReader for TiffRasterReader {
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    fn read_raster(&self, data: &[u8], name: &str) -> Result<RasterImage> {
        let mut decoder = Decoder::new(Cursor::new(data)).map_err(|e| open_error(name, e))?;
        let (width, height) = decoder.dimensions().map_err(|e| open_error(name, e))?;
        let photometric_tag = decoder.get_tag_u32(Tag::PhotometricInterpretation).ok();
        if photometric_tag == Some(PHOTOMETRIC_PALETTE) {
            return read_palette(&mut decoder, data, name, width as usize, height as usize);
        }

        let color = decoder.colortype().map_err(|e| open_error(name, e))?;
        let (bits, samples, photometric) = describe(color, photometric_tag.map(|v| v as u16))?;
        debug!(
            "loaded {}: {}x{} {}-bit {} channels ({:?})",
            name, width, height, bits, samples, color
        );

        let (width, height) = (width as usize, height as usize);
        let layout = PixelLayout::new(bits, samples)?;
        let samples_per_row = width * samples as usize;
        let units = read_units(&mut decoder, name, bits, samples_per_row, height)?;

        RasterImage::new(width, height, layout, photometric, units)
    }
}

/// Maps a decoder color type onto (bits, samples, photometric).
fn describe(color: ColorType, photometric_tag: Option<u16>) -> Result<(u16, u16, Photometric)> {
    let tagged = |default: Photometric| photometric_tag.map(Photometric::from_tag).unwrap_or(default);
    Ok(match color {
        ColorType::Gray(bits) => (bits as u16, 1, Photometric::Grayscale),
        ColorType::GrayA(bits) => (bits as u16, 2, Photometric::Grayscale),
        ColorType::RGB(bits) => (bits as u16, 3, Photometric::Rgb),
        ColorType::RGBA(bits) => (bits as u16, 4, Photometric::Rgb),
        ColorType::CMYK(bits) => (bits as u16, 4, tagged(Photometric::Other(5))),
        ColorType::CMYKA(bits) => (bits as u16, 5, tagged(Photometric::Other(5))),
        ColorType::YCbCr(bits) => (bits as u16, 3, tagged(Photometric::Other(6))),
        ColorType::Multiband {
            bit_depth,
            num_samples,
        } => (bit_depth as u16, num_samples as u16, tagged(Photometric::Other(1))),
        other => {
            return Err(InterlaceError::UnsupportedPixelFormat(format!(
                "color type {other:?}"
            )));
        }
    })
}

/// Decodes every strip into one contiguous buffer of native-endian units.
fn read_units(
    decoder: &mut Decoder<Cursor<&[u8]>>,
    name: &str,
    bits: u16,
    samples_per_row: usize,
    height: usize,
) -> Result<Vec<u8>> {
    let layout = PixelLayout::new(bits, 1)?;
    let expected = samples_per_row
        .checked_mul(height)
        .and_then(|n| n.checked_mul(layout.unit().bytes()))
        .ok_or(InterlaceError::OutOfMemory)?;
    let mut units = Vec::new();
    units
        .try_reserve_exact(expected)
        .map_err(|_| InterlaceError::OutOfMemory)?;

    if decoder.get_tag_u32(Tag::PlanarConfiguration).unwrap_or(PLANAR_CONTIG) != PLANAR_CONTIG {
        return Err(InterlaceError::UnsupportedPixelFormat(
            "planar (non-contiguous) sample layout".to_string(),
        ));
    }

    let tiled = decoder.find_tag(Tag::TileWidth).ok().flatten().is_some();
    if tiled {
        debug!("{} is tiled, decoding whole image", name);
        let image = decoder.read_image().map_err(|e| read_error(name, 0, e))?;
        append_units(&mut units, image, bits, samples_per_row)?;
    } else {
        let strips = decoder.strip_count().map_err(|e| read_error(name, 0, e))?;
        let mut row = 0usize;
        for strip in 0..strips {
            let chunk = decoder
                .read_chunk(strip)
                .map_err(|e| read_error(name, row, e))?;
            row += append_units(&mut units, chunk, bits, samples_per_row)?;
        }
    }

    if units.len() < expected {
        let row = units.len() / (samples_per_row * layout.unit().bytes()).max(1);
        return Err(InterlaceError::ScanlineReadFailed {
            file: name.to_string(),
            row: row as u32,
        });
    }
    units.truncate(expected);
    Ok(units)
}

/// Appends a decoded chunk and returns the number of rows it held.
fn append_units(
    out: &mut Vec<u8>,
    chunk: DecodingResult,
    bits: u16,
    samples_per_row: usize,
) -> Result<usize> {
    let samples = match chunk {
        DecodingResult::U8(values) if bits < 8 => {
            let unpacked = unpack_bits(&values, bits, samples_per_row);
            let count = unpacked.len();
            out.extend_from_slice(&unpacked);
            count
        }
        DecodingResult::U8(values) => {
            out.extend_from_slice(&values);
            values.len()
        }
        DecodingResult::U16(values) => {
            out.extend(values.iter().flat_map(|v| v.to_ne_bytes()));
            values.len()
        }
        DecodingResult::U32(values) => {
            out.extend(values.iter().flat_map(|v| v.to_ne_bytes()));
            values.len()
        }
        _ => {
            return Err(InterlaceError::UnsupportedPixelFormat(
                "only unsigned integer samples up to 32 bits are supported".to_string(),
            ));
        }
    };
    Ok(samples / samples_per_row.max(1))
}

/// Expands MSB-first packed rows so that every sample occupies one byte.
/// Each packed row starts on a byte boundary.
fn unpack_bits(packed: &[u8], bits: u16, samples_per_row: usize) -> Vec<u8> {
    let bits = bits as usize;
    let row_bytes = (samples_per_row * bits).div_ceil(8);
    if row_bytes == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(packed.len() / row_bytes * samples_per_row);

    for row in packed.chunks_exact(row_bytes) {
        for sample in 0..samples_per_row {
            let first = sample * bits;
            let value = (first..first + bits).fold(0u8, |acc, pos| {
                (acc << 1) | ((row[pos / 8] >> (7 - pos % 8)) & 1)
            });
            out.push(value);
        }
    }
    out
}

/// Reads a palette image. The decoder does not resolve color maps, so the
/// uncompressed index strips are sliced straight out of `data` and expanded
/// through the color map.
fn read_palette(
    decoder: &mut Decoder<Cursor<&[u8]>>,
    data: &[u8],
    name: &str,
    width: usize,
    height: usize,
) -> Result<RasterImage> {
    let bits = decoder.get_tag_u32(Tag::BitsPerSample).unwrap_or(1);
    let bits = u16::try_from(bits)
        .ok()
        .filter(|&b| matches!(b, 1..=8 | 16))
        .ok_or_else(|| InterlaceError::UnsupportedPixelFormat(format!("{bits}-bit palette indices")))?;
    if decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap_or(1) != 1 {
        return Err(InterlaceError::UnsupportedPixelFormat(
            "palette image with more than one sample per pixel".to_string(),
        ));
    }
    if decoder.get_tag_u32(Tag::Compression).unwrap_or(COMPRESSION_NONE) != COMPRESSION_NONE {
        return Err(InterlaceError::UnsupportedPixelFormat(
            "compressed palette image".to_string(),
        ));
    }
    if decoder.find_tag(Tag::TileWidth).ok().flatten().is_some() {
        return Err(InterlaceError::UnsupportedPixelFormat(
            "tiled palette image".to_string(),
        ));
    }

    let offsets = decoder
        .get_tag_u64_vec(Tag::StripOffsets)
        .map_err(|e| open_error(name, e))?;
    let byte_counts = decoder
        .get_tag_u64_vec(Tag::StripByteCounts)
        .map_err(|e| open_error(name, e))?;
    let colormap = decoder
        .get_tag_u16_vec(Tag::ColorMap)
        .map_err(|e| open_error(name, e))?;
    let rows_per_strip = decoder
        .get_tag_u32(Tag::RowsPerStrip)
        .map(|rows| rows as usize)
        .unwrap_or(height)
        .min(height)
        .max(1);
    debug!(
        "loaded {}: {}x{} {}-bit palette, {} rows per strip",
        name, width, height, bits, rows_per_strip
    );

    let layout = PixelLayout::new(bits, 1)?;
    let row_bytes = (width * bits as usize).div_ceil(8);
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(layout.unit().bytes()))
        .ok_or(InterlaceError::OutOfMemory)?;
    let mut indices = Vec::new();
    indices
        .try_reserve_exact(expected)
        .map_err(|_| InterlaceError::OutOfMemory)?;

    let big_endian = data.starts_with(b"MM");
    for (strip, row) in (0..height).step_by(rows_per_strip).enumerate() {
        let rows = rows_per_strip.min(height - row);
        let chunk = strip_bytes(data, &offsets, &byte_counts, strip, rows * row_bytes).ok_or_else(|| {
            InterlaceError::ScanlineReadFailed {
                file: name.to_string(),
                row: row as u32,
            }
        })?;
        for packed in chunk.chunks_exact(row_bytes.max(1)) {
            append_indices(&mut indices, packed, bits, width, big_endian);
        }
    }

    expand_palette(&indices, layout, &colormap, width, height)
}

/// The first `needed` bytes of strip `strip`, if the file holds them.
fn strip_bytes<'a>(
    data: &'a [u8],
    offsets: &[u64],
    byte_counts: &[u64],
    strip: usize,
    needed: usize,
) -> Option<&'a [u8]> {
    let start = usize::try_from(*offsets.get(strip)?).ok()?;
    let count = usize::try_from(*byte_counts.get(strip)?).ok()?;
    if count < needed {
        return None;
    }
    data.get(start..start.checked_add(needed)?)
}

/// Appends one packed row of indices as native-endian units.
fn append_indices(out: &mut Vec<u8>, packed: &[u8], bits: u16, width: usize, big_endian: bool) {
    match bits {
        16 => out.extend(
            packed
                .chunks_exact(2)
                .map(|c| {
                    if big_endian {
                        u16::from_be_bytes([c[0], c[1]])
                    } else {
                        u16::from_le_bytes([c[0], c[1]])
                    }
                })
                .flat_map(u16::to_ne_bytes),
        ),
        8 => out.extend_from_slice(packed),
        _ => out.extend(unpack_bits(packed, bits, width)),
    }
}

/// Resolves palette indices into 8-bit RGBA.
fn expand_palette(
    indices: &[u8],
    layout: PixelLayout,
    colormap: &[u16],
    width: usize,
    height: usize,
) -> Result<RasterImage> {
    let entries = colormap.len() / 3;
    let (reds, rest) = colormap.split_at(entries);
    let (greens, blues) = rest.split_at(entries);
    // Legacy writers store 8-bit values in the 16-bit color map
    let eight_bit = colormap.iter().all(|&v| v < 256);
    let to_u8 = |v: u16| {
        if eight_bit {
            v as u8
        } else {
            (v as u32 * 255 / 65535) as u8
        }
    };

    let out_layout = PixelLayout::new(PALETTE_BITS, PALETTE_SAMPLES)?;
    let len = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(out_layout.bytes_per_pixel()))
        .ok_or(InterlaceError::OutOfMemory)?;
    let mut rgba = alloc_buffer(len)?;
    for (pixel, dst) in rgba.chunks_exact_mut(4).enumerate() {
        let index = layout.unit().read(indices, pixel)? as usize;
        if index >= entries {
            return Err(InterlaceError::UnsupportedPixelFormat(format!(
                "palette index {index} outside {entries}-entry color map"
            )));
        }
        dst.copy_from_slice(&[to_u8(reds[index]), to_u8(greens[index]), to_u8(blues[index]), u8::MAX]);
    }

    debug!("Expanded {}-entry palette to RGBA", entries);
    RasterImage::new(width, height, out_layout, Photometric::Rgb, rgba)
}

fn open_error(name: &str, err: TiffError) -> InterlaceError {
    match err {
        TiffError::LimitsExceeded => InterlaceError::OutOfMemory,
        other => InterlaceError::CannotOpenInput {
            file: name.to_string(),
            reason: other.to_string(),
        },
    }
}

fn read_error(name: &str, row: usize, err: TiffError) -> InterlaceError {
    debug!("Decoding {} failed at row {}: {}", name, row, err);
    match err {
        TiffError::LimitsExceeded => InterlaceError::OutOfMemory,
        TiffError::UnsupportedError(e) => InterlaceError::UnsupportedPixelFormat(e.to_string()),
        _ => InterlaceError::ScanlineReadFailed {
            file: name.to_string(),
            row: row as u32,
        },
    }
}
