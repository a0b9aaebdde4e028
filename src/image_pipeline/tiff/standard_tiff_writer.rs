use std::borrow::Cow;
use std::io::{Cursor, Seek, Write};

use tiff::encoder::{DirectoryEncoder, Rational, TiffEncoder, TiffKindStandard, TiffValue};
use tiff::tags::{CompressionMethod, ResolutionUnit, Tag};
use tiff::TiffError;
use tracing::debug;

use crate::image_pipeline::common::error::{InterlaceError, Result};
use crate::image_pipeline::raster::{convert_pixel, Photometric, PixelLayout, RasterImage, SampleUnit};
use crate::image_pipeline::tiff::writer::RasterWriter;

const ORIENTATION_TOP_LEFT: u16 = 1;
const PLANAR_CONTIG: u16 = 1;
const SAMPLE_FORMAT_UINT: u16 = 1;
const EXTRA_SAMPLE_UNSPECIFIED: u16 = 0;
const EXTRA_SAMPLE_UNASSOCIATED_ALPHA: u16 = 2;
const YCBCR_SUBSAMPLING: Tag = Tag::Unknown(530);

const PHOTOMETRIC_BLACK_IS_ZERO: u16 = 1;
const PHOTOMETRIC_RGB: u16 = 2;
const PHOTOMETRIC_SEPARATED: u16 = 5;
const PHOTOMETRIC_YCBCR: u16 = 6;
const PHOTOMETRIC_CIELAB: u16 = 8;

/// Writes uncompressed, contiguous, top-left TIFFs with one row per strip.
///
/// The directory is assembled tag by tag so that any channel count can be
/// stored under the image's own photometric interpretation. Channels beyond
/// the photometric's color channels are declared as extra samples, the first
/// one as unassociated alpha.
pub struct StandardTiffWriter;

/// Photometric tag value and channel split of an encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ContainerLayout {
    photometric: u16,
    samples_per_pixel: u16,
    extra_samples: Vec<u16>,
}

impl ContainerLayout {
    fn for_image(image: &RasterImage) -> Result<Self> {
        let photometric = match image.photometric() {
            Photometric::Grayscale => PHOTOMETRIC_BLACK_IS_ZERO,
            Photometric::Rgb => PHOTOMETRIC_RGB,
            Photometric::Other(tag) => tag,
        };
        let samples_per_pixel = image.samples_per_pixel();
        let color_channels = color_channels(photometric).unwrap_or(samples_per_pixel);
        if samples_per_pixel < color_channels {
            return Err(InterlaceError::UnsupportedPixelFormat(format!(
                "photometric {photometric} needs {color_channels} channels, image has {samples_per_pixel}"
            )));
        }

        let extra_samples = (color_channels..samples_per_pixel)
            .map(|channel| {
                if channel == color_channels {
                    EXTRA_SAMPLE_UNASSOCIATED_ALPHA
                } else {
                    EXTRA_SAMPLE_UNSPECIFIED
                }
            })
            .collect();
        Ok(Self {
            photometric,
            samples_per_pixel,
            extra_samples,
        })
    }
}

/// Color channels implied by a photometric interpretation, if it is known.
fn color_channels(photometric: u16) -> Option<u16> {
    match photometric {
        0 | PHOTOMETRIC_BLACK_IS_ZERO => Some(1),
        PHOTOMETRIC_RGB | PHOTOMETRIC_YCBCR | PHOTOMETRIC_CIELAB => Some(3),
        PHOTOMETRIC_SEPARATED => Some(4),
        _ => None,
    }
}

impl RasterWriter for StandardTiffWriter {
    fn write_raster(&self, image: &RasterImage, output: &mut dyn Write) -> Result<()> {
        debug!(
            "Encoding TIFF image: {}x{} {}-bit {} channels",
            image.width(),
            image.height(),
            image.bits_per_sample(),
            image.samples_per_pixel()
        );

        let container = ContainerLayout::for_image(image)?;
        let image = widen_to_container_depth(image)?;

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer)).map_err(encode_error)?;
        let directory = encoder.image_directory().map_err(encode_error)?;
        encode_rows(directory, &image, &container)?;
        drop(encoder);

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}

/// Sample types the encoder accepts, rebuilt from native-endian units.
trait StripSample: Sized {
    fn collect_row(units: &[u8]) -> Vec<Self>;
}

impl StripSample for u8 {
    fn collect_row(units: &[u8]) -> Vec<Self> {
        units.to_vec()
    }
}

impl StripSample for u16 {
    fn collect_row(units: &[u8]) -> Vec<Self> {
        units
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect()
    }
}

impl StripSample for u32 {
    fn collect_row(units: &[u8]) -> Vec<Self> {
        units
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }
}

type Directory<'a, W> = DirectoryEncoder<'a, W, TiffKindStandard>;

fn encode_error(e: TiffError) -> InterlaceError {
    InterlaceError::Encode(e.to_string())
}

fn write_row<T, W>(directory: &mut Directory<'_, W>, units: &[u8]) -> std::result::Result<u64, TiffError>
where
    T: StripSample,
    [T]: TiffValue,
    W: Write + Seek,
{
    let samples = T::collect_row(units);
    directory.write_data(samples.as_slice())
}

fn encode_rows<W: Write + Seek>(
    mut directory: Directory<'_, W>,
    image: &RasterImage,
    container: &ContainerLayout,
) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(InterlaceError::InvalidDimensions(image.width(), image.height()));
    }
    let width = u32::try_from(image.width())
        .map_err(|_| InterlaceError::InvalidDimensions(image.width(), image.height()))?;
    let height = u32::try_from(image.height())
        .map_err(|_| InterlaceError::InvalidDimensions(image.width(), image.height()))?;
    let row_bytes = image.width() * image.layout().bytes_per_pixel();
    let row_bytes = u32::try_from(row_bytes)
        .map_err(|_| InterlaceError::Encode(format!("row of {row_bytes} bytes is too large")))?;

    let mut strip_offsets = Vec::with_capacity(image.height());
    for row in 0..image.height() {
        let units = &image.row(row)[..row_bytes as usize];
        let written = match image.layout().unit() {
            SampleUnit::U8 => write_row::<u8, W>(&mut directory, units),
            SampleUnit::U16 => write_row::<u16, W>(&mut directory, units),
            SampleUnit::U32 => write_row::<u32, W>(&mut directory, units),
        };
        let offset = written.map_err(|e| {
            debug!("Strip {} failed: {}", row, e);
            InterlaceError::ScanlineWriteFailed { row: row as u32 }
        })?;
        let offset = u32::try_from(offset)
            .map_err(|_| InterlaceError::Encode("output exceeds 4 GiB".to_string()))?;
        strip_offsets.push(offset);
    }
    let strip_byte_counts = vec![row_bytes; image.height()];

    let spp = container.samples_per_pixel;
    let bits = vec![image.bits_per_sample(); spp as usize];
    let sample_format = vec![SAMPLE_FORMAT_UINT; spp as usize];

    directory.write_tag(Tag::ImageWidth, width).map_err(encode_error)?;
    directory.write_tag(Tag::ImageLength, height).map_err(encode_error)?;
    directory.write_tag(Tag::BitsPerSample, bits.as_slice()).map_err(encode_error)?;
    directory
        .write_tag(Tag::Compression, CompressionMethod::None.to_u16())
        .map_err(encode_error)?;
    directory
        .write_tag(Tag::PhotometricInterpretation, container.photometric)
        .map_err(encode_error)?;
    directory
        .write_tag(Tag::StripOffsets, strip_offsets.as_slice())
        .map_err(encode_error)?;
    directory
        .write_tag(Tag::Orientation, ORIENTATION_TOP_LEFT)
        .map_err(encode_error)?;
    directory.write_tag(Tag::SamplesPerPixel, spp).map_err(encode_error)?;
    directory.write_tag(Tag::RowsPerStrip, 1u32).map_err(encode_error)?;
    directory
        .write_tag(Tag::StripByteCounts, strip_byte_counts.as_slice())
        .map_err(encode_error)?;
    directory
        .write_tag(Tag::XResolution, Rational { n: 1, d: 1 })
        .map_err(encode_error)?;
    directory
        .write_tag(Tag::YResolution, Rational { n: 1, d: 1 })
        .map_err(encode_error)?;
    directory
        .write_tag(Tag::PlanarConfiguration, PLANAR_CONTIG)
        .map_err(encode_error)?;
    directory
        .write_tag(Tag::ResolutionUnit, ResolutionUnit::None.to_u16())
        .map_err(encode_error)?;
    if container.photometric == PHOTOMETRIC_YCBCR {
        // Samples are stored one per pixel, never subsampled
        directory
            .write_tag(YCBCR_SUBSAMPLING, &[1u16, 1][..])
            .map_err(encode_error)?;
    }
    if !container.extra_samples.is_empty() {
        directory
            .write_tag(Tag::ExtraSamples, container.extra_samples.as_slice())
            .map_err(encode_error)?;
    }
    directory
        .write_tag(Tag::SampleFormat, sample_format.as_slice())
        .map_err(encode_error)?;

    directory.finish().map_err(encode_error)
}

/// Rescales samples whose depth is not a whole storage unit (e.g. 12-bit or
/// 1-bit) to the full unit depth, which is what the container stores.
fn widen_to_container_depth(image: &RasterImage) -> Result<Cow<'_, RasterImage>> {
    let unit_bits = image.layout().unit().bits();
    if image.bits_per_sample() == unit_bits {
        return Ok(Cow::Borrowed(image));
    }

    debug!(
        "Widening {}-bit samples to {}-bit for encoding",
        image.bits_per_sample(),
        unit_bits
    );
    let source = image.layout();
    let target = PixelLayout::new(unit_bits, image.samples_per_pixel())?;
    let mut widened =
        RasterImage::zeroed(image.width(), image.height(), target, image.photometric())?;
    let stride = widened.stride();
    if stride > 0 {
        for (row, line) in widened.data_mut().chunks_mut(stride).enumerate() {
            for (col, dst) in line.chunks_exact_mut(target.bytes_per_pixel()).enumerate() {
                convert_pixel(image.pixel(row, col), source, dst, target)?;
            }
        }
    }
    Ok(Cow::Owned(widened))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::raster::write_sample;
    use crate::image_pipeline::tiff::{RasterReader, TiffRasterReader};

    fn raster(width: usize, height: usize, bits: u16, spp: u16, photometric: Photometric, values: &[u32]) -> RasterImage {
        let layout = PixelLayout::new(bits, spp).unwrap();
        let mut data = vec![0u8; width * height * layout.bytes_per_pixel()];
        for (i, &v) in values.iter().enumerate() {
            write_sample(&mut data, bits, i, v).unwrap();
        }
        RasterImage::new(width, height, layout, photometric, data).unwrap()
    }

    fn round_trip(image: &RasterImage) -> RasterImage {
        let mut encoded = Vec::new();
        StandardTiffWriter.write_raster(image, &mut encoded).unwrap();
        TiffRasterReader.read_raster(&encoded, "round-trip.tif").unwrap()
    }

    #[test]
    fn test_gray8_round_trip() {
        let image = raster(3, 2, 8, 1, Photometric::Grayscale, &[0, 50, 100, 150, 200, 250]);

        let decoded = round_trip(&image);

        assert_eq!(decoded, image);
    }

    #[test]
    fn test_rgba16_round_trip() {
        let values: Vec<u32> = (0..16).map(|v| v * 4000).collect();
        let image = raster(2, 2, 16, 4, Photometric::Rgb, &values);

        let decoded = round_trip(&image);

        assert_eq!(decoded.samples_per_pixel(), 4);
        assert_eq!(decoded.bits_per_sample(), 16);
        assert_eq!(decoded.data(), image.data());
    }

    #[test]
    fn test_twelve_bit_is_widened_to_sixteen() {
        let image = raster(2, 1, 12, 1, Photometric::Grayscale, &[4095, 0]);

        let decoded = round_trip(&image);

        assert_eq!(decoded.bits_per_sample(), 16);
        assert_eq!(decoded.sample(0, 0, 0).unwrap(), 65535);
        assert_eq!(decoded.sample(0, 1, 0).unwrap(), 0);
    }

    #[test]
    fn test_gray_alpha_round_trip() {
        let image = raster(2, 2, 8, 2, Photometric::Grayscale, &[10, 255, 20, 0, 30, 128, 40, 64]);

        let decoded = round_trip(&image);

        assert_eq!(decoded, image);
    }

    #[test]
    fn test_alpha_is_declared_as_extra_sample() {
        let image = raster(1, 1, 16, 2, Photometric::Grayscale, &[1000, 65535]);
        let mut encoded = Vec::new();
        StandardTiffWriter.write_raster(&image, &mut encoded).unwrap();

        let mut decoder = tiff::decoder::Decoder::new(Cursor::new(&encoded)).unwrap();

        assert_eq!(decoder.get_tag_u32(Tag::PhotometricInterpretation).unwrap(), 1);
        assert_eq!(decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap(), 2);
        assert_eq!(decoder.get_tag_u16_vec(Tag::ExtraSamples).unwrap(), vec![2]);
        assert_eq!(decoder.get_tag_u32(Tag::RowsPerStrip).unwrap(), 1);
        assert_eq!(decoder.get_tag_u32(Tag::Orientation).unwrap(), 1);
    }

    #[test]
    fn test_grayscale_three_channels_keep_photometric() {
        let image = raster(1, 1, 8, 3, Photometric::Grayscale, &[7, 8, 9]);

        let decoded = round_trip(&image);

        assert_eq!(decoded.photometric(), Photometric::Grayscale);
        assert_eq!(decoded.samples_per_pixel(), 3);
        assert_eq!(decoded.data(), &[7, 8, 9]);
    }

    #[test]
    fn test_ycbcr_round_trip() {
        let image = raster(2, 1, 8, 3, Photometric::Other(6), &[16, 128, 128, 235, 90, 240]);
        let mut encoded = Vec::new();
        StandardTiffWriter.write_raster(&image, &mut encoded).unwrap();

        let mut decoder = tiff::decoder::Decoder::new(Cursor::new(&encoded)).unwrap();
        assert_eq!(decoder.get_tag_u32(Tag::PhotometricInterpretation).unwrap(), 6);
        assert_eq!(decoder.get_tag_u16_vec(YCBCR_SUBSAMPLING).unwrap(), vec![1, 1]);

        let decoded = TiffRasterReader.read_raster(&encoded, "ycbcr.tif").unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_cmyk_round_trip() {
        let image = raster(1, 2, 8, 4, Photometric::Other(5), &[1, 2, 3, 4, 5, 6, 7, 8]);

        let decoded = round_trip(&image);

        assert_eq!(decoded, image);
    }

    #[test]
    fn test_too_few_channels_for_photometric() {
        let image = raster(1, 1, 8, 1, Photometric::Rgb, &[1]);

        let result = StandardTiffWriter.write_raster(&image, &mut Vec::new());

        assert!(matches!(result, Err(InterlaceError::UnsupportedPixelFormat(_))));
    }

    #[test]
    fn test_bilevel_is_widened_to_eight_bits() {
        let image = raster(3, 1, 1, 1, Photometric::Grayscale, &[1, 0, 1]);

        let decoded = round_trip(&image);

        assert_eq!(decoded.bits_per_sample(), 8);
        assert_eq!(decoded.data(), &[255, 0, 255]);
    }

    #[test]
    fn test_output_io_failure() {
        struct FailingOutput;
        impl Write for FailingOutput {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let image = raster(1, 1, 8, 1, Photometric::Grayscale, &[1]);
        let result = StandardTiffWriter.write_raster(&image, &mut FailingOutput);

        assert!(matches!(result, Err(InterlaceError::Io(_))));
    }
}
