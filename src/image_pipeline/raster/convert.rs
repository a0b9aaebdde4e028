use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raster::types::PixelLayout;

/// Rescales `value` from `src_max` full scale to `dst_max`, rounding to nearest.
#[inline]
pub fn rescale(value: u32, src_max: u32, dst_max: u32) -> u32 {
    let src_max = src_max as u64;
    ((value as u64 * dst_max as u64 + src_max / 2) / src_max) as u32
}

/// Converts one pixel between layouts.
///
/// Channels present in both layouts are rescaled to the destination depth.
/// Channels the source lacks are filled with the destination's maximum value,
/// so an alpha channel added to an opaque source stays opaque.
pub fn convert_pixel(
    src: &[u8],
    src_layout: PixelLayout,
    dst: &mut [u8],
    dst_layout: PixelLayout,
) -> Result<()> {
    let src_unit = src_layout.unit();
    let dst_unit = dst_layout.unit();
    let src_max = src_layout.max_value();
    let dst_max = dst_layout.max_value();
    let same_depth = src_layout.bits_per_sample() == dst_layout.bits_per_sample();
    let src_channels = src_layout.samples_per_pixel() as usize;

    for channel in 0..dst_layout.samples_per_pixel() as usize {
        let value = if channel < src_channels {
            let value = src_unit.read(src, channel)?;
            if same_depth {
                value
            } else {
                rescale(value, src_max, dst_max)
            }
        } else {
            dst_max
        };
        dst_unit.write(dst, channel, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::raster::sample::{read_sample, write_sample};

    fn layout(bits: u16, channels: u16) -> PixelLayout {
        PixelLayout::new(bits, channels).unwrap()
    }

    fn pixel(bits: u16, values: &[u32]) -> Vec<u8> {
        let unit = layout(bits, 1).unit();
        let mut buf = vec![0u8; values.len() * unit.bytes()];
        for (i, &v) in values.iter().enumerate() {
            write_sample(&mut buf, bits, i, v).unwrap();
        }
        buf
    }

    fn samples(bits: u16, buf: &[u8], count: usize) -> Vec<u32> {
        (0..count).map(|i| read_sample(buf, bits, i).unwrap()).collect()
    }

    #[test]
    fn same_layout_is_identity() {
        let src = pixel(16, &[0, 1234, 65535]);
        let mut dst = vec![0u8; 6];
        convert_pixel(&src, layout(16, 3), &mut dst, layout(16, 3)).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn widening_8_to_16_bits() {
        let src = pixel(8, &[0, 1, 128, 255]);
        let mut dst = vec![0u8; 8];
        convert_pixel(&src, layout(8, 4), &mut dst, layout(16, 4)).unwrap();
        assert_eq!(samples(16, &dst, 4), vec![0, 257, 32896, 65535]);
    }

    #[test]
    fn narrowing_rounds_to_nearest() {
        // 127 * 255 / 65535 rounds down to 0, 129 rounds up to 1
        assert_eq!(rescale(127, 65535, 255), 0);
        assert_eq!(rescale(129, 65535, 255), 1);
        assert_eq!(rescale(32767, 65535, 255), 127);
        assert_eq!(rescale(32768, 65535, 255), 128);
    }

    #[test]
    fn max_maps_to_max_and_zero_to_zero() {
        for src_bits in [1u16, 4, 8, 12, 16, 24, 32] {
            for dst_bits in [1u16, 5, 8, 10, 16, 31, 32] {
                let src_layout = layout(src_bits, 1);
                let dst_layout = layout(dst_bits, 1);
                assert_eq!(
                    rescale(src_layout.max_value(), src_layout.max_value(), dst_layout.max_value()),
                    dst_layout.max_value(),
                    "{src_bits} -> {dst_bits}"
                );
                assert_eq!(rescale(0, src_layout.max_value(), dst_layout.max_value()), 0);
            }
        }
    }

    #[test]
    fn missing_channels_are_filled_with_max() {
        let src = pixel(8, &[10, 20, 30]);
        let mut dst = vec![0u8; 4];
        convert_pixel(&src, layout(8, 3), &mut dst, layout(8, 4)).unwrap();
        assert_eq!(dst, vec![10, 20, 30, 255]);

        let mut dst16 = vec![0u8; 8];
        convert_pixel(&src, layout(8, 3), &mut dst16, layout(16, 4)).unwrap();
        assert_eq!(samples(16, &dst16, 4)[3], 65535);
    }

    #[test]
    fn extra_source_channels_are_dropped() {
        let src = pixel(8, &[1, 2, 3, 4]);
        let mut dst = vec![0u8; 3];
        convert_pixel(&src, layout(8, 4), &mut dst, layout(8, 3)).unwrap();
        assert_eq!(dst, vec![1, 2, 3]);
    }

    #[test]
    fn short_destination_is_an_error() {
        let src = pixel(8, &[1, 2, 3]);
        let mut dst = vec![0u8; 2];
        assert!(convert_pixel(&src, layout(8, 3), &mut dst, layout(8, 3)).is_err());
    }
}
