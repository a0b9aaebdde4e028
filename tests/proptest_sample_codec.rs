use interlacer::image_pipeline::raster::{
    convert_pixel, read_sample, write_sample, PixelLayout,
};
use proptest::prelude::*;

fn max_value(bits: u16) -> u32 {
    ((1u64 << bits) - 1) as u32
}

fn depth_and_value() -> impl Strategy<Value = (u16, u32)> {
    (1u16..=32).prop_flat_map(|bits| (Just(bits), 0..=max_value(bits)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn sample_round_trips((bits, value) in depth_and_value(), index in 0usize..8) {
        let mut buffer = vec![0u8; 8 * 4];
        write_sample(&mut buffer, bits, index, value).unwrap();
        prop_assert_eq!(read_sample(&buffer, bits, index).unwrap(), value);
    }

    #[test]
    fn writing_one_sample_leaves_neighbours(
        (bits, value) in depth_and_value(),
        index in 1usize..7,
    ) {
        let mut buffer = vec![0u8; 8 * 4];
        write_sample(&mut buffer, bits, index, value).unwrap();
        prop_assert_eq!(read_sample(&buffer, bits, index - 1).unwrap(), 0);
        prop_assert_eq!(read_sample(&buffer, bits, index + 1).unwrap(), 0);
    }

    #[test]
    fn same_layout_conversion_is_identity(
        (bits, value) in depth_and_value(),
        channels in 1u16..=4,
    ) {
        let layout = PixelLayout::new(bits, channels).unwrap();
        let mut src = vec![0u8; layout.bytes_per_pixel()];
        for channel in 0..channels as usize {
            write_sample(&mut src, bits, channel, value / (channel as u32 + 1)).unwrap();
        }
        let mut dst = vec![0u8; layout.bytes_per_pixel()];
        convert_pixel(&src, layout, &mut dst, layout).unwrap();
        prop_assert_eq!(dst, src);
    }

    #[test]
    fn extremes_survive_rescaling(src_bits in 1u16..=32, dst_bits in 1u16..=32) {
        let src_layout = PixelLayout::new(src_bits, 2).unwrap();
        let dst_layout = PixelLayout::new(dst_bits, 2).unwrap();
        let mut src = vec![0u8; src_layout.bytes_per_pixel()];
        write_sample(&mut src, src_bits, 0, max_value(src_bits)).unwrap();
        write_sample(&mut src, src_bits, 1, 0).unwrap();

        let mut dst = vec![0u8; dst_layout.bytes_per_pixel()];
        convert_pixel(&src, src_layout, &mut dst, dst_layout).unwrap();

        prop_assert_eq!(read_sample(&dst, dst_bits, 0).unwrap(), max_value(dst_bits));
        prop_assert_eq!(read_sample(&dst, dst_bits, 1).unwrap(), 0);
    }

    #[test]
    fn rescaling_is_monotonic(
        (bits, a) in depth_and_value(),
        b_seed in any::<u32>(),
        dst_bits in 1u16..=32,
    ) {
        let b = if bits == 32 { b_seed } else { b_seed % (max_value(bits) + 1) };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let src_layout = PixelLayout::new(bits, 1).unwrap();
        let dst_layout = PixelLayout::new(dst_bits, 1).unwrap();
        let convert = |v: u32| {
            let mut src = vec![0u8; src_layout.bytes_per_pixel()];
            write_sample(&mut src, bits, 0, v).unwrap();
            let mut dst = vec![0u8; dst_layout.bytes_per_pixel()];
            convert_pixel(&src, src_layout, &mut dst, dst_layout).unwrap();
            read_sample(&dst, dst_bits, 0).unwrap()
        };
        prop_assert!(convert(lo) <= convert(hi));
    }

    #[test]
    fn padded_channel_is_full_scale(
        rgb in prop::array::uniform3(any::<u8>()),
        dst_bits in prop::sample::select(vec![8u16, 16, 32]),
    ) {
        let src_layout = PixelLayout::new(8, 3).unwrap();
        let dst_layout = PixelLayout::new(dst_bits, 4).unwrap();
        let mut dst = vec![0u8; dst_layout.bytes_per_pixel()];
        convert_pixel(&rgb, src_layout, &mut dst, dst_layout).unwrap();
        prop_assert_eq!(read_sample(&dst, dst_bits, 3).unwrap(), max_value(dst_bits));
    }
}
