#[cfg(test)]
mod tests {
    use crate::image_pipeline::interlace::compositor::{composite, InterlaceCompositor};
    use crate::image_pipeline::interlace::types::InterlaceSpec;
    use crate::image_pipeline::raster::{write_sample, Photometric, PixelLayout, RasterImage};

    fn filled(
        width: usize,
        height: usize,
        bits: u16,
        samples: &[u32],
        photometric: Photometric,
    ) -> RasterImage {
        let layout = PixelLayout::new(bits, samples.len() as u16).unwrap();
        let mut data = vec![0u8; width * height * layout.bytes_per_pixel()];
        for pixel in 0..width * height {
            for (channel, &value) in samples.iter().enumerate() {
                write_sample(&mut data, bits, pixel * samples.len() + channel, value).unwrap();
            }
        }
        RasterImage::new(width, height, layout, photometric, data).unwrap()
    }

    fn gradient(width: usize, height: usize) -> RasterImage {
        let layout = PixelLayout::new(8, 1).unwrap();
        let data = (0..width * height).map(|i| (i * 7 % 256) as u8).collect();
        RasterImage::new(width, height, layout, Photometric::Grayscale, data).unwrap()
    }

    #[test]
    fn test_row_stripes_alternate_sources() {
        let a = filled(10, 10, 8, &[200], Photometric::Grayscale);
        let b = filled(10, 10, 8, &[50], Photometric::Grayscale);

        let out = composite(&a, &b, &InterlaceSpec::new(1, 0)).unwrap();

        assert_eq!((out.width(), out.height()), (10, 10));
        for row in 0..10 {
            let expected = if row % 2 == 0 { 200 } else { 50 };
            assert!(out.row(row).iter().all(|&v| v == expected), "row {row}");
        }
    }

    #[test]
    fn test_rgb_and_rgba_pad_alpha() {
        let a = filled(4, 4, 8, &[1, 2, 3], Photometric::Rgb);
        let b = filled(4, 4, 8, &[0, 0, 0, 10], Photometric::Rgb);

        let out = composite(&a, &b, &InterlaceSpec::new(1, 0)).unwrap();

        assert_eq!(out.samples_per_pixel(), 4);
        assert_eq!(out.bits_per_sample(), 8);
        for row in 0..4 {
            for col in 0..4 {
                let expected: &[u8] = if row % 2 == 0 { &[1, 2, 3, 255] } else { &[0, 0, 0, 10] };
                assert_eq!(out.pixel(row, col), expected, "({row}, {col})");
            }
        }
    }

    #[test]
    fn test_zero_intervals_copy_first_image() {
        let a = gradient(6, 5);
        let b = filled(6, 5, 16, &[65535], Photometric::Grayscale);

        let out = composite(&a, &b, &InterlaceSpec::new(0, 0)).unwrap();

        assert_eq!(out.bits_per_sample(), 16);
        for row in 0..5 {
            for col in 0..6 {
                let source = a.sample(row, col, 0).unwrap();
                assert_eq!(out.sample(row, col, 0).unwrap(), source * 257);
            }
        }
    }

    #[test]
    fn test_output_extent_is_shared_minimum() {
        let a = filled(10, 10, 8, &[1], Photometric::Grayscale);
        let b = filled(8, 14, 8, &[2], Photometric::Grayscale);

        let out = composite(&a, &b, &InterlaceSpec::new(2, 2)).unwrap();

        assert_eq!((out.width(), out.height()), (8, 10));
        assert_eq!(out.data().len(), 80);
    }

    #[test]
    fn test_checkerboard_tiles() {
        let a = filled(4, 4, 8, &[1], Photometric::Grayscale);
        let b = filled(4, 4, 8, &[2], Photometric::Grayscale);

        let out = composite(&a, &b, &InterlaceSpec::new(2, 2)).unwrap();

        assert_eq!(out.row(0), &[1, 1, 2, 2]);
        assert_eq!(out.row(1), &[1, 1, 2, 2]);
        assert_eq!(out.row(2), &[2, 2, 1, 1]);
        assert_eq!(out.row(3), &[2, 2, 1, 1]);
    }

    #[test]
    fn test_photometric_follows_first_image() {
        let a = filled(2, 2, 8, &[9], Photometric::Grayscale);
        let b = filled(2, 2, 8, &[1, 2, 3], Photometric::Rgb);

        let out = composite(&a, &b, &InterlaceSpec::new(0, 1)).unwrap();

        assert_eq!(out.photometric(), Photometric::Grayscale);
        assert_eq!(out.pixel(0, 0), &[9, 255, 255]);
        assert_eq!(out.pixel(0, 1), &[1, 2, 3]);
    }

    #[test]
    fn test_padded_source_stride() {
        let layout = PixelLayout::new(8, 1).unwrap();
        let a = RasterImage::with_stride(
            2,
            2,
            layout,
            Photometric::Grayscale,
            4,
            vec![1, 2, 99, 99, 3, 4, 99, 99],
        )
        .unwrap();
        let b = filled(2, 2, 8, &[0], Photometric::Grayscale);

        let out = composite(&a, &b, &InterlaceSpec::new(0, 0)).unwrap();

        assert_eq!(out.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let a = gradient(37, 23);
        let b = filled(41, 19, 12, &[4095, 0, 17], Photometric::Rgb);
        let spec = InterlaceSpec::new(3, 5);

        let sequential = InterlaceCompositor::new(spec).composite(&a, &b).unwrap();
        let parallel = InterlaceCompositor::new(spec)
            .parallel(true)
            .composite(&a, &b)
            .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_empty_extent() {
        let a = filled(0, 3, 8, &[1], Photometric::Grayscale);
        let b = filled(3, 3, 8, &[1], Photometric::Grayscale);

        let out = composite(&a, &b, &InterlaceSpec::default()).unwrap();

        assert_eq!(out.width(), 0);
        assert!(out.data().is_empty());
    }
}
