use tracing::{info, instrument, warn};
use std::io::Write;
use std::path::Path;

use crate::image_pipeline::{
    common::error::{InterlaceError, Result},
    conversions::types::{InterlaceConfig, InterlaceSummary},
    interlace::InterlaceCompositor,
    raster::RasterImage,
    tiff::{RasterReader, RasterWriter, StandardTiffWriter, TiffRasterReader},
};

pub struct InterlacePipeline<R: RasterReader, W: RasterWriter> {
    reader: R,
    writer: W,
    config: InterlaceConfig,
}

impl InterlacePipeline<TiffRasterReader, StandardTiffWriter> {
    pub fn new(config: InterlaceConfig) -> Self {
        Self {
            reader: TiffRasterReader,
            writer: StandardTiffWriter,
            config,
        }
    }
}

impl<R: RasterReader, W: RasterWriter> InterlacePipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: InterlaceConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, image: &RasterImage) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if image.width() == 0 || image.height() == 0 {
            return Err(InterlaceError::InvalidDimensions(image.width(), image.height()));
        }

        Ok(())
    }

    fn decode(&self, data: &[u8], name: &str) -> Result<RasterImage> {
        let image = {
            let _span = tracing::info_span!("decode_tiff", file = name).entered();
            self.reader.read_raster(data, name)?
        };

        {
            let _span = tracing::info_span!("validate_dimensions",
                width = image.width(),
                height = image.height()
            ).entered();
            self.validate_dimensions(&image)?;
        }

        info!(
            "loaded {}: {}x{} {}-bit {} channels",
            name,
            image.width(),
            image.height(),
            image.bits_per_sample(),
            image.samples_per_pixel()
        );
        Ok(image)
    }

    fn composite_images(&self, a: &RasterImage, b: &RasterImage) -> Result<RasterImage> {
        let _span = tracing::info_span!("composite").entered();
        InterlaceCompositor::new(self.config.spec)
            .parallel(self.config.parallel)
            .composite(a, b)
    }

    /// Decodes both inputs and composites them without encoding.
    #[instrument(skip(self, first, second), fields(first_size = first.1.len(), second_size = second.1.len()))]
    pub fn composite(&self, first: (&str, &[u8]), second: (&str, &[u8])) -> Result<RasterImage> {
        let a = self.decode(first.1, first.0)?;
        let b = self.decode(second.1, second.0)?;
        self.composite_images(&a, &b)
    }

    #[instrument(skip(self, first, second, output))]
    pub fn interlace(&self, first: &[u8], second: &[u8], output: &mut dyn Write) -> Result<RasterImage> {
        info!("Starting interlace");

        let composite = self.composite(("first", first), ("second", second))?;

        {
            let _span = tracing::info_span!("encode_tiff").entered();
            self.writer.write_raster(&composite, output)?;
        }

        info!(
            width = composite.width(),
            height = composite.height(),
            "Interlace complete"
        );
        Ok(composite)
    }

    /// Interlaces two files. The output file is only created once both inputs
    /// are decoded and composited, and is removed again if encoding fails.
    pub fn interlace_files<P: AsRef<Path>, Q: AsRef<Path>, O: AsRef<Path>>(
        &self,
        first_path: P,
        second_path: Q,
        output_path: O,
    ) -> Result<InterlaceSummary> {
        self.interlace_files_with(first_path, second_path, output_path, |_| {})
    }

    /// Same as [`Self::interlace_files`], calling `on_loaded` with each input
    /// path as soon as that input has been decoded.
    #[instrument(skip(self, first_path, second_path, output_path, on_loaded))]
    pub fn interlace_files_with<P, Q, O, F>(
        &self,
        first_path: P,
        second_path: Q,
        output_path: O,
        mut on_loaded: F,
    ) -> Result<InterlaceSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        O: AsRef<Path>,
        F: FnMut(&Path),
    {
        let first_path = first_path.as_ref();
        let second_path = second_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            first = %first_path.display(),
            second = %second_path.display(),
            output = %output_path.display(),
            "Interlacing files"
        );

        let mut load = |path: &Path| -> Result<RasterImage> {
            let data = {
                let _span = tracing::info_span!("read_input_file").entered();
                read_input(path)?
            };
            let image = self.decode(&data, &path.display().to_string())?;
            on_loaded(path);
            Ok(image)
        };
        let a = load(first_path)?;
        let b = load(second_path)?;
        let composite = self.composite_images(&a, &b)?;
        drop((a, b));

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            std::fs::File::create(output_path).map_err(|e| {
                InterlaceError::CannotCreateOutput {
                    file: output_path.display().to_string(),
                    reason: e.to_string(),
                }
            })?
        };

        let written = {
            let _span = tracing::info_span!("encode_tiff").entered();
            self.writer
                .write_raster(&composite, &mut output_file)
                .and_then(|_| output_file.flush().map_err(InterlaceError::from))
        };
        if let Err(e) = written {
            drop(output_file);
            if let Err(remove) = std::fs::remove_file(output_path) {
                warn!("Could not remove partial output {}: {}", output_path.display(), remove);
            }
            return Err(e);
        }

        info!(
            "wrote {} ({}x{} {}-bit {} channels)",
            output_path.display(),
            composite.width(),
            composite.height(),
            composite.bits_per_sample(),
            composite.samples_per_pixel()
        );

        Ok(InterlaceSummary {
            output: output_path.to_path_buf(),
            width: composite.width(),
            height: composite.height(),
            bits_per_sample: composite.bits_per_sample(),
            samples_per_pixel: composite.samples_per_pixel(),
        })
    }

    pub fn config(&self) -> &InterlaceConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: InterlaceConfig) {
        self.config = config;
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| InterlaceError::CannotOpenInput {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}
