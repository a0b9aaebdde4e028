//! Interlace pipeline configuration types

use std::path::PathBuf;

use crate::image_pipeline::interlace::InterlaceSpec;

/// Configuration for interlacing two images
#[derive(Debug, Clone)]
pub struct InterlaceConfig {
    /// Row/column switching pattern
    pub spec: InterlaceSpec,
    /// Whether to reject inputs with a zero width or height
    pub validate_dimensions: bool,
    /// Whether to composite output rows in parallel
    pub parallel: bool,
}

impl Default for InterlaceConfig {
    fn default() -> Self {
        Self {
            spec: InterlaceSpec::default(),
            validate_dimensions: true,
            parallel: true,
        }
    }
}

impl InterlaceConfig {
    pub fn builder() -> InterlaceConfigBuilder {
        InterlaceConfigBuilder::default()
    }
}

/// Builder for InterlaceConfig
///
/// Leaving both intervals unset alternates every row. Setting only one of
/// them disables the other axis.
#[derive(Default)]
pub struct InterlaceConfigBuilder {
    row_interval: Option<u32>,
    col_interval: Option<u32>,
    validate_dimensions: Option<bool>,
    parallel: Option<bool>,
}

impl InterlaceConfigBuilder {
    pub fn row_interval(mut self, rows: u32) -> Self {
        self.row_interval = Some(rows);
        self
    }

    pub fn col_interval(mut self, cols: u32) -> Self {
        self.col_interval = Some(cols);
        self
    }

    pub fn spec(self, spec: InterlaceSpec) -> Self {
        self.row_interval(spec.row_interval())
            .col_interval(spec.col_interval())
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn parallel(mut self, enable: bool) -> Self {
        self.parallel = Some(enable);
        self
    }

    pub fn build(self) -> InterlaceConfig {
        let default = InterlaceConfig::default();
        let spec = match (self.row_interval, self.col_interval) {
            (None, None) => default.spec,
            (rows, cols) => InterlaceSpec::new(rows.unwrap_or(0), cols.unwrap_or(0)),
        };
        InterlaceConfig {
            spec,
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            parallel: self.parallel.unwrap_or(default.parallel),
        }
    }
}

/// What an interlace run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterlaceSummary {
    pub output: PathBuf,
    pub width: usize,
    pub height: usize,
    pub bits_per_sample: u16,
    pub samples_per_pixel: u16,
}

/// 8-bit RGBA pixels with a top-left origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    /// Interleaved [R, G, B, A, R, G, B, A, ...]
    pub data: Vec<u8>,
}
