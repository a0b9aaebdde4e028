use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterlaceError {
    #[error("Could not open {file}: {reason}")]
    CannotOpenInput { file: String, reason: String },

    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    #[error("Out of memory allocating raster buffer")]
    OutOfMemory,

    #[error("Failed to read scanline {row} from {file}")]
    ScanlineReadFailed { file: String, row: u32 },

    #[error("Could not create {file}: {reason}")]
    CannotCreateOutput { file: String, reason: String },

    #[error("Failed to write scanline {row}")]
    ScanlineWriteFailed { row: u32 },

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Raster buffer too small: need {needed} bytes, have {actual}")]
    InvalidBuffer { needed: usize, actual: usize },

    #[error("Sample index {index} out of bounds for {len}-byte buffer")]
    SampleOutOfBounds { index: usize, len: usize },

    #[error("Failed to encode TIFF image: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InterlaceError {
    pub(crate) fn unsupported_depth(bits: u16) -> Self {
        InterlaceError::UnsupportedPixelFormat(format!("{bits} bits per sample (supported: 1-32)"))
    }
}

pub type Result<T> = std::result::Result<T, InterlaceError>;
