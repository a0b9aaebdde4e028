//! Single-sample access into unpacked raster buffers.
//!
//! Every sample occupies one whole storage unit whose width is picked from the
//! sample's bit depth: 8-bit units for 1-8 bits, 16-bit units for 9-16 bits and
//! 32-bit units for 17-32 bits. Multi-byte units are kept in native byte order.

use crate::image_pipeline::common::error::{InterlaceError, Result};

/// Storage unit holding one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleUnit {
    U8,
    U16,
    U32,
}

impl SampleUnit {
    /// Picks the unit for a bit depth, rejecting depths outside 1..=32.
    pub fn for_bits(bits_per_sample: u16) -> Result<Self> {
        match bits_per_sample {
            1..=8 => Ok(SampleUnit::U8),
            9..=16 => Ok(SampleUnit::U16),
            17..=32 => Ok(SampleUnit::U32),
            _ => Err(InterlaceError::unsupported_depth(bits_per_sample)),
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            SampleUnit::U8 => 1,
            SampleUnit::U16 => 2,
            SampleUnit::U32 => 4,
        }
    }

    /// Bit depth a container stores this unit at.
    pub fn bits(self) -> u16 {
        self.bytes() as u16 * 8
    }

    /// Reads the `index`-th unit of `buffer`.
    #[inline]
    pub fn read(self, buffer: &[u8], index: usize) -> Result<u32> {
        let start = index * self.bytes();
        let bytes = buffer
            .get(start..start + self.bytes())
            .ok_or(InterlaceError::SampleOutOfBounds { index, len: buffer.len() })?;

        Ok(match self {
            SampleUnit::U8 => bytes[0] as u32,
            SampleUnit::U16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as u32,
            SampleUnit::U32 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        })
    }

    /// Writes the `index`-th unit of `buffer`, truncating `value` to the unit width.
    #[inline]
    pub fn write(self, buffer: &mut [u8], index: usize, value: u32) -> Result<()> {
        let start = index * self.bytes();
        let len = buffer.len();
        let bytes = buffer
            .get_mut(start..start + self.bytes())
            .ok_or(InterlaceError::SampleOutOfBounds { index, len })?;

        match self {
            SampleUnit::U8 => bytes[0] = value as u8,
            SampleUnit::U16 => bytes.copy_from_slice(&(value as u16).to_ne_bytes()),
            SampleUnit::U32 => bytes.copy_from_slice(&value.to_ne_bytes()),
        }
        Ok(())
    }
}

/// Reads sample `sample_index` from a buffer of `bits_per_sample`-deep samples.
pub fn read_sample(buffer: &[u8], bits_per_sample: u16, sample_index: usize) -> Result<u32> {
    SampleUnit::for_bits(bits_per_sample)?.read(buffer, sample_index)
}

/// Writes sample `sample_index` into a buffer of `bits_per_sample`-deep samples.
pub fn write_sample(
    buffer: &mut [u8],
    bits_per_sample: u16,
    sample_index: usize,
    value: u32,
) -> Result<()> {
    SampleUnit::for_bits(bits_per_sample)?.write(buffer, sample_index, value)
}
