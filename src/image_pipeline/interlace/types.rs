//! Interlace pattern types

use std::fmt;

/// Image a given output pixel is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    A,
    B,
}

/// Switching pattern derived from an [`InterlaceSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterlaceMode {
    /// Rectangular tiles alternating on both axes
    Grid { rows: u32, cols: u32 },
    /// Horizontal stripes
    Rows(u32),
    /// Vertical stripes
    Columns(u32),
    /// No switching, every pixel comes from the first image
    Copy,
}

impl fmt::Display for InterlaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterlaceMode::Grid { rows, cols } => {
                write!(f, "grid (rows every {rows}, cols every {cols})")
            }
            InterlaceMode::Rows(n) => write!(f, "rows every {n}"),
            InterlaceMode::Columns(n) => write!(f, "columns every {n}"),
            InterlaceMode::Copy => write!(f, "no interlacing, copying first image"),
        }
    }
}

/// Row and column switching periods. A zero interval disables that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterlaceSpec {
    row_interval: u32,
    col_interval: u32,
}

impl Default for InterlaceSpec {
    /// Alternates every row.
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl InterlaceSpec {
    pub const fn new(row_interval: u32, col_interval: u32) -> Self {
        Self {
            row_interval,
            col_interval,
        }
    }

    pub fn row_interval(&self) -> u32 {
        self.row_interval
    }

    pub fn col_interval(&self) -> u32 {
        self.col_interval
    }

    pub fn mode(&self) -> InterlaceMode {
        match (self.row_interval, self.col_interval) {
            (0, 0) => InterlaceMode::Copy,
            (rows, 0) => InterlaceMode::Rows(rows),
            (0, cols) => InterlaceMode::Columns(cols),
            (rows, cols) => InterlaceMode::Grid { rows, cols },
        }
    }

    /// Picks the source image for the output pixel at (`row`, `col`).
    #[inline]
    pub fn select(&self, row: usize, col: usize) -> Source {
        let use_a = match self.mode() {
            InterlaceMode::Grid { rows, cols } => {
                band(row, rows) == band(col, cols)
            }
            InterlaceMode::Rows(rows) => band(row, rows) == 0,
            InterlaceMode::Columns(cols) => band(col, cols) == 0,
            InterlaceMode::Copy => true,
        };
        if use_a { Source::A } else { Source::B }
    }
}

#[inline]
fn band(index: usize, interval: u32) -> usize {
    (index / interval as usize) & 1
}
