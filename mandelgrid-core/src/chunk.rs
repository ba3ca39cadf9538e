use crate::config::GridConfig;
use crate::error::{Error, Result};

/// A completed `W × W` row-major grid of normalized escape counts, where
/// `W = config.chunk_width`.
///
/// Byte `0` marks a sample that never escaped within the iteration cap
/// (interior of the set); any other value is a normalized escape-iteration
/// count. Row index corresponds to the imaginary axis, column index to the
/// real axis. Chunks are immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    data: Vec<u8>,
    width: usize,
}

impl Chunk {
    /// Wrap a flattened grid, rejecting anything that is not exactly
    /// `chunk_width²` bytes.
    pub fn from_bytes(data: Vec<u8>, config: &GridConfig) -> Result<Self> {
        let expected = config.chunk_len();
        if data.len() != expected {
            return Err(Error::Format(format!(
                "chunk has {} bytes, expected {}",
                data.len(),
                expected
            )));
        }
        Ok(Self {
            data,
            width: config.chunk_width,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Flattened row-major bytes, length `width²`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Value at (row, col), where row follows the imaginary axis.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        assert!(row < self.width && col < self.width);
        self.data[row * self.width + col]
    }
}
