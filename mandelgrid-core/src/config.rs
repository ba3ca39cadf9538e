use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Global grid parameters, threaded explicitly through every component.
///
/// This is a value, not module-level state, so tests can substitute a small
/// grid (e.g. `chunk_width = 8`) without touching the production constants.
/// Chunk content is a deterministic function of an address and this config
/// alone, which is what makes caching and deduplication safe.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Lower bound of the bounding square on both axes.
    pub min_axis: f64,
    /// Upper bound of the bounding square on both axes.
    pub max_axis: f64,
    /// Edge length of a chunk in samples; a chunk holds `chunk_width²` bytes.
    pub chunk_width: usize,
    /// Escape-iteration cap for the compute kernel.
    pub max_iterations: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_axis: -2.0,
            max_axis: 2.0,
            chunk_width: 4096,
            max_iterations: 1024,
        }
    }
}

impl GridConfig {
    /// Production config with a substituted chunk width. Intended for tests
    /// and tooling that cannot afford 16 MiB chunks.
    pub fn with_chunk_width(chunk_width: usize) -> Self {
        Self {
            chunk_width,
            ..Self::default()
        }
    }

    /// Number of bytes in one flattened row-major chunk.
    pub fn chunk_len(&self) -> usize {
        self.chunk_width * self.chunk_width
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_width == 0 {
            return Err(Error::Config("chunk width must be at least 1".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(Error::Config(
                "iteration cap must be at least 1".to_string(),
            ));
        }
        if !(self.min_axis < self.max_axis) {
            return Err(Error::Config(format!(
                "axis bounds are inverted or degenerate: [{}, {}]",
                self.min_axis, self.max_axis
            )));
        }
        Ok(())
    }
}
