use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::error::{Error, Result};

/// Wire form of a chunk address: three little-endian u32 values in order
/// (level, index_real, index_imag). Every message that carries an address
/// uses this layout.
pub const ADDRESS_WIRE_LEN: usize = 12;

/// Address of one cell of a `level × level` regular partition of the
/// bounding square.
///
/// Distinct levels are independent partitions: there is no quadtree-style
/// parent/child relationship between cells at different levels, and nothing
/// is shared across them. The address is immutable and is the sole cache key
/// in the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkAddress {
    /// Subdivision level; the square is split into `level × level` cells.
    /// Must be at least 1.
    pub level: u32,
    /// Cell index along the real axis, `0..level`.
    pub index_real: u32,
    /// Cell index along the imaginary axis, `0..level`.
    pub index_imag: u32,
}

/// Plane-space window covered by one chunk. Derived from an address on
/// demand, never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkWindow {
    pub start_re: f64,
    pub start_im: f64,
    /// Side length of the window; windows are always square.
    pub range: f64,
}

impl ChunkAddress {
    pub fn new(level: u32, index_real: u32, index_imag: u32) -> Self {
        Self {
            level,
            index_real,
            index_imag,
        }
    }

    /// Check that the indices actually name a cell of this level's grid.
    pub fn validate(&self) -> Result<()> {
        if self.level == 0 {
            return Err(Error::Config(
                "subdivision level must be at least 1".to_string(),
            ));
        }
        if self.index_real >= self.level || self.index_imag >= self.level {
            return Err(Error::Config(format!(
                "cell index ({}, {}) out of range for level {}",
                self.index_real, self.index_imag, self.level
            )));
        }
        Ok(())
    }

    /// Map this address to its plane-space window.
    ///
    /// Pure: two calls with the same inputs return identical windows.
    pub fn window(&self, config: &GridConfig) -> Result<ChunkWindow> {
        if self.level == 0 {
            return Err(Error::Config(
                "subdivision level must be at least 1".to_string(),
            ));
        }
        let range = (config.max_axis - config.min_axis) / self.level as f64;
        Ok(ChunkWindow {
            start_re: config.min_axis + range * self.index_real as f64,
            start_im: config.min_axis + range * self.index_imag as f64,
            range,
        })
    }

    pub fn to_wire_bytes(&self) -> [u8; ADDRESS_WIRE_LEN] {
        let mut out = [0u8; ADDRESS_WIRE_LEN];
        out[0..4].copy_from_slice(&self.level.to_le_bytes());
        out[4..8].copy_from_slice(&self.index_real.to_le_bytes());
        out[8..12].copy_from_slice(&self.index_imag.to_le_bytes());
        out
    }

    /// Decode the fixed 12-byte wire form. The bytes always parse; whether
    /// the indices are in range for the level is a separate [`validate`]
    /// question.
    ///
    /// [`validate`]: ChunkAddress::validate
    pub fn from_wire_bytes(bytes: &[u8; ADDRESS_WIRE_LEN]) -> Self {
        let u32_at = |i: usize| {
            let mut quad = [0u8; 4];
            quad.copy_from_slice(&bytes[i..i + 4]);
            u32::from_le_bytes(quad)
        };
        Self {
            level: u32_at(0),
            index_real: u32_at(4),
            index_imag: u32_at(8),
        }
    }
}

impl fmt::Display for ChunkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.index_real, self.index_imag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_of_level_one_covers_the_whole_square() {
        let config = GridConfig::default();
        let window = ChunkAddress::new(1, 0, 0).window(&config).unwrap();
        assert_eq!(window.start_re, -2.0);
        assert_eq!(window.start_im, -2.0);
        assert_eq!(window.range, 4.0);
    }

    #[test]
    fn window_offsets_scale_with_indices() {
        let config = GridConfig::default();
        let window = ChunkAddress::new(4, 1, 3).window(&config).unwrap();
        assert_eq!(window.range, 1.0);
        assert_eq!(window.start_re, -1.0);
        assert_eq!(window.start_im, 1.0);
    }

    #[test]
    fn window_is_pure() {
        let config = GridConfig::default();
        let addr = ChunkAddress::new(7, 2, 5);
        assert_eq!(addr.window(&config).unwrap(), addr.window(&config).unwrap());
    }

    #[test]
    fn window_rejects_level_zero() {
        let config = GridConfig::default();
        let result = ChunkAddress::new(0, 0, 0).window(&config);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_indices() {
        assert!(ChunkAddress::new(4, 4, 0).validate().is_err());
        assert!(ChunkAddress::new(4, 0, 7).validate().is_err());
        assert!(ChunkAddress::new(4, 3, 3).validate().is_ok());
    }

    #[test]
    fn wire_roundtrip_preserves_fields() {
        let addr = ChunkAddress::new(1024, 17, 900);
        let restored = ChunkAddress::from_wire_bytes(&addr.to_wire_bytes());
        assert_eq!(restored, addr);
    }

    #[test]
    fn wire_layout_is_little_endian() {
        let bytes = ChunkAddress::new(0x0102_0304, 1, 2).to_wire_bytes();
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[2, 0, 0, 0]);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(ChunkAddress::new(8, 3, 5).to_string(), "8/3/5");
    }
}
