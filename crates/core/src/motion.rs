//! Motion sample decoding.
//!
//! Delta registers hold 16-bit two's-complement values split over a high and
//! a low byte. Samples are plain values: nothing is buffered between polls.

use serde::{Deserialize, Serialize};

/// One decoded (dx, dy) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MotionSample {
    pub dx: i16,
    pub dy: i16,
}

impl MotionSample {
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    pub fn new(dx: i16, dy: i16) -> Self {
        Self { dx, dy }
    }

    /// Build a sample from the four delta register bytes.
    pub fn from_registers(x_high: u8, x_low: u8, y_high: u8, y_low: u8) -> Self {
        Self {
            dx: decode_delta(x_high, x_low),
            dy: decode_delta(y_high, y_low),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Apply a mounting orientation. Swap happens before inversion.
    ///
    /// Negation saturates, so -32768 becomes 32767.
    pub fn oriented(self, orientation: Orientation) -> Self {
        let (mut dx, mut dy) = if orientation.swap_xy {
            (self.dy, self.dx)
        } else {
            (self.dx, self.dy)
        };
        if orientation.invert_x {
            dx = dx.saturating_neg();
        }
        if orientation.invert_y {
            dy = dy.saturating_neg();
        }
        Self { dx, dy }
    }
}

/// Reassemble one axis: `(high << 8) | low`, read as two's-complement.
pub fn decode_delta(high: u8, low: u8) -> i16 {
    i16::from_be_bytes([high, low])
}

/// Axis transform applied between the sensor and the pointer report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Orientation {
    pub invert_x: bool,
    pub invert_y: bool,
    pub swap_xy: bool,
}

impl Orientation {
    /// Trackball mounting: sensor faces up, so Y is reversed.
    pub fn trackball() -> Self {
        Self {
            invert_y: true,
            ..Self::default()
        }
    }
}
