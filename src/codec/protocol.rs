//! # Log Record Types
//!
//! Core definitions shared by the log encoder and decoder.

use serde_json::{Map, Value};
use std::fmt;

/// Separator between the coordinate part and the sensor part of a log line
pub const LOG_SEPARATOR: &str = " -> ";

/// Arbitrary key-value sensor payload as reported by the rover API
pub type SensorMap = Map<String, Value>;

/// Planar rover position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Bit-level identity used for set membership.
    ///
    /// `-0.0` and `0.0` compare equal as floats, so they share a key.
    pub fn key(&self) -> (u64, u64) {
        fn bits(v: f64) -> u64 {
            if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
        }
        (bits(self.x), bits(self.y))
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Renders as `(x, y)` with the shortest text that parses back to the same value
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One polling result: where the rover was and what it sensed there
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Observation {
    pub position: Position,
    pub sensors: SensorMap,
}

impl Observation {
    pub fn new(position: Position, sensors: SensorMap) -> Self {
        Self { position, sensors }
    }
}
