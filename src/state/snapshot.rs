//! # Snapshot
//!
//! Immutable view of the rover state handed to display consumers.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

use super::RoverState;
use crate::codec::literal::write_value;
use crate::codec::SensorMap;

/// Rover state plus the latest raw sensor payload
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: RoverState,

    /// Sensor payload of the most recent cycle (empty before the first one)
    pub sensors: SensorMap,

    /// Number of completed cycles when this snapshot was taken
    pub cycle: u64,

    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(state: RoverState, sensors: SensorMap, cycle: u64) -> Self {
        Self {
            state,
            sensors,
            cycle,
            taken_at: Utc::now(),
        }
    }

    /// `key: value` lines for a sensor display panel; top-level strings are shown bare
    pub fn sensor_lines(&self) -> Vec<String> {
        self.sensors
            .iter()
            .map(|(key, value)| {
                let mut line = format!("{}: ", key);
                match value {
                    Value::String(text) => line.push_str(text),
                    other => write_value(&mut line, other),
                }
                line
            })
            .collect()
    }
}

/// One-line summary for text consumers
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle {}: ", self.cycle)?;
        match self.state.current_position() {
            Some(position) => write!(f, "at {}", position)?,
            None => write!(f, "no position")?,
        }
        write!(
            f,
            ", battery {}, path {}, obstacles {}, tags {}",
            self.state.battery,
            self.state.path.len(),
            self.state.obstacles.len(),
            self.state.tag_detections.len()
        )
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(RoverState::default(), SensorMap::new(), 0)
    }
}
