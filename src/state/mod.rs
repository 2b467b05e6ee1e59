//! # State Module
//!
//! In-memory accumulation of the rover's trajectory and sensed events.
//!
//! This module handles:
//! - Appending every ingested position to the path
//! - Classifying obstacle encounters and RFID tag detections
//! - Tracking the last reported battery level
//! - Handing out read-only snapshots to consumers
//!
//! ## Classification
//!
//! Sensor payloads have no guaranteed shape, so classification uses explicit
//! optional lookups with documented defaults:
//!
//! | Event | Lookup | Default when absent |
//! |-------|--------|---------------------|
//! | Obstacle | `sensors["obstacle"]` | not detected |
//! | Tag detection | `sensors["rfid"]["tag_detected"]` | not detected |
//!
//! A found value counts as detected when it is truthy: `null`, `false`, `0`,
//! `""`, `[]` and `{}` are falsy, everything else is truthy. A non-mapping
//! `rfid` value is treated as absent.

pub mod snapshot;

pub use snapshot::Snapshot;

use serde_json::Value;
use std::collections::HashSet;

use crate::codec::{Observation, Position, SensorMap};

/// Battery level assumed before the first status fetch
pub const DEFAULT_BATTERY: f64 = 100.0;

/// Sensor key flagging an obstacle at the current position
pub const OBSTACLE_KEY: &str = "obstacle";

/// Sensor key path flagging an RFID tag at the current position
pub const TAG_DETECTED_PATH: [&str; 2] = ["rfid", "tag_detected"];

/// Accumulated rover state
#[derive(Debug, Clone, PartialEq)]
pub struct RoverState {
    /// Every ingested position, in arrival order
    pub path: Vec<Position>,

    /// Distinct obstacle positions, in first-seen order
    pub obstacles: Vec<Position>,

    /// Positions of every tag detection, in arrival order (not deduplicated)
    pub tag_detections: Vec<Position>,

    /// Last known battery level, passed through as reported
    pub battery: f64,
}

impl Default for RoverState {
    fn default() -> Self {
        Self {
            path: Vec::new(),
            obstacles: Vec::new(),
            tag_detections: Vec::new(),
            battery: DEFAULT_BATTERY,
        }
    }
}

impl RoverState {
    /// Most recent position, if any observation was ingested
    pub fn current_position(&self) -> Option<Position> {
        self.path.last().copied()
    }
}

/// Events found in a single observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObservationEvents {
    pub obstacle: bool,
    pub tag_detected: bool,
}

/// Single-writer store of rover state
///
/// Collections only grow: nothing is ever removed for the lifetime of the
/// store.
#[derive(Debug, Default, Clone)]
pub struct StateStore {
    state: RoverState,
    obstacle_keys: HashSet<(u64, u64)>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one observation
    ///
    /// # Arguments
    ///
    /// * `observation` - Position and sensor payload to ingest
    ///
    /// # Returns
    ///
    /// * `ObservationEvents` - Which events the payload flagged
    pub fn apply(&mut self, observation: &Observation) -> ObservationEvents {
        let position = observation.position;
        let events = classify(&observation.sensors);

        self.state.path.push(position);

        if events.obstacle && self.obstacle_keys.insert(position.key()) {
            self.state.obstacles.push(position);
        }

        if events.tag_detected {
            self.state.tag_detections.push(position);
        }

        events
    }

    /// Overwrite the battery level; any value is accepted as-is
    pub fn set_battery(&mut self, value: f64) {
        self.state.battery = value;
    }

    /// Borrow the current state
    pub fn state(&self) -> &RoverState {
        &self.state
    }

    /// Copy of the current state, detached from later updates
    pub fn snapshot(&self) -> RoverState {
        self.state.clone()
    }

    pub fn battery(&self) -> f64 {
        self.state.battery
    }

    /// Number of observations ingested so far
    pub fn len(&self) -> usize {
        self.state.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.path.is_empty()
    }
}

/// Classify a sensor payload
pub fn classify(sensors: &SensorMap) -> ObservationEvents {
    ObservationEvents {
        obstacle: lookup(sensors, &[OBSTACLE_KEY]).is_some_and(is_truthy),
        tag_detected: lookup(sensors, &TAG_DETECTED_PATH).is_some_and(is_truthy),
    }
}

/// Follow a key path through nested mappings
///
/// Returns `None` when a key is missing or an intermediate value is not a
/// mapping.
pub fn lookup<'a>(sensors: &'a SensorMap, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = sensors.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Truthiness of a sensor value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observation(x: f64, y: f64, sensors: Value) -> Observation {
        Observation::new(Position::new(x, y), sensors.as_object().cloned().unwrap())
    }

    #[test]
    fn test_new_store_defaults() {
        let store = StateStore::new();
        assert!(store.is_empty());
        assert_eq!(store.battery(), DEFAULT_BATTERY);
        assert!(store.state().current_position().is_none());
    }

    #[test]
    fn test_apply_appends_path() {
        let mut store = StateStore::new();
        store.apply(&observation(0.0, 0.0, json!({})));
        store.apply(&observation(1.0, 0.0, json!({})));
        store.apply(&observation(0.0, 0.0, json!({})));

        assert_eq!(
            store.state().path,
            vec![Position::new(0.0, 0.0), Position::new(1.0, 0.0), Position::new(0.0, 0.0)]
        );
        assert_eq!(store.state().current_position(), Some(Position::new(0.0, 0.0)));
    }

    #[test]
    fn test_obstacles_are_deduplicated() {
        let mut store = StateStore::new();
        let events = store.apply(&observation(3.0, 4.0, json!({"obstacle": true})));
        assert!(events.obstacle);
        store.apply(&observation(3.0, 4.0, json!({"obstacle": true})));
        store.apply(&observation(5.0, 4.0, json!({"obstacle": true})));

        assert_eq!(store.state().obstacles, vec![Position::new(3.0, 4.0), Position::new(5.0, 4.0)]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_tag_detections_keep_repeats() {
        let mut store = StateStore::new();
        for _ in 0..3 {
            store.apply(&observation(7.0, 7.0, json!({"rfid": {"tag_detected": true}})));
        }
        assert_eq!(store.state().tag_detections, vec![Position::new(7.0, 7.0); 3]);
    }

    #[test]
    fn test_missing_fields_are_not_events() {
        let mut store = StateStore::new();
        let events = store.apply(&observation(1.0, 1.0, json!({"temperature": 20})));
        assert_eq!(events, ObservationEvents::default());

        store.apply(&observation(1.0, 2.0, json!({"rfid": {}})));
        store.apply(&observation(1.0, 3.0, json!({"rfid": "offline"})));
        store.apply(&observation(1.0, 4.0, json!({"rfid": null, "obstacle": null})));

        assert!(store.state().obstacles.is_empty());
        assert!(store.state().tag_detections.is_empty());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!(-0.5)));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!([0])));
    }

    #[test]
    fn test_lookup_paths() {
        let sensors = json!({"rfid": {"tag_detected": true}, "obstacle": false});
        let sensors = sensors.as_object().unwrap();

        assert_eq!(lookup(sensors, &["rfid", "tag_detected"]), Some(&json!(true)));
        assert_eq!(lookup(sensors, &["obstacle"]), Some(&json!(false)));
        assert_eq!(lookup(sensors, &["obstacle", "inner"]), None);
        assert_eq!(lookup(sensors, &["missing"]), None);
        assert_eq!(lookup(sensors, &[]), None);
    }

    #[test]
    fn test_set_battery_passes_through() {
        let mut store = StateStore::new();
        for value in [42.0, -5.0, 250.0] {
            store.set_battery(value);
            assert_eq!(store.battery(), value);
        }
    }

    #[test]
    fn test_collections_only_grow() {
        let mut store = StateStore::new();
        let payloads = [
            json!({"obstacle": true}),
            json!({"rfid": {"tag_detected": true}}),
            json!({}),
            json!({"obstacle": true, "rfid": {"tag_detected": true}}),
        ];

        let mut previous = store.snapshot();
        for (i, payload) in payloads.into_iter().enumerate() {
            store.apply(&observation(i as f64, 0.0, payload));
            let current = store.snapshot();

            assert_eq!(current.path.len(), previous.path.len() + 1);
            assert!(previous.obstacles.iter().all(|p| current.obstacles.contains(p)));
            assert!(previous.tag_detections.iter().all(|p| current.tag_detections.contains(p)));
            assert!(current.obstacles.iter().all(|p| current.path.contains(p)));
            assert!(current.tag_detections.iter().all(|p| current.path.contains(p)));
            previous = current;
        }
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = StateStore::new();
        store.apply(&observation(0.0, 0.0, json!({})));
        let snapshot = store.snapshot();
        store.apply(&observation(1.0, 0.0, json!({})));

        assert_eq!(snapshot.path.len(), 1);
        assert_eq!(store.len(), 2);
    }
}
