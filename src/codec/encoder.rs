//! # Observation Encoder
//!
//! Encodes observations into durable log lines.

use super::literal::write_mapping;
use super::protocol::*;

/// Encode an observation into one log line (without the trailing newline)
///
/// # Arguments
///
/// * `observation` - Position and sensor payload to encode
///
/// # Returns
///
/// * `String` - Line of the form `(x, y) -> {sensor mapping}`
///
/// # Examples
///
/// ```
/// use rover_telemetry::codec::{encode, Observation, Position};
/// use serde_json::json;
///
/// let sensors = json!({"obstacle": true}).as_object().unwrap().clone();
/// let line = encode(&Observation::new(Position::new(1.0, 0.0), sensors));
/// assert_eq!(line, "(1, 0) -> {'obstacle': True}");
/// ```
pub fn encode(observation: &Observation) -> String {
    let mut line = observation.position.to_string();
    line.push_str(LOG_SEPARATOR);
    write_mapping(&mut line, &observation.sensors);
    line
}

/// Whether an encoded line can be decoded unambiguously.
///
/// Lines whose sensor text itself contains the separator are rejected by the
/// decoder.
pub fn is_replayable(line: &str) -> bool {
    line.matches(LOG_SEPARATOR).count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sensors(value: serde_json::Value) -> SensorMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_encode_integral_coordinates() {
        let obs = Observation::new(
            Position::new(0.0, 0.0),
            sensors(json!({"obstacle": false, "rfid": {"tag_detected": false}})),
        );
        assert_eq!(
            encode(&obs),
            "(0, 0) -> {'obstacle': False, 'rfid': {'tag_detected': False}}"
        );
    }

    #[test]
    fn test_encode_fractional_coordinates() {
        let obs = Observation::new(Position::new(-12.5, 3.25), SensorMap::new());
        assert_eq!(encode(&obs), "(-12.5, 3.25) -> {}");
    }

    #[test]
    fn test_encode_has_no_newline() {
        let obs = Observation::new(Position::new(1.0, 2.0), sensors(json!({"note": "a\nb"})));
        assert!(!encode(&obs).contains('\n'));
    }

    #[test]
    fn test_is_replayable() {
        let plain = Observation::new(Position::new(1.0, 2.0), sensors(json!({"status": "ok"})));
        assert!(is_replayable(&encode(&plain)));

        let arrow = Observation::new(Position::new(1.0, 2.0), sensors(json!({"status": "a -> b"})));
        assert!(!is_replayable(&encode(&arrow)));
    }
}
