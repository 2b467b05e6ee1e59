//! # Observation Decoder
//!
//! Decodes durable log lines back into observations.

use serde_json::Value;

use super::literal::{parse_mapping, parse_value};
use super::protocol::*;
use crate::error::{Result, RoverError};

/// Decode one log line
///
/// Surrounding whitespace (including the line terminator) is ignored.
///
/// # Arguments
///
/// * `line` - Line of the form `(x, y) -> {sensor mapping}`
///
/// # Returns
///
/// * `Result<Observation>` - Decoded observation
///
/// # Errors
///
/// Returns `MalformedLogLine` if:
/// - The separator is missing, or occurs more than once
/// - The coordinate part is not a pair of numbers
/// - The sensor part is not a parseable mapping
pub fn decode(line: &str) -> Result<Observation> {
    let line = line.trim();

    let mut parts = line.split(LOG_SEPARATOR);
    let (coords, sensors) = match (parts.next(), parts.next(), parts.next()) {
        (Some(coords), Some(sensors), None) => (coords, sensors),
        (_, None, _) => {
            return Err(RoverError::MalformedLogLine(format!(
                "missing '{}' separator",
                LOG_SEPARATOR.trim()
            )));
        }
        _ => {
            return Err(RoverError::MalformedLogLine(format!(
                "ambiguous line: '{}' separator occurs more than once",
                LOG_SEPARATOR.trim()
            )));
        }
    };

    let position = decode_position(coords)?;
    let sensors = parse_mapping(sensors)?;

    Ok(Observation::new(position, sensors))
}

/// Decode the coordinate part `(x, y)` into a position
pub fn decode_position(text: &str) -> Result<Position> {
    let items = match parse_value(text)? {
        Value::Array(items) => items,
        _ => {
            return Err(RoverError::MalformedLogLine(
                "coordinates are not a tuple".to_string()
            ));
        }
    };

    match items.as_slice() {
        [x, y] => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Ok(Position::new(x, y)),
            _ => Err(RoverError::MalformedLogLine(
                "coordinates must be numbers".to_string()
            )),
        },
        _ => Err(RoverError::MalformedLogLine(format!(
            "expected 2 coordinates, got {}",
            items.len()
        ))),
    }
}
