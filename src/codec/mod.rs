//! # Log Codec Module
//!
//! Text encoding of observations for the durable trajectory log.
//!
//! This module handles:
//! - One observation per line: `(x, y) -> {sensor mapping}`
//! - Writing sensor payloads as mapping literals
//! - Decoding lines back into observations, tolerant of unknown sensor fields
//! - Reporting undecodable lines as `MalformedLogLine`

pub mod protocol;
pub mod literal;
pub mod encoder;
pub mod decoder;

pub use decoder::decode;
pub use encoder::encode;
pub use protocol::{Observation, Position, SensorMap, LOG_SEPARATOR};
