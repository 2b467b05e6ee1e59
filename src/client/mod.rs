//! # Rover API Client Module
//!
//! Request/response boundary to the remote rover API.
//!
//! This module handles:
//! - Starting a session
//! - Fetching status (position, battery) and sensor payloads
//! - Sending move, stop and charge commands
//!
//! Every network failure is absorbed here: callers only ever see "no data
//! this cycle" (`None` or an empty sensor map), never a transport error.
//! Nothing is retried.

pub mod http;

pub use http::{Endpoints, HttpRoverApi};

use async_trait::async_trait;
use std::fmt;

use crate::codec::{Position, SensorMap};

/// Opaque session identifier issued by the rover API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position and battery as reported by the status endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReading {
    pub position: Position,
    pub battery: f64,
}

/// Movement direction for a move command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    /// All directions, in the order a uniform choice draws from
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];

    /// Wire name of the direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command sent to the rover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoverCommand {
    Move(Direction),
    Stop,
    Charge,
}

impl fmt::Display for RoverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoverCommand::Move(direction) => write!(f, "move {}", direction),
            RoverCommand::Stop => f.write_str("stop"),
            RoverCommand::Charge => f.write_str("charge"),
        }
    }
}

/// Operations of the remote rover API
///
/// Implementations never return transport errors; failures become the
/// sentinel values documented on each method.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoverApi: Send + Sync {
    /// Start a session, `None` if no session id could be obtained
    async fn start_session(&self) -> Option<SessionId>;

    /// Fetch position and battery, `None` on any failure
    async fn fetch_status(&self, session: &SessionId) -> Option<StatusReading>;

    /// Fetch the sensor payload, empty on any failure
    async fn fetch_sensors(&self, session: &SessionId) -> SensorMap;

    /// Fire-and-forget command; delivery failures are only logged
    async fn send_command(&self, session: &SessionId, command: RoverCommand);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_wire_names() {
        let names: Vec<&str> = Direction::ALL.iter().map(Direction::as_str).collect();
        assert_eq!(names, vec!["forward", "backward", "left", "right"]);
    }

    #[test]
    fn test_command_display() {
        assert_eq!(RoverCommand::Move(Direction::Left).to_string(), "move left");
        assert_eq!(RoverCommand::Stop.to_string(), "stop");
        assert_eq!(RoverCommand::Charge.to_string(), "charge");
    }

    #[test]
    fn test_session_id() {
        let session = SessionId::new("abc-123");
        assert_eq!(session.as_str(), "abc-123");
        assert_eq!(session.to_string(), "abc-123");
    }
}
