//! # HTTP Rover API
//!
//! `RoverApi` over HTTP using `reqwest`.
//!
//! ## Endpoints
//!
//! | Operation | Method | Path | Query |
//! |-----------|--------|------|-------|
//! | Start session | POST | `session/start` | |
//! | Status | GET | `rover/status` | `session_id` |
//! | Sensor data | GET | `rover/sensor-data` | `session_id` |
//! | Move | POST | `rover/move` | `session_id`, `direction` |
//! | Stop | POST | `rover/stop` | `session_id` |
//! | Charge | POST | `rover/charge` | `session_id` |

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{RoverApi, RoverCommand, SessionId, StatusReading};
use crate::codec::{Position, SensorMap};
use crate::config::ApiConfig;
use crate::error::{Result, RoverError};
use crate::state::DEFAULT_BATTERY;

/// Full URLs of every rover API operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub session: String,
    pub status: String,
    pub sensor_data: String,
    pub move_rover: String,
    pub stop: String,
    pub charge: String,
}

impl Endpoints {
    /// Derive endpoint URLs from the API base URL
    pub fn from_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            session: format!("{}/session/start", base),
            status: format!("{}/rover/status", base),
            sensor_data: format!("{}/rover/sensor-data", base),
            move_rover: format!("{}/rover/move", base),
            stop: format!("{}/rover/stop", base),
            charge: format!("{}/rover/charge", base),
        }
    }

    fn command_url(&self, command: &RoverCommand) -> &str {
        match command {
            RoverCommand::Move(_) => &self.move_rover,
            RoverCommand::Stop => &self.stop,
            RoverCommand::Charge => &self.charge,
        }
    }
}

/// Rover API client over HTTP
#[derive(Debug, Clone)]
pub struct HttpRoverApi {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpRoverApi {
    /// Build a client for `base_url` with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RoverError::TransientFetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoints: Endpoints::from_base(base_url),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get_json(&self, url: &str, session: &SessionId) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .query(&[("session_id", session.as_str())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RoverError::TransientFetch(e.to_string()))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| RoverError::TransientFetch(format!("Invalid JSON from {}: {}", url, e)))
    }

    async fn try_start_session(&self) -> Result<SessionId> {
        let body = self
            .client
            .post(&self.endpoints.session)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RoverError::TransientFetch(e.to_string()))?
            .json::<Value>()
            .await
            .map_err(|e| RoverError::TransientFetch(e.to_string()))?;

        parse_session_id(&body).ok_or(RoverError::SessionUnavailable)
    }

    async fn try_send_command(&self, session: &SessionId, command: &RoverCommand) -> Result<()> {
        let mut request = self
            .client
            .post(self.endpoints.command_url(command))
            .query(&[("session_id", session.as_str())]);

        if let RoverCommand::Move(direction) = command {
            request = request.query(&[("direction", direction.as_str())]);
        }

        request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RoverError::CommandDelivery(format!("{}: {}", command, e)))?;

        Ok(())
    }
}

#[async_trait]
impl RoverApi for HttpRoverApi {
    async fn start_session(&self) -> Option<SessionId> {
        match self.try_start_session().await {
            Ok(session) => {
                info!("Started rover session {}", session);
                Some(session)
            }
            Err(e) => {
                warn!("Failed to start session: {}", e);
                None
            }
        }
    }

    async fn fetch_status(&self, session: &SessionId) -> Option<StatusReading> {
        let status = match self.get_json(&self.endpoints.status, session).await {
            Ok(body) => parse_status(&body),
            Err(e) => Err(e),
        };

        match status {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!("Status unavailable: {}", e);
                None
            }
        }
    }

    async fn fetch_sensors(&self, session: &SessionId) -> SensorMap {
        let sensors = match self.get_json(&self.endpoints.sensor_data, session).await {
            Ok(body) => parse_sensors(body),
            Err(e) => Err(e),
        };

        sensors.unwrap_or_else(|e| {
            warn!("Sensor data unavailable: {}", e);
            SensorMap::new()
        })
    }

    async fn send_command(&self, session: &SessionId, command: RoverCommand) {
        match self.try_send_command(session, &command).await {
            Ok(()) => debug!("Sent {} command", command),
            Err(e) => warn!("{}", e),
        }
    }
}

/// Extract the session id from a start-session response
///
/// Accepts a string or numeric `session_id`; empty strings are rejected.
pub fn parse_session_id(body: &Value) -> Option<SessionId> {
    match body.get("session_id")? {
        Value::String(s) if !s.is_empty() => Some(SessionId::new(s.clone())),
        Value::Number(n) => Some(SessionId::new(n.to_string())),
        _ => None,
    }
}

/// Extract position and battery from a status response
///
/// A missing `coordinates` key means the rover reports the origin.
///
/// # Errors
///
/// Returns `TransientFetch` if `coordinates` is present but is not a pair of
/// numbers. A missing or non-numeric `battery` falls back to the default.
pub fn parse_status(body: &Value) -> Result<StatusReading> {
    let position = match body.get("coordinates") {
        None => Position::new(0.0, 0.0),
        Some(coords) => parse_coordinates(coords)?,
    };

    let battery = body
        .get("battery")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_BATTERY);

    Ok(StatusReading { position, battery })
}

fn parse_coordinates(coords: &Value) -> Result<Position> {
    let coords = coords
        .as_array()
        .ok_or_else(|| RoverError::TransientFetch("status coordinates are not a list".to_string()))?;

    match coords.as_slice() {
        [x, y] => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Ok(Position::new(x, y)),
            _ => Err(RoverError::TransientFetch(
                "status coordinates are not numbers".to_string(),
            )),
        },
        _ => Err(RoverError::TransientFetch(format!(
            "expected 2 coordinates, got {}",
            coords.len()
        ))),
    }
}

/// Require the sensor payload to be a mapping
pub fn parse_sensors(body: Value) -> Result<SensorMap> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(RoverError::TransientFetch(
            "sensor data is not a mapping".to_string(),
        )),
    }
}
