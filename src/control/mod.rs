//! # Control Loop Module
//!
//! One polling cycle: fetch, classify, persist, decide, command, publish.
//!
//! Cycles are triggered externally on a fixed interval and never overlap:
//! `run_cycle` takes `&mut self`, so the next cycle cannot start until the
//! previous one has returned.
//!
//! ## Cycle
//!
//! 1. Fetch status; without a position the cycle is skipped entirely
//! 2. Fetch sensors and build the observation
//! 3. Append to the durable log (which also updates the state store)
//! 4. Decide commands from the latest battery reading
//! 5. Send the commands
//! 6. Publish a snapshot to subscribers

pub mod policy;

pub use policy::{BatteryPolicy, PowerState};

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::client::{RoverApi, RoverCommand, SessionId};
use crate::codec::{Observation, Position, SensorMap};
use crate::error::{Result, RoverError};
use crate::persistence::TelemetryLog;
use crate::state::Snapshot;

/// What a single cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No position was available; nothing was recorded or commanded
    Skipped,

    /// The observation was ingested and commands were issued
    Completed {
        position: Position,
        commands: Vec<RoverCommand>,
        /// Whether the observation reached the durable log
        persisted: bool,
    },
}

/// Drives polling cycles against a rover API
pub struct ControlLoop<A: RoverApi> {
    api: A,
    session: SessionId,
    log: TelemetryLog,
    policy: BatteryPolicy,
    rng: StdRng,
    latest_sensors: SensorMap,
    cycles: u64,
    snapshots: watch::Sender<Arc<Snapshot>>,
}

impl<A: RoverApi> std::fmt::Debug for ControlLoop<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("session", &self.session)
            .field("log", &self.log.path())
            .field("cycles", &self.cycles)
            .finish_non_exhaustive()
    }
}

impl<A: RoverApi> ControlLoop<A> {
    /// Start a session and build the loop
    ///
    /// # Errors
    ///
    /// Returns `SessionUnavailable` if the API does not issue a session id
    pub async fn start(api: A, log: TelemetryLog, policy: BatteryPolicy) -> Result<Self> {
        let session = api.start_session().await.ok_or(RoverError::SessionUnavailable)?;
        Ok(Self::new(api, session, log, policy))
    }

    /// Build the loop for an existing session
    ///
    /// The initial snapshot reflects whatever `log` already replayed.
    pub fn new(api: A, session: SessionId, log: TelemetryLog, policy: BatteryPolicy) -> Self {
        let initial = Snapshot::new(log.store().snapshot(), SensorMap::new(), 0);
        let (snapshots, _) = watch::channel(Arc::new(initial));

        Self {
            api,
            session,
            log,
            policy,
            rng: StdRng::from_entropy(),
            latest_sensors: SensorMap::new(),
            cycles: 0,
            snapshots,
        }
    }

    /// Replace the direction RNG, e.g. with a seeded one
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Receive a new snapshot after every completed cycle
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.subscribe()
    }

    /// Most recently published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }

    /// Run one cycle
    ///
    /// Failures never abort the cycle: a missing position skips it, missing
    /// sensors yield an empty payload, persistence and command failures are
    /// logged.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let Some(status) = self.api.fetch_status(&self.session).await else {
            debug!("No position this cycle, skipping");
            return CycleOutcome::Skipped;
        };

        self.log.set_battery(status.battery);

        let sensors = self.api.fetch_sensors(&self.session).await;
        let observation = Observation::new(status.position, sensors);

        let persisted = match self.log.append(&observation) {
            Ok(events) => {
                if events.obstacle {
                    info!("Obstacle at {}", observation.position);
                }
                if events.tag_detected {
                    info!("RFID tag detected at {}", observation.position);
                }
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        };

        let battery = self.log.store().battery();
        if self.policy.power_state(battery) == PowerState::LowBattery {
            info!("Battery at {}, stopping to charge", battery);
        }

        let commands = self.policy.decide(battery, &mut self.rng);
        for command in &commands {
            self.api.send_command(&self.session, *command).await;
        }

        self.latest_sensors = observation.sensors;
        self.cycles += 1;
        self.publish();

        CycleOutcome::Completed {
            position: observation.position,
            commands,
            persisted,
        }
    }

    fn publish(&self) {
        let snapshot = Snapshot::new(
            self.log.store().snapshot(),
            self.latest_sensors.clone(),
            self.cycles,
        );
        self.snapshots.send_replace(Arc::new(snapshot));
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn log(&self) -> &TelemetryLog {
        &self.log
    }

    /// Number of completed (not skipped) cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}
