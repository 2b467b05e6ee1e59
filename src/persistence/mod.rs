//! # Persistence Module
//!
//! Append-only durable log of observations.
//!
//! This module handles:
//! - Replaying the log into a fresh `StateStore` at startup
//! - Appending each new observation as one line and ingesting it
//! - Skipping and counting lines that cannot be decoded
//!
//! The log file is created on first append, opened and closed once per
//! append, and never truncated or rewritten.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::codec::encoder::is_replayable;
use crate::codec::{decode, encode, Observation};
use crate::error::{Result, RoverError};
use crate::state::{ObservationEvents, StateStore};

/// Outcome of a replay pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayReport {
    /// Lines decoded and ingested
    pub succeeded: usize,

    /// Lines that could not be decoded
    pub failed: usize,
}

/// Durable observation log and the state it feeds
///
/// Owns the `StateStore`, making `append` the only way new history enters
/// the store.
#[derive(Debug)]
pub struct TelemetryLog {
    path: PathBuf,
    store: StateStore,
}

impl TelemetryLog {
    /// Create a log handle with an empty store; nothing is read or written yet
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            store: StateStore::new(),
        }
    }

    /// Create a log handle and replay any existing history into it
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Self, ReplayReport)> {
        let mut log = Self::new(path);
        let report = log.replay()?;
        Ok((log, report))
    }

    /// Replay every line of the log into the store
    ///
    /// A missing file means no prior history. Undecodable lines are logged,
    /// counted and skipped; blank lines are ignored.
    ///
    /// # Returns
    ///
    /// * `Result<ReplayReport>` - Counts of ingested and rejected lines
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be opened or read
    pub fn replay(&mut self) -> Result<ReplayReport> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No previous log at {}, starting fresh", self.path.display());
                return Ok(ReplayReport::default());
            }
            Err(e) => return Err(e.into()),
        };

        let report = replay_lines(BufReader::new(file), &mut self.store)?;

        info!(
            "Replayed {} observations from {} ({} malformed lines skipped)",
            report.succeeded,
            self.path.display(),
            report.failed
        );
        Ok(report)
    }

    /// Persist one observation and ingest it into the store
    ///
    /// The store is updated even when the write fails, so in-memory history
    /// can run ahead of the durable log.
    ///
    /// # Returns
    ///
    /// * `Result<ObservationEvents>` - Events flagged by the observation
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the line could not be written
    pub fn append(&mut self, observation: &Observation) -> Result<ObservationEvents> {
        let mut line = encode(observation);
        if !is_replayable(&line) {
            warn!("Sensor payload contains the log separator; line at {} will not replay", observation.position);
        }
        line.push('\n');

        let written = self.write_line(&line);
        let events = self.store.apply(observation);

        written.map_err(|source| RoverError::Persistence {
            path: self.path.display().to_string(),
            source,
        })?;

        debug!("Appended observation at {}", observation.position);
        Ok(events)
    }

    /// Append one line, first terminating any unfinished last line
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)?;

        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                warn!("Log {} does not end with a newline, terminating last line", self.path.display());
                file.write_all(b"\n")?;
            }
        }

        file.write_all(line.as_bytes())?;
        file.flush()
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Record the latest battery level; history is only extended by `append`
    pub fn set_battery(&mut self, value: f64) {
        self.store.set_battery(value);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Feed every line of `reader` through the decoder into `store`
///
/// # Errors
///
/// Returns error only if reading fails; decode failures are counted
pub fn replay_lines<R: BufRead>(reader: R, store: &mut StateStore) -> Result<ReplayReport> {
    let mut report = ReplayReport::default();

    for (index, raw) in reader.split(b'\n').enumerate() {
        let raw = raw?;
        let line_number = index + 1;

        let line = match std::str::from_utf8(&raw) {
            Ok(line) => line,
            Err(e) => {
                warn!("Skipping log line {}: not valid UTF-8 ({})", line_number, e);
                report.failed += 1;
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match decode(line) {
            Ok(observation) => {
                store.apply(&observation);
                report.succeeded += 1;
            }
            Err(e) => {
                warn!("Skipping log line {}: {}", line_number, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
