//! # Rover Telemetry Library
//!
//! Poll a mobile rover over HTTP and keep a durable record of where it went
//! and what it sensed.
//!
//! This library provides the telemetry state-tracking and persistence engine:
//! a line-oriented log codec, an in-memory state store, an append-only log
//! with replay, a client boundary for the remote rover API and the control
//! loop that ties them together.

pub mod config;
pub mod error;
pub mod codec;
pub mod state;
pub mod persistence;
pub mod client;
pub mod control;
