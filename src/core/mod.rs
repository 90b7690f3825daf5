//! Core library components.
//!
//! Environment resolution, the stage drivers, publishing, bucket cleanup
//! and the sequencer that ties them together. Nothing here prints; the
//! CLI layer owns all terminal output.

pub mod cleanup;
pub mod config;
pub mod constants;
pub mod domain;
pub mod lock;
pub mod publisher;
pub mod resolver;
pub mod runner;
pub mod sequencer;
pub mod stage;
pub mod store;
