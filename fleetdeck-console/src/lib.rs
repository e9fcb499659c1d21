//! Fleetdeck console - client-side orchestration for a fleet of managed
//! server instances behind an HTTP control API.
//!
//! The console keeps many independently paced loops running against an
//! unreliable backend without pile-up:
//! - a global status poll that reconciles fleet snapshots into the
//!   view-model and fans out per-server work,
//! - self-throttling live-frame sessions per server and surface,
//! - an append-only console stream poll per running server,
//! - fire-and-forget / request-response command dispatch.
//!
//! Rendering is a pure projection of the [`state::FleetView`]; this crate
//! never draws anything beyond the terminal operator surface in
//! [`operator`].

pub mod commands;
pub mod config;
pub mod console;
pub mod liveview;
pub mod models;
pub mod operator;
pub mod poller;
pub mod state;
pub mod stats;
pub mod sync;
pub mod transport;
pub mod view;
