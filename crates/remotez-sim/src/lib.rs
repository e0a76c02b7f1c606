//! remotez-sim - simulated RemoteZ remote
//!
//! Provides an in-memory remote that speaks the RemoteZ protocol over the
//! network channel, for exercising `remotez` without hardware.
//!
//! # Modules
//!
//! - [`config`] - Identity, clock and flash settings (TOML)
//! - [`remote`] - Device state and request handling
//! - [`server`] - TCP accept loop

pub mod config;
pub mod remote;
pub mod server;

pub use config::SimConfig;
pub use remote::SimulatedRemote;
pub use server::SimServer;
