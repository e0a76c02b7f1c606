//! remotez - protocol layer for RemoteZ universal remotes
//!
//! This crate talks to a programmable universal remote over either its local
//! HID report channel or its network channel. Every request and response fits
//! one small frame, so bulk operations run through a segmented
//! header/data/done transfer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RemoteDevice                            │
//! │  identity, clock, flash, update, IR, Z-Wave                 │
//! │                                                             │
//! │        ┌──────────────────┐      ┌──────────────────┐       │
//! │        │ single exchange  │      │ Transfer engine  │       │
//! │        │ (request/reply)  │      │ header/data/done │       │
//! │        └────────┬─────────┘      └────────┬─────────┘       │
//! │                 └────────────┬────────────┘                 │
//! │                        ┌─────┴─────┐                        │
//! │                        │   Link    │                        │
//! │                        │(HID/TCP/  │                        │
//! │                        │  mock)    │                        │
//! │                        └─────┬─────┘                        │
//! │                        ┌─────┴─────┐                        │
//! │                        │  Codec    │                        │
//! │                        │ 68-byte   │                        │
//! │                        │  frames   │                        │
//! │                        └───────────┘                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use remotez::{create_link, RemoteConfig, RemoteDevice};
//!
//! let config = RemoteConfig::load("remote.toml")?;
//! let link = create_link(&config.transport).await?;
//! let mut remote = RemoteDevice::from_boxed(link).with_transfer_config(&config.transfer);
//! let identity = remote.get_identity().await?;
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod transfer;
pub mod transport;

pub use config::{ConfigError, RemoteConfig, TransportConfig};
pub use device::{DeviceIdentity, DeviceTime, FlashChip, FlashRegion, RemoteDevice};
pub use error::RemoteError;
pub use protocol::{Command, CommandFamily, ResetKind, Status};
pub use transfer::{Transfer, TransferFamily, TransferSession, TransferState};
pub use transport::{create_link, Link, MockLink, TcpLink, TransportError};
