//! Transport layer for RemoteZ communication
//!
//! This module provides links for talking to a remote:
//! - Report link for the local HID channel (one report per frame)
//! - TCP link for the network channel (length-delimited frames)
//! - Mock link for testing
//!
//! # Example
//!
//! ```ignore
//! use remotez::transport::{create_link, Link};
//! use remotez::config::TransportConfig;
//!
//! let config = TransportConfig::Mock(Default::default());
//! let mut link = create_link(&config).await?;
//! let response = link.exchange(Command::UdpPing, &[]).await?;
//! ```

mod adapter;
pub mod error;
pub mod mock;
pub mod report;
pub mod tcp;

pub use adapter::Link;
pub use error::TransportError;
pub use mock::MockLink;
pub use report::{HidrawDevice, ReportIo, ReportLink};
pub use tcp::TcpLink;

use crate::config::TransportConfig;

/// Create a link based on configuration
pub async fn create_link(config: &TransportConfig) -> Result<Box<dyn Link>, TransportError> {
    match config {
        TransportConfig::Hid(cfg) => {
            let link = report::open_hidraw(cfg).await?;
            Ok(Box::new(link))
        }
        TransportConfig::Tcp(cfg) => {
            let link = TcpLink::connect(cfg).await?;
            Ok(Box::new(link))
        }
        TransportConfig::Mock(cfg) => Ok(Box::new(MockLink::new(cfg))),
    }
}
