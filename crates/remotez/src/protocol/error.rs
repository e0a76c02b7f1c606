//! Packet codec errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Malformed frame: length byte {length} ({reason})")]
    MalformedFrame { length: u8, reason: &'static str },
}
