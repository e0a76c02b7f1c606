//! RemoteZ message protocol
//!
//! Framing, command registry and status taxonomy shared by every transport.

mod command;
mod error;
pub mod frame;
mod status;

pub use command::{Command, CommandFamily};
pub use error::FrameError;
pub use frame::{
    decode_request, decode_response, encode_request, encode_response, Frame, MessageKind,
    Request, Response, CHANNEL_ID, MAX_PAYLOAD, REPORT_SIZE,
};
pub use status::Status;

/// RESET mode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResetKind {
    /// Restart the application firmware
    Reboot = 0x00,
    /// Restart into the update loader
    Loader = 0x01,
    /// Power the radio and display down
    PowerOff = 0x02,
}

/// Flash regions addressed by the update family
pub mod region {
    /// Remote configuration (activities, devices, buttons)
    pub const CONFIG: u8 = 0x04;
    /// Application firmware
    pub const FIRMWARE: u8 = 0x01;
    /// Skin/display resources
    pub const SKIN: u8 = 0x02;
}

/// Erase-mode byte appended to a WRITE_MEMORY_HEADER that erases instead of writing
pub const WRITE_MODE_ERASE: u8 = 0x01;

/// CRC used by CALCULATE_CHECKSUM and GET_UPDATE_CHECKSUM
const CRC16: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_XMODEM);

/// Checksum of a byte range as the device computes it (CRC-16/XMODEM)
pub fn checksum(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}
