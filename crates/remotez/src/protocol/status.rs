//! Response status codes

use std::fmt;

/// Status byte carried at offset 5 of every response
///
/// Only [`Status::Ok`] means success. Everything else ends the operation that
/// received it and is handed to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Null = 0x00,
    Ok = 0x01,
    Busy = 0x02,
    BadVersion = 0x03,
    UnknownHandle = 0x04,
    UnknownAction = 0x05,
    AlreadyAborted = 0x06,
    NoMoreData = 0x07,
    InvalidAddress = 0x08,
    InvalidTcpCommand = 0x09,
    BadDataLength = 0x0A,
    BadRegion = 0x0B,
    InvalidArgument = 0x0C,
    DeviceNotReady = 0x0D,
    InvalidResponse = 0x0E,

    /// Unknown/reserved status
    Unknown(u8),
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Null,
            0x01 => Self::Ok,
            0x02 => Self::Busy,
            0x03 => Self::BadVersion,
            0x04 => Self::UnknownHandle,
            0x05 => Self::UnknownAction,
            0x06 => Self::AlreadyAborted,
            0x07 => Self::NoMoreData,
            0x08 => Self::InvalidAddress,
            0x09 => Self::InvalidTcpCommand,
            0x0A => Self::BadDataLength,
            0x0B => Self::BadRegion,
            0x0C => Self::InvalidArgument,
            0x0D => Self::DeviceNotReady,
            0x0E => Self::InvalidResponse,
            other => Self::Unknown(other),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        match status {
            Status::Null => 0x00,
            Status::Ok => 0x01,
            Status::Busy => 0x02,
            Status::BadVersion => 0x03,
            Status::UnknownHandle => 0x04,
            Status::UnknownAction => 0x05,
            Status::AlreadyAborted => 0x06,
            Status::NoMoreData => 0x07,
            Status::InvalidAddress => 0x08,
            Status::InvalidTcpCommand => 0x09,
            Status::BadDataLength => 0x0A,
            Status::BadRegion => 0x0B,
            Status::InvalidArgument => 0x0C,
            Status::DeviceNotReady => 0x0D,
            Status::InvalidResponse => 0x0E,
            Status::Unknown(v) => v,
        }
    }
}

impl Status {
    pub fn is_ok(&self) -> bool {
        *self == Self::Ok
    }

    /// Whether a caller may reasonably repeat the request later
    ///
    /// Nothing in this crate acts on this; it is a hint for callers that layer
    /// their own retry policy on top.
    pub fn is_retryable(&self) -> bool {
        *self == Self::Busy
    }

    /// End-of-data marker used by read transfers of unknown length
    pub fn is_end_of_data(&self) -> bool {
        *self == Self::NoMoreData
    }
}

impl fmt::UpperHex for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value: u8 = (*self).into();
        fmt::UpperHex::fmt(&value, f)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Ok => write!(f, "Ok"),
            Self::Busy => write!(f, "Busy"),
            Self::BadVersion => write!(f, "BadVersion"),
            Self::UnknownHandle => write!(f, "UnknownHandle"),
            Self::UnknownAction => write!(f, "UnknownAction"),
            Self::AlreadyAborted => write!(f, "AlreadyAborted"),
            Self::NoMoreData => write!(f, "NoMoreData"),
            Self::InvalidAddress => write!(f, "InvalidAddress"),
            Self::InvalidTcpCommand => write!(f, "InvalidTcpCommand"),
            Self::BadDataLength => write!(f, "BadDataLength"),
            Self::BadRegion => write!(f, "BadRegion"),
            Self::InvalidArgument => write!(f, "InvalidArgument"),
            Self::DeviceNotReady => write!(f, "DeviceNotReady"),
            Self::InvalidResponse => write!(f, "InvalidResponse"),
            Self::Unknown(v) => write!(f, "Unknown(0x{:02X})", v),
        }
    }
}
