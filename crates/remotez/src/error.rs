//! Device operation errors

use thiserror::Error;

use crate::protocol::{Command, FrameError, Status};
use crate::transport::TransportError;

#[derive(Debug, Error, Clone)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(TransportError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// The device answered with something other than OK
    #[error("Device rejected {command}: {status} (0x{status:02X})")]
    Status { command: Command, status: Status },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Transfer overrun: {attempted} bytes past {transferred}/{declared}")]
    TransferOverrun {
        declared: usize,
        transferred: usize,
        attempted: usize,
    },

    #[error("Transfer incomplete: {transferred}/{declared} bytes")]
    TransferIncomplete { declared: usize, transferred: usize },

    #[error("Transfer not active: {0}")]
    TransferState(String),

    #[error("Read-back differs at offset {offset}")]
    VerifyMismatch { offset: usize },

    #[error("Checksum mismatch: device 0x{device:04X}, expected 0x{expected:04X}")]
    ChecksumMismatch { device: u16, expected: u16 },
}

impl RemoteError {
    /// True when the device reported BUSY
    ///
    /// Nothing retries internally; callers decide whether to try again.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Status { status, .. } if status.is_retryable())
    }

    /// Device status carried by this error, if any
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for RemoteError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Frame(frame) => Self::Frame(frame),
            other => Self::Transport(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_errors_are_lifted_out_of_transport() {
        let err: RemoteError = TransportError::Frame(FrameError::MalformedFrame {
            length: 2,
            reason: "too short",
        })
        .into();
        assert!(matches!(err, RemoteError::Frame(_)));

        let err: RemoteError = TransportError::ConnectionClosed.into();
        assert!(matches!(err, RemoteError::Transport(_)));
    }

    #[test]
    fn test_busy_detection() {
        let busy = RemoteError::Status {
            command: Command::WriteMemoryData,
            status: Status::Busy,
        };
        assert!(busy.is_busy());
        assert_eq!(busy.status(), Some(Status::Busy));

        let bad = RemoteError::Status {
            command: Command::WriteMemoryData,
            status: Status::InvalidAddress,
        };
        assert!(!bad.is_busy());
    }

    #[test]
    fn test_status_message() {
        let err = RemoteError::Status {
            command: Command::GetGuid,
            status: Status::DeviceNotReady,
        };
        assert!(err.to_string().contains("0x0D"));
    }
}
