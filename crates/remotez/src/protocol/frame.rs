//! Frame encoding and decoding.
//!
//! Every exchange is one fixed 68-byte report:
//! ```text
//! ┌──────────┬────────┬─────────┬──────┬─────────┬──────────────────────────┐
//! │ reserved │ length │ channel │ kind │ command │ request:  payload[0..60] │
//! │  (0)     │        │  (1)    │ 0/1  │         │ response: status payload │
//! └──────────┴────────┴─────────┴──────┴─────────┴──────────────────────────┘
//!   offset 0   1        2         3      4         5..
//! ```
//!
//! The length byte counts every byte after itself: `3 + payload` for a request,
//! `4 + payload` for a response.

use std::fmt;

use super::{Command, FrameError, Status};

/// Size of one report on the local channel
pub const REPORT_SIZE: usize = 68;

/// Largest payload one frame can carry
pub const MAX_PAYLOAD: usize = 60;

/// Channel id marking the message channel (as opposed to raw HID traffic)
pub const CHANNEL_ID: u8 = 1;

/// Bytes counted by the length byte ahead of a request payload
pub const REQUEST_HEADER_LEN: u8 = 3;

/// Bytes counted by the length byte ahead of a response payload
pub const RESPONSE_HEADER_LEN: u8 = 4;

/// Largest value a length byte may hold without running past the report
pub const MAX_LENGTH_BYTE: u8 = (REPORT_SIZE - 2) as u8;

pub(crate) const OFFSET_LENGTH: usize = 1;
const OFFSET_CHANNEL: usize = 2;
const OFFSET_KIND: usize = 3;
const OFFSET_COMMAND: usize = 4;
const OFFSET_STATUS: usize = 5;
const OFFSET_REQUEST_PAYLOAD: usize = 5;
const OFFSET_RESPONSE_PAYLOAD: usize = 6;

/// Message kind byte (offset 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Request = 0,
    Response = 1,
}

impl MessageKind {
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Request),
            1 => Some(Self::Response),
            _ => None,
        }
    }
}

/// One fixed-size report as it travels over the wire
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    buf: [u8; REPORT_SIZE],
}

impl Frame {
    fn empty() -> Self {
        Self {
            buf: [0; REPORT_SIZE],
        }
    }

    /// Wrap a report read from the device
    pub fn from_report(report: [u8; REPORT_SIZE]) -> Self {
        Self { buf: report }
    }

    /// Rebuild a report from its stream form (length byte plus body)
    ///
    /// Fails when the body cannot fit into one report.
    pub fn from_stream_parts(length: u8, body: &[u8]) -> Result<Self, FrameError> {
        if length > MAX_LENGTH_BYTE || body.len() != length as usize {
            return Err(FrameError::MalformedFrame {
                length,
                reason: "does not fit one report",
            });
        }
        let mut frame = Self::empty();
        frame.buf[OFFSET_LENGTH] = length;
        frame.buf[OFFSET_CHANNEL..OFFSET_CHANNEL + body.len()].copy_from_slice(body);
        Ok(frame)
    }

    /// The full report buffer
    pub fn as_report(&self) -> &[u8; REPORT_SIZE] {
        &self.buf
    }

    pub fn length(&self) -> u8 {
        self.buf[OFFSET_LENGTH]
    }

    pub fn channel(&self) -> u8 {
        self.buf[OFFSET_CHANNEL]
    }

    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::from_byte(self.buf[OFFSET_KIND])
    }

    pub fn command(&self) -> Command {
        Command::from(self.buf[OFFSET_COMMAND])
    }

    /// Length byte followed by the bytes it counts
    ///
    /// This is the delimited form used on byte streams.
    pub fn stream_bytes(&self) -> &[u8] {
        let end = (OFFSET_LENGTH + 1 + self.length() as usize).min(REPORT_SIZE);
        &self.buf[OFFSET_LENGTH..end]
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("bytes", &hex::encode(self.stream_bytes()))
            .finish()
    }
}

/// A decoded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub kind: MessageKind,
    pub command: Command,
    pub payload: Vec<u8>,
}

/// A decoded response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Command the device is answering
    pub command: Command,
    pub status: Status,
    pub payload: Vec<u8>,
}

fn check_payload(payload: &[u8]) -> Result<(), FrameError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    Ok(())
}

fn check_length(length: u8, header_len: u8) -> Result<usize, FrameError> {
    if length < header_len {
        return Err(FrameError::MalformedFrame {
            length,
            reason: "shorter than header",
        });
    }
    if length > MAX_LENGTH_BYTE {
        return Err(FrameError::MalformedFrame {
            length,
            reason: "runs past end of report",
        });
    }
    let payload_len = (length - header_len) as usize;
    if payload_len > MAX_PAYLOAD {
        return Err(FrameError::MalformedFrame {
            length,
            reason: "payload exceeds frame limit",
        });
    }
    Ok(payload_len)
}

/// Encode a request frame
pub fn encode_request(
    kind: MessageKind,
    command: Command,
    payload: &[u8],
) -> Result<Frame, FrameError> {
    check_payload(payload)?;

    let mut frame = Frame::empty();
    frame.buf[OFFSET_LENGTH] = REQUEST_HEADER_LEN + payload.len() as u8;
    frame.buf[OFFSET_CHANNEL] = CHANNEL_ID;
    frame.buf[OFFSET_KIND] = kind as u8;
    frame.buf[OFFSET_COMMAND] = command.into();
    frame.buf[OFFSET_REQUEST_PAYLOAD..OFFSET_REQUEST_PAYLOAD + payload.len()]
        .copy_from_slice(payload);
    Ok(frame)
}

/// Decode a response frame into status and payload
pub fn decode_response(frame: &Frame) -> Result<Response, FrameError> {
    let len = check_length(frame.length(), RESPONSE_HEADER_LEN)?;
    let start = OFFSET_RESPONSE_PAYLOAD;

    Ok(Response {
        command: frame.command(),
        status: Status::from(frame.buf[OFFSET_STATUS]),
        payload: frame.buf[start..start + len].to_vec(),
    })
}

/// Encode a response frame (device side)
pub fn encode_response(
    command: Command,
    status: Status,
    payload: &[u8],
) -> Result<Frame, FrameError> {
    check_payload(payload)?;

    let mut frame = Frame::empty();
    frame.buf[OFFSET_LENGTH] = RESPONSE_HEADER_LEN + payload.len() as u8;
    frame.buf[OFFSET_CHANNEL] = CHANNEL_ID;
    frame.buf[OFFSET_KIND] = MessageKind::Response as u8;
    frame.buf[OFFSET_COMMAND] = command.into();
    frame.buf[OFFSET_STATUS] = status.into();
    frame.buf[OFFSET_RESPONSE_PAYLOAD..OFFSET_RESPONSE_PAYLOAD + payload.len()]
        .copy_from_slice(payload);
    Ok(frame)
}

/// Decode a request frame (device side)
///
/// An unrecognised kind byte is read as a request.
pub fn decode_request(frame: &Frame) -> Result<Request, FrameError> {
    let len = check_length(frame.length(), REQUEST_HEADER_LEN)?;
    let start = OFFSET_REQUEST_PAYLOAD;

    Ok(Request {
        kind: frame.kind().unwrap_or(MessageKind::Request),
        command: frame.command(),
        payload: frame.buf[start..start + len].to_vec(),
    })
}
