//! Segmented transfer engine
//!
//! Bulk data that does not fit one frame moves through a three-phase
//! exchange: a HEADER request opens a session, DATA requests move up to one
//! frame payload each, and a DONE request closes it. Every bulk operation
//! (memory, firmware update, raw IR, long Z-Wave messages, IR capture) uses
//! the same state machine with its own command triple.

mod engine;

pub use engine::{Transfer, TransferSession, TransferState};
pub(crate) use engine::exchange_echoed;

use crate::protocol::Command;

/// Which way the data flows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device to host; DATA replies carry the bytes
    Read,
    /// Host to device; DATA requests carry the bytes
    Write,
}

/// Command triple of one transfer family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferFamily {
    pub name: &'static str,
    pub direction: Direction,
    pub header: Command,
    pub data: Command,
    pub done: Command,
}

impl TransferFamily {
    pub const MEMORY_READ: Self = Self {
        name: "memory-read",
        direction: Direction::Read,
        header: Command::ReadMemoryHeader,
        data: Command::ReadMemoryData,
        done: Command::ReadMemoryDone,
    };

    pub const MEMORY_WRITE: Self = Self {
        name: "memory-write",
        direction: Direction::Write,
        header: Command::WriteMemoryHeader,
        data: Command::WriteMemoryData,
        done: Command::WriteMemoryDone,
    };

    pub const UPDATE_WRITE: Self = Self {
        name: "update-write",
        direction: Direction::Write,
        header: Command::WriteUpdateHeader,
        data: Command::WriteUpdateData,
        done: Command::WriteUpdateDone,
    };

    pub const REGION_READ: Self = Self {
        name: "region-read",
        direction: Direction::Read,
        header: Command::ReadRegion,
        data: Command::ReadRegionData,
        done: Command::ReadRegionDone,
    };

    pub const RAW_IR_CACHE: Self = Self {
        name: "raw-ir-cache",
        direction: Direction::Write,
        header: Command::CacheRawIrHeader,
        data: Command::CacheRawIrData,
        done: Command::CacheRawIrDone,
    };

    pub const ZWAVE_REQUEST: Self = Self {
        name: "zwave-request",
        direction: Direction::Write,
        header: Command::SendLongZwaveRequestHeader,
        data: Command::SendLongZwaveRequestData,
        done: Command::SendLongZwaveRequestDataDone,
    };

    pub const ZWAVE_RESPONSE: Self = Self {
        name: "zwave-response",
        direction: Direction::Write,
        header: Command::SendLongZwaveResponseHeader,
        data: Command::SendLongZwaveResponseData,
        done: Command::SendLongZwaveResponseDataDone,
    };

    pub const LEARN_IR: Self = Self {
        name: "learn-ir",
        direction: Direction::Read,
        header: Command::LearnIrHeader,
        data: Command::LearnIrData,
        done: Command::LearnIrDone,
    };

    /// Every family, for lookups by header command
    pub const ALL: [Self; 8] = [
        Self::MEMORY_READ,
        Self::MEMORY_WRITE,
        Self::UPDATE_WRITE,
        Self::REGION_READ,
        Self::RAW_IR_CACHE,
        Self::ZWAVE_REQUEST,
        Self::ZWAVE_RESPONSE,
        Self::LEARN_IR,
    ];

    /// Family whose HEADER, DATA or DONE is `command`
    pub fn for_command(command: Command) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.header == command || f.data == command || f.done == command)
    }
}

/// HEADER payload addressing a memory range: address u32 LE, length u32 LE
pub fn range_header(address: u32, length: u32) -> Vec<u8> {
    let mut payload = Vec::with_capacity(8);
    payload.extend_from_slice(&address.to_le_bytes());
    payload.extend_from_slice(&length.to_le_bytes());
    payload
}

/// HEADER payload declaring only a total length, u32 LE
pub fn length_header(length: u32) -> Vec<u8> {
    length.to_le_bytes().to_vec()
}

/// Inverse of [`range_header`]
pub fn parse_range_header(payload: &[u8]) -> Option<(u32, u32)> {
    let address = u32::from_le_bytes(payload.get(0..4)?.try_into().ok()?);
    let length = u32::from_le_bytes(payload.get(4..8)?.try_into().ok()?);
    Some((address, length))
}
