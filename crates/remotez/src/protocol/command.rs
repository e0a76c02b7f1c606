//! Command codes understood by the remote

use std::fmt;

macro_rules! commands {
    ($($(#[$meta:meta])* $name:ident = $code:literal,)+) => {
        /// Command code carried at offset 4 of every frame
        ///
        /// Commands are plain identifiers. Codes the registry does not know are
        /// preserved in [`Command::Unknown`] so they can still be sent and echoed.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Command {
            $($(#[$meta])* $name,)+
            /// Unregistered command code
            Unknown(u8),
        }

        impl From<u8> for Command {
            fn from(value: u8) -> Self {
                match value {
                    $($code => Self::$name,)+
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<Command> for u8 {
            fn from(command: Command) -> Self {
                match command {
                    $(Command::$name => $code,)+
                    Command::Unknown(v) => v,
                }
            }
        }

        impl Command {
            /// Every registered command, in code order
            pub const ALL: &'static [Command] = &[$(Command::$name,)+];

            /// Name of the command (e.g. `GetSystemInfo`)
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)+
                    Self::Unknown(_) => "UNKNOWN",
                }
            }
        }
    };
}

commands! {
    Invalid = 0x00,
    ExecuteAction = 0x01,
    ExecuteRepeatedAction = 0x02,
    ContinueRepeatedAction = 0x03,
    FinishRepeatedAction = 0x04,

    InitiateDiagnosticTcpChannel = 0x10,
    UdpEcho = 0x11,
    UdpPing = 0x12,
    TcpEcho = 0x13,
    TcpPing = 0x14,

    ReadMemoryHeader = 0x15,
    ReadMemoryData = 0x16,
    ReadMemoryDone = 0x17,
    WriteMemoryHeader = 0x18,
    WriteMemoryData = 0x19,
    WriteMemoryDone = 0x1A,
    Reset = 0x1B,
    CalculateChecksum = 0x1C,

    InitiateUpdateTcpChannel = 0x40,
    StartUpdate = 0x41,
    WriteUpdateHeader = 0x42,
    WriteUpdateData = 0x43,
    WriteUpdateDone = 0x44,
    GetUpdateChecksum = 0x45,
    FinishUpdate = 0x46,
    ReadRegion = 0x47,
    ReadRegionData = 0x48,
    ReadRegionDone = 0x49,

    StartRawIrTcpChannel = 0x50,
    CacheRawIrHeader = 0x51,
    CacheRawIrData = 0x52,
    CacheRawIrDone = 0x53,
    ExecuteRawIr = 0x54,
    StartRawIr = 0x55,
    ContinueRawIr = 0x56,
    FinishRawIr = 0x57,

    InitiateSystemTcpChannel = 0x60,
    GetSystemInfo = 0x61,
    GetInterfaceList = 0x62,
    IsInterfaceSupported = 0x65,
    GetGuid = 0x67,
    SetGuid = 0x68,
    GetName = 0x6A,
    SetName = 0x6B,
    GetLocation = 0x6C,
    SetLocation = 0x6D,
    GetCurrentTime = 0x70,
    UpdateTime = 0x71,

    InitiateZwaveTcpChannel = 0x80,
    SendLongZwaveRequestHeader = 0x81,
    SendLongZwaveRequestData = 0x82,
    SendLongZwaveRequestDataDone = 0x83,
    SendShortZwaveRequest = 0x84,
    SendShortZwaveResponse = 0x85,
    SetNodeId = 0x86,
    GetNodeId = 0x87,
    GetHomeId = 0x88,
    SetHomeId = 0x89,
    SendLongZwaveResponseHeader = 0x8A,
    SendLongZwaveResponseData = 0x8B,
    SendLongZwaveResponseDataDone = 0x8C,

    InitiateLearnIrTcpChannel = 0xA0,
    LearnIr = 0xA1,
    LearnIrHeader = 0xA2,
    LearnIrData = 0xA3,
    LearnIrDone = 0xA4,
    LearnIrStop = 0xA5,
}

/// Subsystem a command belongs to, derived from its code range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandFamily {
    /// Action execution (0x01-0x04)
    Action,
    /// Echo/ping and diagnostic channel setup (0x10-0x14)
    Diagnostics,
    /// Flash memory access, reset and checksum (0x15-0x1C)
    Memory,
    /// Firmware/config update and region read-back (0x40-0x49)
    Update,
    /// Raw IR caching and playback (0x50-0x57)
    RawIr,
    /// System information, identity, name and clock (0x60-0x7F)
    System,
    /// Z-Wave mesh administration (0x80-0x8C)
    Zwave,
    /// IR learning (0xA0-0xA5)
    LearnIr,
    /// Outside every known range
    Unassigned,
}

impl CommandFamily {
    /// Classify a raw command code
    pub fn of(code: u8) -> Self {
        match code {
            0x01..=0x04 => Self::Action,
            0x10..=0x14 => Self::Diagnostics,
            0x15..=0x1C => Self::Memory,
            0x40..=0x49 => Self::Update,
            0x50..=0x57 => Self::RawIr,
            0x60..=0x7F => Self::System,
            0x80..=0x8C => Self::Zwave,
            0xA0..=0xA5 => Self::LearnIr,
            _ => Self::Unassigned,
        }
    }
}

impl Command {
    /// Family this command belongs to
    pub fn family(&self) -> CommandFamily {
        CommandFamily::of((*self).into())
    }

    /// Raw code byte
    pub fn code(&self) -> u8 {
        (*self).into()
    }
}

impl fmt::UpperHex for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.code(), f)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(v) => write!(f, "UNKNOWN(0x{:02X})", v),
            other => f.write_str(other.name()),
        }
    }
}
