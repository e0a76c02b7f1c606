//! Simulated remote
//!
//! Holds the device state and answers one decoded request at a time. All
//! state sits behind `parking_lot` locks so several connections can share one
//! remote; each request is handled without awaiting.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use parking_lot::{Mutex, RwLock};
use remotez::device::DeviceTime;
use remotez::protocol::{
    self, checksum, region, Command, Frame, FrameError, Request, ResetKind, Status, MAX_PAYLOAD,
    WRITE_MODE_ERASE,
};
use remotez::transfer::{parse_range_header, TransferFamily};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SimConfig;

/// Handle the simulator hands out for region reads
const REGION_HANDLE: u8 = 0x01;

/// Erased flash value
const ERASED: u8 = 0xFF;

type Reply = (Status, Vec<u8>);

fn ok(payload: Vec<u8>) -> Reply {
    (Status::Ok, payload)
}

fn fail(status: Status) -> Reply {
    (status, Vec::new())
}

/// Where a finished write transfer lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteTarget {
    Memory(u32),
    Update(u8),
    RawIr,
    Zwave,
}

/// Open transfer on the device side
#[derive(Debug)]
enum Session {
    Write {
        family: TransferFamily,
        target: WriteTarget,
        declared: usize,
        buffer: Vec<u8>,
    },
    Read {
        family: TransferFamily,
        data: Vec<u8>,
        pos: usize,
    },
}

#[derive(Debug)]
struct UpdateState {
    region: u8,
    staged: Option<Vec<u8>>,
}

struct Clock {
    /// Wall-clock value at `set_at`
    base: DateTime<FixedOffset>,
    set_at: Instant,
    timezone: String,
}

impl Clock {
    fn now(&self) -> DateTime<FixedOffset> {
        let elapsed = Duration::from_std(self.set_at.elapsed()).unwrap_or_else(|_| Duration::zero());
        self.base + elapsed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ZwaveIds {
    node_id: u8,
    home_id: u32,
}

/// A RemoteZ device living in memory
pub struct SimulatedRemote {
    config: SimConfig,
    serial: RwLock<Uuid>,
    name: RwLock<String>,
    location: RwLock<String>,
    clock: RwLock<Clock>,
    flash: RwLock<Vec<u8>>,
    regions: RwLock<HashMap<u8, Vec<u8>>>,
    session: Mutex<Option<Session>>,
    update: Mutex<Option<UpdateState>>,
    raw_ir: RwLock<Option<Vec<u8>>>,
    ir_executions: Mutex<u32>,
    learning: Mutex<bool>,
    zwave: RwLock<ZwaveIds>,
    zwave_messages: Mutex<Vec<(Command, Vec<u8>)>>,
    last_reset: Mutex<Option<ResetKind>>,
    injected: Mutex<HashMap<Command, Status>>,
}

impl SimulatedRemote {
    pub fn new(config: SimConfig) -> Self {
        let offset = FixedOffset::east_opt(i32::from(config.clock.utc_offset) * 60)
            .unwrap_or(Utc.fix());
        let clock = Clock {
            base: Utc::now().with_timezone(&offset),
            set_at: Instant::now(),
            timezone: config.clock.timezone.clone(),
        };

        let regions = [region::CONFIG, region::FIRMWARE, region::SKIN]
            .into_iter()
            .map(|r| (r, Vec::new()))
            .collect();

        Self {
            serial: RwLock::new(config.identity.serial),
            name: RwLock::new(config.name.clone()),
            location: RwLock::new(config.location.clone()),
            clock: RwLock::new(clock),
            flash: RwLock::new(vec![ERASED; config.flash_size]),
            regions: RwLock::new(regions),
            session: Mutex::new(None),
            update: Mutex::new(None),
            raw_ir: RwLock::new(None),
            ir_executions: Mutex::new(0),
            learning: Mutex::new(false),
            zwave: RwLock::new(ZwaveIds::default()),
            zwave_messages: Mutex::new(Vec::new()),
            last_reset: Mutex::new(None),
            injected: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Answer the next `command` with `status` instead of handling it
    pub fn inject_status(&self, command: Command, status: Status) {
        self.injected.lock().insert(command, status);
    }

    /// Copy of flash content
    pub fn flash_snapshot(&self, address: usize, length: usize) -> Option<Vec<u8>> {
        self.flash.read().get(address..address + length).map(<[u8]>::to_vec)
    }

    pub fn region_content(&self, region: u8) -> Option<Vec<u8>> {
        self.regions.read().get(&region).cloned()
    }

    pub fn cached_raw_ir(&self) -> Option<Vec<u8>> {
        self.raw_ir.read().clone()
    }

    pub fn ir_executions(&self) -> u32 {
        *self.ir_executions.lock()
    }

    pub fn is_learning(&self) -> bool {
        *self.learning.lock()
    }

    /// Z-Wave messages received so far, tagged with the command that completed them
    pub fn zwave_messages(&self) -> Vec<(Command, Vec<u8>)> {
        self.zwave_messages.lock().clone()
    }

    pub fn last_reset(&self) -> Option<ResetKind> {
        *self.last_reset.lock()
    }

    /// Decode a request frame and encode the reply
    ///
    /// A request too short to carry its header is still answered, with
    /// `BAD_DATA_LENGTH` against whatever command byte it holds.
    pub fn handle_frame(&self, frame: &Frame) -> Result<Frame, FrameError> {
        let request = match protocol::decode_request(frame) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Malformed request");
                return protocol::encode_response(frame.command(), Status::BadDataLength, &[]);
            }
        };
        let (status, payload) = self.process_request(&request);
        protocol::encode_response(request.command, status, &payload)
    }

    /// Handle one request
    pub fn process_request(&self, request: &Request) -> (Status, Vec<u8>) {
        let command = request.command;
        let payload = request.payload.as_slice();

        if let Some(status) = self.injected.lock().remove(&command) {
            info!(%command, %status, "Injected status");
            return fail(status);
        }

        let (status, reply) = match command {
            Command::UdpPing | Command::TcpPing => ok(Vec::new()),
            Command::UdpEcho | Command::TcpEcho => ok(payload.to_vec()),
            Command::Reset => self.handle_reset(payload),

            Command::GetSystemInfo => ok(self.system_info()),
            Command::GetGuid => ok(self.serial.read().to_bytes_le().to_vec()),
            Command::SetGuid => self.handle_set_guid(payload),
            Command::GetName => ok(c_string(&self.name.read())),
            Command::SetName => set_string(&self.name, payload),
            Command::GetLocation => ok(c_string(&self.location.read())),
            Command::SetLocation => set_string(&self.location, payload),
            Command::GetCurrentTime => self.handle_get_time(),
            Command::UpdateTime => self.handle_update_time(payload),
            Command::GetInterfaceList => ok(supported_commands().iter().map(|c| c.code()).collect()),
            Command::IsInterfaceSupported => match payload.first() {
                Some(&code) => ok(vec![supported_commands().contains(&Command::from(code)) as u8]),
                None => fail(Status::BadDataLength),
            },

            Command::ReadMemoryHeader => self.handle_read_memory_header(payload),
            Command::WriteMemoryHeader => self.handle_write_memory_header(payload),
            Command::CalculateChecksum => self.handle_calculate_checksum(payload),

            Command::StartUpdate => self.handle_start_update(payload),
            Command::WriteUpdateHeader => self.handle_write_update_header(payload),
            Command::GetUpdateChecksum => self.handle_update_checksum(payload),
            Command::FinishUpdate => self.handle_finish_update(payload),
            Command::ReadRegion => self.handle_read_region(payload),

            Command::CacheRawIrHeader => {
                self.open_write(TransferFamily::RAW_IR_CACHE, WriteTarget::RawIr, payload)
            }
            Command::ExecuteRawIr => self.handle_execute_raw_ir(),

            Command::LearnIr => {
                *self.learning.lock() = true;
                info!("IR learning armed");
                ok(Vec::new())
            }
            Command::LearnIrHeader => self.handle_learn_header(),
            Command::LearnIrStop => {
                *self.learning.lock() = false;
                ok(Vec::new())
            }

            Command::SendShortZwaveRequest | Command::SendShortZwaveResponse => {
                self.zwave_messages.lock().push((command, payload.to_vec()));
                ok(Vec::new())
            }
            Command::SendLongZwaveRequestHeader => {
                self.open_write(TransferFamily::ZWAVE_REQUEST, WriteTarget::Zwave, payload)
            }
            Command::SendLongZwaveResponseHeader => {
                self.open_write(TransferFamily::ZWAVE_RESPONSE, WriteTarget::Zwave, payload)
            }
            Command::GetNodeId => ok(vec![self.zwave.read().node_id]),
            Command::SetNodeId => match payload.first() {
                Some(&id) => {
                    self.zwave.write().node_id = id;
                    ok(Vec::new())
                }
                None => fail(Status::BadDataLength),
            },
            Command::GetHomeId => ok(self.zwave.read().home_id.to_le_bytes().to_vec()),
            Command::SetHomeId => match payload.get(0..4) {
                Some(b) => {
                    self.zwave.write().home_id = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                    ok(Vec::new())
                }
                None => fail(Status::BadDataLength),
            },

            other => match TransferFamily::for_command(other) {
                Some(family) if other == family.data => self.handle_data(family, payload),
                Some(family) if other == family.done => self.handle_done(family),
                _ => {
                    debug!(command = %other, "Unsupported command");
                    fail(Status::InvalidTcpCommand)
                }
            },
        };

        debug!(
            %command,
            %status,
            request = %hex::encode(payload),
            reply = %hex::encode(&reply),
            "Handled request"
        );
        (status, reply)
    }

    fn system_info(&self) -> Vec<u8> {
        let id = &self.config.identity;
        let hw = (id.hw_major << 4) | u16::from(id.hw_minor & 0x0F);

        let mut p = Vec::with_capacity(15);
        p.extend_from_slice(&id.usb_vid.to_le_bytes());
        p.extend_from_slice(&id.usb_pid.to_le_bytes());
        p.extend_from_slice(&id.architecture.to_le_bytes());
        p.extend_from_slice(&id.fw_major.to_le_bytes());
        p.extend_from_slice(&id.fw_minor.to_le_bytes());
        p.push(id.fw_type);
        p.extend_from_slice(&id.skin.to_le_bytes());
        p.extend_from_slice(&hw.to_le_bytes());
        p
    }

    fn handle_reset(&self, payload: &[u8]) -> Reply {
        let kind = match payload.first() {
            Some(0x00) => ResetKind::Reboot,
            Some(0x01) => ResetKind::Loader,
            Some(0x02) => ResetKind::PowerOff,
            Some(_) => return fail(Status::InvalidArgument),
            None => return fail(Status::BadDataLength),
        };
        info!(?kind, "Reset requested");
        *self.last_reset.lock() = Some(kind);
        *self.session.lock() = None;
        ok(Vec::new())
    }

    fn handle_set_guid(&self, payload: &[u8]) -> Reply {
        let Some(bytes) = payload.get(0..16) else {
            return fail(Status::BadDataLength);
        };
        let mut le = [0u8; 16];
        le.copy_from_slice(bytes);
        *self.serial.write() = Uuid::from_bytes_le(le);
        ok(Vec::new())
    }

    fn handle_get_time(&self) -> Reply {
        let clock = self.clock.read();
        let time = DeviceTime::from_datetime(&clock.now(), clock.timezone.clone());
        match time.encode() {
            Ok(payload) => ok(payload),
            Err(e) => {
                warn!(error = %e, "Clock does not fit a frame");
                fail(Status::DeviceNotReady)
            }
        }
    }

    fn handle_update_time(&self, payload: &[u8]) -> Reply {
        let time = match DeviceTime::decode(payload) {
            Ok(t) => t,
            Err(_) => return fail(Status::BadDataLength),
        };
        let base = match time.to_datetime() {
            Ok(dt) => dt,
            Err(_) => return fail(Status::InvalidArgument),
        };
        info!(%base, timezone = %time.timezone, "Clock set");
        *self.clock.write() = Clock {
            base,
            set_at: Instant::now(),
            timezone: time.timezone,
        };
        ok(Vec::new())
    }

    fn flash_range(&self, payload: &[u8]) -> Result<(usize, usize), Status> {
        let (address, length) = parse_range_header(payload).ok_or(Status::BadDataLength)?;
        let (address, length) = (address as usize, length as usize);
        let end = address.checked_add(length).ok_or(Status::InvalidAddress)?;
        if end > self.flash.read().len() {
            return Err(Status::InvalidAddress);
        }
        Ok((address, length))
    }

    fn handle_read_memory_header(&self, payload: &[u8]) -> Reply {
        let (address, length) = match self.flash_range(payload) {
            Ok(r) => r,
            Err(status) => return fail(status),
        };
        let data = self.flash.read()[address..address + length].to_vec();
        self.open_read(TransferFamily::MEMORY_READ, data, Vec::new())
    }

    fn handle_write_memory_header(&self, payload: &[u8]) -> Reply {
        let (address, length) = match self.flash_range(payload) {
            Ok(r) => r,
            Err(status) => return fail(status),
        };

        match payload.get(8) {
            None => {
                *self.session.lock() = Some(Session::Write {
                    family: TransferFamily::MEMORY_WRITE,
                    target: WriteTarget::Memory(address as u32),
                    declared: length,
                    buffer: Vec::with_capacity(length),
                });
                ok(Vec::new())
            }
            Some(&WRITE_MODE_ERASE) => {
                self.flash.write()[address..address + length].fill(ERASED);
                info!(address, length, "Flash erased");
                ok(Vec::new())
            }
            Some(_) => fail(Status::InvalidArgument),
        }
    }

    fn handle_calculate_checksum(&self, payload: &[u8]) -> Reply {
        match self.flash_range(payload) {
            Ok((address, length)) => {
                let crc = checksum(&self.flash.read()[address..address + length]);
                ok(crc.to_le_bytes().to_vec())
            }
            Err(status) => fail(status),
        }
    }

    fn known_region(&self, payload: &[u8]) -> Result<u8, Status> {
        let region = *payload.first().ok_or(Status::BadDataLength)?;
        if self.regions.read().contains_key(&region) {
            Ok(region)
        } else {
            Err(Status::BadRegion)
        }
    }

    fn handle_start_update(&self, payload: &[u8]) -> Reply {
        let region = match self.known_region(payload) {
            Ok(r) => r,
            Err(status) => return fail(status),
        };
        // Starting an update invalidates what the region held
        if let Some(content) = self.regions.write().get_mut(&region) {
            content.clear();
        }
        *self.update.lock() = Some(UpdateState {
            region,
            staged: None,
        });
        info!(region, "Update started");
        ok(Vec::new())
    }

    fn handle_write_update_header(&self, payload: &[u8]) -> Reply {
        let region = match self.update.lock().as_ref() {
            Some(update) => update.region,
            None => return fail(Status::DeviceNotReady),
        };
        self.open_write(
            TransferFamily::UPDATE_WRITE,
            WriteTarget::Update(region),
            payload,
        )
    }

    fn handle_update_checksum(&self, payload: &[u8]) -> Reply {
        let region = match self.known_region(payload) {
            Ok(r) => r,
            Err(status) => return fail(status),
        };
        match self.update.lock().as_ref() {
            Some(UpdateState {
                region: r,
                staged: Some(image),
            }) if *r == region => ok(checksum(image).to_le_bytes().to_vec()),
            _ => fail(Status::DeviceNotReady),
        }
    }

    fn handle_finish_update(&self, payload: &[u8]) -> Reply {
        let region = match self.known_region(payload) {
            Ok(r) => r,
            Err(status) => return fail(status),
        };
        let mut update = self.update.lock();
        match update.take() {
            Some(UpdateState {
                region: r,
                staged: Some(image),
            }) if r == region => {
                info!(region, bytes = image.len(), "Update finished");
                self.regions.write().insert(region, image);
                ok(Vec::new())
            }
            other => {
                *update = other;
                fail(Status::DeviceNotReady)
            }
        }
    }

    fn handle_read_region(&self, payload: &[u8]) -> Reply {
        let region = match self.known_region(payload) {
            Ok(r) => r,
            Err(status) => return fail(status),
        };
        let data = self.region_content(region).unwrap_or_default();
        self.open_read(TransferFamily::REGION_READ, data, vec![REGION_HANDLE])
    }

    fn handle_execute_raw_ir(&self) -> Reply {
        if self.raw_ir.read().is_none() {
            return fail(Status::DeviceNotReady);
        }
        *self.ir_executions.lock() += 1;
        ok(Vec::new())
    }

    fn handle_learn_header(&self) -> Reply {
        if !self.is_learning() {
            return fail(Status::DeviceNotReady);
        }
        let capture = self.config.ir_capture.clone();
        let declared = (capture.len() as u32).to_le_bytes().to_vec();
        self.open_read(TransferFamily::LEARN_IR, capture, declared)
    }

    fn open_read(&self, family: TransferFamily, data: Vec<u8>, reply: Vec<u8>) -> Reply {
        debug!(family = family.name, len = data.len(), "Read session opened");
        *self.session.lock() = Some(Session::Read {
            family,
            data,
            pos: 0,
        });
        ok(reply)
    }

    fn open_write(&self, family: TransferFamily, target: WriteTarget, payload: &[u8]) -> Reply {
        let Some(b) = payload.get(0..4) else {
            return fail(Status::BadDataLength);
        };
        let declared = u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize;
        debug!(family = family.name, declared, "Write session opened");
        *self.session.lock() = Some(Session::Write {
            family,
            target,
            declared,
            buffer: Vec::with_capacity(declared),
        });
        ok(Vec::new())
    }

    fn handle_data(&self, family: TransferFamily, payload: &[u8]) -> Reply {
        let mut session = self.session.lock();
        match session.as_mut() {
            Some(Session::Read { family: f, data, pos }) if *f == family => {
                let wanted = match payload.first() {
                    Some(&n) if n > 0 && (n as usize) <= MAX_PAYLOAD => n as usize,
                    _ => return fail(Status::BadDataLength),
                };
                if *pos >= data.len() {
                    return fail(Status::NoMoreData);
                }
                let end = (*pos + wanted).min(data.len());
                let chunk = data[*pos..end].to_vec();
                *pos = end;
                ok(chunk)
            }
            Some(Session::Write {
                family: f,
                declared,
                buffer,
                ..
            }) if *f == family => {
                if buffer.len() + payload.len() > *declared {
                    return fail(Status::BadDataLength);
                }
                buffer.extend_from_slice(payload);
                ok(Vec::new())
            }
            _ => fail(Status::UnknownHandle),
        }
    }

    fn handle_done(&self, family: TransferFamily) -> Reply {
        let mut guard = self.session.lock();
        let session = match guard.take() {
            Some(s) => s,
            None => return fail(Status::UnknownHandle),
        };

        match session {
            Session::Read { family: f, .. } if f == family => ok(Vec::new()),
            Session::Write {
                family: f,
                target,
                declared,
                buffer,
            } if f == family => {
                if buffer.len() != declared {
                    return fail(Status::BadDataLength);
                }
                drop(guard);
                self.complete_write(family, target, buffer);
                ok(Vec::new())
            }
            other => {
                *guard = Some(other);
                fail(Status::UnknownHandle)
            }
        }
    }

    fn complete_write(&self, family: TransferFamily, target: WriteTarget, data: Vec<u8>) {
        info!(family = family.name, bytes = data.len(), "Write transfer complete");
        match target {
            WriteTarget::Memory(address) => {
                let start = address as usize;
                self.flash.write()[start..start + data.len()].copy_from_slice(&data);
            }
            WriteTarget::Update(region) => {
                if let Some(update) = self.update.lock().as_mut() {
                    if update.region == region {
                        update.staged = Some(data);
                    }
                }
            }
            WriteTarget::RawIr => *self.raw_ir.write() = Some(data),
            WriteTarget::Zwave => self.zwave_messages.lock().push((family.done, data)),
        }
    }
}

fn c_string(value: &str) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.truncate(MAX_PAYLOAD - 1);
    bytes.push(0);
    bytes
}

fn set_string(target: &RwLock<String>, payload: &[u8]) -> Reply {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    match std::str::from_utf8(&payload[..end]) {
        Ok(value) => {
            *target.write() = value.to_string();
            ok(Vec::new())
        }
        Err(_) => fail(Status::InvalidArgument),
    }
}

/// Commands the simulator answers
fn supported_commands() -> &'static [Command] {
    &[
        Command::UdpEcho,
        Command::UdpPing,
        Command::TcpEcho,
        Command::TcpPing,
        Command::ReadMemoryHeader,
        Command::ReadMemoryData,
        Command::ReadMemoryDone,
        Command::WriteMemoryHeader,
        Command::WriteMemoryData,
        Command::WriteMemoryDone,
        Command::Reset,
        Command::CalculateChecksum,
        Command::StartUpdate,
        Command::WriteUpdateHeader,
        Command::WriteUpdateData,
        Command::WriteUpdateDone,
        Command::GetUpdateChecksum,
        Command::FinishUpdate,
        Command::ReadRegion,
        Command::ReadRegionData,
        Command::ReadRegionDone,
        Command::CacheRawIrHeader,
        Command::CacheRawIrData,
        Command::CacheRawIrDone,
        Command::ExecuteRawIr,
        Command::GetSystemInfo,
        Command::GetInterfaceList,
        Command::IsInterfaceSupported,
        Command::GetGuid,
        Command::SetGuid,
        Command::GetName,
        Command::SetName,
        Command::GetLocation,
        Command::SetLocation,
        Command::GetCurrentTime,
        Command::UpdateTime,
        Command::SendLongZwaveRequestHeader,
        Command::SendLongZwaveRequestData,
        Command::SendLongZwaveRequestDataDone,
        Command::SendShortZwaveRequest,
        Command::SendShortZwaveResponse,
        Command::SetNodeId,
        Command::GetNodeId,
        Command::GetHomeId,
        Command::SetHomeId,
        Command::SendLongZwaveResponseHeader,
        Command::SendLongZwaveResponseData,
        Command::SendLongZwaveResponseDataDone,
        Command::LearnIr,
        Command::LearnIrHeader,
        Command::LearnIrData,
        Command::LearnIrDone,
        Command::LearnIrStop,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use remotez::protocol::MessageKind;

    fn remote() -> SimulatedRemote {
        SimulatedRemote::new(SimConfig {
            flash_size: 1024,
            ..SimConfig::default()
        })
    }

    fn req(command: Command, payload: &[u8]) -> Request {
        Request {
            kind: MessageKind::Request,
            command,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn test_system_info_packs_hardware_version() {
        let remote = remote();
        let (status, info) = remote.process_request(&req(Command::GetSystemInfo, &[]));

        assert_eq!(status, Status::Ok);
        assert_eq!(info.len(), 15);
        assert_eq!(&info[13..15], &[0x20, 0x00]);
    }

    #[test]
    fn test_memory_write_then_read() {
        let remote = remote();
        let header = remotez::transfer::range_header(0x10, 4);

        assert_eq!(remote.process_request(&req(Command::WriteMemoryHeader, &header)).0, Status::Ok);
        assert_eq!(remote.process_request(&req(Command::WriteMemoryData, &[1, 2, 3, 4])).0, Status::Ok);
        assert_eq!(remote.process_request(&req(Command::WriteMemoryDone, &[])).0, Status::Ok);
        assert_eq!(remote.flash_snapshot(0x10, 4), Some(vec![1, 2, 3, 4]));

        remote.process_request(&req(Command::ReadMemoryHeader, &header));
        let (status, data) = remote.process_request(&req(Command::ReadMemoryData, &[60]));
        assert_eq!(status, Status::Ok);
        assert_eq!(data, vec![1, 2, 3, 4]);
        let (status, _) = remote.process_request(&req(Command::ReadMemoryData, &[60]));
        assert_eq!(status, Status::NoMoreData);
    }

    #[test]
    fn test_out_of_range_address() {
        let remote = remote();
        let header = remotez::transfer::range_header(1020, 8);
        let (status, _) = remote.process_request(&req(Command::ReadMemoryHeader, &header));
        assert_eq!(status, Status::InvalidAddress);
    }

    #[test]
    fn test_write_overrun_is_rejected() {
        let remote = remote();
        let header = remotez::transfer::range_header(0, 2);
        remote.process_request(&req(Command::WriteMemoryHeader, &header));
        let (status, _) = remote.process_request(&req(Command::WriteMemoryData, &[0; 3]));
        assert_eq!(status, Status::BadDataLength);
    }

    #[test]
    fn test_data_without_session() {
        let remote = remote();
        let (status, _) = remote.process_request(&req(Command::ReadMemoryData, &[10]));
        assert_eq!(status, Status::UnknownHandle);
    }

    #[test]
    fn test_injected_status_fires_once() {
        let remote = remote();
        remote.inject_status(Command::UdpPing, Status::Busy);

        assert_eq!(remote.process_request(&req(Command::UdpPing, &[])).0, Status::Busy);
        assert_eq!(remote.process_request(&req(Command::UdpPing, &[])).0, Status::Ok);
    }

    #[test]
    fn test_handle_frame_echoes_command() {
        let remote = remote();
        let frame =
            protocol::encode_request(MessageKind::Request, Command::UdpEcho, &[7, 7]).unwrap();
        let reply = protocol::decode_response(&remote.handle_frame(&frame).unwrap()).unwrap();

        assert_eq!(reply.command, Command::UdpEcho);
        assert_eq!(reply.payload, vec![7, 7]);
    }

    #[test]
    fn test_short_request_is_answered() {
        let remote = remote();
        let mut report = [0u8; protocol::REPORT_SIZE];
        report[1] = 2;
        report[2] = protocol::CHANNEL_ID;
        report[4] = Command::GetName.into();
        let reply = remote.handle_frame(&Frame::from_report(report)).unwrap();
        let reply = protocol::decode_response(&reply).unwrap();

        assert_eq!(reply.command, Command::GetName);
        assert_eq!(reply.status, Status::BadDataLength);
        assert!(reply.payload.is_empty());
    }

    #[test]
    fn test_unknown_command() {
        let remote = remote();
        let (status, _) = remote.process_request(&req(Command::Unknown(0xF0), &[]));
        assert_eq!(status, Status::InvalidTcpCommand);
    }
}
