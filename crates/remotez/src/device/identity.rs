//! Identity query

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{require_len, RemoteDevice};
use crate::error::Result;
use crate::protocol::Command;
use crate::transport::Link;

/// Length of the fixed GET_SYSTEM_INFO layout
pub const SYSTEM_INFO_LEN: usize = 15;

/// Length of the GET_GUID payload
pub const GUID_LEN: usize = 16;

/// Flash part fitted to the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashChip {
    pub manufacturer: u8,
    pub id: u8,
}

/// What the remote reports about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub usb_vid: u16,
    pub usb_pid: u16,
    pub architecture: u16,
    pub fw_ver_major: u16,
    pub fw_ver_minor: u16,
    pub fw_type: u8,
    pub skin: u16,
    pub hw_ver_major: u16,
    pub hw_ver_minor: u8,
    /// GUID from GET_GUID
    pub serial: Uuid,
    /// Not part of the system-info reply
    pub flash: Option<FlashChip>,
}

impl DeviceIdentity {
    /// Parse the system-info layout; the serial is filled in separately
    ///
    /// ```text
    /// 0-1 vid  2-3 pid  4-5 arch  6-7 fw major  8-9 fw minor
    /// 10 fw type  11-12 skin  13-14 hw (major = field >> 4, minor = field & 0x0F)
    /// ```
    pub fn from_system_info(payload: &[u8]) -> Result<Self> {
        require_len(Command::GetSystemInfo, payload, SYSTEM_INFO_LEN)?;
        let le = |i: usize| u16::from_le_bytes([payload[i], payload[i + 1]]);

        let hw = le(13);
        Ok(Self {
            usb_vid: le(0),
            usb_pid: le(2),
            architecture: le(4),
            fw_ver_major: le(6),
            fw_ver_minor: le(8),
            fw_type: payload[10],
            skin: le(11),
            hw_ver_major: hw >> 4,
            hw_ver_minor: (hw & 0x0F) as u8,
            serial: Uuid::nil(),
            flash: None,
        })
    }

    /// Firmware version as `major.minor`
    pub fn firmware_version(&self) -> String {
        format!("{}.{}", self.fw_ver_major, self.fw_ver_minor)
    }

    /// Hardware version as `major.minor`
    pub fn hardware_version(&self) -> String {
        format!("{}.{}", self.hw_ver_major, self.hw_ver_minor)
    }
}

/// GUID byte order on the wire: first three groups little-endian
pub fn serial_from_guid(payload: &[u8]) -> Result<Uuid> {
    require_len(Command::GetGuid, payload, GUID_LEN)?;
    let mut bytes = [0u8; GUID_LEN];
    bytes.copy_from_slice(&payload[..GUID_LEN]);
    Ok(Uuid::from_bytes_le(bytes))
}

impl<L: Link + ?Sized> RemoteDevice<L> {
    /// Query system info and serial number
    #[instrument(skip(self))]
    pub async fn get_identity(&mut self) -> Result<DeviceIdentity> {
        let info = self.request(Command::GetSystemInfo, &[]).await?;
        let mut identity = DeviceIdentity::from_system_info(&info)?;

        let guid = self.request(Command::GetGuid, &[]).await?;
        identity.serial = serial_from_guid(&guid)?;

        info!(
            arch = identity.architecture,
            firmware = %identity.firmware_version(),
            hardware = %identity.hardware_version(),
            serial = %identity.serial,
            "Identified remote"
        );
        Ok(identity)
    }

    #[instrument(skip(self))]
    pub async fn get_serial(&mut self) -> Result<Uuid> {
        let guid = self.request(Command::GetGuid, &[]).await?;
        serial_from_guid(&guid)
    }

    #[instrument(skip(self))]
    pub async fn set_serial(&mut self, serial: Uuid) -> Result<()> {
        self.request(Command::SetGuid, &serial.to_bytes_le()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::mock_device;
    use super::*;
    use crate::error::RemoteError;
    use crate::protocol::Status;
    use pretty_assertions::assert_eq;

    fn system_info(hw: u16) -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(&0x046Du16.to_le_bytes());
        p.extend_from_slice(&0xC11Fu16.to_le_bytes());
        p.extend_from_slice(&14u16.to_le_bytes());
        p.extend_from_slice(&4u16.to_le_bytes());
        p.extend_from_slice(&207u16.to_le_bytes());
        p.push(0x02);
        p.extend_from_slice(&0x0033u16.to_le_bytes());
        p.extend_from_slice(&hw.to_le_bytes());
        p
    }

    const GUID: [u8; 16] = [
        0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE,
        0xFF,
    ];

    #[tokio::test]
    async fn test_get_identity() {
        let mut device = mock_device();
        device.link_mut().push_ok(system_info(0x0021));
        device.link_mut().push_ok(GUID.to_vec());

        let identity = device.get_identity().await.unwrap();

        assert_eq!(identity.usb_vid, 0x046D);
        assert_eq!(identity.usb_pid, 0xC11F);
        assert_eq!(identity.architecture, 14);
        assert_eq!(identity.firmware_version(), "4.207");
        assert_eq!(identity.fw_type, 2);
        assert_eq!(identity.skin, 0x33);
        assert_eq!(identity.hw_ver_major, 2);
        assert_eq!(identity.hw_ver_minor, 1);
        assert_eq!(
            identity.serial.to_string(),
            "00112233-4455-6677-8899-aabbccddeeff"
        );
        assert_eq!(identity.flash, None);
        assert_eq!(
            device.link().sent_commands(),
            vec![Command::GetSystemInfo, Command::GetGuid]
        );
    }

    #[test]
    fn test_hardware_field_high_bits_go_to_major() {
        let identity = DeviceIdentity::from_system_info(&system_info(0x01A3)).unwrap();
        assert_eq!(identity.hw_ver_major, 0x1A);
        assert_eq!(identity.hw_ver_minor, 3);
    }

    #[test]
    fn test_short_system_info() {
        let err = DeviceIdentity::from_system_info(&[0; 14]).unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_guid_failure_propagates() {
        let mut device = mock_device();
        device.link_mut().push_ok(system_info(0x0010));
        device
            .link_mut()
            .push_response(Status::DeviceNotReady, vec![]);

        let err = device.get_identity().await.unwrap_err();
        assert_eq!(err.status(), Some(Status::DeviceNotReady));
    }

    #[tokio::test]
    async fn test_set_serial_round_trips_byte_order() {
        let mut device = mock_device();
        let serial = serial_from_guid(&GUID).unwrap();
        device.set_serial(serial).await.unwrap();

        assert_eq!(device.link().sent()[0].payload, GUID.to_vec());
    }
}
