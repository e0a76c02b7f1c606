//! Flash memory access

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{require_len, wire_len, RemoteDevice};
use crate::error::{RemoteError, Result};
use crate::protocol::{Command, WRITE_MODE_ERASE};
use crate::transfer::{range_header, TransferFamily};
use crate::transport::Link;

/// One erasable flash region
///
/// Splitting an arbitrary range into erase regions needs the chip geometry,
/// which the caller owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashRegion {
    pub address: u32,
    pub length: u32,
}

impl<L: Link + ?Sized> RemoteDevice<L> {
    /// Read `length` bytes starting at `address`
    #[instrument(skip(self))]
    pub async fn read_flash(&mut self, address: u32, length: u32) -> Result<Vec<u8>> {
        self.read_transfer(
            TransferFamily::MEMORY_READ,
            &range_header(address, length),
            Some(length as usize),
        )
        .await
    }

    /// Write `data` starting at `address`
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub async fn write_flash(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let length = wire_len(data.len())?;
        self.write_transfer(
            TransferFamily::MEMORY_WRITE,
            &range_header(address, length),
            data,
        )
        .await?;
        info!(bytes = data.len(), "Flash write complete");
        Ok(())
    }

    /// Read back `expected.len()` bytes and compare
    #[instrument(skip(self, expected), fields(len = expected.len()))]
    pub async fn verify_flash(&mut self, address: u32, expected: &[u8]) -> Result<()> {
        let actual = self.read_flash(address, wire_len(expected.len())?).await?;
        if let Some(offset) = actual.iter().zip(expected).position(|(a, e)| a != e) {
            return Err(RemoteError::VerifyMismatch { offset });
        }
        if actual.len() != expected.len() {
            return Err(RemoteError::VerifyMismatch {
                offset: actual.len().min(expected.len()),
            });
        }
        Ok(())
    }

    /// Erase one region
    ///
    /// A WRITE_MEMORY_HEADER carrying the erase-mode byte; the device erases
    /// on OK and no data or done phase follows.
    #[instrument(skip(self))]
    pub async fn erase_flash(&mut self, address: u32, length: u32) -> Result<()> {
        let mut header = range_header(address, length);
        header.push(WRITE_MODE_ERASE);
        self.request(Command::WriteMemoryHeader, &header).await?;
        Ok(())
    }

    /// Erase each region with its own request
    #[instrument(skip(self, regions), fields(count = regions.len()))]
    pub async fn erase_regions(&mut self, regions: &[FlashRegion]) -> Result<()> {
        for region in regions {
            self.erase_flash(region.address, region.length).await?;
        }
        Ok(())
    }

    /// Device-side CRC-16 of a flash range
    #[instrument(skip(self))]
    pub async fn calculate_checksum(&mut self, address: u32, length: u32) -> Result<u16> {
        let payload = self
            .request(Command::CalculateChecksum, &range_header(address, length))
            .await?;
        require_len(Command::CalculateChecksum, &payload, 2)?;
        Ok(u16::from_le_bytes([payload[0], payload[1]]))
    }

    /// Mark a region's content invalid by opening an update on it
    #[instrument(skip(self))]
    pub async fn invalidate_flash(&mut self, region: u8) -> Result<()> {
        self.request(Command::StartUpdate, &[region]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::mock_device;
    use super::*;
    use crate::protocol::Status;
    use crate::transfer::parse_range_header;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_read_flash_150_bytes() {
        let mut device = mock_device();
        let image: Vec<u8> = (0..150u8).collect();
        device.link_mut().push_ok(vec![]);
        for chunk in image.chunks(60) {
            device.link_mut().push_ok(chunk.to_vec());
        }
        device.link_mut().push_ok(vec![]);

        let data = device.read_flash(0x0002_0000, 150).await.unwrap();

        assert_eq!(data, image);
        let sent = device.link().sent();
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[0].command, Command::ReadMemoryHeader);
        assert_eq!(parse_range_header(&sent[0].payload), Some((0x0002_0000, 150)));
        assert_eq!(sent[4].command, Command::ReadMemoryDone);
    }

    #[tokio::test]
    async fn test_write_flash_chunks_data() {
        let mut device = mock_device().with_chunk_size(32);
        let data = vec![0x5A; 70];

        device.write_flash(0x100, &data).await.unwrap();

        let sent = device.link().sent();
        let sizes: Vec<usize> = sent
            .iter()
            .filter(|r| r.command == Command::WriteMemoryData)
            .map(|r| r.payload.len())
            .collect();
        assert_eq!(sizes, vec![32, 32, 6]);
        assert_eq!(sent.last().unwrap().command, Command::WriteMemoryDone);
    }

    #[tokio::test]
    async fn test_verify_reports_first_difference() {
        let mut device = mock_device();
        device.link_mut().push_ok(vec![]);
        device.link_mut().push_ok(vec![1, 2, 9, 4]);
        device.link_mut().push_ok(vec![]);

        let err = device.verify_flash(0, &[1, 2, 3, 4]).await.unwrap_err();
        assert!(matches!(err, RemoteError::VerifyMismatch { offset: 2 }));
    }

    #[tokio::test]
    async fn test_erase_is_one_request_per_region() {
        let mut device = mock_device();
        let regions = [
            FlashRegion {
                address: 0x0000,
                length: 0x1000,
            },
            FlashRegion {
                address: 0x1000,
                length: 0x1000,
            },
        ];

        device.erase_regions(&regions).await.unwrap();

        let sent = device.link().sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|r| r.command == Command::WriteMemoryHeader));
        assert_eq!(sent[1].payload[8], WRITE_MODE_ERASE);
        assert_eq!(parse_range_header(&sent[1].payload), Some((0x1000, 0x1000)));
    }

    #[tokio::test]
    async fn test_erase_stops_at_first_rejection() {
        let mut device = mock_device();
        device.link_mut().push_response(Status::InvalidAddress, vec![]);
        let regions = [FlashRegion {
            address: 0xFFFF_F000,
            length: 0x2000,
        }; 2];

        let err = device.erase_regions(&regions).await.unwrap_err();
        assert_eq!(err.status(), Some(Status::InvalidAddress));
        assert_eq!(device.link().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_checksum_reply() {
        let mut device = mock_device();
        device.link_mut().push_ok(vec![0xC3, 0x31]);

        assert_eq!(device.calculate_checksum(0, 9).await.unwrap(), 0x31C3);

        device.link_mut().push_ok(vec![0xC3]);
        assert!(matches!(
            device.calculate_checksum(0, 9).await.unwrap_err(),
            RemoteError::InvalidResponse(_)
        ));
    }

    #[tokio::test]
    async fn test_invalidate_starts_update() {
        let mut device = mock_device();
        device
            .invalidate_flash(crate::protocol::region::CONFIG)
            .await
            .unwrap();

        let sent = &device.link().sent()[0];
        assert_eq!(sent.command, Command::StartUpdate);
        assert_eq!(sent.payload, vec![0x04]);
    }
}
