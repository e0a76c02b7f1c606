//! Region update and read-back

use tracing::{info, instrument, warn};

use super::{require_len, wire_len, RemoteDevice};
use crate::error::{RemoteError, Result};
use crate::protocol::{checksum, Command};
use crate::transfer::{length_header, TransferFamily};
use crate::transport::Link;

impl<L: Link + ?Sized> RemoteDevice<L> {
    /// Replace the content of `region` with `image`
    ///
    /// START_UPDATE, the image through the update write family, then the
    /// device checksum is compared with the local one before FINISH_UPDATE.
    /// A mismatch leaves the update unfinished.
    #[instrument(skip(self, image), fields(len = image.len()))]
    pub async fn update_region(&mut self, region: u8, image: &[u8]) -> Result<()> {
        let length = wire_len(image.len())?;

        self.request(Command::StartUpdate, &[region]).await?;
        self.write_transfer(TransferFamily::UPDATE_WRITE, &length_header(length), image)
            .await?;

        let reply = self.request(Command::GetUpdateChecksum, &[region]).await?;
        require_len(Command::GetUpdateChecksum, &reply, 2)?;
        let device = u16::from_le_bytes([reply[0], reply[1]]);
        let expected = checksum(image);
        if device != expected {
            warn!(device, expected, "Update checksum mismatch");
            return Err(RemoteError::ChecksumMismatch { device, expected });
        }

        self.request(Command::FinishUpdate, &[region]).await?;
        info!(region, bytes = image.len(), "Region updated");
        Ok(())
    }

    /// Read the whole content of `region`
    #[instrument(skip(self))]
    pub async fn read_region(&mut self, region: u8) -> Result<Vec<u8>> {
        self.read_transfer(TransferFamily::REGION_READ, &[region], None)
            .await
    }
}
