//! High-level remote operations
//!
//! [`RemoteDevice`] wraps a [`Link`] and turns every operation into one or
//! more strict request/response exchanges. Bulk operations go through the
//! segmented transfer engine; everything else is a single exchange.

mod flash;
mod identity;
mod ir;
mod system;
mod time;
mod update;
mod zwave;

pub use flash::FlashRegion;
pub use identity::{DeviceIdentity, FlashChip};
pub use time::DeviceTime;

use tracing::debug;

use crate::config::TransferConfig;
use crate::error::{RemoteError, Result};
use crate::protocol::{Command, MAX_PAYLOAD};
use crate::transfer::{exchange_echoed, Transfer, TransferFamily};
use crate::transport::Link;

/// One remote reached through one link
pub struct RemoteDevice<L: Link + ?Sized> {
    chunk_size: usize,
    link: Box<L>,
}

impl<L: Link> RemoteDevice<L> {
    pub fn new(link: L) -> Self {
        Self::from_boxed(Box::new(link))
    }
}

impl<L: Link + ?Sized> RemoteDevice<L> {
    pub fn from_boxed(link: Box<L>) -> Self {
        Self {
            chunk_size: MAX_PAYLOAD,
            link,
        }
    }

    /// Bytes moved per DATA exchange, clamped to 1-60
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_PAYLOAD);
        self
    }

    pub fn with_transfer_config(self, config: &TransferConfig) -> Self {
        self.with_chunk_size(config.chunk_size)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_link(self) -> Box<L> {
        self.link
    }

    /// Send one request and require an OK reply to the same command
    ///
    /// Returns the reply payload. Any other status comes back as
    /// [`RemoteError::Status`] without retrying.
    pub async fn request(&mut self, command: Command, payload: &[u8]) -> Result<Vec<u8>> {
        debug!(%command, payload = %hex::encode(payload), "Request");
        let response = exchange_echoed(&mut *self.link, command, payload).await?;
        if !response.status.is_ok() {
            return Err(RemoteError::Status {
                command,
                status: response.status,
            });
        }
        debug!(%command, payload = %hex::encode(&response.payload), "Reply");
        Ok(response.payload)
    }

    fn transfer(&mut self, family: TransferFamily) -> Transfer<'_, L> {
        Transfer::new(&mut *self.link, family, self.chunk_size)
    }

    /// Write `data` through a write family with the given header
    async fn write_transfer(
        &mut self,
        family: TransferFamily,
        header: &[u8],
        data: &[u8],
    ) -> Result<()> {
        let mut transfer = self.transfer(family);
        transfer.begin(header, Some(data.len())).await?;
        transfer.write_all(data).await?;
        transfer.finish().await?;
        Ok(())
    }

    /// Read everything a read family yields
    async fn read_transfer(
        &mut self,
        family: TransferFamily,
        header: &[u8],
        declared: Option<usize>,
    ) -> Result<Vec<u8>> {
        let mut transfer = self.transfer(family);
        transfer.begin(header, declared).await?;
        let data = transfer.read_to_end().await?;
        transfer.finish().await?;
        Ok(data)
    }
}

/// Transfer length as carried in a header
pub(crate) fn wire_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| RemoteError::TransferOverrun {
        declared: u32::MAX as usize,
        transferred: 0,
        attempted: len,
    })
}

/// Check a reply carries at least `len` bytes
pub(crate) fn require_len(command: Command, payload: &[u8], len: usize) -> Result<()> {
    if payload.len() < len {
        return Err(RemoteError::InvalidResponse(format!(
            "{} reply too short: {} bytes, expected {}",
            command,
            payload.len(),
            len
        )));
    }
    Ok(())
}
