//! Z-Wave mesh administration

use tracing::{debug, instrument};

use super::{require_len, wire_len, RemoteDevice};
use crate::error::Result;
use crate::protocol::{Command, MAX_PAYLOAD};
use crate::transfer::{length_header, TransferFamily};
use crate::transport::Link;

impl<L: Link + ?Sized> RemoteDevice<L> {
    async fn send_zwave(
        &mut self,
        short: Command,
        family: TransferFamily,
        message: &[u8],
    ) -> Result<()> {
        if message.len() <= MAX_PAYLOAD {
            self.request(short, message).await?;
            return Ok(());
        }

        debug!(family = family.name, len = message.len(), "Message needs a long transfer");
        let length = wire_len(message.len())?;
        self.write_transfer(family, &length_header(length), message)
            .await
    }

    /// Forward a Z-Wave request into the mesh
    #[instrument(skip(self, message), fields(len = message.len()))]
    pub async fn send_zwave_request(&mut self, message: &[u8]) -> Result<()> {
        self.send_zwave(
            Command::SendShortZwaveRequest,
            TransferFamily::ZWAVE_REQUEST,
            message,
        )
        .await
    }

    /// Answer a Z-Wave request from the mesh
    #[instrument(skip(self, message), fields(len = message.len()))]
    pub async fn send_zwave_response(&mut self, message: &[u8]) -> Result<()> {
        self.send_zwave(
            Command::SendShortZwaveResponse,
            TransferFamily::ZWAVE_RESPONSE,
            message,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_node_id(&mut self) -> Result<u8> {
        let payload = self.request(Command::GetNodeId, &[]).await?;
        require_len(Command::GetNodeId, &payload, 1)?;
        Ok(payload[0])
    }

    #[instrument(skip(self))]
    pub async fn set_node_id(&mut self, node_id: u8) -> Result<()> {
        self.request(Command::SetNodeId, &[node_id]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_home_id(&mut self) -> Result<u32> {
        let payload = self.request(Command::GetHomeId, &[]).await?;
        require_len(Command::GetHomeId, &payload, 4)?;
        Ok(u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]))
    }

    #[instrument(skip(self))]
    pub async fn set_home_id(&mut self, home_id: u32) -> Result<()> {
        self.request(Command::SetHomeId, &home_id.to_le_bytes()).await?;
        Ok(())
    }
}
