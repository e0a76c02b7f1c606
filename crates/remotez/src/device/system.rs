//! Diagnostics, reset and string properties

use tracing::{info, instrument};

use super::{require_len, RemoteDevice};
use crate::error::{RemoteError, Result};
use crate::protocol::{Command, FrameError, ResetKind, MAX_PAYLOAD};
use crate::transport::Link;

/// Encode a NUL-terminated UTF-8 property
fn encode_property(value: &str) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(value.len() + 1);
    payload.extend_from_slice(value.as_bytes());
    payload.push(0);
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD,
        }
        .into());
    }
    Ok(payload)
}

/// Decode a property terminated by NUL or the end of the payload
pub(crate) fn decode_c_string(command: Command, payload: &[u8]) -> Result<String> {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    String::from_utf8(payload[..end].to_vec())
        .map_err(|e| RemoteError::InvalidResponse(format!("{}: {}", command, e)))
}

impl<L: Link + ?Sized> RemoteDevice<L> {
    /// Liveness check
    #[instrument(skip(self))]
    pub async fn ping(&mut self) -> Result<()> {
        self.request(Command::UdpPing, &[]).await?;
        Ok(())
    }

    /// Send `payload` and return what the device echoes
    #[instrument(skip(self, payload), fields(len = payload.len()))]
    pub async fn echo(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        self.request(Command::UdpEcho, payload).await
    }

    #[instrument(skip(self))]
    pub async fn reset(&mut self, kind: ResetKind) -> Result<()> {
        info!(?kind, "Resetting remote");
        self.request(Command::Reset, &[kind as u8]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_name(&mut self) -> Result<String> {
        let payload = self.request(Command::GetName, &[]).await?;
        decode_c_string(Command::GetName, &payload)
    }

    #[instrument(skip(self))]
    pub async fn set_name(&mut self, name: &str) -> Result<()> {
        let payload = encode_property(name)?;
        self.request(Command::SetName, &payload).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_location(&mut self) -> Result<String> {
        let payload = self.request(Command::GetLocation, &[]).await?;
        decode_c_string(Command::GetLocation, &payload)
    }

    #[instrument(skip(self))]
    pub async fn set_location(&mut self, location: &str) -> Result<()> {
        let payload = encode_property(location)?;
        self.request(Command::SetLocation, &payload).await?;
        Ok(())
    }

    /// Command codes the device advertises
    #[instrument(skip(self))]
    pub async fn get_interface_list(&mut self) -> Result<Vec<Command>> {
        let payload = self.request(Command::GetInterfaceList, &[]).await?;
        Ok(payload.into_iter().map(Command::from).collect())
    }

    /// Ask whether one command is supported
    #[instrument(skip(self))]
    pub async fn is_interface_supported(&mut self, command: Command) -> Result<bool> {
        let payload = self
            .request(Command::IsInterfaceSupported, &[command.code()])
            .await?;
        require_len(Command::IsInterfaceSupported, &payload, 1)?;
        Ok(payload[0] != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::mock_device;
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_echo_returns_payload() {
        let mut device = mock_device();
        device.link_mut().push_ok(vec![1, 2, 3]);

        let echoed = device.echo(&[1, 2, 3]).await.unwrap();
        assert_eq!(echoed, vec![1, 2, 3]);
        assert_eq!(device.link().sent()[0].command, Command::UdpEcho);
    }

    #[tokio::test]
    async fn test_reset_sends_mode_byte() {
        let mut device = mock_device();
        device.reset(ResetKind::Loader).await.unwrap();

        let sent = &device.link().sent()[0];
        assert_eq!(sent.command, Command::Reset);
        assert_eq!(sent.payload, vec![0x01]);
    }

    #[tokio::test]
    async fn test_name_is_nul_terminated() {
        let mut device = mock_device();
        device.set_name("Living room").await.unwrap();
        assert_eq!(device.link().sent()[0].payload, b"Living room\0".to_vec());

        device.link_mut().push_ok(b"Den\0garbage".to_vec());
        assert_eq!(device.get_name().await.unwrap(), "Den");

        device.link_mut().push_ok(b"Kitchen".to_vec());
        assert_eq!(device.get_location().await.unwrap(), "Kitchen");
    }

    #[tokio::test]
    async fn test_oversize_name_is_rejected_locally() {
        let mut device = mock_device();
        let err = device.set_name(&"x".repeat(60)).await.unwrap_err();

        assert!(matches!(err, RemoteError::Frame(FrameError::PayloadTooLarge { .. })));
        assert!(device.link().sent().is_empty());
    }

    #[tokio::test]
    async fn test_interface_queries() {
        let mut device = mock_device();
        device.link_mut().push_ok(vec![0x10, 0x67, 0xEE]);
        device.link_mut().push_ok(vec![0x00]);

        let list = device.get_interface_list().await.unwrap();
        assert_eq!(
            list,
            vec![Command::UdpEcho, Command::GetGuid, Command::Unknown(0xEE)]
        );
        assert!(!device.is_interface_supported(Command::LearnIr).await.unwrap());
    }
}
