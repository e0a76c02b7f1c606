//! Local report channel
//!
//! One request is one report write and one response is one report read.
//! Nothing is fragmented here; bulk data goes through the transfer engine.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use super::{Link, TransportError};
use crate::config::HidConfig;
use crate::protocol::{self, Command, Frame, MessageKind, Response, REPORT_SIZE};

/// Raw report I/O provided by the platform
///
/// Each call moves exactly one fixed-size report. Implementations own any
/// timeout or cancellation policy and report it as an I/O error.
#[async_trait]
pub trait ReportIo: Send {
    async fn write_report(&mut self, report: &[u8; REPORT_SIZE]) -> io::Result<()>;

    async fn read_report(&mut self, report: &mut [u8; REPORT_SIZE]) -> io::Result<()>;

    fn name(&self) -> String;
}

/// Link over a [`ReportIo`] implementation
///
/// After a timeout or I/O failure the device may still deliver the reply
/// that was missed, which would be taken as the answer to the next request.
/// The link is marked broken instead and every later call fails with
/// [`TransportError::ConnectionClosed`]; reopen the device to continue.
pub struct ReportLink<R> {
    io: R,
    broken: bool,
}

impl<R: ReportIo> ReportLink<R> {
    pub fn new(io: R) -> Self {
        Self { io, broken: false }
    }

    pub fn into_inner(self) -> R {
        self.io
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    fn ensure_usable(&self) -> Result<(), TransportError> {
        if self.broken {
            return Err(TransportError::ConnectionClosed);
        }
        Ok(())
    }

    fn mark_broken(&mut self, error: &TransportError) {
        if !self.broken {
            warn!(device = %self.io.name(), error = %error, "Link out of step, closing");
            self.broken = true;
        }
    }
}

#[async_trait]
impl<R: ReportIo> Link for ReportLink<R> {
    async fn send_request(
        &mut self,
        kind: MessageKind,
        command: Command,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.ensure_usable()?;
        let frame = protocol::encode_request(kind, command, payload)?;
        debug!(%command, frame = ?frame, "Writing report");
        if let Err(e) = self.io.write_report(frame.as_report()).await {
            let error = io_error(e, TransportError::SendFailed);
            self.mark_broken(&error);
            return Err(error);
        }
        Ok(())
    }

    async fn receive_response(&mut self) -> Result<Response, TransportError> {
        self.ensure_usable()?;
        let mut report = [0u8; REPORT_SIZE];
        if let Err(e) = self.io.read_report(&mut report).await {
            let error = io_error(e, TransportError::ReceiveFailed);
            self.mark_broken(&error);
            return Err(error);
        }

        let frame = Frame::from_report(report);
        debug!(frame = ?frame, "Read report");
        Ok(protocol::decode_response(&frame)?)
    }

    fn description(&self) -> String {
        format!("report:{}", self.io.name())
    }
}

fn io_error(e: io::Error, wrap: fn(String) -> TransportError) -> TransportError {
    match e.kind() {
        io::ErrorKind::TimedOut => TransportError::Timeout(e.to_string()),
        io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe => {
            TransportError::ConnectionClosed
        }
        _ => wrap(e.to_string()),
    }
}

/// Linux hidraw node (`/dev/hidrawN`)
///
/// The remote uses unnumbered reports: writes carry a leading zero report id,
/// reads return the report without it, so the read lands at offset 1.
pub struct HidrawDevice {
    path: PathBuf,
    file: File,
    read_timeout: Option<Duration>,
}

impl HidrawDevice {
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file,
            read_timeout: None,
        })
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl ReportIo for HidrawDevice {
    async fn write_report(&mut self, report: &[u8; REPORT_SIZE]) -> io::Result<()> {
        self.file.write_all(report).await?;
        self.file.flush().await
    }

    async fn read_report(&mut self, report: &mut [u8; REPORT_SIZE]) -> io::Result<()> {
        report[0] = 0;
        let read = self.file.read(&mut report[1..]);
        let n = match self.read_timeout {
            Some(timeout) => tokio::time::timeout(timeout, read).await.map_err(|_| {
                io::Error::new(io::ErrorKind::TimedOut, "no report from device")
            })??,
            None => read.await?,
        };
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        report[1 + n..].fill(0);
        Ok(())
    }

    fn name(&self) -> String {
        format!("hidraw:{}", self.path.display())
    }
}

/// Open the hidraw node named in the configuration
pub async fn open_hidraw(
    config: &HidConfig,
) -> Result<ReportLink<HidrawDevice>, TransportError> {
    let mut device = HidrawDevice::open(&config.device_path)
        .await
        .map_err(|e| {
            TransportError::ConnectionFailed(format!(
                "Failed to open {}: {}",
                config.device_path, e
            ))
        })?;
    if config.read_timeout_ms > 0 {
        device = device.with_read_timeout(Duration::from_millis(config.read_timeout_ms));
    }
    Ok(ReportLink::new(device))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::protocol::Status;
    use pretty_assertions::assert_eq;

    /// Report I/O backed by in-memory queues
    #[derive(Default)]
    struct LoopbackReports {
        written: Vec<[u8; REPORT_SIZE]>,
        pending: VecDeque<io::Result<[u8; REPORT_SIZE]>>,
    }

    #[async_trait]
    impl ReportIo for LoopbackReports {
        async fn write_report(&mut self, report: &[u8; REPORT_SIZE]) -> io::Result<()> {
            self.written.push(*report);
            Ok(())
        }

        async fn read_report(&mut self, report: &mut [u8; REPORT_SIZE]) -> io::Result<()> {
            let next = self
                .pending
                .pop_front()
                .unwrap_or_else(|| Err(io::ErrorKind::TimedOut.into()))?;
            *report = next;
            Ok(())
        }

        fn name(&self) -> String {
            "loopback".to_string()
        }
    }

    #[tokio::test]
    async fn test_one_request_is_one_report() {
        let mut io = LoopbackReports::default();
        let reply = protocol::encode_response(Command::GetGuid, Status::Ok, &[9, 8, 7]).unwrap();
        io.pending.push_back(Ok(*reply.as_report()));

        let mut link = ReportLink::new(io);
        let response = link.exchange(Command::GetGuid, &[]).await.unwrap();

        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.payload, vec![9, 8, 7]);

        let io = link.into_inner();
        assert_eq!(io.written.len(), 1);
        assert_eq!(&io.written[0][..5], &[0x00, 0x03, 0x01, 0x00, 0x67]);
    }

    #[tokio::test]
    async fn test_oversize_payload_never_reaches_the_device() {
        let mut link = ReportLink::new(LoopbackReports::default());
        let err = link
            .send_request(MessageKind::Request, Command::WriteMemoryData, &[0; 61])
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Frame(_)));
        assert!(link.into_inner().written.is_empty());
    }

    #[tokio::test]
    async fn test_read_timeout_surfaces_as_timeout() {
        let mut link = ReportLink::new(LoopbackReports::default());
        let err = link.receive_response().await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_timeout_keeps_late_reply_from_answering_next_request() {
        let mut link = ReportLink::new(LoopbackReports::default());
        link.send_request(MessageKind::Request, Command::ReadMemoryData, &[4])
            .await
            .unwrap();
        let err = link.receive_response().await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
        assert!(link.is_broken());

        // The missed reply turns up late
        let late =
            protocol::encode_response(Command::ReadMemoryData, Status::Ok, &[0x11; 4]).unwrap();
        link.io.pending.push_back(Ok(*late.as_report()));

        let err = link.exchange(Command::ReadMemoryData, &[4]).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));

        let io = link.into_inner();
        assert_eq!(io.written.len(), 1);
        assert_eq!(io.pending.len(), 1);
    }

    #[tokio::test]
    async fn test_short_report_is_malformed() {
        let mut io = LoopbackReports::default();
        let mut report = [0u8; REPORT_SIZE];
        report[1] = 3;
        io.pending.push_back(Ok(report));

        let mut link = ReportLink::new(io);
        let err = link.receive_response().await.unwrap_err();
        assert!(matches!(err, TransportError::Frame(_)));
    }
}
