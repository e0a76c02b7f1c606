//! Network channel
//!
//! Same exchange semantics as the report channel, carried over a TCP stream.
//! A stream keeps no message boundaries, so each frame is sent in its
//! delimited form: the length byte followed by exactly that many bytes.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use super::{Link, TransportError};
use crate::config::TcpConfig;
use crate::protocol::frame::MAX_LENGTH_BYTE;
use crate::protocol::{self, Command, Frame, FrameError, MessageKind, Response};

/// Read one delimited frame from a stream
pub async fn read_stream_frame<R>(reader: &mut R) -> Result<Frame, TransportError>
where
    R: AsyncRead + Unpin,
{
    let length = reader.read_u8().await.map_err(read_error)?;
    if length > MAX_LENGTH_BYTE {
        return Err(FrameError::MalformedFrame {
            length,
            reason: "runs past end of report",
        }
        .into());
    }

    let mut body = vec![0u8; length as usize];
    reader.read_exact(&mut body).await.map_err(read_error)?;
    Ok(Frame::from_stream_parts(length, &body)?)
}

/// Write one frame in delimited form
pub async fn write_stream_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(frame.stream_bytes())
        .await
        .map_err(write_error)?;
    writer.flush().await.map_err(write_error)
}

fn read_error(e: io::Error) -> TransportError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset => {
            TransportError::ConnectionClosed
        }
        _ => TransportError::ReceiveFailed(e.to_string()),
    }
}

fn write_error(e: io::Error) -> TransportError {
    match e.kind() {
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => {
            TransportError::ConnectionClosed
        }
        _ => TransportError::SendFailed(e.to_string()),
    }
}

/// Link over a TCP connection
///
/// A timeout or I/O failure can leave part of a frame, or a late reply, on
/// the stream. The link is then marked broken and every later call fails
/// with [`TransportError::ConnectionClosed`]; reconnect to continue.
pub struct TcpLink {
    stream: TcpStream,
    peer: String,
    response_timeout: Option<Duration>,
    broken: bool,
}

impl TcpLink {
    /// Connect to the remote named in the configuration
    pub async fn connect(config: &TcpConfig) -> Result<Self, TransportError> {
        let addr = format!("{}:{}", config.host, config.port);
        let timeout = Duration::from_millis(config.connect_timeout_ms);

        info!(%addr, "Connecting to remote");

        let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::Timeout("Connection timeout".into()))?
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let mut link = Self::from_stream(stream, addr);
        if config.response_timeout_ms > 0 {
            link.response_timeout = Some(Duration::from_millis(config.response_timeout_ms));
        }
        Ok(link)
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream, peer: impl Into<String>) -> Self {
        Self {
            stream,
            peer: peer.into(),
            response_timeout: None,
            broken: false,
        }
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Whether an earlier failure left the stream out of step
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
            warn!(peer = %self.peer, error = %error, "Link out of step, closing");
            self.broken = true;
        }
    }

    async fn read_frame(&mut self) -> Result<Frame, TransportError> {
        match self.response_timeout {
            Some(timeout) => tokio::time::timeout(timeout, read_stream_frame(&mut self.stream))
                .await
                .map_err(|_| TransportError::Timeout("Response timeout".into()))?,
            None => read_stream_frame(&mut self.stream).await,
        }
    }
}

#[async_trait]
impl Link for TcpLink {
    async fn send_request(
        &mut self,
        kind: MessageKind,
        command: Command,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.ensure_usable()?;
        let frame = protocol::encode_request(kind, command, payload)?;
        debug!(%command, frame = ?frame, "Sending frame");
        if let Err(e) = write_stream_frame(&mut self.stream, &frame).await {
            self.mark_broken(&e);
            return Err(e);
        }
        Ok(())
    }

    async fn receive_response(&mut self) -> Result<Response, TransportError> {
        self.ensure_usable()?;
        let frame = match self.read_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                self.mark_broken(&e);
                return Err(e);
            }
        };
        debug!(frame = ?frame, "Received frame");
        Ok(protocol::decode_response(&frame)?)
    }

    fn description(&self) -> String {
        format!("tcp:{}", self.peer)
    }
}
