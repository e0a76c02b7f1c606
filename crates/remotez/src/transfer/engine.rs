//! Transfer state machine

use tracing::{debug, warn};

use super::{Direction, TransferFamily};
use crate::error::{RemoteError, Result};
use crate::protocol::{Command, Response, Status, MAX_PAYLOAD};
use crate::transport::Link;

/// Send one request and check the reply answers it
///
/// Status is left to the caller.
pub(crate) async fn exchange_echoed<L>(
    link: &mut L,
    command: Command,
    payload: &[u8],
) -> Result<Response>
where
    L: Link + ?Sized,
{
    let response = link.exchange(command, payload).await?;
    if response.command != command {
        return Err(RemoteError::InvalidResponse(format!(
            "expected reply to {}, got {}",
            command, response.command
        )));
    }
    Ok(response)
}

/// Lifecycle of one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    HeaderSent,
    Transferring,
    Done,
    Aborted,
}

impl TransferState {
    fn is_open(self) -> bool {
        matches!(self, Self::HeaderSent | Self::Transferring)
    }
}

/// Bookkeeping for one transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSession {
    pub family: TransferFamily,
    /// Total bytes, when known
    pub declared: Option<usize>,
    pub transferred: usize,
    /// Handle allocated by the device in its HEADER reply
    pub handle: Option<u8>,
    pub state: TransferState,
}

impl TransferSession {
    fn new(family: TransferFamily) -> Self {
        Self {
            family,
            declared: None,
            transferred: 0,
            handle: None,
            state: TransferState::Idle,
        }
    }

    /// Bytes left before the declared length is reached
    pub fn remaining(&self) -> Option<usize> {
        self.declared.map(|d| d.saturating_sub(self.transferred))
    }
}

/// One segmented transfer over a borrowed link
///
/// The link stays mutably borrowed until the transfer is dropped, so nothing
/// else can interleave requests with the session.
pub struct Transfer<'a, L: Link + ?Sized> {
    link: &'a mut L,
    session: TransferSession,
    chunk_size: usize,
}

impl<'a, L: Link + ?Sized> Transfer<'a, L> {
    pub fn new(link: &'a mut L, family: TransferFamily, chunk_size: usize) -> Self {
        Self {
            link,
            session: TransferSession::new(family),
            chunk_size: chunk_size.clamp(1, MAX_PAYLOAD),
        }
    }

    pub fn session(&self) -> &TransferSession {
        &self.session
    }

    pub fn state(&self) -> TransferState {
        self.session.state
    }

    fn abort(&mut self, error: RemoteError) -> RemoteError {
        warn!(
            family = self.session.family.name,
            transferred = self.session.transferred,
            error = %error,
            "Transfer aborted"
        );
        self.session.state = TransferState::Aborted;
        error
    }

    fn require_open(&self, direction: Direction) -> Result<()> {
        if !self.session.state.is_open() {
            return Err(RemoteError::TransferState(format!(
                "{} transfer is {:?}",
                self.session.family.name, self.session.state
            )));
        }
        if self.session.family.direction != direction {
            return Err(RemoteError::TransferState(format!(
                "{} transfer does not {:?}",
                self.session.family.name, direction
            )));
        }
        Ok(())
    }

    /// Send HEADER and open the session
    ///
    /// `declared` is the total length when the host knows it. For a read of
    /// unknown length a 4-byte reply declares it; otherwise the first reply
    /// byte is kept as the device handle. Returns the raw header reply.
    pub async fn begin(&mut self, header: &[u8], declared: Option<usize>) -> Result<Vec<u8>> {
        if self.session.state != TransferState::Idle {
            return Err(RemoteError::TransferState(format!(
                "{} transfer already started",
                self.session.family.name
            )));
        }

        let command = self.session.family.header;
        let response = match exchange_echoed(&mut *self.link, command, header).await {
            Ok(r) => r,
            Err(e) => return Err(self.abort(e)),
        };
        if !response.status.is_ok() {
            let status = response.status;
            return Err(self.abort(RemoteError::Status { command, status }));
        }

        self.session.declared = declared;
        let reply = &response.payload;
        if declared.is_none() && self.session.family.direction == Direction::Read && reply.len() == 4
        {
            let length = u32::from_le_bytes([reply[0], reply[1], reply[2], reply[3]]);
            self.session.declared = Some(length as usize);
        } else if let Some(&handle) = reply.first() {
            self.session.handle = Some(handle);
        }

        self.session.state = TransferState::HeaderSent;
        debug!(
            family = self.session.family.name,
            declared = ?self.session.declared,
            handle = ?self.session.handle,
            "Transfer opened"
        );
        Ok(response.payload)
    }

    /// Send one DATA request carrying `chunk`
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.require_open(Direction::Write)?;

        if let Some(declared) = self.session.declared {
            if self.session.transferred + chunk.len() > declared {
                return Err(RemoteError::TransferOverrun {
                    declared,
                    transferred: self.session.transferred,
                    attempted: chunk.len(),
                });
            }
        }

        let command = self.session.family.data;
        let response = match exchange_echoed(&mut *self.link, command, chunk).await {
            Ok(r) => r,
            Err(e) => return Err(self.abort(e)),
        };
        if !response.status.is_ok() {
            let status = response.status;
            return Err(self.abort(RemoteError::Status { command, status }));
        }

        self.session.transferred += chunk.len();
        self.session.state = TransferState::Transferring;
        debug!(
            family = self.session.family.name,
            chunk = chunk.len(),
            transferred = self.session.transferred,
            "Chunk written"
        );
        Ok(())
    }

    /// Write all of `data` in chunk-sized DATA requests
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        for chunk in data.chunks(self.chunk_size) {
            self.write_chunk(chunk).await?;
        }
        Ok(())
    }

    /// Request the next chunk
    ///
    /// Returns `None` once the declared length is reached or, for unknown
    /// lengths, once the device answers NO_MORE_DATA.
    pub async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        self.require_open(Direction::Read)?;

        let wanted = match self.session.remaining() {
            Some(0) => return Ok(None),
            Some(remaining) => remaining.min(self.chunk_size),
            None => self.chunk_size,
        };

        let command = self.session.family.data;
        let response = match exchange_echoed(&mut *self.link, command, &[wanted as u8]).await {
            Ok(r) => r,
            Err(e) => return Err(self.abort(e)),
        };

        match response.status {
            Status::Ok => {}
            Status::NoMoreData if self.session.declared.is_none() => {
                self.session.declared = Some(self.session.transferred);
                self.session.state = TransferState::Transferring;
                debug!(
                    family = self.session.family.name,
                    transferred = self.session.transferred,
                    "Device reported end of data"
                );
                return Ok(None);
            }
            status => return Err(self.abort(RemoteError::Status { command, status })),
        }

        let data = response.payload;
        if data.len() > wanted {
            let error = RemoteError::TransferOverrun {
                declared: self.session.declared.unwrap_or(self.session.transferred + wanted),
                transferred: self.session.transferred,
                attempted: data.len(),
            };
            return Err(self.abort(error));
        }
        if data.is_empty() {
            return Err(self.abort(RemoteError::InvalidResponse(format!(
                "{} returned no data",
                command
            ))));
        }

        self.session.transferred += data.len();
        self.session.state = TransferState::Transferring;
        debug!(
            family = self.session.family.name,
            chunk = data.len(),
            transferred = self.session.transferred,
            "Chunk read"
        );
        Ok(Some(data))
    }

    /// Read chunks until the data phase ends
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.session.declared.unwrap_or(0));
        while let Some(chunk) = self.read_chunk().await? {
            data.extend_from_slice(&chunk);
        }
        Ok(data)
    }

    /// Send DONE and close the session
    pub async fn finish(mut self) -> Result<TransferSession> {
        if !self.session.state.is_open() {
            return Err(RemoteError::TransferState(format!(
                "{} transfer is {:?}",
                self.session.family.name, self.session.state
            )));
        }

        let declared = self.session.declared.unwrap_or(self.session.transferred);
        if self.session.transferred != declared {
            return Err(RemoteError::TransferIncomplete {
                declared,
                transferred: self.session.transferred,
            });
        }

        let command = self.session.family.done;
        let response = match exchange_echoed(&mut *self.link, command, &[]).await {
            Ok(r) => r,
            Err(e) => return Err(self.abort(e)),
        };
        if !response.status.is_ok() {
            let status = response.status;
            return Err(self.abort(RemoteError::Status { command, status }));
        }

        self.session.declared = Some(declared);
        self.session.state = TransferState::Done;
        debug!(
            family = self.session.family.name,
            transferred = self.session.transferred,
            "Transfer complete"
        );
        Ok(self.session)
    }
}
