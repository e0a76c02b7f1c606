//! Mock link for testing

use std::collections::VecDeque;

use async_trait::async_trait;
use tracing::debug;

use super::{Link, TransportError};
use crate::config::MockConfig;
use crate::protocol::{self, Command, Frame, MessageKind, Response, Status};

/// A request as the mock saw it on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub kind: MessageKind,
    pub command: Command,
    pub payload: Vec<u8>,
    pub frame: Frame,
}

/// Scripted link
///
/// Responses are queued ahead of time and handed out in order, each one
/// answering whatever request was sent last. With an empty queue the mock
/// answers `OK` with no payload. Every request goes through the real codec and
/// is recorded for inspection.
pub struct MockLink {
    config: MockConfig,
    connected: bool,
    responses: VecDeque<Result<Response, TransportError>>,
    sent: Vec<SentRequest>,
    awaiting_response: Option<Command>,
}

impl MockLink {
    pub fn new(config: &MockConfig) -> Self {
        Self {
            config: config.clone(),
            connected: true,
            responses: VecDeque::new(),
            sent: Vec::new(),
            awaiting_response: None,
        }
    }

    /// Queue a response for the next exchange
    ///
    /// The command byte is filled in from the request it answers.
    pub fn push_response(&mut self, status: Status, payload: impl Into<Vec<u8>>) {
        self.responses.push_back(Ok(Response {
            command: Command::Unknown(0),
            status,
            payload: payload.into(),
        }));
    }

    /// Queue `OK` with a payload
    pub fn push_ok(&mut self, payload: impl Into<Vec<u8>>) {
        self.push_response(Status::Ok, payload);
    }

    /// Queue a response carrying an explicit command byte
    pub fn push_raw_response(&mut self, response: Response) {
        self.responses.push_back(Ok(response));
    }

    /// Queue a transport failure
    pub fn push_error(&mut self, error: TransportError) {
        self.responses.push_back(Err(error));
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Every request sent so far, oldest first
    pub fn sent(&self) -> &[SentRequest] {
        &self.sent
    }

    /// Commands of every request sent so far
    pub fn sent_commands(&self) -> Vec<Command> {
        self.sent.iter().map(|r| r.command).collect()
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }

    /// Responses still queued
    pub fn pending_responses(&self) -> usize {
        self.responses.len()
    }
}

#[async_trait]
impl Link for MockLink {
    async fn send_request(
        &mut self,
        kind: MessageKind,
        command: Command,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::ConnectionClosed);
        }

        let frame = protocol::encode_request(kind, command, payload)?;
        debug!(%command, frame = ?frame, "Mock link: sent request");

        self.sent.push(SentRequest {
            kind,
            command,
            payload: payload.to_vec(),
            frame,
        });
        self.awaiting_response = Some(command);
        Ok(())
    }

    async fn receive_response(&mut self) -> Result<Response, TransportError> {
        if !self.connected {
            return Err(TransportError::ConnectionClosed);
        }

        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        let command = self
            .awaiting_response
            .take()
            .ok_or_else(|| TransportError::ReceiveFailed("No request outstanding".to_string()))?;

        let scripted = self.responses.pop_front().unwrap_or_else(|| {
            Ok(Response {
                command,
                status: Status::Ok,
                payload: Vec::new(),
            })
        })?;

        let command = match scripted.command {
            Command::Unknown(0) => command,
            explicit => explicit,
        };

        // Round-trip through the codec so size limits apply to scripted replies too
        let frame = protocol::encode_response(command, scripted.status, &scripted.payload)?;
        Ok(protocol::decode_response(&frame)?)
    }

    fn description(&self) -> String {
        "mock".to_string()
    }
}
