//! Link trait shared by every transport

use async_trait::async_trait;

use super::TransportError;
use crate::protocol::{Command, MessageKind, Response};

/// Transport-agnostic request/response channel to one remote
///
/// The protocol is half-duplex: each request is followed by exactly one
/// response before the next request goes out. Methods take `&mut self` so a
/// link can only ever carry one exchange at a time; talk to several remotes
/// through one link each.
///
/// Links do not retry and do not interpret status codes. Timeouts belong to
/// the underlying I/O and surface as [`TransportError::Timeout`].
#[async_trait]
pub trait Link: Send {
    /// Encode and send one request frame
    async fn send_request(
        &mut self,
        kind: MessageKind,
        command: Command,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Receive and decode one response frame
    async fn receive_response(&mut self) -> Result<Response, TransportError>;

    /// Short description for logs (e.g. `hidraw:/dev/hidraw3`)
    fn description(&self) -> String;

    /// Send a request and wait for its response
    async fn exchange(
        &mut self,
        command: Command,
        payload: &[u8],
    ) -> Result<Response, TransportError> {
        self.send_request(MessageKind::Request, command, payload)
            .await?;
        self.receive_response().await
    }
}

#[async_trait]
impl<L: Link + ?Sized> Link for Box<L> {
    async fn send_request(
        &mut self,
        kind: MessageKind,
        command: Command,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        (**self).send_request(kind, command, payload).await
    }

    async fn receive_response(&mut self) -> Result<Response, TransportError> {
        (**self).receive_response().await
    }

    fn description(&self) -> String {
        (**self).description()
    }

    async fn exchange(
        &mut self,
        command: Command,
        payload: &[u8],
    ) -> Result<Response, TransportError> {
        (**self).exchange(command, payload).await
    }
}
