//! Network channel server
//!
//! Accepts TCP connections and answers length-delimited frames, one request
//! and one reply at a time per connection.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use remotez::transport::tcp::{read_stream_frame, write_stream_frame};
use remotez::TransportError;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::remote::SimulatedRemote;

pub struct SimServer {
    listener: TcpListener,
    remote: Arc<SimulatedRemote>,
}

impl SimServer {
    pub async fn bind(addr: &str, remote: Arc<SimulatedRemote>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, remote })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn remote(&self) -> &Arc<SimulatedRemote> {
        &self.remote
    }

    /// Accept connections until the listener fails
    pub async fn run(self) -> io::Result<()> {
        info!(addr = ?self.listener.local_addr().ok(), "Simulator listening");
        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!(%peer, "Client connected");
            let remote = Arc::clone(&self.remote);
            tokio::spawn(async move {
                match serve_connection(stream, remote).await {
                    Ok(()) => info!(%peer, "Client disconnected"),
                    Err(e) => warn!(%peer, error = %e, "Connection ended with error"),
                }
            });
        }
    }

    /// Run the accept loop on a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!(error = %e, "Simulator accept loop failed");
            }
        })
    }
}

/// Answer frames on one connection until the peer closes it
pub async fn serve_connection(
    mut stream: TcpStream,
    remote: Arc<SimulatedRemote>,
) -> Result<(), TransportError> {
    stream
        .set_nodelay(true)
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

    loop {
        let frame = match read_stream_frame(&mut stream).await {
            Ok(frame) => frame,
            Err(TransportError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        // Every request gets exactly one reply; close rather than leave the peer waiting
        let reply = match remote.handle_frame(&frame) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(error = %e, "Cannot answer request, closing connection");
                return Err(e.into());
            }
        };
        write_stream_frame(&mut stream, &reply).await?;
    }
}
