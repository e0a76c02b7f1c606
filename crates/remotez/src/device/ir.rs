//! Raw IR playback and IR learning

use tracing::{debug, instrument, warn};

use super::{wire_len, RemoteDevice};
use crate::error::Result;
use crate::protocol::Command;
use crate::transfer::{length_header, TransferFamily};
use crate::transport::Link;

impl<L: Link + ?Sized> RemoteDevice<L> {
    /// Upload a raw IR waveform for later playback
    #[instrument(skip(self, waveform), fields(len = waveform.len()))]
    pub async fn cache_raw_ir(&mut self, waveform: &[u8]) -> Result<()> {
        let length = wire_len(waveform.len())?;
        self.write_transfer(TransferFamily::RAW_IR_CACHE, &length_header(length), waveform)
            .await
    }

    /// Play the cached waveform
    #[instrument(skip(self))]
    pub async fn execute_raw_ir(&mut self) -> Result<()> {
        self.request(Command::ExecuteRawIr, &[]).await?;
        Ok(())
    }

    /// Capture one IR signal
    ///
    /// Arms the receiver, reads the capture, then stops learning. The stop is
    /// also sent when the capture fails. The capture is returned undecoded.
    #[instrument(skip(self))]
    pub async fn learn_ir(&mut self) -> Result<Vec<u8>> {
        self.request(Command::LearnIr, &[]).await?;

        let capture = self.read_transfer(TransferFamily::LEARN_IR, &[], None).await;
        match capture {
            Ok(data) => {
                self.stop_learn_ir().await?;
                debug!(bytes = data.len(), "IR captured");
                Ok(data)
            }
            Err(e) => {
                if let Err(stop) = self.stop_learn_ir().await {
                    warn!(error = %stop, "Failed to stop IR learning");
                }
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn stop_learn_ir(&mut self) -> Result<()> {
        self.request(Command::LearnIrStop, &[]).await?;
        Ok(())
    }
}
