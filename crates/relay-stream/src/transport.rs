//! Push-mode transport from the pipeline task to the response body

use crate::encoder::Frame;
use relay_common::{RelayError, Result};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// Body side of the transport: yields wire strings in production order
pub type FrameReceiver = ReceiverStream<String>;

/// Create a connected writer/receiver pair. `capacity` bounds how far the
/// pipeline may run ahead of the socket.
pub fn frame_channel(capacity: usize) -> (TransportWriter, FrameReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (TransportWriter::new(sender), ReceiverStream::new(receiver))
}

/// Writes frames to the response body as soon as they exist
#[derive(Debug)]
pub struct TransportWriter {
    sender: mpsc::Sender<String>,
    frames_written: u64,
    bytes_written: u64,
}

impl TransportWriter {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self {
            sender,
            frames_written: 0,
            bytes_written: 0,
        }
    }

    /// Write one frame. Fails with [`RelayError::Disconnected`] once the body
    /// has been dropped, which is how a client disconnect surfaces.
    pub async fn write(&mut self, frame: &Frame) -> Result<()> {
        let wire = frame.to_wire();
        let len = wire.len() as u64;

        self.sender
            .send(wire)
            .await
            .map_err(|_| RelayError::Disconnected)?;

        self.frames_written += 1;
        self.bytes_written += len;
        debug!(
            "Frame #{} written ({} bytes, target: {})",
            self.frames_written,
            len,
            frame.target().unwrap_or("<default>")
        );
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}
