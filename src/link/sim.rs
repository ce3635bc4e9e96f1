//! Channel-backed simulated device.
//!
//! Stands in for the serial transport in tests and hardware-free demos: the
//! test holds the [`SimulatedDevice`] end and plays the firmware's role,
//! reading the command lines the host writes and injecting response lines.

use super::error::LinkError;
use super::transport::{LineSink, LineSource, LinkTransport};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Creates a simulated transport and the device handle driving it.
pub fn simulated() -> (SimulatedTransport, SimulatedDevice) {
    let (command_tx, command_rx) = mpsc::channel(32);
    let (response_tx, response_rx) = mpsc::channel(32);
    (
        SimulatedTransport {
            halves: Some((
                ChannelWriter { sender: command_tx },
                ChannelReader {
                    receiver: response_rx,
                },
            )),
        },
        SimulatedDevice {
            commands: command_rx,
            responses: response_tx,
        },
    )
}

/// The firmware's side of the conversation.
pub struct SimulatedDevice {
    commands: mpsc::Receiver<String>,
    responses: mpsc::Sender<String>,
}

impl SimulatedDevice {
    /// Next raw command line written by the host, or `None` once the link
    /// stops writing for good.
    pub async fn next_command(&mut self) -> Option<String> {
        self.commands.recv().await
    }

    /// Non-blocking probe for a pending command line.
    pub fn try_next_command(&mut self) -> Option<String> {
        self.commands.try_recv().ok()
    }

    /// Sends one raw line to the host.
    pub async fn send_line(&self, line: impl Into<String>) {
        let _ = self.responses.send(line.into()).await;
    }

    /// Announces readiness, as the firmware does right after boot.
    pub async fn announce_ready(&self) {
        self.send_line("READY").await;
    }

    /// Drops both halves; the host observes EOF on its read loop.
    pub fn disconnect(self) {}
}

/// Transport that connects the link actor to a [`SimulatedDevice`].
///
/// Single-shot: a simulated device cannot be re-plugged, so a second
/// `connect` fails the way a missing serial port would.
pub struct SimulatedTransport {
    halves: Option<(ChannelWriter, ChannelReader)>,
}

pub struct ChannelWriter {
    sender: mpsc::Sender<String>,
}

pub struct ChannelReader {
    receiver: mpsc::Receiver<String>,
}

#[async_trait]
impl LinkTransport for SimulatedTransport {
    type Writer = ChannelWriter;
    type Reader = ChannelReader;

    async fn connect(&mut self) -> Result<(Self::Writer, Self::Reader), LinkError> {
        self.halves
            .take()
            .ok_or_else(|| LinkError::ConnectionError("simulated device gone".to_string()))
    }
}

#[async_trait]
impl LineSink for ChannelWriter {
    async fn write_line(&mut self, line: &str) -> Result<(), LinkError> {
        self.sender
            .send(line.to_string())
            .await
            .map_err(|_| LinkError::WriteError("device hung up".to_string()))
    }
}

#[async_trait]
impl LineSource for ChannelReader {
    async fn next_line(&mut self) -> Result<Option<String>, LinkError> {
        Ok(self.receiver.recv().await)
    }
}
