//! Transport seam between the link actor and the physical device.
//!
//! The link actor is generic over [`LinkTransport`] so the serial port can be
//! swapped for a channel-backed simulated device in tests and demos (see
//! [`sim`](super::sim)). The real transport drives a `tokio-serial` stream
//! split into a buffered line reader and a write half.

use super::error::LinkError;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// The host-to-device half of a connection.
#[async_trait]
pub trait LineSink: Send + 'static {
    /// Writes one raw line (trailing newline included) to the device.
    async fn write_line(&mut self, line: &str) -> Result<(), LinkError>;
}

/// The device-to-host half of a connection.
#[async_trait]
pub trait LineSource: Send + 'static {
    /// Reads the next newline-delimited line, or `None` once the device
    /// hangs up.
    async fn next_line(&mut self) -> Result<Option<String>, LinkError>;
}

/// Connection factory: turns transport configuration into a live
/// reader/writer pair.
#[async_trait]
pub trait LinkTransport: Send + 'static {
    type Writer: LineSink;
    type Reader: LineSource;

    async fn connect(&mut self) -> Result<(Self::Writer, Self::Reader), LinkError>;
}

/// Real serial-port transport.
///
/// The deployed kiosk talks to the microcontroller at 9600 baud; both the
/// path and the rate come from [`KioskConfig`](crate::config::KioskConfig).
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
}

impl SerialTransport {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
        }
    }
}

pub struct SerialWriter {
    inner: WriteHalf<SerialStream>,
}

pub struct SerialReader {
    lines: Lines<BufReader<ReadHalf<SerialStream>>>,
}

#[async_trait]
impl LinkTransport for SerialTransport {
    type Writer = SerialWriter;
    type Reader = SerialReader;

    async fn connect(&mut self) -> Result<(Self::Writer, Self::Reader), LinkError> {
        let stream = tokio_serial::new(self.path.as_str(), self.baud_rate)
            .open_native_async()
            .map_err(|e| LinkError::ConnectionError(e.to_string()))?;
        let (read, write) = tokio::io::split(stream);
        Ok((
            SerialWriter { inner: write },
            SerialReader {
                lines: BufReader::new(read).lines(),
            },
        ))
    }
}

#[async_trait]
impl LineSink for SerialWriter {
    async fn write_line(&mut self, line: &str) -> Result<(), LinkError> {
        self.inner
            .write_all(line.as_bytes())
            .await
            .map_err(|e| LinkError::WriteError(e.to_string()))?;
        self.inner
            .flush()
            .await
            .map_err(|e| LinkError::WriteError(e.to_string()))
    }
}

#[async_trait]
impl LineSource for SerialReader {
    async fn next_line(&mut self) -> Result<Option<String>, LinkError> {
        self.lines
            .next_line()
            .await
            .map_err(|e| LinkError::ConnectionError(e.to_string()))
    }
}
