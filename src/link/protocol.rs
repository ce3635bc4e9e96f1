//! Wire protocol for the dispenser microcontroller.
//!
//! Line-oriented, newline-terminated ASCII. The device speaks three notices
//! (`READY`, `COMPLETE`, `ERROR:<reason>`); the host speaks one command
//! (`DISPENSE,<item>,<quantity>`). Anything else coming off the wire parses
//! to [`DeviceNotice::Unrecognized`] so the read loop can log and move on.

/// A parsed line received from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceNotice {
    /// The device finished initializing and accepts commands.
    Ready,
    /// The last command finished.
    Complete,
    /// The last command failed; the payload is free text from the firmware.
    Error(String),
    /// Anything else. Logged and discarded by the read loop.
    Unrecognized(String),
}

impl DeviceNotice {
    /// Parses one line; surrounding whitespace (including the stray `\r` a
    /// serial console tends to append) is ignored.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line == "READY" {
            DeviceNotice::Ready
        } else if line == "COMPLETE" {
            DeviceNotice::Complete
        } else if let Some(reason) = line.strip_prefix("ERROR:") {
            DeviceNotice::Error(reason.to_string())
        } else {
            DeviceNotice::Unrecognized(line.to_string())
        }
    }
}

/// A dispense command for the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispenseCommand {
    pub item: String,
    pub quantity: u32,
}

impl DispenseCommand {
    pub fn new(item: impl Into<String>, quantity: u32) -> Self {
        Self {
            item: item.into(),
            quantity,
        }
    }

    /// Encodes the command as a wire line, trailing newline included.
    pub fn encode(&self) -> String {
        format!("DISPENSE,{},{}\n", self.item, self.quantity)
    }
}
