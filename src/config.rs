//! Environment-driven configuration for the kiosk daemon.

use std::{env, fmt::Display, str::FromStr, time::Duration};
use tracing::info;

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct KioskConfig {
    /// Serial device path (`COM3` on the deployed kiosk, a tty elsewhere).
    pub serial_path: String,
    /// Baud rate of the dispenser microcontroller.
    pub baud_rate: u32,
    /// Upper bound on one hardware session, command sent to terminal notice.
    pub command_timeout: Duration,
    /// Admission queue depth; requests beyond it are rejected as busy.
    pub queue_depth: usize,
    /// Broadcast buffer for kiosk events, per subscriber.
    pub event_capacity: usize,
}

impl KioskConfig {
    /// Loads configuration from the environment, falling back to defaults.
    pub fn load() -> Self {
        Self {
            serial_path: try_load("KIOSK_SERIAL_PATH", "/dev/ttyUSB0"),
            baud_rate: try_load("KIOSK_BAUD_RATE", "9600"),
            command_timeout: Duration::from_millis(try_load("KIOSK_COMMAND_TIMEOUT_MS", "5000")),
            queue_depth: try_load("KIOSK_QUEUE_DEPTH", "8"),
            event_capacity: try_load("KIOSK_EVENT_CAPACITY", "64"),
        }
    }
}

impl Default for KioskConfig {
    /// Defaults without consulting the environment (what tests build on).
    fn default() -> Self {
        Self {
            serial_path: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            command_timeout: Duration::from_secs(5),
            queue_depth: 8,
            event_capacity: 64,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| format!("Invalid {key} value: {e}"))
        .expect("Environment misconfigured!")
}
