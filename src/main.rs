//! Kiosk daemon entry point.
//!
//! Wires the actor system over the real serial transport, opens the link and
//! logs broadcast events until interrupted. The web ingress and the
//! persistent stores attach through the clients exposed by
//! [`KioskSystem`]; this binary is the device-side core.

use ration_kiosk::config::KioskConfig;
use ration_kiosk::link::transport::SerialTransport;
use ration_kiosk::runtime::{setup_tracing, KioskSystem};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = KioskConfig::load();
    info!(
        serial = %config.serial_path,
        baud = config.baud_rate,
        "Starting ration kiosk"
    );

    let transport = SerialTransport::new(&config.serial_path, config.baud_rate);
    let system = KioskSystem::start(&config, transport);

    // Demo stock so a bare kiosk can dispense out of the box; the management
    // tier seeds the real inventory through this same client.
    for (item, quantity) in [("rice", 50), ("wheat", 40), ("sugar", 25), ("oil", 20)] {
        system
            .ledger
            .set_stock(item, quantity)
            .await
            .map_err(|e| e.to_string())?;
    }

    system.link.open().await.map_err(|e| e.to_string())?;
    info!("Dispenser link open, waiting for device");

    let mut events = system.events.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => info!(?event, "Kiosk event"),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Event stream lagging"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    system.shutdown().await?;
    info!("Kiosk stopped");
    Ok(())
}
