use crate::clients::{CoordinatorClient, LedgerClient, LinkClient, TransactionLogClient};
use crate::config::KioskConfig;
use crate::coordinator::{self, CoordinatorContext};
use crate::ledger;
use crate::link::{self, transport::LinkTransport};
use crate::notify::NotificationChannel;
use crate::txlog;
use tracing::{error, info};

/// The main runtime orchestrator for the kiosk.
///
/// `KioskSystem` is responsible for:
/// - **Lifecycle management**: spawning and shutting down all actors
/// - **Dependency wiring**: injecting each actor's context at `run` time
///
/// # Architecture
///
/// Four actors: the inventory ledger, the transaction log, the dispenser
/// link, and the coordinator that orchestrates the other three. The
/// notification channel is plain broadcast state shared by link and
/// coordinator; it needs no task of its own.
///
/// # Example
///
/// ```ignore
/// let system = KioskSystem::start(&config, SerialTransport::new(&config.serial_path, config.baud_rate));
/// system.ledger.set_stock("rice", 50).await?;
/// system.link.open().await?;
/// let outcome = system.coordinator.dispense(request).await;
/// system.shutdown().await?;
/// ```
pub struct KioskSystem {
    /// Client for the dispense coordinator (the public dispense entry point)
    pub coordinator: CoordinatorClient,

    /// Client for the inventory ledger
    pub ledger: LedgerClient,

    /// Client for the dispenser link
    pub link: LinkClient,

    /// Client for the transaction log
    pub transactions: TransactionLogClient,

    /// Broadcast channel carrying kiosk status events
    pub events: NotificationChannel,

    /// Task handles for all running actors (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl KioskSystem {
    /// Spawns every actor over the given transport and wires their
    /// dependencies.
    ///
    /// The link is *not* opened here: opening is a separate, explicit step so
    /// a missing device is a visible startup error rather than a silent
    /// retry loop.
    pub fn start<T: LinkTransport>(config: &KioskConfig, transport: T) -> Self {
        let events = NotificationChannel::new(config.event_capacity);

        // =====================================================================
        // 1. Leaf actors: ledger and transaction log
        // =====================================================================

        let (ledger_actor, ledger) = ledger::new(32);
        let ledger_handle = tokio::spawn(ledger_actor.run());

        let (txlog_actor, transactions) = txlog::new(32);
        let txlog_handle = tokio::spawn(txlog_actor.run());

        // =====================================================================
        // 2. Dispenser link
        // =====================================================================

        let (link_actor, link) = link::new(transport, config.command_timeout, 32);
        let link_handle = tokio::spawn(link_actor.run(events.clone()));

        // =====================================================================
        // 3. Coordinator (with dependencies)
        // =====================================================================

        // The coordinator's queue depth is the admission bound for the
        // single hardware gate.
        let (coordinator_actor, coordinator) = coordinator::new(config.queue_depth);
        let ctx = CoordinatorContext {
            ledger: ledger.clone(),
            link: link.clone(),
            txlog: transactions.clone(),
            events: events.clone(),
        };
        let coordinator_handle = tokio::spawn(coordinator_actor.run(ctx));

        info!("Kiosk system started");

        Self {
            coordinator,
            ledger,
            link,
            transactions,
            events,
            handles: vec![ledger_handle, txlog_handle, link_handle, coordinator_handle],
        }
    }

    /// Gracefully shuts the system down.
    ///
    /// Dropping the clients closes their channels; each actor detects the
    /// closed channel and exits its loop (the coordinator first, which in
    /// turn releases its context's clients). Then every task is awaited.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        drop(self.coordinator);
        drop(self.ledger);
        drop(self.link);
        drop(self.transactions);
        drop(self.events);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
