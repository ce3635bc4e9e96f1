//! # Ration Kiosk
//!
//! Backend core of a ration-distribution kiosk: an operator selects a family
//! member and an allocated food item, and this crate validates the request
//! against the inventory ledger, commands the physical dispenser over a
//! serial link, and reconciles the result with the transaction log.
//!
//! ## Design Philosophy
//!
//! Every stateful component is an **actor**: a Tokio task that owns its state
//! outright, receives messages over a bounded mpsc channel, and answers
//! through oneshot reply channels. Sequential processing inside each actor is
//! what gives the kiosk its two hard guarantees without a single lock:
//!
//! - **No overselling**: the ledger's read-then-decrement can never
//!   interleave with another reservation.
//! - **One command on the wire**: the coordinator's run loop works on one
//!   request at a time, so at most one hardware session is ever in flight.
//!
//! ## Dispense Flow
//!
//! ```text
//! ingress → CoordinatorClient::dispense
//!             │  (bounded FIFO admission; overflow = rejected "busy")
//!             ▼
//!   DispenseCoordinator ── reserve ──▶ InventoryLedger
//!             │
//!             ├── DISPENSE,<item>,<qty> ──▶ DispenserLink ──▶ device
//!             │◀── COMPLETE / ERROR:<reason> / deadline ──┘
//!             │
//!             ├─ commit: append ──▶ TransactionLog, broadcast complete
//!             └─ fail:   release ──▶ InventoryLedger, broadcast error
//! ```
//!
//! Stock is reserved *before* the command is sent and the transaction is
//! recorded only *after* the device confirms; every non-commit path releases
//! the reservation exactly once.
//!
//! ## Module Tour
//!
//! - [`coordinator`] — the hardware gate and end-to-end orchestration.
//! - [`link`] — connection lifecycle, link state machine, wire protocol, and
//!   the transport seam ([`link::transport`]) with a simulated device
//!   ([`link::sim`]) for tests.
//! - [`ledger`] — atomic stock accounting.
//! - [`txlog`] — append-only record of committed dispenses.
//! - [`notify`] — broadcast fan-out of status events.
//! - [`clients`] — the typed interface layer; nothing else touches raw
//!   message passing.
//! - [`runtime`] — [`KioskSystem`](runtime::KioskSystem) wiring and tracing
//!   setup.
//! - [`config`] — environment-driven settings.
//! - [`model`] — plain data types shared by everything above.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the daemon against a real device with info logs
//! RUST_LOG=info KIOSK_SERIAL_PATH=/dev/ttyUSB0 cargo run
//!
//! # Run the test suite (simulated device, no hardware needed)
//! cargo test
//! ```

pub mod clients;
pub mod config;
pub mod coordinator;
pub mod ledger;
pub mod link;
pub mod model;
pub mod notify;
pub mod runtime;
pub mod txlog;
