//! Typed client handles for the kiosk actors.
//!
//! Nothing outside the actor modules touches raw message passing; each client
//! wraps the channel plumbing behind async methods and maps a vanished actor
//! to the module's `ActorClosed` error. All clients are cheap to clone and
//! safe to share across tasks.

pub mod coordinator_client;
pub mod ledger_client;
pub mod link_client;
pub mod txlog_client;

pub use coordinator_client::CoordinatorClient;
pub use ledger_client::LedgerClient;
pub use link_client::LinkClient;
pub use txlog_client::TransactionLogClient;
