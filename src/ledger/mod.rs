//! Inventory ledger actor.
//!
//! The ledger owns the per-item stock counters and is the only place stock is
//! ever mutated. It processes one message at a time, which is the whole
//! atomicity story: a `Reserve` is a read-then-conditionally-decrement that no
//! other reservation can interleave with, so two concurrent reservations for
//! the same item can never both succeed past the available stock.
//!
//! Stock is decremented optimistically at reservation time, before hardware
//! confirmation. `Release` is the compensating action that restores it when a
//! hardware session fails; commit needs no further ledger work.

pub mod error;

pub use error::LedgerError;

use crate::clients::LedgerClient;
use crate::model::InventoryItem;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// One-shot reply channel for ledger operations.
pub type LedgerResponse<T> = oneshot::Sender<Result<T, LedgerError>>;

/// Messages understood by the ledger actor.
#[derive(Debug)]
pub enum LedgerRequest {
    /// Atomic check-and-decrement of an item's stock.
    Reserve {
        item: String,
        quantity: u32,
        respond_to: LedgerResponse<()>,
    },
    /// Compensating action: restore a reservation after a failed session.
    Release {
        item: String,
        quantity: u32,
        respond_to: LedgerResponse<()>,
    },
    /// Create or replenish an item.
    SetStock {
        item: String,
        quantity: u32,
        respond_to: LedgerResponse<()>,
    },
    /// Current stock for one item.
    StockOf {
        item: String,
        respond_to: oneshot::Sender<Option<u32>>,
    },
    /// Snapshot of every tracked item.
    Items {
        respond_to: oneshot::Sender<Vec<InventoryItem>>,
    },
}

/// The inventory ledger actor.
pub struct InventoryLedger {
    receiver: mpsc::Receiver<LedgerRequest>,
    stock: HashMap<String, u32>,
}

/// Creates the ledger actor and its client.
pub fn new(buffer_size: usize) -> (InventoryLedger, LedgerClient) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let actor = InventoryLedger {
        receiver,
        stock: HashMap::new(),
    };
    (actor, LedgerClient::new(sender))
}

impl InventoryLedger {
    /// Runs the actor's event loop until the channel closes.
    pub async fn run(mut self) {
        info!("Ledger started");

        while let Some(msg) = self.receiver.recv().await {
            self.handle(msg);
        }

        info!(items = self.stock.len(), "Ledger shutdown");
    }

    fn handle(&mut self, msg: LedgerRequest) {
        match msg {
            LedgerRequest::Reserve {
                item,
                quantity,
                respond_to,
            } => {
                let result = self.reserve(&item, quantity);
                match &result {
                    Ok(()) => info!(%item, quantity, "Reserved"),
                    Err(e) => warn!(%item, quantity, error = %e, "Reserve refused"),
                }
                let _ = respond_to.send(result);
            }
            LedgerRequest::Release {
                item,
                quantity,
                respond_to,
            } => {
                let result = self.release(&item, quantity);
                match &result {
                    Ok(()) => info!(%item, quantity, "Released"),
                    Err(e) => warn!(%item, quantity, error = %e, "Release failed"),
                }
                let _ = respond_to.send(result);
            }
            LedgerRequest::SetStock {
                item,
                quantity,
                respond_to,
            } => {
                info!(%item, quantity, "Stock set");
                self.stock.insert(item, quantity);
                let _ = respond_to.send(Ok(()));
            }
            LedgerRequest::StockOf { item, respond_to } => {
                let quantity = self.stock.get(&item).copied();
                debug!(%item, ?quantity, "Stock query");
                let _ = respond_to.send(quantity);
            }
            LedgerRequest::Items { respond_to } => {
                let mut items: Vec<InventoryItem> = self
                    .stock
                    .iter()
                    .map(|(name, quantity)| InventoryItem::new(name.clone(), *quantity))
                    .collect();
                items.sort_by(|a, b| a.name.cmp(&b.name));
                let _ = respond_to.send(items);
            }
        }
    }

    fn reserve(&mut self, item: &str, quantity: u32) -> Result<(), LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        let available = self
            .stock
            .get_mut(item)
            .ok_or_else(|| LedgerError::NotFound(item.to_string()))?;
        if *available < quantity {
            return Err(LedgerError::InsufficientStock {
                requested: quantity,
                available: *available,
            });
        }
        *available -= quantity;
        Ok(())
    }

    fn release(&mut self, item: &str, quantity: u32) -> Result<(), LedgerError> {
        let available = self
            .stock
            .get_mut(item)
            .ok_or_else(|| LedgerError::NotFound(item.to_string()))?;
        *available = available.saturating_add(quantity);
        Ok(())
    }
}
