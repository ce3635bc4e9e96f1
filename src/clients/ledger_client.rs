//! Client for the inventory ledger actor.

use crate::ledger::{LedgerError, LedgerRequest};
use crate::model::InventoryItem;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Client for the inventory ledger actor.
#[derive(Clone)]
pub struct LedgerClient {
    sender: mpsc::Sender<LedgerRequest>,
}

impl LedgerClient {
    pub fn new(sender: mpsc::Sender<LedgerRequest>) -> Self {
        Self { sender }
    }

    /// Atomically reserves `quantity` units of `item`.
    ///
    /// The decrement happens now; call [`release`](Self::release) if the
    /// hardware step subsequently fails.
    #[instrument(skip(self))]
    pub async fn reserve(&self, item: &str, quantity: u32) -> Result<(), LedgerError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LedgerRequest::Reserve {
                item: item.to_string(),
                quantity,
                respond_to,
            })
            .await
            .map_err(|_| LedgerError::ActorClosed)?;
        response.await.map_err(|_| LedgerError::ActorClosed)?
    }

    /// Restores a reservation after a failed hardware step.
    #[instrument(skip(self))]
    pub async fn release(&self, item: &str, quantity: u32) -> Result<(), LedgerError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LedgerRequest::Release {
                item: item.to_string(),
                quantity,
                respond_to,
            })
            .await
            .map_err(|_| LedgerError::ActorClosed)?;
        response.await.map_err(|_| LedgerError::ActorClosed)?
    }

    /// Creates or replenishes an item.
    pub async fn set_stock(&self, item: &str, quantity: u32) -> Result<(), LedgerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LedgerRequest::SetStock {
                item: item.to_string(),
                quantity,
                respond_to,
            })
            .await
            .map_err(|_| LedgerError::ActorClosed)?;
        response.await.map_err(|_| LedgerError::ActorClosed)?
    }

    /// Current stock for `item`, or `None` if untracked.
    pub async fn stock_of(&self, item: &str) -> Result<Option<u32>, LedgerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LedgerRequest::StockOf {
                item: item.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| LedgerError::ActorClosed)?;
        response.await.map_err(|_| LedgerError::ActorClosed)
    }

    /// Snapshot of every tracked item, sorted by name.
    pub async fn items(&self) -> Result<Vec<InventoryItem>, LedgerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LedgerRequest::Items { respond_to })
            .await
            .map_err(|_| LedgerError::ActorClosed)?;
        response.await.map_err(|_| LedgerError::ActorClosed)
    }
}
