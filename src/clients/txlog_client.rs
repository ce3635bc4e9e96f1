//! Client for the transaction log actor.

use crate::model::{TransactionDraft, TransactionRecord};
use crate::txlog::{TransactionLogError, TransactionLogRequest};
use tokio::sync::{mpsc, oneshot};
use tracing::instrument;

/// Client for the transaction log actor.
#[derive(Clone)]
pub struct TransactionLogClient {
    sender: mpsc::Sender<TransactionLogRequest>,
}

impl TransactionLogClient {
    pub fn new(sender: mpsc::Sender<TransactionLogRequest>) -> Self {
        Self { sender }
    }

    /// Appends one committed dispense; returns the stamped record.
    #[instrument(skip(self, draft))]
    pub async fn append(
        &self,
        draft: TransactionDraft,
    ) -> Result<TransactionRecord, TransactionLogError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TransactionLogRequest::Append { draft, respond_to })
            .await
            .map_err(|_| TransactionLogError::ActorClosed)?;
        response.await.map_err(|_| TransactionLogError::ActorClosed)
    }

    /// Number of records appended so far.
    pub async fn count(&self) -> Result<usize, TransactionLogError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TransactionLogRequest::Count { respond_to })
            .await
            .map_err(|_| TransactionLogError::ActorClosed)?;
        response.await.map_err(|_| TransactionLogError::ActorClosed)
    }

    /// The most recent `limit` records, oldest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<TransactionRecord>, TransactionLogError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TransactionLogRequest::Recent { limit, respond_to })
            .await
            .map_err(|_| TransactionLogError::ActorClosed)?;
        response.await.map_err(|_| TransactionLogError::ActorClosed)
    }
}
