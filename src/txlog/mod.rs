//! Transaction log actor.
//!
//! Append-only record of committed dispenses. The coordinator appends only
//! after the device confirms completion, so every record corresponds to a
//! physical dispense. The core never reads the log to make decisions; the
//! query messages exist for the management tier and for tests.

pub mod error;

pub use error::TransactionLogError;

use crate::clients::TransactionLogClient;
use crate::model::{TransactionDraft, TransactionRecord};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Messages understood by the transaction log actor.
#[derive(Debug)]
pub enum TransactionLogRequest {
    /// Append one committed dispense. Records are never mutated or deleted.
    Append {
        draft: TransactionDraft,
        respond_to: oneshot::Sender<TransactionRecord>,
    },
    /// Number of records appended so far.
    Count {
        respond_to: oneshot::Sender<usize>,
    },
    /// The most recent `limit` records, oldest first.
    Recent {
        limit: usize,
        respond_to: oneshot::Sender<Vec<TransactionRecord>>,
    },
}

/// The transaction log actor.
pub struct TransactionLog {
    receiver: mpsc::Receiver<TransactionLogRequest>,
    records: Vec<TransactionRecord>,
    next_id: u64,
}

/// Creates the transaction log actor and its client.
pub fn new(buffer_size: usize) -> (TransactionLog, TransactionLogClient) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let actor = TransactionLog {
        receiver,
        records: Vec::new(),
        next_id: 1,
    };
    (actor, TransactionLogClient::new(sender))
}

impl TransactionLog {
    /// Runs the actor's event loop until the channel closes.
    pub async fn run(mut self) {
        info!("Transaction log started");

        while let Some(msg) = self.receiver.recv().await {
            self.handle(msg);
        }

        info!(records = self.records.len(), "Transaction log shutdown");
    }

    fn handle(&mut self, msg: TransactionLogRequest) {
        match msg {
            TransactionLogRequest::Append { draft, respond_to } => {
                let record = TransactionRecord {
                    id: format!("txn_{}", self.next_id),
                    family_id: draft.family_id,
                    item_name: draft.item_name,
                    quantity: draft.quantity,
                    timestamp: unix_timestamp(),
                };
                self.next_id += 1;
                info!(
                    id = %record.id,
                    family_id = record.family_id,
                    item = %record.item_name,
                    quantity = record.quantity,
                    "Transaction recorded"
                );
                self.records.push(record.clone());
                let _ = respond_to.send(record);
            }
            TransactionLogRequest::Count { respond_to } => {
                debug!(records = self.records.len(), "Count query");
                let _ = respond_to.send(self.records.len());
            }
            TransactionLogRequest::Recent { limit, respond_to } => {
                let start = self.records.len().saturating_sub(limit);
                let _ = respond_to.send(self.records[start..].to_vec());
            }
        }
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(item: &str, quantity: u32) -> TransactionDraft {
        TransactionDraft {
            family_id: 1,
            item_name: item.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn append_assigns_sequential_ids() {
        let (actor, log) = new(8);
        tokio::spawn(actor.run());

        let first = log.append(draft("rice", 2)).await.unwrap();
        let second = log.append(draft("oil", 1)).await.unwrap();

        assert_eq!(first.id, "txn_1");
        assert_eq!(second.id, "txn_2");
        assert_eq!(log.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn recent_returns_newest_records() {
        let (actor, log) = new(8);
        tokio::spawn(actor.run());

        for i in 1..=5 {
            log.append(draft("rice", i)).await.unwrap();
        }

        let recent = log.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].quantity, 4);
        assert_eq!(recent[1].quantity, 5);
    }

    #[tokio::test]
    async fn recent_with_large_limit_returns_everything() {
        let (actor, log) = new(8);
        tokio::spawn(actor.run());

        log.append(draft("oil", 3)).await.unwrap();

        let recent = log.recent(100).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].item_name, "oil");
    }
}
