//! Transaction log records.

use serde::{Deserialize, Serialize};

/// The payload of a transaction about to be recorded.
///
/// The log actor assigns the ID and timestamp at append time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub family_id: u32,
    pub item_name: String,
    pub quantity: u32,
}

/// An append-only record of one committed dispense.
///
/// Created only after the device confirms completion — never before the
/// hardware has actually moved. Records are never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub family_id: u32,
    pub item_name: String,
    pub quantity: u32,
    /// Seconds since the Unix epoch, stamped at append time.
    pub timestamp: u64,
}
