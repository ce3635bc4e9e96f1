//! Inventory item tracked by the ledger.

use serde::{Deserialize, Serialize};

/// A single ration item and its remaining stock.
///
/// `quantity` is unsigned and is only ever mutated through the ledger actor's
/// serialized reserve/release/set operations, so it can never go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub quantity: u32,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}
