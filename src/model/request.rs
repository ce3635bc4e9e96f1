//! Dispense request identity and payload.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

/// Type-safe identifier for dispense requests.
///
/// Opaque to everything except logging; equality is all the kiosk relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

impl RequestId {
    /// Generates a process-unique request token.
    pub fn generate() -> Self {
        let id = NEXT_REQUEST.fetch_add(1, Ordering::SeqCst);
        Self(format!("req_{}", id))
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One attempt to dispense an allocated item for a family member.
///
/// Immutable once constructed; identified by its `request_id` for the whole
/// of its lifetime (admission queue, hardware session, outcome).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispenseRequest {
    pub request_id: RequestId,
    pub family_id: u32,
    pub member_id: u32,
    pub item: String,
    pub quantity: u32,
}

impl DispenseRequest {
    /// Builds a request with a freshly generated ID.
    pub fn new(family_id: u32, member_id: u32, item: impl Into<String>, quantity: u32) -> Self {
        Self {
            request_id: RequestId::generate(),
            family_id,
            member_id,
            item: item.into(),
            quantity,
        }
    }
}
