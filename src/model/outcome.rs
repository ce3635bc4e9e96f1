//! Terminal outcome of a dispense request.

use super::request::RequestId;
use serde::{Deserialize, Serialize};

/// How a dispense request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    /// Hardware confirmed the dispense; the stock decrement stands and a
    /// transaction was recorded.
    Committed,
    /// The request never reached the hardware (validation, stock, admission).
    Rejected,
    /// The hardware step started but did not complete; the reservation was
    /// rolled back.
    Failed,
}

/// The single, terminal outcome of one [`DispenseRequest`](super::DispenseRequest).
///
/// Every request resolves to exactly one of these; faults never surface as
/// errors past the coordinator boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispenseOutcome {
    pub request_id: RequestId,
    pub status: OutcomeStatus,
    pub reason: Option<String>,
}

impl DispenseOutcome {
    pub fn committed(request_id: RequestId) -> Self {
        Self {
            request_id,
            status: OutcomeStatus::Committed,
            reason: None,
        }
    }

    pub fn rejected(request_id: RequestId, reason: impl Into<String>) -> Self {
        Self {
            request_id,
            status: OutcomeStatus::Rejected,
            reason: Some(reason.into()),
        }
    }

    pub fn failed(request_id: RequestId, reason: impl Into<String>) -> Self {
        Self {
            request_id,
            status: OutcomeStatus::Failed,
            reason: Some(reason.into()),
        }
    }

    pub fn is_committed(&self) -> bool {
        self.status == OutcomeStatus::Committed
    }
}
