//! Client for the dispense coordinator actor.

use crate::coordinator::CoordinatorRequest;
use crate::model::{DispenseOutcome, DispenseRequest};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Client for the dispense coordinator. This is the public entry point the
/// request ingress calls once per client request.
#[derive(Clone)]
pub struct CoordinatorClient {
    sender: mpsc::Sender<CoordinatorRequest>,
}

impl CoordinatorClient {
    pub fn new(sender: mpsc::Sender<CoordinatorRequest>) -> Self {
        Self { sender }
    }

    /// Submits one dispense request and suspends until its terminal outcome.
    ///
    /// Admission is non-blocking: when the queue is already at depth the
    /// request is rejected as busy immediately instead of growing an
    /// unbounded backlog. Admitted requests are served in FIFO order and
    /// always resolve — worst case at the hardware session deadline.
    #[instrument(skip(self, request), fields(request_id = %request.request_id))]
    pub async fn dispense(&self, request: DispenseRequest) -> DispenseOutcome {
        let request_id = request.request_id.clone();
        let (respond_to, response) = oneshot::channel();
        match self.sender.try_send(CoordinatorRequest::Dispense {
            request,
            respond_to,
        }) {
            Ok(()) => match response.await {
                Ok(outcome) => outcome,
                Err(_) => DispenseOutcome::failed(request_id, "coordinator unavailable"),
            },
            Err(TrySendError::Full(_)) => {
                debug!("Admission queue full");
                DispenseOutcome::rejected(request_id, "busy")
            }
            Err(TrySendError::Closed(_)) => {
                DispenseOutcome::rejected(request_id, "coordinator unavailable")
            }
        }
    }
}
