//! Dispense coordinator actor.
//!
//! The coordinator orchestrates one dispense request end-to-end: admission,
//! stock reservation, the hardware session, and the commit-or-roll-back
//! reconciliation with the transaction log and the broadcast channel.
//!
//! # The hardware gate
//!
//! The physical dispenser is a singleton, so concurrent requests must be
//! serialized. The coordinator's bounded inbox *is* that gate: requests are
//! admitted in FIFO order and the run loop works on exactly one at a time, so
//! at most one hardware session is ever in flight. The queue depth bounds the
//! backlog; [`CoordinatorClient::dispense`](crate::clients::CoordinatorClient::dispense)
//! rejects overflow as busy without blocking.
//!
//! The ledger stays atomic independently of this gate: the gate protects the
//! physical actuator, the ledger actor protects the logical stock count.
//!
//! # Reservation discipline
//!
//! Stock is reserved before the command is sent (never dispense without a
//! reservation) and the transaction is recorded only after the device
//! confirms (never record what did not physically happen). Every non-commit
//! path after a successful reservation releases it exactly once.

use crate::clients::{CoordinatorClient, LedgerClient, LinkClient, TransactionLogClient};
use crate::ledger::LedgerError;
use crate::link::{DispenseCommand, LinkState, SessionOutcome};
use crate::model::{DispenseOutcome, DispenseRequest, OutcomeStatus, TransactionDraft};
use crate::notify::{KioskEvent, NotificationChannel};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Messages understood by the coordinator actor.
#[derive(Debug)]
pub enum CoordinatorRequest {
    Dispense {
        request: DispenseRequest,
        respond_to: oneshot::Sender<DispenseOutcome>,
    },
}

/// Dependencies injected at `run` time, so the system can wire actors in any
/// order.
pub struct CoordinatorContext {
    pub ledger: LedgerClient,
    pub link: LinkClient,
    pub txlog: TransactionLogClient,
    pub events: NotificationChannel,
}

/// The dispense coordinator actor.
pub struct DispenseCoordinator {
    receiver: mpsc::Receiver<CoordinatorRequest>,
}

/// Creates the coordinator actor and its client.
///
/// `queue_depth` is the admission bound: that many requests may wait for the
/// hardware before further calls are rejected as busy.
pub fn new(queue_depth: usize) -> (DispenseCoordinator, CoordinatorClient) {
    let (sender, receiver) = mpsc::channel(queue_depth);
    (DispenseCoordinator { receiver }, CoordinatorClient::new(sender))
}

impl DispenseCoordinator {
    /// Runs the actor's event loop until the channel closes.
    pub async fn run(mut self, ctx: CoordinatorContext) {
        info!("Coordinator started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CoordinatorRequest::Dispense {
                    request,
                    respond_to,
                } => {
                    // A caller that hung up while merely queued is dropped
                    // before any side effect is taken.
                    if respond_to.is_closed() {
                        debug!(request_id = %request.request_id, "Caller gone, dropping queued request");
                        continue;
                    }
                    let outcome = self.dispense(&ctx, &request).await;
                    // Once admitted, the request runs to its outcome; a
                    // caller that disconnected mid-flight simply never
                    // receives it.
                    let _ = respond_to.send(outcome);
                }
            }
        }

        info!("Coordinator shutdown");
    }

    /// Runs one admitted request end-to-end and publishes its status event.
    /// Every fault is folded into the outcome; nothing escapes as an error.
    async fn dispense(
        &mut self,
        ctx: &CoordinatorContext,
        request: &DispenseRequest,
    ) -> DispenseOutcome {
        debug!(
            request_id = %request.request_id,
            item = %request.item,
            quantity = request.quantity,
            "Dispense admitted"
        );

        let outcome = self.try_dispense(ctx, request).await;
        match outcome.status {
            OutcomeStatus::Committed => {
                ctx.events.publish(KioskEvent::DispenseComplete {
                    request_id: request.request_id.clone(),
                    item: request.item.clone(),
                    quantity: request.quantity,
                });
            }
            OutcomeStatus::Rejected | OutcomeStatus::Failed => {
                ctx.events.publish(KioskEvent::DispenseError {
                    request_id: request.request_id.clone(),
                    reason: outcome.reason.clone().unwrap_or_default(),
                });
            }
        }
        outcome
    }

    async fn try_dispense(
        &mut self,
        ctx: &CoordinatorContext,
        request: &DispenseRequest,
    ) -> DispenseOutcome {
        let id = request.request_id.clone();

        if request.quantity == 0 {
            return DispenseOutcome::rejected(id, "invalid quantity");
        }

        // The link is checked before stock is touched so an offline device
        // rejects cheaply instead of churning reservations.
        if ctx.link.state().await != LinkState::Open {
            return DispenseOutcome::rejected(id, "link unavailable");
        }

        // Optimistic reservation: the decrement happens now and is undone
        // only if the hardware step does not commit.
        if let Err(e) = ctx.ledger.reserve(&request.item, request.quantity).await {
            return match e {
                LedgerError::NotFound(_) => DispenseOutcome::rejected(id, "unknown item"),
                LedgerError::InsufficientStock { .. } => {
                    DispenseOutcome::rejected(id, "insufficient stock")
                }
                other => DispenseOutcome::rejected(id, other.to_string()),
            };
        }

        let command = DispenseCommand::new(&request.item, request.quantity);
        let session = ctx.link.dispense(id.clone(), command).await;

        let failure = match session {
            Ok(SessionOutcome::Completed) => {
                self.commit(ctx, request).await;
                return DispenseOutcome::committed(id);
            }
            Ok(SessionOutcome::Failed(reason)) => reason,
            Ok(SessionOutcome::TimedOut) => "timeout".to_string(),
            Ok(SessionOutcome::LinkFault(_)) => "link fault".to_string(),
            Err(e) => e.to_string(),
        };

        // The hardware step did not commit: the reservation is released
        // exactly once, here.
        self.rollback(ctx, request).await;
        DispenseOutcome::failed(id, failure)
    }

    async fn commit(&self, ctx: &CoordinatorContext, request: &DispenseRequest) {
        let draft = TransactionDraft {
            family_id: request.family_id,
            item_name: request.item.clone(),
            quantity: request.quantity,
        };
        match ctx.txlog.append(draft).await {
            Ok(record) => {
                info!(request_id = %request.request_id, txn = %record.id, "Dispense committed")
            }
            // The device has already dispensed; the commit stands even if
            // the log append is lost.
            Err(e) => {
                warn!(request_id = %request.request_id, error = %e, "Transaction append failed after dispense")
            }
        }
    }

    async fn rollback(&self, ctx: &CoordinatorContext, request: &DispenseRequest) {
        if let Err(e) = ctx
            .ledger
            .release(&request.item, request.quantity)
            .await
        {
            warn!(
                request_id = %request.request_id,
                item = %request.item,
                error = %e,
                "Reservation release failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::sim::simulated;
    use crate::model::RequestId;
    use crate::{ledger, link, txlog};
    use std::time::Duration;

    struct Harness {
        ctx_sender: mpsc::Sender<CoordinatorRequest>,
        coordinator: CoordinatorClient,
        ledger: LedgerClient,
        link: LinkClient,
        txlog: TransactionLogClient,
        device: crate::link::sim::SimulatedDevice,
    }

    async fn harness() -> Harness {
        let events = NotificationChannel::new(8);
        let (ledger_actor, ledger_client) = ledger::new(8);
        tokio::spawn(ledger_actor.run());
        let (txlog_actor, txlog_client) = txlog::new(8);
        tokio::spawn(txlog_actor.run());
        let (transport, device) = simulated();
        let (link_actor, link_client) = link::new(transport, Duration::from_millis(100), 8);
        tokio::spawn(link_actor.run(events.clone()));

        // Built by hand instead of through `new` so the test keeps a raw
        // sender and can drop reply channels at will.
        let (sender, receiver) = mpsc::channel(4);
        let coordinator_actor = DispenseCoordinator { receiver };
        let coordinator_client = CoordinatorClient::new(sender.clone());
        tokio::spawn(coordinator_actor.run(CoordinatorContext {
            ledger: ledger_client.clone(),
            link: link_client.clone(),
            txlog: txlog_client.clone(),
            events,
        }));

        Harness {
            ctx_sender: sender,
            coordinator: coordinator_client,
            ledger: ledger_client,
            link: link_client,
            txlog: txlog_client,
            device,
        }
    }

    #[tokio::test]
    async fn rejects_when_link_is_closed() {
        let h = harness().await;
        h.ledger.set_stock("rice", 10).await.unwrap();

        let outcome = h
            .coordinator
            .dispense(DispenseRequest::new(1, 1, "rice", 2))
            .await;

        assert_eq!(outcome.status, OutcomeStatus::Rejected);
        assert_eq!(outcome.reason.as_deref(), Some("link unavailable"));
        // No reservation was taken.
        assert_eq!(h.ledger.stock_of("rice").await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn rejects_zero_quantity_before_any_side_effect() {
        let mut h = harness().await;
        h.link.open().await.unwrap();
        h.ledger.set_stock("rice", 10).await.unwrap();

        let outcome = h
            .coordinator
            .dispense(DispenseRequest::new(1, 1, "rice", 0))
            .await;

        assert_eq!(outcome.status, OutcomeStatus::Rejected);
        assert_eq!(outcome.reason.as_deref(), Some("invalid quantity"));
        assert!(h.device.try_next_command().is_none());
        assert_eq!(h.txlog.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn queued_request_with_gone_caller_is_dropped_without_side_effects() {
        let mut h = harness().await;
        h.link.open().await.unwrap();
        h.ledger.set_stock("rice", 10).await.unwrap();

        // Build a raw request whose reply channel is already dead.
        let (respond_to, response) = oneshot::channel();
        drop(response);
        h.ctx_sender
            .send(CoordinatorRequest::Dispense {
                request: DispenseRequest {
                    request_id: RequestId::generate(),
                    family_id: 1,
                    member_id: 1,
                    item: "rice".to_string(),
                    quantity: 4,
                },
                respond_to,
            })
            .await
            .unwrap();

        // A follow-up request is served normally and sees untouched stock.
        let follow_up = {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .dispense(DispenseRequest::new(1, 1, "rice", 2))
                    .await
            })
        };
        assert_eq!(h.device.next_command().await.unwrap(), "DISPENSE,rice,2\n");
        h.device.send_line("COMPLETE").await;

        let outcome = follow_up.await.unwrap();
        assert!(outcome.is_committed());
        assert_eq!(h.ledger.stock_of("rice").await.unwrap(), Some(8));
    }
}
