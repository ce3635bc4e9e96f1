//! Broadcast fan-out of asynchronous kiosk events.
//!
//! This is status signaling, not a durable log: delivery is at most once per
//! subscriber per event, a late subscriber never sees events published before
//! it joined, and a lagging subscriber loses the oldest buffered events.

use crate::model::RequestId;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Asynchronous events observers can subscribe to.
///
/// `DispenseComplete`/`DispenseError` mirror the status broadcasts the web
/// tier forwards to connected clients; the link lifecycle events tell
/// observers whether new requests stand a chance of being admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum KioskEvent {
    /// The device announced readiness after the link was opened.
    DeviceReady,
    /// The link dropped; new requests are refused until it is reopened.
    LinkDown { reason: String },
    /// A dispense committed: hardware confirmed and a transaction was recorded.
    DispenseComplete {
        request_id: RequestId,
        item: String,
        quantity: u32,
    },
    /// An admitted dispense request ended without committing.
    DispenseError {
        request_id: RequestId,
        reason: String,
    },
}

/// Fan-out broadcaster for [`KioskEvent`]s. Cheap to clone.
#[derive(Clone)]
pub struct NotificationChannel {
    sender: broadcast::Sender<KioskEvent>,
}

impl NotificationChannel {
    /// Creates a channel buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Delivers `event` to all current subscribers.
    ///
    /// Publishing with no subscribers is not an error; the event is dropped.
    pub fn publish(&self, event: KioskEvent) {
        debug!(?event, "Publishing");
        let _ = self.sender.send(event);
    }

    /// Joins the stream from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<KioskEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
