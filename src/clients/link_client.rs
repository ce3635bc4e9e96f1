//! Client for the dispenser link actor.

use crate::link::{DispenseCommand, LinkError, LinkRequest, LinkState, SessionOutcome};
use crate::model::RequestId;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Client for the dispenser link actor.
#[derive(Clone)]
pub struct LinkClient {
    sender: mpsc::Sender<LinkRequest>,
}

impl LinkClient {
    pub fn new(sender: mpsc::Sender<LinkRequest>) -> Self {
        Self { sender }
    }

    /// Establishes the serial connection. The device's `READY` token arrives
    /// asynchronously afterwards as a [`KioskEvent::DeviceReady`](crate::notify::KioskEvent)
    /// broadcast.
    #[instrument(skip(self))]
    pub async fn open(&self) -> Result<(), LinkError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LinkRequest::Open { respond_to })
            .await
            .map_err(|_| LinkError::ActorClosed)?;
        response.await.map_err(|_| LinkError::ActorClosed)?
    }

    /// Drops the connection, failing any in-flight session.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<(), LinkError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LinkRequest::Close { respond_to })
            .await
            .map_err(|_| LinkError::ActorClosed)?;
        response.await.map_err(|_| LinkError::ActorClosed)?
    }

    /// Writes one dispense command and suspends until the session resolves.
    ///
    /// Always resolves within the link's configured deadline: the reply is
    /// one of the [`SessionOutcome`]s, or an error if the command never made
    /// it onto the wire.
    #[instrument(skip(self, command))]
    pub async fn dispense(
        &self,
        request_id: RequestId,
        command: DispenseCommand,
    ) -> Result<SessionOutcome, LinkError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LinkRequest::Dispense {
                request_id,
                command,
                respond_to,
            })
            .await
            .map_err(|_| LinkError::ActorClosed)?;
        response.await.map_err(|_| LinkError::ActorClosed)?
    }

    /// Current connection state; a vanished actor reads as `Closed`.
    pub async fn state(&self) -> LinkState {
        let (respond_to, response) = oneshot::channel();
        if self
            .sender
            .send(LinkRequest::State { respond_to })
            .await
            .is_err()
        {
            return LinkState::Closed;
        }
        response.await.unwrap_or(LinkState::Closed)
    }
}
