//! Dispenser link actor.
//!
//! Owns the serial connection lifecycle, the link state machine and the
//! per-request session protocol with the microcontroller. The actor processes
//! one message at a time and holds at most one session, so there is never
//! more than one command in flight on the wire — enforced here in addition to
//! the coordinator's admission gate.
//!
//! # Link state machine
//!
//! `Closed → Opening → Open → Closed`. `Open` is the only state in which
//! commands are accepted. A device-side failure (EOF or I/O error on the read
//! loop) drives the link back to `Closed`, fails the in-flight session with a
//! link fault and broadcasts [`KioskEvent::LinkDown`]; the link then refuses
//! new sessions until it is explicitly reopened. There is no silent retry
//! against a dead device.
//!
//! # Session protocol
//!
//! Nested inside `Open`: idle → command sent → terminal. Every session
//! resolves within the configured deadline even if the device never answers,
//! because the deadline is enforced in the actor's own select loop. A
//! `COMPLETE` or `ERROR:` notice arriving with no session in flight is a
//! protocol anomaly: logged and discarded, never a crash.

pub mod error;
pub mod protocol;
pub mod sim;
pub mod transport;

pub use error::LinkError;
pub use protocol::{DeviceNotice, DispenseCommand};

use crate::clients::LinkClient;
use crate::model::RequestId;
use crate::notify::{KioskEvent, NotificationChannel};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use self::transport::{LineSink, LineSource, LinkTransport};
use tracing::{debug, info, warn};

/// Connection state of the physical link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Closed,
    Opening,
    Open,
}

/// Terminal result of one dispense session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The device reported `COMPLETE`.
    Completed,
    /// The device reported `ERROR:<reason>`.
    Failed(String),
    /// No terminal notice arrived within the deadline.
    TimedOut,
    /// The link dropped while the command was in flight.
    LinkFault(String),
}

/// One-shot reply channel for link operations.
pub type LinkResponse<T> = oneshot::Sender<Result<T, LinkError>>;

/// Messages understood by the link actor.
#[derive(Debug)]
pub enum LinkRequest {
    /// Establish the connection and start the read loop.
    Open { respond_to: LinkResponse<()> },
    /// Drop the connection, failing any in-flight session.
    Close { respond_to: LinkResponse<()> },
    /// Write one dispense command; the reply resolves when the session does.
    Dispense {
        request_id: RequestId,
        command: DispenseCommand,
        respond_to: LinkResponse<SessionOutcome>,
    },
    /// Current connection state.
    State {
        respond_to: oneshot::Sender<LinkState>,
    },
}

/// Traffic from the per-connection reader task.
#[derive(Debug)]
enum DeviceEvent {
    Notice(DeviceNotice),
    Closed { reason: String },
}

/// The hardware conversation for one in-flight request.
struct Session {
    request_id: RequestId,
    respond_to: LinkResponse<SessionOutcome>,
    deadline: Instant,
}

enum Step {
    Request(LinkRequest),
    Device(DeviceEvent),
    Deadline,
    Shutdown,
}

/// The dispenser link actor.
pub struct DispenserLink<T: LinkTransport> {
    receiver: mpsc::Receiver<LinkRequest>,
    transport: T,
    command_timeout: Duration,
    state: LinkState,
    writer: Option<T::Writer>,
    /// Inbound traffic from the current connection's reader task. Replaced
    /// wholesale on reopen, so lines from a dead connection cannot leak into
    /// a new one.
    device_rx: Option<mpsc::Receiver<DeviceEvent>>,
    reader_handle: Option<tokio::task::JoinHandle<()>>,
    session: Option<Session>,
}

/// Creates the link actor and its client.
///
/// `command_timeout` bounds every session: command sent to terminal notice.
pub fn new<T: LinkTransport>(
    transport: T,
    command_timeout: Duration,
    buffer_size: usize,
) -> (DispenserLink<T>, LinkClient) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let actor = DispenserLink {
        receiver,
        transport,
        command_timeout,
        state: LinkState::Closed,
        writer: None,
        device_rx: None,
        reader_handle: None,
        session: None,
    };
    (actor, LinkClient::new(sender))
}

impl<T: LinkTransport> DispenserLink<T> {
    /// Runs the actor's event loop until the request channel closes.
    ///
    /// The notification channel is injected here rather than at construction
    /// so the system can wire actors in any order.
    pub async fn run(mut self, events: NotificationChannel) {
        info!("Dispenser link started");

        loop {
            let deadline = self.session.as_ref().map(|s| s.deadline);
            let step = tokio::select! {
                req = self.receiver.recv() => match req {
                    Some(req) => Step::Request(req),
                    None => Step::Shutdown,
                },
                event = next_device_event(&mut self.device_rx) => Step::Device(event),
                _ = deadline_tick(deadline) => Step::Deadline,
            };

            match step {
                Step::Request(req) => self.handle_request(req).await,
                Step::Device(event) => self.handle_device(event, &events),
                Step::Deadline => self.expire_session(),
                Step::Shutdown => break,
            }
        }

        self.teardown("link actor shutting down");
        info!("Dispenser link shutdown");
    }

    async fn handle_request(&mut self, req: LinkRequest) {
        match req {
            LinkRequest::Open { respond_to } => {
                if self.state != LinkState::Closed {
                    let _ = respond_to.send(Err(LinkError::ConnectionError(
                        "link already open".to_string(),
                    )));
                    return;
                }
                self.state = LinkState::Opening;
                debug!("Connecting transport");
                match self.transport.connect().await {
                    Ok((writer, reader)) => {
                        let (device_tx, device_rx) = mpsc::channel(32);
                        self.writer = Some(writer);
                        self.device_rx = Some(device_rx);
                        self.reader_handle = Some(tokio::spawn(read_loop(reader, device_tx)));
                        self.state = LinkState::Open;
                        info!("Link open");
                        let _ = respond_to.send(Ok(()));
                    }
                    Err(e) => {
                        self.state = LinkState::Closed;
                        warn!(error = %e, "Open failed");
                        let _ = respond_to.send(Err(e));
                    }
                }
            }
            LinkRequest::Close { respond_to } => {
                self.teardown("link closed");
                let _ = respond_to.send(Ok(()));
            }
            LinkRequest::Dispense {
                request_id,
                command,
                respond_to,
            } => {
                if self.state != LinkState::Open {
                    let _ = respond_to.send(Err(LinkError::NotOpen));
                    return;
                }
                if self.session.is_some() {
                    warn!(%request_id, "Dispense refused, session already in flight");
                    let _ = respond_to.send(Err(LinkError::Busy));
                    return;
                }
                let Some(writer) = self.writer.as_mut() else {
                    let _ = respond_to.send(Err(LinkError::NotOpen));
                    return;
                };
                let line = command.encode();
                match writer.write_line(&line).await {
                    Ok(()) => {
                        debug!(%request_id, command = line.trim(), "Command sent");
                        self.session = Some(Session {
                            request_id,
                            respond_to,
                            deadline: Instant::now() + self.command_timeout,
                        });
                    }
                    Err(e) => {
                        warn!(%request_id, error = %e, "Write failed");
                        let _ = respond_to.send(Err(e));
                    }
                }
            }
            LinkRequest::State { respond_to } => {
                let _ = respond_to.send(self.state);
            }
        }
    }

    fn handle_device(&mut self, event: DeviceEvent, events: &NotificationChannel) {
        match event {
            DeviceEvent::Notice(DeviceNotice::Ready) => {
                info!("Device ready");
                events.publish(KioskEvent::DeviceReady);
            }
            DeviceEvent::Notice(DeviceNotice::Complete) => match self.session.take() {
                Some(session) => {
                    info!(request_id = %session.request_id, "Dispense complete");
                    let _ = session.respond_to.send(Ok(SessionOutcome::Completed));
                }
                None => warn!("COMPLETE with no session in flight"),
            },
            DeviceEvent::Notice(DeviceNotice::Error(reason)) => match self.session.take() {
                Some(session) => {
                    warn!(request_id = %session.request_id, %reason, "Device error");
                    let _ = session.respond_to.send(Ok(SessionOutcome::Failed(reason)));
                }
                None => warn!(%reason, "ERROR with no session in flight"),
            },
            DeviceEvent::Notice(DeviceNotice::Unrecognized(raw)) => {
                debug!(line = %raw, "Unrecognized device line")
            }
            DeviceEvent::Closed { reason } => {
                warn!(%reason, "Link fault");
                self.teardown(&reason);
                events.publish(KioskEvent::LinkDown { reason });
            }
        }
    }

    /// The deadline passed with no terminal notice from the device.
    fn expire_session(&mut self) {
        if let Some(session) = self.session.take() {
            warn!(request_id = %session.request_id, "Session timed out");
            let _ = session.respond_to.send(Ok(SessionOutcome::TimedOut));
        }
    }

    /// Drops the connection and fails the in-flight session, if any.
    fn teardown(&mut self, reason: &str) {
        if let Some(session) = self.session.take() {
            let _ = session
                .respond_to
                .send(Ok(SessionOutcome::LinkFault(reason.to_string())));
        }
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
        self.writer = None;
        self.device_rx = None;
        if self.state != LinkState::Closed {
            info!(%reason, "Link closed");
        }
        self.state = LinkState::Closed;
    }
}

/// Forwards parsed device lines into the actor's inbox. Runs until EOF, an
/// I/O error, or an abort when the link closes. Parsing cannot fail, so a
/// garbled line can never kill this loop.
async fn read_loop<R: LineSource>(mut reader: R, sender: mpsc::Sender<DeviceEvent>) {
    loop {
        match reader.next_line().await {
            Ok(Some(line)) => {
                let notice = DeviceNotice::parse(&line);
                if sender.send(DeviceEvent::Notice(notice)).await.is_err() {
                    return;
                }
            }
            Ok(None) => {
                let _ = sender
                    .send(DeviceEvent::Closed {
                        reason: "device hung up".to_string(),
                    })
                    .await;
                return;
            }
            Err(e) => {
                let _ = sender
                    .send(DeviceEvent::Closed {
                        reason: e.to_string(),
                    })
                    .await;
                return;
            }
        }
    }
}

/// Resolves to the next reader-task event, or pends forever while no
/// connection is up (the select loop then only reacts to requests).
async fn next_device_event(rx: &mut Option<mpsc::Receiver<DeviceEvent>>) -> DeviceEvent {
    match rx {
        Some(rx) => match rx.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}

/// Resolves when the session deadline passes; pends forever with no session.
async fn deadline_tick(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::sim::{simulated, SimulatedDevice};
    use crate::notify::NotificationChannel;

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn started_link() -> (LinkClient, SimulatedDevice, NotificationChannel) {
        let (transport, device) = simulated();
        let events = NotificationChannel::new(8);
        let (actor, client) = new(transport, TIMEOUT, 8);
        tokio::spawn(actor.run(events.clone()));
        (client, device, events)
    }

    #[tokio::test]
    async fn open_transitions_to_open_and_ready_is_broadcast() {
        let (link, device, events) = started_link();
        let mut subscription = events.subscribe();

        assert_eq!(link.state().await, LinkState::Closed);
        link.open().await.unwrap();
        assert_eq!(link.state().await, LinkState::Open);

        device.announce_ready().await;
        assert_eq!(subscription.recv().await.unwrap(), KioskEvent::DeviceReady);
    }

    #[tokio::test]
    async fn dispense_before_open_is_refused() {
        let (link, _device, _events) = started_link();

        let result = link
            .dispense(RequestId::generate(), DispenseCommand::new("rice", 1))
            .await;
        assert_eq!(result, Err(LinkError::NotOpen));
    }

    #[tokio::test]
    async fn complete_notice_resolves_the_session() {
        let (link, mut device, _events) = started_link();
        link.open().await.unwrap();

        let handle = {
            let link = link.clone();
            tokio::spawn(async move {
                link.dispense(RequestId::generate(), DispenseCommand::new("oil", 3))
                    .await
            })
        };

        assert_eq!(device.next_command().await.unwrap(), "DISPENSE,oil,3\n");
        device.send_line("COMPLETE").await;

        assert_eq!(handle.await.unwrap(), Ok(SessionOutcome::Completed));
    }

    #[tokio::test]
    async fn error_notice_fails_the_session_with_the_device_reason() {
        let (link, mut device, _events) = started_link();
        link.open().await.unwrap();

        let handle = {
            let link = link.clone();
            tokio::spawn(async move {
                link.dispense(RequestId::generate(), DispenseCommand::new("sugar", 2))
                    .await
            })
        };

        assert_eq!(device.next_command().await.unwrap(), "DISPENSE,sugar,2\n");
        device.send_line("ERROR:jam").await;

        assert_eq!(
            handle.await.unwrap(),
            Ok(SessionOutcome::Failed("jam".to_string()))
        );
    }

    #[tokio::test]
    async fn silent_device_times_the_session_out() {
        let (link, mut device, _events) = started_link();
        link.open().await.unwrap();

        let outcome = link
            .dispense(RequestId::generate(), DispenseCommand::new("wheat", 5))
            .await;

        assert_eq!(device.next_command().await.unwrap(), "DISPENSE,wheat,5\n");
        assert_eq!(outcome, Ok(SessionOutcome::TimedOut));
    }

    #[tokio::test]
    async fn unsolicited_and_garbled_lines_are_ignored() {
        let (link, mut device, _events) = started_link();
        link.open().await.unwrap();

        // No session in flight: these must be discarded without harm.
        device.send_line("COMPLETE").await;
        device.send_line("ERROR:phantom").await;
        device.send_line("BOOTLOADER v2.1").await;

        // The link still works afterwards.
        let handle = {
            let link = link.clone();
            tokio::spawn(async move {
                link.dispense(RequestId::generate(), DispenseCommand::new("rice", 1))
                    .await
            })
        };
        device.next_command().await.unwrap();
        device.send_line("COMPLETE").await;
        assert_eq!(handle.await.unwrap(), Ok(SessionOutcome::Completed));
    }

    #[tokio::test]
    async fn disconnect_mid_session_is_a_link_fault() {
        let (link, mut device, events) = started_link();
        let mut subscription = events.subscribe();
        link.open().await.unwrap();

        let handle = {
            let link = link.clone();
            tokio::spawn(async move {
                link.dispense(RequestId::generate(), DispenseCommand::new("oil", 2))
                    .await
            })
        };

        device.next_command().await.unwrap();
        device.disconnect();

        match handle.await.unwrap() {
            Ok(SessionOutcome::LinkFault(_)) => {}
            other => panic!("expected a link fault, got {:?}", other),
        }
        assert!(matches!(
            subscription.recv().await.unwrap(),
            KioskEvent::LinkDown { .. }
        ));

        // The link refuses new sessions until reopened.
        assert_eq!(link.state().await, LinkState::Closed);
        let result = link
            .dispense(RequestId::generate(), DispenseCommand::new("oil", 1))
            .await;
        assert_eq!(result, Err(LinkError::NotOpen));
    }

    #[tokio::test]
    async fn close_fails_the_in_flight_session() {
        let (link, mut device, _events) = started_link();
        link.open().await.unwrap();

        let handle = {
            let link = link.clone();
            tokio::spawn(async move {
                link.dispense(RequestId::generate(), DispenseCommand::new("rice", 4))
                    .await
            })
        };

        device.next_command().await.unwrap();
        link.close().await.unwrap();

        assert!(matches!(
            handle.await.unwrap(),
            Ok(SessionOutcome::LinkFault(_))
        ));
        assert_eq!(link.state().await, LinkState::Closed);
    }
}
