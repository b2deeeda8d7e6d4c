//! Bridge channel: the host side of the request/response exchange.
//!
//! The channel is an actor task. It is the only writer of the channel state
//! and of the outstanding request; the host talks to it through
//! [`BridgeChannel`] (commands) and the view through its [`ViewEvent`]
//! stream. State snapshots are published on a watch channel.
//!
//! ```text
//! Unmounted → Mounting → Ready → Sending → AwaitingResult → Ready ...
//!                 any state ── teardown ──→ Unmounted
//! ```
//!
//! Rules enforced here:
//! - only one render is outstanding at a time; a request with a different
//!   identity supersedes it and the superseded response is dropped;
//! - a request with the outstanding identity joins the pending wait;
//! - a request identical to the last completed one is answered from cache;
//! - teardown resolves every wait with [`BridgeError::Cancelled`].

use std::fmt;

use code_diff_config::BridgeConfig;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use uuid::Uuid;

use crate::codec::RenderId;
use crate::error::{BridgeError, ResultError};
use crate::protocol::{ViewEvent, ViewResponse, WireRequest};
use crate::result::{self, DiffResult};
use crate::transport::ViewTransport;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle state of a bridge channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No view attached (initial placeholder, after teardown, or after mount failure).
    Unmounted,
    /// Waiting for the view to signal readiness.
    Mounting,
    /// Idle, accepting requests.
    Ready,
    /// Handing a request to the transport.
    Sending,
    /// A request is outstanding.
    AwaitingResult,
}

impl ChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelState::Unmounted => "unmounted",
            ChannelState::Mounting => "mounting",
            ChannelState::Ready => "ready",
            ChannelState::Sending => "sending",
            ChannelState::AwaitingResult => "awaiting_result",
        }
    }

    /// Whether the view has mounted and not been torn down.
    pub fn is_mounted(&self) -> bool {
        matches!(
            self,
            ChannelState::Ready | ChannelState::Sending | ChannelState::AwaitingResult
        )
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one channel instance, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first group is plenty to tell views apart in a log.
        let id = self.0.simple().to_string();
        f.write_str(&id[..8])
    }
}

/// Published channel status: current state plus why it unmounted, if it did.
#[derive(Debug, Clone)]
struct Status {
    state: ChannelState,
    closed_reason: Option<BridgeError>,
}

type Outcome = Result<DiffResult, BridgeError>;

enum Command {
    Send {
        request: WireRequest,
        reply: oneshot::Sender<Outcome>,
    },
    Teardown {
        done: oneshot::Sender<()>,
    },
}

/// Pending outcome of one [`BridgeChannel::send`].
#[derive(Debug)]
pub struct RenderHandle {
    render_id: RenderId,
    rx: oneshot::Receiver<Outcome>,
}

impl RenderHandle {
    /// Identity of the request this handle waits on.
    pub fn render_id(&self) -> &RenderId {
        &self.render_id
    }

    /// Wait for the outcome.
    pub async fn result(self) -> Result<DiffResult, BridgeError> {
        // The actor always answers before dropping a waiter; a dropped sender
        // means the actor itself went away.
        self.rx.await.unwrap_or(Err(BridgeError::Cancelled))
    }
}

// ---------------------------------------------------------------------------
// BridgeChannel
// ---------------------------------------------------------------------------

/// Host-side handle to a mounted (or mounting) view.
///
/// Cheap to clone; all clones address the same channel. Dropping the last
/// clone tears the channel down.
#[derive(Debug, Clone)]
pub struct BridgeChannel {
    id: ChannelId,
    cmd_tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<Status>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Send { request, .. } => write!(f, "Send({})", request.render_id.short()),
            Command::Teardown { .. } => f.write_str("Teardown"),
        }
    }
}

impl BridgeChannel {
    /// Start mounting a view.
    ///
    /// Spawns the channel actor on the current tokio runtime in
    /// [`ChannelState::Mounting`]. Use [`wait_ready`](Self::wait_ready) to
    /// wait for the view's readiness signal.
    pub fn mount<T: ViewTransport>(
        transport: T,
        events: mpsc::UnboundedReceiver<ViewEvent>,
        config: BridgeConfig,
    ) -> Self {
        let id = ChannelId::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(Status {
            state: ChannelState::Mounting,
            closed_reason: None,
        });

        log::info!("Bridge[{id}]: mounting view");
        let actor = ChannelActor {
            id,
            transport,
            config,
            status_tx,
            in_flight: None,
            last: None,
            deadline: Some(Instant::now() + config.mount_timeout()),
        };
        tokio::spawn(actor.run(cmd_rx, events));

        Self {
            id,
            cmd_tx,
            status_rx,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ChannelState {
        self.status_rx.borrow().state
    }

    /// Wait until the view has mounted.
    ///
    /// Fails with [`BridgeError::Mount`] if the mount window elapses, or with
    /// the reason the channel unmounted if that happened first.
    pub async fn wait_ready(&self) -> Result<(), BridgeError> {
        let mut rx = self.status_rx.clone();
        // An error only means the actor exited; its last status is still readable.
        let _ = rx
            .wait_for(|status| status.state != ChannelState::Mounting)
            .await;
        let status = rx.borrow().clone();
        if status.state.is_mounted() {
            Ok(())
        } else {
            Err(status.closed_reason.unwrap_or(BridgeError::Cancelled))
        }
    }

    /// Send a request to the view. Never blocks; await the returned handle.
    pub fn send(&self, request: WireRequest) -> RenderHandle {
        let (reply, rx) = oneshot::channel();
        let render_id = request.render_id.clone();
        if let Err(mpsc::error::SendError(command)) =
            self.cmd_tx.send(Command::Send { request, reply })
            && let Command::Send { reply, .. } = command
        {
            let _ = reply.send(Err(BridgeError::NotReady(ChannelState::Unmounted)));
        }
        RenderHandle { render_id, rx }
    }

    /// Unmount the view, cancelling any outstanding render.
    ///
    /// Returns once the actor has released every waiter.
    pub async fn teardown(&self) {
        let (done, done_rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Teardown { done }).is_ok() {
            let _ = done_rx.await;
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct InFlight {
    request: WireRequest,
    waiters: Vec<oneshot::Sender<Outcome>>,
}

impl InFlight {
    fn resolve(self, outcome: Outcome) {
        for waiter in self.waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

enum Flow {
    Continue,
    Stop,
}

struct ChannelActor<T: ViewTransport> {
    id: ChannelId,
    transport: T,
    config: BridgeConfig,
    status_tx: watch::Sender<Status>,
    /// The single outstanding request, if any.
    in_flight: Option<InFlight>,
    /// Result of the most recent completed exchange, valid only while the
    /// view has not been sent anything since.
    last: Option<DiffResult>,
    /// Mount or response deadline, depending on state.
    deadline: Option<Instant>,
}

impl<T: ViewTransport> ChannelActor<T> {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<ViewEvent>,
    ) {
        loop {
            let deadline = self.deadline;
            let flow = tokio::select! {
                command = cmd_rx.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => {
                        log::debug!("Bridge[{}]: all handles dropped", self.id);
                        self.unmount(BridgeError::Cancelled);
                        Flow::Stop
                    }
                },
                event = events.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => self.on_view_closed(),
                },
                _ = sleep_until(deadline) => self.on_deadline(),
            };
            if let Flow::Stop = flow {
                break;
            }
        }
        log::debug!("Bridge[{}]: actor stopped", self.id);
    }

    fn state(&self) -> ChannelState {
        self.status_tx.borrow().state
    }

    fn set_state(&self, state: ChannelState) {
        self.status_tx.send_modify(|status| status.state = state);
    }

    // -- host commands ------------------------------------------------------

    fn on_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Send { request, reply } => {
                self.on_send(request, reply);
                Flow::Continue
            }
            Command::Teardown { done } => {
                log::info!("Bridge[{}]: teardown", self.id);
                self.unmount(BridgeError::Cancelled);
                let _ = done.send(());
                Flow::Stop
            }
        }
    }

    fn on_send(&mut self, request: WireRequest, reply: oneshot::Sender<Outcome>) {
        match self.state() {
            ChannelState::Ready => {
                if let Some(last) = &self.last
                    && last.render_id == request.render_id
                {
                    log::debug!(
                        "Bridge[{}]: render {} unchanged, reusing result",
                        self.id,
                        request.render_id.short()
                    );
                    let _ = reply.send(Ok(last.clone()));
                    return;
                }
                self.dispatch(request, vec![reply]);
            }
            ChannelState::AwaitingResult => {
                if let Some(in_flight) = self.in_flight.as_mut()
                    && in_flight.request.render_id == request.render_id
                {
                    log::debug!(
                        "Bridge[{}]: render {} already pending, joining wait",
                        self.id,
                        request.render_id.short()
                    );
                    in_flight.waiters.push(reply);
                    return;
                }
                if let Some(stale) = self.in_flight.take() {
                    log::debug!(
                        "Bridge[{}]: render {} superseded by {}",
                        self.id,
                        stale.request.render_id.short(),
                        request.render_id.short()
                    );
                    let error = BridgeError::Superseded {
                        render_id: stale.request.render_id.clone(),
                        by: request.render_id.clone(),
                    };
                    stale.resolve(Err(error));
                }
                self.dispatch(request, vec![reply]);
            }
            state => {
                let _ = reply.send(Err(BridgeError::NotReady(state)));
            }
        }
    }

    fn dispatch(&mut self, request: WireRequest, waiters: Vec<oneshot::Sender<Outcome>>) {
        self.set_state(ChannelState::Sending);
        // Whatever the view showed before is about to change.
        self.last = None;

        log::debug!(
            "Bridge[{}]: sending render {} ({} + {} bytes, {})",
            self.id,
            request.render_id.short(),
            request.old_text.len(),
            request.new_text.len(),
            request.language
        );
        if let Err(e) = self.transport.post(&request) {
            log::error!(
                "Bridge[{}]: failed to post render {}: {e}",
                self.id,
                request.render_id.short()
            );
            self.deadline = None;
            self.set_state(ChannelState::Ready);
            InFlight { request, waiters }.resolve(Err(BridgeError::Transport(e.to_string())));
            return;
        }

        self.in_flight = Some(InFlight { request, waiters });
        self.deadline = Some(Instant::now() + self.config.response_timeout());
        self.set_state(ChannelState::AwaitingResult);
    }

    // -- view events --------------------------------------------------------

    fn on_event(&mut self, event: ViewEvent) -> Flow {
        match event {
            ViewEvent::Ready => self.on_ready(),
            ViewEvent::Response(value) => self.on_response(value),
        }
        Flow::Continue
    }

    fn on_ready(&mut self) {
        match self.state() {
            ChannelState::Mounting => {
                log::info!("Bridge[{}]: view ready", self.id);
                self.deadline = None;
                self.set_state(ChannelState::Ready);
            }
            _ => {
                // A view that re-announces itself has reloaded and lost
                // whatever it was showing.
                log::debug!("Bridge[{}]: view re-signalled ready", self.id);
                self.last = None;
            }
        }
    }

    fn on_response(&mut self, value: serde_json::Value) {
        let response = match ViewResponse::from_value(value) {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Bridge[{}]: dropping response: {e}", self.id);
                return;
            }
        };

        let Some(in_flight) = self.in_flight.as_ref() else {
            log::debug!(
                "Bridge[{}]: dropping response {:?} with nothing outstanding",
                self.id,
                response.render_id
            );
            return;
        };

        match result::validate(response, &in_flight.request) {
            Ok(result) => {
                if let Some(error) = &result.error {
                    log::warn!(
                        "Bridge[{}]: render {} failed in view: {error}",
                        self.id,
                        result.render_id.short()
                    );
                } else {
                    log::debug!(
                        "Bridge[{}]: render {} complete (+{} -{})",
                        self.id,
                        result.render_id.short(),
                        result.lines_added,
                        result.lines_removed
                    );
                }
                self.deadline = None;
                self.last = Some(result.clone());
                let in_flight = self.in_flight.take();
                self.set_state(ChannelState::Ready);
                if let Some(in_flight) = in_flight {
                    in_flight.resolve(Ok(result));
                }
            }
            Err(ResultError::UnknownRenderId { expected, found }) => {
                log::debug!(
                    "Bridge[{}]: dropping stale response {:?} (awaiting {})",
                    self.id,
                    found.as_ref().map(RenderId::short),
                    expected.short()
                );
            }
            Err(e) => {
                log::warn!("Bridge[{}]: dropping response: {e}", self.id);
            }
        }
    }

    fn on_view_closed(&mut self) -> Flow {
        let error = if self.state() == ChannelState::Mounting {
            BridgeError::Mount("view closed before signalling ready".to_string())
        } else {
            BridgeError::Disconnected
        };
        log::warn!("Bridge[{}]: view event stream closed", self.id);
        self.unmount(error);
        Flow::Stop
    }

    // -- timers -------------------------------------------------------------

    fn on_deadline(&mut self) -> Flow {
        self.deadline = None;
        match self.state() {
            ChannelState::Mounting => {
                let after = self.config.mount_timeout();
                log::error!(
                    "Bridge[{}]: view did not become ready within {}ms",
                    self.id,
                    after.as_millis()
                );
                self.unmount(BridgeError::Mount(format!(
                    "view did not signal ready within {}ms",
                    after.as_millis()
                )));
                Flow::Stop
            }
            ChannelState::AwaitingResult => {
                self.set_state(ChannelState::Ready);
                if let Some(in_flight) = self.in_flight.take() {
                    let after = self.config.response_timeout();
                    log::warn!(
                        "Bridge[{}]: render {} timed out after {}ms",
                        self.id,
                        in_flight.request.render_id.short(),
                        after.as_millis()
                    );
                    let error = BridgeError::Timeout {
                        render_id: in_flight.request.render_id.clone(),
                        after,
                    };
                    in_flight.resolve(Err(error));
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    // -- teardown -----------------------------------------------------------

    /// Release every waiter with `reason`, close the transport and publish
    /// `Unmounted`.
    fn unmount(&mut self, reason: BridgeError) {
        self.deadline = None;
        self.last = None;
        self.transport.close();
        self.status_tx.send_modify(|status| {
            status.state = ChannelState::Unmounted;
            status.closed_reason = Some(reason.clone());
        });
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.resolve(Err(reason));
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
