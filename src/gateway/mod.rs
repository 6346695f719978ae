pub mod actions;
pub mod protocol;
pub mod queue;
pub mod registry;
pub mod session;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::Method;
use axum::response::Response;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use uuid::Uuid;

use crate::backend::{CallError, Function, Param};
use crate::error::{AppError, GatewayError};
use crate::models::{self, GameCategory};
use crate::state::AppState;
use actions::{identity_params, Action, OnError, Rule};
use protocol::{action, ActionFrame, Envelope};
use queue::{InboundReceiver, InboundSender, Pushed};
use session::Session;

/// `/casino/{category}`: validate the category, then upgrade.
pub async fn casino_upgrade(
    method: Method,
    Path(category): Path<String>,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let category = models::parse_category(&category)
        .ok_or_else(|| AppError::NotFound(format!("unknown game category {category:?}")))?;
    if method != Method::GET {
        return Err(AppError::BadRequest(format!("{method} is not supported")));
    }
    let ws = ws.map_err(|e| AppError::BadRequest(format!("websocket upgrade required: {e}")))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, category)))
}

async fn handle_socket(socket: WebSocket, state: AppState, category: GameCategory) {
    let (ws_sink, ws_stream) = socket.split();
    let (inbound_tx, mut inbound_rx) =
        queue::inbound(state.gateway.inbound_queue, state.gateway.backpressure);

    let mut conn = Connection::new(Session::new(category), ws_sink, state);
    let connection_id = conn.session.id();
    tracing::info!(connection = %connection_id, category, "client connected");

    let reader = tokio::spawn(read_frames(ws_stream, inbound_tx, connection_id));
    conn.run(&mut inbound_rx).await;
    let _ = reader.await;

    tracing::info!(
        connection = %connection_id,
        user_id = conn.session.user_id(),
        sessions = conn.state.registry.count(),
        "client disconnected"
    );
}

/// Feed inbound frames into `queue` until the transport fails. Returning
/// drops the sender, which closes the queue.
async fn read_frames<R, E>(mut stream: R, queue: InboundSender, connection_id: Uuid)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(msg) = stream.next().await {
        let frame = match msg {
            Ok(Message::Binary(bytes)) => bytes.to_vec(),
            Ok(Message::Text(text)) => text.as_str().as_bytes().to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(connection = %connection_id, "read failed: {e}");
                break;
            }
        };
        match queue.push(frame).await {
            Pushed::Queued => {}
            Pushed::DroppedNewest => {
                tracing::warn!(connection = %connection_id, "inbound queue full, dropped newest frame");
            }
            Pushed::EvictedOldest => {
                tracing::warn!(connection = %connection_id, "inbound queue full, dropped oldest frame");
            }
            Pushed::Closed => break,
        }
    }
}

/// Processing side of one client connection. Frames are handled one at a
/// time, each to completion, so at most one backend call is in flight.
pub struct Connection<S> {
    session: Session,
    sink: S,
    state: AppState,
}

impl<S> Connection<S>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    pub fn new(session: Session, sink: S, state: AppState) -> Self {
        Self {
            session,
            sink,
            state,
        }
    }

    /// Greet the client, process frames until the queue is closed and
    /// drained, then run the disconnect cleanup.
    pub async fn run(&mut self, queue: &mut InboundReceiver) {
        self.send(action::READY, &[]).await;
        while let Some(frame) = queue.pop().await {
            self.handle_frame(&frame).await;
        }
        self.cleanup().await;
    }

    pub async fn handle_frame(&mut self, raw: &[u8]) {
        let frame = match ActionFrame::decode(raw) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(connection = %self.session.id(), "dropping frame: {e}");
                return;
            }
        };
        let Some(action) = Action::from_name(&frame.action) else {
            tracing::debug!(
                connection = %self.session.id(),
                action = %frame.action,
                "ignoring unrecognized action"
            );
            return;
        };

        match action {
            Action::Login => self.login(&frame).await,
            other => self.single_call(other, &frame).await,
        }
    }

    /// `loginCheck`, adopt identity, register, `machineOccupy`, then answer
    /// with `onLogin` and `onTakeMachine`.
    async fn login(&mut self, frame: &ActionFrame) {
        let rule = Action::Login.rule();
        let params = Action::Login.params(&self.session, frame);
        let result = self.call(rule.function, &params).await;
        let Some(login) = settle(rule, result) else {
            return;
        };

        if let Err(e) = self.session.apply_login_result(&login) {
            tracing::warn!(connection = %self.session.id(), "login aborted: {e}");
            return;
        }

        match self.state.registry.add(&self.session) {
            Ok(()) => {}
            Err(GatewayError::CapacityExceeded { capacity }) => {
                tracing::warn!(
                    connection = %self.session.id(),
                    capacity,
                    "registry full, continuing unregistered"
                );
            }
            Err(e) => tracing::warn!(connection = %self.session.id(), "registry add failed: {e}"),
        }

        let params = identity_params(&self.session);
        let result = self.call(Function::MachineOccupy, &params).await;
        let Some(occupy) = settle(rule, result) else {
            return;
        };

        self.session.authenticate();
        tracing::info!(
            connection = %self.session.id(),
            user_id = self.session.user_id(),
            hall_id = self.session.hall_id(),
            "client logged in"
        );

        self.send(rule.response, &login).await;
        self.send(action::ON_TAKE_MACHINE, &occupy).await;
    }

    async fn single_call(&mut self, action: Action, frame: &ActionFrame) {
        let rule = action.rule();
        let params = action.params(&self.session, frame);
        let result = self.call(rule.function, &params).await;
        if let Some(body) = settle(rule, result) {
            self.send(rule.response, &body).await;
        }
    }

    /// Runs once, after the transport is gone. Backend errors are ignored.
    async fn cleanup(&mut self) {
        if self.session.has_identity() || self.state.gateway.cleanup_unauthenticated {
            let params = identity_params(&self.session);
            let _ = self.call(Function::BalanceExchange, &params).await;
            let _ = self.call(Function::MachineLeave, &params).await;
        }
        self.state.registry.remove(&self.session);
        self.session.close();
    }

    async fn call(&self, function: Function, params: &[Param]) -> Result<Vec<u8>, CallError> {
        let result = self
            .state
            .caller
            .call(self.session.game_category(), function, params)
            .await;
        if let Err(ref e) = result {
            tracing::warn!(
                connection = %self.session.id(),
                category = self.session.game_category(),
                function = %function,
                "backend call failed: {e}"
            );
        }
        result
    }

    async fn send(&mut self, action: &str, raw: &[u8]) {
        let bytes = match Envelope::encode(action, raw) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(connection = %self.session.id(), action, "{e}");
                return;
            }
        };
        if let Err(e) = self.sink.send(Message::Binary(bytes.into())).await {
            tracing::debug!(connection = %self.session.id(), action, "write failed: {e}");
        }
    }
}

/// Apply the rule's error policy to a backend result. `None` means the step
/// is abandoned.
fn settle(rule: &Rule, result: Result<Vec<u8>, CallError>) -> Option<Vec<u8>> {
    match (result, rule.on_error) {
        (Ok(body), _) => Some(body),
        (Err(_), OnError::Forward) => Some(Vec::new()),
        (Err(_), OnError::Abort) => None,
    }
}
