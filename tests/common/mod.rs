#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use slotgate::backend::StubCaller;
use slotgate::config::GatewaySettings;
use slotgate::routes;
use slotgate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const TIMEOUT: Duration = Duration::from_secs(2);
pub const QUIET_WINDOW: Duration = Duration::from_millis(200);

pub const LOGIN_OK: &str = r#"{"event":true,"data":{"user":{"UserID":"100","HallID":"6"},"Session":{"Session":"abc"}}}"#;

/// Gateway wired to an in-process stub backend.
/// Each instance has its own registry and stub.
pub struct TestServer {
    pub stub: Arc<StubCaller>,
    pub state: AppState,
}

impl TestServer {
    pub fn new() -> Self {
        Self::with_settings(GatewaySettings::default())
    }

    pub fn with_settings(settings: GatewaySettings) -> Self {
        let stub = Arc::new(StubCaller::new());
        let state = AppState::new(stub.clone(), settings);
        Self { stub, state }
    }

    /// Returns an Axum Router wired to this server's state for `oneshot()` calls.
    pub fn router(&self) -> axum::Router {
        routes::router(self.state.clone())
    }

    /// Binds a TCP listener on port 0, spawns the server, and returns the ws base URL.
    pub async fn spawn(&self) -> String {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("ws://127.0.0.1:{}", addr.port())
    }

    pub fn registry_count(&self) -> usize {
        self.state.registry.count()
    }

    /// Poll until `check` holds or the timeout passes.
    pub async fn eventually(&self, mut check: impl FnMut(&Self) -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            if check(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        check(self)
    }
}

/// Connect and consume the `ready` greeting.
pub async fn connect_ready(base: &str, category: u16) -> WsClient {
    let mut ws = connect(base, category).await;
    let ready = recv(&mut ws).await;
    assert_eq!(ready, r#"{"action":"ready","result":null}"#);
    ws
}

pub async fn connect(base: &str, category: u16) -> WsClient {
    let (ws, _) = connect_async(format!("{base}/casino/{category}"))
        .await
        .expect("websocket handshake failed");
    ws
}

pub async fn send(ws: &mut WsClient, frame: &str) {
    ws.send(Message::Binary(frame.as_bytes().to_vec().into()))
        .await
        .expect("ws send failed");
}

/// Next application frame as text; fails if it is not binary or does not
/// arrive in time.
pub async fn recv(ws: &mut WsClient) -> String {
    let msg = tokio::time::timeout(TIMEOUT, ws.next())
        .await
        .expect("timed out waiting for frame")
        .expect("stream ended")
        .expect("ws read failed");
    assert!(msg.is_binary(), "expected binary frame, got {msg:?}");
    String::from_utf8(msg.into_data().to_vec()).unwrap()
}

/// Assert nothing arrives within the quiet window.
pub async fn assert_silent(ws: &mut WsClient) {
    if let Ok(Some(msg)) = tokio::time::timeout(QUIET_WINDOW, ws.next()).await {
        panic!("expected no frame, got {msg:?}");
    }
}

/// Send a login frame against a backend primed with `LOGIN_OK` and wait for
/// both login responses.
pub async fn login(ws: &mut WsClient) {
    send(ws, r#"{"action":"loginBySid","sid":"abc"}"#).await;
    let on_login = recv(ws).await;
    assert!(on_login.starts_with(r#"{"action":"onLogin""#), "{on_login}");
    let on_take = recv(ws).await;
    assert!(on_take.starts_with(r#"{"action":"onTakeMachine""#), "{on_take}");
}
