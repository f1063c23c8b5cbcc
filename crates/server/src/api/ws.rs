//! WebSocket support for pushing widget frames.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use waybill_core::{
    Presenter, PresenterError, TrackingContext, TrackingState, TrackingView, ViewConfig,
};

use crate::metrics::{
    RENDER_FRAMES_DEDUPLICATED, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS,
    WS_MESSAGES_SENT,
};
use crate::state::AppState;

/// Interval between heartbeats on an idle connection.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket message sent to widget clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// The widget should redraw with this view.
    Render {
        session_id: Uuid,
        view: TrackingView,
    },
    /// Server heartbeat (sent periodically to keep connection alive).
    Heartbeat { timestamp: i64 },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            WsMessage::Render { .. } => "render",
            WsMessage::Heartbeat { .. } => "heartbeat",
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // Ignore send errors - they just mean no one is listening
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Presenter that publishes each new view to WebSocket clients.
///
/// Rendering the same state and context twice publishes one frame.
pub struct BroadcastPresenter {
    broadcaster: WsBroadcaster,
    view_config: ViewConfig,
    session_id: Mutex<Option<Uuid>>,
    last_view: Mutex<Option<TrackingView>>,
}

impl BroadcastPresenter {
    pub fn new(broadcaster: WsBroadcaster, view_config: ViewConfig) -> Self {
        Self {
            broadcaster,
            view_config,
            session_id: Mutex::new(None),
            last_view: Mutex::new(None),
        }
    }

    /// Tag published frames with this session.
    pub fn set_session(&self, session_id: Uuid) {
        if let Ok(mut slot) = self.session_id.lock() {
            *slot = Some(session_id);
        }
    }
}

impl Presenter for BroadcastPresenter {
    fn render(
        &self,
        state: TrackingState,
        context: &TrackingContext,
    ) -> Result<(), PresenterError> {
        let view = TrackingView::project(state, context, &self.view_config);

        let mut last_view = self
            .last_view
            .lock()
            .map_err(|_| PresenterError::Render("frame cache poisoned".to_string()))?;
        if last_view.as_ref() == Some(&view) {
            RENDER_FRAMES_DEDUPLICATED.inc();
            return Ok(());
        }
        *last_view = Some(view.clone());
        drop(last_view);

        let session_id = self
            .session_id
            .lock()
            .ok()
            .and_then(|slot| *slot)
            .unwrap_or_else(Uuid::nil);
        self.broadcaster
            .broadcast(WsMessage::Render { session_id, view });
        Ok(())
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &WsMessage,
) -> Result<(), ()> {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize WsMessage: {}", e);
            return Ok(());
        }
    };
    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}

/// Handle a single WebSocket connection.
///
/// The connection closes on tracking shutdown so it never keeps the runner's
/// handles alive past the server.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let mut shutdown_rx = state.tracking().shutdown_signal();
    if state.tracking().is_closed() {
        debug!("Tracking already stopped, dropping WebSocket client");
        return;
    }

    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the snapshot so no frame is missed in between
    let mut rx = state.ws_broadcaster().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!("WebSocket client connected");

    // Bring the new client up to date
    if let Ok(snapshot) = state.tracking().snapshot().await {
        let view = TrackingView::project(snapshot.state, &snapshot.context, state.view_config());
        let msg = WsMessage::Render {
            session_id: snapshot.session_id,
            view,
        };
        if send_message(&mut sender, &msg).await.is_err() {
            WS_CONNECTIONS_ACTIVE.dec();
            debug!("WebSocket client left before the first frame");
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(msg) => {
                            if send_message(&mut sender, &msg).await.is_err() {
                                debug!("WebSocket send failed, client disconnected");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("WebSocket client lagged, skipped {} messages", n);
                            WS_LAG_EVENTS.inc();
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Broadcast channel closed");
                            break;
                        }
                    }
                }
                _ = heartbeat.tick() => {
                    let msg = WsMessage::Heartbeat { timestamp: Utc::now().timestamp() };
                    if send_message(&mut sender, &msg).await.is_err() {
                        debug!("Heartbeat failed, client disconnected");
                        break;
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("Closing WebSocket for shutdown");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Handle incoming messages from client (ping/pong, close)
    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket client requested close");
                    break;
                }
                Some(Ok(Message::Text(text))) => {
                    // Actions go through the HTTP endpoints
                    debug!("Ignoring text message: {}", text);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
            },
            // Send side finished: shutdown or a dead client
            _ = &mut send_task => break,
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}
