//! WebSocket upgrade handler and the JSON text-frame transport.

use async_trait::async_trait;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, warn};

use courier_realtime::connection::stream::{ClientEventSource, ServerEventSink, StreamError};
use courier_realtime::{AuthenticatedSubject, ClientEvent, ServerEvent};

use crate::extractors::StreamSubject;
use crate::state::AppState;

/// GET /ws, authenticated before the upgrade is accepted.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    StreamSubject(subject): StreamSubject,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, subject, socket))
}

async fn handle_socket(state: AppState, subject: AuthenticatedSubject, socket: WebSocket) {
    let (tx, rx) = socket.split();
    let user_id = subject.user_id;

    if let Err(e) = state
        .connections
        .serve(subject, WsSource(rx), WsSink(tx))
        .await
    {
        error!(user_id = %user_id, error = %e, "WebSocket session failed");
    }
}

/// Inbound half: decodes text frames into client events.
pub struct WsSource(pub SplitStream<WebSocket>);

#[async_trait]
impl ClientEventSource for WsSource {
    async fn receive(&mut self) -> Result<Option<ClientEvent>, StreamError> {
        while let Some(frame) = self.0.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str(text.as_str()) {
                    Ok(event) => return Ok(Some(event)),
                    Err(e) => warn!(error = %e, "Skipping undecodable frame"),
                },
                Ok(Message::Close(_)) => return Ok(None),
                Ok(Message::Binary(_)) => warn!("Skipping binary frame"),
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    debug!("Transport keepalive frame");
                }
                Err(e) => return Err(StreamError::Transport(e.to_string())),
            }
        }
        Ok(None)
    }
}

/// Outbound half: encodes server events as text frames.
pub struct WsSink(pub SplitSink<WebSocket, Message>);

#[async_trait]
impl ServerEventSink for WsSink {
    async fn send(&mut self, event: ServerEvent) -> Result<(), StreamError> {
        let json =
            serde_json::to_string(&event).map_err(|e| StreamError::Encode(e.to_string()))?;
        self.0
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        self.0
            .close()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))
    }
}
