use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
    Json,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument, warn};

use super::hub::SpectatorFeed;
use super::messages::SpectatorMessage;
use crate::shared::{AppError, AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectatorSessionResponse {
    pub code: String,
}

/// POST /spectate
///
/// Opens a spectator session for the active game and returns its join code
#[instrument(name = "start_spectating_session", skip(state))]
pub async fn start_session(
    State(state): State<AppState>,
) -> Result<Json<SpectatorSessionResponse>, AppError> {
    let code = state.service.start_spectating_session().await?;
    Ok(Json(SpectatorSessionResponse { code }))
}

/// GET /spectate/:code
///
/// Upgrades to a send-only WebSocket streaming game snapshots
#[instrument(name = "spectate", skip(state, ws))]
pub async fn spectate(
    ws: WebSocketUpgrade,
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let code = code.to_uppercase();
    let feed = state
        .service
        .spectators()
        .subscribe(&code)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Spectator session {}", code)))?;

    info!(code = %code, "Spectator connecting");
    Ok(ws.on_upgrade(move |socket| stream_snapshots(socket, code, feed)))
}

async fn stream_snapshots(socket: WebSocket, code: String, feed: SpectatorFeed) {
    let (mut sender, mut receiver) = socket.split();
    let SpectatorFeed { last, mut updates } = feed;

    if let Some(message) = last {
        if send(&mut sender, &message).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(message) => {
                    if send(&mut sender, &message).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(code = %code, skipped, "Spectator lagging, skipping to newer snapshots");
                }
                Err(RecvError::Closed) => break,
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(code = %code, error = %e, "Spectator socket error");
                    break;
                }
            },
        }
    }

    let _ = sender.send(Message::Close(None)).await;
    info!(code = %code, "Spectator disconnected");
}

async fn send<S>(sender: &mut S, message: &SpectatorMessage) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let text = message.to_json().map_err(|e| {
        warn!(error = %e, "Failed to serialize snapshot");
    })?;
    sender.send(Message::Text(text)).await.map_err(|_| ())
}
