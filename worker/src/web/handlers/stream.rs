//! WebSocket monitoring stream
//!
//! Bridges a socket to `MonitoringService::stream_logs`: frames go out as
//! JSON text, and any close or read error fires the disconnect signal.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use shared::{process_debug, process_warn, ProcessId, SessionFilterQuery, SessionId, StreamFrame};

use crate::error::WorkerResult;
use crate::services::monitoring::MonitoringService;
use crate::state::AppState;

/// Frames buffered per subscriber
pub const STREAM_BUFFER: usize = 64;

pub async fn stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    query: Result<Query<SessionFilterQuery>, QueryRejection>,
) -> WorkerResult<Response> {
    let Query(query) = query?;
    let monitor = Arc::clone(&state.monitor);
    Ok(ws.on_upgrade(move |socket| handle_stream(socket, monitor, query.session_id)))
}

async fn handle_stream(socket: WebSocket, monitor: Arc<MonitoringService>, filter: Option<SessionId>) {
    process_debug!(ProcessId::current(), "🔗 Stream subscriber connected (filter: {:?})", filter);

    let (mut sender, mut receiver) = socket.split();
    let (frame_tx, mut frame_rx) = mpsc::channel::<StreamFrame>(STREAM_BUFFER);
    let (disconnect_tx, disconnect_rx) = oneshot::channel();

    let feed = tokio::spawn({
        let monitor = Arc::clone(&monitor);
        async move { monitor.stream_logs(frame_tx, filter, disconnect_rx).await }
    });

    loop {
        tokio::select! {
            frame = frame_rx.recv() => {
                let Some(frame) = frame else { break };
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        process_warn!(ProcessId::current(), "Failed to serialize stream frame: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = disconnect_tx.send(());
    let _ = feed.await;
    process_debug!(ProcessId::current(), "👋 Stream subscriber closed");
}
