//! Per-project WebSocket progress stream.
//!
//! A client subscribes to one project and receives serialized
//! [`ProgressEvent`]s until a terminal event (completed, failed,
//! cancelled) is delivered, after which the server closes the
//! connection. There is no replay: events published before the
//! subscription are gone, and a late joiner should fetch current state
//! from the status endpoint first.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use spinelift_core::error::CoreError;
use spinelift_core::pipeline_events::is_terminal_event;
use spinelift_core::types::DbId;
use spinelift_db::repositories::ProjectRepo;
use spinelift_events::ProgressBus;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/v1/projects/{id}/ws
///
/// Rejects with 404 before the upgrade when the project does not exist.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<DbId>,
    State(state): State<AppState>,
) -> AppResult<Response> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    let bus = Arc::clone(&state.progress_bus);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, project.id, bus)))
}

/// Forward bus events for one project onto the socket.
///
/// The loop ends when the client disconnects, the sink fails, or a
/// terminal event has been delivered.
async fn handle_socket(socket: WebSocket, project_id: DbId, bus: Arc<ProgressBus>) {
    tracing::info!(project_id, "Progress subscription opened");
    let mut rx = bus.subscribe(project_id).await;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                None | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {
                    // Clients only listen on this stream.
                }
                Some(Err(e)) => {
                    tracing::debug!(project_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            event = rx.recv() => match event {
                Ok(event) => {
                    let terminal = is_terminal_event(&event.event_type);
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::error!(project_id, error = %e, "Failed to serialize event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                    if terminal {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Progress is cumulative, so skipping stale events
                    // loses nothing the next event won't restate.
                    tracing::warn!(project_id, skipped, "Slow progress subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracing::info!(project_id, "Progress subscription closed");
}
