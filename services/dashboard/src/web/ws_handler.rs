//! services/dashboard/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for an evaluation WebSocket.
//! It turns client messages into session transitions and delegates the
//! streaming work to `evaluation_task`.

use crate::web::{
    evaluation_task::{evaluation_process, start_evaluation},
    protocol::{ClientMessage, ServerMessage},
    state::{lock, AppState},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use flareonix_core::domain::UserProfile;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
#[utoipa::path(
    get,
    path = "/ws/evaluate",
    responses(
        (status = 101, description = "Switching to the evaluation WebSocket protocol"),
        (status = 401, description = "No profile is signed in")
    )
)]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(profile): Extension<UserProfile>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, profile))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, profile: UserProfile) {
    info!("New evaluation WebSocket established for profile: {}", profile.id);

    let (mut ws_sender, mut receiver) = socket.split();
    let (events, mut outbox) = mpsc::unbounded_channel::<ServerMessage>();

    // --- 1. Writer Task ---
    // Every producer (this loop and the evaluation tasks) funnels through one channel.
    let writer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize server message: {:?}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                warn!("Client went away while sending.");
                break;
            }
        }
    });

    // --- 2. Main Message Loop ---
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => handle_text_message(text.as_str(), &app_state, &events),
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- 3. Cleanup ---
    // A running evaluation is left to finish; its result stays visible through
    // the status endpoint and the history.
    drop(events);
    writer.abort();
    info!("Evaluation WebSocket closed.");
}

/// Handles one client text frame; every reply goes out through `events`.
pub fn handle_text_message(
    text: &str,
    app_state: &Arc<AppState>,
    events: &UnboundedSender<ServerMessage>,
) {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Submit { idea }) => match start_evaluation(app_state, &idea) {
            Ok(submission) => {
                info!("Submission accepted; spawning evaluation task.");
                // Announce the start before the task can emit its first chunk.
                let _ = events.send(ServerMessage::EvaluationStarted);
                let app_state = app_state.clone();
                let task_events = events.clone();
                tokio::spawn(async move {
                    evaluation_process(app_state, submission, Some(task_events)).await;
                });
                return;
            }
            Err(rejection) => {
                info!("Submission ignored: {}", rejection);
                ServerMessage::Ignored {
                    reason: rejection.to_string(),
                }
            }
        },
        Ok(ClientMessage::Cancel) => {
            if lock(&app_state.session).cancel() {
                return;
            }
            ServerMessage::Ignored {
                reason: "no evaluation is streaming".to_string(),
            }
        }
        Err(e) => {
            warn!("Failed to parse client message: {}", e);
            ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            }
        }
    };
    let _ = events.send(reply);
}
