//! services/dashboard/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    auth::{self, ProfileDraftSchema, ProfileResponse},
    state::{lock, AppState},
    ws_handler,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use flareonix_core::{
    chat::{ChatRejection, ChatTranscript},
    dashboard::DashboardSummary,
    domain::{ChatMessage, IdeaEvaluation, UserProfile},
    guide::{self, Guide},
    session::{report_file_name, SessionSnapshot},
    shell::{NavigationTab, ShellEffect, ShellEvent, ShellView},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_shell_handler,
        navigate_handler,
        login_prompt_handler,
        chat_panel_handler,
        get_guide_handler,
        get_chat_handler,
        send_chat_handler,
        get_dashboard_handler,
        list_evaluations_handler,
        get_evaluation_handler,
        evaluation_status_handler,
        cancel_evaluation_handler,
        download_report_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::get_profile_handler,
        auth::update_profile_handler,
        auth::delete_account_handler,
        ws_handler::ws_handler,
    ),
    components(
        schemas(
            NavigateRequest,
            PanelRequest,
            ChatRequest,
            ChatResponse,
            CancelResponse,
            ProfileDraftSchema,
            ProfileResponse,
        )
    ),
    tags(
        (name = "Flareonix API", description = "API endpoints for the startup idea evaluator dashboard.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct NavigateRequest {
    #[schema(value_type = String, example = "evaluate")]
    pub tab: NavigationTab,
}

/// Opens or closes one of the overlay panels.
#[derive(Deserialize, ToSchema)]
pub struct PanelRequest {
    pub open: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<ChatMessage>,
    pub pending: bool,
}

#[derive(Serialize, ToSchema)]
pub struct CancelResponse {
    pub cancelled: bool,
}

//=========================================================================================
// View Shell Handlers
//=========================================================================================

/// The current shell: visible view, active tab and panel flags.
#[utoipa::path(
    get,
    path = "/shell",
    responses((status = 200, description = "The current shell view", body = Object))
)]
pub async fn get_shell_handler(State(app_state): State<Arc<AppState>>) -> Json<ShellView> {
    Json(lock(&app_state.shell).view())
}

/// Switch tabs. Leaving the evaluator cancels a streaming evaluation.
#[utoipa::path(
    post,
    path = "/shell/navigate",
    request_body = NavigateRequest,
    responses((status = 200, description = "The updated shell view", body = Object))
)]
pub async fn navigate_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<NavigateRequest>,
) -> Json<ShellView> {
    let (effect, view) = {
        let mut shell = lock(&app_state.shell);
        let effect = shell.apply(ShellEvent::Navigate(req.tab));
        (effect, shell.view())
    };
    if effect == Some(ShellEffect::LeftEvaluator) && lock(&app_state.session).cancel() {
        info!("Left the evaluator; the streaming evaluation was cancelled.");
    }
    Json(view)
}

#[utoipa::path(
    post,
    path = "/shell/login-prompt",
    request_body = PanelRequest,
    responses((status = 200, description = "The updated shell view", body = Object))
)]
pub async fn login_prompt_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<PanelRequest>,
) -> Json<ShellView> {
    let event = if req.open {
        ShellEvent::OpenLoginPrompt
    } else {
        ShellEvent::CloseLoginPrompt
    };
    let mut shell = lock(&app_state.shell);
    shell.apply(event);
    Json(shell.view())
}

#[utoipa::path(
    post,
    path = "/shell/chat-panel",
    request_body = PanelRequest,
    responses((status = 200, description = "The updated shell view", body = Object))
)]
pub async fn chat_panel_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<PanelRequest>,
) -> Json<ShellView> {
    let mut shell = lock(&app_state.shell);
    shell.apply(ShellEvent::SetChatOpen(req.open));
    Json(shell.view())
}

/// The product guide. Available without a profile.
#[utoipa::path(
    get,
    path = "/guide",
    responses((status = 200, description = "The four-step guide", body = Object))
)]
pub async fn get_guide_handler() -> Json<Guide> {
    Json(guide::guide())
}

//=========================================================================================
// Support Chat Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/chat",
    responses((status = 200, description = "The chat transcript", body = ChatResponse))
)]
pub async fn get_chat_handler(State(app_state): State<Arc<AppState>>) -> Json<ChatResponse> {
    let transcript = lock(&app_state.transcript);
    Json(ChatResponse {
        messages: transcript.messages().to_vec(),
        pending: transcript.is_pending(),
    })
}

/// Send one message to the support assistant.
///
/// On failure the transcript is left exactly as it was.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The assistant's reply", body = Object),
        (status = 400, description = "The message is empty"),
        (status = 409, description = "A reply is already pending"),
        (status = 502, description = "The assistant could not be reached")
    )
)]
pub async fn send_chat_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatMessage>, (StatusCode, String)> {
    let (pending, history) = PendingChat::begin(&app_state.transcript, &req.message)
        .map_err(|rejection| {
            let status = match rejection {
                ChatRejection::EmptyMessage => StatusCode::BAD_REQUEST,
                ChatRejection::Busy => StatusCode::CONFLICT,
            };
            (status, rejection.to_string())
        })?;

    match app_state.chat_adapter.reply(&req.message, &history).await {
        Ok(reply) => Ok(Json(pending.finish(&req.message, reply))),
        Err(e) => {
            error!("Chat request failed: {:?}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                "Sorry, I encountered an error. Please try again later.".to_string(),
            ))
        }
    }
}

/// Holds the transcript's in-flight guard for one request.
///
/// Dropping it without `finish` (a failed reply, or the handler future being
/// dropped on disconnect) releases the guard and leaves the transcript unchanged.
struct PendingChat<'a> {
    transcript: &'a Mutex<ChatTranscript>,
    finished: bool,
}

impl<'a> PendingChat<'a> {
    fn begin(
        transcript: &'a Mutex<ChatTranscript>,
        message: &str,
    ) -> Result<(Self, Vec<ChatMessage>), ChatRejection> {
        let history = lock(transcript).begin(message)?;
        Ok((
            Self {
                transcript,
                finished: false,
            },
            history,
        ))
    }

    fn finish(mut self, message: &str, reply: String) -> ChatMessage {
        self.finished = true;
        lock(self.transcript).finish(message, reply)
    }
}

impl Drop for PendingChat<'_> {
    fn drop(&mut self) {
        if !self.finished {
            lock(self.transcript).abort();
        }
    }
}

//=========================================================================================
// Dashboard and History Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Readiness summary of the history", body = Object),
        (status = 401, description = "No profile is signed in")
    )
)]
pub async fn get_dashboard_handler(State(app_state): State<Arc<AppState>>) -> Json<DashboardSummary> {
    Json(DashboardSummary::from_history(&lock(&app_state.shell).evaluations))
}

/// All past evaluations, newest first.
#[utoipa::path(
    get,
    path = "/evaluations",
    responses(
        (status = 200, description = "The evaluation history", body = Vec<Object>),
        (status = 401, description = "No profile is signed in")
    )
)]
pub async fn list_evaluations_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<IdeaEvaluation>> {
    Json(lock(&app_state.shell).evaluations.clone())
}

#[utoipa::path(
    get,
    path = "/evaluations/{id}",
    params(("id" = String, Path, description = "The evaluation id")),
    responses(
        (status = 200, description = "One past evaluation", body = Object),
        (status = 401, description = "No profile is signed in"),
        (status = 404, description = "No evaluation with this id")
    )
)]
pub async fn get_evaluation_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<IdeaEvaluation>, (StatusCode, String)> {
    lock(&app_state.shell)
        .evaluations
        .iter()
        .find(|evaluation| evaluation.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Evaluation {} not found", id)))
}

//=========================================================================================
// Evaluation Session Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/evaluate/status",
    responses(
        (status = 200, description = "Phase, transcript and result of the current session", body = Object),
        (status = 401, description = "No profile is signed in")
    )
)]
pub async fn evaluation_status_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<SessionSnapshot> {
    Json(lock(&app_state.session).snapshot())
}

#[utoipa::path(
    post,
    path = "/evaluate/cancel",
    responses(
        (status = 200, description = "Whether a streaming evaluation was cancelled", body = CancelResponse),
        (status = 401, description = "No profile is signed in")
    )
)]
pub async fn cancel_evaluation_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(profile): Extension<UserProfile>,
) -> Json<CancelResponse> {
    let cancelled = lock(&app_state.session).cancel();
    info!("Cancel requested by {}: {}", profile.id, cancelled);
    Json(CancelResponse { cancelled })
}

/// Download the current report as a plain-text file.
#[utoipa::path(
    get,
    path = "/evaluate/report",
    responses(
        (status = 200, description = "The report text", body = String, content_type = "text/plain"),
        (status = 401, description = "No profile is signed in"),
        (status = 404, description = "There is no report to export yet")
    )
)]
pub async fn download_report_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let transcript = lock(&app_state.session).transcript().to_string();
    if transcript.is_empty() {
        return Err((StatusCode::NOT_FOUND, "No report to export".to_string()));
    }

    let disposition = format!("attachment; filename=\"{}\"", report_file_name(Utc::now()));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        transcript,
    ))
}
