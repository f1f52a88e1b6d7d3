//! services/dashboard/src/web/auth.rs
//!
//! Local profile endpoints: login, logout, profile editing and account deletion.
//! There is no verification; "login" creates a local profile.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use flareonix_core::{
    domain::{ProfileDraft, UserProfile},
    shell::ShellEvent,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::state::{lock, AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Mirrors `ProfileDraft` for the OpenAPI document.
#[derive(ToSchema)]
#[allow(dead_code)]
#[schema(as = ProfileDraft, rename_all = "camelCase")]
pub struct ProfileDraftSchema {
    name: String,
    email: String,
    company_name: Option<String>,
    industry: Option<String>,
    is_existing_company: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[schema(value_type = Object)]
    pub profile: UserProfile,
}

/// Cancels a streaming evaluation; used when the profile behind it goes away.
fn cancel_streaming_evaluation(state: &AppState) {
    if lock(&state.session).cancel() {
        info!("Cancelled the streaming evaluation of the departing profile.");
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Create the local profile, filling blanks with placeholders
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = ProfileDraftSchema,
    responses(
        (status = 200, description = "Profile created and signed in", body = ProfileResponse),
        (status = 500, description = "The profile could not be saved")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ProfileDraft>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let profile = UserProfile::from_draft(draft);

    state.store.save_profile(&profile).await.map_err(|e| {
        error!("Failed to save profile: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save profile".to_string())
    })?;

    lock(&state.shell).apply(ShellEvent::SignedIn(profile.clone()));
    info!("Signed in local profile {}", profile.id);

    Ok((StatusCode::OK, Json(ProfileResponse { profile })))
}

/// POST /auth/logout - Forget the profile; the evaluation history is kept
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logout successful"),
        (status = 500, description = "The profile record could not be removed")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    cancel_streaming_evaluation(&state);

    state.store.remove_profile().await.map_err(|e| {
        error!("Failed to remove profile: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
    })?;

    lock(&state.shell).apply(ShellEvent::SignedOut);
    info!("Signed out.");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /profile - The signed-in profile
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The signed-in profile", body = ProfileResponse),
        (status = 401, description = "No profile is signed in")
    )
)]
pub async fn get_profile_handler(Extension(profile): Extension<UserProfile>) -> Json<ProfileResponse> {
    Json(ProfileResponse { profile })
}

/// PUT /profile - Replace the profile details, keeping its id
#[utoipa::path(
    put,
    path = "/profile",
    request_body = ProfileDraftSchema,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 401, description = "No profile is signed in"),
        (status = 500, description = "The profile could not be saved")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<UserProfile>,
    Json(draft): Json<ProfileDraft>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let profile = UserProfile::with_id(current.id, draft);

    state.store.save_profile(&profile).await.map_err(|e| {
        error!("Failed to save profile: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save profile".to_string())
    })?;

    lock(&state.shell).apply(ShellEvent::ProfileUpdated(profile.clone()));
    Ok(Json(ProfileResponse { profile }))
}

/// DELETE /account - Remove the profile and the whole evaluation history
#[utoipa::path(
    delete,
    path = "/account",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "No profile is signed in"),
        (status = 500, description = "A record could not be removed")
    )
)]
pub async fn delete_account_handler(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, (StatusCode, String)> {
    cancel_streaming_evaluation(&state);

    // Waits for an evaluation that is already saving, so its write cannot outlive the deletion.
    let _writes = state.history_writes.lock().await;
    let store = &state.store;
    let result = async {
        store.remove_history().await?;
        store.remove_profile().await
    }
    .await;

    if let Err(e) = result {
        error!("Failed to delete account: {:?}", e);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to delete account".to_string(),
        ));
    }

    {
        let mut shell = lock(&state.shell);
        shell.apply(ShellEvent::HistoryCleared);
        shell.apply(ShellEvent::SignedOut);
    }
    info!("Account deleted.");
    Ok(StatusCode::NO_CONTENT)
}
