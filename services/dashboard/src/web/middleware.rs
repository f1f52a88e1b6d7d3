//! services/dashboard/src/web/middleware.rs
//!
//! Gating middleware for routes that only make sense with a signed-in profile.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::state::{lock, AppState};

/// Middleware that requires a local profile and hands it to the handler.
///
/// If a profile is signed in, it is inserted into the request extensions.
/// Otherwise the request is answered with 401 Unauthorized.
pub async fn require_profile(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let profile = lock(&state.shell).profile.clone().ok_or_else(|| {
        debug!("Rejecting {} without a signed-in profile", req.uri().path());
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(profile);
    Ok(next.run(req).await)
}
