pub mod auth;
pub mod evaluation_task;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_profile;
pub use ws_handler::ws_handler;

use crate::web::state::AppState;

/// Builds the API router. Routes below the profile gate answer 401 while signed out.
pub fn router(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/shell", get(rest::get_shell_handler))
        .route("/shell/navigate", post(rest::navigate_handler))
        .route("/shell/login-prompt", post(rest::login_prompt_handler))
        .route("/shell/chat-panel", post(rest::chat_panel_handler))
        .route("/guide", get(rest::get_guide_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route(
            "/chat",
            get(rest::get_chat_handler).post(rest::send_chat_handler),
        );

    let protected_routes = Router::new()
        .route(
            "/profile",
            get(auth::get_profile_handler).put(auth::update_profile_handler),
        )
        .route("/account", axum::routing::delete(auth::delete_account_handler))
        .route("/dashboard", get(rest::get_dashboard_handler))
        .route("/evaluations", get(rest::list_evaluations_handler))
        .route("/evaluations/{id}", get(rest::get_evaluation_handler))
        .route("/evaluate/status", get(rest::evaluation_status_handler))
        .route("/evaluate/cancel", post(rest::cancel_evaluation_handler))
        .route("/evaluate/report", get(rest::download_report_handler))
        .route("/ws/evaluate", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_profile,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
