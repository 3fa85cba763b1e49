//! HTTP layer for Docket.
//!
//! Exposes an axum [`Router`] backed by any [`DocumentStore`]. Sessions are
//! bearer tokens resolved through the store; see [`auth::CurrentUser`].

pub mod assist;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod otp;

pub use config::ServerConfig;
pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use docket_core::store::DocumentStore;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use assist::GenerativeClient;
use handlers::{account, comments, documents, logs, search};
use otp::OtpSender;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub otp:    Arc<dyn OtpSender>,
  /// `None` when no `[assist]` section is configured.
  pub assist: Option<Arc<GenerativeClient>>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Build the full Docket router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DocumentStore + Clone + 'static,
{
  let body_limit = state.config.max_upload_bytes;

  Router::new()
    .route("/health", get(health))
    // Accounts
    .route("/auth/register", post(account::register::<S>))
    .route("/auth/verify-otp", post(account::verify_otp::<S>))
    .route("/auth/login", post(account::login::<S>))
    .route("/auth/logout", post(account::logout::<S>))
    .route("/users/{email}/role", put(account::set_role::<S>))
    // Documents
    .route("/documents", get(documents::list::<S>).post(documents::upload::<S>))
    .route("/documents/search", get(search::search::<S>))
    .route(
      "/documents/{id}",
      get(documents::get_metadata::<S>)
        .put(documents::update_metadata::<S>)
        .delete(documents::delete::<S>),
    )
    .route("/documents/{id}/download", get(documents::download::<S>))
    .route("/documents/{id}/comments", get(comments::list::<S>).post(comments::add::<S>))
    // Activity
    .route("/logs", get(logs::all::<S>))
    .route("/logs/users/{user_id}", get(logs::for_user::<S>).post(logs::append::<S>))
    // Assist
    .route("/assist/summarize", post(handlers::assist::summarize::<S>))
    .route("/assist/translate", post(handlers::assist::translate::<S>))
    .route("/assist/transliterate", post(handlers::assist::transliterate::<S>))
    .route("/assist/qna", post(handlers::assist::qna::<S>))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
