//! Handlers for registration, login, logout, and role management.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | `{"email"}`; sends a one-time code |
//! | `POST` | `/auth/verify-otp` | `{"email","otp","username","password","role"}` |
//! | `POST` | `/auth/login` | `{"email","password"}` → bearer token |
//! | `POST` | `/auth/logout` | Ends the presenting session |
//! | `PUT`  | `/users/{email}/role` | Admin only; `{"role"}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{Duration, Utc};
use docket_core::{
  error::non_blank,
  store::DocumentStore,
  user::{NewUser, Role, User, normalize_email},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
  AppState,
  auth::{CurrentUser, hash_password, hash_token, new_session_token, verify_password},
  error::ApiError,
  otp::{generate_code, hash_code},
};

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email: String,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let email = normalize_email(&body.email)?;
  let code = generate_code();

  state
    .store
    .begin_registration(email.clone(), hash_code(&code))
    .await
    .map_err(ApiError::store)?;

  if let Err(e) = state.otp.send(&email, &code) {
    error!(%email, error = %e, "register: verification code not delivered");
    // An undelivered code must not block the next attempt.
    if let Err(e) = state.store.cancel_registration(email.clone()).await {
      warn!(%email, error = %e, "register: undelivered code left pending");
    }
    return Err(ApiError::BadGateway("verification code could not be delivered".into()));
  }

  Ok((StatusCode::ACCEPTED, Json(json!({ "message": "verification code sent" }))))
}

// ─── Verify ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  pub email:    String,
  pub otp:      String,
  pub username: String,
  pub password: String,
  pub role:     String,
}

/// `POST /auth/verify-otp`
pub async fn verify_otp<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<VerifyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let role = Role::parse(&body.role)?;
  if !state.config.registration_roles.contains(&role) {
    return Err(ApiError::BadRequest(format!("role {role} cannot be chosen at registration")));
  }
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be blank".into()));
  }
  let username = non_blank("username", &body.username)?;

  let user: User = state
    .store
    .complete_registration(hash_code(&body.otp), NewUser {
      username,
      email: body.email,
      password_hash: hash_password(&body.password)?,
      role,
    })
    .await
    .map_err(ApiError::store)?;

  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Login / logout ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub token_type:   String,
  /// Seconds until the session expires.
  pub expires_in:   u64,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let invalid = || ApiError::Unauthorized("invalid credentials".into());

  let creds = state
    .store
    .find_credentials(body.email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(invalid)?;
  if !verify_password(&body.password, &creds.password_hash) {
    return Err(invalid());
  }
  if !creds.user.verified {
    return Err(ApiError::Unauthorized("account is not verified".into()));
  }

  let ttl = state.config.session_ttl_secs;
  let token = new_session_token();
  let expires_at = i64::try_from(ttl)
    .ok()
    .and_then(Duration::try_seconds)
    .and_then(|d| Utc::now().checked_add_signed(d))
    .ok_or_else(|| ApiError::Store("session_ttl_secs is out of range".into()))?;
  state
    .store
    .create_session(creds.user.id, hash_token(&token), expires_at)
    .await
    .map_err(ApiError::store)?;

  info!(user_id = creds.user.id, "login");
  Ok(Json(TokenResponse { access_token: token, token_type: "bearer".into(), expires_in: ttl }))
}

/// `POST /auth/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  state
    .store
    .end_session(user.token_hash)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Roles ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role: String,
}

/// `PUT /users/{email}/role`
pub async fn set_role<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(email): Path<String>,
  Json(body): Json<RoleBody>,
) -> Result<Json<User>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  user.require_admin()?;
  let role = Role::parse(&body.role)?;

  let updated = state
    .store
    .set_role(email, role)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(updated))
}
