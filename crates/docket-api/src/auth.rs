//! Password hashing, opaque session tokens, and the bearer-token extractor.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use docket_core::{store::DocumentStore, user::Role};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{AppState, error::ApiError};

/// Number of random bytes in a session token.
const TOKEN_BYTES: usize = 32;

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))
}

/// Check `password` against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// A fresh bearer token: 32 random bytes, URL-safe base64 without padding.
pub fn new_session_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// Lowercase hex SHA-256. Only this digest of a token or OTP is persisted.
pub fn sha256_hex(value: &str) -> String { hex::encode(Sha256::digest(value.as_bytes())) }

pub fn hash_token(token: &str) -> String { sha256_hex(token) }

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.split_once(' ')?;
  let token = token.trim();
  (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated caller, resolved from an unexpired session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
  pub user_id:    i64,
  pub email:      String,
  pub role:       Role,
  /// Digest of the presented token, kept so logout can end this session.
  pub token_hash: String,
}

impl CurrentUser {
  /// Uploads, edits, and deletes need `editor` or `admin`.
  pub fn require_writer(&self) -> Result<(), ApiError> {
    if self.role.can_write() {
      Ok(())
    } else {
      Err(ApiError::Forbidden(format!("role {} may not modify documents", self.role)))
    }
  }

  pub fn require_admin(&self) -> Result<(), ApiError> {
    if self.role.is_admin() {
      Ok(())
    } else {
      Err(ApiError::Forbidden("admin role required".into()))
    }
  }

  /// Admins may act on any user's records; everyone else only on their own.
  pub fn require_self_or_admin(&self, user_id: i64) -> Result<(), ApiError> {
    if self.user_id == user_id || self.role.is_admin() {
      Ok(())
    } else {
      Err(ApiError::Forbidden("cannot access another user's records".into()))
    }
  }
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: DocumentStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token_hash = bearer_token(&parts.headers)
      .map(hash_token)
      .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;

    let user = state
      .store
      .session_user(token_hash.clone(), Utc::now())
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::Unauthorized("invalid or expired session".into()))?;

    Ok(CurrentUser { user_id: user.id, email: user.email, role: user.role, token_hash })
  }
}
