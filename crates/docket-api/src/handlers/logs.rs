//! Handlers for the activity log.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/logs` | Every entry; admin only |
//! | `GET`  | `/logs/users/{user_id}` | The user's own entries (or any, for admins) |
//! | `POST` | `/logs/users/{user_id}` | `{"action","document_id"?,"timestamp"}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  activity::{ActivityLog, NewActivity},
  store::DocumentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ActivityBody {
  pub action:      String,
  #[serde(default)]
  pub document_id: Option<Uuid>,
  /// `YYYY-MM-DD HH:MM:SS`.
  pub timestamp:   String,
}

/// `GET /logs`
pub async fn all<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Vec<ActivityLog>>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  user.require_admin()?;
  let logs = state.store.all_activity().await.map_err(ApiError::store)?;
  Ok(Json(logs))
}

/// `GET /logs/users/{user_id}`
pub async fn for_user<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(user_id): Path<i64>,
) -> Result<Json<Vec<ActivityLog>>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  user.require_self_or_admin(user_id)?;
  let logs = state
    .store
    .activity_for_user(user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(logs))
}

/// `POST /logs/users/{user_id}`
pub async fn append<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(user_id): Path<i64>,
  Json(body): Json<ActivityBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  user.require_self_or_admin(user_id)?;
  let entry = state
    .store
    .record_activity(NewActivity {
      user_id,
      action: body.action,
      document_id: body.document_id,
      timestamp: body.timestamp,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(entry)))
}
