//! Handlers for `/documents/{id}/comments`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  comment::{Comment, NewComment},
  store::DocumentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub comment_text: String,
}

/// `GET /documents/{id}/comments`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let comments = state
    .store
    .comments_for(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(comments))
}

/// `POST /documents/{id}/comments`
///
/// The comment is attributed to the caller's email.
pub async fn add<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let comment = state
    .store
    .add_comment(NewComment {
      document_id:  id,
      user_email:   user.email,
      comment_text: body.comment_text,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}
