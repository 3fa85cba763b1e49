//! Handlers for `/documents` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/documents` | Every document with tags and comments |
//! | `POST`   | `/documents` | Multipart: `file`, `title`, `tags`, `permissions`; editor+ |
//! | `GET`    | `/documents/{id}` | Metadata |
//! | `PUT`    | `/documents/{id}` | Partial [`MetadataEdit`]; editor+ |
//! | `DELETE` | `/documents/{id}` | editor+ |
//! | `GET`    | `/documents/{id}/download` | Raw bytes as an attachment |

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use docket_core::{
  document::{
    Document, DocumentMetadata, DocumentOverview, MetadataEdit, NewDocument, ascii_name,
  },
  store::DocumentStore,
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError, handlers::record};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /documents`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
) -> Result<Json<Vec<DocumentOverview>>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let docs = state
    .store
    .list_documents()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(docs))
}

// ─── Upload ──────────────────────────────────────────────────────────────────

/// Split a form value into list entries. Both repeated fields and a single
/// comma-separated field are accepted; empty pieces are dropped.
fn push_list(into: &mut Vec<String>, raw: &str) {
  into.extend(
    raw
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned),
  );
}

/// `POST /documents`
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  user.require_writer()?;

  let mut file: Option<(String, Vec<u8>)> = None;
  let mut title: Option<String> = None;
  let mut tags = Vec::new();
  let mut permissions = Vec::new();

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("multipart error: {e}")))?
  {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some("file") => {
        let filename = field.file_name().unwrap_or("upload").to_owned();
        let bytes = field
          .bytes()
          .await
          .map_err(|e| ApiError::BadRequest(format!("read error: {e}")))?;
        file = Some((filename, bytes.to_vec()));
      }
      Some(key @ ("title" | "tags" | "permissions")) => {
        let key = key.to_owned();
        let value = field
          .text()
          .await
          .map_err(|e| ApiError::BadRequest(format!("read error: {e}")))?;
        match key.as_str() {
          "title" => title = Some(value),
          "tags" => push_list(&mut tags, &value),
          _ => push_list(&mut permissions, &value),
        }
      }
      _ => {}
    }
  }

  let (filename, content) =
    file.ok_or_else(|| ApiError::BadRequest("missing file in multipart form".into()))?;
  let title = title.ok_or_else(|| ApiError::BadRequest("missing title".into()))?;

  let document: Document = state
    .store
    .upload(NewDocument {
      title,
      filename,
      content,
      tags,
      permissions,
      uploaded_by: user.user_id,
    })
    .await
    .map_err(ApiError::store)?;

  record(state.store.as_ref(), &user, "upload", document.document_id).await;
  Ok((StatusCode::CREATED, Json(document)))
}

// ─── Metadata ────────────────────────────────────────────────────────────────

/// `GET /documents/{id}`
pub async fn get_metadata<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<DocumentMetadata>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let meta = state
    .store
    .get_metadata(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(meta))
}

/// `PUT /documents/{id}`
pub async fn update_metadata<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(edit): Json<MetadataEdit>,
) -> Result<Json<DocumentMetadata>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  user.require_writer()?;

  let meta = state
    .store
    .update_metadata(id, edit)
    .await
    .map_err(ApiError::store)?;

  record(state.store.as_ref(), &user, "edit", id).await;
  Ok(Json(meta))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /documents/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  user.require_writer()?;

  state.store.delete(id).await.map_err(ApiError::store)?;

  record(state.store.as_ref(), &user, "delete", id).await;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Download ────────────────────────────────────────────────────────────────

/// An attachment disposition carrying the upload name as an RFC 5987
/// `filename*`, with an ASCII `filename` for clients that ignore it.
fn content_disposition(filename: &str) -> String {
  format!(
    "attachment; filename=\"{}\"; filename*=UTF-8''{}",
    ascii_name(filename),
    urlencoding::encode(filename),
  )
}

/// `GET /documents/{id}/download`
pub async fn download<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let file = state.store.download(id).await.map_err(ApiError::store)?;

  record(state.store.as_ref(), &user, "download", id).await;

  let disposition = content_disposition(&file.filename);
  Ok((
    [
      (header::CONTENT_TYPE, "application/octet-stream".to_owned()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    file.content,
  ))
}
