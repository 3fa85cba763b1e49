//! `GET /documents/search?query=`

use axum::{
  Json,
  extract::{Query, State},
};
use docket_core::{document::SearchHit, store::DocumentStore};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub query: String,
}

/// Matches on title, tag name, or uploader email. A blank query is a 400.
pub async fn search<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let hits = state
    .store
    .search(&params.query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(hits))
}
