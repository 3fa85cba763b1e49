//! Handlers for `/assist/*`: text helpers backed by the generative client.
//!
//! All four require a session. When no `[assist]` section is configured the
//! routes answer 503.

use std::sync::Arc;

use axum::{Json, extract::State};
use docket_core::store::DocumentStore;
use serde::{Deserialize, Serialize};

use crate::{AppState, assist::GenerativeClient, auth::CurrentUser, error::ApiError};

fn client<S>(state: &AppState<S>) -> Result<Arc<GenerativeClient>, ApiError> {
  state
    .assist
    .clone()
    .ok_or_else(|| ApiError::ServiceUnavailable("assist is not configured".into()))
}

// ─── Summarize ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SummarizeBody {
  pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
  pub summary: String,
}

/// `POST /assist/summarize`
pub async fn summarize<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Json(body): Json<SummarizeBody>,
) -> Result<Json<SummaryResponse>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let summary = client(&state)?.summarize(&body.text).await?;
  Ok(Json(SummaryResponse { summary }))
}

// ─── Translate ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TranslateBody {
  pub text:            String,
  pub target_language: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslationResponse {
  pub translated_text: String,
}

/// `POST /assist/translate`
pub async fn translate<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Json(body): Json<TranslateBody>,
) -> Result<Json<TranslationResponse>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let translated_text = client(&state)?
    .translate(&body.text, &body.target_language)
    .await?;
  Ok(Json(TranslationResponse { translated_text }))
}

// ─── Transliterate ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TransliterateBody {
  pub text:          String,
  pub target_script: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransliterationResponse {
  pub transliterated_text: String,
}

/// `POST /assist/transliterate`
pub async fn transliterate<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Json(body): Json<TransliterateBody>,
) -> Result<Json<TransliterationResponse>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let transliterated_text = client(&state)?
    .transliterate(&body.text, &body.target_script)
    .await?;
  Ok(Json(TransliterationResponse { transliterated_text }))
}

// ─── Q&A ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QnaBody {
  pub question: String,
  pub context:  String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
  pub answer: String,
}

/// `POST /assist/qna`
pub async fn qna<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Json(body): Json<QnaBody>,
) -> Result<Json<AnswerResponse>, ApiError>
where
  S: DocumentStore + Clone + 'static,
{
  let answer = client(&state)?.answer(&body.question, &body.context).await?;
  Ok(Json(AnswerResponse { answer }))
}
