//! Client for the generative-language `generateContent` API.
//!
//! Each operation builds a single-turn prompt, posts it, and returns the first
//! text part of the first candidate. The model's behaviour is not interpreted.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{config::AssistConfig, error::ApiError};

#[derive(Debug, Error)]
pub enum AssistError {
  #[error("{0} must not be blank")]
  Blank(&'static str),

  #[error("request to the generative API failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("generative API returned {status}: {detail}")]
  Upstream { status: u16, detail: String },

  #[error("generative API returned no text")]
  EmptyResponse,
}

impl From<AssistError> for ApiError {
  fn from(e: AssistError) -> Self {
    match e {
      AssistError::Blank(_) => ApiError::BadRequest(e.to_string()),
      _ => ApiError::BadGateway(e.to_string()),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
  contents:          Vec<Content>,
  #[serde(skip_serializing_if = "Option::is_none")]
  generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
  parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
  text: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature:       f32,
  max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
  text: Option<String>,
}

impl GenerateResponse {
  fn first_text(self) -> Option<String> {
    self
      .candidates
      .into_iter()
      .next()?
      .content?
      .parts
      .into_iter()
      .next()?
      .text
      .map(|t| t.trim().to_owned())
      .filter(|t| !t.is_empty())
  }
}

// ─── Prompts ─────────────────────────────────────────────────────────────────

const SUMMARIZE: GenerationConfig = GenerationConfig { temperature: 0.7, max_output_tokens: 1024 };
const TRANSLATE: GenerationConfig = GenerationConfig { temperature: 0.3, max_output_tokens: 2048 };
const TRANSLITERATE: GenerationConfig =
  GenerationConfig { temperature: 0.0, max_output_tokens: 2048 };

fn summarize_prompt(text: &str) -> String { format!("Summarize this:\n{text}") }

fn translate_prompt(text: &str, target_language: &str) -> String {
  format!("Translate this text to {target_language}:\n\n{text}")
}

fn transliterate_prompt(text: &str, target_script: &str) -> String {
  format!(
    "Transliterate the following text to {target_script} script while keeping the \
     pronunciation intact.\n\n\
     IMPORTANT:\n\
     - Do not translate the meaning, only convert the script.\n\
     - Keep all punctuation and formatting exactly as in the original text.\n\
     - Keep proper nouns, technical terms, and abbreviations as they are.\n\n\
     Text: {text}"
  )
}

fn answer_prompt(question: &str, context: &str) -> String {
  format!(
    "Context:\n{context}\n\nQuestion: {question}\n\
     Please answer the question based on the context provided."
  )
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, AssistError> {
  let trimmed = value.trim();
  if trimmed.is_empty() { Err(AssistError::Blank(field)) } else { Ok(trimmed) }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// HTTP client bound to one model endpoint and API key.
#[derive(Clone)]
pub struct GenerativeClient {
  http:     reqwest::Client,
  endpoint: String,
  api_key:  String,
}

impl std::fmt::Debug for GenerativeClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GenerativeClient")
      .field("endpoint", &self.endpoint)
      .finish_non_exhaustive()
  }
}

impl GenerativeClient {
  pub fn new(config: &AssistConfig) -> Result<Self, AssistError> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { http, endpoint: config.endpoint.clone(), api_key: config.api_key.clone() })
  }

  pub async fn summarize(&self, text: &str) -> Result<String, AssistError> {
    let text = required("text", text)?;
    self.generate(summarize_prompt(text), Some(SUMMARIZE)).await
  }

  pub async fn translate(&self, text: &str, target_language: &str) -> Result<String, AssistError> {
    let text = required("text", text)?;
    let target = required("target_language", target_language)?;
    self.generate(translate_prompt(text, target), Some(TRANSLATE)).await
  }

  pub async fn transliterate(
    &self,
    text:          &str,
    target_script: &str,
  ) -> Result<String, AssistError> {
    let text = required("text", text)?;
    let target = required("target_script", target_script)?;
    self
      .generate(transliterate_prompt(text, target), Some(TRANSLITERATE))
      .await
  }

  pub async fn answer(&self, question: &str, context: &str) -> Result<String, AssistError> {
    let question = required("question", question)?;
    let context = required("context", context)?;
    self.generate(answer_prompt(question, context), None).await
  }

  async fn generate(
    &self,
    prompt: String,
    config: Option<GenerationConfig>,
  ) -> Result<String, AssistError> {
    let body = GenerateRequest {
      contents:          vec![Content { parts: vec![Part { text: prompt }] }],
      generation_config: config,
    };

    debug!(endpoint = %self.endpoint, "assist: generateContent");
    let resp = self
      .http
      .post(&self.endpoint)
      .header("x-goog-api-key", &self.api_key)
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let detail = resp.text().await.unwrap_or_default();
      return Err(AssistError::Upstream { status: status.as_u16(), detail });
    }

    resp
      .json::<GenerateResponse>()
      .await?
      .first_text()
      .ok_or(AssistError::EmptyResponse)
  }
}
