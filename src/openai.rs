//! Minimal OpenAI client backing `ContentGenerator`.
//!
//! We only call chat.completions and request either plain text or a strict JSON object.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{ChatMessage, Question, OPTIONS_PER_QUESTION};
use crate::generator::{ContentGenerator, GenerationError, GenerationOutput, GenerationRequest};
use crate::util::fill_template;

/// How many earlier tutor turns are sent along with a new question.
const TUTOR_HISTORY_TURNS: usize = 8;

#[derive(Clone)]
pub struct OpenAiGenerator {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
  pub model: String,
  prompts: Prompts,
}

#[derive(Deserialize)]
struct GenQuiz {
  questions: Vec<GenQuestion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenQuestion {
  question: String,
  options: Vec<String>,
  correct_answer: usize,
  #[serde(default)]
  explanation: String,
}

impl OpenAiGenerator {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(prompts: Prompts) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model, prompts })
  }

  async fn chat(&self, messages: Vec<ChatMessageReq>, temperature: f32, json: bool) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages,
      temperature,
      response_format: json.then(|| ResponseFormat { r#type: "json_object".into() }),
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "study-companion/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(elapsed = ?start.elapsed(), prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();
    if text.is_empty() {
      return Err("empty completion".into());
    }
    Ok(text)
  }

  #[instrument(level = "info", skip(self, material), fields(model = %self.model, material_len = material.len()))]
  async fn quiz(&self, material: &str, count: usize) -> Result<Vec<Question>, GenerationError> {
    let count_s = count.to_string();
    let user = fill_template(&self.prompts.quiz_user_template, &[("count", &count_s), ("material", material)]);
    let raw = self
      .chat(vec![ChatMessageReq::system(&self.prompts.quiz_system), ChatMessageReq::user(&user)], 0.4, true)
      .await
      .map_err(GenerationError::Backend)?;
    let gen: GenQuiz = serde_json::from_str(&raw)
      .map_err(|e| GenerationError::Malformed(format!("JSON parse error: {}", e)))?;
    into_questions(gen, count)
  }

  #[instrument(level = "info", skip(self, message, history), fields(model = %self.model, message_len = message.len(), history = history.len()))]
  async fn tutor(&self, message: &str, history: &[ChatMessage]) -> Result<String, GenerationError> {
    let mut messages = vec![ChatMessageReq::system(&self.prompts.tutor_system)];
    let skip = history.len().saturating_sub(TUTOR_HISTORY_TURNS);
    for m in history.iter().skip(skip) {
      messages.push(if m.is_user { ChatMessageReq::user(&m.text) } else { ChatMessageReq::assistant(&m.text) });
    }
    messages.push(ChatMessageReq::user(message));
    self.chat(messages, 0.5, false).await.map_err(GenerationError::Backend)
  }

  #[instrument(level = "info", skip(self, text), fields(model = %self.model, text_len = text.len()))]
  async fn summary(&self, text: &str) -> Result<String, GenerationError> {
    self
      .chat(vec![ChatMessageReq::system(&self.prompts.summary_system), ChatMessageReq::user(text)], 0.2, false)
      .await
      .map_err(GenerationError::Backend)
  }
}

/// Check the model's quiz against the shape the state machine expects and
/// assign session-local ids.
fn into_questions(gen: GenQuiz, count: usize) -> Result<Vec<Question>, GenerationError> {
  if gen.questions.len() < count {
    return Err(GenerationError::Malformed(format!(
      "asked for {} questions, got {}",
      count,
      gen.questions.len()
    )));
  }
  gen
    .questions
    .into_iter()
    .take(count)
    .enumerate()
    .map(|(i, q)| {
      if q.options.len() != OPTIONS_PER_QUESTION || q.correct_answer >= q.options.len() {
        return Err(GenerationError::Malformed(format!("question {} has invalid options", i + 1)));
      }
      Ok(Question {
        id: (i + 1).to_string(),
        question: q.question,
        options: q.options,
        correct_answer: q.correct_answer,
        explanation: q.explanation,
      })
    })
    .collect()
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
  fn name(&self) -> &'static str { "openai" }

  async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError> {
    let kind = request.kind();
    let result = match request {
      GenerationRequest::Quiz { source_text, question_count } =>
        self.quiz(&source_text, question_count).await.map(GenerationOutput::Quiz),
      GenerationRequest::TutorReply { message, history } =>
        self.tutor(&message, &history).await.map(GenerationOutput::TutorReply),
      GenerationRequest::Summary { text } =>
        self.summary(&text).await.map(GenerationOutput::Summary),
    };
    if let Err(e) = &result {
      error!(target: "study_companion", kind, error = %e, "OpenAI generation failed");
    }
    result
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: &'static str, content: String }
impl ChatMessageReq {
  fn system(c: &str) -> Self { Self { role: "system", content: c.into() } }
  fn user(c: &str) -> Self { Self { role: "user", content: c.into() } }
  fn assistant(c: &str) -> Self { Self { role: "assistant", content: c.into() } }
}
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
