//! Content generation capability.
//!
//! `ContentGenerator` has a single `generate(request)` entry point covering
//! quiz questions, tutor replies and demo summaries. `StubGenerator` is the
//! shipped implementation: canned bank, keyword rules and fixed delays.
//! `crate::openai::OpenAiGenerator` is an optional model-backed one.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Delays;
use crate::domain::{ChatMessage, Question};
use crate::seeds::{canned_questions, tutor_default_reply, DEMO_SUMMARY, TUTOR_RULES};

#[derive(Clone, Debug)]
pub enum GenerationRequest {
  Quiz { source_text: String, question_count: usize },
  TutorReply { message: String, history: Vec<ChatMessage> },
  Summary { text: String },
}

impl GenerationRequest {
  pub fn kind(&self) -> &'static str {
    match self {
      GenerationRequest::Quiz { .. } => "quiz",
      GenerationRequest::TutorReply { .. } => "tutor_reply",
      GenerationRequest::Summary { .. } => "summary",
    }
  }
}

#[derive(Clone, Debug)]
pub enum GenerationOutput {
  Quiz(Vec<Question>),
  TutorReply(String),
  Summary(String),
}

impl GenerationOutput {
  pub fn into_questions(self) -> Result<Vec<Question>, GenerationError> {
    match self {
      GenerationOutput::Quiz(q) => Ok(q),
      other => Err(GenerationError::Mismatch(format!("expected quiz, got {:?}", other.kind()))),
    }
  }

  pub fn into_text(self) -> Result<String, GenerationError> {
    match self {
      GenerationOutput::TutorReply(t) | GenerationOutput::Summary(t) => Ok(t),
      other => Err(GenerationError::Mismatch(format!("expected text, got {:?}", other.kind()))),
    }
  }

  fn kind(&self) -> &'static str {
    match self {
      GenerationOutput::Quiz(_) => "quiz",
      GenerationOutput::TutorReply(_) => "tutor_reply",
      GenerationOutput::Summary(_) => "summary",
    }
  }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenerationError {
  #[error("generator backend failed: {0}")]
  Backend(String),
  #[error("generator returned malformed content: {0}")]
  Malformed(String),
  #[error("generator returned the wrong kind of content: {0}")]
  Mismatch(String),
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
  fn name(&self) -> &'static str;

  async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError>;
}

/// Canned responses returned after fixed simulated delays.
#[derive(Clone, Debug, Default)]
pub struct StubGenerator {
  delays: Delays,
}

impl StubGenerator {
  pub fn new(delays: Delays) -> Self {
    Self { delays }
  }

  /// No simulated latency; handy in tests.
  pub fn instant() -> Self {
    Self { delays: Delays { quiz_ms: 0, tutor_ms: 0, summary_ms: 0 } }
  }

  async fn pause(ms: u64) {
    if ms > 0 {
      tokio::time::sleep(Duration::from_millis(ms)).await;
    }
  }
}

#[async_trait]
impl ContentGenerator for StubGenerator {
  fn name(&self) -> &'static str { "stub" }

  #[instrument(level = "debug", skip_all, fields(kind = request.kind()))]
  async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError> {
    match request {
      GenerationRequest::Quiz { question_count, .. } => {
        Self::pause(self.delays.quiz_ms).await;
        Ok(GenerationOutput::Quiz(canned_questions(question_count)))
      }
      GenerationRequest::TutorReply { message, .. } => {
        Self::pause(self.delays.tutor_ms).await;
        Ok(GenerationOutput::TutorReply(scripted_reply(&message)))
      }
      GenerationRequest::Summary { .. } => {
        Self::pause(self.delays.summary_ms).await;
        Ok(GenerationOutput::Summary(DEMO_SUMMARY.to_string()))
      }
    }
  }
}

/// Keyword-matched tutor reply. Matching is plain substring search on the
/// lower-cased message, so "this" also triggers the greeting rule.
pub fn scripted_reply(message: &str) -> String {
  let input = message.to_lowercase();
  for (keywords, reply) in TUTOR_RULES {
    if keywords.iter().any(|k| input.contains(k)) {
      debug!(target: "tutor", keyword = keywords[0], "Scripted rule matched");
      return (*reply).to_string();
    }
  }
  tutor_default_reply(message)
}
