//! Domain models: quiz questions, tutor messages, signed-in user, and the
//! summary records owned by the remote API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of options every generated question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// One multiple-choice question. Immutable once a quiz session starts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: String,
  pub question: String,
  pub options: Vec<String>,
  /// 0-based index into `options`.
  pub correct_answer: usize,
  #[serde(default)]
  pub explanation: String,
}

impl Question {
  pub fn is_well_formed(&self) -> bool {
    !self.options.is_empty() && self.correct_answer < self.options.len()
  }
}

/// A single line in a tutor conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
  pub id: String,
  pub text: String,
  pub is_user: bool,
  pub timestamp: DateTime<Utc>,
}

/// Signed-in user profile as returned by the remote auth API.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  #[serde(default)] pub name: String,
  #[serde(default)] pub email: String,
  #[serde(default)] pub picture: Option<String>,
}

/// Kind of summary the remote API should produce.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
  #[default]
  Summary,
  StudyNotes,
  KeyPoints,
}

impl SummaryType {
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "summary" => Some(SummaryType::Summary),
      "study_notes" => Some(SummaryType::StudyNotes),
      "key_points" => Some(SummaryType::KeyPoints),
      _ => None,
    }
  }
}

/// Summary row as listed by the remote API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryListItem {
  pub id: String,
  pub title: String,
  pub summary_type: SummaryType,
  #[serde(default)] pub tags: Vec<String>,
  #[serde(default)] pub word_count: u64,
  #[serde(default)] pub summary_word_count: u64,
  #[serde(default)] pub compression_ratio: String,
  pub created_at: String,
}

/// Full summary record.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
  pub id: String,
  #[serde(default)] pub user_id: String,
  pub title: String,
  #[serde(default)] pub original_text: String,
  #[serde(default)] pub summary: String,
  pub summary_type: SummaryType,
  #[serde(default)] pub tags: Vec<String>,
  #[serde(default)] pub is_public: bool,
  #[serde(default)] pub word_count: u64,
  #[serde(default)] pub summary_word_count: u64,
  #[serde(default)] pub compression_ratio: String,
  pub created_at: String,
  #[serde(default)] pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
  #[serde(default)] pub total_summaries: u64,
  #[serde(default)] pub total_words: u64,
  #[serde(default)] pub total_summary_words: u64,
  #[serde(default)] pub avg_compression_ratio: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  #[serde(default)] pub page: u32,
  #[serde(default)] pub limit: u32,
  #[serde(default)] pub total: u64,
  #[serde(default)] pub total_pages: u32,
}
