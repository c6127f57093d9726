//! Summary form validation and the demo-summary statistics.

use serde::Serialize;

use crate::api::{NewSummary, SummaryUpdate};
use crate::domain::SummaryType;
use crate::error::ValidationError;
use crate::util::{compression_percent, parse_tags, word_count};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MIN_TEXT_CHARS: usize = 10;
pub const MAX_TEXT_CHARS: usize = 50_000;

/// Build the create-summary request from raw form values.
pub fn validate_new_summary(
  title: &str,
  text: &str,
  summary_type: Option<&str>,
  tags: &str,
) -> Result<NewSummary, ValidationError> {
  let title = validate_title(title)?;

  let text = text.trim();
  let chars = text.chars().count();
  if chars < MIN_TEXT_CHARS {
    return Err(ValidationError::TextTooShort { min: MIN_TEXT_CHARS });
  }
  if chars > MAX_TEXT_CHARS {
    return Err(ValidationError::TextTooLong { max: MAX_TEXT_CHARS });
  }

  let summary_type = match summary_type.map(str::trim).filter(|s| !s.is_empty()) {
    None => SummaryType::default(),
    Some(s) => SummaryType::parse(s).ok_or_else(|| ValidationError::SummaryType(s.to_string()))?,
  };

  Ok(NewSummary {
    title,
    text: text.to_string(),
    summary_type,
    tags: parse_tags(tags),
  })
}

pub fn validate_update(title: &str, tags: &str, is_public: bool) -> Result<SummaryUpdate, ValidationError> {
  Ok(SummaryUpdate { title: validate_title(title)?, tags: parse_tags(tags), is_public })
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
  let title = title.trim();
  if title.is_empty() {
    return Err(ValidationError::TitleRequired);
  }
  if title.chars().count() > MAX_TITLE_CHARS {
    return Err(ValidationError::TitleTooLong { max: MAX_TITLE_CHARS });
  }
  Ok(title.to_string())
}

/// Word statistics shown next to a generated summary.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatsView {
  pub original_words: usize,
  pub summary_words: usize,
  pub compression_percent: i64,
}

pub fn summary_stats(original: &str, summary: &str) -> SummaryStatsView {
  let original_words = word_count(original);
  let summary_words = word_count(summary);
  SummaryStatsView {
    original_words,
    summary_words,
    compression_percent: compression_percent(original_words, summary_words),
  }
}
