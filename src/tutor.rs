//! Tutor conversation transcript.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::ChatMessage;
use crate::error::ValidationError;
use crate::seeds::{TUTOR_APOLOGY, TUTOR_GREETING};

#[derive(Clone, Debug)]
pub struct Conversation {
  messages: Vec<ChatMessage>,
}

impl Default for Conversation {
  fn default() -> Self {
    Self::new()
  }
}

impl Conversation {
  /// A fresh conversation holding only the tutor greeting.
  pub fn new() -> Self {
    Self { messages: vec![message("1", TUTOR_GREETING, false)] }
  }

  pub fn messages(&self) -> &[ChatMessage] {
    &self.messages
  }

  /// Append a user message; the text is trimmed and must not be empty.
  pub fn push_user(&mut self, text: &str) -> Result<ChatMessage, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
      return Err(ValidationError::EmptyMessage);
    }
    let m = message(&Uuid::new_v4().to_string(), text, true);
    self.messages.push(m.clone());
    Ok(m)
  }

  pub fn push_tutor(&mut self, text: &str) -> ChatMessage {
    let m = message(&Uuid::new_v4().to_string(), text, false);
    self.messages.push(m.clone());
    m
  }

  /// Reply used when generation fails.
  pub fn push_apology(&mut self) -> ChatMessage {
    self.push_tutor(TUTOR_APOLOGY)
  }

  pub fn clear(&mut self) {
    *self = Self::new();
  }
}

fn message(id: &str, text: &str, is_user: bool) -> ChatMessage {
  ChatMessage { id: id.to_string(), text: text.to_string(), is_user, timestamp: Utc::now() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn starts_with_greeting_and_clears_back_to_it() {
    let mut c = Conversation::new();
    assert_eq!(c.messages().len(), 1);
    assert!(!c.messages()[0].is_user);

    c.push_user("  what is entropy?  ").unwrap();
    c.push_tutor("It measures disorder.");
    assert_eq!(c.messages().len(), 3);
    assert_eq!(c.messages()[1].text, "what is entropy?");

    c.clear();
    assert_eq!(c.messages().len(), 1);
    assert_eq!(c.messages()[0].text, TUTOR_GREETING);
  }

  #[test]
  fn blank_messages_are_rejected() {
    let mut c = Conversation::new();
    assert_eq!(c.push_user("   ").unwrap_err(), ValidationError::EmptyMessage);
    assert_eq!(c.messages().len(), 1);
  }
}
