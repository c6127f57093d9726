//! Quiz lifecycle: `Idle` → `InProgress` → `Reviewing`, and back to `Idle` on reset.
//!
//! A `QuizSession` is a fixed list of questions plus one answer slot per
//! question, the current position and the submitted flag. All transitions are
//! synchronous; the only failure reported here is `ValidationError`.
//! Refused transitions (advancing without an answer, retreating from the first
//! question, touching a submitted quiz) leave the session untouched.

use serde::Serialize;

use crate::domain::Question;
use crate::error::ValidationError;

pub const ALLOWED_QUESTION_COUNTS: [usize; 4] = [3, 5, 10, 15];
pub const DEFAULT_QUESTION_COUNT: usize = 5;
/// Minimum trimmed length (in characters) of the study material.
pub const MIN_SOURCE_CHARS: usize = 10;

/// Validated input to quiz generation.
#[derive(Clone, Debug)]
pub struct QuizRequest {
  pub title: String,
  pub source_text: String,
  pub question_count: usize,
}

impl QuizRequest {
  pub fn new(title: &str, source_text: &str, question_count: usize) -> Result<Self, ValidationError> {
    let source = source_text.trim();
    if source.chars().count() < MIN_SOURCE_CHARS {
      return Err(ValidationError::SourceTooShort { min: MIN_SOURCE_CHARS });
    }
    if !ALLOWED_QUESTION_COUNTS.contains(&question_count) {
      return Err(ValidationError::QuestionCount(question_count));
    }
    Ok(Self {
      title: title.trim().to_string(),
      source_text: source.to_string(),
      question_count,
    })
  }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
  Idle,
  InProgress,
  Reviewing,
}

/// Outcome of `advance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
  Moved,
  Submitted,
  Ignored,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
  pub correct_count: usize,
  pub total_count: usize,
  pub percentage: u8,
}

/// Integer percentage of `part / whole`, rounded half up.
pub fn percentage(part: usize, whole: usize) -> u8 {
  if whole == 0 {
    return 0;
  }
  let pct = (part * 200 + whole) / (whole * 2);
  pct.min(100) as u8
}

#[derive(Clone, Debug)]
pub struct QuizSession {
  title: String,
  questions: Vec<Question>,
  selected: Vec<Option<usize>>,
  position: usize,
  submitted: bool,
}

impl QuizSession {
  /// Start a session from generated questions. The generator must honor the
  /// requested count and produce well-formed questions.
  pub fn start(request: &QuizRequest, questions: Vec<Question>) -> Result<Self, ValidationError> {
    if questions.len() != request.question_count {
      return Err(ValidationError::MalformedQuiz(format!(
        "expected {} questions, got {}",
        request.question_count,
        questions.len()
      )));
    }
    if let Some(bad) = questions.iter().find(|q| !q.is_well_formed()) {
      return Err(ValidationError::MalformedQuiz(format!(
        "question '{}' has an invalid correct answer",
        bad.id
      )));
    }
    let mut ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    ids.sort_unstable();
    if ids.windows(2).any(|w| w[0] == w[1]) {
      return Err(ValidationError::MalformedQuiz("duplicate question id".into()));
    }

    let selected = vec![None; questions.len()];
    Ok(Self {
      title: request.title.clone(),
      questions,
      selected,
      position: 0,
      submitted: false,
    })
  }

  pub fn title(&self) -> &str { &self.title }
  pub fn questions(&self) -> &[Question] { &self.questions }
  pub fn selected_answers(&self) -> &[Option<usize>] { &self.selected }
  pub fn position(&self) -> usize { self.position }
  pub fn len(&self) -> usize { self.questions.len() }
  pub fn is_empty(&self) -> bool { self.questions.is_empty() }
  pub fn is_submitted(&self) -> bool { self.submitted }

  pub fn phase(&self) -> QuizPhase {
    if self.submitted { QuizPhase::Reviewing } else { QuizPhase::InProgress }
  }

  pub fn current_question(&self) -> &Question {
    &self.questions[self.position]
  }

  pub fn current_answer(&self) -> Option<usize> {
    self.selected[self.position]
  }

  pub fn is_last(&self) -> bool {
    self.position + 1 == self.questions.len()
  }

  /// Record a choice for the current question, overwriting any earlier one.
  /// Returns `Ok(false)` once the quiz has been submitted.
  pub fn select_answer(&mut self, option_index: usize) -> Result<bool, ValidationError> {
    if self.submitted {
      return Ok(false);
    }
    let len = self.current_question().options.len();
    if option_index >= len {
      return Err(ValidationError::OptionOutOfRange { index: option_index, len });
    }
    self.selected[self.position] = Some(option_index);
    Ok(true)
  }

  pub fn can_advance(&self) -> bool {
    !self.submitted && self.current_answer().is_some()
  }

  pub fn can_retreat(&self) -> bool {
    !self.submitted && self.position > 0
  }

  /// Move forward, or submit from the last question. Requires an answer.
  pub fn advance(&mut self) -> Step {
    if !self.can_advance() {
      return Step::Ignored;
    }
    if self.is_last() {
      self.submitted = true;
      Step::Submitted
    } else {
      self.position += 1;
      Step::Moved
    }
  }

  pub fn retreat(&mut self) -> bool {
    if !self.can_retreat() {
      return false;
    }
    self.position -= 1;
    true
  }

  pub fn is_correct(&self, index: usize) -> bool {
    match (self.selected.get(index), self.questions.get(index)) {
      (Some(Some(sel)), Some(q)) => *sel == q.correct_answer,
      _ => false,
    }
  }

  /// Score over all questions. Meaningful at any time; clients only see it in review.
  pub fn score(&self) -> QuizScore {
    let correct_count = (0..self.questions.len()).filter(|&i| self.is_correct(i)).count();
    let total_count = self.questions.len();
    QuizScore { correct_count, total_count, percentage: percentage(correct_count, total_count) }
  }
}

/// The quiz slot owned by one driver (a WebSocket connection, or one entry of
/// the HTTP store).
#[derive(Clone, Debug, Default)]
pub enum Quiz {
  #[default]
  Idle,
  Active(QuizSession),
}

impl Quiz {
  pub fn phase(&self) -> QuizPhase {
    match self {
      Quiz::Idle => QuizPhase::Idle,
      Quiz::Active(s) => s.phase(),
    }
  }

  /// Replace whatever was here with a freshly generated session.
  pub fn begin(&mut self, session: QuizSession) {
    *self = Quiz::Active(session);
  }

  pub fn session(&self) -> Option<&QuizSession> {
    match self {
      Quiz::Idle => None,
      Quiz::Active(s) => Some(s),
    }
  }

  pub fn session_mut(&mut self) -> Option<&mut QuizSession> {
    match self {
      Quiz::Idle => None,
      Quiz::Active(s) => Some(s),
    }
  }

  /// Drop the session entirely, whatever state it was in.
  pub fn reset(&mut self) {
    *self = Quiz::Idle;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn q(id: usize, correct: usize) -> Question {
    Question {
      id: id.to_string(),
      question: format!("Question {id}"),
      options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
      correct_answer: correct,
      explanation: String::new(),
    }
  }

  fn session(correct: &[usize]) -> QuizSession {
    let req = QuizRequest {
      title: "ML".into(),
      source_text: "Machine learning is a subset of AI.".into(),
      question_count: correct.len(),
    };
    let questions = correct.iter().enumerate().map(|(i, c)| q(i + 1, *c)).collect();
    QuizSession::start(&req, questions).unwrap()
  }

  fn answer_all(s: &mut QuizSession, answers: &[usize]) {
    for (i, a) in answers.iter().enumerate() {
      assert!(s.select_answer(*a).unwrap());
      let step = s.advance();
      if i + 1 == answers.len() {
        assert_eq!(step, Step::Submitted);
      } else {
        assert_eq!(step, Step::Moved);
      }
    }
  }

  #[test]
  fn request_rejects_short_material() {
    assert_eq!(
      QuizRequest::new("", "   short   ", 5).unwrap_err(),
      ValidationError::SourceTooShort { min: MIN_SOURCE_CHARS }
    );
    assert!(QuizRequest::new("", "  0123456789  ", 5).is_ok());
  }

  #[test]
  fn request_counts_characters_not_bytes() {
    // nine multi-byte characters
    assert!(QuizRequest::new("", "ééééééééé", 3).is_err());
    assert!(QuizRequest::new("", "éééééééééé", 3).is_ok());
  }

  #[test]
  fn request_rejects_unlisted_counts() {
    for n in [0, 1, 4, 20] {
      assert_eq!(
        QuizRequest::new("", "plenty of study material", n).unwrap_err(),
        ValidationError::QuestionCount(n)
      );
    }
  }

  #[test]
  fn start_initializes_unanswered_slots() {
    let s = session(&[1, 3, 0]);
    assert_eq!(s.len(), 3);
    assert_eq!(s.selected_answers(), &[None, None, None]);
    assert_eq!(s.position(), 0);
    assert_eq!(s.phase(), QuizPhase::InProgress);
  }

  #[test]
  fn start_rejects_count_mismatch_and_bad_indices() {
    let req = QuizRequest::new("", "plenty of study material", 3).unwrap();
    assert!(matches!(
      QuizSession::start(&req, vec![q(1, 0), q(2, 0)]),
      Err(ValidationError::MalformedQuiz(_))
    ));
    assert!(matches!(
      QuizSession::start(&req, vec![q(1, 0), q(2, 4), q(3, 0)]),
      Err(ValidationError::MalformedQuiz(_))
    ));
    assert!(matches!(
      QuizSession::start(&req, vec![q(1, 0), q(1, 1), q(3, 0)]),
      Err(ValidationError::MalformedQuiz(_))
    ));
  }

  #[test]
  fn advance_requires_an_answer() {
    let mut s = session(&[0, 0, 0]);
    assert_eq!(s.advance(), Step::Ignored);
    assert_eq!(s.position(), 0);
    s.select_answer(2).unwrap();
    assert_eq!(s.advance(), Step::Moved);
    assert_eq!(s.position(), 1);
    assert_eq!(s.selected_answers().len(), s.len());
  }

  #[test]
  fn advance_from_last_question_submits_without_moving() {
    let mut s = session(&[0, 0, 0]);
    answer_all(&mut s, &[0, 1, 2]);
    assert!(s.is_submitted());
    assert_eq!(s.position(), 2);
    assert_eq!(s.phase(), QuizPhase::Reviewing);
  }

  #[test]
  fn retreat_at_first_question_is_noop() {
    let mut s = session(&[0, 0, 0]);
    assert!(!s.retreat());
    assert_eq!(s.position(), 0);
  }

  #[test]
  fn retreat_ignores_answered_state_and_allows_changes() {
    let mut s = session(&[0, 1, 2]);
    s.select_answer(0).unwrap();
    s.advance();
    assert!(s.retreat());
    assert_eq!(s.position(), 0);
    s.select_answer(3).unwrap();
    assert_eq!(s.selected_answers()[0], Some(3));
  }

  #[test]
  fn reselecting_overwrites_previous_choice() {
    let mut s = session(&[0, 0, 0]);
    s.select_answer(1).unwrap();
    s.select_answer(1).unwrap();
    assert_eq!(s.current_answer(), Some(1));
    s.select_answer(2).unwrap();
    assert_eq!(s.current_answer(), Some(2));
  }

  #[test]
  fn out_of_range_option_is_refused() {
    let mut s = session(&[0, 0, 0]);
    assert_eq!(
      s.select_answer(4).unwrap_err(),
      ValidationError::OptionOutOfRange { index: 4, len: 4 }
    );
    assert_eq!(s.current_answer(), None);
  }

  #[test]
  fn submitted_session_is_read_only() {
    let mut s = session(&[0, 0, 0]);
    answer_all(&mut s, &[0, 0, 0]);
    assert_eq!(s.select_answer(1), Ok(false));
    assert!(!s.retreat());
    assert_eq!(s.advance(), Step::Ignored);
    assert_eq!(s.selected_answers(), &[Some(0), Some(0), Some(0)]);
  }

  #[test]
  fn perfect_and_zero_scores() {
    let mut s = session(&[1, 3, 0]);
    answer_all(&mut s, &[1, 3, 0]);
    assert_eq!(s.score(), QuizScore { correct_count: 3, total_count: 3, percentage: 100 });

    let mut s = session(&[1, 3, 0]);
    answer_all(&mut s, &[0, 0, 1]);
    assert_eq!(s.score(), QuizScore { correct_count: 0, total_count: 3, percentage: 0 });
  }

  #[test]
  fn five_question_example() {
    let mut s = session(&[1, 3, 0, 1, 1]);
    s.select_answer(1).unwrap();
    s.advance();
    s.select_answer(3).unwrap();
    s.advance();
    s.select_answer(0).unwrap();
    s.advance();
    s.select_answer(1).unwrap();
    s.advance();
    s.select_answer(1).unwrap();
    assert_eq!(s.score(), QuizScore { correct_count: 5, total_count: 5, percentage: 100 });

    // change answer[2] to 1 before submitting
    s.retreat();
    s.retreat();
    s.select_answer(1).unwrap();
    assert_eq!(s.score(), QuizScore { correct_count: 4, total_count: 5, percentage: 80 });
    assert!(!s.is_correct(2));
    assert!(s.is_correct(3));
  }

  #[test]
  fn percentage_rounds_half_up() {
    assert_eq!(percentage(1, 3), 33);
    assert_eq!(percentage(2, 3), 67);
    assert_eq!(percentage(1, 8), 13);
    assert_eq!(percentage(7, 15), 47);
    assert_eq!(percentage(0, 0), 0);
  }

  #[test]
  fn reset_returns_to_idle_from_any_state() {
    let mut quiz = Quiz::default();
    assert_eq!(quiz.phase(), QuizPhase::Idle);

    quiz.begin(session(&[0, 0, 0]));
    assert_eq!(quiz.phase(), QuizPhase::InProgress);
    quiz.reset();
    assert!(quiz.session().is_none());

    quiz.begin(session(&[0, 0, 0]));
    if let Some(s) = quiz.session_mut() {
      answer_all(s, &[0, 0, 0]);
    }
    assert_eq!(quiz.phase(), QuizPhase::Reviewing);
    quiz.reset();
    assert_eq!(quiz.phase(), QuizPhase::Idle);
  }
}
