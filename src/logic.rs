//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Quiz generation and the HTTP quiz store (answer, navigate, results, reset)
//!   - Tutor turns (scripted or model-backed, apology on failure)
//!   - Demo summary with word statistics
//!   - Sign-in/out and the summary/dashboard calls to the remote API

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::Credentials;
use crate::api::SummaryPage;
use crate::domain::{ChatMessage, Summary, SummaryStats};
use crate::error::{AppError, ValidationError};
use crate::generator::GenerationRequest;
use crate::protocol::*;
use crate::quiz::{QuizRequest, QuizSession, Step};
use crate::seeds::DEMO_TEXT;
use crate::state::AppState;
use crate::summary::{summary_stats, validate_new_summary, validate_update};
use crate::tutor::Conversation;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const DASHBOARD_RECENT_LIMIT: u32 = 5;

// -------- Quiz --------

/// Validate, generate questions, and start a fresh session.
#[instrument(level = "info", skip(state, title, text), fields(text_len = text.len()))]
pub async fn generate_quiz(
  state: &AppState,
  task_id: Uuid,
  title: &str,
  text: &str,
  question_count: usize,
) -> Result<QuizSession, AppError> {
  let request = QuizRequest::new(title, text, question_count)?;
  let questions = state
    .generate(
      task_id,
      GenerationRequest::Quiz { source_text: request.source_text.clone(), question_count },
    )
    .await?
    .into_questions()?;
  let session = QuizSession::start(&request, questions)?;
  info!(target: "quiz", %task_id, questions = session.len(), "Quiz generated");
  Ok(session)
}

/// Generate and store a quiz. A supplied request id doubles as the quiz id,
/// so it must not name a quiz that already exists.
pub async fn start_quiz(state: &AppState, body: QuizCreateIn) -> Result<QuizView, AppError> {
  let quiz_id = body.request_id.unwrap_or_else(Uuid::new_v4);
  if state.quizzes.contains(quiz_id).await {
    return Err(AppError::Conflict(format!("Quiz {} already exists", quiz_id)));
  }
  let session = generate_quiz(state, quiz_id, &body.title, &body.text, body.num_questions).await?;
  let view = quiz_view(quiz_id, &session);
  if state.quizzes.insert_new(quiz_id, session).await.is_err() {
    return Err(AppError::Conflict(format!("Quiz {} already exists", quiz_id)));
  }
  Ok(view)
}

/// Apply `f` to a stored session under the store's write lock.
async fn with_quiz<R>(
  state: &AppState,
  quiz_id: Uuid,
  f: impl FnOnce(&mut QuizSession) -> Result<R, AppError>,
) -> Result<R, AppError> {
  state
    .quizzes
    .with_mut(quiz_id, f)
    .await
    .unwrap_or_else(|| Err(AppError::NotFound(format!("Quiz {}", quiz_id))))
}

pub async fn get_quiz(state: &AppState, quiz_id: Uuid) -> Result<QuizView, AppError> {
  with_quiz(state, quiz_id, |s| Ok(quiz_view(quiz_id, s))).await
}

#[instrument(level = "debug", skip(state))]
pub async fn select_answer(state: &AppState, quiz_id: Uuid, option_index: usize) -> Result<QuizView, AppError> {
  with_quiz(state, quiz_id, |s| {
    if !s.select_answer(option_index)? {
      return Err(AppError::Conflict("Quiz already submitted".into()));
    }
    Ok(quiz_view(quiz_id, s))
  })
  .await
}

/// Advance; a refused advance (unanswered question) returns the unchanged view.
#[instrument(level = "debug", skip(state))]
pub async fn next_question(state: &AppState, quiz_id: Uuid) -> Result<QuizView, AppError> {
  with_quiz(state, quiz_id, |s| {
    match s.advance() {
      Step::Submitted => {
        let score = s.score();
        info!(target: "quiz", %quiz_id, correct = score.correct_count, total = score.total_count, percentage = score.percentage, "Quiz submitted");
      }
      Step::Moved => debug!(target: "quiz", %quiz_id, position = s.position(), "Advanced"),
      Step::Ignored => debug!(target: "quiz", %quiz_id, "Advance ignored"),
    }
    Ok(quiz_view(quiz_id, s))
  })
  .await
}

#[instrument(level = "debug", skip(state))]
pub async fn previous_question(state: &AppState, quiz_id: Uuid) -> Result<QuizView, AppError> {
  with_quiz(state, quiz_id, |s| {
    s.retreat();
    Ok(quiz_view(quiz_id, s))
  })
  .await
}

pub async fn quiz_results(state: &AppState, quiz_id: Uuid) -> Result<ResultsOut, AppError> {
  with_quiz(state, quiz_id, |s| {
    results(quiz_id, s).ok_or_else(|| AppError::Conflict("Quiz has not been submitted yet".into()))
  })
  .await
}

/// Discard the session. Resetting an unknown id is fine: it is Idle already.
#[instrument(level = "info", skip(state))]
pub async fn reset_quiz(state: &AppState, quiz_id: Uuid) -> IdleOut {
  let removed = state.quizzes.remove(quiz_id).await.is_some();
  debug!(target: "quiz", %quiz_id, removed, "Quiz reset");
  IdleOut { quiz_id, state: crate::quiz::QuizPhase::Idle }
}

pub fn cancel_task(state: &AppState, task_id: Uuid) -> CancelOut {
  CancelOut { cancelled: state.tasks.cancel(task_id) }
}

// -------- Tutor --------

/// Produce the tutor's answer to `text`. Generation failures become the
/// fixed apology instead of an error.
#[instrument(level = "info", skip(state, text, history), fields(text_len = text.len()))]
pub async fn tutor_reply_text(
  state: &AppState,
  task_id: Uuid,
  text: &str,
  history: Vec<ChatMessage>,
) -> Option<String> {
  let request = GenerationRequest::TutorReply { message: text.to_string(), history };
  match state.generate(task_id, request).await.map(|o| o.into_text()) {
    Ok(Ok(reply)) => Some(reply),
    Ok(Err(e)) => {
      warn!(target: "tutor", error = %e, "Tutor generator returned the wrong content");
      None
    }
    Err(e) => {
      warn!(target: "tutor", error = %e, "Tutor reply failed");
      None
    }
  }
}

/// One tutor turn against a locally owned conversation (WebSocket).
pub async fn tutor_turn(
  state: &AppState,
  task_id: Uuid,
  conversation: &mut Conversation,
  text: &str,
) -> Result<ChatMessage, AppError> {
  let history = conversation.messages().to_vec();
  let user_msg = conversation.push_user(text)?;
  let reply = match tutor_reply_text(state, task_id, &user_msg.text, history).await {
    Some(reply) => conversation.push_tutor(&reply),
    None => conversation.push_apology(),
  };
  Ok(reply)
}

fn conversation_not_found(id: Uuid) -> AppError {
  AppError::NotFound(format!("Conversation {}", id))
}

/// One tutor turn against the HTTP conversation store.
pub async fn post_tutor_message(state: &AppState, body: TutorIn) -> Result<TutorOut, AppError> {
  let task_id = body.request_id.unwrap_or_else(Uuid::new_v4);
  let record_user = |conversation: &mut Conversation| {
    let history = conversation.messages().to_vec();
    conversation.push_user(&body.text).map(|message| (message, history))
  };
  let (conversation_id, (message, history)) = match body.conversation_id {
    Some(id) => {
      let turn = state.conversations.with_mut(id, record_user).await.ok_or_else(|| conversation_not_found(id))??;
      (id, turn)
    }
    None => {
      let id = Uuid::new_v4();
      let mut conversation = Conversation::new();
      let turn = record_user(&mut conversation)?;
      state.conversations.insert(id, conversation).await;
      (id, turn)
    }
  };

  // The lock is not held while the reply is generated.
  let reply_text = tutor_reply_text(state, task_id, &message.text, history).await;

  let reply = state
    .conversations
    .with_mut(conversation_id, |conversation| match reply_text {
      Some(text) => conversation.push_tutor(&text),
      None => conversation.push_apology(),
    })
    .await
    .ok_or_else(|| conversation_not_found(conversation_id))?;
  Ok(TutorOut { conversation_id, message, reply })
}

pub async fn get_transcript(state: &AppState, conversation_id: Uuid) -> Result<TranscriptOut, AppError> {
  let messages = state
    .conversations
    .with_mut(conversation_id, |c| c.messages().to_vec())
    .await
    .ok_or_else(|| conversation_not_found(conversation_id))?;
  Ok(TranscriptOut { conversation_id, messages })
}

/// Back to the greeting. Unknown ids are not created.
pub async fn clear_conversation(state: &AppState, conversation_id: Uuid) -> Result<TranscriptOut, AppError> {
  let messages = state
    .conversations
    .with_mut(conversation_id, |c| {
      c.clear();
      c.messages().to_vec()
    })
    .await
    .ok_or_else(|| conversation_not_found(conversation_id))?;
  Ok(TranscriptOut { conversation_id, messages })
}

// -------- Demo --------

pub fn demo_text() -> DemoOut {
  DemoOut { text: DEMO_TEXT }
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn demo_summary(state: &AppState, body: DemoSummaryIn) -> Result<DemoSummaryOut, AppError> {
  let text = body.text.trim();
  if text.is_empty() {
    return Err(ValidationError::EmptyText.into());
  }
  let task_id = body.request_id.unwrap_or_else(Uuid::new_v4);
  let summary = state
    .generate(task_id, GenerationRequest::Summary { text: text.to_string() })
    .await?
    .into_text()?;
  let stats = summary_stats(text, &summary);
  Ok(DemoSummaryOut { summary, stats })
}

// -------- Auth --------

#[instrument(level = "info", skip(state, body), fields(email_len = body.email.len()))]
pub async fn login(state: &AppState, body: LoginIn) -> Result<SessionOut, AppError> {
  let data = state.api.login(body.email.trim(), &body.password).await?;
  let user = data.user.clone();
  state.auth.sign_in(Credentials { token: data.token, user: data.user }).await;
  Ok(SessionOut { user })
}

#[instrument(level = "info", skip_all)]
pub async fn google_login(state: &AppState, body: GoogleLoginIn) -> Result<SessionOut, AppError> {
  let data = state.api.google_login(&body.id_token).await?;
  let user = data.user.clone();
  state.auth.sign_in(Credentials { token: data.token, user: data.user }).await;
  Ok(SessionOut { user })
}

pub async fn logout(state: &AppState) -> OkOut {
  state.auth.clear().await;
  OkOut { success: true }
}

pub async fn me(state: &AppState) -> Result<SessionOut, AppError> {
  let creds = state.auth.require().await?;
  Ok(SessionOut { user: creds.user })
}

// -------- Summaries --------

pub async fn list_summaries(state: &AppState, q: SummariesQuery) -> Result<SummaryPage, AppError> {
  let creds = state.auth.require().await?;
  let page = q.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
  let limit = q.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_LIMIT);
  Ok(state.api.list_summaries(&creds.token, page, limit).await?)
}

/// Search; a blank query lists the first page instead.
pub async fn search_summaries(state: &AppState, q: SearchQuery) -> Result<SummaryPage, AppError> {
  let query = q.q.trim();
  if query.is_empty() {
    return list_summaries(state, SummariesQuery { page: None, limit: None }).await;
  }
  let creds = state.auth.require().await?;
  Ok(state.api.search_summaries(&creds.token, query).await?)
}

pub async fn get_summary(state: &AppState, id: &str) -> Result<Summary, AppError> {
  let creds = state.auth.require().await?;
  Ok(state.api.get_summary(&creds.token, id).await?)
}

pub async fn create_summary(state: &AppState, body: CreateSummaryIn) -> Result<Summary, AppError> {
  let creds = state.auth.require().await?;
  let new = validate_new_summary(&body.title, &body.text, body.summary_type.as_deref(), &body.tags)?;
  let created = state.api.create_summary(&creds.token, &new).await?;
  info!(target: "summaries", id = %created.id, "Summary created");
  Ok(created)
}

pub async fn update_summary(state: &AppState, id: &str, body: UpdateSummaryIn) -> Result<Summary, AppError> {
  let creds = state.auth.require().await?;
  let update = validate_update(&body.title, &body.tags, body.is_public)?;
  Ok(state.api.update_summary(&creds.token, id, &update).await?)
}

pub async fn delete_summary(state: &AppState, id: &str) -> Result<OkOut, AppError> {
  let creds = state.auth.require().await?;
  state.api.delete_summary(&creds.token, id).await?;
  info!(target: "summaries", %id, "Summary deleted");
  Ok(OkOut { success: true })
}

pub async fn summary_stats_remote(state: &AppState) -> Result<SummaryStats, AppError> {
  let creds = state.auth.require().await?;
  Ok(state.api.stats(&creds.token).await?)
}

/// Recent summaries and stats fetched concurrently; a failing half is left out.
#[instrument(level = "info", skip(state))]
pub async fn dashboard(state: &AppState) -> Result<DashboardOut, AppError> {
  let creds = state.auth.require().await?;
  let (recent, stats) = tokio::join!(
    state.api.list_summaries(&creds.token, DEFAULT_PAGE, DASHBOARD_RECENT_LIMIT),
    state.api.stats(&creds.token),
  );
  let recent_summaries = recent
    .map(|p| p.summaries)
    .map_err(|e| warn!(target: "summaries", error = %e, "Dashboard: recent summaries unavailable"))
    .ok();
  let stats = stats
    .map_err(|e| warn!(target: "summaries", error = %e, "Dashboard: stats unavailable"))
    .ok();
  Ok(DashboardOut { user: creds.user, recent_summaries, stats })
}
