//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; text inputs are logged by length only.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, Json, response::IntoResponse};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;

type ApiResult<T> = Result<Json<T>, AppError>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

// -------- Auth --------

#[instrument(level = "info", skip_all)]
pub async fn http_login(State(state): State<Arc<AppState>>, Json(body): Json<LoginIn>) -> ApiResult<SessionOut> {
  let out = login(&state, body).await?;
  info!(target: "auth", user = %out.user.id, "Signed in (email)");
  Ok(Json(out))
}

#[instrument(level = "info", skip_all)]
pub async fn http_google_login(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GoogleLoginIn>,
) -> ApiResult<SessionOut> {
  let out = google_login(&state, body).await?;
  info!(target: "auth", user = %out.user.id, "Signed in (identity provider)");
  Ok(Json(out))
}

#[instrument(level = "info", skip_all)]
pub async fn http_logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logout(&state).await)
}

pub async fn http_me(State(state): State<Arc<AppState>>) -> ApiResult<SessionOut> {
  Ok(Json(me(&state).await?))
}

// -------- Quiz --------

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len(), num_questions = body.num_questions))]
pub async fn http_create_quiz(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuizCreateIn>,
) -> ApiResult<QuizView> {
  state.auth.require().await?;
  let view = start_quiz(&state, body).await?;
  info!(target: "quiz", quiz_id = %view.quiz_id, total = view.total, "HTTP quiz started");
  Ok(Json(view))
}

pub async fn http_get_quiz(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<QuizView> {
  state.auth.require().await?;
  Ok(Json(get_quiz(&state, id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_select_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AnswerIn>,
) -> ApiResult<QuizView> {
  state.auth.require().await?;
  Ok(Json(select_answer(&state, id, body.option_index).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_next_question(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<QuizView> {
  state.auth.require().await?;
  Ok(Json(next_question(&state, id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_previous_question(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<QuizView> {
  state.auth.require().await?;
  Ok(Json(previous_question(&state, id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_quiz_results(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<ResultsOut> {
  state.auth.require().await?;
  Ok(Json(quiz_results(&state, id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_reset_quiz(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<IdleOut> {
  state.auth.require().await?;
  Ok(Json(reset_quiz(&state, id).await))
}

#[instrument(level = "info", skip(state))]
pub async fn http_cancel_task(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<CancelOut> {
  state.auth.require().await?;
  let out = cancel_task(&state, id);
  info!(target: "study_companion", task = %id, cancelled = out.cancelled, "HTTP cancel requested");
  Ok(Json(out))
}

// -------- Tutor --------

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_tutor_message(State(state): State<Arc<AppState>>, Json(body): Json<TutorIn>) -> ApiResult<TutorOut> {
  state.auth.require().await?;
  let out = post_tutor_message(&state, body).await?;
  info!(target: "tutor", conversation = %out.conversation_id, "HTTP tutor reply served");
  Ok(Json(out))
}

pub async fn http_get_transcript(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<TranscriptOut> {
  state.auth.require().await?;
  Ok(Json(get_transcript(&state, id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_clear_conversation(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> ApiResult<TranscriptOut> {
  state.auth.require().await?;
  Ok(Json(clear_conversation(&state, id).await?))
}

// -------- Demo --------

pub async fn http_demo_text() -> impl IntoResponse { Json(demo_text()) }

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_demo_summary(
  State(state): State<Arc<AppState>>,
  Json(body): Json<DemoSummaryIn>,
) -> ApiResult<DemoSummaryOut> {
  Ok(Json(demo_summary(&state, body).await?))
}

// -------- Summaries --------

#[instrument(level = "info", skip(state))]
pub async fn http_list_summaries(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SummariesQuery>,
) -> ApiResult<crate::api::SummaryPage> {
  Ok(Json(list_summaries(&state, q).await?))
}

#[instrument(level = "info", skip(state, q), fields(q_len = q.q.len()))]
pub async fn http_search_summaries(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SearchQuery>,
) -> ApiResult<crate::api::SummaryPage> {
  Ok(Json(search_summaries(&state, q).await?))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_create_summary(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CreateSummaryIn>,
) -> ApiResult<crate::domain::Summary> {
  Ok(Json(create_summary(&state, body).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_summary(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<crate::domain::Summary> {
  Ok(Json(get_summary(&state, &id).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_update_summary(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<UpdateSummaryIn>,
) -> ApiResult<crate::domain::Summary> {
  Ok(Json(update_summary(&state, &id, body).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_summary(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<OkOut> {
  Ok(Json(delete_summary(&state, &id).await?))
}

pub async fn http_summary_stats(State(state): State<Arc<AppState>>) -> ApiResult<crate::domain::SummaryStats> {
  Ok(Json(summary_stats_remote(&state).await?))
}

pub async fn http_dashboard(State(state): State<Arc<AppState>>) -> ApiResult<DashboardOut> {
  Ok(Json(dashboard(&state).await?))
}
