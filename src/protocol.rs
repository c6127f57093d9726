//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ChatMessage, Question, SummaryListItem, SummaryStats, User};
use crate::quiz::{QuizPhase, QuizScore, QuizSession, DEFAULT_QUESTION_COUNT};
use crate::summary::SummaryStatsView;

/// Wire value of an unanswered slot.
pub const UNANSWERED: i64 = -1;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartQuiz {
        #[serde(default)]
        title: String,
        text: String,
        #[serde(rename = "numQuestions", default = "default_question_count")]
        num_questions: usize,
        /// Quiz and task id; cancel with `POST /api/v1/tasks/{requestId}/cancel`.
        #[serde(rename = "requestId", default)]
        request_id: Option<Uuid>,
    },
    SelectAnswer {
        #[serde(rename = "optionIndex")]
        option_index: usize,
    },
    NextQuestion,
    PreviousQuestion,
    ResetQuiz,
    TutorMessage {
        text: String,
        #[serde(rename = "requestId", default)]
        request_id: Option<Uuid>,
    },
    ClearChat,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Quiz { quiz: QuizView },
    Results { results: ResultsOut },
    Idle,
    TutorReply { reply: ChatMessage },
    ChatCleared { messages: Vec<ChatMessage> },
    Error { message: String },
}

fn default_question_count() -> usize {
    DEFAULT_QUESTION_COUNT
}

/// Current question as shown while answering: no correct answer, no explanation.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
}

/// DTO used by both WS and HTTP for an active quiz.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub quiz_id: Uuid,
    pub title: String,
    pub state: QuizPhase,
    pub position: usize,
    pub total: usize,
    /// Present while in progress.
    pub question: Option<QuestionOut>,
    pub selected_answers: Vec<i64>,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub is_last: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    #[serde(flatten)]
    pub question: Question,
    pub selected_answer: i64,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsOut {
    pub quiz_id: Uuid,
    pub title: String,
    pub score: QuizScore,
    pub review: Vec<ReviewItem>,
}

fn wire_answer(a: Option<usize>) -> i64 {
    a.map(|i| i as i64).unwrap_or(UNANSWERED)
}

/// Convert a session (internal) to the public quiz view.
pub fn quiz_view(quiz_id: Uuid, s: &QuizSession) -> QuizView {
    let question = (!s.is_submitted()).then(|| {
        let q = s.current_question();
        QuestionOut { id: q.id.clone(), question: q.question.clone(), options: q.options.clone() }
    });
    QuizView {
        quiz_id,
        title: s.title().to_string(),
        state: s.phase(),
        position: s.position(),
        total: s.len(),
        question,
        selected_answers: s.selected_answers().iter().copied().map(wire_answer).collect(),
        can_advance: s.can_advance(),
        can_retreat: s.can_retreat(),
        is_last: s.is_last(),
    }
}

/// Score and per-question review; only available once submitted.
pub fn results(quiz_id: Uuid, s: &QuizSession) -> Option<ResultsOut> {
    if !s.is_submitted() {
        return None;
    }
    let review = s
        .questions()
        .iter()
        .zip(s.selected_answers())
        .enumerate()
        .map(|(i, (q, sel))| ReviewItem {
            question: q.clone(),
            selected_answer: wire_answer(*sel),
            is_correct: s.is_correct(i),
        })
        .collect();
    Some(ResultsOut { quiz_id, title: s.title().to_string(), score: s.score(), review })
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCreateIn {
    #[serde(default)]
    pub title: String,
    pub text: String,
    #[serde(default = "default_question_count")]
    pub num_questions: usize,
    /// Lets the client cancel the generation through `/api/v1/tasks/{id}/cancel`.
    #[serde(default)]
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIn {
    pub option_index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleOut {
    pub quiz_id: Uuid,
    pub state: QuizPhase,
}

#[derive(Debug, Serialize)]
pub struct CancelOut {
    pub cancelled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorIn {
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    pub text: String,
    #[serde(default)]
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorOut {
    pub conversation_id: Uuid,
    pub message: ChatMessage,
    pub reply: ChatMessage,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptOut {
    pub conversation_id: Uuid,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct DemoOut {
    pub text: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoSummaryIn {
    pub text: String,
    #[serde(default)]
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DemoSummaryOut {
    pub summary: String,
    pub stats: SummaryStatsView,
}

#[derive(Deserialize)]
pub struct LoginIn {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginIn {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct SummariesQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Tags arrive as the comma-separated string typed by the user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSummaryIn {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub summary_type: Option<String>,
    #[serde(default)]
    pub tags: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummaryIn {
    pub title: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOut {
    pub user: User,
    pub recent_summaries: Option<Vec<SummaryListItem>>,
    pub stats: Option<SummaryStats>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct OkOut {
    pub success: bool,
}
