//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.
//!
//! A connection owns one quiz and one tutor conversation; both are dropped
//! with the socket.
//!
//! Messages are handled one at a time. A `start_quiz` or `tutor_message`
//! carrying a `requestId` can be cancelled meanwhile through
//! `POST /api/v1/tasks/{requestId}/cancel`; the quiz also takes that id.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};
use uuid::Uuid;

use crate::error::AppError;
use crate::protocol::{quiz_view, results, ClientWsMessage, ServerWsMessage};
use crate::logic::*;
use crate::quiz::{Quiz, QuizSession, Step};
use crate::state::AppState;
use crate::tutor::Conversation;
use crate::util::trunc_for_log;

/// Per-connection state.
struct Connection {
  quiz_id: Uuid,
  quiz: Quiz,
  conversation: Conversation,
}

impl Connection {
  fn new() -> Self {
    Self { quiz_id: Uuid::new_v4(), quiz: Quiz::default(), conversation: Conversation::new() }
  }

  fn session_mut(&mut self) -> Result<&mut QuizSession, AppError> {
    self.quiz.session_mut().ok_or_else(|| AppError::Conflict("No quiz in progress".into()))
  }

  /// Quiz view while answering, results once submitted.
  fn quiz_reply(&self) -> ServerWsMessage {
    match self.quiz.session() {
      Some(s) => match results(self.quiz_id, s) {
        Some(r) => ServerWsMessage::Results { results: r },
        None => ServerWsMessage::Quiz { quiz: quiz_view(self.quiz_id, s) },
      },
      None => ServerWsMessage::Idle,
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "study_companion", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "study_companion", "WebSocket connected");
  let mut conn = Connection::new();
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "study_companion", raw = %trunc_for_log(&txt, 120), "WS received");
            handle_client_ws(incoming, &state, &mut conn)
              .await
              .unwrap_or_else(|e| ServerWsMessage::Error { message: e.user_message() })
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "study_companion", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "study_companion", "WebSocket disconnected");
}

#[instrument(level = "info", skip_all)]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  conn: &mut Connection,
) -> Result<ServerWsMessage, AppError> {
  if matches!(msg, ClientWsMessage::Ping) {
    return Ok(ServerWsMessage::Pong);
  }
  state.auth.require().await?;

  match msg {
    ClientWsMessage::Ping => Ok(ServerWsMessage::Pong),

    ClientWsMessage::StartQuiz { title, text, num_questions, request_id } => {
      let quiz_id = request_id.unwrap_or_else(Uuid::new_v4);
      let session = generate_quiz(state, quiz_id, &title, &text, num_questions).await?;
      conn.quiz_id = quiz_id;
      conn.quiz.begin(session);
      info!(target: "quiz", %quiz_id, "WS quiz started");
      Ok(conn.quiz_reply())
    }

    ClientWsMessage::SelectAnswer { option_index } => {
      if !conn.session_mut()?.select_answer(option_index)? {
        return Err(AppError::Conflict("Quiz already submitted".into()));
      }
      Ok(conn.quiz_reply())
    }

    ClientWsMessage::NextQuestion => {
      let session = conn.session_mut()?;
      if session.advance() == Step::Submitted {
        let score = session.score();
        info!(target: "quiz", quiz_id = %conn.quiz_id, correct = score.correct_count, total = score.total_count, percentage = score.percentage, "WS quiz submitted");
      }
      Ok(conn.quiz_reply())
    }

    ClientWsMessage::PreviousQuestion => {
      conn.session_mut()?.retreat();
      Ok(conn.quiz_reply())
    }

    ClientWsMessage::ResetQuiz => {
      let from = conn.quiz.phase();
      conn.quiz.reset();
      debug!(target: "quiz", quiz_id = %conn.quiz_id, ?from, "WS quiz reset");
      Ok(ServerWsMessage::Idle)
    }

    ClientWsMessage::TutorMessage { text, request_id } => {
      let task_id = request_id.unwrap_or_else(Uuid::new_v4);
      let reply = tutor_turn(state, task_id, &mut conn.conversation, &text).await?;
      Ok(ServerWsMessage::TutorReply { reply })
    }

    ClientWsMessage::ClearChat => {
      conn.conversation.clear();
      Ok(ServerWsMessage::ChatCleared { messages: conn.conversation.messages().to_vec() })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::auth::Credentials;
  use crate::config::AppConfig;
  use crate::domain::User;
  use crate::generator::StubGenerator;

  async fn signed_in_state() -> AppState {
    let state = AppState::with_generators(AppConfig::default(), None, Arc::new(StubGenerator::instant())).unwrap();
    state
      .auth
      .sign_in(Credentials { token: "t".into(), user: User { id: "u".into(), name: String::new(), email: String::new(), picture: None } })
      .await;
    state
  }

  fn start_msg() -> ClientWsMessage {
    ClientWsMessage::StartQuiz {
      title: "ML".into(),
      text: "Machine learning learns patterns from data.".into(),
      num_questions: 3,
      request_id: None,
    }
  }

  #[tokio::test]
  async fn ping_needs_no_sign_in_but_quiz_does() {
    let state = AppState::with_generators(AppConfig::default(), None, Arc::new(StubGenerator::instant())).unwrap();
    let mut conn = Connection::new();
    assert!(matches!(handle_client_ws(ClientWsMessage::Ping, &state, &mut conn).await, Ok(ServerWsMessage::Pong)));
    assert!(matches!(handle_client_ws(start_msg(), &state, &mut conn).await, Err(AppError::Unauthorized)));
  }

  #[tokio::test]
  async fn quiz_runs_to_results_over_one_connection() {
    let state = signed_in_state().await;
    let mut conn = Connection::new();

    assert!(matches!(
      handle_client_ws(ClientWsMessage::NextQuestion, &state, &mut conn).await,
      Err(AppError::Conflict(_))
    ));

    let reply = handle_client_ws(start_msg(), &state, &mut conn).await.unwrap();
    assert!(matches!(reply, ServerWsMessage::Quiz { ref quiz } if quiz.total == 3));

    let mut last = ServerWsMessage::Idle;
    for _ in 0..3 {
      handle_client_ws(ClientWsMessage::SelectAnswer { option_index: 0 }, &state, &mut conn).await.unwrap();
      last = handle_client_ws(ClientWsMessage::NextQuestion, &state, &mut conn).await.unwrap();
    }
    match last {
      ServerWsMessage::Results { results } => assert_eq!(results.score.total_count, 3),
      other => panic!("expected results, got {other:?}"),
    }

    let reply = handle_client_ws(ClientWsMessage::ResetQuiz, &state, &mut conn).await.unwrap();
    assert!(matches!(reply, ServerWsMessage::Idle));
    assert!(conn.quiz.session().is_none());
  }

  #[tokio::test]
  async fn tutor_messages_accumulate_until_cleared() {
    let state = signed_in_state().await;
    let mut conn = Connection::new();
    let reply = handle_client_ws(ClientWsMessage::TutorMessage { text: "hello".into(), request_id: None }, &state, &mut conn)
      .await
      .unwrap();
    assert!(matches!(reply, ServerWsMessage::TutorReply { ref reply } if !reply.is_user));
    assert_eq!(conn.conversation.messages().len(), 3);

    match handle_client_ws(ClientWsMessage::ClearChat, &state, &mut conn).await.unwrap() {
      ServerWsMessage::ChatCleared { messages } => assert_eq!(messages.len(), 1),
      other => panic!("expected chat_cleared, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn request_id_names_the_quiz() {
    let state = signed_in_state().await;
    let mut conn = Connection::new();
    let id = Uuid::new_v4();
    let msg: ClientWsMessage = serde_json::from_value(serde_json::json!({
      "type": "start_quiz",
      "title": "ML",
      "text": "Machine learning learns patterns from data.",
      "numQuestions": 3,
      "requestId": id,
    }))
    .unwrap();
    match handle_client_ws(msg, &state, &mut conn).await.unwrap() {
      ServerWsMessage::Quiz { quiz } => assert_eq!(quiz.quiz_id, id),
      other => panic!("expected quiz, got {other:?}"),
    }
    assert_eq!(conn.quiz_id, id);
  }

  #[tokio::test(start_paused = true)]
  async fn quiz_generation_is_cancellable_by_request_id() {
    let state = AppState::with_generators(
      AppConfig::default(),
      None,
      Arc::new(StubGenerator::new(crate::config::Delays { quiz_ms: 60_000, tutor_ms: 0, summary_ms: 0 })),
    )
    .unwrap();
    state
      .auth
      .sign_in(Credentials { token: "t".into(), user: User { id: "u".into(), name: String::new(), email: String::new(), picture: None } })
      .await;
    let mut conn = Connection::new();
    let id = Uuid::new_v4();
    let msg = ClientWsMessage::StartQuiz {
      title: "ML".into(),
      text: "Machine learning learns patterns from data.".into(),
      num_questions: 3,
      request_id: Some(id),
    };

    let cancel = async {
      while state.tasks.is_empty() {
        tokio::task::yield_now().await;
      }
      state.tasks.cancel(id)
    };
    let (reply, cancelled) = tokio::join!(handle_client_ws(msg, &state, &mut conn), cancel);
    assert!(cancelled);
    assert!(matches!(reply, Err(AppError::Task(crate::task::TaskError::Cancelled))));
    assert!(conn.quiz.session().is_none());
  }
}
