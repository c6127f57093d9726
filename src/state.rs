//! Application state: quiz/tutor stores, the auth session, the remote API
//! client and the content generators.
//!
//! This module owns:
//!   - quiz sessions by quiz id (absent = Idle)
//!   - tutor conversations by conversation id
//!   - the auth session provider
//!   - the optional model-backed generator plus the canned stub
//!   - the registry of in-flight generation tasks
//!
//! Generation goes to the model-backed generator when one is configured and
//! falls back to the stub on failure or timeout. Cancellation is final.
//!
//! Stored quizzes and conversations expire after `session_idle_secs` without
//! use; `spawn_session_sweeper` runs the eviction in the background.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::api::{ApiError, StudyApi};
use crate::auth::AuthSession;
use crate::config::AppConfig;
use crate::generator::{ContentGenerator, GenerationOutput, GenerationRequest, StubGenerator};
use crate::openai::OpenAiGenerator;
use crate::quiz::QuizSession;
use crate::store::SessionStore;
use crate::task::{GenerationTask, TaskError, TaskRegistry};
use crate::tutor::Conversation;

pub struct AppState {
    pub config: AppConfig,
    pub quizzes: SessionStore<QuizSession>,
    pub conversations: SessionStore<Conversation>,
    pub auth: AuthSession,
    pub api: StudyApi,
    pub generator: Option<Arc<dyn ContentGenerator>>,
    pub stub: Arc<dyn ContentGenerator>,
    pub tasks: TaskRegistry,
}

impl AppState {
    /// Build state from config: remote API client, auth session, generators.
    #[instrument(level = "info", skip_all)]
    pub async fn new(config: AppConfig) -> Result<Self, ApiError> {
        let generator = OpenAiGenerator::from_env(config.prompts.clone());
        let generator: Option<Arc<dyn ContentGenerator>> = match generator {
            Some(oa) => {
                info!(target: "study_companion", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
                Some(Arc::new(oa))
            }
            None => {
                info!(target: "study_companion", "OpenAI disabled (no OPENAI_API_KEY). Using canned content.");
                None
            }
        };
        let stub = Arc::new(StubGenerator::new(config.delays.clone()));

        let state = Self::with_generators(config, generator, stub)?;
        state.auth.load().await;
        Ok(state)
    }

    /// State with explicit generators; nothing is read from the environment.
    pub fn with_generators(
        config: AppConfig,
        generator: Option<Arc<dyn ContentGenerator>>,
        stub: Arc<dyn ContentGenerator>,
    ) -> Result<Self, ApiError> {
        let api = StudyApi::new(&config.api_base_url)?;
        info!(target: "study_companion", api_base_url = %api.base_url(), "Remote API configured");
        let idle = Duration::from_secs(config.session_idle_secs);
        Ok(Self {
            auth: AuthSession::new(config.session_file.clone()),
            quizzes: SessionStore::new("quizzes", idle, config.max_sessions),
            conversations: SessionStore::new("conversations", idle, config.max_sessions),
            config,
            api,
            generator,
            stub,
            tasks: TaskRegistry::default(),
        })
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.config.generation_timeout_ms)
    }

    /// Evict idle quizzes and conversations. Returns how many were dropped.
    pub async fn evict_idle_sessions(&self) -> usize {
        self.quizzes.sweep().await + self.conversations.sweep().await
    }

    /// Run one generation request as a cancellable task registered under `task_id`.
    #[instrument(level = "info", skip(self, task_id, request), fields(%task_id, kind = request.kind()))]
    pub async fn generate(
        &self,
        task_id: Uuid,
        request: GenerationRequest,
    ) -> Result<GenerationOutput, TaskError> {
        if let Some(primary) = &self.generator {
            match self.run(task_id, primary.clone(), request.clone()).await {
                Ok(out) => return Ok(out),
                Err(e @ (TaskError::Cancelled | TaskError::AlreadyRunning(_))) => return Err(e),
                Err(e) => {
                    error!(target: "study_companion", generator = primary.name(), error = %e, "Generation failed; using canned content.");
                }
            }
        }
        self.run(task_id, self.stub.clone(), request).await
    }

    async fn run(
        &self,
        task_id: Uuid,
        generator: Arc<dyn ContentGenerator>,
        request: GenerationRequest,
    ) -> Result<GenerationOutput, TaskError> {
        let name = generator.name();
        let task = GenerationTask::spawn(task_id, async move { generator.generate(request).await });
        let _registration = self.tasks.register(task_id, task.abort_handle())?;
        let result = task.join(Some(self.generation_timeout())).await;
        if let Err(e) = &result {
            warn!(target: "study_companion", %task_id, generator = name, error = %e, "Generation task did not complete");
        }
        result
    }
}

/// Sweep idle sessions every `every` until the state is dropped.
pub fn spawn_session_sweeper(state: &Arc<AppState>, every: Duration) -> JoinHandle<()> {
    let weak: Weak<AppState> = Arc::downgrade(state);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(state) = weak.upgrade() else { break };
            let evicted = state.evict_idle_sessions().await;
            if evicted > 0 {
                info!(target: "study_companion", evicted, "Idle sessions swept");
            }
        }
        debug!(target: "study_companion", "Session sweeper stopped");
    })
}
