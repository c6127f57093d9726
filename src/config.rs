//! Configuration: optional TOML file (STUDY_CONFIG_PATH) overlaid with
//! environment variables.
//!
//! See `FileConfig` and `Prompts` for the accepted TOML schema.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Simulated latency of the stub generator, per request kind.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Delays {
  pub quiz_ms: u64,
  pub tutor_ms: u64,
  pub summary_ms: u64,
}

impl Default for Delays {
  fn default() -> Self {
    Self { quiz_ms: 2000, tutor_ms: 1500, summary_ms: 2000 }
  }
}

/// Prompts used by the OpenAI generator. Override them in TOML to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub quiz_system: String,
  pub quiz_user_template: String,
  pub tutor_system: String,
  pub summary_system: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      quiz_system: "You write multiple-choice study quizzes. Respond ONLY with strict JSON.".into(),
      quiz_user_template: "Write {count} questions about the study material below. Return JSON {\"questions\": [{\"question\": string, \"options\": [4 strings], \"correctAnswer\": 0-3, \"explanation\": string}]}.\n\nMaterial:\n{material}".into(),
      tutor_system: "You are a friendly study tutor. Answer in 2-4 sentences and end with a follow-up question.".into(),
      summary_system: "Summarize the study material as short markdown with a title, bullet points and a one-line summary.".into(),
    }
  }
}

/// TOML schema. Every field is optional.
#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
  pub api_base_url: Option<String>,
  pub static_dir: Option<PathBuf>,
  pub session_file: Option<PathBuf>,
  pub generation_timeout_ms: Option<u64>,
  pub session_idle_secs: Option<u64>,
  pub max_sessions: Option<usize>,
  pub delays: Delays,
  pub prompts: Prompts,
}

/// Resolved runtime configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
  pub port: u16,
  pub api_base_url: String,
  pub static_dir: PathBuf,
  pub session_file: Option<PathBuf>,
  pub generation_timeout_ms: u64,
  /// HTTP quizzes and conversations untouched for this long are dropped.
  pub session_idle_secs: u64,
  /// Per-store cap; the least recently used session makes room.
  pub max_sessions: usize,
  pub delays: Delays,
  pub prompts: Prompts,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      port: DEFAULT_PORT,
      api_base_url: DEFAULT_API_BASE_URL.into(),
      static_dir: PathBuf::from("./static"),
      session_file: None,
      generation_timeout_ms: DEFAULT_GENERATION_TIMEOUT_MS,
      session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
      max_sessions: DEFAULT_MAX_SESSIONS,
      delays: Delays::default(),
      prompts: Prompts::default(),
    }
  }
}

impl AppConfig {
  /// Load the TOML file named by STUDY_CONFIG_PATH (if any), then apply env overrides.
  pub fn from_env() -> Self {
    let file = load_file_config_from_env().unwrap_or_default();
    Self::resolve(file, |k| std::env::var(k).ok())
  }

  /// Merge file values and environment lookups over the defaults.
  pub fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
    let defaults = AppConfig::default();
    let port = env("PORT")
      .and_then(|p| p.parse::<u16>().ok())
      .unwrap_or(defaults.port);
    let api_base_url = env("STUDY_API_BASE_URL")
      .or(file.api_base_url)
      .unwrap_or(defaults.api_base_url)
      .trim_end_matches('/')
      .to_string();
    let static_dir = env("STATIC_DIR")
      .map(PathBuf::from)
      .or(file.static_dir)
      .unwrap_or(defaults.static_dir);
    let session_file = env("STUDY_SESSION_FILE").map(PathBuf::from).or(file.session_file);

    Self {
      port,
      api_base_url,
      static_dir,
      session_file,
      generation_timeout_ms: file.generation_timeout_ms.unwrap_or(defaults.generation_timeout_ms),
      session_idle_secs: file.session_idle_secs.unwrap_or(defaults.session_idle_secs),
      max_sessions: file.max_sessions.unwrap_or(defaults.max_sessions),
      delays: file.delays,
      prompts: file.prompts,
    }
  }
}

/// Attempt to load `FileConfig` from STUDY_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_file_config_from_env() -> Option<FileConfig> {
  let path = std::env::var("STUDY_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<FileConfig>(&s) {
      Ok(cfg) => {
        info!(target: "study_companion", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "study_companion", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "study_companion", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
