//! Client for the remote summaries/auth API.
//!
//! Every endpoint answers with `{success, message?, data?}`. The HTTP status
//! decides the error kind (401, 404, anything else); the envelope only
//! supplies the message, with a per-operation default when the body is not
//! an envelope. Transport failures collapse into one generic network error.
//! Caller-supplied ids are always encoded as a single path segment. Requests
//! are not retried.

use std::time::Duration;

use reqwest::{header::AUTHORIZATION, Method, StatusCode, Url};
use serde::{
  de::{DeserializeOwned, IgnoredAny},
  Deserialize, Serialize,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::{Pagination, Summary, SummaryListItem, SummaryStats, SummaryType, User};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
  #[error("Network error. Please try again.")]
  Network(#[from] reqwest::Error),
  #[error("{0}")]
  Rejected(String),
  #[error("{0}")]
  Unauthorized(String),
  #[error("{0}")]
  NotFound(String),
  #[error("Unexpected response from server: {0}")]
  Malformed(String),
  #[error("Invalid API base URL: {0}")]
  BaseUrl(String),
}

#[derive(Deserialize)]
struct Envelope<T> {
  #[serde(default)]
  success: bool,
  #[serde(default)]
  message: Option<String>,
  data: Option<T>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoginData {
  pub token: String,
  pub user: User,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct SummaryPage {
  #[serde(default)]
  pub summaries: Vec<SummaryListItem>,
  #[serde(default)]
  pub pagination: Pagination,
}

#[derive(Deserialize)]
struct SummaryData {
  summary: Summary,
}

#[derive(Deserialize)]
struct StatsData {
  stats: SummaryStats,
}

/// Body of `POST /api/summaries`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewSummary {
  pub title: String,
  pub text: String,
  pub summary_type: SummaryType,
  pub tags: Vec<String>,
}

/// Body of `PUT /api/summaries/{id}`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryUpdate {
  pub title: String,
  pub tags: Vec<String>,
  pub is_public: bool,
}

#[derive(Clone)]
pub struct StudyApi {
  client: reqwest::Client,
  base_url: Url,
}

const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

impl StudyApi {
  pub fn new(base_url: &str) -> Result<Self, ApiError> {
    let parsed = Url::parse(base_url.trim_end_matches('/'))
      .map_err(|e| ApiError::BaseUrl(format!("{}: {}", base_url, e)))?;
    if parsed.cannot_be_a_base() {
      return Err(ApiError::BaseUrl(base_url.to_string()));
    }
    let client = reqwest::Client::builder()
      .user_agent("study-companion/0.1")
      .timeout(Duration::from_secs(20))
      .build()?;
    Ok(Self { client, base_url: parsed })
  }

  pub fn base_url(&self) -> &str { self.base_url.as_str() }

  /// Base URL extended by `segments`, each percent-encoded as a single path segment.
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    // `new` rejects cannot-be-a-base URLs, so this always succeeds.
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  /// `/api/summaries/{id}`; ids that cannot name a record are not sent at all.
  fn summary_url(&self, id: &str) -> Result<Url, ApiError> {
    match id.trim() {
      "" | "." | ".." => Err(ApiError::NotFound("Summary not found".into())),
      _ => Ok(self.endpoint(&["api", "summaries", id])),
    }
  }

  async fn call<T, B>(
    &self,
    method: Method,
    url: Url,
    token: Option<&str>,
    body: Option<&B>,
    fallback: &str,
  ) -> Result<Option<T>, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let path = url.path().to_string();
    let mut req = self.client.request(method.clone(), url);
    if let Some(token) = token {
      req = req.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(body) = body {
      req = req.json(body);
    }

    let res = req.send().await.map_err(|e| {
      warn!(target: "summaries", %method, %path, error = %e, "Remote API unreachable");
      ApiError::Network(e)
    })?;
    let status = res.status();
    let raw = res.bytes().await?;
    debug!(target: "summaries", %method, %path, %status, bytes = raw.len(), "Remote API replied");

    if !status.is_success() {
      // Error bodies are only read for a message; they need not be an envelope.
      let message = serde_json::from_slice::<Envelope<IgnoredAny>>(&raw).ok().and_then(|e| e.message);
      return Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message.unwrap_or_else(|| SESSION_EXPIRED.to_string())),
        StatusCode::NOT_FOUND => ApiError::NotFound(message.unwrap_or_else(|| fallback.to_string())),
        _ => ApiError::Rejected(message.unwrap_or_else(|| fallback.to_string())),
      });
    }

    let envelope: Envelope<T> =
      serde_json::from_slice(&raw).map_err(|e| ApiError::Malformed(format!("{}: {}", path, e)))?;
    if envelope.success {
      return Ok(envelope.data);
    }
    Err(ApiError::Rejected(envelope.message.unwrap_or_else(|| fallback.to_string())))
  }

  async fn call_data<T, B>(
    &self,
    method: Method,
    url: Url,
    token: Option<&str>,
    body: Option<&B>,
    fallback: &str,
  ) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let path = url.path().to_string();
    self
      .call(method, url, token, body, fallback)
      .await?
      .ok_or_else(|| ApiError::Malformed(format!("{} returned no data", path)))
  }

  #[instrument(level = "info", skip(self, password), fields(email_len = email.len()))]
  pub async fn login(&self, email: &str, password: &str) -> Result<LoginData, ApiError> {
    let body = serde_json::json!({ "email": email, "password": password });
    let url = self.endpoint(&["api", "auth", "login"]);
    self.call_data(Method::POST, url, None, Some(&body), "Login failed").await
  }

  #[instrument(level = "info", skip_all)]
  pub async fn google_login(&self, id_token: &str) -> Result<LoginData, ApiError> {
    let body = serde_json::json!({ "idToken": id_token });
    let url = self.endpoint(&["api", "auth", "google"]);
    self.call_data(Method::POST, url, None, Some(&body), "Google login failed").await
  }

  #[instrument(level = "info", skip(self, token))]
  pub async fn list_summaries(&self, token: &str, page: u32, limit: u32) -> Result<SummaryPage, ApiError> {
    let mut url = self.endpoint(&["api", "summaries"]);
    url
      .query_pairs_mut()
      .append_pair("page", &page.to_string())
      .append_pair("limit", &limit.to_string());
    self.call_data::<_, ()>(Method::GET, url, Some(token), None, "Failed to fetch summaries").await
  }

  #[instrument(level = "info", skip(self, token, query), fields(query_len = query.len()))]
  pub async fn search_summaries(&self, token: &str, query: &str) -> Result<SummaryPage, ApiError> {
    let mut url = self.endpoint(&["api", "summaries", "search"]);
    url.query_pairs_mut().append_pair("q", query);
    self.call_data::<_, ()>(Method::GET, url, Some(token), None, "Search failed").await
  }

  #[instrument(level = "info", skip(self, token))]
  pub async fn get_summary(&self, token: &str, id: &str) -> Result<Summary, ApiError> {
    let url = self.summary_url(id)?;
    let data: SummaryData =
      self.call_data::<_, ()>(Method::GET, url, Some(token), None, "Failed to fetch summary").await?;
    Ok(data.summary)
  }

  #[instrument(level = "info", skip(self, token, summary), fields(title_len = summary.title.len(), text_len = summary.text.len()))]
  pub async fn create_summary(&self, token: &str, summary: &NewSummary) -> Result<Summary, ApiError> {
    let url = self.endpoint(&["api", "summaries"]);
    let data: SummaryData = self
      .call_data(Method::POST, url, Some(token), Some(summary), "Failed to create summary")
      .await?;
    Ok(data.summary)
  }

  #[instrument(level = "info", skip(self, token, update))]
  pub async fn update_summary(&self, token: &str, id: &str, update: &SummaryUpdate) -> Result<Summary, ApiError> {
    let url = self.summary_url(id)?;
    let data: SummaryData = self
      .call_data(Method::PUT, url, Some(token), Some(update), "Failed to update summary")
      .await?;
    Ok(data.summary)
  }

  #[instrument(level = "info", skip(self, token))]
  pub async fn delete_summary(&self, token: &str, id: &str) -> Result<(), ApiError> {
    let url = self.summary_url(id)?;
    self
      .call::<IgnoredAny, ()>(Method::DELETE, url, Some(token), None, "Failed to delete summary")
      .await?;
    Ok(())
  }

  #[instrument(level = "info", skip(self, token))]
  pub async fn stats(&self, token: &str) -> Result<SummaryStats, ApiError> {
    let url = self.endpoint(&["api", "summaries", "stats"]);
    let data: StatsData = self
      .call_data::<_, ()>(Method::GET, url, Some(token), None, "Failed to fetch stats")
      .await?;
    Ok(data.stats)
  }
}
