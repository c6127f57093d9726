//! Authentication state provider.
//!
//! `AuthSession` is the single owner of the signed-in credentials (bearer
//! token + user profile). Handlers read them through `require`; only
//! sign-in and logout write them. When a session file is configured the
//! credentials survive restarts: `load` reads it at startup, `sign_in`
//! writes it and `clear` deletes it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::domain::User;
use crate::error::AppError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
  pub token: String,
  pub user: User,
}

#[derive(Default)]
pub struct AuthSession {
  current: RwLock<Option<Credentials>>,
  file: Option<PathBuf>,
}

impl AuthSession {
  pub fn new(file: Option<PathBuf>) -> Self {
    Self { current: RwLock::new(None), file }
  }

  /// Restore credentials from the session file. A missing or unreadable file
  /// leaves the session signed out.
  #[instrument(level = "info", skip(self))]
  pub async fn load(&self) {
    let Some(path) = &self.file else { return };
    let raw = match tokio::fs::read_to_string(path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
      Err(e) => {
        error!(target: "auth", path = %path.display(), error = %e, "Failed to read session file");
        return;
      }
    };
    match serde_json::from_str::<Credentials>(&raw) {
      Ok(creds) => {
        info!(target: "auth", user = %creds.user.id, "Restored signed-in session");
        *self.current.write().await = Some(creds);
      }
      Err(e) => warn!(target: "auth", path = %path.display(), error = %e, "Ignoring corrupt session file"),
    }
  }

  #[instrument(level = "info", skip(self, creds), fields(user = %creds.user.id))]
  pub async fn sign_in(&self, creds: Credentials) {
    if let Some(path) = &self.file {
      match serde_json::to_string(&creds) {
        Ok(json) => {
          if let Err(e) = tokio::fs::write(path, json).await {
            error!(target: "auth", path = %path.display(), error = %e, "Failed to persist session");
          }
        }
        Err(e) => error!(target: "auth", error = %e, "Failed to serialize session"),
      }
    }
    *self.current.write().await = Some(creds);
    info!(target: "auth", "Signed in");
  }

  #[instrument(level = "info", skip(self))]
  pub async fn clear(&self) {
    let had = self.current.write().await.take().is_some();
    if let Some(path) = &self.file {
      if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
          error!(target: "auth", path = %path.display(), error = %e, "Failed to remove session file");
        }
      }
    }
    if had {
      info!(target: "auth", "Signed out");
    }
  }

  pub async fn current(&self) -> Option<Credentials> {
    self.current.read().await.clone()
  }

  pub async fn is_signed_in(&self) -> bool {
    self.current.read().await.is_some()
  }

  /// Credentials of the signed-in user, or `Unauthorized`.
  pub async fn require(&self) -> Result<Credentials, AppError> {
    self.current().await.ok_or(AppError::Unauthorized)
  }
}
