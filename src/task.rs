//! Cancellable, time-bounded generation tasks.
//!
//! Every call into a `ContentGenerator` runs as a spawned tokio task. The
//! `GenerationTask` handle can abort it, bounds the wait with a timeout, and
//! aborts the task when dropped so an abandoned request never keeps working.
//! `TaskRegistry` lets another request cancel a task by id. An id names at
//! most one running task.

use std::{
  collections::HashMap,
  future::Future,
  sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, MutexGuard,
  },
  time::Duration,
};

use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::generator::GenerationError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
  #[error("Generation was cancelled")]
  Cancelled,
  #[error("Generation timed out after {0:?}")]
  TimedOut(Duration),
  #[error(transparent)]
  Failed(GenerationError),
  #[error("Generation task panicked")]
  Panicked,
  #[error("A generation is already running under request id {0}")]
  AlreadyRunning(Uuid),
}

pub struct GenerationTask<T> {
  id: Uuid,
  handle: JoinHandle<Result<T, GenerationError>>,
}

impl<T: Send + 'static> GenerationTask<T> {
  pub fn spawn<F>(id: Uuid, fut: F) -> Self
  where
    F: Future<Output = Result<T, GenerationError>> + Send + 'static,
  {
    Self { id, handle: tokio::spawn(fut) }
  }

  pub fn abort_handle(&self) -> AbortHandle {
    self.handle.abort_handle()
  }

  /// Wait for the result. With a timeout, the task is aborted once it elapses.
  pub async fn join(mut self, timeout: Option<Duration>) -> Result<T, TaskError> {
    let joined = match timeout {
      Some(limit) => match tokio::time::timeout(limit, &mut self.handle).await {
        Ok(joined) => joined,
        Err(_) => {
          warn!(target: "study_companion", task = %self.id, ?limit, "Generation task timed out");
          self.handle.abort();
          return Err(TaskError::TimedOut(limit));
        }
      },
      None => (&mut self.handle).await,
    };

    match joined {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(e)) => Err(TaskError::Failed(e)),
      Err(e) if e.is_cancelled() => Err(TaskError::Cancelled),
      Err(_) => Err(TaskError::Panicked),
    }
  }
}

impl<T> Drop for GenerationTask<T> {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// In-flight tasks by request id.
#[derive(Default)]
pub struct TaskRegistry {
  running: Mutex<HashMap<Uuid, Running>>,
  tickets: AtomicU64,
}

struct Running {
  ticket: u64,
  handle: AbortHandle,
}

/// Keeps a task listed in the registry until dropped.
pub struct Registration<'a> {
  registry: &'a TaskRegistry,
  id: Uuid,
  ticket: u64,
}

impl Drop for Registration<'_> {
  fn drop(&mut self) {
    let mut running = self.registry.running();
    // After a cancel the id may already belong to a newer task.
    if running.get(&self.id).is_some_and(|r| r.ticket == self.ticket) {
      running.remove(&self.id);
    }
  }
}

impl TaskRegistry {
  fn running(&self) -> MutexGuard<'_, HashMap<Uuid, Running>> {
    self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// List `handle` under `id`. Refused while another task holds the id.
  pub fn register(&self, id: Uuid, handle: AbortHandle) -> Result<Registration<'_>, TaskError> {
    let mut running = self.running();
    if running.contains_key(&id) {
      return Err(TaskError::AlreadyRunning(id));
    }
    let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
    running.insert(id, Running { ticket, handle });
    Ok(Registration { registry: self, id, ticket })
  }

  /// Abort a running task. Returns false when nothing is registered under `id`.
  pub fn cancel(&self, id: Uuid) -> bool {
    match self.running().remove(&id) {
      Some(Running { handle, .. }) => {
        handle.abort();
        debug!(target: "study_companion", task = %id, "Generation task cancelled");
        true
      }
      None => false,
    }
  }

  pub fn len(&self) -> usize {
    self.running().len()
  }

  pub fn is_empty(&self) -> bool {
    self.running().is_empty()
  }
}
