//! In-memory session stores keyed by uuid, bounded in size and age.
//!
//! Every access touches the entry. `sweep` drops entries idle for longer than
//! the configured limit, and inserting into a full store evicts the entry that
//! was touched least recently.

use std::{collections::HashMap, time::Duration};

use tokio::{sync::RwLock, time::Instant};
use tracing::debug;
use uuid::Uuid;

struct Entry<T> {
  value: T,
  touched: Instant,
}

pub struct SessionStore<T> {
  name: &'static str,
  entries: RwLock<HashMap<Uuid, Entry<T>>>,
  idle_limit: Duration,
  capacity: usize,
}

impl<T> SessionStore<T> {
  pub fn new(name: &'static str, idle_limit: Duration, capacity: usize) -> Self {
    Self { name, entries: RwLock::new(HashMap::new()), idle_limit, capacity: capacity.max(1) }
  }

  /// Insert or replace `id`.
  pub async fn insert(&self, id: Uuid, value: T) {
    let mut entries = self.entries.write().await;
    if !entries.contains_key(&id) {
      self.make_room(&mut entries);
    }
    entries.insert(id, Entry { value, touched: Instant::now() });
  }

  /// Insert only when `id` is free. Returns the value back when it is taken.
  pub async fn insert_new(&self, id: Uuid, value: T) -> Result<(), T> {
    let mut entries = self.entries.write().await;
    if entries.contains_key(&id) {
      return Err(value);
    }
    self.make_room(&mut entries);
    entries.insert(id, Entry { value, touched: Instant::now() });
    Ok(())
  }

  /// Run `f` on the entry under the write lock. None when `id` is absent.
  pub async fn with_mut<R>(&self, id: Uuid, f: impl FnOnce(&mut T) -> R) -> Option<R> {
    let mut entries = self.entries.write().await;
    let entry = entries.get_mut(&id)?;
    entry.touched = Instant::now();
    Some(f(&mut entry.value))
  }

  pub async fn remove(&self, id: Uuid) -> Option<T> {
    self.entries.write().await.remove(&id).map(|e| e.value)
  }

  pub async fn contains(&self, id: Uuid) -> bool {
    self.entries.read().await.contains_key(&id)
  }

  pub async fn len(&self) -> usize {
    self.entries.read().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.entries.read().await.is_empty()
  }

  /// Drop every entry idle for longer than the limit. Returns how many went.
  pub async fn sweep(&self) -> usize {
    let now = Instant::now();
    let mut entries = self.entries.write().await;
    let before = entries.len();
    entries.retain(|_, e| now.duration_since(e.touched) <= self.idle_limit);
    let evicted = before - entries.len();
    if evicted > 0 {
      debug!(target: "study_companion", store = self.name, evicted, remaining = entries.len(), "Idle sessions evicted");
    }
    evicted
  }

  fn make_room(&self, entries: &mut HashMap<Uuid, Entry<T>>) {
    while entries.len() >= self.capacity {
      let Some(oldest) = entries.iter().min_by_key(|(_, e)| e.touched).map(|(id, _)| *id) else {
        return;
      };
      entries.remove(&oldest);
      debug!(target: "study_companion", store = self.name, id = %oldest, "Store full; least recently used session evicted");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn sweep_drops_only_idle_entries() {
    let store = SessionStore::new("test", Duration::from_secs(60), 10);
    let (stale, fresh) = (Uuid::new_v4(), Uuid::new_v4());
    store.insert(stale, 1).await;
    store.insert(fresh, 2).await;

    tokio::time::advance(Duration::from_secs(45)).await;
    assert_eq!(store.with_mut(fresh, |v| *v).await, Some(2));
    tokio::time::advance(Duration::from_secs(30)).await;

    assert_eq!(store.sweep().await, 1);
    assert!(!store.contains(stale).await);
    assert!(store.contains(fresh).await);
  }

  #[tokio::test(start_paused = true)]
  async fn full_store_evicts_least_recently_used() {
    let store = SessionStore::new("test", Duration::from_secs(3600), 2);
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    store.insert(a, "a").await;
    tokio::time::advance(Duration::from_secs(1)).await;
    store.insert(b, "b").await;
    tokio::time::advance(Duration::from_secs(1)).await;
    store.with_mut(a, |_| ()).await;

    store.insert(c, "c").await;
    assert_eq!(store.len().await, 2);
    assert!(store.contains(a).await);
    assert!(!store.contains(b).await);

    // replacing an existing id never evicts
    store.insert(c, "c2").await;
    assert_eq!(store.len().await, 2);
  }

  #[tokio::test]
  async fn insert_new_refuses_taken_id() {
    let store = SessionStore::new("test", Duration::from_secs(60), 4);
    let id = Uuid::new_v4();
    assert_eq!(store.insert_new(id, 1).await, Ok(()));
    assert_eq!(store.insert_new(id, 2).await, Err(2));
    assert_eq!(store.remove(id).await, Some(1));
    assert!(store.is_empty().await);
  }
}
