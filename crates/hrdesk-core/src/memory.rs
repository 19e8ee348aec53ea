//! A process-local [`DocumentStore`] for tests and demos.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
  },
};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::store::{
  ChangeEvent, ChangeKind, Collection, DocumentStore, Query, StoredDocument,
  Subscribe, WriteOp, merge_patch,
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("document {collection}/{id} not found")]
  NotFound { collection: Collection, id: String },

  #[error("store unavailable")]
  Unavailable,

  #[error("store lock poisoned")]
  Poisoned,
}

type Documents = HashMap<(Collection, String), Value>;

/// An in-memory document store.
///
/// Cloning is cheap; clones share the same documents and change feed.
#[derive(Clone)]
pub struct MemoryStore {
  docs:        Arc<Mutex<Documents>>,
  changes:     broadcast::Sender<ChangeEvent>,
  unavailable: Arc<AtomicBool>,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl MemoryStore {
  pub fn new() -> Self {
    let (changes, _) = broadcast::channel(256);
    Self {
      docs: Arc::new(Mutex::new(HashMap::new())),
      changes,
      unavailable: Arc::new(AtomicBool::new(false)),
    }
  }

  /// Make every subsequent call fail with [`MemoryError::Unavailable`],
  /// simulating a backend outage.
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  fn lock(&self) -> Result<MutexGuard<'_, Documents>, MemoryError> {
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(MemoryError::Unavailable);
    }
    self.docs.lock().map_err(|_| MemoryError::Poisoned)
  }

  fn publish(&self, events: Vec<ChangeEvent>) {
    for event in events {
      // No receivers is not an error.
      let _ = self.changes.send(event);
    }
  }
}

/// Apply one op to `docs`, returning the change it caused.
fn apply_op(docs: &mut Documents, op: WriteOp) -> Result<ChangeEvent, MemoryError> {
  match op {
    WriteOp::Set { collection, id, data } => {
      let kind = match docs.insert((collection, id.clone()), data) {
        Some(_) => ChangeKind::Modified,
        None => ChangeKind::Added,
      };
      Ok(ChangeEvent { collection, id, kind })
    }
    WriteOp::Update { collection, id, patch } => {
      let doc = docs
        .get_mut(&(collection, id.clone()))
        .ok_or_else(|| MemoryError::NotFound { collection, id: id.clone() })?;
      merge_patch(doc, patch);
      Ok(ChangeEvent { collection, id, kind: ChangeKind::Modified })
    }
    WriteOp::Delete { collection, id } => {
      docs.remove(&(collection, id.clone()));
      Ok(ChangeEvent { collection, id, kind: ChangeKind::Removed })
    }
  }
}

impl Subscribe for MemoryStore {
  fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
    self.changes.subscribe()
  }
}

impl DocumentStore for MemoryStore {
  type Error = MemoryError;

  async fn get(
    &self,
    collection: Collection,
    id: &str,
  ) -> Result<Option<StoredDocument>, MemoryError> {
    let docs = self.lock()?;
    Ok(
      docs
        .get(&(collection, id.to_owned()))
        .map(|data| StoredDocument { id: id.to_owned(), data: data.clone() }),
    )
  }

  async fn query(&self, query: &Query) -> Result<Vec<StoredDocument>, MemoryError> {
    let snapshot: Vec<StoredDocument> = {
      let docs = self.lock()?;
      docs
        .iter()
        .filter(|((c, _), _)| *c == query.collection)
        .map(|((_, id), data)| StoredDocument { id: id.clone(), data: data.clone() })
        .collect()
    };
    Ok(query.apply(snapshot))
  }

  async fn add(&self, collection: Collection, data: Value) -> Result<String, MemoryError> {
    let id = Uuid::new_v4().to_string();
    let event = {
      let mut docs = self.lock()?;
      apply_op(&mut docs, WriteOp::Set { collection, id: id.clone(), data })?
    };
    self.publish(vec![event]);
    Ok(id)
  }

  async fn set(
    &self,
    collection: Collection,
    id: String,
    data: Value,
  ) -> Result<(), MemoryError> {
    self.batch_write(vec![WriteOp::Set { collection, id, data }]).await
  }

  async fn update(
    &self,
    collection: Collection,
    id: String,
    patch: Value,
  ) -> Result<(), MemoryError> {
    self.batch_write(vec![WriteOp::Update { collection, id, patch }]).await
  }

  async fn delete(&self, collection: Collection, id: String) -> Result<(), MemoryError> {
    self.batch_write(vec![WriteOp::Delete { collection, id }]).await
  }

  async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<(), MemoryError> {
    let events = {
      let mut docs = self.lock()?;
      // Stage on a copy so a failing op leaves the live map untouched.
      let mut staged = docs.clone();
      let events = ops
        .into_iter()
        .map(|op| apply_op(&mut staged, op))
        .collect::<Result<Vec<_>, _>>()?;
      *docs = staged;
      events
    };
    self.publish(events);
    Ok(())
  }
}
