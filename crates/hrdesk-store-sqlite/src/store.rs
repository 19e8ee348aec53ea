//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use chrono::Utc;
use hrdesk_core::store::{
  ChangeEvent, ChangeKind, Collection, DocumentStore, Query, StoredDocument,
  Subscribe, WriteOp, merge_patch,
};
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawDocument, decode_body, encode_body, encode_dt},
  schema::SCHEMA,
};

/// Buffered change events per subscriber before it starts lagging.
const CHANGE_BUFFER: usize = 1024;

// ─── Store ───────────────────────────────────────────────────────────────────

/// An hrdesk document store backed by a single SQLite file.
///
/// Cloning is cheap; clones share the connection and the change feed.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    let (changes, _) = broadcast::channel(CHANGE_BUFFER);
    Ok(Self { conn, changes })
  }

  fn publish(&self, events: Vec<ChangeEvent>) {
    for event in events {
      // No receivers is not an error.
      let _ = self.changes.send(event);
    }
  }
}

/// The outcome of one op inside a transaction: the change it made, or the
/// key of a missing document that aborts the batch.
type OpOutcome = Result<ChangeEvent, (Collection, String)>;

fn exists(
  tx: &rusqlite::Transaction<'_>,
  collection: Collection,
  id: &str,
) -> rusqlite::Result<bool> {
  Ok(
    tx.query_row(
      "SELECT 1 FROM documents WHERE collection = ?1 AND doc_id = ?2",
      rusqlite::params![collection.as_str(), id],
      |_| Ok(()),
    )
    .optional()?
    .is_some(),
  )
}

fn apply_op(
  tx: &rusqlite::Transaction<'_>,
  op: WriteOp,
  now: &str,
) -> rusqlite::Result<OpOutcome> {
  match op {
    WriteOp::Set { collection, id, data } => {
      let kind = if exists(tx, collection, &id)? {
        ChangeKind::Modified
      } else {
        ChangeKind::Added
      };
      tx.execute(
        "INSERT INTO documents (collection, doc_id, data, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT (collection, doc_id)
         DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        rusqlite::params![collection.as_str(), id, encode_body(&data), now],
      )?;
      Ok(Ok(ChangeEvent { collection, id, kind }))
    }

    WriteOp::Update { collection, id, patch } => {
      let current: Option<String> = tx
        .query_row(
          "SELECT data FROM documents WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection.as_str(), id],
          |row| row.get(0),
        )
        .optional()?;
      let Some(current) = current else {
        return Ok(Err((collection, id)));
      };

      let mut data = decode_body(&current)?;
      merge_patch(&mut data, patch);
      tx.execute(
        "UPDATE documents SET data = ?3, updated_at = ?4
         WHERE collection = ?1 AND doc_id = ?2",
        rusqlite::params![collection.as_str(), id, encode_body(&data), now],
      )?;
      Ok(Ok(ChangeEvent { collection, id, kind: ChangeKind::Modified }))
    }

    WriteOp::Delete { collection, id } => {
      tx.execute(
        "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
        rusqlite::params![collection.as_str(), id],
      )?;
      Ok(Ok(ChangeEvent { collection, id, kind: ChangeKind::Removed }))
    }
  }
}

// ─── Subscribe impl ──────────────────────────────────────────────────────────

impl Subscribe for SqliteStore {
  fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
    self.changes.subscribe()
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn get(
    &self,
    collection: Collection,
    id: &str,
  ) -> Result<Option<StoredDocument>> {
    let id = id.to_owned();

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT doc_id, data FROM documents WHERE collection = ?1 AND doc_id = ?2",
              rusqlite::params![collection.as_str(), id],
              RawDocument::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn query(&self, query: &Query) -> Result<Vec<StoredDocument>> {
    let collection = query.collection;

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT doc_id, data FROM documents WHERE collection = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![collection.as_str()], RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let docs = raws
      .into_iter()
      .map(RawDocument::into_document)
      .collect::<Result<Vec<_>>>()?;
    Ok(query.apply(docs))
  }

  async fn add(&self, collection: Collection, data: serde_json::Value) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    self
      .batch_write(vec![WriteOp::Set { collection, id: id.clone(), data }])
      .await?;
    Ok(id)
  }

  async fn set(
    &self,
    collection: Collection,
    id: String,
    data: serde_json::Value,
  ) -> Result<()> {
    self.batch_write(vec![WriteOp::Set { collection, id, data }]).await
  }

  async fn update(
    &self,
    collection: Collection,
    id: String,
    patch: serde_json::Value,
  ) -> Result<()> {
    self.batch_write(vec![WriteOp::Update { collection, id, patch }]).await
  }

  async fn delete(&self, collection: Collection, id: String) -> Result<()> {
    self.batch_write(vec![WriteOp::Delete { collection, id }]).await
  }

  async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<()> {
    let now = encode_dt(Utc::now());
    let count = ops.len();

    let outcome: Result<Vec<ChangeEvent>, (Collection, String)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut events = Vec::with_capacity(ops.len());
        for op in ops {
          match apply_op(&tx, op, &now)? {
            Ok(event) => events.push(event),
            // Dropping `tx` without committing rolls the batch back.
            Err(missing) => return Ok(Err(missing)),
          }
        }
        tx.commit()?;
        Ok(Ok(events))
      })
      .await?;

    let events = outcome.map_err(|(collection, id)| Error::NotFound { collection, id })?;
    debug!(ops = count, "committed batch");
    self.publish(events);
    Ok(())
  }
}
