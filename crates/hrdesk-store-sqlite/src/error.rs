//! Error type for `hrdesk-store-sqlite`.

use hrdesk_core::store::Collection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// An update named a document that does not exist. The batch containing it
  /// was rolled back.
  #[error("document not found: {collection}/{id}")]
  NotFound { collection: Collection, id: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
