//! Conversions between store values and the plain-text SQLite columns.
//!
//! Timestamps are RFC 3339 strings and bodies are compact JSON text.

use chrono::{DateTime, Utc};
use hrdesk_core::store::StoredDocument;
use rusqlite::types::Type;
use serde_json::Value;

use crate::Result;

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_body(data: &Value) -> String { data.to_string() }

/// Parse a body inside a connection closure, where errors must be rusqlite's.
pub fn decode_body(text: &str) -> rusqlite::Result<Value> {
  serde_json::from_str(text)
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// A `documents` row before JSON decoding.
pub struct RawDocument {
  pub doc_id: String,
  pub data:   String,
}

impl RawDocument {
  /// Read from a row selected as `doc_id, data`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { doc_id: row.get(0)?, data: row.get(1)? })
  }

  pub fn into_document(self) -> Result<StoredDocument> {
    Ok(StoredDocument {
      id:   self.doc_id,
      data: serde_json::from_str(&self.data)?,
    })
  }
}
