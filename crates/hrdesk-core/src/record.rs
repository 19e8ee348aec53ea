//! Typed records on top of the untyped [`DocumentStore`].
//!
//! A record's `id` is the document id. It is stripped from the stored body
//! and re-injected on read, so bodies never disagree with their key. Record
//! types deny unknown fields, which makes [`decode`] the schema boundary.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
  Error, Result,
  store::{Collection, DocumentStore, Query, StoredDocument},
};

/// A schema type persisted in one [`Collection`].
pub trait Record: Serialize + DeserializeOwned {
  const COLLECTION: Collection;

  fn id(&self) -> &str;
}

/// Serialise a record into a stored body (without its `id`).
pub fn encode<T: Record>(record: &T) -> Result<Value> {
  let mut value = serde_json::to_value(record)?;
  if let Some(obj) = value.as_object_mut() {
    obj.remove("id");
  }
  Ok(value)
}

/// Deserialise a stored document, rejecting unknown shapes.
pub fn decode<T: Record>(doc: StoredDocument) -> Result<T> {
  let StoredDocument { id, mut data } = doc;
  if let Some(obj) = data.as_object_mut() {
    obj.insert("id".to_owned(), Value::String(id));
  }
  Ok(serde_json::from_value(data)?)
}

pub async fn fetch<T, S>(store: &S, id: &str) -> Result<Option<T>>
where
  T: Record,
  S: DocumentStore,
{
  store
    .get(T::COLLECTION, id)
    .await
    .map_err(Error::store)?
    .map(decode)
    .transpose()
}

pub async fn fetch_all<T, S>(store: &S, query: &Query) -> Result<Vec<T>>
where
  T: Record,
  S: DocumentStore,
{
  debug_assert_eq!(query.collection, T::COLLECTION);
  store
    .query(query)
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(decode)
    .collect()
}

/// Persist `record` at its own id, replacing any previous body.
pub async fn put<T, S>(store: &S, record: &T) -> Result<()>
where
  T: Record,
  S: DocumentStore,
{
  store
    .set(T::COLLECTION, record.id().to_owned(), encode(record)?)
    .await
    .map_err(Error::store)
}

/// Insert a record body under a fresh store-generated id and return the id.
pub async fn insert<T, S>(store: &S, record: &T) -> Result<String>
where
  T: Record,
  S: DocumentStore,
{
  store
    .add(T::COLLECTION, encode(record)?)
    .await
    .map_err(Error::store)
}
