//! The `DocumentStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (`hrdesk-store-sqlite`, and
//! [`crate::memory::MemoryStore`] for tests). Services receive a store as an
//! explicit argument; nothing in this crate holds a global client.

use std::{cmp::Ordering, future::Future};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};
use tokio::sync::broadcast;

// ─── Collections ─────────────────────────────────────────────────────────────

/// The named document collections used by hrdesk.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
  Users,
  KraTemplates,
  KpiRecords,
  Payroll,
}

impl Collection {
  /// The snake_case name, also used as the SQLite `collection` column value.
  pub fn as_str(self) -> &'static str { self.into() }
}

/// A document as held by a store: its id plus a JSON object body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
  pub id:   String,
  pub data: Value,
}

// ─── Query types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
  /// Field value equals one of the elements of an array operand.
  In,
  /// Field is an array containing the operand.
  ArrayContains,
}

/// One `(field, op, value)` predicate. `field` may be a dotted path
/// (`"breakdown.net_pay"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
  pub field: String,
  pub op:    FilterOp,
  pub value: Value,
}

impl Filter {
  pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
    Self { field: field.into(), op, value: value.into() }
  }

  pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
    Self::new(field, FilterOp::Eq, value)
  }

  /// Evaluate against a document body. A missing field matches nothing.
  pub fn matches(&self, data: &Value) -> bool {
    let Some(field) = lookup(data, &self.field) else {
      return false;
    };
    match self.op {
      FilterOp::Eq => json_eq(field, &self.value),
      FilterOp::Ne => !json_eq(field, &self.value),
      FilterOp::Lt => compare(field, &self.value) == Some(Ordering::Less),
      FilterOp::Le => matches!(
        compare(field, &self.value),
        Some(Ordering::Less | Ordering::Equal)
      ),
      FilterOp::Gt => compare(field, &self.value) == Some(Ordering::Greater),
      FilterOp::Ge => matches!(
        compare(field, &self.value),
        Some(Ordering::Greater | Ordering::Equal)
      ),
      FilterOp::In => self
        .value
        .as_array()
        .is_some_and(|xs| xs.iter().any(|x| json_eq(field, x))),
      FilterOp::ArrayContains => field
        .as_array()
        .is_some_and(|xs| xs.iter().any(|x| json_eq(x, &self.value))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
  pub field:      String,
  #[serde(default)]
  pub descending: bool,
}

/// Parameters for [`DocumentStore::query`].
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
  pub collection: Collection,
  pub filters:    Vec<Filter>,
  pub order_by:   Option<OrderBy>,
  pub limit:      Option<usize>,
}

impl Query {
  pub fn new(collection: Collection) -> Self {
    Self { collection, filters: Vec::new(), order_by: None, limit: None }
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filters.push(filter);
    self
  }

  pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
    self.order_by = Some(OrderBy { field: field.into(), descending });
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  /// Filter, order and truncate an unordered snapshot of the collection.
  ///
  /// Backends that cannot push predicates down call this on the raw rows, so
  /// every backend applies identical semantics.
  pub fn apply(&self, docs: Vec<StoredDocument>) -> Vec<StoredDocument> {
    let mut out: Vec<StoredDocument> = docs
      .into_iter()
      .filter(|d| self.filters.iter().all(|f| f.matches(&d.data)))
      .collect();

    match &self.order_by {
      Some(order) => out.sort_by(|a, b| {
        let ord = match (lookup(&a.data, &order.field), lookup(&b.data, &order.field)) {
          (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
          (Some(_), None) => Ordering::Less,
          (None, Some(_)) => Ordering::Greater,
          (None, None) => Ordering::Equal,
        };
        let ord = if order.descending { ord.reverse() } else { ord };
        ord.then_with(|| a.id.cmp(&b.id))
      }),
      None => out.sort_by(|a, b| a.id.cmp(&b.id)),
    }

    if let Some(limit) = self.limit {
      out.truncate(limit);
    }
    out
  }
}

fn lookup<'v>(data: &'v Value, path: &str) -> Option<&'v Value> {
  path
    .split('.')
    .try_fold(data, |v, key| v.as_object()?.get(key))
}

fn json_eq(a: &Value, b: &Value) -> bool {
  match (a.as_f64(), b.as_f64()) {
    (Some(x), Some(y)) => x == y,
    _ => a == b,
  }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
  match (a, b) {
    (Value::Number(_), Value::Number(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
    (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
    _ => None,
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// One element of an atomic [`DocumentStore::batch_write`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
  Set {
    collection: Collection,
    id:         String,
    data:       Value,
  },
  Update {
    collection: Collection,
    id:         String,
    patch:      Value,
  },
  Delete { collection: Collection, id: String },
}

/// Shallow-merge the top-level keys of `patch` into `target`.
pub fn merge_patch(target: &mut Value, patch: Value) {
  match (target, patch) {
    (Value::Object(obj), Value::Object(fields)) => {
      for (k, v) in fields {
        obj.insert(k, v);
      }
    }
    (target, other) => *target = other,
  }
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
  Added,
  Modified,
  Removed,
}

/// Published once per document after a write commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub collection: Collection,
  pub id:         String,
  pub kind:       ChangeKind,
}

/// Optional push capability. Consumers re-run their query on each event;
/// computation never depends on how snapshots arrive.
pub trait Subscribe {
  fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a document-collection backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch one document. Returns `None` if absent.
  fn get<'a>(
    &'a self,
    collection: Collection,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<StoredDocument>, Self::Error>> + Send + 'a;

  /// Run a filtered, optionally ordered query over one collection.
  fn query<'a>(
    &'a self,
    query: &'a Query,
  ) -> impl Future<Output = Result<Vec<StoredDocument>, Self::Error>> + Send + 'a;

  /// Insert a document under a store-generated id and return the id.
  fn add(
    &self,
    collection: Collection,
    data: Value,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  /// Create or replace the document at `id`.
  fn set(
    &self,
    collection: Collection,
    id: String,
    data: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Shallow-merge `patch` into an existing document. Errors if absent.
  fn update(
    &self,
    collection: Collection,
    id: String,
    patch: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a document. Deleting an absent document succeeds.
  fn delete(
    &self,
    collection: Collection,
    id: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Apply every op or none of them.
  fn batch_write(
    &self,
    ops: Vec<WriteOp>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
