//! Async operations over an injected [`DocumentStore`].
//!
//! Every operation takes the acting [`Employee`] (already authenticated by
//! the caller) and enforces role checks before reading or writing. Rule
//! evaluation is delegated to the pure modules; this layer only loads
//! snapshots, persists results and logs.

pub mod employees;
pub mod kpi;
pub mod kra;
pub mod payroll;

use crate::{
  Error, Result,
  employee::Employee,
  kra::KraTemplate,
  record::{Record, fetch, fetch_all},
  role::Role,
  store::{DocumentStore, Query},
};

/// Resolve the caller's account. Blocked accounts are refused.
pub async fn authenticate<S: DocumentStore>(
  store: &S,
  employee_id: &str,
) -> Result<Employee> {
  let employee = load_employee(store, employee_id).await?;
  employee.ensure_active()?;
  Ok(employee)
}

pub(crate) async fn load_employee<S: DocumentStore>(
  store: &S,
  id: &str,
) -> Result<Employee> {
  fetch(store, id)
    .await?
    .ok_or_else(|| Error::EmployeeNotFound(id.to_owned()))
}

/// The whole template library, ordered by title.
pub(crate) async fn load_library<S: DocumentStore>(
  store: &S,
) -> Result<Vec<KraTemplate>> {
  let query = Query::new(KraTemplate::COLLECTION).order_by("title", false);
  fetch_all(store, &query).await
}

/// Fail unless `actor` is `employee_id` or a manager.
pub(crate) fn ensure_can_view(actor: &Employee, employee_id: &str) -> Result<()> {
  if actor.can_view(employee_id) {
    return Ok(());
  }
  Err(Error::Forbidden { required: Role::Hr, actual: actor.role })
}
