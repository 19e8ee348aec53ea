//! Employee provisioning, lookup and blocking.

use serde_json::json;
use tracing::info;

use super::{ensure_can_view, load_employee};
use crate::{
  Error, Result,
  employee::{Employee, NewEmployee},
  record::{Record, fetch_all, insert},
  role::Role,
  store::{DocumentStore, Filter, Query},
};

/// Create an employee account. Admin and above; nobody may grant a role above
/// their own.
pub async fn provision_employee<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  input: NewEmployee,
) -> Result<Employee> {
  actor.role.require(Role::Admin)?;
  if input.role > actor.role {
    return Err(Error::Forbidden { required: input.role, actual: actor.role });
  }
  let employee = create(store, input).await?;
  info!(
    employee_id = %employee.id,
    code = %employee.employee_code,
    role = %employee.role,
    by = %actor.id,
    "provisioned employee"
  );
  Ok(employee)
}

/// Create the first super admin of an empty installation. No actor.
pub async fn bootstrap_admin<S: DocumentStore>(
  store: &S,
  mut input: NewEmployee,
) -> Result<Employee> {
  input.role = Role::SuperAdmin;
  let employee = create(store, input).await?;
  info!(employee_id = %employee.id, "bootstrapped super admin");
  Ok(employee)
}

async fn create<S: DocumentStore>(store: &S, input: NewEmployee) -> Result<Employee> {
  input.validate()?;
  let mut employee = input.into_employee();

  let clash = Query::new(Employee::COLLECTION)
    .filter(Filter::equals("employee_code", employee.employee_code.as_str()))
    .limit(1);
  if !fetch_all::<Employee, _>(store, &clash).await?.is_empty() {
    return Err(Error::DuplicateEmployeeCode(employee.employee_code));
  }

  employee.id = insert(store, &employee).await?;
  Ok(employee)
}

/// Self, or any manager.
pub async fn get_employee<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  id: &str,
) -> Result<Employee> {
  ensure_can_view(actor, id)?;
  load_employee(store, id).await
}

/// All employees ordered by code, optionally within one department. HR and
/// above.
pub async fn list_employees<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  department: Option<&str>,
) -> Result<Vec<Employee>> {
  actor.role.require(Role::Hr)?;
  let mut query = Query::new(Employee::COLLECTION).order_by("employee_code", false);
  if let Some(department) = department {
    query = query.filter(Filter::equals("department", department));
  }
  fetch_all(store, &query).await
}

/// Block or unblock an account. Admin and above, and never an account that
/// outranks the actor.
pub async fn set_blocked<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  id: &str,
  blocked: bool,
) -> Result<Employee> {
  actor.role.require(Role::Admin)?;
  let mut employee = load_employee(store, id).await?;
  if employee.role > actor.role {
    return Err(Error::Forbidden { required: employee.role, actual: actor.role });
  }

  store
    .update(
      Employee::COLLECTION,
      employee.id.clone(),
      json!({ "is_blocked": blocked }),
    )
    .await
    .map_err(Error::store)?;
  employee.is_blocked = blocked;

  info!(employee_id = %employee.id, blocked, by = %actor.id, "updated account status");
  Ok(employee)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{memory::MemoryStore, service::fixtures::*};

  #[tokio::test]
  async fn admin_provisions_and_codes_are_unique() {
    let store = MemoryStore::new();
    let admin = seed_employee(&store, "A1", "Ops", Role::Admin).await;

    let e = provision_employee(&store, &admin, new_employee("E1", "Sales", Role::Employee))
      .await
      .unwrap();
    assert!(!e.id.is_empty());
    assert_eq!(get_employee(&store, &admin, &e.id).await.unwrap(), e);

    let err = provision_employee(&store, &admin, new_employee("E1", "Ops", Role::Hr))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::DuplicateEmployeeCode(code) if code == "E1"));
  }

  #[tokio::test]
  async fn provisioning_is_admin_only_and_capped_at_own_role() {
    let store = MemoryStore::new();
    let hr = seed_employee(&store, "H1", "HR", Role::Hr).await;
    let admin = seed_employee(&store, "A1", "Ops", Role::Admin).await;

    let err = provision_employee(&store, &hr, new_employee("E1", "Sales", Role::Employee))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden { required: Role::Admin, .. }));

    let err =
      provision_employee(&store, &admin, new_employee("S1", "Ops", Role::SuperAdmin))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden { required: Role::SuperAdmin, .. }));
  }

  #[tokio::test]
  async fn bootstrap_forces_super_admin() {
    let store = MemoryStore::new();
    let root = bootstrap_admin(&store, new_employee("ROOT", "Ops", Role::Employee))
      .await
      .unwrap();
    assert_eq!(root.role, Role::SuperAdmin);
  }

  #[tokio::test]
  async fn employees_see_only_themselves() {
    let store = MemoryStore::new();
    let a = seed_employee(&store, "E1", "Sales", Role::Employee).await;
    let b = seed_employee(&store, "E2", "Sales", Role::Employee).await;

    assert!(get_employee(&store, &a, &a.id).await.is_ok());
    assert!(matches!(
      get_employee(&store, &a, &b.id).await,
      Err(Error::Forbidden { .. })
    ));
    assert!(list_employees(&store, &a, None).await.is_err());
  }

  #[tokio::test]
  async fn list_filters_by_department() {
    let store = MemoryStore::new();
    let hr = seed_employee(&store, "H1", "HR", Role::Hr).await;
    seed_employee(&store, "E2", "Sales", Role::Employee).await;
    seed_employee(&store, "E1", "Sales", Role::Employee).await;

    let sales = list_employees(&store, &hr, Some("Sales")).await.unwrap();
    let codes: Vec<_> = sales.iter().map(|e| e.employee_code.as_str()).collect();
    assert_eq!(codes, ["E1", "E2"]);
    assert_eq!(list_employees(&store, &hr, None).await.unwrap().len(), 3);
  }

  #[tokio::test]
  async fn blocking_respects_rank() {
    let store = MemoryStore::new();
    let admin = seed_employee(&store, "A1", "Ops", Role::Admin).await;
    let root = seed_employee(&store, "S1", "Ops", Role::SuperAdmin).await;
    let e = seed_employee(&store, "E1", "Sales", Role::Employee).await;

    let blocked = set_blocked(&store, &admin, &e.id, true).await.unwrap();
    assert!(blocked.is_blocked);
    assert!(load_employee(&store, &e.id).await.unwrap().is_blocked);

    assert!(set_blocked(&store, &admin, &root.id, true).await.is_err());
    assert!(!set_blocked(&store, &admin, &e.id, false).await.unwrap().is_blocked);
  }
}
