//! KRA template library and per-employee selection workflow.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::{ensure_can_view, load_employee, load_library};
use crate::{
  Error, Result,
  employee::Employee,
  kra::{
    AssignmentStatus, KraAction, KraBook, KraOverview, KraTemplate, NewKraTemplate,
    check_mandatory_budget,
  },
  record::{Record, fetch, fetch_all, insert, put},
  role::Role,
  store::{DocumentStore, Filter, Query},
};

// ─── Templates ───────────────────────────────────────────────────────────────

/// Templates ordered by title, optionally for one department.
pub async fn list_templates<S: DocumentStore>(
  store: &S,
  department: Option<&str>,
) -> Result<Vec<KraTemplate>> {
  let mut query = Query::new(KraTemplate::COLLECTION).order_by("title", false);
  if let Some(department) = department {
    query = query.filter(Filter::equals("department", department));
  }
  fetch_all(store, &query).await
}

async fn department_library<S: DocumentStore>(
  store: &S,
  department: &str,
) -> Result<Vec<KraTemplate>> {
  list_templates(store, Some(department)).await
}

pub async fn create_template<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  input: NewKraTemplate,
) -> Result<KraTemplate> {
  actor.role.require(Role::Hr)?;
  input.validate()?;
  let mut template = input.into_template(String::new());
  if template.is_mandatory {
    let library = department_library(store, &template.department).await?;
    check_mandatory_budget(&library, &template.department, template.weightage, None)?;
  }

  template.id = insert(store, &template).await?;
  info!(
    kra_id = %template.id,
    department = %template.department,
    mandatory = template.is_mandatory,
    weightage = template.weightage,
    "created KRA template"
  );
  Ok(template)
}

/// Replace a template's fields.
pub async fn update_template<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  id: &str,
  input: NewKraTemplate,
) -> Result<KraTemplate> {
  actor.role.require(Role::Hr)?;
  input.validate()?;
  if fetch::<KraTemplate, _>(store, id).await?.is_none() {
    return Err(Error::KraTemplateNotFound(id.to_owned()));
  }

  let template = input.into_template(id.to_owned());
  if template.is_mandatory {
    let library = department_library(store, &template.department).await?;
    check_mandatory_budget(&library, &template.department, template.weightage, Some(id))?;
  }

  put(store, &template).await?;
  info!(kra_id = %id, weightage = template.weightage, "updated KRA template");
  Ok(template)
}

/// Delete a template. Selections that still name it weigh nothing afterwards.
pub async fn delete_template<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  id: &str,
) -> Result<()> {
  actor.role.require(Role::Hr)?;
  if fetch::<KraTemplate, _>(store, id).await?.is_none() {
    return Err(Error::KraTemplateNotFound(id.to_owned()));
  }
  store
    .delete(KraTemplate::COLLECTION, id.to_owned())
    .await
    .map_err(Error::store)?;
  info!(kra_id = %id, "deleted KRA template");
  Ok(())
}

// ─── Selections ──────────────────────────────────────────────────────────────

/// An employee's KRA states. Self, or any manager.
pub async fn kra_overview<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  employee_id: &str,
) -> Result<KraOverview> {
  ensure_can_view(actor, employee_id)?;
  let employee = load_employee(store, employee_id).await?;
  let library = load_library(store).await?;
  Ok(KraBook::new(&employee, &library).overview())
}

/// Apply one state-machine action and persist the employee's whole `kras`
/// list in a single write.
///
/// Request and withdraw are the employee's own actions; approve, reject and
/// remove need a manager. Concurrent edits to the same employee are
/// last-write-wins.
pub async fn transition<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  employee_id: &str,
  kra_id: &str,
  action: KraAction,
) -> Result<KraOverview> {
  if action.by_manager() {
    actor.role.require(Role::Hr)?;
  } else if actor.id != employee_id {
    return Err(Error::NotSelf(match action {
      KraAction::Request => "request a KRA",
      _ => "withdraw a KRA request",
    }));
  }

  let employee = load_employee(store, employee_id).await?;
  let library = load_library(store).await?;
  let mut book = KraBook::new(&employee, &library);

  if let Err(e) = book.apply(action, kra_id) {
    warn!(employee_id, kra_id, %action, error = %e, "rejected KRA transition");
    return Err(e);
  }

  let overview = book.overview();
  store
    .update(
      Employee::COLLECTION,
      employee_id.to_owned(),
      json!({ "kras": book.into_assignments() }),
    )
    .await
    .map_err(Error::store)?;

  info!(
    employee_id,
    kra_id,
    %action,
    by = %actor.id,
    total_weight = overview.total_weight,
    "applied KRA transition"
  );
  Ok(overview)
}

/// A pending request awaiting a manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
  pub employee_id:   String,
  pub employee_code: String,
  pub employee_name: String,
  pub department:    String,
  pub template:      KraTemplate,
}

/// Every pending request across the organisation, by employee code. HR and
/// above. Requests whose template has been deleted are omitted.
pub async fn pending_approvals<S: DocumentStore>(
  store: &S,
  actor: &Employee,
) -> Result<Vec<PendingApproval>> {
  actor.role.require(Role::Hr)?;
  let library = load_library(store).await?;
  let employees: Vec<Employee> = fetch_all(
    store,
    &Query::new(Employee::COLLECTION).order_by("employee_code", false),
  )
  .await?;

  let mut pending = Vec::new();
  for employee in employees {
    for assignment in &employee.kras {
      if assignment.status != AssignmentStatus::Pending {
        continue;
      }
      let Some(template) = library.iter().find(|t| t.id == assignment.kra_id) else {
        continue;
      };
      pending.push(PendingApproval {
        employee_id:   employee.id.clone(),
        employee_code: employee.employee_code.clone(),
        employee_name: employee.name.clone(),
        department:    employee.department.clone(),
        template:      template.clone(),
      });
    }
  }
  Ok(pending)
}
