//! Handlers for `/employees` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/employees` | HR+; optional `?department=` |
//! | `POST` | `/employees` | Admin+; body: [`NewEmployee`] |
//! | `GET`  | `/employees/{id}` | Self or HR+ |
//! | `POST` | `/employees/{id}/block` | Admin+ |
//! | `POST` | `/employees/{id}/unblock` | Admin+ |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use hrdesk_core::{
  employee::{Employee, NewEmployee},
  service::employees,
  store::DocumentStore,
};
use serde::Deserialize;

use crate::{ApiState, actor::Actor, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub department: Option<String>,
}

/// `GET /employees[?department=<name>]`
pub async fn list<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Employee>>, ApiError> {
  let list =
    employees::list_employees(state.store.as_ref(), &actor, params.department.as_deref())
      .await?;
  Ok(Json(list))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /employees`
pub async fn create<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<NewEmployee>,
) -> Result<impl IntoResponse, ApiError> {
  let employee = employees::provision_employee(state.store.as_ref(), &actor, body).await?;
  Ok((StatusCode::CREATED, Json(employee)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /employees/{id}`
pub async fn get_one<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
  let employee = employees::get_employee(state.store.as_ref(), &actor, &id).await?;
  Ok(Json(employee))
}

// ─── Block / unblock ─────────────────────────────────────────────────────────

/// `POST /employees/{id}/block`
pub async fn block<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
  let employee = employees::set_blocked(state.store.as_ref(), &actor, &id, true).await?;
  Ok(Json(employee))
}

/// `POST /employees/{id}/unblock`
pub async fn unblock<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
  let employee = employees::set_blocked(state.store.as_ref(), &actor, &id, false).await?;
  Ok(Json(employee))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;

  use crate::tests::{call, employee_body, harness, provision};

  #[tokio::test]
  async fn provision_list_and_get() {
    let h = harness().await;
    let hr = provision(&h, "H1", "HR", "hr").await;
    let e1 = provision(&h, "E1", "Sales", "employee").await;
    provision(&h, "E2", "Sales", "employee").await;

    let (status, body) =
      call(&h.router, "GET", "/employees?department=Sales", Some(&hr), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = call(&h.router, "GET", &format!("/employees/{e1}"), Some(&e1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employee_code"], "E1");
    assert_eq!(body["kras"], serde_json::json!([]));

    let (status, _) = call(&h.router, "GET", "/employees", Some(&e1), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn duplicate_code_conflicts() {
    let h = harness().await;
    provision(&h, "E1", "Sales", "employee").await;
    let (status, body) = call(
      &h.router,
      "POST",
      "/employees",
      Some(&h.root.id),
      Some(employee_body("E1", "Ops", "employee")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("E1"));
  }

  #[tokio::test]
  async fn blocked_accounts_are_locked_out() {
    let h = harness().await;
    let e1 = provision(&h, "E1", "Sales", "employee").await;

    let (status, body) =
      call(&h.router, "POST", &format!("/employees/{e1}/block"), Some(&h.root.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_blocked"], true);

    let (status, _) = call(&h.router, "GET", &format!("/employees/{e1}"), Some(&e1), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    call(&h.router, "POST", &format!("/employees/{e1}/unblock"), Some(&h.root.id), None)
      .await;
    let (status, _) = call(&h.router, "GET", &format!("/employees/{e1}"), Some(&e1), None).await;
    assert_eq!(status, StatusCode::OK);
  }
}
