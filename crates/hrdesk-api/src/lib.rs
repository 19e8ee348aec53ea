//! JSON REST API for hrdesk.
//!
//! Exposes an axum [`Router`] backed by any
//! [`hrdesk_core::store::DocumentStore`]. Session handling, TLS and transport
//! concerns are the caller's responsibility; the caller is identified by the
//! [`actor::ACTOR_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", hrdesk_api::api_router(store.clone(), settings))
//! ```

pub mod actor;
pub mod employees;
pub mod error;
pub mod kpi;
pub mod kra;
pub mod payroll;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use hrdesk_core::{payroll::PayrollRules, store::DocumentStore};
use hrdesk_payslip::Company;

pub use actor::Actor;
pub use error::ApiError;

/// Deployment-specific inputs the handlers need besides the store.
#[derive(Debug, Clone, Default)]
pub struct ApiSettings {
  pub rules:   PayrollRules,
  pub company: Company,
}

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub settings: Arc<ApiSettings>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), settings: self.settings.clone() }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, settings: ApiSettings) -> Router<()>
where
  S: DocumentStore + 'static,
{
  let state = ApiState { store, settings: Arc::new(settings) };
  Router::new()
    // Employees
    .route("/employees", get(employees::list::<S>).post(employees::create::<S>))
    .route("/employees/{id}", get(employees::get_one::<S>))
    .route("/employees/{id}/block", post(employees::block::<S>))
    .route("/employees/{id}/unblock", post(employees::unblock::<S>))
    // KRAs
    .route("/employees/{id}/kras", get(kra::overview::<S>))
    .route("/employees/{id}/kras/{kra_id}/{action}", post(kra::transition::<S>))
    .route("/kra/pending", get(kra::pending::<S>))
    .route(
      "/kra/templates",
      get(kra::list_templates::<S>).post(kra::create_template::<S>),
    )
    .route(
      "/kra/templates/{id}",
      put(kra::update_template::<S>).delete(kra::delete_template::<S>),
    )
    // KPIs
    .route(
      "/employees/{id}/kpi",
      get(kpi::get_scorecard::<S>).put(kpi::save_scorecard::<S>),
    )
    // Payroll
    .route("/payroll/preview", post(payroll::preview::<S>))
    .route("/payroll", get(payroll::list::<S>).post(payroll::create::<S>))
    .route("/payroll/{id}", get(payroll::get_one::<S>))
    .route("/payroll/{id}/payments", post(payroll::add_payment::<S>))
    .route("/payroll/{id}/payslip", get(payroll::payslip::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::NaiveDate;
  use hrdesk_core::{
    employee::{Employee, NewEmployee},
    memory::MemoryStore,
    role::Role,
    service::employees::bootstrap_admin,
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  pub(crate) struct Harness {
    pub router: Router,
    pub store:  Arc<MemoryStore>,
    pub root:   Employee,
  }

  pub(crate) async fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let root = bootstrap_admin(store.as_ref(), NewEmployee {
      employee_code: "ROOT".into(),
      name:          "Root".into(),
      email:         None,
      department:    "Ops".into(),
      designation:   "Owner".into(),
      role:          Role::SuperAdmin,
      joining_date:  NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
      pan:           None,
      uan:           None,
      pf_number:     None,
      bank_account:  None,
    })
    .await
    .unwrap();
    let settings = ApiSettings {
      company: Company { name: "Acme".into(), ..Company::default() },
      ..ApiSettings::default()
    };
    Harness { router: api_router(store.clone(), settings), store, root }
  }

  /// Send a request as `actor` and return the status and decoded body
  /// (JSON when possible, otherwise a JSON string of the text).
  pub(crate) async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    actor: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
      builder = builder.header(actor::ACTOR_HEADER, actor);
    }
    let req = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = serde_json::from_slice(&bytes)
      .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
  }

  pub(crate) fn employee_body(code: &str, department: &str, role: &str) -> Value {
    json!({
      "employee_code": code,
      "name": format!("Employee {code}"),
      "department": department,
      "designation": "Associate",
      "role": role,
      "joining_date": "2023-04-01",
      "pan": "ABCDE1234F",
      "bank_account": {
        "bank_name": "SBI",
        "account_number": "1234567890",
        "ifsc": "SBIN0000001"
      }
    })
  }

  pub(crate) async fn provision(h: &Harness, code: &str, department: &str, role: &str) -> String {
    let (status, body) = call(
      &h.router,
      "POST",
      "/employees",
      Some(&h.root.id),
      Some(employee_body(code, department, role)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_owned()
  }

  #[tokio::test]
  async fn missing_or_unknown_actor_is_unauthorized() {
    let h = harness().await;
    let (status, _) = call(&h.router, "GET", "/employees", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = call(&h.router, "GET", "/employees", Some("ghost"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unknown employee");
  }

  #[tokio::test]
  async fn store_outage_is_a_generic_500() {
    let h = harness().await;
    h.store.set_unavailable(true);
    let (status, body) = call(&h.router, "GET", "/employees", Some(&h.root.id), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal storage error");
  }
}
