//! Handlers for KRA templates and per-employee selections.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/employees/{id}/kras` | Self or HR+ |
//! | `POST`   | `/employees/{id}/kras/{kra_id}/{action}` | `request`, `withdraw`, `approve`, `reject`, `remove` |
//! | `GET`    | `/kra/pending` | HR+ |
//! | `GET`    | `/kra/templates` | Optional `?department=` |
//! | `POST`   | `/kra/templates` | HR+; body: [`NewKraTemplate`]; returns 201 |
//! | `PUT`    | `/kra/templates/{id}` | HR+; replaces every field |
//! | `DELETE` | `/kra/templates/{id}` | HR+; returns 204 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use hrdesk_core::{
  kra::{KraAction, KraOverview, KraTemplate, NewKraTemplate},
  service::kra::{self, PendingApproval},
  store::DocumentStore,
};
use serde::Deserialize;

use crate::{ApiState, actor::Actor, error::ApiError};

// ─── Selections ──────────────────────────────────────────────────────────────

/// `GET /employees/{id}/kras`
pub async fn overview<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
) -> Result<Json<KraOverview>, ApiError> {
  let overview = kra::kra_overview(state.store.as_ref(), &actor, &id).await?;
  Ok(Json(overview))
}

/// `POST /employees/{id}/kras/{kra_id}/{action}`
///
/// Responds with the overview after the transition.
pub async fn transition<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path((id, kra_id, action)): Path<(String, String, KraAction)>,
) -> Result<Json<KraOverview>, ApiError> {
  let overview = kra::transition(state.store.as_ref(), &actor, &id, &kra_id, action).await?;
  Ok(Json(overview))
}

/// `GET /kra/pending`
pub async fn pending<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
) -> Result<Json<Vec<PendingApproval>>, ApiError> {
  Ok(Json(kra::pending_approvals(state.store.as_ref(), &actor).await?))
}

// ─── Templates ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TemplateParams {
  pub department: Option<String>,
}

/// `GET /kra/templates[?department=<name>]`
///
/// Any active employee may browse the library.
pub async fn list_templates<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(_actor): Actor,
  Query(params): Query<TemplateParams>,
) -> Result<Json<Vec<KraTemplate>>, ApiError> {
  let templates =
    kra::list_templates(state.store.as_ref(), params.department.as_deref()).await?;
  Ok(Json(templates))
}

/// `POST /kra/templates`
pub async fn create_template<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<NewKraTemplate>,
) -> Result<impl IntoResponse, ApiError> {
  let template = kra::create_template(state.store.as_ref(), &actor, body).await?;
  Ok((StatusCode::CREATED, Json(template)))
}

/// `PUT /kra/templates/{id}`
pub async fn update_template<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
  Json(body): Json<NewKraTemplate>,
) -> Result<Json<KraTemplate>, ApiError> {
  let template = kra::update_template(state.store.as_ref(), &actor, &id, body).await?;
  Ok(Json(template))
}

/// `DELETE /kra/templates/{id}`
pub async fn delete_template<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  kra::delete_template(state.store.as_ref(), &actor, &id).await?;
  Ok(StatusCode::NO_CONTENT)
}
