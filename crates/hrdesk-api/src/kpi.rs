//! Handlers for KPI scorecards.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/employees/{id}/kpi?fy=&period=&frame=` | Self or HR+ |
//! | `PUT` | `/employees/{id}/kpi?fy=&period=&frame=` | HR+; body: [`SaveScorecardBody`] |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use hrdesk_core::{
  fiscal::FinancialYear,
  kpi::{KpiEntry, KpiPeriod, PeriodType, Scorecard},
  service::kpi,
  store::DocumentStore,
};
use serde::Deserialize;

use crate::{ApiState, actor::Actor, error::ApiError};

/// Identifies the scoring period, e.g. `?fy=FY%202024-25&period=quarterly&frame=Q1`.
#[derive(Debug, Deserialize)]
pub struct PeriodParams {
  pub fy:     FinancialYear,
  pub period: PeriodType,
  pub frame:  String,
}

impl PeriodParams {
  fn into_period(self) -> Result<KpiPeriod, ApiError> {
    Ok(KpiPeriod::new(self.fy, self.period, self.frame)?)
  }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveScorecardBody {
  pub entries: Vec<KpiEntry>,
}

/// `GET /employees/{id}/kpi`
pub async fn get_scorecard<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
  Query(params): Query<PeriodParams>,
) -> Result<Json<Scorecard>, ApiError> {
  let period = params.into_period()?;
  let scorecard = kpi::load_scorecard(state.store.as_ref(), &actor, &id, &period).await?;
  Ok(Json(scorecard))
}

/// `PUT /employees/{id}/kpi`
///
/// Every entry is written in one batch; responds with the reloaded scorecard.
pub async fn save_scorecard<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
  Query(params): Query<PeriodParams>,
  Json(body): Json<SaveScorecardBody>,
) -> Result<Json<Scorecard>, ApiError> {
  let period = params.into_period()?;
  let scorecard =
    kpi::save_scorecard(state.store.as_ref(), &actor, &id, &period, &body.entries).await?;
  Ok(Json(scorecard))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;
  use serde_json::json;

  use crate::tests::{call, harness, provision};

  const PERIOD: &str = "fy=FY%202024-25&period=quarterly&frame=Q1";

  #[tokio::test]
  async fn save_and_read_back() {
    let h = harness().await;
    let e1 = provision(&h, "E1", "Sales", "employee").await;
    let (_, template) = call(
      &h.router,
      "POST",
      "/kra/templates",
      Some(&h.root.id),
      Some(json!({
        "title": "Compliance",
        "department": "Sales",
        "is_mandatory": true,
        "weightage": 60,
      })),
    )
    .await;
    let kra = template["id"].as_str().unwrap();

    let uri = format!("/employees/{e1}/kpi?{PERIOD}");
    let (status, body) = call(&h.router, "GET", &uri, Some(&e1), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["rows"][0]["recorded"], false);
    assert_eq!(body["overall_score"], 0);

    let (status, body) = call(
      &h.router,
      "PUT",
      &uri,
      Some(&h.root.id),
      Some(json!({ "entries": [{ "kra_id": kra, "target": 100.0, "actual": 75.0 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["overall_score"], 75);
    assert_eq!(body["financial_year"], "FY 2024-25");
    assert_eq!(body["time_frame"], "Q1");

    let (_, body) = call(&h.router, "GET", &uri, Some(&e1), None).await;
    assert_eq!(body["rows"][0]["recorded"], true);
    assert_eq!(body["rows"][0]["score"], 75);
  }

  #[tokio::test]
  async fn employees_cannot_score_themselves() {
    let h = harness().await;
    let e1 = provision(&h, "E1", "Sales", "employee").await;
    let uri = format!("/employees/{e1}/kpi?{PERIOD}");
    let (status, _) =
      call(&h.router, "PUT", &uri, Some(&e1), Some(json!({ "entries": [] }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn frame_must_match_period_type() {
    let h = harness().await;
    let e1 = provision(&h, "E1", "Sales", "employee").await;
    let uri = format!("/employees/{e1}/kpi?fy=FY%202024-25&period=monthly&frame=Q1");
    let (status, _) = call(&h.router, "GET", &uri, Some(&e1), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}
