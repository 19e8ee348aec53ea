//! Handlers for `/payroll` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/payroll/preview` | HR+; calculator only, nothing is saved |
//! | `GET`  | `/payroll` | `?employee_id=` (self or HR+), `?month=YYYY-MM-DD` |
//! | `POST` | `/payroll` | HR+; body: [`CreateBody`]; returns 201 |
//! | `GET`  | `/payroll/{id}` | Owner or HR+ |
//! | `POST` | `/payroll/{id}/payments` | HR+; body: [`Payment`] |
//! | `GET`  | `/payroll/{id}/payslip` | Owner or HR+; `text/plain` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use chrono::NaiveDate;
use hrdesk_core::{
  employee::Employee,
  payroll::{
    Adjustments, CtcMode, NewPayroll, Payment, PaymentStatus, PayrollInput,
    PayrollRecord, PayrollRules, SalaryBreakdown, days_in_month,
  },
  service::{employees, payroll},
  store::DocumentStore,
};
use hrdesk_payslip::Payslip;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ApiState, actor::Actor, error::ApiError};

// ─── Request bodies ──────────────────────────────────────────────────────────

fn enabled() -> bool { true }

/// Calculator input as submitted. `basic_percent` falls back to the configured
/// default and `total_days_in_month` to the length of the pay month.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputBody {
  pub ctc_value:           f64,
  pub ctc_mode:            CtcMode,
  #[serde(default)]
  pub basic_percent:       Option<f64>,
  pub paid_days:           f64,
  #[serde(default)]
  pub total_days_in_month: Option<f64>,
  #[serde(default = "enabled")]
  pub pf_enabled:          bool,
  #[serde(default = "enabled")]
  pub esic_enabled:        bool,
  #[serde(default = "enabled")]
  pub pt_enabled:          bool,
}

impl InputBody {
  fn resolve(
    self,
    rules: &PayrollRules,
    month: Option<NaiveDate>,
  ) -> Result<PayrollInput, ApiError> {
    let total_days_in_month = match (self.total_days_in_month, month) {
      (Some(days), _) => days,
      (None, Some(month)) => f64::from(days_in_month(month)),
      (None, None) => {
        return Err(ApiError::BadRequest(
          "total_days_in_month is required when no month is given".into(),
        ));
      }
    };
    Ok(PayrollInput {
      ctc_value: self.ctc_value,
      ctc_mode: self.ctc_mode,
      basic_percent: self.basic_percent.unwrap_or(rules.default_basic_percent),
      paid_days: self.paid_days,
      total_days_in_month,
      pf_enabled: self.pf_enabled,
      esic_enabled: self.esic_enabled,
      pt_enabled: self.pt_enabled,
    })
  }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreviewBody {
  pub input:       InputBody,
  #[serde(default)]
  pub adjustments: Adjustments,
  /// Only used to default `total_days_in_month`.
  #[serde(default)]
  pub month:       Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBody {
  pub employee_id: String,
  /// Any day in the pay month.
  pub month:       NaiveDate,
  pub input:       InputBody,
  #[serde(default)]
  pub adjustments: Adjustments,
}

// ─── Responses ───────────────────────────────────────────────────────────────

/// A stored record together with its derived payment position.
#[derive(Debug, Serialize)]
pub struct PayrollView {
  #[serde(flatten)]
  pub record:      PayrollRecord,
  pub paid_amount: Decimal,
  pub balance:     Decimal,
  pub status:      PaymentStatus,
}

impl From<PayrollRecord> for PayrollView {
  fn from(record: PayrollRecord) -> Self {
    Self {
      paid_amount: record.paid_amount(),
      balance: record.balance(),
      status: record.payment_status(),
      record,
    }
  }
}

// ─── Calculator ──────────────────────────────────────────────────────────────

/// `POST /payroll/preview`
pub async fn preview<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<PreviewBody>,
) -> Result<Json<SalaryBreakdown>, ApiError> {
  let rules = &state.settings.rules;
  let input = body.input.resolve(rules, body.month)?;
  let breakdown = payroll::preview_payroll(&actor, &input, &body.adjustments, rules)?;
  Ok(Json(breakdown))
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub employee_id: Option<String>,
  pub month:       Option<NaiveDate>,
}

/// `GET /payroll[?employee_id=<id>][&month=<date>]`
pub async fn list<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PayrollView>>, ApiError> {
  let records = payroll::list_payroll(
    state.store.as_ref(),
    &actor,
    params.employee_id.as_deref(),
    params.month,
  )
  .await?;
  Ok(Json(records.into_iter().map(PayrollView::from).collect()))
}

/// `POST /payroll`
pub async fn create<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let rules = &state.settings.rules;
  let input = body.input.resolve(rules, Some(body.month))?;
  let record = payroll::create_payroll(state.store.as_ref(), &actor, rules, NewPayroll {
    employee_id: body.employee_id,
    month: body.month,
    input,
    adjustments: body.adjustments,
  })
  .await?;
  Ok((StatusCode::CREATED, Json(PayrollView::from(record))))
}

/// `GET /payroll/{id}`
pub async fn get_one<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
) -> Result<Json<PayrollView>, ApiError> {
  let record = payroll::get_payroll(state.store.as_ref(), &actor, &id).await?;
  Ok(Json(record.into()))
}

/// `POST /payroll/{id}/payments`
pub async fn add_payment<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
  Json(payment): Json<Payment>,
) -> Result<Json<PayrollView>, ApiError> {
  let record = payroll::record_payment(state.store.as_ref(), &actor, &id, payment).await?;
  Ok(Json(record.into()))
}

// ─── Payslip ─────────────────────────────────────────────────────────────────

/// `GET /payroll/{id}/payslip`
pub async fn payslip<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let store = state.store.as_ref();
  let record = payroll::get_payroll(store, &actor, &id).await?;
  let employee: Employee = employees::get_employee(store, &actor, &record.employee_id).await?;

  let text = hrdesk_payslip::render(&Payslip {
    company:  &state.settings.company,
    employee: &employee,
    record:   &record,
  })?;
  Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}
