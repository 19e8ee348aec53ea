//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use hrdesk_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("payslip error: {0}")]
  Payslip(#[from] hrdesk_payslip::Error),
}

fn core_status(e: &CoreError) -> StatusCode {
  match e {
    CoreError::EmployeeNotFound(_)
    | CoreError::KraTemplateNotFound(_)
    | CoreError::PayrollNotFound(_) => StatusCode::NOT_FOUND,

    CoreError::Forbidden { .. } | CoreError::NotSelf(_) | CoreError::Blocked(_) => {
      StatusCode::FORBIDDEN
    }

    CoreError::DuplicateEmployeeCode(_)
    | CoreError::AlreadySelected(_)
    | CoreError::InvalidTransition { .. }
    | CoreError::ApprovedWithdrawal(_)
    | CoreError::MandatoryKra { .. } => StatusCode::CONFLICT,

    CoreError::MissingField(_)
    | CoreError::InvalidWeightage(_)
    | CoreError::WeightBudgetExceeded { .. }
    | CoreError::MandatoryBudgetExceeded { .. }
    | CoreError::UnknownKra(_)
    | CoreError::InvalidPayrollInput(_)
    | CoreError::Overpayment { .. }
    | CoreError::InvalidTimeFrame { .. }
    | CoreError::InvalidFinancialYear(_)
    | CoreError::FutureEmployee { .. } => StatusCode::BAD_REQUEST,

    CoreError::Serialization(_) | CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      // Backend details stay in the server log.
      ApiError::Core(CoreError::Store(_) | CoreError::Serialization(_)) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal storage error".to_owned(),
      ),
      ApiError::Core(e) => (core_status(e), e.to_string()),
      ApiError::Payslip(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
