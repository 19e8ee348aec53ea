//! Error types for `hrdesk-core`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{kra::KraState, role::Role};

#[derive(Debug, Error)]
pub enum Error {
  // ── Not found ─────────────────────────────────────────────────────────

  #[error("employee not found: {0}")]
  EmployeeNotFound(String),

  #[error("KRA template not found: {0}")]
  KraTemplateNotFound(String),

  #[error("payroll record not found: {0}")]
  PayrollNotFound(String),

  // ── Validation ────────────────────────────────────────────────────────

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("weightage must be between 0 and 100, got {0}")]
  InvalidWeightage(u32),

  #[error(
    "KRA weight budget exceeded: current {current}% + requested {requested}% > 100%"
  )]
  WeightBudgetExceeded { current: u32, requested: u32 },

  #[error(
    "mandatory KRA budget exceeded in {department}: existing {current}% + {requested}% > 100%"
  )]
  MandatoryBudgetExceeded {
    department: String,
    current:    u32,
    requested:  u32,
  },

  #[error("KRA {kra_id} is mandatory for the department and cannot be {action}")]
  MandatoryKra { kra_id: String, action: &'static str },

  #[error("KRA {0} is already selected")]
  AlreadySelected(String),

  #[error("cannot {action} KRA {kra_id} in state {state}")]
  InvalidTransition {
    kra_id: String,
    state:  KraState,
    action: &'static str,
  },

  #[error("KRA {0} is approved; ask a manager to remove it")]
  ApprovedWithdrawal(String),

  #[error("KRA {0} is not part of the active KRA set")]
  UnknownKra(String),

  #[error("employee code {0:?} is already in use")]
  DuplicateEmployeeCode(String),

  #[error("invalid payroll input: {0}")]
  InvalidPayrollInput(String),

  #[error("payment of {amount} exceeds outstanding balance {balance}")]
  Overpayment { amount: Decimal, balance: Decimal },

  #[error("time frame {frame:?} does not belong to period type {period}")]
  InvalidTimeFrame { period: String, frame: String },

  #[error("invalid financial year label: {0:?}")]
  InvalidFinancialYear(String),

  #[error("employee joined on {joining_date}, after financial year {financial_year}")]
  FutureEmployee {
    joining_date:   NaiveDate,
    financial_year: String,
  },

  // ── Authorisation ─────────────────────────────────────────────────────

  #[error("requires role {required} or above, caller is {actual}")]
  Forbidden { required: Role, actual: Role },

  #[error("only the employee themself may {0}")]
  NotSelf(&'static str),

  #[error("employee {0} is blocked")]
  Blocked(String),

  // ── Backend ───────────────────────────────────────────────────────────

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error from any [`crate::store::DocumentStore`].
  ///
  /// Store failures are logged here, once, as they cross into the domain.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    tracing::error!(error = %e, "document store failure");
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
