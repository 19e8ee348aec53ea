//! Error type for `hrdesk-payslip`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Amounts must be finite to be printed or spelled out.
  #[error("amount is not a finite number: {0}")]
  NonFiniteAmount(f64),

  #[error("amount too large to spell out: {0}")]
  AmountTooLarge(f64),

  #[error("formatting error: {0}")]
  Fmt(#[from] std::fmt::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
