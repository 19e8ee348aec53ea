//! Fixed-layout payslips for hrdesk.
//!
//! Renders a saved [`PayrollRecord`] as plain text. Pure synchronous; no HTTP
//! or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! # fn demo(
//! #   company: &hrdesk_payslip::Company,
//! #   employee: &hrdesk_core::employee::Employee,
//! #   record: &hrdesk_core::payroll::PayrollRecord,
//! # ) {
//! use hrdesk_payslip::{Payslip, render};
//!
//! let text = render(&Payslip { company, employee, record }).unwrap();
//! println!("{text}");
//! # }
//! ```

pub mod error;
mod render;
mod words;

pub use error::{Error, Result};
use hrdesk_core::{employee::Employee, payroll::PayrollRecord};
use serde::{Deserialize, Serialize};

pub use crate::{
  render::{format_inr, format_money},
  words::amount_in_words,
};

// ─── Public types ────────────────────────────────────────────────────────────

/// The employer printed in the payslip header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
  pub name:          String,
  pub address_lines: Vec<String>,
  pub gstin:         Option<String>,
  /// Title printed under the signature line.
  pub signatory:     String,
}

/// Everything one payslip shows.
pub struct Payslip<'a> {
  pub company:  &'a Company,
  pub employee: &'a Employee,
  pub record:   &'a PayrollRecord,
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Render `payslip` as fixed-width text.
pub fn render(payslip: &Payslip<'_>) -> Result<String> { render::render(payslip) }
