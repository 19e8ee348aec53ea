//! Indian financial years (April to March) and their `FY 2023-24` labels.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Month in which a financial year begins.
pub const FY_START_MONTH: u32 = 4;

/// A financial year identified by the calendar year in which it starts.
///
/// Serialised as its label, e.g. `"FY 2023-24"`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct FinancialYear {
  start_year: i32,
}

impl FinancialYear {
  pub fn new(start_year: i32) -> Self { Self { start_year } }

  /// The financial year that contains `date`.
  pub fn containing(date: NaiveDate) -> Self {
    if date.month() >= FY_START_MONTH {
      Self::new(date.year())
    } else {
      Self::new(date.year() - 1)
    }
  }

  pub fn start_year(self) -> i32 { self.start_year }

  pub fn end_year(self) -> i32 { self.start_year + 1 }

  pub fn next(self) -> Self { Self::new(self.start_year + 1) }

  pub fn prev(self) -> Self { Self::new(self.start_year - 1) }

  /// 1 April of the start year.
  pub fn first_day(self) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(self.start_year, FY_START_MONTH, 1)
  }

  /// 31 March of the end year.
  pub fn last_day(self) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(self.end_year(), 3, 31)
  }

  /// Reject employees whose joining year lies beyond this year's end year.
  pub fn admit(self, joining_date: NaiveDate) -> Result<()> {
    if joining_date.year() > self.end_year() {
      return Err(Error::FutureEmployee {
        joining_date,
        financial_year: self.to_string(),
      });
    }
    Ok(())
  }
}

impl fmt::Display for FinancialYear {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "FY {}-{:02}",
      self.start_year,
      self.end_year().rem_euclid(100)
    )
  }
}

impl FromStr for FinancialYear {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidFinancialYear(s.to_owned());

    let body = s.trim().strip_prefix("FY").ok_or_else(invalid)?.trim();
    let (start, end) = body.split_once('-').ok_or_else(invalid)?;
    let start: i32 = start.trim().parse().map_err(|_| invalid())?;
    let end: i32 = end.trim().parse().map_err(|_| invalid())?;

    if end != (start + 1).rem_euclid(100) {
      return Err(invalid());
    }
    Ok(Self::new(start))
  }
}

impl TryFrom<String> for FinancialYear {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<FinancialYear> for String {
  fn from(fy: FinancialYear) -> Self { fy.to_string() }
}
