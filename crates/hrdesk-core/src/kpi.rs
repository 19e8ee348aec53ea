//! KPI scoring: per-KRA target/actual records and weighted scorecards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{
  Error, Result,
  employee::Employee,
  fiscal::FinancialYear,
  kra::{KraBook, KraTemplate},
  payroll::round_half_up,
  record::Record,
  store::Collection,
};

// ─── Periods ─────────────────────────────────────────────────────────────────

/// Granularity of a KPI review within a financial year.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PeriodType {
  Monthly,
  Quarterly,
  HalfYearly,
  Annual,
}

impl PeriodType {
  /// Valid time frames, in financial-year order.
  pub fn time_frames(self) -> &'static [&'static str] {
    match self {
      Self::Monthly => &[
        "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec", "Jan",
        "Feb", "Mar",
      ],
      Self::Quarterly => &["Q1", "Q2", "Q3", "Q4"],
      Self::HalfYearly => &["H1", "H2"],
      Self::Annual => &["Annual"],
    }
  }
}

/// The `(financial year, period type, time frame)` part of a KPI key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiPeriod {
  pub financial_year: FinancialYear,
  pub period_type:    PeriodType,
  pub time_frame:     String,
}

impl KpiPeriod {
  pub fn new(
    financial_year: FinancialYear,
    period_type: PeriodType,
    time_frame: impl Into<String>,
  ) -> Result<Self> {
    let time_frame = time_frame.into();
    if !period_type.time_frames().contains(&time_frame.as_str()) {
      return Err(Error::InvalidTimeFrame {
        period: period_type.to_string(),
        frame:  time_frame,
      });
    }
    Ok(Self { financial_year, period_type, time_frame })
  }

  /// Deterministic document id for one employee's KRA in this period.
  pub fn record_id(&self, employee_id: &str, kra_id: &str) -> String {
    format!(
      "{employee_id}_{kra_id}_{}_{}_{}",
      self.financial_year.start_year(),
      self.period_type,
      self.time_frame,
    )
  }

  fn contains(&self, record: &KpiRecord) -> bool {
    record.financial_year == self.financial_year
      && record.period_type == self.period_type
      && record.time_frame == self.time_frame
  }
}

// ─── Scores ──────────────────────────────────────────────────────────────────

/// `round(actual / target * 100)`, uncapped. Zero when the target is zero or
/// not a number, or when the ratio is not a number.
pub fn calculate_score(target: f64, actual: f64) -> i64 {
  if target == 0.0 || target.is_nan() {
    return 0;
  }
  let score = round_half_up(actual / target * 100.0);
  if score.is_nan() { 0 } else { score as i64 }
}

/// Weighted average `round(Σ score·weight / Σ weight)`; zero when the total
/// weight is zero.
pub fn overall_score<I>(rows: I) -> i64
where
  I: IntoIterator<Item = (i64, u32)>,
{
  let (weighted, total) = rows
    .into_iter()
    .fold((0.0_f64, 0_u64), |(acc, total), (score, weight)| {
      (acc + score as f64 * f64::from(weight), total + u64::from(weight))
    });
  if total == 0 {
    return 0;
  }
  round_half_up(weighted / total as f64) as i64
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// One scored KRA for one employee in one period (`kpi_records`).
///
/// The key fields (employee, KRA, period) never change once written; later
/// saves overwrite target, actual, weightage and score only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KpiRecord {
  pub id:             String,
  pub employee_id:    String,
  pub kra_id:         String,
  pub financial_year: FinancialYear,
  pub period_type:    PeriodType,
  pub time_frame:     String,
  pub target:         f64,
  pub actual:         f64,
  /// Copied from the template when the entry was made.
  pub weightage:      u32,
  pub score:          i64,
  pub updated_by:     String,
  pub updated_at:     DateTime<Utc>,
}

impl Record for KpiRecord {
  const COLLECTION: Collection = Collection::KpiRecords;

  fn id(&self) -> &str { &self.id }
}

/// A manager's input for one KRA in a scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KpiEntry {
  pub kra_id:    String,
  pub target:    f64,
  pub actual:    f64,
  /// Defaults to the template's current weightage.
  #[serde(default)]
  pub weightage: Option<u32>,
}

// ─── Scorecards ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardRow {
  pub kra_id:       String,
  pub title:        String,
  pub is_mandatory: bool,
  pub target:       f64,
  pub actual:       f64,
  pub weightage:    u32,
  pub score:        i64,
  /// Whether a stored record backs this row.
  pub recorded:     bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
  pub employee_id:   String,
  #[serde(flatten)]
  pub period:        KpiPeriod,
  pub rows:          Vec<ScorecardRow>,
  pub overall_score: i64,
}

/// Assemble the scorecard for the employee's active KRAs, filling rows that
/// have no record with zero target/actual and the template weightage.
pub fn build_scorecard(
  employee: &Employee,
  library: &[KraTemplate],
  period: &KpiPeriod,
  records: &[KpiRecord],
) -> Result<Scorecard> {
  period.financial_year.admit(employee.joining_date)?;

  let rows: Vec<ScorecardRow> = KraBook::new(employee, library)
    .active()
    .into_iter()
    .map(|t| {
      let record = records
        .iter()
        .find(|r| r.employee_id == employee.id && r.kra_id == t.id && period.contains(r));
      let (target, actual, weightage) = record
        .map(|r| (r.target, r.actual, r.weightage))
        .unwrap_or((0.0, 0.0, t.weightage));
      ScorecardRow {
        kra_id: t.id.clone(),
        title: t.title.clone(),
        is_mandatory: t.is_mandatory,
        target,
        actual,
        weightage,
        score: calculate_score(target, actual),
        recorded: record.is_some(),
      }
    })
    .collect();

  let overall_score = overall_score(rows.iter().map(|r| (r.score, r.weightage)));
  Ok(Scorecard {
    employee_id: employee.id.clone(),
    period: period.clone(),
    rows,
    overall_score,
  })
}

/// Turn a scoring pass into the full set of records to write.
///
/// Every entry must name an active KRA. Records are keyed by
/// [`KpiPeriod::record_id`], so saving the same period twice overwrites.
pub fn score_entries(
  employee: &Employee,
  library: &[KraTemplate],
  period: &KpiPeriod,
  entries: &[KpiEntry],
  updated_by: &str,
  updated_at: DateTime<Utc>,
) -> Result<Vec<KpiRecord>> {
  period.financial_year.admit(employee.joining_date)?;

  let active = KraBook::new(employee, library).active();
  entries
    .iter()
    .map(|entry| {
      let template = active
        .iter()
        .find(|t| t.id == entry.kra_id)
        .ok_or_else(|| Error::UnknownKra(entry.kra_id.clone()))?;
      Ok(KpiRecord {
        id: period.record_id(&employee.id, &entry.kra_id),
        employee_id: employee.id.clone(),
        kra_id: entry.kra_id.clone(),
        financial_year: period.financial_year,
        period_type: period.period_type,
        time_frame: period.time_frame.clone(),
        target: entry.target,
        actual: entry.actual,
        weightage: entry.weightage.unwrap_or(template.weightage),
        score: calculate_score(entry.target, entry.actual),
        updated_by: updated_by.to_owned(),
        updated_at,
      })
    })
    .collect()
}
