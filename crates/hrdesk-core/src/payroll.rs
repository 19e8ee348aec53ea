//! Monthly salary computation and payroll records.
//!
//! [`calculate`] splits a CTC into Basic, HRA and Special Allowance, prorates
//! them by attendance and nets out PF, ESIC and Professional Tax plus the
//! operator's manual adjustments. Every derived amount is rounded to a whole
//! currency unit at the step that produces it, so under partial attendance
//! Basic + HRA + Special can drift from the prorated CTC by a unit or two.
//!
//! The calculator does not validate. Non-finite inputs flow through the
//! arithmetic unchanged; [`PayrollInput::validate`] is the boundary check
//! callers run before persisting anything.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result, record::Record, store::Collection};

/// Round half towards positive infinity (`Math.round` semantics), unlike
/// [`f64::round`] which rounds half away from zero.
pub fn round_half_up(x: f64) -> f64 {
  let floor = x.floor();
  if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
  let (y, m) = (date.year(), date.month());
  let first_of_next = if m == 12 {
    NaiveDate::from_ymd_opt(y + 1, 1, 1)
  } else {
    NaiveDate::from_ymd_opt(y, m + 1, 1)
  };
  first_of_next
    .and_then(|d| d.pred_opt())
    .map_or(30, |d| d.day())
}

/// Normalise any date to the first day of its month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// One professional-tax slab: applies when gross ≤ `limit` (`None` is
/// unbounded).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PtSlab {
  pub limit: Option<f64>,
  pub tax:   f64,
}

/// Statutory constants. Defaults are the current PF/ESIC/PT figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollRules {
  /// Used when the operator does not specify a basic percentage.
  pub default_basic_percent: f64,
  /// HRA as a fraction of Basic.
  pub hra_ratio:             f64,
  pub pf_rate:               f64,
  /// PF is computed on Basic capped at this wage.
  pub pf_wage_ceiling:       f64,
  pub esic_rate:             f64,
  /// ESIC applies only while gross ≤ this amount.
  pub esic_gross_limit:      f64,
  /// Checked in order; the first slab whose limit covers gross wins.
  pub pt_slabs:              Vec<PtSlab>,
}

impl Default for PayrollRules {
  fn default() -> Self {
    Self {
      default_basic_percent: 50.0,
      hra_ratio:             0.5,
      pf_rate:               0.12,
      pf_wage_ceiling:       15_000.0,
      esic_rate:             0.0075,
      esic_gross_limit:      21_000.0,
      pt_slabs:              vec![
        PtSlab { limit: Some(7_500.0), tax: 0.0 },
        PtSlab { limit: Some(10_000.0), tax: 175.0 },
        PtSlab { limit: None, tax: 200.0 },
      ],
    }
  }
}

impl PayrollRules {
  pub fn professional_tax(&self, gross: f64) -> f64 {
    self
      .pt_slabs
      .iter()
      .find(|slab| slab.limit.is_none_or(|limit| gross <= limit))
      .map_or(0.0, |slab| slab.tax)
  }

  pub fn provident_fund(&self, basic: f64) -> f64 {
    round_half_up(basic.min(self.pf_wage_ceiling) * self.pf_rate)
  }

  pub fn esic(&self, gross: f64) -> f64 {
    if gross <= self.esic_gross_limit {
      (gross * self.esic_rate).ceil()
    } else {
      0.0
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CtcMode {
  Yearly,
  Monthly,
}

fn enabled() -> bool { true }

/// Operator inputs for one month's salary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayrollInput {
  pub ctc_value:           f64,
  pub ctc_mode:            CtcMode,
  /// Basic as a percentage (0–100) of monthly CTC.
  pub basic_percent:       f64,
  pub paid_days:           f64,
  pub total_days_in_month: f64,
  #[serde(default = "enabled")]
  pub pf_enabled:          bool,
  #[serde(default = "enabled")]
  pub esic_enabled:        bool,
  #[serde(default = "enabled")]
  pub pt_enabled:          bool,
}

impl PayrollInput {
  /// Reject inputs the calculator would turn into `NaN` or nonsense.
  pub fn validate(&self) -> Result<()> {
    let bad = |msg: String| Err(Error::InvalidPayrollInput(msg));

    for (name, v) in [
      ("ctc_value", self.ctc_value),
      ("basic_percent", self.basic_percent),
      ("paid_days", self.paid_days),
      ("total_days_in_month", self.total_days_in_month),
    ] {
      if !v.is_finite() || v < 0.0 {
        return bad(format!("{name} must be a non-negative number, got {v}"));
      }
    }
    if self.basic_percent > 100.0 {
      return bad(format!(
        "basic_percent must be at most 100, got {}",
        self.basic_percent
      ));
    }
    if self.total_days_in_month == 0.0 || self.total_days_in_month > 31.0 {
      return bad(format!(
        "total_days_in_month must be between 1 and 31, got {}",
        self.total_days_in_month
      ));
    }
    if self.paid_days > self.total_days_in_month {
      return bad(format!(
        "paid_days ({}) exceeds total_days_in_month ({})",
        self.paid_days, self.total_days_in_month
      ));
    }
    Ok(())
  }
}

/// Manual, operator-entered amounts applied as-is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Adjustments {
  pub incentive: f64,
  pub arrears:   f64,
  pub tds:       f64,
  pub advance:   f64,
}

impl Adjustments {
  pub fn validate(&self) -> Result<()> {
    for (name, v) in [
      ("incentive", self.incentive),
      ("arrears", self.arrears),
      ("tds", self.tds),
      ("advance", self.advance),
    ] {
      if !v.is_finite() || v < 0.0 {
        return Err(Error::InvalidPayrollInput(format!(
          "{name} must be a non-negative number, got {v}"
        )));
      }
    }
    Ok(())
  }
}

// ─── Calculation ─────────────────────────────────────────────────────────────

/// Every derived figure of one month's salary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SalaryBreakdown {
  pub monthly_ctc:      f64,
  pub proration:        f64,
  pub master_basic:     f64,
  pub master_hra:       f64,
  pub master_special:   f64,
  pub basic:            f64,
  pub hra:              f64,
  pub special:          f64,
  pub incentive:        f64,
  pub arrears:          f64,
  /// Basic + HRA + Special; the base for ESIC and PT.
  pub gross:            f64,
  pub pf:               f64,
  pub esic:             f64,
  pub professional_tax: f64,
  pub tds:              f64,
  pub advance:          f64,
  pub gross_earnings:   f64,
  pub total_deductions: f64,
  pub net_pay:          f64,
}

/// Compute a month's salary. Deterministic and side-effect free.
pub fn calculate(
  input: &PayrollInput,
  adjustments: &Adjustments,
  rules: &PayrollRules,
) -> SalaryBreakdown {
  let monthly_ctc = match input.ctc_mode {
    CtcMode::Yearly => input.ctc_value / 12.0,
    CtcMode::Monthly => input.ctc_value,
  };
  let proration = if input.total_days_in_month > 0.0 {
    input.paid_days / input.total_days_in_month
  } else {
    0.0
  };

  let master_basic = round_half_up(monthly_ctc * input.basic_percent / 100.0);
  let basic = round_half_up(master_basic * proration);

  let master_hra = round_half_up(master_basic * rules.hra_ratio);
  let hra = round_half_up(master_hra * proration);

  // Special absorbs the remainder so the masters sum to the monthly CTC.
  let master_special = round_half_up(monthly_ctc) - master_basic - master_hra;
  let special = round_half_up(master_special * proration);

  let gross = basic + hra + special;

  let pf = if input.pf_enabled { rules.provident_fund(basic) } else { 0.0 };
  let esic = if input.esic_enabled { rules.esic(gross) } else { 0.0 };
  let professional_tax = if input.pt_enabled {
    rules.professional_tax(gross)
  } else {
    0.0
  };

  let Adjustments { incentive, arrears, tds, advance } = *adjustments;

  let gross_earnings = gross + incentive + arrears;
  let total_deductions = pf + esic + professional_tax + tds + advance;

  SalaryBreakdown {
    monthly_ctc,
    proration,
    master_basic,
    master_hra,
    master_special,
    basic,
    hra,
    special,
    incentive,
    arrears,
    gross,
    pf,
    esic,
    professional_tax,
    tds,
    advance,
    gross_earnings,
    total_deductions,
    net_pay: gross_earnings - total_deductions,
  }
}

// ─── Records and payments ────────────────────────────────────────────────────

/// Convert a computed rupee figure to an exact amount in paise precision.
/// Non-finite figures (never persisted, see [`PayrollInput::validate`]) map
/// to zero.
pub fn to_money(amount: f64) -> Decimal {
  Decimal::try_from(amount).map_or(Decimal::ZERO, |d| d.round_dp(2))
}

/// One disbursement against a payroll record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payment {
  /// Rupees, at most two decimal places.
  pub amount:  Decimal,
  pub paid_on: NaiveDate,
  #[serde(default)]
  pub note:    Option<String>,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
  Unpaid,
  PartiallyPaid,
  Paid,
}

/// A saved monthly salary (`payroll` collection).
///
/// Append-only: saving again for the same month creates a new record. Only
/// `payments` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayrollRecord {
  pub id:          String,
  pub employee_id: String,
  /// First day of the pay month.
  pub month:       NaiveDate,
  pub input:       PayrollInput,
  pub adjustments: Adjustments,
  pub breakdown:   SalaryBreakdown,
  #[serde(default)]
  pub payments:    Vec<Payment>,
  pub created_by:  String,
  pub created_at:  DateTime<Utc>,
}

impl Record for PayrollRecord {
  const COLLECTION: Collection = Collection::Payroll;

  fn id(&self) -> &str { &self.id }
}

impl PayrollRecord {
  /// Net pay as an exact amount; the ledger below never touches `f64`.
  pub fn net_pay(&self) -> Decimal { to_money(self.breakdown.net_pay) }

  pub fn paid_amount(&self) -> Decimal { self.payments.iter().map(|p| p.amount).sum() }

  pub fn balance(&self) -> Decimal { self.net_pay() - self.paid_amount() }

  pub fn payment_status(&self) -> PaymentStatus {
    if self.paid_amount() <= Decimal::ZERO {
      PaymentStatus::Unpaid
    } else if self.balance() > Decimal::ZERO {
      PaymentStatus::PartiallyPaid
    } else {
      PaymentStatus::Paid
    }
  }

  /// Append `payment` after checking it against the outstanding balance.
  pub fn with_payment(&self, payment: Payment) -> Result<Vec<Payment>> {
    if payment.amount <= Decimal::ZERO {
      return Err(Error::InvalidPayrollInput(format!(
        "payment amount must be positive, got {}",
        payment.amount
      )));
    }
    if payment.amount.round_dp(2) != payment.amount {
      return Err(Error::InvalidPayrollInput(format!(
        "payment amount {} has more than two decimal places",
        payment.amount
      )));
    }
    let balance = self.balance();
    if payment.amount > balance {
      return Err(Error::Overpayment { amount: payment.amount, balance });
    }
    let mut payments = self.payments.clone();
    payments.push(payment);
    Ok(payments)
  }
}

/// Input for [`crate::service::payroll::create_payroll`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPayroll {
  pub employee_id: String,
  pub month:       NaiveDate,
  pub input:       PayrollInput,
  #[serde(default)]
  pub adjustments: Adjustments,
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;

  fn input(ctc: f64, mode: CtcMode, paid: f64, total: f64) -> PayrollInput {
    PayrollInput {
      ctc_value: ctc,
      ctc_mode: mode,
      basic_percent: 50.0,
      paid_days: paid,
      total_days_in_month: total,
      pf_enabled: true,
      esic_enabled: true,
      pt_enabled: true,
    }
  }

  #[test]
  fn round_half_up_matches_math_round() {
    assert_eq!(round_half_up(2.5), 3.0);
    assert_eq!(round_half_up(-2.5), -2.0);
    assert_eq!(round_half_up(2.4999), 2.0);
    assert!(round_half_up(f64::NAN).is_nan());
  }

  #[test]
  fn full_attendance_reconstructs_ctc() {
    let rules = PayrollRules::default();
    for (ctc, mode) in [
      (600_000.0, CtcMode::Yearly),
      (437_777.0, CtcMode::Yearly),
      (23_457.0, CtcMode::Monthly),
      (9_999.0, CtcMode::Monthly),
    ] {
      let b = calculate(&input(ctc, mode, 30.0, 30.0), &Adjustments::default(), &rules);
      let sum = b.basic + b.hra + b.special;
      assert!(
        (sum - b.monthly_ctc).abs() <= 2.0,
        "{ctc} {mode}: {sum} vs {}",
        b.monthly_ctc
      );
    }
  }

  #[test]
  fn worked_example_yearly_full_month() {
    let rules = PayrollRules::default();
    let b = calculate(
      &input(600_000.0, CtcMode::Yearly, 30.0, 30.0),
      &Adjustments { incentive: 1_000.0, arrears: 0.0, tds: 500.0, advance: 0.0 },
      &rules,
    );
    assert_eq!(b.monthly_ctc, 50_000.0);
    assert_eq!((b.basic, b.hra, b.special), (25_000.0, 12_500.0, 12_500.0));
    assert_eq!(b.pf, 1_800.0);
    assert_eq!(b.esic, 0.0);
    assert_eq!(b.professional_tax, 200.0);
    assert_eq!(b.gross_earnings, 51_000.0);
    assert_eq!(b.total_deductions, 2_500.0);
    assert_eq!(b.net_pay, 48_500.0);
  }

  #[test]
  fn partial_attendance_prorates_each_component() {
    let rules = PayrollRules::default();
    let b = calculate(
      &input(20_000.0, CtcMode::Monthly, 15.0, 31.0),
      &Adjustments::default(),
      &rules,
    );
    // masters: 10000 / 5000 / 5000, proration 15/31
    assert_eq!(b.basic, 4_839.0);
    assert_eq!(b.hra, 2_419.0);
    assert_eq!(b.special, 2_419.0);
    assert_eq!(b.gross, 9_677.0);
    assert_eq!(b.pf, 581.0);
    assert_eq!(b.esic, 73.0);
    assert_eq!(b.professional_tax, 175.0);
  }

  #[test]
  fn zero_total_days_prorates_to_zero() {
    let b = calculate(
      &input(30_000.0, CtcMode::Monthly, 10.0, 0.0),
      &Adjustments::default(),
      &PayrollRules::default(),
    );
    assert_eq!(b.proration, 0.0);
    assert_eq!(b.gross, 0.0);
  }

  #[test]
  fn pf_is_capped_at_wage_ceiling() {
    assert_eq!(PayrollRules::default().provident_fund(20_000.0), 1_800.0);
    assert_eq!(PayrollRules::default().provident_fund(10_000.0), 1_200.0);
  }

  #[test]
  fn esic_threshold_is_inclusive() {
    let rules = PayrollRules::default();
    assert_eq!(rules.esic(21_000.0), 158.0);
    assert_eq!(rules.esic(21_001.0), 0.0);
  }

  #[test]
  fn professional_tax_slabs() {
    let rules = PayrollRules::default();
    assert_eq!(rules.professional_tax(7_000.0), 0.0);
    assert_eq!(rules.professional_tax(7_500.0), 0.0);
    assert_eq!(rules.professional_tax(9_000.0), 175.0);
    assert_eq!(rules.professional_tax(15_000.0), 200.0);
  }

  #[test]
  fn disabled_deductions_are_zero() {
    let mut i = input(15_000.0, CtcMode::Monthly, 30.0, 30.0);
    i.pf_enabled = false;
    i.esic_enabled = false;
    i.pt_enabled = false;
    let b = calculate(&i, &Adjustments::default(), &PayrollRules::default());
    assert_eq!(b.total_deductions, 0.0);
    assert_eq!(b.net_pay, 15_000.0);
  }

  #[test]
  fn nan_propagates_through_calculator() {
    let b = calculate(
      &input(f64::NAN, CtcMode::Monthly, 30.0, 30.0),
      &Adjustments::default(),
      &PayrollRules::default(),
    );
    assert!(b.net_pay.is_nan());
    assert!(input(f64::NAN, CtcMode::Monthly, 30.0, 30.0).validate().is_err());
  }

  #[test]
  fn validation_rules() {
    assert!(input(1.0, CtcMode::Monthly, 30.0, 30.0).validate().is_ok());
    assert!(input(-1.0, CtcMode::Monthly, 30.0, 30.0).validate().is_err());
    assert!(input(1.0, CtcMode::Monthly, 31.0, 30.0).validate().is_err());
    assert!(input(1.0, CtcMode::Monthly, 0.0, 0.0).validate().is_err());
    let mut i = input(1.0, CtcMode::Monthly, 1.0, 30.0);
    i.basic_percent = 101.0;
    assert!(i.validate().is_err());
  }

  #[test]
  fn month_helpers() {
    let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
    assert_eq!(days_in_month(d(2024, 2, 10)), 29);
    assert_eq!(days_in_month(d(2023, 2, 1)), 28);
    assert_eq!(days_in_month(d(2024, 12, 31)), 31);
    assert_eq!(month_start(d(2024, 5, 17)), d(2024, 5, 1));
  }

  fn record(breakdown_input: PayrollInput, adjustments: Adjustments) -> PayrollRecord {
    PayrollRecord {
      id: "p1".into(),
      employee_id: "e1".into(),
      month: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
      input: breakdown_input,
      adjustments,
      breakdown: calculate(&breakdown_input, &adjustments, &PayrollRules::default()),
      payments: vec![],
      created_by: "hr".into(),
      created_at: Utc::now(),
    }
  }

  fn pay(amount: Decimal) -> Payment {
    Payment { amount, paid_on: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), note: None }
  }

  #[test]
  fn partial_payments_track_balance() {
    let mut record = record(input(20_000.0, CtcMode::Monthly, 30.0, 30.0), Adjustments::default());
    assert_eq!(record.payment_status(), PaymentStatus::Unpaid);
    let net = record.net_pay();

    record.payments = record.with_payment(pay(dec!(5000))).unwrap();
    assert_eq!(record.payment_status(), PaymentStatus::PartiallyPaid);
    assert_eq!(record.balance(), net - dec!(5000));

    let err = record.with_payment(pay(net)).unwrap_err();
    assert!(matches!(err, Error::Overpayment { .. }));

    record.payments = record.with_payment(pay(net - dec!(5000))).unwrap();
    assert_eq!(record.payment_status(), PaymentStatus::Paid);
    assert!(record.with_payment(pay(Decimal::ZERO)).is_err());
  }

  #[test]
  fn paise_payments_settle_exactly() {
    let tiny = PayrollInput {
      ctc_value:           10.0,
      ctc_mode:            CtcMode::Monthly,
      basic_percent:       100.0,
      paid_days:           30.0,
      total_days_in_month: 30.0,
      pf_enabled:          false,
      esic_enabled:        false,
      pt_enabled:          false,
    };
    let mut record = record(tiny, Adjustments::default());
    assert_eq!(record.net_pay(), dec!(10));

    record.payments = record.with_payment(pay(dec!(0.1))).unwrap();
    record.payments = record.with_payment(pay(dec!(2.2))).unwrap();
    assert_eq!(record.balance(), dec!(7.7));
    assert_eq!(record.payment_status(), PaymentStatus::PartiallyPaid);

    record.payments = record.with_payment(pay(dec!(7.7))).unwrap();
    assert_eq!(record.balance(), Decimal::ZERO);
    assert_eq!(record.payment_status(), PaymentStatus::Paid);
  }

  #[test]
  fn sub_paise_payments_are_rejected() {
    let record = record(input(20_000.0, CtcMode::Monthly, 30.0, 30.0), Adjustments::default());
    assert!(matches!(
      record.with_payment(pay(dec!(0.005))),
      Err(Error::InvalidPayrollInput(_))
    ));
  }

  #[test]
  fn money_conversion_keeps_paise() {
    assert_eq!(to_money(48_500.0), dec!(48500));
    assert_eq!(to_money(0.1 + 0.2), dec!(0.3));
    assert_eq!(to_money(f64::NAN), Decimal::ZERO);
  }
}
