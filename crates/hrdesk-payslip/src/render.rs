//! Fixed-width text layout.

use std::fmt::Write as _;

use hrdesk_core::{employee::Employee, payroll::PaymentStatus};
use rust_decimal::Decimal;

use crate::{Error, Payslip, Result, words::amount_in_words};

const WIDTH: usize = 72;
/// Width of one side of the earnings/deductions table, excluding the divider.
const HALF: usize = 34;

// ─── Amount formatting ───────────────────────────────────────────────────────

/// Group digits the Indian way (`12,34,567`).
fn group_indian(digits: &str) -> String {
  if digits.len() <= 3 {
    return digits.to_owned();
  }
  let (head, last3) = digits.split_at(digits.len() - 3);
  let mut out = String::new();
  let mut i = head.len() % 2;
  if i == 1 {
    out.push_str(&head[..1]);
  }
  while i < head.len() {
    if !out.is_empty() {
      out.push(',');
    }
    out.push_str(&head[i..i + 2]);
    i += 2;
  }
  out.push(',');
  out.push_str(last3);
  out
}

/// Group an unsigned `digits.frac` string and prefix the sign.
fn grouped(negative: bool, fixed: &str) -> String {
  let (int, frac) = fixed.split_once('.').unwrap_or((fixed, "00"));
  let sign = if negative && fixed != "0.00" { "-" } else { "" };
  format!("{sign}{}.{frac}", group_indian(int))
}

/// Two decimals with Indian digit grouping, e.g. `1,23,456.00`.
pub fn format_inr(amount: f64) -> Result<String> {
  if !amount.is_finite() {
    return Err(Error::NonFiniteAmount(amount));
  }
  Ok(grouped(amount < 0.0, &format!("{:.2}", amount.abs())))
}

/// [`format_inr`] for ledger amounts, which are always finite.
pub fn format_money(amount: Decimal) -> String {
  grouped(amount.is_sign_negative(), &format!("{:.2}", amount.abs().round_dp(2)))
}

// ─── Blocks ──────────────────────────────────────────────────────────────────

fn rule(out: &mut String, c: char) -> Result<()> {
  writeln!(out, "{}", c.to_string().repeat(WIDTH))?;
  Ok(())
}

fn centered(out: &mut String, text: &str) -> Result<()> {
  writeln!(out, "{text:^w$}", w = WIDTH)?;
  Ok(())
}

fn or_dash(value: Option<&str>) -> &str { value.unwrap_or("-") }

/// Last four digits only.
fn masked_account(employee: &Employee) -> String {
  match &employee.bank_account {
    Some(bank) => {
      let digits: Vec<char> = bank.account_number.chars().collect();
      let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
      format!("{} XXXX{tail}", bank.bank_name)
    }
    None => "-".to_owned(),
  }
}

fn identity(out: &mut String, employee: &Employee) -> Result<()> {
  let pairs = [
    ("Employee Name", employee.name.clone(), "Employee Code", employee.employee_code.clone()),
    ("Department", employee.department.clone(), "Designation", employee.designation.clone()),
    (
      "PAN",
      or_dash(employee.pan.as_deref()).to_owned(),
      "UAN",
      or_dash(employee.uan.as_deref()).to_owned(),
    ),
    (
      "PF Number",
      or_dash(employee.pf_number.as_deref()).to_owned(),
      "Bank A/c",
      masked_account(employee),
    ),
  ];
  for (left_label, left, right_label, right) in pairs {
    writeln!(out, "{left_label:<14}: {left:<20} {right_label:<14}: {right}")?;
  }
  Ok(())
}

fn table_row(out: &mut String, left: (&str, f64), right: (&str, f64)) -> Result<()> {
  let cell = |(label, amount): (&str, f64)| -> Result<String> {
    let amount = format_inr(amount)?;
    Ok(format!("{label:<w$}{amount:>14}", w = HALF - 14))
  };
  writeln!(out, "{} | {}", cell(left)?, cell(right)?)?;
  Ok(())
}

// ─── Payslip ─────────────────────────────────────────────────────────────────

pub(crate) fn render(payslip: &Payslip<'_>) -> Result<String> {
  let Payslip { company, employee, record } = payslip;
  let b = &record.breakdown;
  let mut out = String::new();

  rule(&mut out, '=')?;
  centered(&mut out, &company.name.to_uppercase())?;
  for line in &company.address_lines {
    centered(&mut out, line)?;
  }
  if let Some(gstin) = &company.gstin {
    centered(&mut out, &format!("GSTIN: {gstin}"))?;
  }
  rule(&mut out, '=')?;
  centered(&mut out, &format!("Payslip for {}", record.month.format("%B %Y")))?;
  writeln!(out)?;

  identity(&mut out, employee)?;
  writeln!(
    out,
    "{:<14}: {} / {}",
    "Paid Days", record.input.paid_days, record.input.total_days_in_month
  )?;
  writeln!(out)?;

  rule(&mut out, '-')?;
  writeln!(
    out,
    "{:<w$}{:>14} | {:<w$}{:>14}",
    "Earnings",
    "Amount",
    "Deductions",
    "Amount",
    w = HALF - 14
  )?;
  rule(&mut out, '-')?;
  let rows = [
    (("Basic", b.basic), ("Provident Fund", b.pf)),
    (("HRA", b.hra), ("ESIC", b.esic)),
    (("Special Allowance", b.special), ("Professional Tax", b.professional_tax)),
    (("Incentive", b.incentive), ("TDS", b.tds)),
    (("Arrears", b.arrears), ("Advance", b.advance)),
  ];
  for (left, right) in rows {
    table_row(&mut out, left, right)?;
  }
  rule(&mut out, '-')?;
  table_row(
    &mut out,
    ("Gross Earnings", b.gross_earnings),
    ("Total Deductions", b.total_deductions),
  )?;
  rule(&mut out, '=')?;

  writeln!(out, "Net Pay: Rs. {}", format_inr(b.net_pay)?)?;
  writeln!(out, "({})", amount_in_words(b.net_pay)?)?;
  let status = match record.payment_status() {
    PaymentStatus::Unpaid => "Unpaid".to_owned(),
    PaymentStatus::PartiallyPaid => {
      format!("Partially paid, balance Rs. {}", format_money(record.balance()))
    }
    PaymentStatus::Paid => "Paid".to_owned(),
  };
  writeln!(out, "Payment Status: {status}")?;
  for payment in &record.payments {
    write!(
      out,
      "  {}  Rs. {}",
      payment.paid_on.format("%d %b %Y"),
      format_money(payment.amount)
    )?;
    match &payment.note {
      Some(note) => writeln!(out, "  {note}")?,
      None => writeln!(out)?,
    }
  }
  writeln!(out)?;

  writeln!(out, "{:>w$}", format!("For {}", company.name), w = WIDTH)?;
  writeln!(out)?;
  writeln!(out, "{:>w$}", company.signatory, w = WIDTH)?;
  rule(&mut out, '-')?;
  centered(&mut out, "This is a computer-generated payslip.")?;
  Ok(out)
}
