//! Payroll previews, saved salary records and payment tracking.

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::info;

use super::{ensure_can_view, load_employee};
use crate::{
  Error, Result,
  employee::Employee,
  payroll::{
    Adjustments, NewPayroll, Payment, PayrollInput, PayrollRecord, PayrollRules,
    SalaryBreakdown, calculate, month_start,
  },
  record::{Record, fetch, fetch_all, insert},
  role::Role,
  store::{DocumentStore, Filter, Query},
};

/// Validate and compute without saving. HR and above.
pub fn preview_payroll(
  actor: &Employee,
  input: &PayrollInput,
  adjustments: &Adjustments,
  rules: &PayrollRules,
) -> Result<SalaryBreakdown> {
  actor.role.require(Role::Hr)?;
  input.validate()?;
  adjustments.validate()?;
  Ok(calculate(input, adjustments, rules))
}

/// Compute and append a new payroll record. Earlier records for the same
/// month are left in place.
pub async fn create_payroll<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  rules: &PayrollRules,
  request: NewPayroll,
) -> Result<PayrollRecord> {
  let breakdown = preview_payroll(actor, &request.input, &request.adjustments, rules)?;
  let employee = load_employee(store, &request.employee_id).await?;

  let mut record = PayrollRecord {
    id: String::new(),
    employee_id: employee.id,
    month: month_start(request.month),
    input: request.input,
    adjustments: request.adjustments,
    breakdown,
    payments: Vec::new(),
    created_by: actor.id.clone(),
    created_at: Utc::now(),
  };
  record.id = insert(store, &record).await?;

  info!(
    payroll_id = %record.id,
    employee_id = %record.employee_id,
    month = %record.month.format("%Y-%m"),
    net_pay = record.breakdown.net_pay,
    by = %actor.id,
    "saved payroll"
  );
  Ok(record)
}

/// One record. The employee it belongs to, or any manager.
pub async fn get_payroll<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  id: &str,
) -> Result<PayrollRecord> {
  let record: PayrollRecord = fetch(store, id)
    .await?
    .ok_or_else(|| Error::PayrollNotFound(id.to_owned()))?;
  ensure_can_view(actor, &record.employee_id)?;
  Ok(record)
}

/// Records newest first. Without an employee filter the caller must be a
/// manager; employees may list their own.
pub async fn list_payroll<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  employee_id: Option<&str>,
  month: Option<NaiveDate>,
) -> Result<Vec<PayrollRecord>> {
  let mut query = Query::new(PayrollRecord::COLLECTION);
  match employee_id {
    Some(employee_id) => {
      ensure_can_view(actor, employee_id)?;
      query = query.filter(Filter::equals("employee_id", employee_id));
    }
    None => actor.role.require(Role::Hr)?,
  }
  if let Some(month) = month {
    query = query.filter(Filter::equals("month", month_start(month).to_string()));
  }

  let mut records: Vec<PayrollRecord> = fetch_all(store, &query).await?;
  records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
  Ok(records)
}

/// Record a disbursement. HR and above; only `payments` is written.
///
/// The list is read, extended and written back whole, so two concurrent
/// payments against one record are last-write-wins.
pub async fn record_payment<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  id: &str,
  payment: Payment,
) -> Result<PayrollRecord> {
  actor.role.require(Role::Hr)?;
  let mut record = get_payroll(store, actor, id).await?;
  let amount = payment.amount;
  record.payments = record.with_payment(payment)?;

  store
    .update(
      PayrollRecord::COLLECTION,
      record.id.clone(),
      json!({ "payments": record.payments }),
    )
    .await
    .map_err(Error::store)?;

  info!(
    payroll_id = %record.id,
    %amount,
    balance = %record.balance(),
    status = %record.payment_status(),
    by = %actor.id,
    "recorded payment"
  );
  Ok(record)
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::{
    memory::MemoryStore,
    payroll::{CtcMode, PaymentStatus},
    service::fixtures::*,
  };

  fn request(employee_id: &str, month: NaiveDate) -> NewPayroll {
    NewPayroll {
      employee_id: employee_id.into(),
      month,
      input: PayrollInput {
        ctc_value:           600_000.0,
        ctc_mode:            CtcMode::Yearly,
        basic_percent:       50.0,
        paid_days:           30.0,
        total_days_in_month: 30.0,
        pf_enabled:          true,
        esic_enabled:        true,
        pt_enabled:          true,
      },
      adjustments: Adjustments::default(),
    }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  #[tokio::test]
  async fn create_is_append_only_and_listed_newest_first() {
    let store = MemoryStore::new();
    let hr = seed_employee(&store, "H1", "HR", Role::Hr).await;
    let e = seed_employee(&store, "E1", "Sales", Role::Employee).await;
    let rules = PayrollRules::default();

    let first = create_payroll(&store, &hr, &rules, request(&e.id, date(2024, 6, 15)))
      .await
      .unwrap();
    assert_eq!(first.month, date(2024, 6, 1));
    assert_eq!(first.breakdown.net_pay, 48_000.0);

    let second = create_payroll(&store, &hr, &rules, request(&e.id, date(2024, 6, 1)))
      .await
      .unwrap();
    create_payroll(&store, &hr, &rules, request(&e.id, date(2024, 7, 1)))
      .await
      .unwrap();

    let june = list_payroll(&store, &e, Some(&e.id), Some(date(2024, 6, 30)))
      .await
      .unwrap();
    assert_eq!(june.len(), 2);
    assert!(june.iter().any(|r| r.id == second.id));
    assert!(june[0].created_at >= june[1].created_at);
    assert_eq!(list_payroll(&store, &hr, None, None).await.unwrap().len(), 3);
  }

  #[tokio::test]
  async fn invalid_input_is_not_persisted() {
    let store = MemoryStore::new();
    let hr = seed_employee(&store, "H1", "HR", Role::Hr).await;
    let e = seed_employee(&store, "E1", "Sales", Role::Employee).await;

    let mut bad = request(&e.id, date(2024, 6, 1));
    bad.input.paid_days = 31.0;
    let err = create_payroll(&store, &hr, &PayrollRules::default(), bad)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidPayrollInput(_)));
    assert!(list_payroll(&store, &hr, None, None).await.unwrap().is_empty());

    let err = create_payroll(
      &store,
      &hr,
      &PayrollRules::default(),
      request("ghost", date(2024, 6, 1)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::EmployeeNotFound(_)));
  }

  #[tokio::test]
  async fn payroll_access_is_scoped() {
    let store = MemoryStore::new();
    let hr = seed_employee(&store, "H1", "HR", Role::Hr).await;
    let a = seed_employee(&store, "E1", "Sales", Role::Employee).await;
    let b = seed_employee(&store, "E2", "Sales", Role::Employee).await;
    let rules = PayrollRules::default();

    let record = create_payroll(&store, &hr, &rules, request(&a.id, date(2024, 6, 1)))
      .await
      .unwrap();
    assert!(create_payroll(&store, &a, &rules, request(&a.id, date(2024, 6, 1)))
      .await
      .is_err());
    assert!(get_payroll(&store, &a, &record.id).await.is_ok());
    assert!(get_payroll(&store, &b, &record.id).await.is_err());
    assert!(list_payroll(&store, &b, None, None).await.is_err());
    assert!(matches!(
      get_payroll(&store, &hr, "nope").await,
      Err(Error::PayrollNotFound(_))
    ));
  }

  #[tokio::test]
  async fn payments_update_only_the_payment_list() {
    let store = MemoryStore::new();
    let hr = seed_employee(&store, "H1", "HR", Role::Hr).await;
    let e = seed_employee(&store, "E1", "Sales", Role::Employee).await;
    let record = create_payroll(
      &store,
      &hr,
      &PayrollRules::default(),
      request(&e.id, date(2024, 6, 1)),
    )
    .await
    .unwrap();

    let pay = |amount| Payment { amount, paid_on: date(2024, 7, 1), note: None };
    let updated = record_payment(&store, &hr, &record.id, pay(dec!(20000))).await.unwrap();
    assert_eq!(updated.payment_status(), PaymentStatus::PartiallyPaid);
    assert_eq!(updated.balance(), dec!(28000));

    assert!(matches!(
      record_payment(&store, &hr, &record.id, pay(dec!(30000))).await,
      Err(Error::Overpayment { .. })
    ));
    assert!(record_payment(&store, &e, &record.id, pay(dec!(1))).await.is_err());

    let done = record_payment(&store, &hr, &record.id, pay(dec!(28000))).await.unwrap();
    assert_eq!(done.payment_status(), PaymentStatus::Paid);

    let stored = get_payroll(&store, &hr, &record.id).await.unwrap();
    assert_eq!(stored.payments.len(), 2);
    assert_eq!(stored.breakdown, record.breakdown);
    assert_eq!(stored.created_at, record.created_at);
  }
}
