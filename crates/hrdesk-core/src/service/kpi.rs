//! Reading and saving KPI scorecards.

use chrono::Utc;
use tracing::info;

use super::{ensure_can_view, load_employee, load_library};
use crate::{
  Error, Result,
  employee::Employee,
  kpi::{KpiEntry, KpiPeriod, KpiRecord, Scorecard, build_scorecard, score_entries},
  record::{Record, encode, fetch_all},
  role::Role,
  store::{DocumentStore, Filter, Query, WriteOp},
};

async fn period_records<S: DocumentStore>(
  store: &S,
  employee_id: &str,
  period: &KpiPeriod,
) -> Result<Vec<KpiRecord>> {
  let query = Query::new(KpiRecord::COLLECTION)
    .filter(Filter::equals("employee_id", employee_id))
    .filter(Filter::equals("financial_year", period.financial_year.to_string()))
    .filter(Filter::equals("period_type", period.period_type.to_string()))
    .filter(Filter::equals("time_frame", period.time_frame.as_str()));
  fetch_all(store, &query).await
}

/// The employee's scorecard for one period. Self, or any manager.
pub async fn load_scorecard<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  employee_id: &str,
  period: &KpiPeriod,
) -> Result<Scorecard> {
  ensure_can_view(actor, employee_id)?;
  let employee = load_employee(store, employee_id).await?;
  let library = load_library(store).await?;
  let records = period_records(store, employee_id, period).await?;
  build_scorecard(&employee, &library, period, &records)
}

/// Score a set of KRAs for one period and write every record in one atomic
/// batch. HR and above.
pub async fn save_scorecard<S: DocumentStore>(
  store: &S,
  actor: &Employee,
  employee_id: &str,
  period: &KpiPeriod,
  entries: &[KpiEntry],
) -> Result<Scorecard> {
  actor.role.require(Role::Hr)?;
  let employee = load_employee(store, employee_id).await?;
  let library = load_library(store).await?;

  let records = score_entries(&employee, &library, period, entries, &actor.id, Utc::now())?;
  let ops = records
    .iter()
    .map(|record| {
      Ok(WriteOp::Set {
        collection: KpiRecord::COLLECTION,
        id:         record.id.clone(),
        data:       encode(record)?,
      })
    })
    .collect::<Result<Vec<_>>>()?;
  store.batch_write(ops).await.map_err(Error::store)?;

  info!(
    employee_id,
    financial_year = %period.financial_year,
    period_type = %period.period_type,
    time_frame = %period.time_frame,
    records = records.len(),
    by = %actor.id,
    "saved KPI scorecard"
  );

  let records = period_records(store, employee_id, period).await?;
  build_scorecard(&employee, &library, period, &records)
}
