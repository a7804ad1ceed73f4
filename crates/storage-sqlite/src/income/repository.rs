use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use kgiq_core::income::{
    check_income_delete, check_income_update, plan_income_transition, IncomeEvent,
    IncomeEventUpdate, IncomeFilter, IncomeRepositoryTrait, IncomeStatus, IncomeTransition,
    NewIncomeEvent,
};
use kgiq_core::schedule::Frequency;
use kgiq_core::Result;

use super::model::IncomeEventDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{OptionalRow, StorageError};
use crate::schema::{income_events, payment_attributions};
use crate::utils::{chunk_for_sqlite, sum_by_key};

pub struct IncomeRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl IncomeRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Attaches the attributed totals to each event.
fn with_allocations(
    conn: &mut SqliteConnection,
    rows: Vec<IncomeEventDB>,
) -> Result<Vec<IncomeEvent>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut pairs = Vec::new();
    for chunk in chunk_for_sqlite(&ids) {
        pairs.extend(
            payment_attributions::table
                .filter(payment_attributions::income_event_id.eq_any(chunk))
                .select((
                    payment_attributions::income_event_id,
                    payment_attributions::amount,
                ))
                .load::<(String, String)>(conn)
                .map_err(StorageError::from)?,
        );
    }
    let totals = sum_by_key(pairs, "attribution amount");
    Ok(rows
        .into_iter()
        .map(|row| {
            let allocated = totals.get(&row.id).copied().unwrap_or(Decimal::ZERO);
            IncomeEvent::from(row).with_allocated(allocated)
        })
        .collect())
}

/// Loads one event of the family with its attributed total.
pub(crate) fn load_income(
    conn: &mut SqliteConnection,
    family: &str,
    income_id: &str,
) -> Result<IncomeEvent> {
    let row = income_events::table
        .filter(income_events::id.eq(income_id))
        .filter(income_events::family_id.eq(family))
        .first::<IncomeEventDB>(conn)
        .or_not_found("Income event", income_id)?;
    with_allocations(conn, vec![row])?
        .pop()
        .ok_or_else(|| kgiq_core::Error::not_found("Income event", income_id))
}

/// Every non-cancelled event of the family, with attributed totals.
pub(crate) fn load_open_incomes(
    conn: &mut SqliteConnection,
    family: &str,
) -> Result<Vec<IncomeEvent>> {
    let rows = income_events::table
        .filter(income_events::family_id.eq(family))
        .filter(income_events::status.ne(IncomeStatus::Cancelled.as_str()))
        .load::<IncomeEventDB>(conn)
        .map_err(StorageError::from)?;
    with_allocations(conn, rows)
}

fn count_attributions(conn: &mut SqliteConnection, income_id: &str) -> Result<usize> {
    let count: i64 = payment_attributions::table
        .filter(payment_attributions::income_event_id.eq(income_id))
        .count()
        .get_result(conn)
        .map_err(StorageError::from)?;
    Ok(count as usize)
}

fn new_row(family: &str, income: NewIncomeEvent) -> IncomeEventDB {
    let now = Utc::now().naive_utc();
    IncomeEventDB {
        id: Uuid::new_v4().to_string(),
        family_id: family.to_string(),
        name: income.name.trim().to_string(),
        source: income.source,
        amount: income.amount.to_string(),
        scheduled_date: income.scheduled_date,
        frequency: income.frequency.as_str().to_string(),
        status: IncomeStatus::Scheduled.as_str().to_string(),
        actual_date: None,
        actual_amount: None,
        notes: income.notes,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl IncomeRepositoryTrait for IncomeRepository {
    fn list(&self, family_id: &str, filter: &IncomeFilter) -> Result<Vec<IncomeEvent>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = income_events::table
            .filter(income_events::family_id.eq(family_id))
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(income_events::status.eq(status.as_str()));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(income_events::scheduled_date.ge(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(income_events::scheduled_date.le(end));
        }
        query = query.order((
            income_events::scheduled_date.asc(),
            income_events::created_at.asc(),
        ));
        if let Some(limit) = filter.limit {
            query = query.limit(limit).offset(filter.offset.unwrap_or(0).max(0));
        }
        let rows = query
            .load::<IncomeEventDB>(&mut conn)
            .map_err(StorageError::from)?;
        with_allocations(&mut conn, rows)
    }

    fn get(&self, family_id: &str, income_id: &str) -> Result<IncomeEvent> {
        let mut conn = get_connection(&self.pool)?;
        load_income(&mut conn, family_id, income_id)
    }

    async fn create(&self, family_id: &str, income: NewIncomeEvent) -> Result<IncomeEvent> {
        let row = new_row(family_id, income);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<IncomeEvent> {
                diesel::insert_into(income_events::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(IncomeEvent::from(row))
            })
            .await
    }

    async fn create_many(
        &self,
        family_id: &str,
        incomes: Vec<NewIncomeEvent>,
    ) -> Result<Vec<IncomeEvent>> {
        let rows: Vec<IncomeEventDB> = incomes
            .into_iter()
            .map(|income| new_row(family_id, income))
            .collect();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vec<IncomeEvent>> {
                diesel::insert_into(income_events::table)
                    .values(&rows)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(rows.into_iter().map(IncomeEvent::from).collect())
            })
            .await
    }

    async fn update(
        &self,
        family_id: &str,
        income_id: &str,
        update: IncomeEventUpdate,
    ) -> Result<IncomeEvent> {
        let family_id = family_id.to_string();
        let income_id = income_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<IncomeEvent> {
                let current = load_income(conn, &family_id, &income_id)?;
                check_income_update(&current, &update)?;

                let name = update
                    .name
                    .map(|n| n.trim().to_string())
                    .unwrap_or(current.name);
                let frequency: Frequency = update.frequency.unwrap_or(current.frequency);
                diesel::update(income_events::table.find(&income_id))
                    .set((
                        income_events::name.eq(name),
                        income_events::source.eq(update.source.or(current.source)),
                        income_events::amount
                            .eq(update.amount.unwrap_or(current.amount).to_string()),
                        income_events::scheduled_date
                            .eq(update.scheduled_date.unwrap_or(current.scheduled_date)),
                        income_events::frequency.eq(frequency.as_str()),
                        income_events::notes.eq(update.notes.or(current.notes)),
                        income_events::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                load_income(conn, &family_id, &income_id)
            })
            .await
    }

    async fn delete(&self, family_id: &str, income_id: &str) -> Result<()> {
        let family_id = family_id.to_string();
        let income_id = income_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let current = load_income(conn, &family_id, &income_id)?;
                check_income_delete(&current, count_attributions(conn, &income_id)?)?;
                diesel::delete(income_events::table.find(&income_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn transition(
        &self,
        family_id: &str,
        income_id: &str,
        transition: IncomeTransition,
    ) -> Result<IncomeEvent> {
        let family_id = family_id.to_string();
        let income_id = income_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<IncomeEvent> {
                let current = load_income(conn, &family_id, &income_id)?;
                let attribution_count = count_attributions(conn, &income_id)?;
                let patch = plan_income_transition(&current, attribution_count, &transition)?;

                diesel::update(income_events::table.find(&income_id))
                    .set((
                        income_events::status.eq(patch.status.as_str()),
                        income_events::actual_date.eq(patch.actual_date),
                        income_events::actual_amount
                            .eq(patch.actual_amount.map(|a| a.to_string())),
                        income_events::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                load_income(conn, &family_id, &income_id)
            })
            .await
    }
}
