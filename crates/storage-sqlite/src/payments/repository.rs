use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use kgiq_core::payments::{
    check_payment_update, next_occurrence, plan_payment_transition, NewPayment, Payment,
    PaymentFilter, PaymentRepositoryTrait, PaymentStatus, PaymentTransition,
    PaymentTransitionOutcome, PaymentUpdate,
};
use kgiq_core::Result;

use super::model::PaymentDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{OptionalRow, StorageError};
use crate::schema::{payment_attributions, payments};
use crate::utils::{chunk_for_sqlite, sum_by_key};

pub struct PaymentRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PaymentRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn with_attributions(conn: &mut SqliteConnection, rows: Vec<PaymentDB>) -> Result<Vec<Payment>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut pairs = Vec::new();
    for chunk in chunk_for_sqlite(&ids) {
        pairs.extend(
            payment_attributions::table
                .filter(payment_attributions::payment_id.eq_any(chunk))
                .select((payment_attributions::payment_id, payment_attributions::amount))
                .load::<(String, String)>(conn)
                .map_err(StorageError::from)?,
        );
    }
    let totals = sum_by_key(pairs, "attribution amount");
    Ok(rows
        .into_iter()
        .map(|row| {
            let attributed = totals.get(&row.id).copied().unwrap_or(Decimal::ZERO);
            Payment::from(row).with_attributed(attributed)
        })
        .collect())
}

/// Loads one payment of the family with its attributed total.
pub(crate) fn load_payment(
    conn: &mut SqliteConnection,
    family: &str,
    payment_id: &str,
) -> Result<Payment> {
    let row = payments::table
        .filter(payments::id.eq(payment_id))
        .filter(payments::family_id.eq(family))
        .first::<PaymentDB>(conn)
        .or_not_found("Payment", payment_id)?;
    with_attributions(conn, vec![row])?
        .pop()
        .ok_or_else(|| kgiq_core::Error::not_found("Payment", payment_id))
}

fn new_row(family: &str, payment: NewPayment, previous_payment_id: Option<String>) -> PaymentDB {
    let now = Utc::now().naive_utc();
    PaymentDB {
        id: Uuid::new_v4().to_string(),
        family_id: family.to_string(),
        payee: payment.payee.trim().to_string(),
        amount: payment.amount.to_string(),
        due_date: payment.due_date,
        frequency: payment.frequency.as_str().to_string(),
        status: PaymentStatus::Scheduled.as_str().to_string(),
        paid_date: None,
        paid_amount: None,
        budget_category_id: payment.budget_category_id,
        auto_pay: payment.auto_pay,
        notes: payment.notes,
        previous_payment_id,
        created_at: now,
        updated_at: now,
    }
}

/// A re-paid payment must not schedule its follow-up twice.
fn occurrence_exists(conn: &mut SqliteConnection, family: &str, payment_id: &str) -> Result<bool> {
    let count: i64 = payments::table
        .filter(payments::family_id.eq(family))
        .filter(payments::previous_payment_id.eq(payment_id))
        .filter(payments::status.ne(PaymentStatus::Cancelled.as_str()))
        .count()
        .get_result(conn)
        .map_err(StorageError::from)?;
    Ok(count > 0)
}

#[async_trait]
impl PaymentRepositoryTrait for PaymentRepository {
    fn list(&self, family_id: &str, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = payments::table
            .filter(payments::family_id.eq(family_id))
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(payments::status.eq(status.as_str()));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(payments::due_date.ge(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(payments::due_date.le(end));
        }
        if let Some(category) = &filter.budget_category_id {
            query = query.filter(payments::budget_category_id.eq(category.clone()));
        }
        query = query.order((payments::due_date.asc(), payments::created_at.asc()));
        if let Some(limit) = filter.limit {
            query = query.limit(limit).offset(filter.offset.unwrap_or(0).max(0));
        }
        let rows = query
            .load::<PaymentDB>(&mut conn)
            .map_err(StorageError::from)?;
        with_attributions(&mut conn, rows)
    }

    fn get(&self, family_id: &str, payment_id: &str) -> Result<Payment> {
        let mut conn = get_connection(&self.pool)?;
        load_payment(&mut conn, family_id, payment_id)
    }

    async fn create(&self, family_id: &str, payment: NewPayment) -> Result<Payment> {
        let row = new_row(family_id, payment, None);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Payment> {
                diesel::insert_into(payments::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(Payment::from(row))
            })
            .await
    }

    async fn update(
        &self,
        family_id: &str,
        payment_id: &str,
        update: PaymentUpdate,
        today: NaiveDate,
    ) -> Result<Payment> {
        let family_id = family_id.to_string();
        let payment_id = payment_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Payment> {
                let current = load_payment(conn, &family_id, &payment_id)?;
                check_payment_update(&current, &update)?;

                let due_date = update.due_date.unwrap_or(current.due_date);
                let status = PaymentStatus::open_for(due_date, today);

                let payee = update
                    .payee
                    .map(|p| p.trim().to_string())
                    .unwrap_or(current.payee);
                let category = match update.budget_category_id {
                    Some(value) => value,
                    None => current.budget_category_id,
                };
                diesel::update(payments::table.find(&payment_id))
                    .set((
                        payments::payee.eq(payee),
                        payments::amount.eq(update.amount.unwrap_or(current.amount).to_string()),
                        payments::due_date.eq(due_date),
                        payments::status.eq(status.as_str()),
                        payments::frequency
                            .eq(update.frequency.unwrap_or(current.frequency).as_str()),
                        payments::budget_category_id.eq(category),
                        payments::auto_pay.eq(update.auto_pay.unwrap_or(current.auto_pay)),
                        payments::notes.eq(update.notes.or(current.notes)),
                        payments::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                load_payment(conn, &family_id, &payment_id)
            })
            .await
    }

    async fn delete(&self, family_id: &str, payment_id: &str) -> Result<()> {
        let family_id = family_id.to_string();
        let payment_id = payment_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                load_payment(conn, &family_id, &payment_id)?;
                diesel::delete(
                    payment_attributions::table
                        .filter(payment_attributions::payment_id.eq(&payment_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                diesel::delete(payments::table.find(&payment_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn transition(
        &self,
        family_id: &str,
        payment_id: &str,
        transition: PaymentTransition,
    ) -> Result<PaymentTransitionOutcome> {
        let family_id = family_id.to_string();
        let payment_id = payment_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PaymentTransitionOutcome> {
                let current = load_payment(conn, &family_id, &payment_id)?;
                let patch = plan_payment_transition(&current, &transition)?;

                diesel::update(payments::table.find(&payment_id))
                    .set((
                        payments::status.eq(patch.status.as_str()),
                        payments::paid_date.eq(patch.paid_date),
                        payments::paid_amount.eq(patch.paid_amount.map(|a| a.to_string())),
                        payments::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let next = match (&transition, next_occurrence(&current)) {
                    (PaymentTransition::Pay { .. }, Some(follow_up))
                        if !occurrence_exists(conn, &family_id, &payment_id)? =>
                    {
                        let row = new_row(&family_id, follow_up, Some(payment_id.clone()));
                        diesel::insert_into(payments::table)
                            .values(&row)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        debug!("Scheduled next occurrence {} of payment {}", row.id, payment_id);
                        Some(Payment::from(row))
                    }
                    _ => None,
                };

                Ok(PaymentTransitionOutcome {
                    payment: load_payment(conn, &family_id, &payment_id)?,
                    next,
                })
            })
            .await
    }

    async fn mark_overdue(&self, family_id: &str, today: NaiveDate) -> Result<usize> {
        let family_id = family_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let now = Utc::now().naive_utc();
                let overdue = diesel::update(
                    payments::table
                        .filter(payments::family_id.eq(&family_id))
                        .filter(payments::status.eq(PaymentStatus::Scheduled.as_str()))
                        .filter(payments::due_date.lt(today)),
                )
                .set((
                    payments::status.eq(PaymentStatus::Overdue.as_str()),
                    payments::updated_at.eq(now),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                let rescheduled = diesel::update(
                    payments::table
                        .filter(payments::family_id.eq(&family_id))
                        .filter(payments::status.eq(PaymentStatus::Overdue.as_str()))
                        .filter(payments::due_date.ge(today)),
                )
                .set((
                    payments::status.eq(PaymentStatus::Scheduled.as_str()),
                    payments::updated_at.eq(now),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(overdue + rescheduled)
            })
            .await
    }
}
