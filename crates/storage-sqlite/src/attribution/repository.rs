use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use kgiq_core::attribution::{
    check_attribution_link, check_attribution_update, check_new_attribution,
    order_auto_candidates, plan_auto_attribution, AttributionRepositoryTrait, AttributionType,
    NewAttribution, PaymentAttribution,
};
use kgiq_core::errors::Error;
use kgiq_core::payments::PaymentStatus;
use kgiq_core::Result;

use super::model::PaymentAttributionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{unique_as_conflict, OptionalRow, StorageError};
use crate::income::{load_income, load_open_incomes};
use crate::payments::load_payment;
use crate::schema::payment_attributions;

pub struct AttributionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AttributionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_attribution(
    conn: &mut SqliteConnection,
    family: &str,
    payment_id: &str,
    attribution_id: &str,
) -> Result<PaymentAttributionDB> {
    payment_attributions::table
        .filter(payment_attributions::id.eq(attribution_id))
        .filter(payment_attributions::family_id.eq(family))
        .filter(payment_attributions::payment_id.eq(payment_id))
        .first::<PaymentAttributionDB>(conn)
        .or_not_found("Attribution", attribution_id)
}

fn duplicate_pair() -> String {
    "This income event already funds the payment; update that attribution instead".to_string()
}

#[async_trait]
impl AttributionRepositoryTrait for AttributionRepository {
    fn list_for_payment(
        &self,
        family_id: &str,
        payment_id: &str,
    ) -> Result<Vec<PaymentAttribution>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = payment_attributions::table
            .filter(payment_attributions::family_id.eq(family_id))
            .filter(payment_attributions::payment_id.eq(payment_id))
            .order(payment_attributions::created_at.asc())
            .load::<PaymentAttributionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(PaymentAttribution::from).collect())
    }

    fn list_for_income(
        &self,
        family_id: &str,
        income_event_id: &str,
    ) -> Result<Vec<PaymentAttribution>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = payment_attributions::table
            .filter(payment_attributions::family_id.eq(family_id))
            .filter(payment_attributions::income_event_id.eq(income_event_id))
            .order(payment_attributions::created_at.asc())
            .load::<PaymentAttributionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(PaymentAttribution::from).collect())
    }

    async fn create(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution: NewAttribution,
        attribution_type: AttributionType,
    ) -> Result<PaymentAttribution> {
        let family_id = family_id.to_string();
        let payment_id = payment_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PaymentAttribution> {
                let payment = load_payment(conn, &family_id, &payment_id)?;
                let income = match load_income(conn, &family_id, &attribution.income_event_id) {
                    Err(Error::NotFound(_)) => {
                        return Err(Error::invalid_input(format!(
                            "Income event '{}' does not exist",
                            attribution.income_event_id
                        )))
                    }
                    other => other?,
                };
                check_attribution_link(&payment, &income)?;
                check_new_attribution(
                    payment.amount,
                    payment.attributed_amount,
                    income.effective_amount(),
                    income.allocated_amount,
                    attribution.amount,
                )?;

                let now = Utc::now().naive_utc();
                let row = PaymentAttributionDB {
                    id: Uuid::new_v4().to_string(),
                    family_id,
                    payment_id,
                    income_event_id: income.id,
                    amount: attribution.amount.to_string(),
                    attribution_type: attribution_type.as_str().to_string(),
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(payment_attributions::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(|e| unique_as_conflict(e, duplicate_pair()))?;
                Ok(PaymentAttribution::from(row))
            })
            .await
    }

    async fn update(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution_id: &str,
        amount: Decimal,
    ) -> Result<PaymentAttribution> {
        let family_id = family_id.to_string();
        let payment_id = payment_id.to_string();
        let attribution_id = attribution_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PaymentAttribution> {
                let current = PaymentAttribution::from(load_attribution(
                    conn,
                    &family_id,
                    &payment_id,
                    &attribution_id,
                )?);
                let payment = load_payment(conn, &family_id, &payment_id)?;
                let income = load_income(conn, &family_id, &current.income_event_id)?;
                check_attribution_link(&payment, &income)?;
                check_attribution_update(
                    payment.amount,
                    payment.attributed_amount,
                    income.effective_amount(),
                    income.allocated_amount,
                    current.amount,
                    amount,
                )?;

                diesel::update(payment_attributions::table.find(&attribution_id))
                    .set((
                        payment_attributions::amount.eq(amount.to_string()),
                        payment_attributions::attribution_type
                            .eq(AttributionType::Manual.as_str()),
                        payment_attributions::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                load_attribution(conn, &family_id, &payment_id, &attribution_id)
                    .map(PaymentAttribution::from)
            })
            .await
    }

    async fn delete(
        &self,
        family_id: &str,
        payment_id: &str,
        attribution_id: &str,
    ) -> Result<()> {
        let family_id = family_id.to_string();
        let payment_id = payment_id.to_string();
        let attribution_id = attribution_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                load_attribution(conn, &family_id, &payment_id, &attribution_id)?;
                diesel::delete(payment_attributions::table.find(&attribution_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn auto_attribute(
        &self,
        family_id: &str,
        payment_id: &str,
    ) -> Result<Vec<PaymentAttribution>> {
        let family_id = family_id.to_string();
        let payment_id = payment_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vec<PaymentAttribution>> {
                let payment = load_payment(conn, &family_id, &payment_id)?;
                if payment.status == PaymentStatus::Cancelled {
                    return Err(Error::Conflict(
                        "Cancelled payments cannot be funded".to_string(),
                    ));
                }
                if payment.remaining_amount <= Decimal::ZERO {
                    return Ok(Vec::new());
                }
                let incomes = load_open_incomes(conn, &family_id)?;
                let candidates = order_auto_candidates(payment.due_date, &incomes);
                let draws = plan_auto_attribution(payment.remaining_amount, &candidates);

                let now = Utc::now().naive_utc();
                let mut changed = Vec::with_capacity(draws.len());
                for draw in draws {
                    let existing = payment_attributions::table
                        .filter(payment_attributions::payment_id.eq(&payment_id))
                        .filter(payment_attributions::income_event_id.eq(&draw.income_event_id))
                        .first::<PaymentAttributionDB>(conn)
                        .optional()
                        .map_err(StorageError::from)?;

                    let id = match existing {
                        Some(row) => {
                            let current = PaymentAttribution::from(row);
                            diesel::update(payment_attributions::table.find(&current.id))
                                .set((
                                    payment_attributions::amount
                                        .eq((current.amount + draw.amount).to_string()),
                                    payment_attributions::updated_at.eq(now),
                                ))
                                .execute(conn)
                                .map_err(StorageError::from)?;
                            current.id
                        }
                        None => {
                            let row = PaymentAttributionDB {
                                id: Uuid::new_v4().to_string(),
                                family_id: family_id.clone(),
                                payment_id: payment_id.clone(),
                                income_event_id: draw.income_event_id.clone(),
                                amount: draw.amount.to_string(),
                                attribution_type: AttributionType::Automatic.as_str().to_string(),
                                created_at: now,
                                updated_at: now,
                            };
                            diesel::insert_into(payment_attributions::table)
                                .values(&row)
                                .execute(conn)
                                .map_err(StorageError::from)?;
                            row.id
                        }
                    };
                    debug!(
                        "Drew {} from income {} for payment {}",
                        draw.amount, draw.income_event_id, payment_id
                    );
                    changed.push(
                        payment_attributions::table
                            .find(&id)
                            .first::<PaymentAttributionDB>(conn)
                            .map(PaymentAttribution::from)
                            .map_err(StorageError::from)?,
                    );
                }
                Ok(changed)
            })
            .await
    }
}
