//! Database model for payments.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;

use kgiq_core::payments::{Payment, PaymentStatus};
use kgiq_core::schedule::Frequency;

use crate::utils::{parse_decimal, parse_enum, parse_optional_decimal};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentDB {
    pub id: String,
    pub family_id: String,
    pub payee: String,
    pub amount: String,
    pub due_date: NaiveDate,
    pub frequency: String,
    pub status: String,
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Option<String>,
    pub budget_category_id: Option<String>,
    pub auto_pay: bool,
    pub notes: Option<String>,
    /// The payment whose settlement scheduled this one.
    pub previous_payment_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<PaymentDB> for Payment {
    fn from(db: PaymentDB) -> Self {
        let payment = Self {
            amount: parse_decimal(&db.amount, "amount"),
            frequency: parse_enum(&db.frequency, "frequency", Frequency::Once),
            status: parse_enum(&db.status, "status", PaymentStatus::Scheduled),
            paid_amount: parse_optional_decimal(db.paid_amount.as_deref(), "paid_amount"),
            id: db.id,
            family_id: db.family_id,
            payee: db.payee,
            due_date: db.due_date,
            paid_date: db.paid_date,
            budget_category_id: db.budget_category_id,
            auto_pay: db.auto_pay,
            notes: db.notes,
            attributed_amount: Decimal::ZERO,
            remaining_amount: Decimal::ZERO,
            created_at: db.created_at,
            updated_at: db.updated_at,
        };
        payment.with_attributed(Decimal::ZERO)
    }
}
