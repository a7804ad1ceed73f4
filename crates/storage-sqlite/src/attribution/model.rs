//! Database model for payment attributions.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use kgiq_core::attribution::{AttributionType, PaymentAttribution};

use crate::utils::{parse_decimal, parse_enum};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::payment_attributions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentAttributionDB {
    pub id: String,
    pub family_id: String,
    pub payment_id: String,
    pub income_event_id: String,
    pub amount: String,
    pub attribution_type: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<PaymentAttributionDB> for PaymentAttribution {
    fn from(db: PaymentAttributionDB) -> Self {
        Self {
            amount: parse_decimal(&db.amount, "amount"),
            attribution_type: parse_enum(
                &db.attribution_type,
                "attribution_type",
                AttributionType::Manual,
            ),
            id: db.id,
            family_id: db.family_id,
            payment_id: db.payment_id,
            income_event_id: db.income_event_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
