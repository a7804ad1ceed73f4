//! Payment attribution models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributionType {
    #[default]
    Manual,
    Automatic,
}

string_enum!(AttributionType, "attribution type", {
    Manual => "MANUAL",
    Automatic => "AUTOMATIC",
});

/// Records that `amount` of a payment is funded by an income event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAttribution {
    pub id: String,
    pub family_id: String,
    pub payment_id: String,
    pub income_event_id: String,
    pub amount: Decimal,
    pub attribution_type: AttributionType,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttribution {
    pub income_event_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionUpdate {
    pub amount: Decimal,
}

/// What is left to draw from an income event.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeBalance {
    pub income_event_id: String,
    pub date: NaiveDate,
    pub remaining: Decimal,
}

/// One draw planned by automatic attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDraw {
    pub income_event_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundingSummary {
    pub payment_id: String,
    pub amount: Decimal,
    pub attributed: Decimal,
    pub remaining: Decimal,
    pub is_fully_funded: bool,
    pub attributions: Vec<PaymentAttribution>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeBalanceSummary {
    pub income_event_id: String,
    pub amount: Decimal,
    pub allocated: Decimal,
    pub remaining: Decimal,
}
