//! Recurrence rules shared by payments, income events and scheduled reports.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::utils::last_day_of_month;


/// How often something repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    #[default]
    Once,
    Daily,
    Weekly,
    Biweekly,
    SemiMonthly,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Once => "ONCE",
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Biweekly => "BIWEEKLY",
            Frequency::SemiMonthly => "SEMI_MONTHLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Quarterly => "QUARTERLY",
            Frequency::Annual => "ANNUAL",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Frequency::Once)
    }

    /// Frequencies accepted for payments and income events.
    pub fn validate_for_cash_flow(&self) -> Result<()> {
        if matches!(self, Frequency::Daily) {
            return Err(Error::invalid_input(
                "DAILY is not a supported payment or income frequency",
            ));
        }
        Ok(())
    }

    /// Frequencies accepted for scheduled reports.
    pub fn validate_for_report(&self) -> Result<()> {
        match self {
            Frequency::Daily | Frequency::Weekly | Frequency::Monthly | Frequency::Quarterly => {
                Ok(())
            }
            other => Err(Error::invalid_input(format!(
                "{} is not a supported report frequency",
                other
            ))),
        }
    }

    /// Date of the `steps`-th occurrence after `anchor`.
    ///
    /// Month based rules are computed from the anchor, not chained, so a
    /// series anchored on the 31st keeps landing on each month's last day.
    /// Returns `None` for `Once` (when `steps > 0`) or on calendar overflow.
    pub fn advance(&self, anchor: NaiveDate, steps: u32) -> Option<NaiveDate> {
        if steps == 0 {
            return Some(anchor);
        }
        match self {
            Frequency::Once => None,
            Frequency::Daily => anchor.checked_add_days(Days::new(steps as u64)),
            Frequency::Weekly => anchor.checked_add_days(Days::new(7 * steps as u64)),
            Frequency::Biweekly => anchor.checked_add_days(Days::new(14 * steps as u64)),
            Frequency::SemiMonthly => {
                let mut date = anchor;
                for _ in 0..steps {
                    date = half_month_step(date)?;
                }
                Some(date)
            }
            Frequency::Monthly => anchor.checked_add_months(Months::new(steps)),
            Frequency::Quarterly => anchor.checked_add_months(Months::new(3 * steps)),
            Frequency::Annual => anchor.checked_add_months(Months::new(12 * steps)),
        }
    }

    pub fn next_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.advance(date, 1)
    }

    /// Start of the period of this frequency's length that ends the day
    /// before `run_date`. Used to pick a scheduled report's window.
    pub fn period_before(&self, run_date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let end = run_date.pred_opt()?;
        let start = match self {
            Frequency::Once | Frequency::Daily => Some(end),
            Frequency::Weekly => run_date.checked_sub_days(Days::new(7)),
            Frequency::Biweekly => run_date.checked_sub_days(Days::new(14)),
            Frequency::SemiMonthly => run_date.checked_sub_days(Days::new(15)),
            Frequency::Monthly => run_date.checked_sub_months(Months::new(1)),
            Frequency::Quarterly => run_date.checked_sub_months(Months::new(3)),
            Frequency::Annual => run_date.checked_sub_months(Months::new(12)),
        }?;
        Some((start, end))
    }
}

fn half_month_step(date: NaiveDate) -> Option<NaiveDate> {
    if date.day() <= 15 {
        let day = (date.day() + 15).min(last_day_of_month(date.year(), date.month()));
        date.with_day(day)
    } else {
        let next = date.with_day(1)?.checked_add_months(Months::new(1))?;
        let day = (date.day() - 15).max(1);
        next.with_day(day.min(last_day_of_month(next.year(), next.month())))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ONCE" => Ok(Frequency::Once),
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "BIWEEKLY" => Ok(Frequency::Biweekly),
            "SEMI_MONTHLY" => Ok(Frequency::SemiMonthly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "QUARTERLY" => Ok(Frequency::Quarterly),
            "ANNUAL" => Ok(Frequency::Annual),
            other => Err(Error::invalid_input(format!("Unknown frequency '{}'", other))),
        }
    }
}
