use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::constants::DEFAULT_TIMEZONE;

/// Parses a family's IANA timezone, falling back to the default one.
pub fn family_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        DEFAULT_TIMEZONE
            .parse::<Tz>()
            .unwrap_or(chrono_tz::America::New_York)
    })
}

pub fn is_valid_timezone(name: &str) -> bool {
    name.parse::<Tz>().is_ok()
}

/// The current calendar date in the given family timezone.
///
/// Due dates and income dates are plain dates, so "today" must be taken in
/// the family's zone rather than in UTC.
pub fn today_in(tz_name: &str) -> NaiveDate {
    Utc::now().with_timezone(&family_timezone(tz_name)).date_naive()
}

/// Number of days in the given month.
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Calendar months (as their first day) overlapping `[start, end]`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut months = Vec::new();
    let mut current = first_of_month(start);
    while current <= end {
        months.push(current);
        current = match current.checked_add_months(chrono::Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn last_day_handles_leap_years() {
        assert_eq!(last_day_of_month(2024, 2), 29);
        assert_eq!(last_day_of_month(2023, 2), 28);
        assert_eq!(last_day_of_month(2023, 12), 31);
    }

    #[test]
    fn months_between_spans_partial_months() {
        let months = months_between(d(2024, 1, 20), d(2024, 3, 2));
        assert_eq!(months, vec![d(2024, 1, 1), d(2024, 2, 1), d(2024, 3, 1)]);
        assert!(months_between(d(2024, 3, 1), d(2024, 1, 1)).is_empty());
    }

    #[test]
    fn unknown_timezone_falls_back() {
        assert!(!is_valid_timezone("Mars/Olympus"));
        assert_eq!(family_timezone("Mars/Olympus"), chrono_tz::America::New_York);
        assert_eq!(family_timezone("Europe/Paris"), chrono_tz::Europe::Paris);
    }
}
