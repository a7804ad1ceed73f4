//! Utility functions for SQLite storage operations.
//!
//! Money is stored as decimal TEXT and enums as their upper-case names; the
//! helpers here read them back and chunk long `IN (...)` lists.

use log::error;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite limits the number of parameters in a statement (typically 999), so
/// long id lists are split into chunks of this size.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into smaller slices for batch SQLite queries.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Parses a stored amount, logging and falling back to zero when corrupt.
pub fn parse_decimal(value: &str, field_name: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or_else(|e| {
        error!(
            "Failed to parse {} '{}' as Decimal ({}). Falling back to ZERO.",
            field_name, value, e
        );
        Decimal::ZERO
    })
}

pub fn parse_optional_decimal(value: Option<&str>, field_name: &str) -> Option<Decimal> {
    value.map(|v| parse_decimal(v, field_name))
}

/// Parses a stored enum name, logging and falling back to `fallback`.
pub fn parse_enum<T>(value: &str, field_name: &str, fallback: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().unwrap_or_else(|e| {
        error!("Invalid {} '{}' in database: {}", field_name, value, e);
        fallback
    })
}

/// Escape character paired with `like_contains` patterns.
pub const LIKE_ESCAPE: char = '\\';

/// Builds a `%text%` LIKE pattern matching `text` literally.
pub fn like_contains(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Sums `(key, amount)` rows of decimal text per key.
pub fn sum_by_key<I>(rows: I, field_name: &str) -> HashMap<String, Decimal>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut totals = HashMap::new();
    for (key, amount) in rows {
        let total = totals.entry(key).or_insert(Decimal::ZERO);
        *total = total.saturating_add(parse_decimal(&amount, field_name));
    }
    totals
}
