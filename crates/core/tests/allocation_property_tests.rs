//! Property-based tests for the money-splitting rules.
//!
//! Income allocation and automatic attribution must never create or lose
//! cents, whatever amounts and percentages families configure.

use chrono::NaiveDate;
use kgiq_core::attribution::{plan_auto_attribution, IncomeBalance};
use kgiq_core::budget::allocate_income;
use kgiq_core::utils::round_currency;
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Generators
// =============================================================================

/// Amounts between one cent and one hundred thousand.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Up to six categories whose percentages (two decimals) total at most 96%.
fn arb_categories() -> impl Strategy<Value = Vec<(String, Decimal)>> {
    proptest::collection::vec(1i64..=1600, 1..=6).prop_map(|hundredths| {
        hundredths
            .into_iter()
            .enumerate()
            .map(|(i, h)| (format!("cat-{}", i), Decimal::new(h, 2)))
            .collect()
    })
}

fn arb_balances() -> impl Strategy<Value = Vec<IncomeBalance>> {
    proptest::collection::vec(0i64..=500_000, 0..=8).prop_map(|cents| {
        cents
            .into_iter()
            .enumerate()
            .map(|(i, c)| IncomeBalance {
                income_event_id: format!("income-{}", i),
                date: NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap(),
                remaining: Decimal::new(c, 2),
            })
            .collect()
    })
}

fn cent() -> Decimal {
    Decimal::new(1, 2)
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Lines add up to the rounded percentage of the income, never more than
    /// the income itself.
    #[test]
    fn prop_allocation_sums_to_rounded_target(
        amount in arb_amount(),
        categories in arb_categories(),
    ) {
        let lines = allocate_income(amount, &categories).unwrap();
        let total_pct: Decimal = categories.iter().map(|(_, p)| *p).sum();
        let target = round_currency(amount * total_pct / Decimal::ONE_HUNDRED);
        let allocated: Decimal = lines.iter().map(|l| l.amount).sum();

        prop_assert_eq!(allocated, target);
        prop_assert!(allocated <= amount);
    }

    /// Every line stays within one cent of its exact share and keeps the
    /// category order.
    #[test]
    fn prop_allocation_lines_within_a_cent(
        amount in arb_amount(),
        categories in arb_categories(),
    ) {
        let lines = allocate_income(amount, &categories).unwrap();
        prop_assert_eq!(lines.len(), categories.len());

        for (line, (id, pct)) in lines.iter().zip(categories.iter()) {
            prop_assert_eq!(&line.budget_category_id, id);
            prop_assert_eq!(line.amount.normalize().scale() <= 2, true);
            let exact = amount * *pct / Decimal::ONE_HUNDRED;
            prop_assert!((line.amount - exact).abs() < cent());
        }
    }

    /// A full 100% split hands out the whole income.
    #[test]
    fn prop_full_allocation_uses_every_cent(
        amount in arb_amount(),
        split in 1i64..=9999,
    ) {
        let categories = vec![
            ("a".to_string(), Decimal::new(split, 2)),
            ("b".to_string(), Decimal::new(10_000 - split, 2)),
        ];
        let lines = allocate_income(amount, &categories).unwrap();
        let allocated: Decimal = lines.iter().map(|l| l.amount).sum();
        prop_assert_eq!(allocated, amount);
    }

    /// Automatic attribution covers as much as the income can and never
    /// overdraws a single event.
    #[test]
    fn prop_auto_attribution_respects_balances(
        needed in arb_amount(),
        balances in arb_balances(),
    ) {
        let draws = plan_auto_attribution(needed, &balances);
        let drawn: Decimal = draws.iter().map(|d| d.amount).sum();
        let available: Decimal = balances.iter().map(|b| b.remaining).sum();

        prop_assert_eq!(drawn, needed.min(available));
        for draw in &draws {
            prop_assert!(draw.amount > Decimal::ZERO);
            let balance = balances
                .iter()
                .find(|b| b.income_event_id == draw.income_event_id)
                .unwrap();
            prop_assert!(draw.amount <= balance.remaining);
        }
    }
}
