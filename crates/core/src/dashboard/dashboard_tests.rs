use super::*;
use crate::bank::{AccountType, BankAccount};
use crate::budget::PercentageSummary;
use crate::income::{IncomeEvent, IncomeStatus};
use crate::payments::{Payment, PaymentStatus};
use crate::schedule::Frequency;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn account(account_type: AccountType, balance: Decimal) -> BankAccount {
    let now = Utc::now().naive_utc();
    BankAccount {
        id: uuid::Uuid::new_v4().to_string(),
        family_id: "fam".to_string(),
        connection_id: None,
        provider_account_id: None,
        name: "Account".to_string(),
        institution_name: None,
        account_type,
        mask: None,
        current_balance: balance,
        available_balance: None,
        currency: "USD".to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn payment(amount: Decimal, due: NaiveDate, status: PaymentStatus) -> Payment {
    let now = Utc::now().naive_utc();
    Payment {
        id: uuid::Uuid::new_v4().to_string(),
        family_id: "fam".to_string(),
        payee: "Payee".to_string(),
        amount,
        due_date: due,
        frequency: Frequency::Monthly,
        status,
        paid_date: None,
        paid_amount: None,
        budget_category_id: None,
        auto_pay: false,
        notes: None,
        attributed_amount: Decimal::ZERO,
        remaining_amount: amount,
        created_at: now,
        updated_at: now,
    }
}

fn income(amount: Decimal, date: NaiveDate) -> IncomeEvent {
    let now = Utc::now().naive_utc();
    IncomeEvent {
        id: uuid::Uuid::new_v4().to_string(),
        family_id: "fam".to_string(),
        name: "Paycheck".to_string(),
        source: None,
        amount,
        scheduled_date: date,
        frequency: Frequency::Biweekly,
        status: IncomeStatus::Scheduled,
        actual_date: None,
        actual_amount: None,
        notes: None,
        allocated_amount: Decimal::ZERO,
        remaining_amount: amount,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn summary_totals() {
    let today = d(2024, 6, 10);
    let summary = build_summary(
        today,
        DashboardInputs {
            accounts: vec![
                account(AccountType::Checking, dec!(3200)),
                account(AccountType::Savings, dec!(800)),
                account(AccountType::Credit, dec!(-450)),
            ],
            upcoming_payments: vec![
                payment(dec!(1200), d(2024, 6, 15), PaymentStatus::Scheduled),
                payment(dec!(60.25), d(2024, 6, 20), PaymentStatus::Scheduled),
            ],
            upcoming_income: vec![income(dec!(2100), d(2024, 6, 14))],
            overdue_payments: vec![payment(dec!(45), d(2024, 6, 1), PaymentStatus::Overdue)],
            budget: PercentageSummary {
                total_percentage: dec!(90),
                remaining_percentage: dec!(10),
                is_fully_allocated: false,
                category_count: 3,
            },
            month_to_date_spending: dec!(512.40),
        },
    );

    assert_eq!(summary.as_of, today);
    assert_eq!(summary.total_balance, dec!(4000));
    assert_eq!(summary.net_worth, dec!(3550));
    assert_eq!(summary.upcoming_payments.len(), 2);
    assert_eq!(summary.upcoming_payments_total, dec!(1260.25));
    assert_eq!(summary.upcoming_income_total, dec!(2100));
    assert_eq!(summary.overdue_payment_count, 1);
    assert_eq!(summary.overdue_payment_total, dec!(45));
    assert_eq!(summary.budget.remaining_percentage, dec!(10));
}

#[test]
fn empty_household_is_all_zero() {
    let summary = build_summary(
        d(2024, 6, 10),
        DashboardInputs {
            accounts: Vec::new(),
            upcoming_payments: Vec::new(),
            upcoming_income: Vec::new(),
            overdue_payments: Vec::new(),
            budget: PercentageSummary {
                total_percentage: Decimal::ZERO,
                remaining_percentage: dec!(100),
                is_fully_allocated: false,
                category_count: 0,
            },
            month_to_date_spending: Decimal::ZERO,
        },
    );
    assert_eq!(summary.total_balance, Decimal::ZERO);
    assert_eq!(summary.net_worth, Decimal::ZERO);
    assert_eq!(summary.overdue_payment_count, 0);
}
