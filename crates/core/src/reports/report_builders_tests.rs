use super::*;
use crate::bank::{AccountType, BankAccount, Transaction};
use crate::budget::BudgetCategory;
use crate::income::{IncomeEvent, IncomeStatus};
use crate::payments::{Payment, PaymentStatus};
use crate::schedule::Frequency;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn ts() -> NaiveDateTime {
    d(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap()
}

fn income(id: &str, source: Option<&str>, amount: Decimal, date: NaiveDate) -> IncomeEvent {
    IncomeEvent {
        id: id.to_string(),
        family_id: "fam".to_string(),
        name: format!("Income {}", id),
        source: source.map(str::to_string),
        amount,
        scheduled_date: date,
        frequency: Frequency::Once,
        status: IncomeStatus::Scheduled,
        actual_date: None,
        actual_amount: None,
        notes: None,
        allocated_amount: Decimal::ZERO,
        remaining_amount: amount,
        created_at: ts(),
        updated_at: ts(),
    }
}

fn received(mut event: IncomeEvent, date: NaiveDate, amount: Decimal) -> IncomeEvent {
    event.status = IncomeStatus::Received;
    event.actual_date = Some(date);
    event.actual_amount = Some(amount);
    event
}

fn payment(id: &str, payee: &str, amount: Decimal, due: NaiveDate, status: PaymentStatus) -> Payment {
    Payment {
        id: id.to_string(),
        family_id: "fam".to_string(),
        payee: payee.to_string(),
        amount,
        due_date: due,
        frequency: Frequency::Once,
        status,
        paid_date: None,
        paid_amount: None,
        budget_category_id: None,
        auto_pay: false,
        notes: None,
        attributed_amount: Decimal::ZERO,
        remaining_amount: amount,
        created_at: ts(),
        updated_at: ts(),
    }
}

fn transaction(id: &str, amount: Decimal, date: NaiveDate) -> Transaction {
    Transaction {
        id: id.to_string(),
        family_id: "fam".to_string(),
        bank_account_id: "acc".to_string(),
        provider_transaction_id: None,
        amount,
        transaction_date: date,
        merchant_name: None,
        description: "test".to_string(),
        budget_category_id: None,
        pending: false,
        notes: None,
        created_at: ts(),
        updated_at: ts(),
    }
}

fn account(id: &str, account_type: AccountType, balance: Decimal, is_active: bool) -> BankAccount {
    BankAccount {
        id: id.to_string(),
        family_id: "fam".to_string(),
        connection_id: None,
        provider_account_id: None,
        name: format!("Account {}", id),
        institution_name: None,
        account_type,
        mask: None,
        current_balance: balance,
        available_balance: None,
        currency: "USD".to_string(),
        is_active,
        created_at: ts(),
        updated_at: ts(),
    }
}

fn category(id: &str, name: &str) -> BudgetCategory {
    BudgetCategory {
        id: id.to_string(),
        family_id: "fam".to_string(),
        name: name.to_string(),
        target_percentage: dec!(50),
        color: None,
        sort_order: 0,
        is_active: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

// ============================================================================
// Cash flow
// ============================================================================

#[test]
fn cash_flow_buckets_by_actual_month() {
    let incomes = vec![
        // Scheduled in January, received in February.
        received(income("i1", None, dec!(1000), d(2024, 1, 31)), d(2024, 2, 1), dec!(1010)),
        received(income("i2", None, dec!(500), d(2024, 1, 15)), d(2024, 1, 15), dec!(500)),
        // Still scheduled: not counted.
        income("i3", None, dec!(700), d(2024, 1, 20)),
    ];
    let mut paid = payment("p1", "Rent", dec!(900), d(2024, 1, 1), PaymentStatus::Paid);
    paid.paid_date = Some(d(2024, 1, 2));
    paid.paid_amount = Some(dec!(905));
    let payments = vec![
        paid,
        payment("p2", "Power", dec!(80), d(2024, 2, 3), PaymentStatus::Scheduled),
    ];
    let transactions = vec![
        transaction("t1", dec!(42.50), d(2024, 1, 3)),
        transaction("t2", dec!(-2000), d(2024, 2, 1)),
        transaction("t3", dec!(10), d(2024, 3, 1)),
    ];

    let report = build_cash_flow(d(2024, 1, 1), d(2024, 2, 29), &incomes, &payments, &transactions);

    assert_eq!(report.months.len(), 2);
    let jan = &report.months[0];
    assert_eq!(jan.income_received, dec!(500));
    assert_eq!(jan.payments_paid, dec!(905));
    assert_eq!(jan.outflow, dec!(42.50));
    assert_eq!(jan.net_scheduled, dec!(-405));
    let feb = &report.months[1];
    assert_eq!(feb.income_received, dec!(1010));
    assert_eq!(feb.inflow, dec!(2000));
    assert_eq!(feb.net_cash_flow, dec!(2000));
    assert_eq!(report.total_outflow, dec!(42.50));
    assert_eq!(report.net_cash_flow, dec!(1957.50));
}

#[test]
fn cash_flow_of_empty_range_has_zero_months() {
    let report = build_cash_flow(d(2024, 1, 1), d(2024, 1, 31), &[], &[], &[]);
    assert_eq!(report.months.len(), 1);
    assert_eq!(report.net_cash_flow, Decimal::ZERO);
}

// ============================================================================
// Spending, income, payments, net worth
// ============================================================================

#[test]
fn spending_by_category_sorts_and_names_uncategorized() {
    let categories = vec![category("needs", "Needs"), category("wants", "Wants")];
    let mut spent = HashMap::new();
    spent.insert(Some("needs".to_string()), dec!(300));
    spent.insert(Some("wants".to_string()), dec!(100));
    spent.insert(None, dec!(100));
    spent.insert(Some("gone".to_string()), Decimal::ZERO);

    let report = build_spending_by_category(&categories, &spent);

    assert_eq!(report.total_spent, dec!(500));
    assert_eq!(report.categories.len(), 3);
    assert_eq!(report.categories[0].name, "Needs");
    assert_eq!(report.categories[0].share, dec!(60));
    assert_eq!(report.categories[1].name, "Uncategorized");
    assert_eq!(report.categories[1].budget_category_id, None);
    assert_eq!(report.categories[2].name, "Wants");
}

#[test]
fn income_analysis_separates_expected_and_received() {
    let mut cancelled = income("i3", Some("Bonus"), dec!(400), d(2024, 1, 10));
    cancelled.status = IncomeStatus::Cancelled;
    let incomes = vec![
        received(income("i1", Some("Acme"), dec!(1000), d(2024, 1, 1)), d(2024, 1, 1), dec!(950)),
        income("i2", Some("Acme"), dec!(1000), d(2024, 1, 15)),
        cancelled,
        income("i4", None, dec!(50), d(2024, 1, 20)),
    ];

    let report = build_income_analysis(&incomes);

    assert_eq!(report.expected_total, dec!(2050));
    assert_eq!(report.received_total, dec!(950));
    assert_eq!(report.variance, dec!(-50));
    assert_eq!(report.by_source.len(), 2);
    let acme = report.by_source.iter().find(|s| s.source == "Acme").unwrap();
    assert_eq!(acme.count, 2);
    assert_eq!(acme.received, dec!(950));
    assert!(report.by_source.iter().any(|s| s.source == "Unspecified"));
    assert_eq!(report.by_status.len(), 3);
}

#[test]
fn payment_summary_counts_overdue_and_groups_payees() {
    let payments = vec![
        payment("p1", "Rent", dec!(900), d(2024, 1, 1), PaymentStatus::Paid),
        payment("p2", "rent ", dec!(900), d(2024, 2, 1), PaymentStatus::Overdue),
        payment("p3", "Gym", dec!(30), d(2024, 2, 1), PaymentStatus::Cancelled),
        payment("p4", "Power", dec!(80), d(2024, 2, 3), PaymentStatus::Scheduled),
    ];

    let report = build_payment_summary(&payments);

    assert_eq!(report.total_due, dec!(1880));
    assert_eq!(report.total_paid, dec!(900));
    assert_eq!(report.overdue_count, 1);
    assert_eq!(report.overdue_amount, dec!(900));
    assert_eq!(report.by_payee.len(), 2);
    assert_eq!(report.by_payee[0].payee, "Rent");
    assert_eq!(report.by_payee[0].count, 2);
    assert_eq!(report.by_status.len(), 4);
}

#[test]
fn net_worth_subtracts_liabilities_and_skips_inactive() {
    let accounts = vec![
        account("a1", AccountType::Checking, dec!(2500), true),
        account("a2", AccountType::Savings, dec!(10000), true),
        account("a3", AccountType::Credit, dec!(-1200), true),
        account("a4", AccountType::Loan, dec!(5000), true),
        account("a5", AccountType::Savings, dec!(999), false),
    ];

    let report = build_net_worth(&accounts);

    assert_eq!(report.assets, dec!(12500));
    assert_eq!(report.liabilities, dec!(6200));
    assert_eq!(report.net_worth, dec!(6300));
    assert_eq!(report.accounts.len(), 4);
}

// ============================================================================
// Export
// ============================================================================

fn stored(report_type: ReportType, data: serde_json::Value) -> GeneratedReport {
    GeneratedReport {
        id: "r1".to_string(),
        family_id: "fam".to_string(),
        scheduled_report_id: None,
        report_type,
        period_start: d(2024, 1, 1),
        period_end: d(2024, 1, 31),
        data,
        created_at: ts(),
    }
}

#[test]
fn csv_export_writes_header_and_rows() {
    let payload = build_net_worth(&[
        account("a1", AccountType::Checking, dec!(100.50), true),
        account("a2", AccountType::Credit, dec!(20), true),
    ]);
    let report = stored(ReportType::NetWorth, serde_json::to_value(&payload).unwrap());

    let export = export_report(&report, ExportFormat::Csv).unwrap();

    assert_eq!(export.content_type, "text/csv");
    assert_eq!(export.filename, "net_worth_2024-01-01_2024-01-31.csv");
    let lines: Vec<&str> = export.body.lines().collect();
    assert_eq!(lines[0], "bank_account_id,name,account_type,balance");
    assert_eq!(lines[1], "a1,Account a1,CHECKING,100.5");
    assert_eq!(lines.len(), 3);
}

#[test]
fn json_export_contains_payload() {
    let report = stored(
        ReportType::SpendingByCategory,
        serde_json::json!({ "totalSpent": 0, "categories": [] }),
    );
    let export = export_report(&report, ExportFormat::Json).unwrap();
    assert_eq!(export.content_type, "application/json");
    let parsed: serde_json::Value = serde_json::from_str(&export.body).unwrap();
    assert_eq!(parsed["reportType"], "SPENDING_BY_CATEGORY");
    assert_eq!(parsed["data"]["totalSpent"], 0);
}

#[test]
fn csv_export_rejects_mismatched_payload() {
    let report = stored(ReportType::CashFlow, serde_json::json!({ "unexpected": true }));
    assert!(matches!(
        render_csv(&report).unwrap_err(),
        crate::errors::Error::Export(_)
    ));
}

#[test]
fn period_validation() {
    assert!(validate_period(d(2024, 2, 1), d(2024, 1, 1)).is_err());
    assert!(validate_period(d(2024, 1, 1), d(2024, 1, 1)).is_ok());
    assert!(validate_period(d(2010, 1, 1), d(2024, 1, 1)).is_err());
}
