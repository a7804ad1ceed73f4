//! Pure report builders.
//!
//! Inputs are the already-scoped rows of one family; outputs are the payload
//! structs stored as JSON on a generated report.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use super::reports_model::{
    AccountBalanceLine, CashFlowMonth, CashFlowReport, CategorySpending, IncomeAnalysisReport,
    IncomeStatusTotal, NetWorthReport, PayeeTotal, PaymentStatusTotal, PaymentSummaryReport,
    SourceTotal, SpendingByCategoryReport,
};
use crate::bank::{BankAccount, Transaction};
use crate::budget::BudgetCategory;
use crate::income::{IncomeEvent, IncomeStatus};
use crate::payments::{Payment, PaymentStatus};
use crate::utils::{first_of_month, months_between, percent_of, sum_amounts};

const UNCATEGORIZED: &str = "Uncategorized";
const UNSPECIFIED_SOURCE: &str = "Unspecified";

fn in_range(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    date >= start && date <= end
}

pub fn build_cash_flow(
    start: NaiveDate,
    end: NaiveDate,
    incomes: &[IncomeEvent],
    payments: &[Payment],
    transactions: &[Transaction],
) -> CashFlowReport {
    let mut months: BTreeMap<NaiveDate, CashFlowMonth> = months_between(start, end)
        .into_iter()
        .map(|month| {
            (
                month,
                CashFlowMonth {
                    month,
                    ..CashFlowMonth::default()
                },
            )
        })
        .collect();

    for income in incomes
        .iter()
        .filter(|i| i.status == IncomeStatus::Received)
    {
        let date = income.effective_date();
        if in_range(date, start, end) {
            if let Some(row) = months.get_mut(&first_of_month(date)) {
                row.income_received = row
                    .income_received
                    .saturating_add(income.effective_amount());
            }
        }
    }

    for payment in payments.iter().filter(|p| p.status == PaymentStatus::Paid) {
        let date = payment.paid_date.unwrap_or(payment.due_date);
        if in_range(date, start, end) {
            if let Some(row) = months.get_mut(&first_of_month(date)) {
                row.payments_paid = row
                    .payments_paid
                    .saturating_add(payment.paid_amount.unwrap_or(payment.amount));
            }
        }
    }

    for transaction in transactions {
        if !in_range(transaction.transaction_date, start, end) {
            continue;
        }
        if let Some(row) = months.get_mut(&first_of_month(transaction.transaction_date)) {
            if transaction.is_outflow() {
                row.outflow = row.outflow.saturating_add(transaction.amount);
            } else {
                row.inflow = row.inflow.saturating_add(-transaction.amount);
            }
        }
    }

    let months: Vec<CashFlowMonth> = months
        .into_values()
        .map(|mut row| {
            row.net_cash_flow = row.inflow - row.outflow;
            row.net_scheduled = row.income_received - row.payments_paid;
            row
        })
        .collect();

    let total_inflow = sum_amounts(months.iter().map(|m| m.inflow));
    let total_outflow = sum_amounts(months.iter().map(|m| m.outflow));
    CashFlowReport {
        total_income_received: sum_amounts(months.iter().map(|m| m.income_received)),
        total_payments_paid: sum_amounts(months.iter().map(|m| m.payments_paid)),
        total_inflow,
        total_outflow,
        net_cash_flow: total_inflow - total_outflow,
        months,
    }
}

/// Outflow per category, largest first. Inactive categories keep their name.
pub fn build_spending_by_category(
    categories: &[BudgetCategory],
    spent_by_category: &HashMap<Option<String>, Decimal>,
) -> SpendingByCategoryReport {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();
    let total_spent = sum_amounts(spent_by_category.values().copied());

    let mut rows: Vec<CategorySpending> = spent_by_category
        .iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(category_id, amount)| CategorySpending {
            budget_category_id: category_id.clone(),
            name: match category_id {
                Some(id) => names.get(id.as_str()).copied().unwrap_or(UNCATEGORIZED),
                None => UNCATEGORIZED,
            }
            .to_string(),
            amount: *amount,
            share: percent_of(*amount, total_spent),
        })
        .collect();
    rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));

    SpendingByCategoryReport {
        total_spent,
        categories: rows,
    }
}

pub fn build_income_analysis(incomes: &[IncomeEvent]) -> IncomeAnalysisReport {
    let mut by_source: BTreeMap<String, SourceTotal> = BTreeMap::new();
    let mut by_status: BTreeMap<&'static str, IncomeStatusTotal> = BTreeMap::new();
    let mut expected_total = Decimal::ZERO;
    let mut received_total = Decimal::ZERO;
    let mut variance = Decimal::ZERO;

    for income in incomes {
        let status_row = by_status
            .entry(income.status.as_str())
            .or_insert(IncomeStatusTotal {
                status: income.status,
                count: 0,
                amount: Decimal::ZERO,
            });
        status_row.count += 1;
        status_row.amount = status_row.amount.saturating_add(income.effective_amount());

        if income.status == IncomeStatus::Cancelled {
            continue;
        }
        let source = income
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNSPECIFIED_SOURCE)
            .to_string();
        let source_row = by_source.entry(source.clone()).or_insert(SourceTotal {
            source,
            count: 0,
            expected: Decimal::ZERO,
            received: Decimal::ZERO,
        });
        source_row.count += 1;
        source_row.expected = source_row.expected.saturating_add(income.amount);
        expected_total = expected_total.saturating_add(income.amount);

        if income.status == IncomeStatus::Received {
            let received = income.effective_amount();
            source_row.received = source_row.received.saturating_add(received);
            received_total = received_total.saturating_add(received);
            variance = variance.saturating_add(received - income.amount);
        }
    }

    IncomeAnalysisReport {
        expected_total,
        received_total,
        variance,
        by_source: by_source.into_values().collect(),
        by_status: by_status.into_values().collect(),
    }
}

pub fn build_payment_summary(payments: &[Payment]) -> PaymentSummaryReport {
    let mut by_status: BTreeMap<&'static str, PaymentStatusTotal> = BTreeMap::new();
    let mut by_payee: HashMap<String, PayeeTotal> = HashMap::new();
    let mut total_due = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;
    let mut overdue_count = 0;
    let mut overdue_amount = Decimal::ZERO;

    for payment in payments {
        let status_row = by_status
            .entry(payment.status.as_str())
            .or_insert(PaymentStatusTotal {
                status: payment.status,
                count: 0,
                amount: Decimal::ZERO,
            });
        status_row.count += 1;
        status_row.amount = status_row.amount.saturating_add(payment.amount);

        match payment.status {
            PaymentStatus::Cancelled => continue,
            PaymentStatus::Paid => {
                total_paid =
                    total_paid.saturating_add(payment.paid_amount.unwrap_or(payment.amount))
            }
            PaymentStatus::Overdue => {
                overdue_count += 1;
                overdue_amount = overdue_amount.saturating_add(payment.amount);
            }
            PaymentStatus::Scheduled => {}
        }
        total_due = total_due.saturating_add(payment.amount);

        let payee_row = by_payee
            .entry(payment.payee.trim().to_lowercase())
            .or_insert(PayeeTotal {
                payee: payment.payee.trim().to_string(),
                count: 0,
                amount: Decimal::ZERO,
            });
        payee_row.count += 1;
        payee_row.amount = payee_row.amount.saturating_add(payment.amount);
    }

    let mut by_payee: Vec<PayeeTotal> = by_payee.into_values().collect();
    by_payee.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.payee.cmp(&b.payee)));

    PaymentSummaryReport {
        total_due,
        total_paid,
        overdue_count,
        overdue_amount,
        by_status: by_status.into_values().collect(),
        by_payee,
    }
}

/// Liability balances count as positive debt whatever their sign.
pub fn build_net_worth(accounts: &[BankAccount]) -> NetWorthReport {
    let mut assets = Decimal::ZERO;
    let mut liabilities = Decimal::ZERO;
    let lines: Vec<AccountBalanceLine> = accounts
        .iter()
        .filter(|a| a.is_active)
        .map(|account| {
            let is_liability = account.account_type.is_liability();
            if is_liability {
                liabilities = liabilities.saturating_add(account.current_balance.abs());
            } else {
                assets = assets.saturating_add(account.current_balance);
            }
            AccountBalanceLine {
                bank_account_id: account.id.clone(),
                name: account.name.clone(),
                account_type: account.account_type,
                balance: account.current_balance,
                is_liability,
            }
        })
        .collect();

    NetWorthReport {
        assets,
        liabilities,
        net_worth: assets - liabilities,
        accounts: lines,
    }
}
