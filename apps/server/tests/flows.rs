mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{number, test_app};

#[tokio::test]
async fn budget_income_payment_and_attribution_flow() {
    let app = test_app().await;
    let token = app.register("Rivera", "ana@example.com").await;

    let (status, needs) = app
        .post(
            "/api/budget-categories",
            &token,
            json!({ "name": "Needs", "targetPercentage": 50 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post(
            "/api/budget-categories",
            &token,
            json!({ "name": "Wants", "targetPercentage": 30 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // 50 + 30 + 30 > 100
    let (status, body) = app
        .post(
            "/api/budget-categories",
            &token,
            json!({ "name": "Savings", "targetPercentage": 30 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let (status, summary) = app.get("/api/budget-categories/summary", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(number(&summary["totalPercentage"]), 80.0);
    assert_eq!(summary["categoryCount"], 2);

    let (status, income) = app
        .post(
            "/api/income-events",
            &token,
            json!({
                "name": "Paycheck",
                "source": "Employer",
                "amount": 1000,
                "scheduledDate": "2026-01-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let income_id = income["id"].as_str().unwrap().to_string();

    let (status, allocations) = app
        .post(
            &format!("/api/income-events/{income_id}/allocations"),
            &token,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let allocations = allocations.as_array().unwrap();
    assert_eq!(allocations.len(), 2);
    let needs_line = allocations
        .iter()
        .find(|a| a["budgetCategoryId"] == needs["id"])
        .unwrap();
    assert_eq!(number(&needs_line["amount"]), 500.0);

    let (status, payment) = app
        .post(
            "/api/payments",
            &token,
            json!({
                "payee": "Landlord",
                "amount": 400,
                "dueDate": "2026-01-05",
                "budgetCategoryId": needs["id"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let payment_id = payment["id"].as_str().unwrap().to_string();

    let (status, attribution) = app
        .post(
            &format!("/api/payments/{payment_id}/attributions"),
            &token,
            json!({ "incomeEventId": income_id, "amount": 300 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(attribution["attributionType"], "MANUAL");

    // Only 100 of the payment is left unfunded
    let (status, _) = app
        .post(
            &format!("/api/payments/{payment_id}/attributions"),
            &token,
            json!({ "incomeEventId": income_id, "amount": 150 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, funding) = app
        .get(&format!("/api/payments/{payment_id}/funding"), &token)
        .await;
    assert_eq!(number(&funding["attributed"]), 300.0);
    assert_eq!(number(&funding["remaining"]), 100.0);
    assert_eq!(funding["isFullyFunded"], false);

    let (status, _) = app
        .post(
            &format!("/api/payments/{payment_id}/auto-attribute"),
            &token,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, funding) = app
        .get(&format!("/api/payments/{payment_id}/funding"), &token)
        .await;
    assert_eq!(number(&funding["attributed"]), 400.0);
    assert_eq!(funding["isFullyFunded"], true);

    let (_, income) = app
        .get(&format!("/api/income-events/{income_id}"), &token)
        .await;
    assert_eq!(number(&income["allocatedAmount"]), 400.0);
    assert_eq!(number(&income["remainingAmount"]), 600.0);

    // Income that funds payments cannot be deleted
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/income-events/{income_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, outcome) = app
        .send(
            Method::POST,
            &format!("/api/payments/{payment_id}/mark-paid"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["payment"]["status"], "PAID");
    assert!(outcome["next"].is_null());

    // Paid payments are frozen
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/payments/{payment_id}"),
            Some(&token),
            Some(json!({ "amount": 450 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn recurring_payment_creates_next_occurrence() {
    let app = test_app().await;
    let token = app.register("Rivera", "ana@example.com").await;

    let (_, payment) = app
        .post(
            "/api/payments",
            &token,
            json!({
                "payee": "Power company",
                "amount": 80.5,
                "dueDate": "2025-01-31",
                "frequency": "MONTHLY",
            }),
        )
        .await;
    let payment_id = payment["id"].as_str().unwrap();

    let (status, outcome) = app
        .post(
            &format!("/api/payments/{payment_id}/mark-paid"),
            &token,
            json!({ "paidDate": "2025-01-30", "paidAmount": 79.99 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["payment"]["paidDate"], "2025-01-30");
    assert_eq!(outcome["next"]["dueDate"], "2025-02-28");
    assert_eq!(outcome["next"]["status"], "SCHEDULED");

    let (_, payments) = app.get("/api/payments?status=SCHEDULED", &token).await;
    assert_eq!(payments.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn viewers_can_read_but_not_write() {
    let app = test_app().await;
    let admin = app.register("Rivera", "ana@example.com").await;

    let (status, member) = app
        .post(
            "/api/families/members",
            &admin,
            json!({
                "email": "kid@example.com",
                "name": "Kid",
                "role": "VIEWER",
                "password": "viewer-pass-1",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["role"], "VIEWER");

    let (status, session) = app.login("kid@example.com", "viewer-pass-1").await;
    assert_eq!(status, StatusCode::OK);
    let viewer = session["accessToken"].as_str().unwrap();

    let (status, _) = app.get("/api/payments", viewer).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/dashboard", viewer).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/api/payments",
            viewer,
            json!({ "payee": "Toy store", "amount": 20, "dueDate": "2026-02-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 403);

    let (status, _) = app
        .post(
            "/api/families/members",
            viewer,
            json!({
                "email": "friend@example.com",
                "name": "Friend",
                "role": "ADMIN",
                "password": "friend-pass-1",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Removing the member revokes their token immediately
    let member_id = member["id"].as_str().unwrap();
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/families/members/{member_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get("/api/payments", viewer).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn families_cannot_see_each_other() {
    let app = test_app().await;
    let first = app.register("Rivera", "ana@example.com").await;
    let second = app.register("Okafor", "chidi@example.com").await;

    let (_, payment) = app
        .post(
            "/api/payments",
            &first,
            json!({ "payee": "Landlord", "amount": 900, "dueDate": "2026-03-01" }),
        )
        .await;
    let payment_id = payment["id"].as_str().unwrap();

    let (status, body) = app
        .get(&format!("/api/payments/{payment_id}"), &second)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);

    let (_, payments) = app.get("/api/payments", &second).await;
    assert_eq!(payments.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let app = test_app().await;
    let token = app.register("Rivera", "ana@example.com").await;

    let (status, body) = app
        .post(
            "/api/payments",
            &token,
            json!({ "payee": "Landlord", "amount": -5, "dueDate": "2026-03-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, _) = app
        .post(
            "/api/budget-categories",
            &token,
            json!({ "name": "Everything", "targetPercentage": 120 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Amounts above one trillion are refused before any arithmetic
    let (status, body) = app
        .post(
            "/api/income-events",
            &token,
            json!({ "name": "Jackpot", "amount": 10_000_000_000_000u64, "scheduledDate": "2026-03-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, _) = app
        .post(
            "/api/bank-accounts",
            &token,
            json!({ "name": "Card", "accountType": "CREDIT", "currentBalance": -10_000_000_000_000i64 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, income) = app
        .post(
            "/api/income-events",
            &token,
            json!({ "name": "Bonus", "amount": 100, "scheduledDate": "2026-03-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // One-off income has no future occurrences
    let income_id = income["id"].as_str().unwrap();
    let (status, _) = app
        .post(
            &format!("/api/income-events/{income_id}/generate-recurring"),
            &token,
            json!({ "occurrences": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/payments/does-not-exist", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn manual_accounts_and_transactions() {
    let app = test_app().await;
    let token = app.register("Rivera", "ana@example.com").await;

    let (status, _) = app
        .post(
            "/api/budget-categories",
            &token,
            json!({ "name": "Groceries", "targetPercentage": 20 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, categories) = app.get("/api/budget-categories", &token).await;
    let category_id = categories[0]["id"].as_str().unwrap().to_string();

    let (status, account) = app
        .post(
            "/api/bank-accounts",
            &token,
            json!({ "name": "Checking", "accountType": "CHECKING", "currentBalance": 1500 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(account["currency"], "USD");
    let account_id = account["id"].as_str().unwrap().to_string();

    let (status, transaction) = app
        .post(
            "/api/transactions",
            &token,
            json!({
                "bankAccountId": account_id,
                "amount": -42.17,
                "transactionDate": "2026-02-03",
                "merchantName": "Corner Market",
                "description": "Weekly groceries",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let transaction_id = transaction["id"].as_str().unwrap().to_string();

    let (status, count) = app
        .post(
            "/api/transactions/bulk-categorize",
            &token,
            json!({ "transactionIds": [transaction_id], "budgetCategoryId": category_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["count"], 1);

    let (status, page) = app
        .get("/api/transactions?search=corner&limit=10", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["transactions"][0]["budgetCategoryId"], category_id.as_str());

    // No aggregation provider is configured in tests
    let (status, _) = app
        .post("/api/bank-accounts/link-token", &token, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/bank-accounts/{account_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn reports_generate_and_export() {
    let app = test_app().await;
    let token = app.register("Rivera", "ana@example.com").await;

    let (status, report) = app
        .post(
            "/api/reports/generate",
            &token,
            json!({
                "reportType": "CASH_FLOW",
                "startDate": "2026-01-01",
                "endDate": "2026-03-31",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let report_id = report["id"].as_str().unwrap();

    let (status, csv) = app
        .get(&format!("/api/reports/{report_id}/export?format=csv"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(csv.as_str().unwrap().starts_with("month,income_received"));

    let (status, schedule) = app
        .post(
            "/api/reports/scheduled",
            &token,
            json!({ "name": "Monthly cash flow", "reportType": "CASH_FLOW", "frequency": "MONTHLY" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let schedule_id = schedule["id"].as_str().unwrap();
    let next_run = schedule["nextRunDate"].clone();

    let (status, _) = app
        .post(
            &format!("/api/reports/scheduled/{schedule_id}/run"),
            &token,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, reports) = app.get("/api/reports", &token).await;
    assert_eq!(reports.as_array().unwrap().len(), 2);
    let (_, schedule) = app
        .get(&format!("/api/reports/scheduled/{schedule_id}"), &token)
        .await;
    assert_eq!(schedule["nextRunDate"], next_run);
    assert!(!schedule["lastRunAt"].is_null());
}
