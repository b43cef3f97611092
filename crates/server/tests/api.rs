use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerState, router};

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    router(ServerState {
        engine: Arc::new(engine),
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn new_ledger(app: &Router, name: &str) -> String {
    let (status, body) = send(app, Method::POST, "/ledgers", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn expense_debits_and_overdraw_is_409() {
    let app = app().await;
    let ledger = new_ledger(&app, "Main").await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/movements"),
        Some(json!({ "kind": "inflow", "amountMinor": 5000, "occurredOn": "2025-03-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, expense) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/expenses"),
        Some(json!({
            "description": "Paper",
            "amountMinor": 2000,
            "category": "office",
            "date": "2025-03-02"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(expense["movementId"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/expenses"),
        Some(json!({
            "description": "Printer",
            "amountMinor": 5000,
            "category": "office",
            "date": "2025-03-03"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, statement) = send(&app, Method::GET, &format!("/ledgers/{ledger}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(statement["balanceMinor"], 3000);
    assert_eq!(statement["movements"].as_array().unwrap().len(), 2);
    assert_eq!(statement["movements"][1]["runningBalanceMinor"], 3000);
}

#[tokio::test]
async fn invalid_amount_is_422_and_unknown_ledger_is_404() {
    let app = app().await;
    let ledger = new_ledger(&app, "Main").await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/movements"),
        Some(json!({ "kind": "inflow", "amountMinor": 0, "occurredOn": "2025-03-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = send(&app, Method::GET, &format!("/ledgers/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn settlement_records_expense_and_advances() {
    let app = app().await;
    let ledger = new_ledger(&app, "Main").await;
    send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/movements"),
        Some(json!({ "kind": "inflow", "amountMinor": 10000, "occurredOn": "2025-01-01" })),
    )
    .await;

    let (status, obligation) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/obligations"),
        Some(json!({
            "name": "Rent",
            "category": "rent",
            "amountMinor": 4000,
            "periodicity": "monthly",
            "startDate": "2025-01-31"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let obligation_id = obligation["id"].as_str().unwrap().to_string();

    let (status, alerts) = send(
        &app,
        Method::GET,
        &format!("/ledgers/{ledger}/alerts?today=2025-01-29"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alerts["alerts"][0]["status"], "due_soon");

    let (status, created) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/obligations/{obligation_id}/settlements"),
        Some(json!({
            "periodLabel": "2025-01",
            "paymentDate": "2025-01-31",
            "wasPaid": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["nextDueDate"], "2025-02-28");
    assert_eq!(created["expense"]["amountMinor"], 4000);

    let (_, statement) = send(&app, Method::GET, &format!("/ledgers/{ledger}"), None).await;
    assert_eq!(statement["balanceMinor"], 6000);

    let (status, list) = send(
        &app,
        Method::GET,
        &format!("/ledgers/{ledger}/obligations/{obligation_id}/settlements"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["settlements"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn receivable_payment_and_dispute() {
    let app = app().await;
    let ledger = new_ledger(&app, "Main").await;

    let (status, receivable) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/receivables"),
        Some(json!({
            "partnerId": "acme",
            "totalAmountMinor": 1000,
            "reason": "Invoice 12"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receivable["status"], "pending");
    let id = receivable["id"].as_str().unwrap().to_string();

    let (status, recorded) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/receivables/{id}/payments"),
        Some(json!({ "amountMinor": 400, "paymentDate": "2025-03-05", "method": "cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(recorded["receivable"]["status"], "partial");
    assert_eq!(recorded["receivable"]["outstandingMinor"], 600);

    let (status, disputed) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/receivables/{id}/dispute"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(disputed["status"], "disputed");

    let (status, cleared) = send(
        &app,
        Method::DELETE,
        &format!("/ledgers/{ledger}/receivables/{id}/dispute"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["status"], "partial");
    assert_eq!(cleared["payments"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/ledgers/{ledger}/receivables/{id}"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn receivable_update_can_add_a_payment_and_clear_notes() {
    let app = app().await;
    let ledger = new_ledger(&app, "Main").await;

    let (_, receivable) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/receivables"),
        Some(json!({
            "partnerId": "globex",
            "totalAmountMinor": 1000,
            "reason": "Invoice 31",
            "notes": "call before visiting"
        })),
    )
    .await;
    let id = receivable["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/ledgers/{ledger}/receivables/{id}"),
        Some(json!({
            "addPayment": { "amountMinor": 1000, "paymentDate": "2025-04-02", "method": "transfer" },
            "notes": null
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "settled");
    assert_eq!(updated["outstandingMinor"], 0);
    assert_eq!(updated["notes"], Value::Null);
    assert_eq!(updated["payments"][0]["method"], "transfer");
    assert_eq!(updated["payments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn movement_delete_reverses_balance_and_recompute_finds_no_drift() {
    let app = app().await;
    let ledger = new_ledger(&app, "Main").await;
    send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/movements"),
        Some(json!({ "kind": "inflow", "amountMinor": 5000, "occurredOn": "2025-03-01" })),
    )
    .await;
    let (status, outflow) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/movements"),
        Some(json!({ "kind": "outflow", "amountMinor": 1200, "occurredOn": "2025-03-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let movement = outflow["id"].as_str().unwrap().to_string();

    let uri = format!("/ledgers/{ledger}/movements/{movement}");
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, statement) = send(&app, Method::GET, &format!("/ledgers/{ledger}"), None).await;
    assert_eq!(statement["balanceMinor"], 5000);
    assert_eq!(statement["movements"].as_array().unwrap().len(), 1);

    let (status, check) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/balance/recompute"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["storedMinor"], 5000);
    assert_eq!(check["recomputedMinor"], 5000);
    assert_eq!(check["drifted"], false);
}

#[tokio::test]
async fn advance_moves_the_next_due_date() {
    let app = app().await;
    let ledger = new_ledger(&app, "Main").await;
    let (_, obligation) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/obligations"),
        Some(json!({
            "name": "Hosting",
            "category": "it",
            "amountMinor": 900,
            "periodicity": "monthly",
            "startDate": "2025-01-31"
        })),
    )
    .await;
    let id = obligation["id"].as_str().unwrap().to_string();

    let (status, advanced) = send(
        &app,
        Method::POST,
        &format!("/ledgers/{ledger}/obligations/{id}/advance"),
        Some(json!({ "fromDate": "2025-02-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(advanced["nextDueDate"], "2025-03-10");

    let (_, fetched) = send(
        &app,
        Method::GET,
        &format!("/ledgers/{ledger}/obligations/{id}?today=2025-02-10"),
        None,
    )
    .await;
    assert_eq!(fetched["nextDueDate"], "2025-03-10");

    let (_, statement) = send(&app, Method::GET, &format!("/ledgers/{ledger}"), None).await;
    assert_eq!(statement["balanceMinor"], 0);
}
