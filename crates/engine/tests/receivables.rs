use std::{collections::HashSet, sync::Arc};

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Engine, ErrorKind, NewPayment, PaymentMethod, ReceivableCmd, ReceivableStatus,
    ReceivableUpdate,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
}

async fn invoice(engine: &Engine, total_minor: i64) -> (Uuid, Uuid) {
    let ledger = engine.new_ledger("Main").await.unwrap();
    let receivable = engine
        .new_receivable(
            ReceivableCmd::new(ledger.id, "client-1", total_minor, "Invoice 2025-004")
                .due_date(day(15)),
        )
        .await
        .unwrap();
    assert_eq!(receivable.status, ReceivableStatus::Pending);
    (ledger.id, receivable.id)
}

fn cash(amount_minor: i64, d: u32) -> NewPayment {
    NewPayment::new(amount_minor, day(d), PaymentMethod::Cash)
}

#[tokio::test]
async fn partial_payments_then_settled() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, receivable_id) = invoice(&engine, 1000).await;

    let outcome = engine
        .record_payment(ledger_id, receivable_id, cash(400, 2))
        .await
        .unwrap();
    assert_eq!(outcome.receivable.status, ReceivableStatus::Partial);
    assert_eq!(outcome.receivable.outstanding_minor(), 600);

    let outcome = engine
        .record_payment(ledger_id, receivable_id, cash(600, 3))
        .await
        .unwrap();
    assert_eq!(outcome.receivable.status, ReceivableStatus::Settled);
    assert_eq!(outcome.receivable.paid_amount_minor, 1000);

    let loaded = engine.receivable(ledger_id, receivable_id).await.unwrap();
    assert_eq!(loaded.payments.len(), 2);
    assert_eq!(loaded.payments[0].amount_minor, 400);
}

#[tokio::test]
async fn dispute_is_sticky_until_cleared() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, receivable_id) = invoice(&engine, 1000).await;

    let disputed = engine.mark_disputed(ledger_id, receivable_id).await.unwrap();
    assert_eq!(disputed.status, ReceivableStatus::Disputed);

    let outcome = engine
        .record_payment(ledger_id, receivable_id, cash(1000, 4))
        .await
        .unwrap();
    assert_eq!(outcome.receivable.status, ReceivableStatus::Disputed);
    assert_eq!(outcome.receivable.paid_amount_minor, 1000);

    let err = engine
        .mark_disputed(ledger_id, receivable_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConflictingState);

    let cleared = engine.clear_dispute(ledger_id, receivable_id).await.unwrap();
    assert_eq!(cleared.status, ReceivableStatus::Settled);

    let err = engine
        .clear_dispute(ledger_id, receivable_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConflictingState);
}

#[tokio::test]
async fn overpayment_is_accepted_and_flagged() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, receivable_id) = invoice(&engine, 1000).await;

    let outcome = engine
        .record_payment(ledger_id, receivable_id, cash(1250, 2))
        .await
        .unwrap();
    assert_eq!(outcome.receivable.status, ReceivableStatus::Settled);
    assert_eq!(outcome.receivable.overpaid_minor(), 250);
    assert_eq!(outcome.receivable.outstanding_minor(), 0);
}

#[tokio::test]
async fn invalid_payment_amount_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, receivable_id) = invoice(&engine, 1000).await;

    let err = engine
        .record_payment(ledger_id, receivable_id, cash(0, 2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let loaded = engine.receivable(ledger_id, receivable_id).await.unwrap();
    assert_eq!(loaded.paid_amount_minor, 0);
    assert!(loaded.payments.is_empty());
}

#[tokio::test]
async fn payment_overflowing_the_paid_amount_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, receivable_id) = invoice(&engine, 1000).await;
    engine
        .record_payment(ledger_id, receivable_id, cash(i64::MAX, 2))
        .await
        .unwrap();

    let err = engine
        .record_payment(ledger_id, receivable_id, cash(1, 3))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let loaded = engine.receivable(ledger_id, receivable_id).await.unwrap();
    assert_eq!(loaded.paid_amount_minor, i64::MAX);
    assert_eq!(loaded.status, ReceivableStatus::Settled);
    assert_eq!(loaded.payments.len(), 1);
}

#[tokio::test]
async fn replayed_payment_key_counts_once() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, receivable_id) = invoice(&engine, 1000).await;
    let payment = NewPayment::new(300, day(2), PaymentMethod::MobileMoney).idempotency_key("tx-9");

    let first = engine
        .record_payment(ledger_id, receivable_id, payment.clone())
        .await
        .unwrap();
    let second = engine
        .record_payment(ledger_id, receivable_id, payment)
        .await
        .unwrap();
    assert_eq!(first.payment.id, second.payment.id);
    assert_eq!(second.receivable.paid_amount_minor, 300);
}

#[tokio::test]
async fn changing_the_total_rederives_the_status() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, receivable_id) = invoice(&engine, 1000).await;
    engine
        .record_payment(ledger_id, receivable_id, cash(600, 2))
        .await
        .unwrap();

    let updated = engine
        .update_receivable(
            ledger_id,
            receivable_id,
            ReceivableUpdate {
                total_amount_minor: Some(600),
                notes: Some(Some("discount agreed".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, ReceivableStatus::Settled);
    assert_eq!(updated.notes.as_deref(), Some("discount agreed"));
}

#[tokio::test]
async fn update_can_add_a_payment() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, receivable_id) = invoice(&engine, 1000).await;

    let updated = engine
        .update_receivable(
            ledger_id,
            receivable_id,
            ReceivableUpdate {
                reference: Some(Some("PO-77".to_string())),
                add_payment: Some(
                    NewPayment::new(250, day(6), PaymentMethod::Transfer).reference("wire 1"),
                ),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, ReceivableStatus::Partial);
    assert_eq!(updated.reference.as_deref(), Some("PO-77"));
    assert_eq!(updated.payments.len(), 1);
    assert_eq!(updated.payments[0].reference.as_deref(), Some("wire 1"));
}

#[tokio::test]
async fn status_filter_and_overdue_listing() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, unpaid_id) = invoice(&engine, 1000).await;
    let paid = engine
        .new_receivable(
            ReceivableCmd::new(ledger_id, "client-2", 500, "Invoice 2025-005").due_date(day(10)),
        )
        .await
        .unwrap();
    engine
        .record_payment(ledger_id, paid.id, cash(500, 9))
        .await
        .unwrap();

    let settled = engine
        .list_receivables(ledger_id, Some(ReceivableStatus::Settled))
        .await
        .unwrap();
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].id, paid.id);
    assert_eq!(engine.list_receivables(ledger_id, None).await.unwrap().len(), 2);

    let overdue = engine
        .overdue_receivables(ledger_id, day(20))
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, unpaid_id);
    assert!(
        engine
            .overdue_receivables(ledger_id, day(15))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn delete_removes_payments_too() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, receivable_id) = invoice(&engine, 1000).await;
    engine
        .record_payment(ledger_id, receivable_id, cash(100, 2))
        .await
        .unwrap();

    engine
        .delete_receivable(ledger_id, receivable_id)
        .await
        .unwrap();
    let err = engine
        .receivable(ledger_id, receivable_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = engine
        .record_payment(ledger_id, receivable_id, cash(100, 3))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn unknown_partner_is_rejected() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let partners: HashSet<String> = ["client-1".to_string()].into_iter().collect();
    let engine = Engine::builder()
        .database(db)
        .partners(Arc::new(partners))
        .build()
        .await
        .unwrap();
    let ledger = engine.new_ledger("Main").await.unwrap();

    engine
        .new_receivable(ReceivableCmd::new(ledger.id, "client-1", 100, "Deposit"))
        .await
        .unwrap();
    let err = engine
        .new_receivable(ReceivableCmd::new(ledger.id, "client-404", 100, "Deposit"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
