use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, ErrorKind, ExpenseCmd, ExpenseFilter, ExpenseUpdate, MovementCmd,
    MovementKind,
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
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

async fn inflow(engine: &Engine, ledger_id: Uuid, amount_minor: i64) {
    engine
        .record_movement(MovementCmd::new(
            ledger_id,
            MovementKind::Inflow,
            amount_minor,
            day(1),
        ))
        .await
        .unwrap();
}

async fn expense_count(db: &DatabaseConnection) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT COUNT(*) AS n FROM expenses",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}

#[tokio::test]
async fn inflow_expense_then_overdraw_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    assert_eq!(ledger.balance_minor, 0);

    inflow(&engine, ledger.id, 5000).await;
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), 5000);

    let expense = engine
        .create_expense(ExpenseCmd::new(ledger.id, "Paper", 2000, "office", day(2)))
        .await
        .unwrap();
    assert!(expense.movement_id.is_some());
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), 3000);
    assert_eq!(expense_count(&db).await, 1);

    let err = engine
        .create_expense(ExpenseCmd::new(ledger.id, "Laptop", 5000, "office", day(3)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), 3000);
    assert_eq!(expense_count(&db).await, 1);

    let statement = engine.ledger_statement(ledger.id).await.unwrap();
    assert_eq!(statement.lines.len(), 2);
    assert_eq!(
        statement.lines[1].movement.description.as_deref(),
        Some("Expense: Paper")
    );
}

#[tokio::test]
async fn outflow_of_exact_balance_is_accepted() {
    let (engine, _db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    inflow(&engine, ledger.id, 1500).await;

    engine
        .record_movement(MovementCmd::new(
            ledger.id,
            MovementKind::Outflow,
            1500,
            day(2),
        ))
        .await
        .unwrap();
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), 0);

    let err = engine
        .record_movement(MovementCmd::new(ledger.id, MovementKind::Outflow, 1, day(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    let statement = engine.ledger_statement(ledger.id).await.unwrap();
    assert_eq!(statement.lines.len(), 2);
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();

    let err = engine
        .record_movement(MovementCmd::new(ledger.id, MovementKind::Inflow, 0, day(1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = engine
        .create_expense(ExpenseCmd::new(ledger.id, "Refund", -100, "misc", day(1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn unknown_ledger_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .record_movement(MovementCmd::new(
            Uuid::new_v4(),
            MovementKind::Inflow,
            100,
            day(1),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn ledger_names_are_unique_ignoring_case() {
    let (engine, _db) = engine_with_db().await;
    engine.new_ledger("Shop").await.unwrap();
    let err = engine.new_ledger(" shop ").await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert_eq!(engine.ledgers().await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_an_inflow_can_leave_a_negative_balance() {
    let (engine, _db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    let first = engine
        .record_movement(MovementCmd::new(
            ledger.id,
            MovementKind::Inflow,
            1000,
            day(1),
        ))
        .await
        .unwrap();
    engine
        .record_movement(MovementCmd::new(
            ledger.id,
            MovementKind::Outflow,
            800,
            day(2),
        ))
        .await
        .unwrap();

    engine.delete_movement(ledger.id, first.id).await.unwrap();
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), -800);

    let check = engine.recompute_balance(ledger.id).await.unwrap();
    assert!(!check.drifted());
    assert_eq!(check.recomputed_minor, -800);

    let err = engine
        .delete_movement(ledger.id, first.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn inflow_past_the_representable_balance_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    inflow(&engine, ledger.id, i64::MAX).await;

    let err = engine
        .record_movement(MovementCmd::new(
            ledger.id,
            MovementKind::Inflow,
            1,
            day(2),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), i64::MAX);
    let statement = engine.ledger_statement(ledger.id).await.unwrap();
    assert_eq!(statement.lines.len(), 1);
    assert_eq!(statement.lines[0].running_balance_minor, i64::MAX);
    assert!(!engine.recompute_balance(ledger.id).await.unwrap().drifted());

    engine
        .record_movement(MovementCmd::new(
            ledger.id,
            MovementKind::Outflow,
            10,
            day(3),
        ))
        .await
        .unwrap();
    inflow(&engine, ledger.id, 10).await;
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), i64::MAX);
}

#[tokio::test]
async fn statement_carries_running_balance() {
    let (engine, _db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    inflow(&engine, ledger.id, 1000).await;
    engine
        .record_movement(
            MovementCmd::new(ledger.id, MovementKind::Outflow, 300, day(2)).description("Taxi"),
        )
        .await
        .unwrap();
    inflow(&engine, ledger.id, 50).await;

    let statement = engine.ledger_statement(ledger.id).await.unwrap();
    let running: Vec<i64> = statement
        .lines
        .iter()
        .map(|line| line.running_balance_minor)
        .collect();
    assert_eq!(running, vec![1000, 700, 750]);
    assert_eq!(statement.ledger.balance_minor, 750);
}

#[tokio::test]
async fn replayed_movement_key_is_applied_once() {
    let (engine, _db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    let cmd = MovementCmd::new(ledger.id, MovementKind::Inflow, 2500, day(1))
        .idempotency_key("sale-42");

    let first = engine.record_movement(cmd.clone()).await.unwrap();
    let second = engine.record_movement(cmd).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), 2500);
}

#[tokio::test]
async fn recompute_repairs_a_tampered_balance() {
    let (engine, db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    inflow(&engine, ledger.id, 4000).await;

    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE cash_ledgers SET balance_minor = ? WHERE id = ?",
        vec![1.into(), ledger.id.to_string().into()],
    ))
    .await
    .unwrap();

    let check = engine.recompute_balance(ledger.id).await.unwrap();
    assert!(check.drifted());
    assert_eq!(check.stored_minor, 1);
    assert_eq!(check.recomputed_minor, 4000);
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), 4000);
}

#[tokio::test]
async fn editing_an_expense_leaves_the_ledger_alone() {
    let (engine, _db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    inflow(&engine, ledger.id, 5000).await;
    let expense = engine
        .create_expense(ExpenseCmd::new(ledger.id, "Ink", 1200, "office", day(4)))
        .await
        .unwrap();

    let renamed = engine
        .update_expense(
            ledger.id,
            expense.id,
            ExpenseUpdate {
                description: Some("Toner".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!renamed.ledger_out_of_sync);
    assert_eq!(renamed.expense.description, "Toner");

    let repriced = engine
        .update_expense(
            ledger.id,
            expense.id,
            ExpenseUpdate {
                amount_minor: Some(2000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(repriced.ledger_out_of_sync);
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), 3800);
}

#[tokio::test]
async fn deleting_an_expense_keeps_its_outflow() {
    let (engine, _db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    inflow(&engine, ledger.id, 5000).await;
    let expense = engine
        .create_expense(ExpenseCmd::new(ledger.id, "Ink", 1200, "office", day(4)))
        .await
        .unwrap();

    engine.delete_expense(ledger.id, expense.id).await.unwrap();
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), 3800);
    let err = engine.expense(ledger.id, expense.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let movement_id = expense.movement_id.unwrap();
    engine.delete_movement(ledger.id, movement_id).await.unwrap();
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), 5000);
}

#[tokio::test]
async fn expenses_filter_by_category_and_dates() {
    let (engine, _db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    inflow(&engine, ledger.id, 10_000).await;
    for (description, category, d) in [
        ("Ink", "office", 3),
        ("Bus", "travel", 5),
        ("Paper", "office", 10),
    ] {
        engine
            .create_expense(ExpenseCmd::new(ledger.id, description, 100, category, day(d)))
            .await
            .unwrap();
    }

    let office = engine
        .list_expenses(
            ledger.id,
            &ExpenseFilter {
                category: Some("office".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let names: Vec<&str> = office.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(names, vec!["Paper", "Ink"]);

    let early = engine
        .list_expenses(
            ledger.id,
            &ExpenseFilter {
                from: Some(day(4)),
                to: Some(day(9)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(early.len(), 1);
    assert_eq!(early[0].description, "Bus");
}

#[tokio::test]
async fn replayed_expense_key_debits_once() {
    let (engine, db) = engine_with_db().await;
    let ledger = engine.new_ledger("Main").await.unwrap();
    inflow(&engine, ledger.id, 5000).await;
    let cmd = ExpenseCmd::new(ledger.id, "Ink", 1200, "office", day(4)).idempotency_key("inv-7");

    let first = engine.create_expense(cmd.clone()).await.unwrap();
    let second = engine.create_expense(cmd).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(engine.current_balance(ledger.id).await.unwrap(), 3800);
    assert_eq!(expense_count(&db).await, 1);
}

#[tokio::test]
async fn concurrent_outflows_never_overdraw() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let ledger = engine.new_ledger("Main").await.unwrap();
    inflow(&engine, ledger.id, 1000).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .record_movement(MovementCmd::new(
                    ledger.id,
                    MovementKind::Outflow,
                    300,
                    day(2),
                ))
                .await
        }));
    }

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(EngineError::InsufficientFunds(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(accepted, 3);
    assert_eq!(rejected, 5);
    let balance = engine.current_balance(ledger.id).await.unwrap();
    assert_eq!(balance, 1000 - 300 * accepted);
    assert!(!engine.recompute_balance(ledger.id).await.unwrap().drifted());
}
