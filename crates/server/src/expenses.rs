//! Expense API endpoints

use api_types::expense::{
    ExpenseList, ExpenseNew, ExpenseQuery, ExpenseUpdate, ExpenseUpdated, ExpenseView,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{ExpenseCmd, ExpenseFilter};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn expense_view(expense: engine::Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        description: expense.description,
        amount_minor: expense.amount_minor,
        category: expense.category,
        date: expense.date,
        receipt_ref: expense.receipt_ref,
        movement_id: expense.movement_id,
        created_at: expense.created_at,
    }
}

/// Record an expense. Debits the ledger in the same transaction.
pub async fn expense_new(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let cmd = ExpenseCmd {
        ledger_id,
        description: payload.description,
        amount_minor: payload.amount_minor,
        category: payload.category,
        date: payload.date,
        receipt_ref: payload.receipt_ref,
        idempotency_key: payload.idempotency_key,
    };
    let expense = state.engine.create_expense(cmd).await?;
    Ok((StatusCode::CREATED, Json(expense_view(expense))))
}

pub async fn list(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<ExpenseList>, ServerError> {
    let filter = ExpenseFilter {
        category: query.category,
        from: query.from,
        to: query.to,
    };
    let expenses = state.engine.list_expenses(ledger_id, &filter).await?;
    Ok(Json(ExpenseList {
        expenses: expenses.into_iter().map(expense_view).collect(),
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path((ledger_id, expense_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(ledger_id, expense_id).await?;
    Ok(Json(expense_view(expense)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((ledger_id, expense_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseUpdated>, ServerError> {
    let update = engine::ExpenseUpdate {
        description: payload.description,
        amount_minor: payload.amount_minor,
        category: payload.category,
        date: payload.date,
        receipt_ref: payload.receipt_ref,
    };
    let updated = state
        .engine
        .update_expense(ledger_id, expense_id, update)
        .await?;
    Ok(Json(ExpenseUpdated {
        expense: expense_view(updated.expense),
        ledger_out_of_sync: updated.ledger_out_of_sync,
    }))
}

/// Delete an expense. Its outflow stays in the ledger.
pub async fn remove(
    State(state): State<ServerState>,
    Path((ledger_id, expense_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(ledger_id, expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
