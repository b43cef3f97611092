//! Ledger and movement API endpoints

use api_types::ledger::{
    BalanceCheck, LedgerList, LedgerNew, LedgerStatement, LedgerView, MovementKind as ApiKind,
    MovementNew, MovementView, StatementLine,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::MovementCmd;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_kind(kind: engine::MovementKind) -> ApiKind {
    match kind {
        engine::MovementKind::Inflow => ApiKind::Inflow,
        engine::MovementKind::Outflow => ApiKind::Outflow,
    }
}

fn ledger_view(ledger: engine::CashLedger) -> LedgerView {
    LedgerView {
        id: ledger.id,
        name: ledger.name,
        balance_minor: ledger.balance_minor,
        created_at: ledger.created_at,
    }
}

fn movement_view(movement: engine::CashMovement) -> MovementView {
    MovementView {
        id: movement.id,
        kind: map_kind(movement.kind),
        amount_minor: movement.amount_minor,
        description: movement.description,
        occurred_on: movement.occurred_on,
        created_at: movement.created_at,
    }
}

/// Handle requests for creating a new ledger
pub async fn ledger_new(
    State(state): State<ServerState>,
    Json(payload): Json<LedgerNew>,
) -> Result<(StatusCode, Json<LedgerView>), ServerError> {
    let ledger = state.engine.new_ledger(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(ledger_view(ledger))))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<LedgerList>, ServerError> {
    let ledgers = state.engine.ledgers().await?;
    Ok(Json(LedgerList {
        ledgers: ledgers.into_iter().map(ledger_view).collect(),
    }))
}

/// Balance and movements with their running balance
pub async fn statement(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
) -> Result<Json<LedgerStatement>, ServerError> {
    let statement = state.engine.ledger_statement(ledger_id).await?;
    Ok(Json(LedgerStatement {
        id: statement.ledger.id,
        name: statement.ledger.name,
        balance_minor: statement.ledger.balance_minor,
        movements: statement
            .lines
            .into_iter()
            .map(|line| StatementLine {
                movement: movement_view(line.movement),
                running_balance_minor: line.running_balance_minor,
            })
            .collect(),
    }))
}

pub async fn movement_new(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
    Json(payload): Json<MovementNew>,
) -> Result<(StatusCode, Json<MovementView>), ServerError> {
    let kind = match payload.kind {
        ApiKind::Inflow => engine::MovementKind::Inflow,
        ApiKind::Outflow => engine::MovementKind::Outflow,
    };
    let cmd = MovementCmd {
        ledger_id,
        kind,
        amount_minor: payload.amount_minor,
        description: payload.description,
        occurred_on: payload.occurred_on,
        idempotency_key: payload.idempotency_key,
    };
    let movement = state.engine.record_movement(cmd).await?;
    Ok((StatusCode::CREATED, Json(movement_view(movement))))
}

pub async fn movement_delete(
    State(state): State<ServerState>,
    Path((ledger_id, movement_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_movement(ledger_id, movement_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recompute(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
) -> Result<Json<BalanceCheck>, ServerError> {
    let check = state.engine.recompute_balance(ledger_id).await?;
    Ok(Json(BalanceCheck {
        stored_minor: check.stored_minor,
        recomputed_minor: check.recomputed_minor,
        drifted: check.drifted(),
    }))
}
