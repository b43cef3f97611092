//! Receivable and payment API endpoints

use api_types::{
    TodayQuery,
    receivable::{
        PaymentMethod, PaymentNew, PaymentRecorded, PaymentView, ReceivableList, ReceivableNew,
        ReceivableQuery, ReceivableStatus, ReceivableUpdate, ReceivableView,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{EngineError, NewPayment, ReceivableCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, today_or_now};

fn map_status(status: engine::ReceivableStatus) -> ReceivableStatus {
    match status {
        engine::ReceivableStatus::Pending => ReceivableStatus::Pending,
        engine::ReceivableStatus::Partial => ReceivableStatus::Partial,
        engine::ReceivableStatus::Settled => ReceivableStatus::Settled,
        engine::ReceivableStatus::Disputed => ReceivableStatus::Disputed,
    }
}

fn engine_status(status: ReceivableStatus) -> engine::ReceivableStatus {
    match status {
        ReceivableStatus::Pending => engine::ReceivableStatus::Pending,
        ReceivableStatus::Partial => engine::ReceivableStatus::Partial,
        ReceivableStatus::Settled => engine::ReceivableStatus::Settled,
        ReceivableStatus::Disputed => engine::ReceivableStatus::Disputed,
    }
}

fn map_method(method: engine::PaymentMethod) -> PaymentMethod {
    match method {
        engine::PaymentMethod::Cash => PaymentMethod::Cash,
        engine::PaymentMethod::Transfer => PaymentMethod::Transfer,
        engine::PaymentMethod::Check => PaymentMethod::Check,
        engine::PaymentMethod::MobileMoney => PaymentMethod::MobileMoney,
    }
}

fn new_payment(payload: PaymentNew) -> NewPayment {
    let method = match payload.method {
        PaymentMethod::Cash => engine::PaymentMethod::Cash,
        PaymentMethod::Transfer => engine::PaymentMethod::Transfer,
        PaymentMethod::Check => engine::PaymentMethod::Check,
        PaymentMethod::MobileMoney => engine::PaymentMethod::MobileMoney,
    };
    NewPayment {
        amount_minor: payload.amount_minor,
        payment_date: payload.payment_date,
        method,
        reference: payload.reference,
        attachment_ref: payload.attachment_ref,
        idempotency_key: payload.idempotency_key,
    }
}

fn payment_view(payment: engine::Payment) -> PaymentView {
    PaymentView {
        id: payment.id,
        amount_minor: payment.amount_minor,
        payment_date: payment.payment_date,
        method: map_method(payment.method),
        reference: payment.reference,
        attachment_ref: payment.attachment_ref,
        created_at: payment.created_at,
    }
}

fn receivable_view(receivable: engine::Receivable) -> ReceivableView {
    ReceivableView {
        id: receivable.id,
        outstanding_minor: receivable.outstanding_minor(),
        overpaid_minor: receivable.overpaid_minor(),
        partner_id: receivable.partner_id,
        total_amount_minor: receivable.total_amount_minor,
        paid_amount_minor: receivable.paid_amount_minor,
        reason: receivable.reason,
        reference: receivable.reference,
        due_date: receivable.due_date,
        status: map_status(receivable.status),
        notes: receivable.notes,
        attachment_ref: receivable.attachment_ref,
        created_at: receivable.created_at,
        payments: receivable.payments.into_iter().map(payment_view).collect(),
    }
}

fn is_empty_update(payload: &ReceivableUpdate) -> bool {
    payload.total_amount_minor.is_none()
        && payload.reason.is_none()
        && payload.reference.is_none()
        && payload.due_date.is_none()
        && payload.notes.is_none()
        && payload.attachment_ref.is_none()
        && payload.add_payment.is_none()
}

pub async fn receivable_new(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
    Json(payload): Json<ReceivableNew>,
) -> Result<(StatusCode, Json<ReceivableView>), ServerError> {
    let cmd = ReceivableCmd {
        ledger_id,
        partner_id: payload.partner_id,
        total_amount_minor: payload.total_amount_minor,
        reason: payload.reason,
        reference: payload.reference,
        due_date: payload.due_date,
        notes: payload.notes,
        attachment_ref: payload.attachment_ref,
    };
    let receivable = state.engine.new_receivable(cmd).await?;
    Ok((StatusCode::CREATED, Json(receivable_view(receivable))))
}

pub async fn list(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<ReceivableQuery>,
) -> Result<Json<ReceivableList>, ServerError> {
    let receivables = state
        .engine
        .list_receivables(ledger_id, query.status.map(engine_status))
        .await?;
    Ok(Json(ReceivableList {
        receivables: receivables.into_iter().map(receivable_view).collect(),
    }))
}

pub async fn overdue(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<ReceivableList>, ServerError> {
    let receivables = state
        .engine
        .overdue_receivables(ledger_id, today_or_now(query.today))
        .await?;
    Ok(Json(ReceivableList {
        receivables: receivables.into_iter().map(receivable_view).collect(),
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path((ledger_id, receivable_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ReceivableView>, ServerError> {
    let receivable = state.engine.receivable(ledger_id, receivable_id).await?;
    Ok(Json(receivable_view(receivable)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((ledger_id, receivable_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReceivableUpdate>,
) -> Result<Json<ReceivableView>, ServerError> {
    if is_empty_update(&payload) {
        return Err(EngineError::InvalidInput("nothing to update".to_string()).into());
    }
    let update = engine::ReceivableUpdate {
        total_amount_minor: payload.total_amount_minor,
        reason: payload.reason,
        reference: payload.reference,
        due_date: payload.due_date,
        notes: payload.notes,
        attachment_ref: payload.attachment_ref,
        add_payment: payload.add_payment.map(new_payment),
    };
    let receivable = state
        .engine
        .update_receivable(ledger_id, receivable_id, update)
        .await?;
    Ok(Json(receivable_view(receivable)))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path((ledger_id, receivable_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_receivable(ledger_id, receivable_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a (partial) payment
pub async fn payment_new(
    State(state): State<ServerState>,
    Path((ledger_id, receivable_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PaymentNew>,
) -> Result<(StatusCode, Json<PaymentRecorded>), ServerError> {
    let outcome = state
        .engine
        .record_payment(ledger_id, receivable_id, new_payment(payload))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PaymentRecorded {
            payment: payment_view(outcome.payment),
            receivable: receivable_view(outcome.receivable),
        }),
    ))
}

pub async fn dispute(
    State(state): State<ServerState>,
    Path((ledger_id, receivable_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ReceivableView>, ServerError> {
    let receivable = state.engine.mark_disputed(ledger_id, receivable_id).await?;
    Ok(Json(receivable_view(receivable)))
}

pub async fn clear_dispute(
    State(state): State<ServerState>,
    Path((ledger_id, receivable_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ReceivableView>, ServerError> {
    let receivable = state.engine.clear_dispute(ledger_id, receivable_id).await?;
    Ok(Json(receivable_view(receivable)))
}
