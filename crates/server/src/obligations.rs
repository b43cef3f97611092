//! Obligation and settlement API endpoints

use api_types::{
    TodayQuery,
    obligation::{
        AdvanceRequest, AdvanceResponse, AlertList, DueStatus, ObligationKind as ApiKind,
        ObligationList, ObligationNew, ObligationUpdate, ObligationView, Periodicity,
        SettlementCreated, SettlementList, SettlementNew, SettlementView,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use engine::{ObligationCmd, SettlementCmd};
use uuid::Uuid;

use crate::{ServerError, expenses::expense_view, server::ServerState, today_or_now};

fn map_periodicity(periodicity: engine::Periodicity) -> Periodicity {
    match periodicity {
        engine::Periodicity::Monthly => Periodicity::Monthly,
        engine::Periodicity::Bimonthly => Periodicity::Bimonthly,
        engine::Periodicity::Quarterly => Periodicity::Quarterly,
        engine::Periodicity::Semiannual => Periodicity::Semiannual,
        engine::Periodicity::Annual => Periodicity::Annual,
    }
}

fn engine_periodicity(periodicity: Periodicity) -> engine::Periodicity {
    match periodicity {
        Periodicity::Monthly => engine::Periodicity::Monthly,
        Periodicity::Bimonthly => engine::Periodicity::Bimonthly,
        Periodicity::Quarterly => engine::Periodicity::Quarterly,
        Periodicity::Semiannual => engine::Periodicity::Semiannual,
        Periodicity::Annual => engine::Periodicity::Annual,
    }
}

fn map_kind(kind: engine::ObligationKind) -> ApiKind {
    match kind {
        engine::ObligationKind::Subscription => ApiKind::Subscription,
        engine::ObligationKind::FixedCharge => ApiKind::FixedCharge,
    }
}

fn engine_kind(kind: ApiKind) -> engine::ObligationKind {
    match kind {
        ApiKind::Subscription => engine::ObligationKind::Subscription,
        ApiKind::FixedCharge => engine::ObligationKind::FixedCharge,
    }
}

fn map_status(status: engine::DueStatus) -> DueStatus {
    match status {
        engine::DueStatus::Ok => DueStatus::Ok,
        engine::DueStatus::DueSoon => DueStatus::DueSoon,
        engine::DueStatus::Overdue => DueStatus::Overdue,
        engine::DueStatus::Dormant => DueStatus::Dormant,
    }
}

fn obligation_view(obligation: engine::RecurringObligation, today: NaiveDate) -> ObligationView {
    let status = map_status(obligation.classify(today));
    let current_period_label = obligation.current_period_label(today);
    ObligationView {
        id: obligation.id,
        kind: map_kind(obligation.kind),
        name: obligation.name,
        category: obligation.category,
        amount_minor: obligation.amount_minor,
        periodicity: map_periodicity(obligation.periodicity),
        start_date: obligation.start_date,
        end_date: obligation.end_date,
        active: obligation.active,
        next_due_date: obligation.next_due_date,
        alert_window_days: obligation.alert_window_days,
        notes: obligation.notes,
        status,
        current_period_label,
    }
}

fn settlement_view(settlement: engine::ObligationSettlement) -> SettlementView {
    SettlementView {
        id: settlement.id,
        obligation_id: settlement.obligation_id,
        period_label: settlement.period_label,
        payment_date: settlement.payment_date,
        was_paid: settlement.was_paid,
        expense_id: settlement.expense_id,
        previous_due_date: settlement.previous_due_date,
        next_due_date: settlement.next_due_date,
        created_at: settlement.created_at,
    }
}

pub async fn obligation_new(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
    Json(payload): Json<ObligationNew>,
) -> Result<(StatusCode, Json<ObligationView>), ServerError> {
    let cmd = ObligationCmd {
        ledger_id,
        kind: payload.kind.map(engine_kind).unwrap_or_default(),
        name: payload.name,
        category: payload.category,
        amount_minor: payload.amount_minor,
        periodicity: engine_periodicity(payload.periodicity),
        start_date: payload.start_date,
        end_date: payload.end_date,
        next_due_date: payload.next_due_date,
        alert_window_days: payload.alert_window_days,
        notes: payload.notes,
    };
    let obligation = state.engine.new_obligation(cmd).await?;
    let today = today_or_now(None);
    Ok((StatusCode::CREATED, Json(obligation_view(obligation, today))))
}

/// List obligations, each classified at `?today`
pub async fn list(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<ObligationList>, ServerError> {
    let today = today_or_now(query.today);
    let obligations = state.engine.list_obligations(ledger_id).await?;
    Ok(Json(ObligationList {
        obligations: obligations
            .into_iter()
            .map(|obligation| obligation_view(obligation, today))
            .collect(),
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path((ledger_id, obligation_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<ObligationView>, ServerError> {
    let obligation = state.engine.obligation(ledger_id, obligation_id).await?;
    Ok(Json(obligation_view(obligation, today_or_now(query.today))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((ledger_id, obligation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ObligationUpdate>,
) -> Result<Json<ObligationView>, ServerError> {
    let update = engine::ObligationUpdate {
        kind: payload.kind.map(engine_kind),
        name: payload.name,
        category: payload.category,
        amount_minor: payload.amount_minor,
        periodicity: payload.periodicity.map(engine_periodicity),
        start_date: payload.start_date,
        end_date: payload.end_date,
        active: payload.active,
        next_due_date: payload.next_due_date,
        alert_window_days: payload.alert_window_days,
        notes: payload.notes,
    };
    let obligation = state
        .engine
        .update_obligation(ledger_id, obligation_id, update)
        .await?;
    Ok(Json(obligation_view(obligation, today_or_now(None))))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path((ledger_id, obligation_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_obligation(ledger_id, obligation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Skip a period without recording an expense
pub async fn advance(
    State(state): State<ServerState>,
    Path((ledger_id, obligation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AdvanceRequest>,
) -> Result<Json<AdvanceResponse>, ServerError> {
    let next_due_date = state
        .engine
        .advance_period(ledger_id, obligation_id, payload.from_date)
        .await?;
    Ok(Json(AdvanceResponse { next_due_date }))
}

/// Settle a period: records the expense, debits the ledger and moves the due
/// date, all or nothing.
pub async fn settlement_new(
    State(state): State<ServerState>,
    Path((ledger_id, obligation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<SettlementCreated>), ServerError> {
    let cmd = SettlementCmd {
        ledger_id,
        obligation_id,
        period_label: payload.period_label,
        payment_date: payload.payment_date,
        was_paid: payload.was_paid,
        idempotency_key: payload.idempotency_key,
    };
    let outcome = state.engine.record_settlement(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(SettlementCreated {
            settlement: settlement_view(outcome.settlement),
            expense: outcome.expense.map(expense_view),
            next_due_date: outcome.next_due_date,
        }),
    ))
}

pub async fn settlements(
    State(state): State<ServerState>,
    Path((ledger_id, obligation_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SettlementList>, ServerError> {
    let settlements = state.engine.settlements(ledger_id, obligation_id).await?;
    Ok(Json(SettlementList {
        settlements: settlements.into_iter().map(settlement_view).collect(),
    }))
}

/// Obligations due soon or overdue at `?today`
pub async fn alerts(
    State(state): State<ServerState>,
    Path(ledger_id): Path<Uuid>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<AlertList>, ServerError> {
    let today = today_or_now(query.today);
    let alerts = state.engine.obligation_alerts(ledger_id, today).await?;
    Ok(Json(AlertList {
        alerts: alerts
            .into_iter()
            .map(|alert| obligation_view(alert.obligation, today))
            .collect(),
    }))
}
