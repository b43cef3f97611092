use chrono::{NaiveDate, Utc};
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Expense, ObligationSettlement, ResultEngine, SettlementCmd, expenses,
    settlements,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub settlement: ObligationSettlement,
    /// `None` only when a replayed key finds its expense already deleted.
    pub expense: Option<Expense>,
    pub next_due_date: NaiveDate,
}

impl Engine {
    /// Settles one period of an obligation.
    ///
    /// In a single transaction: records the period's expense (which debits the
    /// ledger), moves the obligation's next due date one period after
    /// `payment_date` and stores the settlement record. Any failure, such as
    /// `InsufficientFunds`, leaves no expense, no movement and the due date
    /// unchanged.
    pub async fn record_settlement(&self, cmd: SettlementCmd) -> ResultEngine<SettlementOutcome> {
        let SettlementCmd {
            ledger_id,
            obligation_id,
            period_label,
            payment_date,
            was_paid,
            idempotency_key,
        } = cmd;
        let period_label = normalize_required_text(&period_label, "period_label")?;
        let idempotency_key = normalize_optional_text(idempotency_key.as_deref());

        with_tx!(self, |db_tx| {
            if let Some(key) = idempotency_key.as_deref() {
                let existing = settlements::Entity::find()
                    .filter(settlements::Column::LedgerId.eq(ledger_id.to_string()))
                    .filter(settlements::Column::IdempotencyKey.eq(key.to_string()))
                    .one(&db_tx)
                    .await?;
                if let Some(existing) = existing {
                    let settlement = ObligationSettlement::try_from(existing)?;
                    let expense = expenses::Entity::find_by_id(settlement.expense_id.to_string())
                        .one(&db_tx)
                        .await?
                        .map(Expense::try_from)
                        .transpose()?;
                    return Ok(SettlementOutcome {
                        next_due_date: settlement.next_due_date,
                        expense,
                        settlement,
                    });
                }
            }

            let obligation = self
                .require_obligation(&db_tx, ledger_id, obligation_id)
                .await?;
            let next_due_date = obligation.advance_from(payment_date)?;

            let expense = Expense::new(
                ledger_id,
                &obligation.settlement_description(&period_label, was_paid),
                obligation.amount_minor,
                &obligation.category,
                payment_date,
            )?;
            let expense = self.insert_expense(&db_tx, expense).await?;

            self.store_next_due_date(&db_tx, obligation_id, next_due_date)
                .await?;

            let settlement = ObligationSettlement {
                id: Uuid::new_v4(),
                ledger_id,
                obligation_id,
                period_label,
                payment_date,
                was_paid,
                expense_id: expense.id,
                previous_due_date: obligation.next_due_date,
                next_due_date,
                created_at: Utc::now(),
                idempotency_key,
            };
            settlements::ActiveModel::from(&settlement)
                .insert(&db_tx)
                .await?;

            tracing::info!(
                %ledger_id,
                %obligation_id,
                period = %settlement.period_label,
                was_paid,
                %next_due_date,
                "obligation period settled"
            );
            Ok(SettlementOutcome {
                settlement,
                expense: Some(expense),
                next_due_date,
            })
        })
    }

    /// Settlement history of an obligation, newest first.
    pub async fn settlements(
        &self,
        ledger_id: Uuid,
        obligation_id: Uuid,
    ) -> ResultEngine<Vec<ObligationSettlement>> {
        with_tx!(self, |db_tx| {
            self.require_obligation(&db_tx, ledger_id, obligation_id)
                .await?;
            let models = settlements::Entity::find()
                .filter(settlements::Column::ObligationId.eq(obligation_id.to_string()))
                .order_by_desc(settlements::Column::PaymentDate)
                .order_by_desc(settlements::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(ObligationSettlement::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
