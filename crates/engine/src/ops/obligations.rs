use chrono::NaiveDate;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DueStatus, EngineError, ObligationCmd, ObligationUpdate, RecurringObligation, ResultEngine,
    obligations, settlements,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

/// An obligation that is due soon or overdue on a given day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationAlert {
    pub obligation: RecurringObligation,
    pub status: DueStatus,
}

impl Engine {
    pub async fn new_obligation(&self, cmd: ObligationCmd) -> ResultEngine<RecurringObligation> {
        let ObligationCmd {
            ledger_id,
            kind,
            name,
            category,
            amount_minor,
            periodicity,
            start_date,
            end_date,
            next_due_date,
            alert_window_days,
            notes,
        } = cmd;
        let mut obligation = RecurringObligation::new(
            ledger_id,
            kind,
            &name,
            &category,
            amount_minor,
            periodicity,
            start_date,
        )?;
        obligation.end_date = end_date;
        if let Some(next_due_date) = next_due_date {
            obligation.next_due_date = Some(next_due_date);
        }
        if let Some(days) = alert_window_days {
            obligation.alert_window_days = days;
        }
        obligation.notes = normalize_optional_text(notes.as_deref());
        obligation.validate()?;

        with_tx!(self, |db_tx| {
            self.require_ledger(&db_tx, ledger_id).await?;
            obligations::ActiveModel::from(&obligation)
                .insert(&db_tx)
                .await?;
            tracing::info!(
                %ledger_id,
                obligation_id = %obligation.id,
                periodicity = obligation.periodicity.as_str(),
                "obligation created"
            );
            Ok(obligation)
        })
    }

    pub(super) async fn require_obligation(
        &self,
        db_tx: &DatabaseTransaction,
        ledger_id: Uuid,
        obligation_id: Uuid,
    ) -> ResultEngine<RecurringObligation> {
        let model = obligations::Entity::find_by_id(obligation_id.to_string())
            .filter(obligations::Column::LedgerId.eq(ledger_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("obligation not exists".to_string()))?;
        RecurringObligation::try_from(model)
    }

    pub async fn obligation(
        &self,
        ledger_id: Uuid,
        obligation_id: Uuid,
    ) -> ResultEngine<RecurringObligation> {
        let model = obligations::Entity::find_by_id(obligation_id.to_string())
            .filter(obligations::Column::LedgerId.eq(ledger_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("obligation not exists".to_string()))?;
        RecurringObligation::try_from(model)
    }

    /// Obligations of the ledger, soonest due first. Obligations without a
    /// due date come last.
    pub async fn list_obligations(&self, ledger_id: Uuid) -> ResultEngine<Vec<RecurringObligation>> {
        let models = obligations::Entity::find()
            .filter(obligations::Column::LedgerId.eq(ledger_id.to_string()))
            .order_by_asc(obligations::Column::Name)
            .all(&self.database)
            .await?;
        let mut list = models
            .into_iter()
            .map(RecurringObligation::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        list.sort_by_key(|o| (o.next_due_date.is_none(), o.next_due_date));
        Ok(list)
    }

    pub async fn update_obligation(
        &self,
        ledger_id: Uuid,
        obligation_id: Uuid,
        update: ObligationUpdate,
    ) -> ResultEngine<RecurringObligation> {
        with_tx!(self, |db_tx| {
            let mut obligation = self
                .require_obligation(&db_tx, ledger_id, obligation_id)
                .await?;

            if let Some(kind) = update.kind {
                obligation.kind = kind;
            }
            if let Some(name) = update.name.as_deref() {
                obligation.name = normalize_required_text(name, "name")?;
            }
            if let Some(category) = update.category.as_deref() {
                obligation.category = normalize_required_text(category, "category")?;
            }
            if let Some(amount_minor) = update.amount_minor {
                obligation.amount_minor = amount_minor;
            }
            if let Some(periodicity) = update.periodicity {
                obligation.periodicity = periodicity;
            }
            if let Some(start_date) = update.start_date {
                obligation.start_date = start_date;
            }
            if let Some(end_date) = update.end_date {
                obligation.end_date = end_date;
            }
            if let Some(active) = update.active {
                obligation.active = active;
            }
            if let Some(next_due_date) = update.next_due_date {
                obligation.next_due_date = next_due_date;
            }
            if let Some(days) = update.alert_window_days {
                obligation.alert_window_days = days;
            }
            if let Some(notes) = update.notes {
                obligation.notes = normalize_optional_text(notes.as_deref());
            }
            obligation.validate()?;

            obligations::ActiveModel::from(&obligation)
                .update(&db_tx)
                .await?;
            Ok(obligation)
        })
    }

    /// Deletes an obligation and its settlement history. Expenses recorded by
    /// past settlements are kept.
    pub async fn delete_obligation(&self, ledger_id: Uuid, obligation_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_obligation(&db_tx, ledger_id, obligation_id)
                .await?;
            settlements::Entity::delete_many()
                .filter(settlements::Column::ObligationId.eq(obligation_id.to_string()))
                .exec(&db_tx)
                .await?;
            obligations::Entity::delete_by_id(obligation_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Moves the next due date one period after `from` and persists it.
    ///
    /// Fails with `ConflictingState` when the obligation is dormant at `from`.
    pub async fn advance_period(
        &self,
        ledger_id: Uuid,
        obligation_id: Uuid,
        from: NaiveDate,
    ) -> ResultEngine<NaiveDate> {
        with_tx!(self, |db_tx| {
            let obligation = self
                .require_obligation(&db_tx, ledger_id, obligation_id)
                .await?;
            let next_due = obligation.advance_from(from)?;
            self.store_next_due_date(&db_tx, obligation_id, next_due)
                .await?;
            Ok(next_due)
        })
    }

    pub(super) async fn store_next_due_date(
        &self,
        db_tx: &DatabaseTransaction,
        obligation_id: Uuid,
        next_due: NaiveDate,
    ) -> ResultEngine<()> {
        let model = obligations::ActiveModel {
            id: ActiveValue::Set(obligation_id.to_string()),
            next_due_date: ActiveValue::Set(Some(next_due)),
            ..Default::default()
        };
        model.update(db_tx).await?;
        Ok(())
    }

    /// Obligations that are due soon or overdue on `today`, most urgent first.
    pub async fn obligation_alerts(
        &self,
        ledger_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<Vec<ObligationAlert>> {
        let alerts = self
            .list_obligations(ledger_id)
            .await?
            .into_iter()
            .filter_map(|obligation| {
                let status = obligation.classify(today);
                status
                    .needs_attention()
                    .then_some(ObligationAlert { obligation, status })
            })
            .collect();
        Ok(alerts)
    }
}
