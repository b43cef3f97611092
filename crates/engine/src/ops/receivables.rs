use chrono::NaiveDate;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, NewPayment, Payment, Receivable, ReceivableCmd, ReceivableStatus,
    ReceivableUpdate, ResultEngine, payments, receivables,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub receivable: Receivable,
}

/// Fields of a receivable row that decide its status.
#[derive(Clone, Copy, Debug)]
struct ReadStamp {
    paid_minor: i64,
    total_minor: i64,
    status: ReceivableStatus,
}

impl ReadStamp {
    fn of(receivable: &Receivable) -> Self {
        Self {
            paid_minor: receivable.paid_amount_minor,
            total_minor: receivable.total_amount_minor,
            status: receivable.status,
        }
    }
}

impl Engine {
    /// Opens a receivable. The partner must be known to the partner directory.
    pub async fn new_receivable(&self, cmd: ReceivableCmd) -> ResultEngine<Receivable> {
        let ReceivableCmd {
            ledger_id,
            partner_id,
            total_amount_minor,
            reason,
            reference,
            due_date,
            notes,
            attachment_ref,
        } = cmd;
        let mut receivable = Receivable::new(ledger_id, &partner_id, total_amount_minor, &reason)?;
        if !self.partners.contains(&receivable.partner_id) {
            return Err(EngineError::KeyNotFound(format!(
                "partner {} not exists",
                receivable.partner_id
            )));
        }
        receivable.reference = normalize_optional_text(reference.as_deref());
        receivable.due_date = due_date;
        receivable.notes = normalize_optional_text(notes.as_deref());
        receivable.attachment_ref = normalize_optional_text(attachment_ref.as_deref());

        with_tx!(self, |db_tx| {
            self.require_ledger(&db_tx, ledger_id).await?;
            receivables::ActiveModel::from(&receivable)
                .insert(&db_tx)
                .await?;
            tracing::info!(
                %ledger_id,
                receivable_id = %receivable.id,
                partner_id = %receivable.partner_id,
                total_amount_minor,
                "receivable opened"
            );
            Ok(receivable)
        })
    }

    async fn require_receivable(
        &self,
        db_tx: &DatabaseTransaction,
        ledger_id: Uuid,
        receivable_id: Uuid,
    ) -> ResultEngine<Receivable> {
        let model = receivables::Entity::find_by_id(receivable_id.to_string())
            .filter(receivables::Column::LedgerId.eq(ledger_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("receivable not exists".to_string()))?;
        Receivable::try_from(model)
    }

    /// Writes `receivable` back only if the row still holds the amounts and
    /// status it was read with, so concurrent writers never overwrite each
    /// other.
    async fn save_receivable(
        &self,
        db_tx: &DatabaseTransaction,
        receivable: &Receivable,
        read: ReadStamp,
    ) -> ResultEngine<()> {
        let result = receivables::Entity::update_many()
            .set(receivables::ActiveModel::from(receivable))
            .filter(receivables::Column::Id.eq(receivable.id.to_string()))
            .filter(receivables::Column::PaidAmountMinor.eq(read.paid_minor))
            .filter(receivables::Column::TotalAmountMinor.eq(read.total_minor))
            .filter(receivables::Column::Status.eq(read.status.as_str()))
            .exec(db_tx)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::ConflictingState(
                "receivable changed concurrently, retry".to_string(),
            ));
        }
        Ok(())
    }

    async fn load_payments(
        &self,
        db_tx: &DatabaseTransaction,
        receivable_id: Uuid,
    ) -> ResultEngine<Vec<Payment>> {
        let models = payments::Entity::find()
            .filter(payments::Column::ReceivableId.eq(receivable_id.to_string()))
            .order_by_asc(payments::Column::PaymentDate)
            .order_by_asc(payments::Column::CreatedAt)
            .all(db_tx)
            .await?;
        models.into_iter().map(Payment::try_from).collect()
    }

    /// A receivable with its payments ordered by payment date.
    pub async fn receivable(&self, ledger_id: Uuid, receivable_id: Uuid) -> ResultEngine<Receivable> {
        with_tx!(self, |db_tx| {
            let mut receivable = self
                .require_receivable(&db_tx, ledger_id, receivable_id)
                .await?;
            receivable.payments = self.load_payments(&db_tx, receivable_id).await?;
            Ok(receivable)
        })
    }

    /// Receivables of the ledger, newest first, optionally with one status.
    /// Payments are not loaded.
    pub async fn list_receivables(
        &self,
        ledger_id: Uuid,
        status: Option<ReceivableStatus>,
    ) -> ResultEngine<Vec<Receivable>> {
        let mut query = receivables::Entity::find()
            .filter(receivables::Column::LedgerId.eq(ledger_id.to_string()));
        if let Some(status) = status {
            query = query.filter(receivables::Column::Status.eq(status.as_str()));
        }
        let models = query
            .order_by_desc(receivables::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Receivable::try_from).collect()
    }

    /// Receivables not settled whose due date is before `today`, oldest due
    /// first.
    pub async fn overdue_receivables(
        &self,
        ledger_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<Vec<Receivable>> {
        let models = receivables::Entity::find()
            .filter(receivables::Column::LedgerId.eq(ledger_id.to_string()))
            .filter(receivables::Column::DueDate.lt(today))
            .order_by_asc(receivables::Column::DueDate)
            .all(&self.database)
            .await?;
        let mut overdue = Vec::new();
        for model in models {
            let receivable = Receivable::try_from(model)?;
            if receivable.is_overdue(today) {
                overdue.push(receivable);
            }
        }
        Ok(overdue)
    }

    /// Records a payment and re-derives the status. A disputed receivable
    /// stays disputed. Overpayments are accepted and logged.
    pub async fn record_payment(
        &self,
        ledger_id: Uuid,
        receivable_id: Uuid,
        payment: NewPayment,
    ) -> ResultEngine<PaymentOutcome> {
        with_tx!(self, |db_tx| {
            let outcome = self
                .apply_payment(&db_tx, ledger_id, receivable_id, payment)
                .await?;
            Ok(outcome)
        })
    }

    async fn apply_payment(
        &self,
        db_tx: &DatabaseTransaction,
        ledger_id: Uuid,
        receivable_id: Uuid,
        new_payment: NewPayment,
    ) -> ResultEngine<PaymentOutcome> {
        let NewPayment {
            amount_minor,
            payment_date,
            method,
            reference,
            attachment_ref,
            idempotency_key,
        } = new_payment;
        let mut payment = Payment::new(receivable_id, amount_minor, payment_date, method)?;
        payment.reference = normalize_optional_text(reference.as_deref());
        payment.attachment_ref = normalize_optional_text(attachment_ref.as_deref());
        payment.idempotency_key = normalize_optional_text(idempotency_key.as_deref());

        let mut receivable = self
            .require_receivable(db_tx, ledger_id, receivable_id)
            .await?;

        if let Some(key) = payment.idempotency_key.as_deref() {
            let existing = payments::Entity::find()
                .filter(payments::Column::ReceivableId.eq(receivable_id.to_string()))
                .filter(payments::Column::IdempotencyKey.eq(key.to_string()))
                .one(db_tx)
                .await?;
            if let Some(existing) = existing {
                return Ok(PaymentOutcome {
                    payment: Payment::try_from(existing)?,
                    receivable,
                });
            }
        }

        let read = ReadStamp::of(&receivable);
        receivable.apply_payment(payment.amount_minor)?;
        self.save_receivable(db_tx, &receivable, read)
            .await?;
        payments::ActiveModel::from(&payment).insert(db_tx).await?;

        if receivable.overpaid_minor() > 0 {
            tracing::warn!(
                %ledger_id,
                %receivable_id,
                overpaid_minor = receivable.overpaid_minor(),
                "receivable overpaid"
            );
        }
        tracing::info!(
            %ledger_id,
            %receivable_id,
            amount_minor = payment.amount_minor,
            status = receivable.status.as_str(),
            "payment recorded"
        );
        Ok(PaymentOutcome {
            payment,
            receivable,
        })
    }

    /// Edits a receivable; a change of total re-derives the status. An
    /// `add_payment` is recorded afterwards with the same rules as
    /// [`Engine::record_payment`].
    pub async fn update_receivable(
        &self,
        ledger_id: Uuid,
        receivable_id: Uuid,
        update: ReceivableUpdate,
    ) -> ResultEngine<Receivable> {
        let ReceivableUpdate {
            total_amount_minor,
            reason,
            reference,
            due_date,
            notes,
            attachment_ref,
            add_payment,
        } = update;

        with_tx!(self, |db_tx| {
            let mut receivable = self
                .require_receivable(&db_tx, ledger_id, receivable_id)
                .await?;
            let read = ReadStamp::of(&receivable);

            if let Some(total) = total_amount_minor {
                receivable.set_total(total)?;
            }
            if let Some(reason) = reason.as_deref() {
                receivable.reason = normalize_required_text(reason, "reason")?;
            }
            if let Some(reference) = reference {
                receivable.reference = normalize_optional_text(reference.as_deref());
            }
            if let Some(due_date) = due_date {
                receivable.due_date = due_date;
            }
            if let Some(notes) = notes {
                receivable.notes = normalize_optional_text(notes.as_deref());
            }
            if let Some(attachment_ref) = attachment_ref {
                receivable.attachment_ref = normalize_optional_text(attachment_ref.as_deref());
            }
            self.save_receivable(&db_tx, &receivable, read)
                .await?;

            if let Some(payment) = add_payment {
                receivable = self
                    .apply_payment(&db_tx, ledger_id, receivable_id, payment)
                    .await?
                    .receivable;
            }
            receivable.payments = self.load_payments(&db_tx, receivable_id).await?;
            Ok(receivable)
        })
    }

    /// Pins the receivable to `Disputed` until the dispute is cleared.
    pub async fn mark_disputed(
        &self,
        ledger_id: Uuid,
        receivable_id: Uuid,
    ) -> ResultEngine<Receivable> {
        with_tx!(self, |db_tx| {
            let mut receivable = self
                .require_receivable(&db_tx, ledger_id, receivable_id)
                .await?;
            let read = ReadStamp::of(&receivable);
            receivable.mark_disputed()?;
            self.save_receivable(&db_tx, &receivable, read)
                .await?;
            tracing::info!(%ledger_id, %receivable_id, "receivable disputed");
            Ok(receivable)
        })
    }

    /// Leaves the dispute; the status is derived again from the amounts.
    pub async fn clear_dispute(
        &self,
        ledger_id: Uuid,
        receivable_id: Uuid,
    ) -> ResultEngine<Receivable> {
        with_tx!(self, |db_tx| {
            let mut receivable = self
                .require_receivable(&db_tx, ledger_id, receivable_id)
                .await?;
            let read = ReadStamp::of(&receivable);
            receivable.clear_dispute()?;
            self.save_receivable(&db_tx, &receivable, read)
                .await?;
            tracing::info!(
                %ledger_id,
                %receivable_id,
                status = receivable.status.as_str(),
                "receivable dispute cleared"
            );
            Ok(receivable)
        })
    }

    /// Deletes a receivable together with its payments.
    pub async fn delete_receivable(&self, ledger_id: Uuid, receivable_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_receivable(&db_tx, ledger_id, receivable_id)
                .await?;
            payments::Entity::delete_many()
                .filter(payments::Column::ReceivableId.eq(receivable_id.to_string()))
                .exec(&db_tx)
                .await?;
            receivables::Entity::delete_by_id(receivable_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
