use chrono::NaiveDate;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CashMovement, EngineError, Expense, ExpenseCmd, ExpenseUpdate, MovementKind, ResultEngine,
    expenses, movements,
    util::{normalize_optional_text, normalize_required_text, require_positive_amount},
};

use super::{Engine, with_tx};

/// Optional filters of [`Engine::list_expenses`]. Date bounds are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Result of an expense edit.
///
/// `ledger_out_of_sync` is set when the amount no longer matches the outflow
/// posted when the expense was created. The ledger is never adjusted by an
/// edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseUpdated {
    pub expense: Expense,
    pub ledger_out_of_sync: bool,
}

impl Engine {
    /// Records an expense and debits the ledger by its amount, atomically.
    pub async fn create_expense(&self, cmd: ExpenseCmd) -> ResultEngine<Expense> {
        let ExpenseCmd {
            ledger_id,
            description,
            amount_minor,
            category,
            date,
            receipt_ref,
            idempotency_key,
        } = cmd;
        let mut expense = Expense::new(ledger_id, &description, amount_minor, &category, date)?;
        expense.receipt_ref = normalize_optional_text(receipt_ref.as_deref());
        expense.idempotency_key = normalize_optional_text(idempotency_key.as_deref());

        with_tx!(self, |db_tx| {
            let expense = self.insert_expense(&db_tx, expense).await?;
            Ok(expense)
        })
    }

    /// Posts the outflow of `expense` then stores it, inside `db_tx`.
    pub(super) async fn insert_expense(
        &self,
        db_tx: &DatabaseTransaction,
        mut expense: Expense,
    ) -> ResultEngine<Expense> {
        if let Some(key) = expense.idempotency_key.as_deref() {
            let existing = expenses::Entity::find()
                .filter(expenses::Column::LedgerId.eq(expense.ledger_id.to_string()))
                .filter(expenses::Column::IdempotencyKey.eq(key.to_string()))
                .one(db_tx)
                .await?;
            if let Some(existing) = existing {
                return Expense::try_from(existing);
            }
        }

        let movement = CashMovement::new(
            expense.ledger_id,
            MovementKind::Outflow,
            expense.amount_minor,
            Some(expense.movement_description()),
            expense.date,
        )?;
        let movement = self.post_movement(db_tx, movement).await?;
        expense.movement_id = Some(movement.id);
        expenses::ActiveModel::from(&expense).insert(db_tx).await?;

        tracing::info!(
            ledger_id = %expense.ledger_id,
            expense_id = %expense.id,
            amount_minor = expense.amount_minor,
            category = %expense.category,
            "expense recorded"
        );
        Ok(expense)
    }

    pub async fn expense(&self, ledger_id: Uuid, expense_id: Uuid) -> ResultEngine<Expense> {
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .filter(expenses::Column::LedgerId.eq(ledger_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        Expense::try_from(model)
    }

    /// Expenses of the ledger, newest first.
    pub async fn list_expenses(
        &self,
        ledger_id: Uuid,
        filter: &ExpenseFilter,
    ) -> ResultEngine<Vec<Expense>> {
        let mut query =
            expenses::Entity::find().filter(expenses::Column::LedgerId.eq(ledger_id.to_string()));
        if let Some(category) = normalize_optional_text(filter.category.as_deref()) {
            query = query.filter(expenses::Column::Category.eq(category));
        }
        if let Some(from) = filter.from {
            query = query.filter(expenses::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expenses::Column::Date.lte(to));
        }

        let models = query
            .order_by_desc(expenses::Column::Date)
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Expense::try_from).collect()
    }

    /// Edits the metadata of an expense. The ledger is left untouched.
    pub async fn update_expense(
        &self,
        ledger_id: Uuid,
        expense_id: Uuid,
        update: ExpenseUpdate,
    ) -> ResultEngine<ExpenseUpdated> {
        with_tx!(self, |db_tx| {
            let model = expenses::Entity::find_by_id(expense_id.to_string())
                .filter(expenses::Column::LedgerId.eq(ledger_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
            let mut expense = Expense::try_from(model)?;
            let previous_amount = expense.amount_minor;

            if let Some(description) = update.description.as_deref() {
                expense.description = normalize_required_text(description, "description")?;
            }
            if let Some(amount_minor) = update.amount_minor {
                require_positive_amount(amount_minor, "amount_minor")?;
                expense.amount_minor = amount_minor;
            }
            if let Some(category) = update.category.as_deref() {
                expense.category = normalize_required_text(category, "category")?;
            }
            if let Some(date) = update.date {
                expense.date = date;
            }
            if let Some(receipt_ref) = update.receipt_ref {
                expense.receipt_ref = normalize_optional_text(receipt_ref.as_deref());
            }

            expenses::ActiveModel::from(&expense).update(&db_tx).await?;

            let posted_minor = match expense.movement_id {
                Some(movement_id) => movements::Entity::find_by_id(movement_id.to_string())
                    .one(&db_tx)
                    .await?
                    .map_or(0, |movement| movement.amount_minor),
                None => 0,
            };
            let ledger_out_of_sync = posted_minor != expense.amount_minor;
            if ledger_out_of_sync && previous_amount != expense.amount_minor {
                tracing::warn!(
                    %ledger_id,
                    %expense_id,
                    posted_minor,
                    amount_minor = expense.amount_minor,
                    "expense amount edited, ledger not adjusted"
                );
            }

            Ok(ExpenseUpdated {
                expense,
                ledger_out_of_sync,
            })
        })
    }

    /// Deletes an expense record. The outflow it posted stays in the ledger.
    pub async fn delete_expense(&self, ledger_id: Uuid, expense_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = expenses::Entity::delete_many()
                .filter(expenses::Column::Id.eq(expense_id.to_string()))
                .filter(expenses::Column::LedgerId.eq(ledger_id.to_string()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("expense not exists".to_string()));
            }
            Ok(())
        })
    }
}
