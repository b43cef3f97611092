use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::{Expr, Func},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CashLedger, CashMovement, EngineError, MoneyCents, MovementCmd, MovementKind, ResultEngine,
    expenses,
    ledgers::{self, insufficient_funds},
    movements,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

/// One movement of a statement with the balance right after it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    pub movement: CashMovement,
    pub running_balance_minor: i64,
}

/// Movements of a ledger in posting order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStatement {
    pub ledger: CashLedger,
    pub lines: Vec<StatementLine>,
}

/// Stored running balance compared with the sum of the movements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    pub stored_minor: i64,
    pub recomputed_minor: i64,
}

impl BalanceCheck {
    pub fn drifted(&self) -> bool {
        self.stored_minor != self.recomputed_minor
    }
}

impl Engine {
    /// Creates an empty ledger. Names are unique, case-insensitively.
    pub async fn new_ledger(&self, name: &str) -> ResultEngine<CashLedger> {
        let name = normalize_required_text(name, "ledger name")?;
        with_tx!(self, |db_tx| {
            let existing = ledgers::Entity::find()
                .filter(
                    Expr::expr(Func::lower(Expr::col(ledgers::Column::Name)))
                        .eq(name.to_lowercase()),
                )
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(name));
            }

            let ledger = CashLedger::new(name);
            ledgers::ActiveModel::from(&ledger).insert(&db_tx).await?;
            tracing::info!(ledger_id = %ledger.id, name = %ledger.name, "ledger created");
            Ok(ledger)
        })
    }

    pub async fn ledger(&self, ledger_id: Uuid) -> ResultEngine<CashLedger> {
        let model = ledgers::Entity::find_by_id(ledger_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("ledger not exists".to_string()))?;
        CashLedger::try_from(model)
    }

    pub async fn ledgers(&self) -> ResultEngine<Vec<CashLedger>> {
        let models = ledgers::Entity::find()
            .order_by_asc(ledgers::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(CashLedger::try_from).collect()
    }

    /// Current running balance. Never scans the movements.
    pub async fn current_balance(&self, ledger_id: Uuid) -> ResultEngine<i64> {
        Ok(self.ledger(ledger_id).await?.balance_minor)
    }

    /// Records an inflow or an outflow.
    ///
    /// An outflow larger than the balance fails with `InsufficientFunds` and
    /// leaves nothing behind. Replaying an idempotency key returns the
    /// movement recorded the first time.
    pub async fn record_movement(&self, cmd: MovementCmd) -> ResultEngine<CashMovement> {
        let MovementCmd {
            ledger_id,
            kind,
            amount_minor,
            description,
            occurred_on,
            idempotency_key,
        } = cmd;
        let mut movement = CashMovement::new(
            ledger_id,
            kind,
            amount_minor,
            normalize_optional_text(description.as_deref()),
            occurred_on,
        )?;
        movement.idempotency_key = normalize_optional_text(idempotency_key.as_deref());

        with_tx!(self, |db_tx| {
            let movement = self.post_movement(&db_tx, movement).await?;
            Ok(movement)
        })
    }

    /// Applies `movement` to the running balance and stores it.
    pub(super) async fn post_movement(
        &self,
        db_tx: &DatabaseTransaction,
        movement: CashMovement,
    ) -> ResultEngine<CashMovement> {
        if let Some(key) = movement.idempotency_key.as_deref() {
            let existing = movements::Entity::find()
                .filter(movements::Column::LedgerId.eq(movement.ledger_id.to_string()))
                .filter(movements::Column::IdempotencyKey.eq(key.to_string()))
                .one(db_tx)
                .await?;
            if let Some(existing) = existing {
                return CashMovement::try_from(existing);
            }
        }

        match movement.kind {
            MovementKind::Inflow => {
                self.shift_balance(db_tx, movement.ledger_id, movement.amount_minor)
                    .await?;
            }
            MovementKind::Outflow => {
                self.debit(db_tx, movement.ledger_id, movement.amount_minor)
                    .await?;
            }
        }
        movements::ActiveModel::from(&movement).insert(db_tx).await?;

        tracing::debug!(
            ledger_id = %movement.ledger_id,
            movement_id = %movement.id,
            kind = movement.kind.as_str(),
            amount_minor = movement.amount_minor,
            "movement posted"
        );
        Ok(movement)
    }

    /// Decrements the balance only if it covers `amount_minor`.
    ///
    /// The check and the write are one conditional `UPDATE`, so concurrent
    /// outflows can never take the balance below zero.
    async fn debit(
        &self,
        db_tx: &DatabaseTransaction,
        ledger_id: Uuid,
        amount_minor: i64,
    ) -> ResultEngine<()> {
        let result = ledgers::Entity::update_many()
            .col_expr(
                ledgers::Column::BalanceMinor,
                Expr::col(ledgers::Column::BalanceMinor).sub(amount_minor),
            )
            .filter(ledgers::Column::Id.eq(ledger_id.to_string()))
            .filter(ledgers::Column::BalanceMinor.gte(amount_minor))
            .exec(db_tx)
            .await?;
        if result.rows_affected > 0 {
            return Ok(());
        }

        let ledger = self.require_ledger(db_tx, ledger_id).await?;
        Err(insufficient_funds(ledger.balance_minor, amount_minor))
    }

    /// Adds `delta_minor` (possibly negative) to the balance. No lower bound
    /// is enforced; a result outside the `i64` range is rejected with
    /// `InvalidAmount`.
    async fn shift_balance(
        &self,
        db_tx: &DatabaseTransaction,
        ledger_id: Uuid,
        delta_minor: i64,
    ) -> ResultEngine<()> {
        let in_range = if delta_minor >= 0 {
            ledgers::Column::BalanceMinor.lte(i64::MAX - delta_minor)
        } else {
            ledgers::Column::BalanceMinor.gte(i64::MIN - delta_minor)
        };
        let result = ledgers::Entity::update_many()
            .col_expr(
                ledgers::Column::BalanceMinor,
                Expr::col(ledgers::Column::BalanceMinor).add(delta_minor),
            )
            .filter(ledgers::Column::Id.eq(ledger_id.to_string()))
            .filter(in_range)
            .exec(db_tx)
            .await?;
        if result.rows_affected > 0 {
            return Ok(());
        }

        let ledger = self.require_ledger(db_tx, ledger_id).await?;
        MoneyCents::new(ledger.balance_minor).try_add(MoneyCents::new(delta_minor))?;
        Err(EngineError::ConflictingState(
            "ledger balance changed concurrently, retry".to_string(),
        ))
    }

    /// Deletes a movement and reverses its effect on the balance.
    ///
    /// Deleting an inflow may leave the balance negative; the deletion is
    /// still accepted and a warning is logged. Expenses pointing to the
    /// movement lose their link.
    pub async fn delete_movement(&self, ledger_id: Uuid, movement_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = movements::Entity::find_by_id(movement_id.to_string())
                .filter(movements::Column::LedgerId.eq(ledger_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;
            let movement = CashMovement::try_from(model)?;

            self.shift_balance(&db_tx, ledger_id, -movement.signed_amount())
                .await?;
            expenses::Entity::update_many()
                .col_expr(
                    expenses::Column::MovementId,
                    Expr::value(Option::<String>::None),
                )
                .filter(expenses::Column::MovementId.eq(movement_id.to_string()))
                .exec(&db_tx)
                .await?;
            movements::Entity::delete_by_id(movement_id.to_string())
                .exec(&db_tx)
                .await?;

            let ledger = self.require_ledger(&db_tx, ledger_id).await?;
            if ledger.balance_minor < 0 {
                tracing::warn!(
                    %ledger_id,
                    %movement_id,
                    balance_minor = ledger.balance_minor,
                    "movement deletion left the balance negative"
                );
            }
            Ok(())
        })
    }

    /// All movements of the ledger in posting order, each with the balance
    /// right after it.
    pub async fn ledger_statement(&self, ledger_id: Uuid) -> ResultEngine<LedgerStatement> {
        with_tx!(self, |db_tx| {
            let ledger = self.require_ledger(&db_tx, ledger_id).await?;
            let models = movements::Entity::find()
                .filter(movements::Column::LedgerId.eq(ledger_id.to_string()))
                .order_by_asc(movements::Column::CreatedAt)
                .order_by_asc(movements::Column::Id)
                .all(&db_tx)
                .await?;

            let mut running = MoneyCents::default();
            let mut lines = Vec::with_capacity(models.len());
            for model in models {
                let movement = CashMovement::try_from(model)?;
                running = running.try_add(MoneyCents::new(movement.signed_amount()))?;
                lines.push(StatementLine {
                    movement,
                    running_balance_minor: running.cents(),
                });
            }
            Ok(LedgerStatement { ledger, lines })
        })
    }

    /// Replays the movements and rewrites the stored balance when it drifted.
    pub async fn recompute_balance(&self, ledger_id: Uuid) -> ResultEngine<BalanceCheck> {
        with_tx!(self, |db_tx| {
            let ledger = self.require_ledger(&db_tx, ledger_id).await?;
            let models = movements::Entity::find()
                .filter(movements::Column::LedgerId.eq(ledger_id.to_string()))
                .all(&db_tx)
                .await?;
            let mut recomputed = MoneyCents::default();
            for model in models {
                let movement = CashMovement::try_from(model)?;
                recomputed = recomputed.try_add(MoneyCents::new(movement.signed_amount()))?;
            }
            let recomputed = recomputed.cents();

            let check = BalanceCheck {
                stored_minor: ledger.balance_minor,
                recomputed_minor: recomputed,
            };
            if check.drifted() {
                tracing::warn!(
                    %ledger_id,
                    stored_minor = check.stored_minor,
                    recomputed_minor = check.recomputed_minor,
                    "stored balance drifted, rewriting"
                );
                let ledger_model = ledgers::ActiveModel {
                    id: ActiveValue::Set(ledger_id.to_string()),
                    balance_minor: ActiveValue::Set(recomputed),
                    ..Default::default()
                };
                ledger_model.update(&db_tx).await?;
            }
            Ok(check)
        })
    }
}
