use sea_orm_migration::prelude::*;

use super::m20260301_000000_init::{
    CashMovements, Expenses, ObligationSettlements, ReceivablePayments,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("uidx-cash_movements-ledger_id-idempotency_key")
                    .table(CashMovements::Table)
                    .col(CashMovements::LedgerId)
                    .col(CashMovements::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-expenses-ledger_id-idempotency_key")
                    .table(Expenses::Table)
                    .col(Expenses::LedgerId)
                    .col(Expenses::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-obligation_settlements-ledger_id-idempotency_key")
                    .table(ObligationSettlements::Table)
                    .col(ObligationSettlements::LedgerId)
                    .col(ObligationSettlements::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-receivable_payments-receivable_id-idempotency_key")
                    .table(ReceivablePayments::Table)
                    .col(ReceivablePayments::ReceivableId)
                    .col(ReceivablePayments::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uidx-receivable_payments-receivable_id-idempotency_key")
                    .table(ReceivablePayments::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("uidx-obligation_settlements-ledger_id-idempotency_key")
                    .table(ObligationSettlements::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("uidx-expenses-ledger_id-idempotency_key")
                    .table(Expenses::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("uidx-cash_movements-ledger_id-idempotency_key")
                    .table(CashMovements::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
