//! Initial schema migration.
//!
//! - `cash_ledgers`: one caisse per tenant, with its running balance
//! - `cash_movements`: inflows and outflows of a ledger
//! - `expenses`: one-off expenditures, linked to the outflow they posted
//! - `obligations`: recurring subscriptions and fixed charges
//! - `obligation_settlements`: one row per settled period
//! - `receivables`: amounts owed by partners
//! - `receivable_payments`: partial payments against a receivable

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
pub(crate) enum CashLedgers {
    Table,
    Id,
    Name,
    BalanceMinor,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum CashMovements {
    Table,
    Id,
    LedgerId,
    Kind,
    AmountMinor,
    Description,
    OccurredOn,
    CreatedAt,
    IdempotencyKey,
}

#[derive(Iden)]
pub(crate) enum Expenses {
    Table,
    Id,
    LedgerId,
    Description,
    AmountMinor,
    Category,
    Date,
    ReceiptRef,
    MovementId,
    CreatedAt,
    IdempotencyKey,
}

#[derive(Iden)]
enum Obligations {
    Table,
    Id,
    LedgerId,
    Kind,
    Name,
    Category,
    AmountMinor,
    Periodicity,
    StartDate,
    EndDate,
    Active,
    NextDueDate,
    AlertWindowDays,
    Notes,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum ObligationSettlements {
    Table,
    Id,
    LedgerId,
    ObligationId,
    PeriodLabel,
    PaymentDate,
    WasPaid,
    ExpenseId,
    PreviousDueDate,
    NextDueDate,
    CreatedAt,
    IdempotencyKey,
}

#[derive(Iden)]
enum Receivables {
    Table,
    Id,
    LedgerId,
    PartnerId,
    TotalAmountMinor,
    PaidAmountMinor,
    Reason,
    Reference,
    DueDate,
    Status,
    Notes,
    AttachmentRef,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum ReceivablePayments {
    Table,
    Id,
    ReceivableId,
    AmountMinor,
    PaymentDate,
    Method,
    Reference,
    AttachmentRef,
    CreatedAt,
    IdempotencyKey,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Ledgers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CashLedgers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashLedgers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashLedgers::Name).string().not_null())
                    .col(
                        ColumnDef::new(CashLedgers::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CashLedgers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CashMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashMovements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashMovements::LedgerId).string().not_null())
                    .col(ColumnDef::new(CashMovements::Kind).string().not_null())
                    .col(
                        ColumnDef::new(CashMovements::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashMovements::Description).string())
                    .col(ColumnDef::new(CashMovements::OccurredOn).date().not_null())
                    .col(
                        ColumnDef::new(CashMovements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashMovements::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_movements-ledger_id")
                            .from(CashMovements::Table, CashMovements::LedgerId)
                            .to(CashLedgers::Table, CashLedgers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_movements-ledger_id-created_at")
                    .table(CashMovements::Table)
                    .col(CashMovements::LedgerId)
                    .col(CashMovements::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::LedgerId).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(ColumnDef::new(Expenses::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Category).string().not_null())
                    .col(ColumnDef::new(Expenses::Date).date().not_null())
                    .col(ColumnDef::new(Expenses::ReceiptRef).string())
                    .col(ColumnDef::new(Expenses::MovementId).string())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-ledger_id")
                            .from(Expenses::Table, Expenses::LedgerId)
                            .to(CashLedgers::Table, CashLedgers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-ledger_id-date")
                    .table(Expenses::Table)
                    .col(Expenses::LedgerId)
                    .col(Expenses::Date)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Obligations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Obligations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Obligations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Obligations::LedgerId).string().not_null())
                    .col(
                        ColumnDef::new(Obligations::Kind)
                            .string()
                            .not_null()
                            .default("subscription"),
                    )
                    .col(ColumnDef::new(Obligations::Name).string().not_null())
                    .col(ColumnDef::new(Obligations::Category).string().not_null())
                    .col(
                        ColumnDef::new(Obligations::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Obligations::Periodicity).string().not_null())
                    .col(ColumnDef::new(Obligations::StartDate).date().not_null())
                    .col(ColumnDef::new(Obligations::EndDate).date())
                    .col(
                        ColumnDef::new(Obligations::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Obligations::NextDueDate).date())
                    .col(
                        ColumnDef::new(Obligations::AlertWindowDays)
                            .integer()
                            .not_null()
                            .default(7),
                    )
                    .col(ColumnDef::new(Obligations::Notes).string())
                    .col(
                        ColumnDef::new(Obligations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-obligations-ledger_id")
                            .from(Obligations::Table, Obligations::LedgerId)
                            .to(CashLedgers::Table, CashLedgers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Settlements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ObligationSettlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ObligationSettlements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ObligationSettlements::LedgerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ObligationSettlements::ObligationId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ObligationSettlements::PeriodLabel)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ObligationSettlements::PaymentDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ObligationSettlements::WasPaid)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ObligationSettlements::ExpenseId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ObligationSettlements::PreviousDueDate).date())
                    .col(
                        ColumnDef::new(ObligationSettlements::NextDueDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ObligationSettlements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ObligationSettlements::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-obligation_settlements-obligation_id")
                            .from(
                                ObligationSettlements::Table,
                                ObligationSettlements::ObligationId,
                            )
                            .to(Obligations::Table, Obligations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-obligation_settlements-obligation_id")
                    .table(ObligationSettlements::Table)
                    .col(ObligationSettlements::ObligationId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Receivables
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Receivables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Receivables::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Receivables::LedgerId).string().not_null())
                    .col(ColumnDef::new(Receivables::PartnerId).string().not_null())
                    .col(
                        ColumnDef::new(Receivables::TotalAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Receivables::PaidAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Receivables::Reason).string().not_null())
                    .col(ColumnDef::new(Receivables::Reference).string())
                    .col(ColumnDef::new(Receivables::DueDate).date())
                    .col(
                        ColumnDef::new(Receivables::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Receivables::Notes).string())
                    .col(ColumnDef::new(Receivables::AttachmentRef).string())
                    .col(
                        ColumnDef::new(Receivables::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-receivables-ledger_id")
                            .from(Receivables::Table, Receivables::LedgerId)
                            .to(CashLedgers::Table, CashLedgers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-receivables-ledger_id-status")
                    .table(Receivables::Table)
                    .col(Receivables::LedgerId)
                    .col(Receivables::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ReceivablePayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReceivablePayments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReceivablePayments::ReceivableId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceivablePayments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceivablePayments::PaymentDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReceivablePayments::Method).string().not_null())
                    .col(ColumnDef::new(ReceivablePayments::Reference).string())
                    .col(ColumnDef::new(ReceivablePayments::AttachmentRef).string())
                    .col(
                        ColumnDef::new(ReceivablePayments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReceivablePayments::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-receivable_payments-receivable_id")
                            .from(ReceivablePayments::Table, ReceivablePayments::ReceivableId)
                            .to(Receivables::Table, Receivables::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-receivable_payments-receivable_id")
                    .table(ReceivablePayments::Table)
                    .col(ReceivablePayments::ReceivableId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReceivablePayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Receivables::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ObligationSettlements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Obligations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashMovements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashLedgers::Table).to_owned())
            .await?;
        Ok(())
    }
}
