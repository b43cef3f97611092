//! Cash ledger and obligation-settlement engine.
//!
//! The [`Engine`] owns every rule that touches money:
//!
//! - the cash ledger (caisse) and its running balance,
//! - expenses, which debit the ledger once when they are created,
//! - recurring obligations and their schedule,
//! - settlements, which turn an obligation period into an expense,
//! - receivables and the partial payments reconciled against them.
//!
//! Every write runs inside a single database transaction.

pub use commands::{
    ExpenseCmd, ExpenseUpdate, MovementCmd, NewPayment, ObligationCmd, ObligationUpdate,
    ReceivableCmd, ReceivableUpdate, SettlementCmd,
};
pub use error::{EngineError, ErrorKind};
pub use expenses::{EXPENSE_MOVEMENT_PREFIX, Expense};
pub use ledgers::CashLedger;
pub use money::MoneyCents;
pub use movements::{CashMovement, MovementKind};
pub use obligations::{
    DEFAULT_ALERT_WINDOW_DAYS, DueStatus, ObligationKind, Periodicity, RecurringObligation,
};
pub use ops::{
    BalanceCheck, Engine, EngineBuilder, ExpenseFilter, ExpenseUpdated, LedgerStatement,
    ObligationAlert, PaymentOutcome, SettlementOutcome, StatementLine,
};
pub use partners::{OpenDirectory, PartnerDirectory};
pub use payments::{Payment, PaymentMethod};
pub use receivables::{Receivable, ReceivableStatus};
pub use settlements::ObligationSettlement;

mod commands;
mod error;
mod expenses;
mod ledgers;
mod money;
mod movements;
mod obligations;
mod ops;
mod partners;
mod payments;
mod receivables;
mod settlements;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
