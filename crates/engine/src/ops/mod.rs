use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{CashLedger, EngineError, OpenDirectory, PartnerDirectory, ResultEngine, ledgers};

mod expenses;
mod ledger;
mod obligations;
mod receivables;
mod settlements;

pub use expenses::{ExpenseFilter, ExpenseUpdated};
pub use ledger::{BalanceCheck, LedgerStatement, StatementLine};
pub use obligations::ObligationAlert;
pub use receivables::PaymentOutcome;
pub use settlements::SettlementOutcome;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    partners: Arc<dyn PartnerDirectory>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    async fn require_ledger(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
    ) -> ResultEngine<CashLedger> {
        let model = ledgers::Entity::find_by_id(ledger_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("ledger not exists".to_string()))?;
        CashLedger::try_from(model)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    partners: Option<Arc<dyn PartnerDirectory>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Directory used to check partner ids of new receivables. Without one,
    /// every partner id is accepted.
    pub fn partners(mut self, partners: Arc<dyn PartnerDirectory>) -> EngineBuilder {
        self.partners = Some(partners);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            partners: self.partners.unwrap_or_else(|| Arc::new(OpenDirectory)),
        })
    }
}
