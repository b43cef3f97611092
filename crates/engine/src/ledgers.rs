//! The module contains the `CashLedger` struct (the caisse) and its entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, util::parse_uuid};

/// A cash ledger.
///
/// There is one ledger per tenant. The balance is a running total maintained
/// transactionally with every movement insert/delete, so reading it never
/// scans the movement history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashLedger {
    pub id: Uuid,
    pub name: String,
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl CashLedger {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            balance_minor: 0,
            created_at: Utc::now(),
        }
    }
}

pub(crate) fn insufficient_funds(balance_minor: i64, amount_minor: i64) -> EngineError {
    EngineError::InsufficientFunds(format!(
        "balance {} is lower than outflow {}",
        MoneyCents::new(balance_minor),
        MoneyCents::new(amount_minor)
    ))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cash_ledgers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub balance_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CashLedger> for ActiveModel {
    fn from(value: &CashLedger) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            balance_minor: ActiveValue::Set(value.balance_minor),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for CashLedger {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "ledger")?,
            name: model.name,
            balance_minor: model.balance_minor,
            created_at: model.created_at,
        })
    }
}
