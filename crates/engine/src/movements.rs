//! Cash movements.
//!
//! A [`CashMovement`] is a single inflow or outflow of the cash ledger. Amounts
//! are always positive; the [`MovementKind`] carries the direction.
//!
//! Movements are never edited. Deleting a movement is the only supported
//! correction and it reverses the movement's effect on the running balance.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid, util::require_positive_amount};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Inflow,
    Outflow,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
        }
    }

    /// Effect of a movement of this kind on the balance.
    pub fn signed(self, amount_minor: i64) -> i64 {
        match self {
            Self::Inflow => amount_minor,
            Self::Outflow => -amount_minor,
        }
    }
}

impl TryFrom<&str> for MovementKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "inflow" => Ok(Self::Inflow),
            "outflow" => Ok(Self::Outflow),
            other => Err(EngineError::InvalidInput(format!(
                "invalid movement kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashMovement {
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub kind: MovementKind,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub occurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
}

impl CashMovement {
    pub fn new(
        ledger_id: Uuid,
        kind: MovementKind,
        amount_minor: i64,
        description: Option<String>,
        occurred_on: NaiveDate,
    ) -> ResultEngine<Self> {
        require_positive_amount(amount_minor, "amount_minor")?;
        Ok(Self {
            id: Uuid::new_v4(),
            ledger_id,
            kind,
            amount_minor,
            description,
            occurred_on,
            created_at: Utc::now(),
            idempotency_key: None,
        })
    }

    pub fn signed_amount(&self) -> i64 {
        self.kind.signed(self.amount_minor)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cash_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub ledger_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub occurred_on: Date,
    pub created_at: DateTimeUtc,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ledgers::Entity",
        from = "Column::LedgerId",
        to = "super::ledgers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Ledgers,
}

impl Related<super::ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CashMovement> for ActiveModel {
    fn from(value: &CashMovement) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            ledger_id: ActiveValue::Set(value.ledger_id.to_string()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            description: ActiveValue::Set(value.description.clone()),
            occurred_on: ActiveValue::Set(value.occurred_on),
            created_at: ActiveValue::Set(value.created_at),
            idempotency_key: ActiveValue::Set(value.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for CashMovement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "movement")?,
            ledger_id: parse_uuid(&model.ledger_id, "ledger")?,
            kind: MovementKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            description: model.description,
            occurred_on: model.occurred_on,
            created_at: model.created_at,
            idempotency_key: model.idempotency_key,
        })
    }
}
