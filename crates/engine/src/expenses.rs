//! The module contains the `Expense` struct and its entity.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{normalize_required_text, parse_uuid, require_positive_amount},
};

/// Prefix of the description given to the outflow posted by an expense.
pub const EXPENSE_MOVEMENT_PREFIX: &str = "Expense: ";

/// A one-off expenditure.
///
/// Creating an expense debits the cash ledger once, in the same database
/// transaction. Later edits are metadata only: `movement_id` keeps pointing to
/// the outflow posted at creation, whose amount may then differ from
/// `amount_minor`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub description: String,
    pub amount_minor: i64,
    pub category: String,
    pub date: NaiveDate,
    pub receipt_ref: Option<String>,
    pub movement_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
}

impl Expense {
    pub fn new(
        ledger_id: Uuid,
        description: &str,
        amount_minor: i64,
        category: &str,
        date: NaiveDate,
    ) -> ResultEngine<Self> {
        require_positive_amount(amount_minor, "amount_minor")?;
        Ok(Self {
            id: Uuid::new_v4(),
            ledger_id,
            description: normalize_required_text(description, "description")?,
            amount_minor,
            category: normalize_required_text(category, "category")?,
            date,
            receipt_ref: None,
            movement_id: None,
            created_at: Utc::now(),
            idempotency_key: None,
        })
    }

    pub fn movement_description(&self) -> String {
        format!("{EXPENSE_MOVEMENT_PREFIX}{}", self.description)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub ledger_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub category: String,
    pub date: Date,
    pub receipt_ref: Option<String>,
    pub movement_id: Option<String>,
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

impl From<&Expense> for ActiveModel {
    fn from(value: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            ledger_id: ActiveValue::Set(value.ledger_id.to_string()),
            description: ActiveValue::Set(value.description.clone()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            category: ActiveValue::Set(value.category.clone()),
            date: ActiveValue::Set(value.date),
            receipt_ref: ActiveValue::Set(value.receipt_ref.clone()),
            movement_id: ActiveValue::Set(value.movement_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(value.created_at),
            idempotency_key: ActiveValue::Set(value.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            ledger_id: parse_uuid(&model.ledger_id, "ledger")?,
            description: model.description,
            amount_minor: model.amount_minor,
            category: model.category,
            date: model.date,
            receipt_ref: model.receipt_ref,
            movement_id: model
                .movement_id
                .as_deref()
                .map(|id| parse_uuid(id, "movement"))
                .transpose()?,
            created_at: model.created_at,
            idempotency_key: model.idempotency_key,
        })
    }
}
