//! Settlement records.
//!
//! An [`ObligationSettlement`] is the trace of one `record_settlement` call:
//! which period was settled, the expense it produced and how the obligation's
//! schedule moved.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationSettlement {
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub obligation_id: Uuid,
    pub period_label: String,
    pub payment_date: NaiveDate,
    pub was_paid: bool,
    pub expense_id: Uuid,
    pub previous_due_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "obligation_settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub ledger_id: String,
    pub obligation_id: String,
    pub period_label: String,
    pub payment_date: Date,
    pub was_paid: bool,
    pub expense_id: String,
    pub previous_due_date: Option<Date>,
    pub next_due_date: Date,
    pub created_at: DateTimeUtc,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::obligations::Entity",
        from = "Column::ObligationId",
        to = "super::obligations::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Obligations,
}

impl Related<super::obligations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Obligations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ObligationSettlement> for ActiveModel {
    fn from(value: &ObligationSettlement) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            ledger_id: ActiveValue::Set(value.ledger_id.to_string()),
            obligation_id: ActiveValue::Set(value.obligation_id.to_string()),
            period_label: ActiveValue::Set(value.period_label.clone()),
            payment_date: ActiveValue::Set(value.payment_date),
            was_paid: ActiveValue::Set(value.was_paid),
            expense_id: ActiveValue::Set(value.expense_id.to_string()),
            previous_due_date: ActiveValue::Set(value.previous_due_date),
            next_due_date: ActiveValue::Set(value.next_due_date),
            created_at: ActiveValue::Set(value.created_at),
            idempotency_key: ActiveValue::Set(value.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for ObligationSettlement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "settlement")?,
            ledger_id: parse_uuid(&model.ledger_id, "ledger")?,
            obligation_id: parse_uuid(&model.obligation_id, "obligation")?,
            period_label: model.period_label,
            payment_date: model.payment_date,
            was_paid: model.was_paid,
            expense_id: parse_uuid(&model.expense_id, "expense")?,
            previous_due_date: model.previous_due_date,
            next_due_date: model.next_due_date,
            created_at: model.created_at,
            idempotency_key: model.idempotency_key,
        })
    }
}
