//! Payments received against a receivable.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{parse_uuid, require_positive_amount},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Check,
    MobileMoney,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Transfer => "transfer",
            Self::Check => "check",
            Self::MobileMoney => "mobile_money",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "transfer" => Ok(Self::Transfer),
            "check" => Ok(Self::Check),
            "mobile_money" => Ok(Self::MobileMoney),
            other => Err(EngineError::InvalidInput(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub receivable_id: Uuid,
    pub amount_minor: i64,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub attachment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
}

impl Payment {
    pub fn new(
        receivable_id: Uuid,
        amount_minor: i64,
        payment_date: NaiveDate,
        method: PaymentMethod,
    ) -> ResultEngine<Self> {
        require_positive_amount(amount_minor, "amount_minor")?;
        Ok(Self {
            id: Uuid::new_v4(),
            receivable_id,
            amount_minor,
            payment_date,
            method,
            reference: None,
            attachment_ref: None,
            created_at: Utc::now(),
            idempotency_key: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receivable_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub receivable_id: String,
    pub amount_minor: i64,
    pub payment_date: Date,
    pub method: String,
    pub reference: Option<String>,
    pub attachment_ref: Option<String>,
    pub created_at: DateTimeUtc,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::receivables::Entity",
        from = "Column::ReceivableId",
        to = "super::receivables::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Receivables,
}

impl Related<super::receivables::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receivables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Payment> for ActiveModel {
    fn from(value: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            receivable_id: ActiveValue::Set(value.receivable_id.to_string()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            payment_date: ActiveValue::Set(value.payment_date),
            method: ActiveValue::Set(value.method.as_str().to_string()),
            reference: ActiveValue::Set(value.reference.clone()),
            attachment_ref: ActiveValue::Set(value.attachment_ref.clone()),
            created_at: ActiveValue::Set(value.created_at),
            idempotency_key: ActiveValue::Set(value.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "payment")?,
            receivable_id: parse_uuid(&model.receivable_id, "receivable")?,
            amount_minor: model.amount_minor,
            payment_date: model.payment_date,
            method: PaymentMethod::try_from(model.method.as_str())?,
            reference: model.reference,
            attachment_ref: model.attachment_ref,
            created_at: model.created_at,
            idempotency_key: model.idempotency_key,
        })
    }
}
