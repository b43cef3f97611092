//! Receivables: amounts owed to the organization by a partner.
//!
//! A [`Receivable`] accumulates partial [`Payment`]s. Its status is derived
//! from the paid amount, except for `Disputed`, a manual override that
//! payments never clear. All status changes go through the transition
//! functions of [`ReceivableStatus`].

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ResultEngine,
    payments::Payment,
    util::{normalize_required_text, parse_uuid, require_positive_amount},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceivableStatus {
    Pending,
    Partial,
    Settled,
    Disputed,
}

impl ReceivableStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Settled => "settled",
            Self::Disputed => "disputed",
        }
    }

    /// Status implied by the amounts alone. Never `Disputed`.
    pub fn derive(paid_minor: i64, total_minor: i64) -> Self {
        if paid_minor >= total_minor {
            Self::Settled
        } else if paid_minor > 0 {
            Self::Partial
        } else {
            Self::Pending
        }
    }

    /// Status after the paid amount changed. A dispute stays pinned.
    pub fn after_payment(self, paid_minor: i64, total_minor: i64) -> Self {
        match self {
            Self::Disputed => Self::Disputed,
            _ => Self::derive(paid_minor, total_minor),
        }
    }

    pub fn dispute(self) -> ResultEngine<Self> {
        match self {
            Self::Disputed => Err(EngineError::ConflictingState(
                "receivable is already disputed".to_string(),
            )),
            _ => Ok(Self::Disputed),
        }
    }

    /// Leaves the dispute and re-derives the status from the amounts.
    pub fn clear_dispute(self, paid_minor: i64, total_minor: i64) -> ResultEngine<Self> {
        match self {
            Self::Disputed => Ok(Self::derive(paid_minor, total_minor)),
            other => Err(EngineError::ConflictingState(format!(
                "receivable is not disputed (status: {})",
                other.as_str()
            ))),
        }
    }
}

impl TryFrom<&str> for ReceivableStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "settled" => Ok(Self::Settled),
            "disputed" => Ok(Self::Disputed),
            other => Err(EngineError::InvalidInput(format!(
                "invalid receivable status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receivable {
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub partner_id: String,
    pub total_amount_minor: i64,
    pub paid_amount_minor: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: ReceivableStatus,
    pub notes: Option<String>,
    pub attachment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Ordered by payment date. Empty when loaded in a listing.
    pub payments: Vec<Payment>,
}

impl Receivable {
    pub fn new(
        ledger_id: Uuid,
        partner_id: &str,
        total_amount_minor: i64,
        reason: &str,
    ) -> ResultEngine<Self> {
        require_positive_amount(total_amount_minor, "total_amount_minor")?;
        Ok(Self {
            id: Uuid::new_v4(),
            ledger_id,
            partner_id: normalize_required_text(partner_id, "partner_id")?,
            total_amount_minor,
            paid_amount_minor: 0,
            reason: normalize_required_text(reason, "reason")?,
            reference: None,
            due_date: None,
            status: ReceivableStatus::Pending,
            notes: None,
            attachment_ref: None,
            created_at: Utc::now(),
            payments: Vec::new(),
        })
    }

    pub fn outstanding_minor(&self) -> i64 {
        (self.total_amount_minor - self.paid_amount_minor).max(0)
    }

    /// Amount received beyond the total. Overpayments are accepted and only
    /// surfaced through this value.
    pub fn overpaid_minor(&self) -> i64 {
        (self.paid_amount_minor - self.total_amount_minor).max(0)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != ReceivableStatus::Settled && self.due_date.is_some_and(|due| due < today)
    }

    /// Accounts a new payment of `amount_minor`.
    pub fn apply_payment(&mut self, amount_minor: i64) -> ResultEngine<()> {
        require_positive_amount(amount_minor, "amount_minor")?;
        self.paid_amount_minor = MoneyCents::new(self.paid_amount_minor)
            .try_add(MoneyCents::new(amount_minor))?
            .cents();
        self.status = self
            .status
            .after_payment(self.paid_amount_minor, self.total_amount_minor);
        Ok(())
    }

    pub fn set_total(&mut self, total_amount_minor: i64) -> ResultEngine<()> {
        require_positive_amount(total_amount_minor, "total_amount_minor")?;
        self.total_amount_minor = total_amount_minor;
        self.status = self
            .status
            .after_payment(self.paid_amount_minor, self.total_amount_minor);
        Ok(())
    }

    pub fn mark_disputed(&mut self) -> ResultEngine<()> {
        self.status = self.status.dispute()?;
        Ok(())
    }

    pub fn clear_dispute(&mut self) -> ResultEngine<()> {
        self.status = self
            .status
            .clear_dispute(self.paid_amount_minor, self.total_amount_minor)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receivables")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub ledger_id: String,
    pub partner_id: String,
    pub total_amount_minor: i64,
    pub paid_amount_minor: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub due_date: Option<Date>,
    pub status: String,
    pub notes: Option<String>,
    pub attachment_ref: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
    #[sea_orm(
        belongs_to = "super::ledgers::Entity",
        from = "Column::LedgerId",
        to = "super::ledgers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Ledgers,
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Receivable> for ActiveModel {
    fn from(value: &Receivable) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            ledger_id: ActiveValue::Set(value.ledger_id.to_string()),
            partner_id: ActiveValue::Set(value.partner_id.clone()),
            total_amount_minor: ActiveValue::Set(value.total_amount_minor),
            paid_amount_minor: ActiveValue::Set(value.paid_amount_minor),
            reason: ActiveValue::Set(value.reason.clone()),
            reference: ActiveValue::Set(value.reference.clone()),
            due_date: ActiveValue::Set(value.due_date),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            notes: ActiveValue::Set(value.notes.clone()),
            attachment_ref: ActiveValue::Set(value.attachment_ref.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Receivable {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "receivable")?,
            ledger_id: parse_uuid(&model.ledger_id, "ledger")?,
            partner_id: model.partner_id,
            total_amount_minor: model.total_amount_minor,
            paid_amount_minor: model.paid_amount_minor,
            reason: model.reason,
            reference: model.reference,
            due_date: model.due_date,
            status: ReceivableStatus::try_from(model.status.as_str())?,
            notes: model.notes,
            attachment_ref: model.attachment_ref,
            created_at: model.created_at,
            payments: Vec::new(),
        })
    }
}
