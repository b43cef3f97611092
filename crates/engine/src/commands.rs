//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists. Update commands use `Option`
//! for "leave unchanged" and `Option<Option<_>>` for nullable fields
//! (`Some(None)` clears the value).

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{MovementKind, ObligationKind, PaymentMethod, Periodicity};

/// Record a cash movement.
#[derive(Clone, Debug)]
pub struct MovementCmd {
    pub ledger_id: Uuid,
    pub kind: MovementKind,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub occurred_on: NaiveDate,
    pub idempotency_key: Option<String>,
}

impl MovementCmd {
    #[must_use]
    pub fn new(
        ledger_id: Uuid,
        kind: MovementKind,
        amount_minor: i64,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            ledger_id,
            kind,
            amount_minor,
            description: None,
            occurred_on,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Create an expense (debits the ledger).
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub ledger_id: Uuid,
    pub description: String,
    pub amount_minor: i64,
    pub category: String,
    pub date: NaiveDate,
    pub receipt_ref: Option<String>,
    pub idempotency_key: Option<String>,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        ledger_id: Uuid,
        description: impl Into<String>,
        amount_minor: i64,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            ledger_id,
            description: description.into(),
            amount_minor,
            category: category.into(),
            date,
            receipt_ref: None,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn receipt_ref(mut self, receipt_ref: impl Into<String>) -> Self {
        self.receipt_ref = Some(receipt_ref.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Metadata update of an expense. Never touches the ledger.
#[derive(Clone, Debug, Default)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub amount_minor: Option<i64>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub receipt_ref: Option<Option<String>>,
}

/// Create a recurring obligation.
#[derive(Clone, Debug)]
pub struct ObligationCmd {
    pub ledger_id: Uuid,
    pub kind: ObligationKind,
    pub name: String,
    pub category: String,
    pub amount_minor: i64,
    pub periodicity: Periodicity,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Defaults to `start_date`.
    pub next_due_date: Option<NaiveDate>,
    /// Defaults to [`crate::DEFAULT_ALERT_WINDOW_DAYS`].
    pub alert_window_days: Option<i32>,
    pub notes: Option<String>,
}

impl ObligationCmd {
    #[must_use]
    pub fn new(
        ledger_id: Uuid,
        name: impl Into<String>,
        category: impl Into<String>,
        amount_minor: i64,
        periodicity: Periodicity,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            ledger_id,
            kind: ObligationKind::default(),
            name: name.into(),
            category: category.into(),
            amount_minor,
            periodicity,
            start_date,
            end_date: None,
            next_due_date: None,
            alert_window_days: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: ObligationKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn next_due_date(mut self, next_due_date: NaiveDate) -> Self {
        self.next_due_date = Some(next_due_date);
        self
    }

    #[must_use]
    pub fn alert_window_days(mut self, days: i32) -> Self {
        self.alert_window_days = Some(days);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ObligationUpdate {
    pub kind: Option<ObligationKind>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub amount_minor: Option<i64>,
    pub periodicity: Option<Periodicity>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub active: Option<bool>,
    pub next_due_date: Option<Option<NaiveDate>>,
    pub alert_window_days: Option<i32>,
    pub notes: Option<Option<String>>,
}

/// Settle one period of an obligation.
#[derive(Clone, Debug)]
pub struct SettlementCmd {
    pub ledger_id: Uuid,
    pub obligation_id: Uuid,
    pub period_label: String,
    pub payment_date: NaiveDate,
    pub was_paid: bool,
    pub idempotency_key: Option<String>,
}

impl SettlementCmd {
    #[must_use]
    pub fn new(
        ledger_id: Uuid,
        obligation_id: Uuid,
        period_label: impl Into<String>,
        payment_date: NaiveDate,
        was_paid: bool,
    ) -> Self {
        Self {
            ledger_id,
            obligation_id,
            period_label: period_label.into(),
            payment_date,
            was_paid,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Open a receivable against a partner.
#[derive(Clone, Debug)]
pub struct ReceivableCmd {
    pub ledger_id: Uuid,
    pub partner_id: String,
    pub total_amount_minor: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub attachment_ref: Option<String>,
}

impl ReceivableCmd {
    #[must_use]
    pub fn new(
        ledger_id: Uuid,
        partner_id: impl Into<String>,
        total_amount_minor: i64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            ledger_id,
            partner_id: partner_id.into(),
            total_amount_minor,
            reason: reason.into(),
            reference: None,
            due_date: None,
            notes: None,
            attachment_ref: None,
        }
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A payment received against a receivable.
#[derive(Clone, Debug)]
pub struct NewPayment {
    pub amount_minor: i64,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub attachment_ref: Option<String>,
    pub idempotency_key: Option<String>,
}

impl NewPayment {
    #[must_use]
    pub fn new(amount_minor: i64, payment_date: NaiveDate, method: PaymentMethod) -> Self {
        Self {
            amount_minor,
            payment_date,
            method,
            reference: None,
            attachment_ref: None,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReceivableUpdate {
    pub total_amount_minor: Option<i64>,
    pub reason: Option<String>,
    pub reference: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
    pub attachment_ref: Option<Option<String>>,
    /// Recorded after the metadata changes, with `record_payment` rules.
    pub add_payment: Option<NewPayment>,
}
