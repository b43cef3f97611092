//! Request and response bodies of the HTTP API.
//!
//! JSON keys are camelCase. Amounts are integers in minor units (cents).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in update bodies.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Query string carrying the reference day of a classification.
/// Defaults to the server's current date.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TodayQuery {
    pub today: Option<NaiveDate>,
}

pub mod ledger {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LedgerView {
        pub id: Uuid,
        pub name: String,
        pub balance_minor: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerList {
        pub ledgers: Vec<LedgerView>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MovementKind {
        Inflow,
        Outflow,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MovementNew {
        pub kind: MovementKind,
        /// Must be > 0. The kind carries the direction.
        pub amount_minor: i64,
        pub description: Option<String>,
        pub occurred_on: NaiveDate,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MovementView {
        pub id: Uuid,
        pub kind: MovementKind,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub occurred_on: NaiveDate,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StatementLine {
        #[serde(flatten)]
        pub movement: MovementView,
        /// Balance right after this movement. May be negative when an earlier
        /// inflow was deleted.
        pub running_balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LedgerStatement {
        pub id: Uuid,
        pub name: String,
        pub balance_minor: i64,
        pub movements: Vec<StatementLine>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BalanceCheck {
        pub stored_minor: i64,
        pub recomputed_minor: i64,
        pub drifted: bool,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseNew {
        pub description: String,
        pub amount_minor: i64,
        pub category: String,
        pub date: NaiveDate,
        pub receipt_ref: Option<String>,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    /// Metadata update. Never adjusts the ledger, even when the amount
    /// changes.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseUpdate {
        pub description: Option<String>,
        pub amount_minor: Option<i64>,
        pub category: Option<String>,
        pub date: Option<NaiveDate>,
        /// `null` clears the receipt reference.
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub receipt_ref: Option<Option<String>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseQuery {
        pub category: Option<String>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseView {
        pub id: Uuid,
        pub description: String,
        pub amount_minor: i64,
        pub category: String,
        pub date: NaiveDate,
        pub receipt_ref: Option<String>,
        /// Outflow posted when the expense was created.
        pub movement_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseUpdated {
        pub expense: ExpenseView,
        /// The amount no longer matches the outflow posted at creation.
        pub ledger_out_of_sync: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub expenses: Vec<ExpenseView>,
    }
}

pub mod obligation {
    use super::*;
    use crate::expense::ExpenseView;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Periodicity {
        Monthly,
        Bimonthly,
        Quarterly,
        Semiannual,
        Annual,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ObligationKind {
        Subscription,
        FixedCharge,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DueStatus {
        Ok,
        DueSoon,
        Overdue,
        Dormant,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ObligationNew {
        /// Defaults to `subscription`.
        pub kind: Option<ObligationKind>,
        pub name: String,
        pub category: String,
        pub amount_minor: i64,
        pub periodicity: Periodicity,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        /// Defaults to `startDate`.
        pub next_due_date: Option<NaiveDate>,
        /// Defaults to 7 days.
        pub alert_window_days: Option<i32>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ObligationUpdate {
        pub kind: Option<ObligationKind>,
        pub name: Option<String>,
        pub category: Option<String>,
        pub amount_minor: Option<i64>,
        pub periodicity: Option<Periodicity>,
        pub start_date: Option<NaiveDate>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub end_date: Option<Option<NaiveDate>>,
        pub active: Option<bool>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub next_due_date: Option<Option<NaiveDate>>,
        pub alert_window_days: Option<i32>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub notes: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ObligationView {
        pub id: Uuid,
        pub kind: ObligationKind,
        pub name: String,
        pub category: String,
        pub amount_minor: i64,
        pub periodicity: Periodicity,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        pub active: bool,
        pub next_due_date: Option<NaiveDate>,
        pub alert_window_days: i32,
        pub notes: Option<String>,
        /// Classification at the requested day.
        pub status: DueStatus,
        /// Suggested label of the period containing the requested day.
        pub current_period_label: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ObligationList {
        pub obligations: Vec<ObligationView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AdvanceRequest {
        pub from_date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AdvanceResponse {
        pub next_due_date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SettlementNew {
        pub period_label: String,
        pub payment_date: NaiveDate,
        pub was_paid: bool,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SettlementView {
        pub id: Uuid,
        pub obligation_id: Uuid,
        pub period_label: String,
        pub payment_date: NaiveDate,
        pub was_paid: bool,
        pub expense_id: Uuid,
        pub previous_due_date: Option<NaiveDate>,
        pub next_due_date: NaiveDate,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SettlementCreated {
        pub settlement: SettlementView,
        pub expense: Option<ExpenseView>,
        pub next_due_date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementList {
        pub settlements: Vec<SettlementView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AlertList {
        pub alerts: Vec<ObligationView>,
    }
}

pub mod receivable {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ReceivableStatus {
        Pending,
        Partial,
        Settled,
        Disputed,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentMethod {
        Cash,
        Transfer,
        Check,
        MobileMoney,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReceivableNew {
        pub partner_id: String,
        pub total_amount_minor: i64,
        pub reason: String,
        pub reference: Option<String>,
        pub due_date: Option<NaiveDate>,
        pub notes: Option<String>,
        pub attachment_ref: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentNew {
        pub amount_minor: i64,
        pub payment_date: NaiveDate,
        pub method: PaymentMethod,
        pub reference: Option<String>,
        pub attachment_ref: Option<String>,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReceivableUpdate {
        pub total_amount_minor: Option<i64>,
        pub reason: Option<String>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub reference: Option<Option<String>>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub due_date: Option<Option<NaiveDate>>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub notes: Option<Option<String>>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub attachment_ref: Option<Option<String>>,
        /// Recorded after the other changes, like `POST …/payments`.
        pub add_payment: Option<PaymentNew>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReceivableQuery {
        pub status: Option<ReceivableStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentView {
        pub id: Uuid,
        pub amount_minor: i64,
        pub payment_date: NaiveDate,
        pub method: PaymentMethod,
        pub reference: Option<String>,
        pub attachment_ref: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReceivableView {
        pub id: Uuid,
        pub partner_id: String,
        pub total_amount_minor: i64,
        pub paid_amount_minor: i64,
        pub outstanding_minor: i64,
        /// Received beyond the total. Overpayments are accepted.
        pub overpaid_minor: i64,
        pub reason: String,
        pub reference: Option<String>,
        pub due_date: Option<NaiveDate>,
        pub status: ReceivableStatus,
        pub notes: Option<String>,
        pub attachment_ref: Option<String>,
        pub created_at: DateTime<Utc>,
        /// Empty in listings.
        pub payments: Vec<PaymentView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceivableList {
        pub receivables: Vec<ReceivableView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentRecorded {
        pub payment: PaymentView,
        pub receivable: ReceivableView,
    }
}

#[cfg(test)]
mod tests {
    use super::expense::ExpenseUpdate;

    #[test]
    fn update_tells_null_from_absent() {
        let absent: ExpenseUpdate = serde_json::from_str(r#"{"amountMinor": 1200}"#).unwrap();
        assert_eq!(absent.amount_minor, Some(1200));
        assert_eq!(absent.receipt_ref, None);

        let cleared: ExpenseUpdate = serde_json::from_str(r#"{"receiptRef": null}"#).unwrap();
        assert_eq!(cleared.receipt_ref, Some(None));

        let set: ExpenseUpdate = serde_json::from_str(r#"{"receiptRef": "scan-1"}"#).unwrap();
        assert_eq!(set.receipt_ref, Some(Some("scan-1".to_string())));
    }
}
