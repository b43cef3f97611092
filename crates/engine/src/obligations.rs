//! Recurring obligations: subscriptions and fixed charges.
//!
//! An obligation repeats on a [`Periodicity`] and carries the date its next
//! period falls due. Settling a period records an expense and moves
//! `next_due_date` forward by one period (see `ops::settlements`).
//!
//! Everything in this module is pure: schedule arithmetic, due-date
//! classification and period labels never touch the database.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{normalize_required_text, parse_uuid, require_positive_amount},
};

/// Default number of days before the due date an obligation starts alerting.
pub const DEFAULT_ALERT_WINDOW_DAYS: i32 = 7;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Periodicity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Bimonthly => "bimonthly",
            Self::Quarterly => "quarterly",
            Self::Semiannual => "semiannual",
            Self::Annual => "annual",
        }
    }

    /// Length of one period in calendar months.
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Bimonthly => 2,
            Self::Quarterly => 3,
            Self::Semiannual => 6,
            Self::Annual => 12,
        }
    }

    /// Adds one period to `from`.
    ///
    /// The day of month is preserved and clamped to the last day of the target
    /// month when it does not exist there (Jan 31 + 1 month = Feb 28/29,
    /// Feb 29 + 1 year = Feb 28 on a non-leap year).
    pub fn advance(self, from: NaiveDate) -> ResultEngine<NaiveDate> {
        from.checked_add_months(Months::new(self.months()))
            .ok_or_else(|| EngineError::InvalidInput(format!("date out of range: {from}")))
    }

    /// Human label of the period containing `today`, used to prefill a
    /// settlement. Periods are aligned on the calendar year.
    pub fn period_label(self, today: NaiveDate) -> String {
        let year = today.year();
        let month0 = today.month0() as usize;
        match self {
            Self::Monthly => format!("{} {year}", MONTH_NAMES[month0]),
            Self::Bimonthly => {
                let first = month0 - month0 % 2;
                format!("{}-{} {year}", MONTH_NAMES[first], MONTH_NAMES[first + 1])
            }
            Self::Quarterly => format!("Q{} {year}", month0 / 3 + 1),
            Self::Semiannual => {
                if month0 < 6 {
                    format!("1st Half {year}")
                } else {
                    format!("2nd Half {year}")
                }
            }
            Self::Annual => year.to_string(),
        }
    }
}

impl TryFrom<&str> for Periodicity {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "monthly" => Ok(Self::Monthly),
            "bimonthly" => Ok(Self::Bimonthly),
            "quarterly" => Ok(Self::Quarterly),
            "semiannual" => Ok(Self::Semiannual),
            "annual" => Ok(Self::Annual),
            other => Err(EngineError::InvalidInput(format!(
                "invalid periodicity: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationKind {
    #[default]
    Subscription,
    FixedCharge,
}

impl ObligationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::FixedCharge => "fixed_charge",
        }
    }
}

impl TryFrom<&str> for ObligationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "subscription" => Ok(Self::Subscription),
            "fixed_charge" => Ok(Self::FixedCharge),
            other => Err(EngineError::InvalidInput(format!(
                "invalid obligation kind: {other}"
            ))),
        }
    }
}

/// Where an obligation stands relative to a given day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Ok,
    DueSoon,
    Overdue,
    Dormant,
}

impl DueStatus {
    /// `true` for the statuses that deserve a notification.
    pub fn needs_attention(self) -> bool {
        matches!(self, Self::DueSoon | Self::Overdue)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringObligation {
    pub id: Uuid,
    pub ledger_id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

impl RecurringObligation {
    /// Creates an active obligation whose first period falls due on
    /// `start_date`.
    pub fn new(
        ledger_id: Uuid,
        kind: ObligationKind,
        name: &str,
        category: &str,
        amount_minor: i64,
        periodicity: Periodicity,
        start_date: NaiveDate,
    ) -> ResultEngine<Self> {
        require_positive_amount(amount_minor, "amount_minor")?;
        Ok(Self {
            id: Uuid::new_v4(),
            ledger_id,
            kind,
            name: normalize_required_text(name, "name")?,
            category: normalize_required_text(category, "category")?,
            amount_minor,
            periodicity,
            start_date,
            end_date: None,
            active: true,
            next_due_date: Some(start_date),
            alert_window_days: DEFAULT_ALERT_WINDOW_DAYS,
            notes: None,
            created_at: Utc::now(),
        })
    }

    /// Checks the invariants that span several fields.
    pub fn validate(&self) -> ResultEngine<()> {
        require_positive_amount(self.amount_minor, "amount_minor")?;
        if let Some(end) = self.end_date
            && end < self.start_date
        {
            return Err(EngineError::InvalidInput(format!(
                "end_date {end} is before start_date {}",
                self.start_date
            )));
        }
        if self.alert_window_days < 0 {
            return Err(EngineError::InvalidInput(
                "alert_window_days must be >= 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_dormant(&self, today: NaiveDate) -> bool {
        !self.active || self.end_date.is_some_and(|end| end < today)
    }

    pub fn classify(&self, today: NaiveDate) -> DueStatus {
        if self.is_dormant(today) {
            return DueStatus::Dormant;
        }
        let Some(next_due) = self.next_due_date else {
            return DueStatus::Ok;
        };
        let days_until = (next_due - today).num_days();
        if days_until < 0 {
            DueStatus::Overdue
        } else if days_until <= i64::from(self.alert_window_days) {
            DueStatus::DueSoon
        } else {
            DueStatus::Ok
        }
    }

    /// Next due date one period after `from`.
    ///
    /// A dormant obligation (judged at `from`) has no schedule to advance.
    pub fn advance_from(&self, from: NaiveDate) -> ResultEngine<NaiveDate> {
        if self.is_dormant(from) {
            return Err(EngineError::ConflictingState(format!(
                "obligation '{}' is dormant",
                self.name
            )));
        }
        self.periodicity.advance(from)
    }

    pub fn current_period_label(&self, today: NaiveDate) -> String {
        self.periodicity.period_label(today)
    }

    /// Description of the expense recorded when a period is settled.
    pub fn settlement_description(&self, period_label: &str, was_paid: bool) -> String {
        let suffix = if was_paid { "(Paid)" } else { "(Unpaid)" };
        format!("{} - {period_label} {suffix}", self.name)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "obligations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub ledger_id: String,
    pub kind: String,
    pub name: String,
    pub category: String,
    pub amount_minor: i64,
    pub periodicity: String,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub active: bool,
    pub next_due_date: Option<Date>,
    pub alert_window_days: i32,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::settlements::Entity")]
    Settlements,
    #[sea_orm(
        belongs_to = "super::ledgers::Entity",
        from = "Column::LedgerId",
        to = "super::ledgers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Ledgers,
}

impl Related<super::settlements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Settlements.def()
    }
}

impl Related<super::ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RecurringObligation> for ActiveModel {
    fn from(value: &RecurringObligation) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            ledger_id: ActiveValue::Set(value.ledger_id.to_string()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            name: ActiveValue::Set(value.name.clone()),
            category: ActiveValue::Set(value.category.clone()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            periodicity: ActiveValue::Set(value.periodicity.as_str().to_string()),
            start_date: ActiveValue::Set(value.start_date),
            end_date: ActiveValue::Set(value.end_date),
            active: ActiveValue::Set(value.active),
            next_due_date: ActiveValue::Set(value.next_due_date),
            alert_window_days: ActiveValue::Set(value.alert_window_days),
            notes: ActiveValue::Set(value.notes.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for RecurringObligation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "obligation")?,
            ledger_id: parse_uuid(&model.ledger_id, "ledger")?,
            kind: ObligationKind::try_from(model.kind.as_str())?,
            name: model.name,
            category: model.category,
            amount_minor: model.amount_minor,
            periodicity: Periodicity::try_from(model.periodicity.as_str())?,
            start_date: model.start_date,
            end_date: model.end_date,
            active: model.active,
            next_due_date: model.next_due_date,
            alert_window_days: model.alert_window_days,
            notes: model.notes,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn internet() -> RecurringObligation {
        RecurringObligation::new(
            Uuid::new_v4(),
            ObligationKind::Subscription,
            "Internet",
            "utilities",
            4500,
            Periodicity::Monthly,
            date(2025, 1, 1),
        )
        .unwrap()
    }

    #[test]
    fn monthly_clamps_to_end_of_february() {
        assert_eq!(
            Periodicity::Monthly.advance(date(2025, 1, 31)).unwrap(),
            date(2025, 2, 28)
        );
        assert_eq!(
            Periodicity::Monthly.advance(date(2024, 1, 31)).unwrap(),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn longer_periods_preserve_day() {
        assert_eq!(
            Periodicity::Quarterly.advance(date(2025, 6, 15)).unwrap(),
            date(2025, 9, 15)
        );
        assert_eq!(
            Periodicity::Bimonthly.advance(date(2025, 12, 31)).unwrap(),
            date(2026, 2, 28)
        );
        assert_eq!(
            Periodicity::Semiannual.advance(date(2025, 8, 31)).unwrap(),
            date(2026, 2, 28)
        );
        assert_eq!(
            Periodicity::Annual.advance(date(2024, 2, 29)).unwrap(),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn classify_respects_alert_window() {
        let today = date(2025, 5, 10);
        let mut obligation = internet();
        obligation.next_due_date = Some(today + Duration::days(5));

        obligation.alert_window_days = 7;
        assert_eq!(obligation.classify(today), DueStatus::DueSoon);

        obligation.alert_window_days = 3;
        assert_eq!(obligation.classify(today), DueStatus::Ok);

        obligation.next_due_date = Some(today - Duration::days(1));
        assert_eq!(obligation.classify(today), DueStatus::Overdue);

        obligation.next_due_date = Some(today);
        obligation.alert_window_days = 0;
        assert_eq!(obligation.classify(today), DueStatus::DueSoon);
    }

    #[test]
    fn classify_without_due_date_is_ok() {
        let mut obligation = internet();
        obligation.next_due_date = None;
        assert_eq!(obligation.classify(date(2030, 1, 1)), DueStatus::Ok);
    }

    #[test]
    fn inactive_or_ended_is_dormant() {
        let today = date(2025, 5, 10);
        let mut obligation = internet();
        obligation.next_due_date = Some(today - Duration::days(30));

        obligation.active = false;
        assert_eq!(obligation.classify(today), DueStatus::Dormant);

        obligation.active = true;
        obligation.end_date = Some(date(2025, 5, 9));
        assert_eq!(obligation.classify(today), DueStatus::Dormant);

        obligation.end_date = Some(today);
        assert_eq!(obligation.classify(today), DueStatus::Overdue);
    }

    #[test]
    fn advance_from_rejects_dormant() {
        let mut obligation = internet();
        obligation.active = false;
        let err = obligation.advance_from(date(2025, 3, 1)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ConflictingState);
    }

    #[test]
    fn period_labels_bucket_by_month_range() {
        let may = date(2025, 5, 20);
        assert_eq!(Periodicity::Monthly.period_label(may), "May 2025");
        assert_eq!(Periodicity::Bimonthly.period_label(may), "May-June 2025");
        assert_eq!(Periodicity::Quarterly.period_label(may), "Q2 2025");
        assert_eq!(Periodicity::Semiannual.period_label(may), "1st Half 2025");
        assert_eq!(Periodicity::Annual.period_label(may), "2025");

        assert_eq!(Periodicity::Quarterly.period_label(date(2025, 3, 31)), "Q1 2025");
        assert_eq!(Periodicity::Quarterly.period_label(date(2025, 10, 1)), "Q4 2025");
        assert_eq!(
            Periodicity::Semiannual.period_label(date(2025, 7, 1)),
            "2nd Half 2025"
        );
        assert_eq!(
            Periodicity::Bimonthly.period_label(date(2025, 12, 1)),
            "November-December 2025"
        );
    }

    #[test]
    fn settlement_description_marks_paid_state() {
        let obligation = internet();
        assert_eq!(
            obligation.settlement_description("March 2025", true),
            "Internet - March 2025 (Paid)"
        );
        assert_eq!(
            obligation.settlement_description("March 2025", false),
            "Internet - March 2025 (Unpaid)"
        );
    }

    #[test]
    fn validate_rejects_end_before_start() {
        let mut obligation = internet();
        obligation.end_date = Some(date(2024, 12, 31));
        assert!(obligation.validate().is_err());
    }
}
