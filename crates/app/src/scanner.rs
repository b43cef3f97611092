//! Periodic due-date scan: obligations due soon or overdue and overdue
//! receivables are handed to a [`Notifier`].

use std::{sync::Arc, time::Duration};

use chrono::{NaiveDate, Utc};
use engine::{DueStatus, Engine, EngineError, ObligationAlert, Receivable};

#[derive(Debug)]
pub enum Alert {
    Obligation {
        ledger: String,
        alert: ObligationAlert,
    },
    Receivable {
        ledger: String,
        receivable: Receivable,
    },
}

pub trait Notifier: Send + Sync {
    fn notify(&self, alert: &Alert);
}

/// Writes every alert to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, alert: &Alert) {
        match alert {
            Alert::Obligation { ledger, alert } => {
                let obligation = &alert.obligation;
                let due = obligation
                    .next_due_date
                    .map(|date| date.to_string())
                    .unwrap_or_default();
                match alert.status {
                    DueStatus::Overdue => tracing::warn!(
                        ledger = %ledger,
                        obligation = %obligation.name,
                        due = %due,
                        amount_minor = obligation.amount_minor,
                        "obligation overdue"
                    ),
                    _ => tracing::info!(
                        ledger = %ledger,
                        obligation = %obligation.name,
                        due = %due,
                        amount_minor = obligation.amount_minor,
                        "obligation due soon"
                    ),
                }
            }
            Alert::Receivable { ledger, receivable } => tracing::warn!(
                ledger = %ledger,
                partner = %receivable.partner_id,
                outstanding_minor = receivable.outstanding_minor(),
                "receivable overdue"
            ),
        }
    }
}

/// Runs one scan over every ledger at `today`. Returns the number of alerts
/// dispatched.
pub async fn scan_once(
    engine: &Engine,
    notifier: &dyn Notifier,
    today: NaiveDate,
) -> Result<usize, EngineError> {
    let mut dispatched = 0;
    for ledger in engine.ledgers().await? {
        for alert in engine.obligation_alerts(ledger.id, today).await? {
            notifier.notify(&Alert::Obligation {
                ledger: ledger.name.clone(),
                alert,
            });
            dispatched += 1;
        }
        for receivable in engine.overdue_receivables(ledger.id, today).await? {
            notifier.notify(&Alert::Receivable {
                ledger: ledger.name.clone(),
                receivable,
            });
            dispatched += 1;
        }
    }
    Ok(dispatched)
}

pub async fn run(engine: Arc<Engine>, notifier: Arc<dyn Notifier>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let today = Utc::now().date_naive();
        match scan_once(&engine, notifier.as_ref(), today).await {
            Ok(count) => tracing::debug!(count, %today, "due-date scan done"),
            Err(err) => tracing::error!("due-date scan failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use engine::{
        MovementCmd, MovementKind, ObligationCmd, ObligationKind, Periodicity, ReceivableCmd,
    };
    use migration::MigratorTrait;
    use sea_orm::Database;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Notifier for Recorder {
        fn notify(&self, alert: &Alert) {
            let line = match alert {
                Alert::Obligation { alert, .. } => {
                    format!("{}:{:?}", alert.obligation.name, alert.status)
                }
                Alert::Receivable { receivable, .. } => receivable.partner_id.clone(),
            };
            self.0.lock().unwrap().push(line);
        }
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[tokio::test]
    async fn dispatches_due_obligations_and_overdue_receivables() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();
        let ledger = engine.new_ledger("Shop").await.unwrap();
        engine
            .record_movement(MovementCmd::new(
                ledger.id,
                MovementKind::Inflow,
                10_000,
                date(1, 1),
            ))
            .await
            .unwrap();

        engine
            .new_obligation(
                ObligationCmd::new(
                    ledger.id,
                    "Internet",
                    "utilities",
                    3000,
                    Periodicity::Monthly,
                    date(3, 12),
                )
                .kind(ObligationKind::Subscription),
            )
            .await
            .unwrap();
        engine
            .new_obligation(
                ObligationCmd::new(
                    ledger.id,
                    "Insurance",
                    "insurance",
                    9000,
                    Periodicity::Annual,
                    date(6, 1),
                )
                .kind(ObligationKind::FixedCharge),
            )
            .await
            .unwrap();
        engine
            .new_receivable(
                ReceivableCmd::new(ledger.id, "acme", 500, "Invoice 7").due_date(date(3, 1)),
            )
            .await
            .unwrap();

        let recorder = Recorder::default();
        let count = scan_once(&engine, &recorder, date(3, 10)).await.unwrap();

        assert_eq!(count, 2);
        let lines = recorder.0.lock().unwrap();
        assert_eq!(lines[0], "Internet:DueSoon");
        assert_eq!(lines[1], "acme");
    }
}
