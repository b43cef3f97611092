use axum::{
    Router,
    routing::{delete, get, post},
};

use std::sync::Arc;

use crate::{expenses, ledgers, obligations, receivables};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/ledgers", post(ledgers::ledger_new).get(ledgers::list))
        .route("/ledgers/{ledger_id}", get(ledgers::statement))
        .route("/ledgers/{ledger_id}/movements", post(ledgers::movement_new))
        .route(
            "/ledgers/{ledger_id}/movements/{movement_id}",
            delete(ledgers::movement_delete),
        )
        .route(
            "/ledgers/{ledger_id}/balance/recompute",
            post(ledgers::recompute),
        )
        .route(
            "/ledgers/{ledger_id}/expenses",
            post(expenses::expense_new).get(expenses::list),
        )
        .route(
            "/ledgers/{ledger_id}/expenses/{expense_id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::remove),
        )
        .route(
            "/ledgers/{ledger_id}/obligations",
            post(obligations::obligation_new).get(obligations::list),
        )
        .route(
            "/ledgers/{ledger_id}/obligations/{obligation_id}",
            get(obligations::get)
                .put(obligations::update)
                .delete(obligations::remove),
        )
        .route(
            "/ledgers/{ledger_id}/obligations/{obligation_id}/advance",
            post(obligations::advance),
        )
        .route(
            "/ledgers/{ledger_id}/obligations/{obligation_id}/settlements",
            post(obligations::settlement_new).get(obligations::settlements),
        )
        .route("/ledgers/{ledger_id}/alerts", get(obligations::alerts))
        .route(
            "/ledgers/{ledger_id}/receivables",
            post(receivables::receivable_new).get(receivables::list),
        )
        .route(
            "/ledgers/{ledger_id}/receivables/overdue",
            get(receivables::overdue),
        )
        .route(
            "/ledgers/{ledger_id}/receivables/{receivable_id}",
            get(receivables::get)
                .put(receivables::update)
                .delete(receivables::remove),
        )
        .route(
            "/ledgers/{ledger_id}/receivables/{receivable_id}/payments",
            post(receivables::payment_new),
        )
        .route(
            "/ledgers/{ledger_id}/receivables/{receivable_id}/dispute",
            post(receivables::dispute).delete(receivables::clear_dispute),
        )
        .with_state(state)
}

pub async fn run(engine: Arc<Engine>, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState { engine };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
