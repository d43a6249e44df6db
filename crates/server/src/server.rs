use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::future::Future;
use std::sync::Arc;

use crate::{buckets, dashboard, investment, transactions};
use ledger::Ledger;

#[derive(Clone)]
pub struct ServerState {
    pub ledger: Arc<Ledger>,
    api_token: Arc<String>,
}

/// Compares the bearer token of every request with the configured API token.
///
/// A missing or mismatching credential is rejected before any handler runs.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if header.token() != state.api_token.as_str() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/inflow", post(transactions::inflow_new))
        .route("/expense", post(transactions::expense_new))
        .route("/investment", post(investment::update))
        .route("/transactions", get(transactions::list))
        .route("/buckets", get(buckets::list))
        .route("/buckets/:id", get(buckets::get))
        .route("/netWorth", get(dashboard::net_worth))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(ledger: Ledger, api_token: String) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(ledger, api_token, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    ledger: Ledger,
    api_token: String,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        ledger: Arc::new(ledger),
        api_token: Arc::new(api_token),
    };

    axum::serve(listener, router(state)).await
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn run_with_graceful_shutdown<F>(
    ledger: Ledger,
    api_token: String,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        ledger: Arc::new(ledger),
        api_token: Arc::new(api_token),
    };

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

pub fn spawn_with_listener(
    ledger: Ledger,
    api_token: String,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(ledger, api_token, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
