use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use jupiter_swap_executor::{
    api::{ApiReply, SwapTokensRequest, WalletRequest, WalletService},
    config::ExecutorConfig,
    SwapExecutor,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::from_path("demos/.env").ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ExecutorConfig::from_env()?;
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    info!(cluster = %config.cluster, jupiter = %config.jupiter_api_url, "starting swap server");

    let service = WalletService::new(Arc::new(SwapExecutor::new(config)));
    let app = Router::new()
        .route("/api/generateWallet", post(generate_wallet))
        .route("/api/getWalletBalance", post(wallet_balance))
        .route("/api/getTokenBalances", post(token_balances))
        .route("/api/swapTokens", post(swap_tokens))
        .with_state(service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn generate_wallet(State(service): State<WalletService>) -> Response {
    reply(service.generate_wallet())
}

async fn wallet_balance(
    State(service): State<WalletService>,
    Json(request): Json<WalletRequest>,
) -> Response {
    reply(service.wallet_balance(request).await)
}

async fn token_balances(
    State(service): State<WalletService>,
    Json(request): Json<WalletRequest>,
) -> Response {
    reply(service.token_balances(request).await)
}

async fn swap_tokens(
    State(service): State<WalletService>,
    Json(request): Json<SwapTokensRequest>,
) -> Response {
    reply(service.swap_tokens(request).await)
}

fn reply(reply: ApiReply) -> Response {
    (reply.status, Json(reply.body)).into_response()
}
