use crate::quote::{QuoteRequest, QuoteResponse};
use crate::swap::{SwapRequest, SwapResponse};
use reqwest::Response;
use thiserror::Error;
use tracing::debug;

pub mod api;
pub mod balance;
pub mod config;
pub mod error;
pub mod executor;
pub mod keys;
pub mod ledger;
pub mod quote;
pub mod serde_helpers;
pub mod swap;
pub mod tokens;
pub mod transaction;
pub mod wallet;

pub use error::SwapError;
pub use executor::{SwapExecutor, SwapResult};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed with status {status}: {body}")]
    RequestFailed {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

#[derive(Clone)]
pub struct JupiterClient {
    client: reqwest::Client,
    base_path: String,
}

impl JupiterClient {
    pub fn new(client: reqwest::Client, base_path: String) -> Self {
        Self {
            client,
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    pub async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ClientError> {
        let params = build_query_params(request);
        debug!(?params, "requesting quote");

        let response = self
            .client
            .get(format!("{}/quote", self.base_path))
            .query(&params)
            .header("Accept", "application/json")
            .send()
            .await?;

        let response = check_response(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    pub async fn swap_transaction(
        &self,
        request: &SwapRequest,
    ) -> Result<SwapResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/swap", self.base_path))
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        let response = check_response(response).await?;
        let body = response.text().await?;
        let swap: SwapResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        if swap.swap_transaction.is_empty() {
            return Err(ClientError::InvalidResponse(
                "empty swapTransaction".to_string(),
            ));
        }
        Ok(swap)
    }
}

fn build_query_params(request: &QuoteRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("inputMint", request.input_mint.to_string()),
        ("outputMint", request.output_mint.to_string()),
        ("amount", request.amount.to_string()),
        ("slippageBps", request.slippage_bps.to_string()),
    ];

    if let Some(swap_mode) = &request.swap_mode {
        params.push(("swapMode", swap_mode.as_str().to_string()));
    }
    if let Some(only_direct_routes) = request.only_direct_routes {
        params.push(("onlyDirectRoutes", only_direct_routes.to_string()));
    }
    if let Some(max_accounts) = request.max_accounts {
        params.push(("maxAccounts", max_accounts.to_string()));
    }
    if let Some(ref excluded_dexes) = request.excluded_dexes {
        params.push(("excludeDexes", excluded_dexes.join(",")));
    }

    params
}

pub(crate) async fn check_response(response: Response) -> Result<Response, ClientError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    Err(ClientError::RequestFailed { status, body })
}
