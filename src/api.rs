use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use tracing::{error, info};

use crate::{
    balance::SwapAmount,
    error::SwapError,
    executor::SwapExecutor,
    keys::parse_address,
    tokens::{base_units_to_ui, ui_to_base_units, SOL_MINT, USDC_MINT},
    wallet::generate_wallet,
};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct WalletRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SwapTokensRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub input_token: Option<String>,
    #[serde(default)]
    pub output_token: Option<String>,
    /// Balance shown in the UI, in whole input-token units. Accepts a string or a number.
    #[serde(default)]
    pub confirmed_balance: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "success": false, "error": message.into() }),
        }
    }
}

#[derive(Clone)]
pub struct WalletService {
    executor: Arc<SwapExecutor>,
}

impl WalletService {
    pub fn new(executor: Arc<SwapExecutor>) -> Self {
        Self { executor }
    }

    pub fn generate_wallet(&self) -> ApiReply {
        match generate_wallet() {
            Ok(wallet) => {
                info!(address = %wallet.address, "generated wallet");
                ApiReply::ok(json!({
                    "success": true,
                    "address": wallet.address,
                    "seedPhrase": wallet.seed_phrase,
                    "secretKey": wallet.secret_key,
                }))
            }
            Err(err) => {
                error!(error = %err, "wallet generation failed");
                ApiReply::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate wallet")
            }
        }
    }

    pub async fn wallet_balance(&self, request: WalletRequest) -> ApiReply {
        let Some((address, owner)) = valid_address(request.wallet_address.as_deref()) else {
            return ApiReply::error(StatusCode::BAD_REQUEST, "Invalid wallet address");
        };

        match self.executor.ledger().get_balance(&owner).await {
            Ok(lamports) => {
                let decimals = self
                    .executor
                    .tokens()
                    .by_mint(&self.executor.tokens().native_mint())
                    .map_or(9, |t| t.decimals);
                ApiReply::ok(json!({
                    "success": true,
                    "address": address,
                    "balance": base_units_to_ui(lamports, decimals),
                }))
            }
            Err(err) => {
                error!(%owner, error = %err, "balance lookup failed");
                ApiReply::error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }

    pub async fn token_balances(&self, request: WalletRequest) -> ApiReply {
        let Some((address, owner)) = valid_address(request.wallet_address.as_deref()) else {
            return ApiReply::error(StatusCode::BAD_REQUEST, "Invalid wallet address");
        };

        match self
            .executor
            .balances()
            .token_balances(&owner, self.executor.tokens())
            .await
        {
            Ok(balances) => ApiReply::ok(json!({
                "success": true,
                "address": address,
                "balances": balances,
            })),
            Err(err) => {
                error!(%owner, error = %err, "token balance lookup failed");
                ApiReply::error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }

    pub async fn swap_tokens(&self, request: SwapTokensRequest) -> ApiReply {
        let Some((address, _)) = valid_address(request.wallet_address.as_deref()) else {
            return ApiReply::error(StatusCode::BAD_REQUEST, "Invalid wallet address");
        };
        let Some(secret_key) = request.secret_key.filter(|s| !s.is_empty()) else {
            return ApiReply::error(StatusCode::BAD_REQUEST, "Secret key is required");
        };

        let (input_mint, output_mint, amount) = match self.swap_parameters(
            request.input_token.as_deref(),
            request.output_token.as_deref(),
            request.confirmed_balance.as_ref(),
        ) {
            Ok(params) => params,
            Err(err) => return ApiReply::error(StatusCode::BAD_REQUEST, err.to_string()),
        };
        info!(
            wallet = %address,
            input = %input_mint,
            output = %output_mint,
            ?amount,
            "swap requested"
        );

        let result = self
            .executor
            .execute_swap(&secret_key, input_mint, output_mint, amount)
            .await;

        if result.success {
            ApiReply::ok(json!({
                "success": true,
                "walletAddress": address,
                "swapResult": {
                    "inputToken": result.input_token,
                    "outputToken": result.output_token,
                    "inputAmount": result.input_amount,
                    "outputAmount": result.output_amount,
                    "txSignature": result.tx_signature,
                    "degraded": result.degraded,
                    "requestedOutputToken": result.requested_output_token,
                },
            }))
        } else {
            ApiReply {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: json!({
                    "success": false,
                    "error": result.error.unwrap_or_else(|| "Swap failed".to_string()),
                    "walletAddress": address,
                }),
            }
        }
    }

    fn swap_parameters(
        &self,
        input_token: Option<&str>,
        output_token: Option<&str>,
        confirmed_balance: Option<&Value>,
    ) -> Result<(Pubkey, Pubkey, SwapAmount), SwapError> {
        let tokens = self.executor.tokens();
        let input_mint = tokens.resolve_mint(non_empty(input_token).unwrap_or(SOL_MINT))?;
        let output_mint = tokens.resolve_mint(non_empty(output_token).unwrap_or(USDC_MINT))?;

        let amount = match confirmed_balance {
            None | Some(Value::Null) => SwapAmount::Max,
            Some(value) => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    other => return Err(SwapError::InvalidAmount(other.to_string())),
                };
                let decimals = tokens
                    .by_mint(&input_mint)
                    .map(|t| t.decimals)
                    .ok_or_else(|| SwapError::UnknownToken(input_mint.to_string()))?;
                SwapAmount::ConfirmedBalance(ui_to_base_units(&text, decimals)?)
            }
        };

        Ok((input_mint, output_mint, amount))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn valid_address(address: Option<&str>) -> Option<(String, Pubkey)> {
    let address = address?.trim();
    parse_address(address)
        .ok()
        .map(|owner| (address.to_string(), owner))
}
