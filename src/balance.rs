use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info, warn};

use crate::{
    check_response,
    config::{ExecutorConfig, ZeroAmountPolicy},
    error::SwapError,
    ledger::LedgerRpc,
    serde_helpers::field_as_string,
    tokens::TokenRegistry,
    ClientError,
};

/// Key the balances endpoint uses for the native token.
const NATIVE_BALANCE_KEY: &str = "SOL";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBalance {
    #[serde(with = "field_as_string")]
    pub amount: u64,
    #[serde(default)]
    pub ui_amount: f64,
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub is_frozen: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    #[serde(with = "field_as_string")]
    pub mint: Pubkey,
    #[serde(with = "field_as_string")]
    pub owner: Pubkey,
    #[serde(with = "field_as_string")]
    pub amount: u64,
    pub decimals: u8,
    pub ui_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

#[derive(Clone)]
pub struct BalanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl BalanceClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub async fn balances(
        &self,
        owner: &Pubkey,
    ) -> Result<HashMap<String, RemoteBalance>, ClientError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url.trim_end_matches('/'), owner))
            .header("Accept", "application/json")
            .send()
            .await?;

        let response = check_response(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    pub async fn token_balances(
        &self,
        owner: &Pubkey,
        tokens: &TokenRegistry,
    ) -> Result<Vec<TokenBalance>, ClientError> {
        let raw = self.balances(owner).await?;

        let mut balances: Vec<TokenBalance> = raw
            .into_iter()
            .filter_map(|(key, balance)| {
                let info = if key == NATIVE_BALANCE_KEY {
                    tokens.by_mint(&tokens.native_mint())
                } else {
                    tokens.by_symbol(&key)
                };
                let mint = match info {
                    Some(info) => info.mint,
                    None => key.parse().ok()?,
                };
                let info = tokens.by_mint(&mint);
                Some(TokenBalance {
                    mint,
                    owner: *owner,
                    amount: balance.amount,
                    decimals: info.map_or_else(
                        || infer_decimals(balance.amount, balance.ui_amount),
                        |t| t.decimals,
                    ),
                    ui_amount: balance.ui_amount,
                    symbol: info.map(|t| t.symbol.clone()),
                })
            })
            .collect();

        balances.sort_by(|a, b| b.ui_amount.total_cmp(&a.ui_amount));
        Ok(balances)
    }
}

/// Recovers the decimal count of an unregistered mint from the
/// `(base units, ui amount)` pair the endpoint reports.
fn infer_decimals(amount: u64, ui_amount: f64) -> u8 {
    if amount == 0 || ui_amount <= 0.0 {
        return 0;
    }
    let decimals = (amount as f64 / ui_amount).log10().round();
    decimals.clamp(0.0, 18.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAmount {
    Max,
    /// A balance the caller already knows, in base units; the fee reserve still applies.
    ConfirmedBalance(u64),
    Exact(u64),
}

pub struct BalanceResolver {
    balances: BalanceClient,
    ledger: Arc<dyn LedgerRpc>,
    tokens: TokenRegistry,
    minimum_swap_amount: u64,
    non_native_placeholder_amount: u64,
    zero_amount_policy: ZeroAmountPolicy,
}

impl BalanceResolver {
    pub fn new(balances: BalanceClient, ledger: Arc<dyn LedgerRpc>, config: &ExecutorConfig) -> Self {
        Self {
            balances,
            ledger,
            tokens: config.tokens.clone(),
            minimum_swap_amount: config.minimum_swap_amount,
            non_native_placeholder_amount: config.non_native_placeholder_amount,
            zero_amount_policy: config.zero_amount_policy,
        }
    }

    /// Base units of `input_mint` to quote. Never returns zero.
    pub async fn resolve(
        &self,
        owner: &Pubkey,
        input_mint: &Pubkey,
        amount: SwapAmount,
    ) -> Result<u64, SwapError> {
        let (resolved, from_balance) = match amount {
            SwapAmount::Exact(amount) => (amount, false),
            SwapAmount::ConfirmedBalance(balance) => (self.after_reserve(input_mint, balance), true),
            SwapAmount::Max if self.tokens.is_native(input_mint) => {
                let balance = self.native_balance(owner).await?;
                (self.after_reserve(input_mint, balance), true)
            }
            SwapAmount::Max => {
                debug!(%input_mint, "no balance lookup for non-native input, using placeholder");
                (self.non_native_placeholder_amount, false)
            }
        };

        if resolved > 0 {
            debug!(amount = resolved, "resolved swap amount");
            return Ok(resolved);
        }

        match self.zero_amount_policy {
            ZeroAmountPolicy::Floor if self.minimum_swap_amount > 0 => {
                info!(
                    minimum = self.minimum_swap_amount,
                    "resolved amount is zero, using minimum swap amount"
                );
                Ok(self.minimum_swap_amount)
            }
            ZeroAmountPolicy::Floor => {
                warn!("resolved amount is zero and no minimum swap amount is configured");
                Err(SwapError::ZeroAmount)
            }
            ZeroAmountPolicy::Reject if from_balance => Err(SwapError::InsufficientBalance(
                format!("balance does not cover the fee reserve of {}", self.tokens.label(input_mint)),
            )),
            ZeroAmountPolicy::Reject => Err(SwapError::ZeroAmount),
        }
    }

    fn after_reserve(&self, mint: &Pubkey, balance: u64) -> u64 {
        let reserve = self.tokens.fee_reserve(mint);
        let remaining = balance.saturating_sub(reserve);
        debug!(balance, reserve, remaining, "applied fee reserve");
        remaining
    }

    async fn native_balance(&self, owner: &Pubkey) -> Result<u64, SwapError> {
        match self.balances.balances(owner).await {
            Ok(map) => {
                if let Some(sol) = map.get(NATIVE_BALANCE_KEY) {
                    debug!(lamports = sol.amount, "balance from aggregator");
                    return Ok(sol.amount);
                }
                warn!(%owner, "aggregator balances carry no SOL entry, asking the ledger");
            }
            Err(err) => {
                warn!(%owner, error = %err, "aggregator balance lookup failed, asking the ledger");
            }
        }

        let lamports = self.ledger.get_balance(owner).await?;
        debug!(lamports, "balance from ledger");
        Ok(lamports)
    }
}
