use std::sync::Arc;

use serde::Serialize;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use tracing::{error, info, warn};

use crate::{
    balance::{BalanceClient, BalanceResolver, SwapAmount},
    config::{ExecutorConfig, FallbackRoute},
    error::SwapError,
    keys::keypair_from_base64,
    ledger::{self, LedgerRpc},
    quote::QuoteRequest,
    swap::SwapRequest,
    tokens::TokenRegistry,
    transaction::TransactionSubmitter,
    JupiterClient,
};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwapResult {
    pub success: bool,
    pub input_token: String,
    pub output_token: String,
    pub input_amount: String,
    pub output_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the preferred output failed and the stable output was used instead.
    pub degraded: bool,
    /// The output the caller asked for, present only when `degraded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_output_token: Option<String>,
}

impl SwapResult {
    fn failure(input_token: String, output_token: String, err: &SwapError) -> Self {
        Self {
            success: false,
            input_token,
            output_token,
            input_amount: "0".to_string(),
            output_amount: "0".to_string(),
            tx_signature: None,
            error: Some(err.to_string()),
            degraded: false,
            requested_output_token: None,
        }
    }
}

pub struct SwapExecutor {
    jupiter: JupiterClient,
    balances: BalanceClient,
    resolver: BalanceResolver,
    submitter: TransactionSubmitter,
    ledger: Arc<dyn LedgerRpc>,
    config: ExecutorConfig,
}

impl SwapExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        let ledger: Arc<dyn LedgerRpc> = Arc::new(ledger::rpc_client(&config.cluster));
        Self::with_ledger(config, ledger)
    }

    pub fn with_ledger(config: ExecutorConfig, ledger: Arc<dyn LedgerRpc>) -> Self {
        let http = reqwest::Client::new();
        let jupiter = JupiterClient::new(http.clone(), config.jupiter_api_url.clone());
        let balances = BalanceClient::new(http, config.balances_api_url.clone());
        let resolver = BalanceResolver::new(balances.clone(), ledger.clone(), &config);
        let submitter = TransactionSubmitter::new(
            ledger.clone(),
            config.submit_attempts,
            config.confirm_poll_interval(),
        );

        Self {
            jupiter,
            balances,
            resolver,
            submitter,
            ledger,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.config.tokens
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerRpc> {
        &self.ledger
    }

    pub fn balances(&self) -> &BalanceClient {
        &self.balances
    }

    /// Quote, build, sign and confirm one swap. Errors never escape; they are
    /// reported through `SwapResult::error`.
    pub async fn execute_swap(
        &self,
        secret_key: &str,
        input_mint: Pubkey,
        output_mint: Pubkey,
        amount: SwapAmount,
    ) -> SwapResult {
        let tokens = self.tokens();
        let keypair = match keypair_from_base64(secret_key) {
            Ok(keypair) => keypair,
            Err(err) => {
                return SwapResult::failure(
                    tokens.label(&input_mint),
                    tokens.label(&output_mint),
                    &err,
                )
            }
        };

        let err = match self.run(&keypair, &input_mint, &output_mint, amount).await {
            Ok(result) => return result,
            Err(err) => err,
        };
        error!(
            owner = %keypair.pubkey(),
            input = %tokens.label(&input_mint),
            output = %tokens.label(&output_mint),
            error = %err,
            "swap failed"
        );

        if let Some(route) = self.fallback_for(&input_mint, &output_mint, &err) {
            warn!(
                stable = %tokens.label(&route.stable),
                "retrying swap with stable output"
            );
            match self.run(&keypair, &input_mint, &route.stable, amount).await {
                Ok(mut result) => {
                    result.degraded = true;
                    result.requested_output_token = Some(tokens.label(&output_mint));
                    return result;
                }
                Err(fallback_err) => {
                    error!(error = %fallback_err, "stable fallback also failed");
                }
            }
        }

        SwapResult::failure(tokens.label(&input_mint), tokens.label(&output_mint), &err)
    }

    fn fallback_for(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        err: &SwapError,
    ) -> Option<&FallbackRoute> {
        self.config.fallback.as_ref().filter(|route| {
            route.preferred == *output_mint
                && route.stable != *input_mint
                && err.depends_on_output()
        })
    }

    async fn run(
        &self,
        keypair: &Keypair,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: SwapAmount,
    ) -> Result<SwapResult, SwapError> {
        let owner = keypair.pubkey();
        let amount = self.resolver.resolve(&owner, input_mint, amount).await?;

        let quote = self
            .jupiter
            .quote(&QuoteRequest {
                input_mint: *input_mint,
                output_mint: *output_mint,
                amount,
                slippage_bps: self.config.slippage_bps,
                ..Default::default()
            })
            .await
            .map_err(SwapError::Quote)?;
        let (in_amount, out_amount) = (quote.in_amount, quote.out_amount);
        info!(
            in_amount,
            out_amount,
            steps = quote.route_plan.len(),
            "quote received"
        );

        let swap = self
            .jupiter
            .swap_transaction(&SwapRequest {
                user_public_key: owner,
                quote_response: quote,
                config: self.config.transaction.clone(),
            })
            .await
            .map_err(SwapError::Build)?;

        let signature = self.submitter.execute(&swap.swap_transaction, keypair).await?;

        let tokens = self.tokens();
        Ok(SwapResult {
            success: true,
            input_token: tokens.label(input_mint),
            output_token: tokens.label(output_mint),
            input_amount: in_amount.to_string(),
            output_amount: out_amount.to_string(),
            tx_signature: Some(signature.to_string()),
            error: None,
            degraded: false,
            requested_output_token: None,
        })
    }
}
