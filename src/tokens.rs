use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::{error::SwapError, serde_helpers::field_as_string};

pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const JUP_MINT: &str = "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN";

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
pub const DEFAULT_SOL_FEE_RESERVE: u64 = 10_000_000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub symbol: String,
    #[serde(with = "field_as_string")]
    pub mint: Pubkey,
    pub decimals: u8,
    /// Base units held back from "swap max" requests to pay network fees.
    #[serde(default)]
    pub fee_reserve: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TokenRegistry {
    tokens: Vec<TokenInfo>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new(vec![
            known("SOL", SOL_MINT, 9, DEFAULT_SOL_FEE_RESERVE),
            known("USDC", USDC_MINT, 6, 0),
            known("JUP", JUP_MINT, 6, 0),
        ])
    }
}

fn known(symbol: &str, mint: &str, decimals: u8, fee_reserve: u64) -> TokenInfo {
    TokenInfo {
        symbol: symbol.to_string(),
        // compile-time constants, always valid base58
        mint: Pubkey::from_str_const(mint),
        decimals,
        fee_reserve,
    }
}

impl TokenRegistry {
    pub fn new(tokens: Vec<TokenInfo>) -> Self {
        Self { tokens }
    }

    pub fn with_fee_reserve(mut self, symbol: &str, fee_reserve: u64) -> Self {
        for token in self.tokens.iter_mut() {
            if token.symbol.eq_ignore_ascii_case(symbol) {
                token.fee_reserve = fee_reserve;
            }
        }
        self
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenInfo> {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn by_mint(&self, mint: &Pubkey) -> Option<&TokenInfo> {
        self.tokens.iter().find(|t| &t.mint == mint)
    }

    /// Accepts either a registered symbol or a mint address.
    pub fn resolve_mint(&self, token: &str) -> Result<Pubkey, SwapError> {
        if let Some(info) = self.by_symbol(token) {
            return Ok(info.mint);
        }
        Pubkey::from_str(token).map_err(|_| SwapError::UnknownToken(token.to_string()))
    }

    pub fn label(&self, mint: &Pubkey) -> String {
        self.by_mint(mint)
            .map(|t| t.symbol.clone())
            .unwrap_or_else(|| mint.to_string())
    }

    pub fn native_mint(&self) -> Pubkey {
        Pubkey::from_str_const(SOL_MINT)
    }

    pub fn is_native(&self, mint: &Pubkey) -> bool {
        *mint == self.native_mint()
    }

    pub fn fee_reserve(&self, mint: &Pubkey) -> u64 {
        self.by_mint(mint).map_or(0, |t| t.fee_reserve)
    }
}

/// Converts a decimal string such as `"0.002"` into base units without
/// going through floating point.
pub fn ui_to_base_units(amount: &str, decimals: u8) -> Result<u64, SwapError> {
    let invalid = || SwapError::InvalidAmount(amount.to_string());
    let amount = amount.trim();
    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let decimals = decimals as usize;
    // digits beyond the token's precision are truncated
    let fraction: String = fraction.chars().take(decimals).collect();
    let padded = format!("{:0<width$}", fraction, width = decimals);

    let scale = 10u64.checked_pow(decimals as u32).ok_or_else(invalid)?;
    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: u64 = if padded.is_empty() {
        0
    } else {
        padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(invalid)
}

pub fn base_units_to_ui(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}
