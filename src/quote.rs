use std::str::FromStr;

use crate::serde_helpers::{field_as_string, option_field_as_string};
use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use solana_sdk::pubkey::Pubkey;

pub const DEFAULT_SLIPPAGE_BPS: u16 = 100;

#[derive(Serialize, Deserialize, Default, PartialEq, Clone, Debug)]
pub enum SwapMode {
    #[default]
    ExactIn,
    ExactOut,
}

impl SwapMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapMode::ExactIn => "ExactIn",
            SwapMode::ExactOut => "ExactOut",
        }
    }
}

impl FromStr for SwapMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ExactIn" => Ok(Self::ExactIn),
            "ExactOut" => Ok(Self::ExactOut),
            _ => Err(anyhow!("{} is not a valid SwapMode", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub swap_info: SwapInfo,
    pub percent: Option<u8>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    #[serde(with = "field_as_string")]
    pub amm_key: Pubkey,
    #[serde(default)]
    pub label: String,
    #[serde(with = "field_as_string")]
    pub input_mint: Pubkey,
    #[serde(with = "field_as_string")]
    pub output_mint: Pubkey,
    #[serde(with = "field_as_string")]
    pub in_amount: u64,
    #[serde(with = "field_as_string")]
    pub out_amount: u64,
    #[serde(with = "option_field_as_string", default)]
    pub fee_amount: Option<u64>,
    #[serde(with = "option_field_as_string", default)]
    pub fee_mint: Option<Pubkey>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformFee {
    #[serde(with = "field_as_string")]
    pub amount: u64,
    pub fee_bps: u16,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(with = "field_as_string")]
    pub input_mint: Pubkey,
    #[serde(with = "field_as_string")]
    pub in_amount: u64,
    #[serde(with = "field_as_string")]
    pub output_mint: Pubkey,
    #[serde(with = "field_as_string")]
    pub out_amount: u64,
    #[serde(with = "field_as_string")]
    pub other_amount_threshold: u64,
    #[serde(default)]
    pub swap_mode: SwapMode,
    pub slippage_bps: u16,
    #[serde(default)]
    pub platform_fee: Option<PlatformFee>,
    #[serde(default)]
    pub price_impact_pct: String,
    #[serde(default)]
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(default)]
    pub context_slot: Option<u64>,
    #[serde(default)]
    pub time_taken: Option<f64>,
    // posted back to /swap unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(with = "field_as_string")]
    pub input_mint: Pubkey,
    #[serde(with = "field_as_string")]
    pub output_mint: Pubkey,
    #[serde(with = "field_as_string")]
    pub amount: u64,
    pub slippage_bps: u16,
    pub swap_mode: Option<SwapMode>,
    pub only_direct_routes: Option<bool>,
    pub max_accounts: Option<usize>,
    pub excluded_dexes: Option<Vec<String>>,
}

impl Default for QuoteRequest {
    fn default() -> Self {
        Self {
            input_mint: Pubkey::default(),
            output_mint: Pubkey::default(),
            amount: 0,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            swap_mode: None,
            only_direct_routes: None,
            max_accounts: None,
            excluded_dexes: None,
        }
    }
}
