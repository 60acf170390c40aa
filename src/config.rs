use std::{fmt, str::FromStr, time::Duration};

use ::config::{Config, Environment};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::{
    serde_helpers::field_as_string,
    swap::TransactionConfig,
    tokens::{TokenRegistry, JUP_MINT, USDC_MINT},
};

pub const ENV_PREFIX: &str = "SWAP";
pub const JUPITER_API_URL: &str = "https://lite-api.jup.ag/swap/v1";
pub const JUPITER_BALANCES_URL: &str = "https://lite-api.jup.ag/ultra/v1/balances";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("Failed to read configuration: {0}")]
    Source(#[from] ::config::ConfigError),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Cluster {
    #[default]
    MainnetBeta,
    Devnet,
    Testnet,
    Custom(String),
}

impl Cluster {
    pub fn rpc_url(&self) -> &str {
        match self {
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Custom(url) => url,
        }
    }
}

impl FromStr for Cluster {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet-beta" | "mainnet" => Ok(Cluster::MainnetBeta),
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            url if url.starts_with("http://") || url.starts_with("https://") => {
                Ok(Cluster::Custom(url.to_string()))
            }
            other => Err(ConfigError::Invalid {
                key: "SWAP_CLUSTER",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Cluster {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cluster> for String {
    fn from(cluster: Cluster) -> Self {
        cluster.to_string()
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cluster::MainnetBeta => f.write_str("mainnet-beta"),
            Cluster::Devnet => f.write_str("devnet"),
            Cluster::Testnet => f.write_str("testnet"),
            Cluster::Custom(url) => f.write_str(url),
        }
    }
}

/// What to do when the resolved swap amount comes out as zero.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroAmountPolicy {
    #[default]
    Floor,
    /// Fail with `SwapError::InsufficientBalance` when the zero came from a
    /// balance, `SwapError::ZeroAmount` otherwise.
    Reject,
}

impl FromStr for ZeroAmountPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "floor" => Ok(ZeroAmountPolicy::Floor),
            "reject" => Ok(ZeroAmountPolicy::Reject),
            other => Err(ConfigError::Invalid {
                key: "SWAP_ZERO_AMOUNT_POLICY",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FallbackRoute {
    #[serde(with = "field_as_string")]
    pub preferred: Pubkey,
    #[serde(with = "field_as_string")]
    pub stable: Pubkey,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ExecutorConfig {
    pub cluster: Cluster,
    pub jupiter_api_url: String,
    pub balances_api_url: String,
    pub slippage_bps: u16,
    pub minimum_swap_amount: u64,
    pub non_native_placeholder_amount: u64,
    pub zero_amount_policy: ZeroAmountPolicy,
    pub fallback: Option<FallbackRoute>,
    pub submit_attempts: usize,
    pub confirm_poll_interval_ms: u64,
    pub transaction: TransactionConfig,
    pub tokens: TokenRegistry,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            jupiter_api_url: JUPITER_API_URL.to_string(),
            balances_api_url: JUPITER_BALANCES_URL.to_string(),
            slippage_bps: crate::quote::DEFAULT_SLIPPAGE_BPS,
            minimum_swap_amount: 50_000_000,
            non_native_placeholder_amount: 1_000_000,
            zero_amount_policy: ZeroAmountPolicy::default(),
            fallback: Some(FallbackRoute {
                preferred: Pubkey::from_str_const(JUP_MINT),
                stable: Pubkey::from_str_const(USDC_MINT),
            }),
            submit_attempts: 3,
            confirm_poll_interval_ms: 500,
            transaction: TransactionConfig::default(),
            tokens: TokenRegistry::default(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
struct EnvOverrides {
    cluster: Option<Cluster>,
    jupiter_api_url: Option<String>,
    balances_api_url: Option<String>,
    slippage_bps: Option<u16>,
    minimum_swap_amount: Option<u64>,
    zero_amount_policy: Option<ZeroAmountPolicy>,
    sol_fee_reserve: Option<u64>,
    submit_attempts: Option<usize>,
    confirm_poll_interval_ms: Option<u64>,
}

impl ExecutorConfig {
    /// Defaults overridden by whichever `SWAP_*` variables are set, e.g.
    /// `SWAP_CLUSTER=devnet` or `SWAP_MINIMUM_SWAP_AMOUNT=50000000`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let overrides: EnvOverrides = Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        let mut config = Self::default();
        if let Some(cluster) = overrides.cluster {
            config.cluster = cluster;
        }
        if let Some(url) = overrides.jupiter_api_url {
            config.jupiter_api_url = url;
        }
        if let Some(url) = overrides.balances_api_url {
            config.balances_api_url = url;
        }
        if let Some(bps) = overrides.slippage_bps {
            config.slippage_bps = bps;
        }
        if let Some(min) = overrides.minimum_swap_amount {
            config.minimum_swap_amount = min;
        }
        if let Some(policy) = overrides.zero_amount_policy {
            config.zero_amount_policy = policy;
        }
        if let Some(reserve) = overrides.sol_fee_reserve {
            config.tokens = config.tokens.with_fee_reserve("SOL", reserve);
        }
        if let Some(attempts) = overrides.submit_attempts {
            config.submit_attempts = attempts;
        }
        if let Some(interval) = overrides.confirm_poll_interval_ms {
            config.confirm_poll_interval_ms = interval;
        }

        config.validate()?;
        Ok(config)
    }

    /// A zero floor would let the flow quote a zero amount.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zero_amount_policy == ZeroAmountPolicy::Floor && self.minimum_swap_amount == 0 {
            return Err(ConfigError::Invalid {
                key: "SWAP_MINIMUM_SWAP_AMOUNT",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }
}
