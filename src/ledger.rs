use async_trait::async_trait;
use solana_client::{
    client_error::{ClientError as RpcClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::RpcSendTransactionConfig,
};
use solana_commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::TransactionError,
};
use thiserror::Error;

use crate::{config::Cluster, transaction::SwapTransaction};

const RPC_MAX_RETRIES: usize = 3;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC transport error: {0}")]
    Transport(String),
    #[error("{0}")]
    Rejected(String),
}

impl LedgerError {
    /// Transport failures never reached the node and may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transport(_))
    }
}

impl From<RpcClientError> for LedgerError {
    fn from(err: RpcClientError) -> Self {
        match err.kind() {
            ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => {
                LedgerError::Transport(err.to_string())
            }
            _ => LedgerError::Rejected(err.to_string()),
        }
    }
}

#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn get_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError>;

    async fn latest_blockhash(&self) -> Result<(Hash, u64), LedgerError>;

    async fn send_transaction(&self, tx: &SwapTransaction) -> Result<Signature, LedgerError>;

    /// `None` while the signature is still unknown at the configured commitment.
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, LedgerError>;

    async fn block_height(&self) -> Result<u64, LedgerError>;
}

pub fn rpc_client(cluster: &Cluster) -> RpcClient {
    RpcClient::new_with_commitment(cluster.rpc_url().to_string(), CommitmentConfig::confirmed())
}

#[async_trait]
impl LedgerRpc for RpcClient {
    async fn get_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError> {
        Ok(RpcClient::get_balance(self, owner).await?)
    }

    async fn latest_blockhash(&self) -> Result<(Hash, u64), LedgerError> {
        Ok(self
            .get_latest_blockhash_with_commitment(self.commitment())
            .await?)
    }

    async fn send_transaction(&self, tx: &SwapTransaction) -> Result<Signature, LedgerError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(CommitmentLevel::Confirmed),
            max_retries: Some(RPC_MAX_RETRIES),
            ..Default::default()
        };
        let signature = match tx {
            SwapTransaction::Legacy(tx) => self.send_transaction_with_config(tx, config).await?,
            SwapTransaction::Versioned(tx) => {
                self.send_transaction_with_config(tx, config).await?
            }
        };
        Ok(signature)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, LedgerError> {
        Ok(self
            .get_signature_status_with_commitment(signature, self.commitment())
            .await?)
    }

    async fn block_height(&self) -> Result<u64, LedgerError> {
        Ok(self.get_block_height().await?)
    }
}
