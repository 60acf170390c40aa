//! Parsing, re-stamping, signing and submitting aggregator-built transactions.
//!
//! The flow is `parse -> rebase -> sign -> send -> confirm`; only the final
//! signature or error leaves this module.

use std::{fmt, sync::Arc, time::Duration};

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use solana_sdk::{
    hash::Hash,
    message::{v0, VersionedMessage},
    signature::{Keypair, Signature},
    transaction::{Transaction, VersionedTransaction},
};
use tracing::{debug, info, warn};

use crate::{error::SwapError, ledger::LedgerRpc};

const SEND_RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionFormat {
    Legacy,
    Versioned,
}

impl fmt::Display for TransactionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionFormat::Legacy => f.write_str("legacy"),
            TransactionFormat::Versioned => f.write_str("v0"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwapTransaction {
    Legacy(Transaction),
    Versioned(VersionedTransaction),
}

impl SwapTransaction {
    pub fn from_base64(blob: &str) -> Result<Self, SwapError> {
        let bytes = BASE64_STANDARD
            .decode(blob.trim())
            .map_err(|_| SwapError::MalformedTransaction)?;
        Self::parse(&bytes)
    }

    /// Tries the versioned wire format first, then legacy.
    ///
    /// The versioned decoder also accepts legacy messages; those come back as
    /// `Legacy` so signing follows the legacy rules.
    pub fn parse(bytes: &[u8]) -> Result<Self, SwapError> {
        if let Ok(tx) = bincode::deserialize::<VersionedTransaction>(bytes) {
            return Ok(match tx.message {
                VersionedMessage::V0(_) => SwapTransaction::Versioned(tx),
                VersionedMessage::Legacy(message) => SwapTransaction::Legacy(Transaction {
                    signatures: tx.signatures,
                    message,
                }),
            });
        }

        bincode::deserialize::<Transaction>(bytes)
            .map(SwapTransaction::Legacy)
            .map_err(|_| SwapError::MalformedTransaction)
    }

    pub fn format(&self) -> TransactionFormat {
        match self {
            SwapTransaction::Legacy(_) => TransactionFormat::Legacy,
            SwapTransaction::Versioned(_) => TransactionFormat::Versioned,
        }
    }

    pub fn recent_blockhash(&self) -> &Hash {
        match self {
            SwapTransaction::Legacy(tx) => &tx.message.recent_blockhash,
            SwapTransaction::Versioned(tx) => tx.message.recent_blockhash(),
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            SwapTransaction::Legacy(tx) => tx.signatures.first(),
            SwapTransaction::Versioned(tx) => tx.signatures.first(),
        }
    }

    /// Replaces the embedded blockhash.
    ///
    /// A v0 message is rebuilt from its parts; a legacy message is updated
    /// in place. Existing signatures are stale afterwards.
    pub fn rebase(self, blockhash: Hash) -> Self {
        match self {
            SwapTransaction::Legacy(mut tx) => {
                tx.message.recent_blockhash = blockhash;
                SwapTransaction::Legacy(tx)
            }
            SwapTransaction::Versioned(tx) => {
                let message = match tx.message {
                    VersionedMessage::V0(message) => VersionedMessage::V0(v0::Message {
                        header: message.header,
                        account_keys: message.account_keys,
                        recent_blockhash: blockhash,
                        instructions: message.instructions,
                        address_table_lookups: message.address_table_lookups,
                    }),
                    VersionedMessage::Legacy(mut message) => {
                        message.recent_blockhash = blockhash;
                        VersionedMessage::Legacy(message)
                    }
                };
                SwapTransaction::Versioned(VersionedTransaction {
                    signatures: tx.signatures,
                    message,
                })
            }
        }
    }

    /// Versioned transactions get a full signature set from `keypair`.
    /// Legacy ones are partially signed so co-signer slots the aggregator
    /// filled stay intact.
    pub fn sign(self, keypair: &Keypair) -> Result<Self, SwapError> {
        match self {
            SwapTransaction::Legacy(mut tx) => {
                let blockhash = tx.message.recent_blockhash;
                tx.try_partial_sign(&[keypair], blockhash)
                    .map_err(|e| SwapError::Signing(e.to_string()))?;
                Ok(SwapTransaction::Legacy(tx))
            }
            SwapTransaction::Versioned(tx) => {
                let tx = VersionedTransaction::try_new(tx.message, &[keypair])
                    .map_err(|e| SwapError::Signing(e.to_string()))?;
                Ok(SwapTransaction::Versioned(tx))
            }
        }
    }
}

pub struct TransactionSubmitter {
    ledger: Arc<dyn LedgerRpc>,
    send_attempts: usize,
    poll_interval: Duration,
}

impl TransactionSubmitter {
    pub fn new(ledger: Arc<dyn LedgerRpc>, send_attempts: usize, poll_interval: Duration) -> Self {
        Self {
            ledger,
            send_attempts: send_attempts.max(1),
            poll_interval,
        }
    }

    pub async fn execute(&self, blob: &str, keypair: &Keypair) -> Result<Signature, SwapError> {
        let tx = SwapTransaction::from_base64(blob)?;
        debug!(format = %tx.format(), stale_blockhash = %tx.recent_blockhash(), "parsed swap transaction");
        self.submit(tx, keypair).await
    }

    pub async fn submit(
        &self,
        tx: SwapTransaction,
        keypair: &Keypair,
    ) -> Result<Signature, SwapError> {
        let format = tx.format();
        let (blockhash, last_valid_block_height) = self.ledger.latest_blockhash().await?;
        debug!(%blockhash, last_valid_block_height, "rebasing transaction");

        let tx = tx.rebase(blockhash).sign(keypair)?;
        let signature = self.send(&tx).await?;
        info!(%signature, %format, "transaction submitted");

        self.confirm(&signature, last_valid_block_height).await?;
        info!(%signature, "transaction confirmed");
        Ok(signature)
    }

    async fn send(&self, tx: &SwapTransaction) -> Result<Signature, SwapError> {
        let mut attempt = 1;
        loop {
            match self.ledger.send_transaction(tx).await {
                Ok(signature) => return Ok(signature),
                Err(err) if err.is_transient() && attempt < self.send_attempts => {
                    warn!(attempt, error = %err, "send failed, retrying");
                    tokio::time::sleep(SEND_RETRY_BACKOFF * attempt as u32).await;
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    return Err(SwapError::SubmissionUnconfirmed(err.to_string()))
                }
                Err(err) => return Err(SwapError::classify_submission(err.to_string())),
            }
        }
    }

    /// Polls until the signature lands or the rebase blockhash expires.
    async fn confirm(
        &self,
        signature: &Signature,
        last_valid_block_height: u64,
    ) -> Result<(), SwapError> {
        loop {
            match self.ledger.signature_status(signature).await? {
                Some(Ok(())) => return Ok(()),
                Some(Err(err)) => return Err(SwapError::OnChainFailure(err)),
                None => {}
            }

            let height = self.ledger.block_height().await?;
            if height > last_valid_block_height {
                return Err(SwapError::BlockhashExpired(last_valid_block_height));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
