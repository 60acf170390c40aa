use crate::{ledger::LedgerError, ClientError};
use solana_sdk::transaction::TransactionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),
    #[error("Invalid secret key format")]
    InvalidSecretKey,
    #[error("Unknown token: {0}")]
    UnknownToken(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Cannot swap zero amount")]
    ZeroAmount,
    #[error("Quote failed: {0}")]
    Quote(#[source] ClientError),
    #[error("Failed to build swap transaction: {0}")]
    Build(#[source] ClientError),
    #[error("Swap transaction is neither a versioned nor a legacy transaction")]
    MalformedTransaction,
    #[error("Failed to sign transaction: {0}")]
    Signing(String),
    #[error("Transaction submission failed: {0}")]
    Submission(String),
    /// Every send attempt hit a transport error; the transaction may still land.
    #[error("Transaction submission outcome unknown: {0}")]
    SubmissionUnconfirmed(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Transaction failed on chain: {0}")]
    OnChainFailure(TransactionError),
    #[error("Blockhash expired before confirmation (last valid block height {0})")]
    BlockhashExpired(u64),
    #[error("Ledger RPC error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SwapError {
    /// The network does not report a typed "insufficient funds" rejection on
    /// submission, so the message text is matched instead.
    pub fn classify_submission(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.to_ascii_lowercase().contains("insufficient") {
            SwapError::InsufficientBalance(message)
        } else {
            SwapError::Submission(message)
        }
    }

    /// Whether retrying with a different output token could plausibly succeed.
    /// An unconfirmed send is excluded: the first transaction may still land.
    pub(crate) fn depends_on_output(&self) -> bool {
        matches!(
            self,
            SwapError::Quote(_)
                | SwapError::Build(_)
                | SwapError::MalformedTransaction
                | SwapError::Signing(_)
                | SwapError::Submission(_)
                | SwapError::OnChainFailure(_)
                | SwapError::BlockhashExpired(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_text_with_insufficient_maps_to_balance_error() {
        let err = SwapError::classify_submission(
            "Transaction simulation failed: Error processing Instruction 3: insufficient lamports",
        );
        assert!(matches!(err, SwapError::InsufficientBalance(_)));

        let err = SwapError::classify_submission("Blockhash not found");
        assert!(matches!(err, SwapError::Submission(_)));
    }

    #[test]
    fn unconfirmed_send_does_not_depend_on_output() {
        assert!(SwapError::Submission("rejected".into()).depends_on_output());
        assert!(!SwapError::SubmissionUnconfirmed("timed out".into()).depends_on_output());
        assert!(!SwapError::InvalidSecretKey.depends_on_output());
    }
}
