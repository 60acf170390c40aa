#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use jupiter_swap_executor::{
    config::ExecutorConfig,
    ledger::{LedgerError, LedgerRpc},
    transaction::SwapTransaction,
};
use serde_json::{json, Value};
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::{v0, Message, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::{Transaction, TransactionError, VersionedTransaction},
};

pub const STALE_BLOCKHASH: [u8; 32] = [3; 32];
pub const FRESH_BLOCKHASH: [u8; 32] = [42; 32];
pub const LAST_VALID_BLOCK_HEIGHT: u64 = 1_000;

/// In-memory ledger with scripted send and status outcomes.
pub struct FakeLedger {
    pub balance: u64,
    height: AtomicU64,
    height_step: u64,
    send_outcomes: Mutex<VecDeque<Result<(), LedgerError>>>,
    statuses: Mutex<VecDeque<Option<Result<(), TransactionError>>>>,
    sent: Mutex<Vec<SwapTransaction>>,
    pub send_calls: AtomicU64,
    pub balance_calls: AtomicU64,
}

impl FakeLedger {
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            height: AtomicU64::new(LAST_VALID_BLOCK_HEIGHT - 100),
            height_step: 0,
            send_outcomes: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            send_calls: AtomicU64::new(0),
            balance_calls: AtomicU64::new(0),
        }
    }

    /// Each block-height query advances the chain by `step`.
    pub fn advancing(mut self, step: u64) -> Self {
        self.height_step = step;
        self
    }

    pub fn script_send(self, outcome: Result<(), LedgerError>) -> Self {
        self.send_outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn script_status(self, status: Option<Result<(), TransactionError>>) -> Self {
        self.statuses.lock().unwrap().push_back(status);
        self
    }

    pub fn sent(&self) -> Vec<SwapTransaction> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerRpc for FakeLedger {
    async fn get_balance(&self, _owner: &Pubkey) -> Result<u64, LedgerError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance)
    }

    async fn latest_blockhash(&self) -> Result<(Hash, u64), LedgerError> {
        Ok((Hash::new_from_array(FRESH_BLOCKHASH), LAST_VALID_BLOCK_HEIGHT))
    }

    async fn send_transaction(&self, tx: &SwapTransaction) -> Result<Signature, LedgerError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .send_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));
        outcome?;
        self.sent.lock().unwrap().push(tx.clone());
        Ok(*tx.signature().expect("signed transaction"))
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, LedgerError> {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.is_empty() {
            // an empty script with an advancing chain models a dropped transaction
            return Ok(if self.height_step > 0 { None } else { Some(Ok(())) });
        }
        Ok(statuses.pop_front().flatten())
    }

    async fn block_height(&self) -> Result<u64, LedgerError> {
        Ok(self.height.fetch_add(self.height_step, Ordering::SeqCst))
    }
}

fn instruction(payer: &Pubkey) -> Instruction {
    let program = Keypair::new().pubkey();
    Instruction::new_with_bytes(program, &[7, 7, 7], vec![AccountMeta::new(*payer, true)])
}

/// Unsigned v0 transaction paying from `payer`, base64 encoded.
pub fn versioned_blob(payer: &Pubkey) -> String {
    let message = v0::Message::try_compile(
        payer,
        &[instruction(payer)],
        &[],
        Hash::new_from_array(STALE_BLOCKHASH),
    )
    .unwrap();
    let tx = VersionedTransaction {
        signatures: vec![Signature::default()],
        message: VersionedMessage::V0(message),
    };
    BASE64_STANDARD.encode(bincode::serialize(&tx).unwrap())
}

/// Unsigned legacy transaction paying from `payer`, base64 encoded.
pub fn legacy_blob(payer: &Pubkey) -> String {
    let mut message = Message::new(&[instruction(payer)], Some(payer));
    message.recent_blockhash = Hash::new_from_array(STALE_BLOCKHASH);
    let tx = Transaction::new_unsigned(message);
    BASE64_STANDARD.encode(bincode::serialize(&tx).unwrap())
}

pub fn quote_body(input_mint: &str, output_mint: &str, in_amount: u64, out_amount: u64) -> Value {
    json!({
        "inputMint": input_mint,
        "inAmount": in_amount.to_string(),
        "outputMint": output_mint,
        "outAmount": out_amount.to_string(),
        "otherAmountThreshold": (out_amount - out_amount / 100).to_string(),
        "swapMode": "ExactIn",
        "slippageBps": 100,
        "platformFee": null,
        "priceImpactPct": "0",
        "routePlan": [],
        "contextSlot": 1234,
        "timeTaken": 0.01
    })
}

pub fn swap_body(blob: &str) -> Value {
    json!({
        "swapTransaction": blob,
        "lastValidBlockHeight": 900,
        "prioritizationFeeLamports": 0
    })
}

pub fn test_config(server_url: &str) -> ExecutorConfig {
    ExecutorConfig {
        jupiter_api_url: server_url.to_string(),
        balances_api_url: format!("{}/balances", server_url),
        confirm_poll_interval_ms: 1,
        ..Default::default()
    }
}
