mod common;

use std::{
    sync::{atomic::Ordering, Arc},
    time::Duration,
};

use common::*;
use jupiter_swap_executor::{
    ledger::LedgerError,
    transaction::{TransactionFormat, TransactionSubmitter},
    SwapError,
};
use solana_sdk::{
    hash::Hash,
    signature::{Keypair, Signer},
    transaction::TransactionError,
};

fn submitter(ledger: Arc<FakeLedger>) -> TransactionSubmitter {
    TransactionSubmitter::new(ledger, 3, Duration::from_millis(1))
}

#[tokio::test]
async fn versioned_blob_is_rebased_signed_and_confirmed() {
    let payer = Keypair::new();
    let ledger = Arc::new(FakeLedger::new(0));

    let signature = submitter(ledger.clone())
        .execute(&versioned_blob(&payer.pubkey()), &payer)
        .await
        .unwrap();

    let sent = ledger.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].format(), TransactionFormat::Versioned);
    assert_eq!(sent[0].recent_blockhash(), &Hash::new_from_array(FRESH_BLOCKHASH));
    assert_eq!(sent[0].signature(), Some(&signature));
}

#[tokio::test]
async fn legacy_blob_goes_through_the_legacy_path() {
    let payer = Keypair::new();
    let ledger = Arc::new(FakeLedger::new(0));

    submitter(ledger.clone())
        .execute(&legacy_blob(&payer.pubkey()), &payer)
        .await
        .unwrap();

    let sent = ledger.sent();
    assert_eq!(sent[0].format(), TransactionFormat::Legacy);
    assert_ne!(sent[0].recent_blockhash(), &Hash::new_from_array(STALE_BLOCKHASH));
}

#[tokio::test]
async fn malformed_blob_is_fatal() {
    let payer = Keypair::new();
    let ledger = Arc::new(FakeLedger::new(0));

    let err = submitter(ledger.clone())
        .execute("aGVsbG8gd29ybGQ=", &payer)
        .await
        .unwrap_err();

    assert!(matches!(err, SwapError::MalformedTransaction));
    assert_eq!(ledger.send_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transport_errors_are_retried() {
    let payer = Keypair::new();
    let ledger = Arc::new(
        FakeLedger::new(0)
            .script_send(Err(LedgerError::Transport("connection reset".into())))
            .script_send(Err(LedgerError::Transport("connection reset".into()))),
    );

    submitter(ledger.clone())
        .execute(&versioned_blob(&payer.pubkey()), &payer)
        .await
        .unwrap();

    assert_eq!(ledger.send_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retries_are_bounded() {
    let payer = Keypair::new();
    let mut ledger = FakeLedger::new(0);
    for _ in 0..5 {
        ledger = ledger.script_send(Err(LedgerError::Transport("timed out".into())));
    }
    let ledger = Arc::new(ledger);

    let err = submitter(ledger.clone())
        .execute(&versioned_blob(&payer.pubkey()), &payer)
        .await
        .unwrap_err();

    assert!(matches!(err, SwapError::SubmissionUnconfirmed(_)));
    assert_eq!(ledger.send_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn preflight_rejection_is_not_retried() {
    let payer = Keypair::new();
    let ledger = Arc::new(FakeLedger::new(0).script_send(Err(LedgerError::Rejected(
        "Transaction simulation failed: Attempt to debit an account but found no record of a prior credit; insufficient funds".into(),
    ))));

    let err = submitter(ledger.clone())
        .execute(&versioned_blob(&payer.pubkey()), &payer)
        .await
        .unwrap_err();

    assert!(matches!(err, SwapError::InsufficientBalance(_)));
    assert_eq!(ledger.send_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn on_chain_failure_is_reported() {
    let payer = Keypair::new();
    let ledger = Arc::new(
        FakeLedger::new(0)
            .script_status(None)
            .script_status(Some(Err(TransactionError::AccountNotFound))),
    );

    let err = submitter(ledger)
        .execute(&versioned_blob(&payer.pubkey()), &payer)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SwapError::OnChainFailure(TransactionError::AccountNotFound)
    ));
}

#[tokio::test]
async fn confirmation_stops_when_the_blockhash_expires() {
    let payer = Keypair::new();
    let ledger = Arc::new(FakeLedger::new(0).advancing(50));

    let err = submitter(ledger)
        .execute(&versioned_blob(&payer.pubkey()), &payer)
        .await
        .unwrap_err();

    match err {
        SwapError::BlockhashExpired(height) => assert_eq!(height, LAST_VALID_BLOCK_HEIGHT),
        other => panic!("unexpected error: {other}"),
    }
}
