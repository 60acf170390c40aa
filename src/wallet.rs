//! Custodial wallet generation: a fresh 24-word mnemonic, seeded with an empty
//! passphrase and derived along `m/44'/501'/0'/0'`.

use bip39::Mnemonic;
use rand::RngCore;
use serde::Serialize;
use solana_derivation_path::DerivationPath;
use solana_sdk::{
    signature::{Keypair, Signer},
    signer::keypair::keypair_from_seed_and_derivation_path,
};

use crate::{error::SwapError, keys::keypair_to_base64};

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WalletData {
    pub address: String,
    pub seed_phrase: Vec<String>,
    /// Base64 of the 64-byte keypair.
    pub secret_key: String,
}

pub fn generate_wallet() -> Result<WalletData, SwapError> {
    let mut entropy = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| SwapError::Internal(format!("mnemonic generation failed: {e}")))?;

    let phrase = mnemonic.to_string();
    let keypair = keypair_from_mnemonic(&phrase)?;

    Ok(WalletData {
        address: keypair.pubkey().to_string(),
        seed_phrase: phrase.split_whitespace().map(str::to_string).collect(),
        secret_key: keypair_to_base64(&keypair),
    })
}

/// First account of the phrase, the one Solana wallets show by default.
pub fn keypair_from_mnemonic(phrase: &str) -> Result<Keypair, SwapError> {
    let mnemonic = Mnemonic::parse_normalized(phrase.trim())
        .map_err(|e| SwapError::Internal(format!("invalid mnemonic: {e}")))?;
    let seed = mnemonic.to_seed_normalized("");

    keypair_from_seed_and_derivation_path(&seed, Some(DerivationPath::new_bip44(Some(0), Some(0))))
        .map_err(|e| SwapError::Internal(format!("key derivation failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{is_valid_address, keypair_from_base64};

    #[test]
    fn derives_first_account_of_known_phrase() {
        let phrase = "abandon abandon abandon abandon abandon abandon \
                      abandon abandon abandon abandon abandon about";
        let keypair = keypair_from_mnemonic(phrase).unwrap();
        assert_eq!(
            keypair.pubkey().to_string(),
            "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk"
        );
    }

    #[test]
    fn generated_wallet_is_usable() {
        let wallet = generate_wallet().unwrap();
        assert_eq!(wallet.seed_phrase.len(), 24);
        assert!(wallet.seed_phrase.iter().all(|w| !w.is_empty() && !w.contains(' ')));
        assert!(is_valid_address(&wallet.address));

        let keypair = keypair_from_base64(&wallet.secret_key).unwrap();
        assert_eq!(keypair.pubkey().to_string(), wallet.address);

        let restored = keypair_from_mnemonic(&wallet.seed_phrase.join(" ")).unwrap();
        assert_eq!(restored.pubkey().to_string(), wallet.address);
    }

    #[test]
    fn rejects_bad_mnemonic() {
        assert!(keypair_from_mnemonic("not a real phrase").is_err());
    }
}
