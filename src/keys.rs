use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

use crate::error::SwapError;

const SECRET_KEY_LEN: usize = 64;

pub fn is_valid_address(address: &str) -> bool {
    Pubkey::from_str(address).is_ok()
}

pub fn parse_address(address: &str) -> Result<Pubkey, SwapError> {
    Pubkey::from_str(address).map_err(|_| SwapError::InvalidAddress(address.to_string()))
}

pub fn keypair_from_base64(secret_key: &str) -> Result<Keypair, SwapError> {
    let bytes = BASE64_STANDARD
        .decode(secret_key.trim())
        .map_err(|_| SwapError::InvalidSecretKey)?;
    if bytes.len() != SECRET_KEY_LEN {
        return Err(SwapError::InvalidSecretKey);
    }
    let keypair = Keypair::try_from(bytes.as_slice()).map_err(|_| SwapError::InvalidSecretKey)?;

    // the trailing half must be the public key of the leading half
    if keypair.pubkey().to_bytes()[..] != bytes[32..] {
        return Err(SwapError::InvalidSecretKey);
    }
    Ok(keypair)
}

pub fn keypair_to_base64(keypair: &Keypair) -> String {
    BASE64_STANDARD.encode(keypair.to_bytes())
}
