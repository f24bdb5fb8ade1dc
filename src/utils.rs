//! Utility functions for x402 operations.
//!
//! This module provides helper functions for encoding/decoding, conversions,
//! and other common operations used throughout the library.

use crate::errors::{Result, X402Error};
use crate::types::SignedAuthorization;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ethers::types::{Address, U256};
use std::str::FromStr;

/// Encodes a [`SignedAuthorization`] as Base64 JSON for the `X-PAYMENT` header.
pub fn encode_payment_header(payload: &SignedAuthorization) -> Result<String> {
    let json = serde_json::to_string(payload)?;
    Ok(BASE64.encode(json.as_bytes()))
}

/// Decodes a [`SignedAuthorization`] from the `X-PAYMENT` header, accepting
/// either Base64 JSON (the canonical wire form) or raw JSON directly.
pub fn decode_payment_header(encoded: &str) -> Result<SignedAuthorization> {
    let json_str = match BASE64.decode(encoded.as_bytes()) {
        Ok(decoded) => String::from_utf8(decoded)
            .map_err(|e| X402Error::InvalidFormat(format!("invalid UTF-8: {}", e)))?,
        Err(_) => encoded.to_string(),
    };
    let payload: SignedAuthorization = serde_json::from_str(&json_str)
        .map_err(|e| X402Error::InvalidFormat(format!("malformed payment payload: {}", e)))?;
    Ok(payload)
}

/// Converts a string representation of a uint256 to ethers' [`U256`].
///
/// Accepts a plain decimal string or a `0x`-prefixed hex string.
pub fn string_to_u256(s: &str) -> Result<U256> {
    if let Ok(value) = U256::from_dec_str(s) {
        return Ok(value);
    }

    if s.starts_with("0x") || s.starts_with("0X") {
        if let Ok(value) = U256::from_str(s) {
            return Ok(value);
        }
    }

    Err(X402Error::InvalidAmount(format!(
        "cannot parse '{}' as a uint256",
        s
    )))
}

/// Converts a [`U256`] to its decimal string representation.
pub fn u256_to_string(value: U256) -> String {
    value.to_string()
}

/// Validates and parses an Ethereum address.
pub fn parse_address(addr: &str) -> Result<Address> {
    Address::from_str(addr).map_err(|e| X402Error::InvalidAddress(format!("{}: {}", addr, e)))
}

/// Generates a random 32-byte nonce for EIP-3009 authorization.
pub fn generate_nonce() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let nonce: [u8; 32] = rng.gen();
    format!("0x{}", hex::encode(nonce))
}

/// Gets the current Unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Checks whether `now` falls within `[valid_after, valid_before)`, per the
/// ERC-3009 validity window semantics (`now >= validBefore` is expired).
pub fn is_timestamp_valid(valid_after: u64, valid_before: u64) -> bool {
    let now = current_timestamp();
    now >= valid_after && now < valid_before
}
