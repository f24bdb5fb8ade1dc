//! A development-only [`Validator`] that checks signature and amount/timing
//! structure but never touches a chain or a facilitator.
//!
//! Gated behind the `format-validator` Cargo feature (off by default) so a
//! production build cannot link it in by accident, matching the requirement
//! that this backend must be disabled outside development.

use super::Validator;
use crate::eip712::{domain_separator, transfer_authorization_hash};
use crate::errors::{Result, X402Error};
use crate::types::{PaymentMethod, PaymentReceipt, SignedAuthorization};
use crate::utils::{current_timestamp, parse_address, string_to_u256};
use async_trait::async_trait;
use ethers::types::{Signature, H256, U256};

const DEFAULT_DOMAIN_NAME: &str = "USD Coin";
const DEFAULT_DOMAIN_VERSION: &str = "2";

/// Checks signature validity, amount bounds, and the expiry window, without
/// any network or chain call. Produces a synthetic receipt rather than a
/// real transaction hash — never wire this up outside a local dev server.
pub struct FormatValidator {
    chain_id: u64,
}

impl FormatValidator {
    /// Builds a validator that checks signatures against `chain_id`'s
    /// EIP-712 domain.
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }
}

#[async_trait]
impl Validator for FormatValidator {
    fn name(&self) -> &str {
        "format"
    }

    async fn validate(
        &self,
        signed: &SignedAuthorization,
        method: &PaymentMethod,
    ) -> Result<PaymentReceipt> {
        let auth = &signed.payload.authorization;

        let from = parse_address(&auth.from)?;
        let to = parse_address(&auth.to)?;
        let value = string_to_u256(&auth.value)?;
        let expected_to = parse_address(&method.recipient)?;
        let expected_min = string_to_u256(&method.minimum_amount)?;
        let asset = parse_address(&method.asset)?;

        if to != expected_to {
            return Err(X402Error::InvalidAuthorization(
                "authorization recipient does not match payment method".to_string(),
            ));
        }
        if value < expected_min {
            return Err(X402Error::InvalidAuthorization(
                "authorization value outside the accepted amount bounds".to_string(),
            ));
        }

        let valid_after = string_to_u256(&auth.valid_after)?;
        let valid_before = string_to_u256(&auth.valid_before)?;
        let now = U256::from(current_timestamp());
        if now >= valid_before {
            return Err(X402Error::Expired);
        }

        let nonce_hex = auth.nonce.trim_start_matches("0x");
        let mut nonce_bytes = [0u8; 32];
        hex::decode_to_slice(nonce_hex, &mut nonce_bytes)
            .map_err(|e| X402Error::InvalidFormat(format!("invalid nonce: {}", e)))?;
        let nonce = H256::from(nonce_bytes);

        let (name, version) = method
            .extra
            .as_ref()
            .map(|e| {
                (
                    e.name.clone().unwrap_or_else(|| DEFAULT_DOMAIN_NAME.to_string()),
                    e.version.clone().unwrap_or_else(|| DEFAULT_DOMAIN_VERSION.to_string()),
                )
            })
            .unwrap_or_else(|| (DEFAULT_DOMAIN_NAME.to_string(), DEFAULT_DOMAIN_VERSION.to_string()));

        let domain = domain_separator(asset, U256::from(self.chain_id), &name, &version);
        let digest = transfer_authorization_hash(from, to, value, valid_after, valid_before, nonce, domain);

        let sig_hex = signed.payload.signature.trim_start_matches("0x");
        if sig_hex.len() != 130 {
            return Err(X402Error::InvalidFormat(
                "signature must be 65 bytes (r || s || v)".to_string(),
            ));
        }
        let sig_bytes =
            hex::decode(sig_hex).map_err(|e| X402Error::InvalidFormat(format!("invalid signature: {}", e)))?;
        let signature = Signature::try_from(sig_bytes.as_slice())?;
        let recovered = signature.recover(digest)?;
        if recovered != from {
            return Err(X402Error::InvalidAuthorization(
                "signature does not match authorization sender".to_string(),
            ));
        }

        Ok(PaymentReceipt {
            transaction_hash: format!("0xdev{}", hex::encode(&nonce_bytes[..14])),
            network: method.network.clone(),
            payer: format!("{:?}", from),
            block_number: None,
            timestamp: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::signer::AuthorizationSigner;

    const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn sample_method() -> PaymentMethod {
        PaymentMethod::new(
            "exact",
            "base-sepolia",
            "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            "0x501aB28fc3C7d29C2D12b243723EB5c5418B9de6",
            "100000",
            "100000",
            300_000,
        )
        .unwrap()
        .with_extra("USD Coin", "2")
    }

    #[tokio::test]
    async fn test_accepts_well_formed_signed_authorization() {
        let signer = AuthorizationSigner::new(TEST_KEY).unwrap();
        let method = sample_method();
        let signed = signer.sign(&method, &method.maximum_amount).await.unwrap();

        let validator = FormatValidator::new(Network::BaseSepolia.chain_id());
        let receipt = validator.validate(&signed, &method).await.unwrap();
        assert_eq!(receipt.payer, format!("{:?}", signer.address()));
    }

    #[tokio::test]
    async fn test_rejects_tampered_value() {
        let signer = AuthorizationSigner::new(TEST_KEY).unwrap();
        let method = sample_method();
        let mut signed = signer.sign(&method, &method.maximum_amount).await.unwrap();
        signed.payload.authorization.value = "1".to_string();

        let validator = FormatValidator::new(Network::BaseSepolia.chain_id());
        let err = validator.validate(&signed, &method).await.unwrap_err();
        assert!(matches!(err, X402Error::InvalidAuthorization(_)));
    }
}
