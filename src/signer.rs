//! The Authorization Signer: the client-side component that produces a
//! signed ERC-3009 `TransferWithAuthorization` for a chosen
//! [`crate::types::PaymentMethod`].

use crate::eip712::{domain_separator, transfer_authorization_hash};
use crate::errors::{Result, X402Error};
use crate::network::Network;
use crate::types::{Authorization, SignedAuthorization, SignedAuthorizationPayload};
use crate::utils::{generate_nonce, parse_address, string_to_u256};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{H256, U256};
use std::str::FromStr;

const DEFAULT_DOMAIN_NAME: &str = "USD Coin";
const DEFAULT_DOMAIN_VERSION: &str = "2";

/// A source of the current time, injectable so signing tests can assert
/// exact `validAfter`/`validBefore` values instead of racing the clock.
pub trait Clock: Send + Sync {
    /// Current Unix timestamp, seconds.
    fn now_unix(&self) -> u64;
}

/// [`Clock`] backed by [`std::time::SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        crate::utils::current_timestamp()
    }
}

/// Signs ERC-3009 authorizations on behalf of a payer wallet.
pub struct AuthorizationSigner {
    wallet: LocalWallet,
    clock: Box<dyn Clock>,
}

impl AuthorizationSigner {
    /// Builds a signer from a raw hex private key, using the system clock.
    pub fn new(private_key: &str) -> Result<Self> {
        let wallet = LocalWallet::from_str(private_key)
            .map_err(|e| X402Error::ConfigError(format!("invalid private key: {}", e)))?;
        Ok(Self {
            wallet,
            clock: Box::new(SystemClock),
        })
    }

    /// Builds a signer with an injected clock, for deterministic tests.
    pub fn with_clock(private_key: &str, clock: Box<dyn Clock>) -> Result<Self> {
        let wallet = LocalWallet::from_str(private_key)
            .map_err(|e| X402Error::ConfigError(format!("invalid private key: {}", e)))?;
        Ok(Self { wallet, clock })
    }

    /// The payer's address.
    pub fn address(&self) -> ethers::types::Address {
        self.wallet.address()
    }

    /// Signs a `TransferWithAuthorization` paying exactly `amount` to
    /// `method.recipient`, valid from now until `method.timeout` later.
    pub async fn sign(
        &self,
        method: &crate::types::PaymentMethod,
        amount: &str,
    ) -> Result<SignedAuthorization> {
        let from = self.wallet.address();
        let to = parse_address(&method.recipient)?;
        let asset = parse_address(&method.asset)?;
        let value = string_to_u256(amount)?;

        let network = Network::from_str(&method.network)?;
        let chain_id = U256::from(network.chain_id());

        let now = self.clock.now_unix();
        let valid_after = U256::from(now);
        let valid_before = U256::from(now + method.timeout / 1000);

        let nonce_str = generate_nonce();
        let nonce = parse_nonce(&nonce_str)?;

        let (name, version) = method
            .extra
            .as_ref()
            .map(|extra| {
                (
                    extra.name.clone().unwrap_or_else(|| DEFAULT_DOMAIN_NAME.to_string()),
                    extra
                        .version
                        .clone()
                        .unwrap_or_else(|| DEFAULT_DOMAIN_VERSION.to_string()),
                )
            })
            .unwrap_or_else(|| (DEFAULT_DOMAIN_NAME.to_string(), DEFAULT_DOMAIN_VERSION.to_string()));

        let domain = domain_separator(asset, chain_id, &name, &version);
        let digest = transfer_authorization_hash(
            from,
            to,
            value,
            valid_after,
            valid_before,
            nonce,
            domain,
        );

        let signature = self
            .wallet
            .sign_hash(digest)
            .map_err(|e| X402Error::SignatureError(e.to_string()))?;

        let mut r_bytes = [0u8; 32];
        signature.r.to_big_endian(&mut r_bytes);
        let mut s_bytes = [0u8; 32];
        signature.s.to_big_endian(&mut s_bytes);

        let mut sig_bytes = Vec::with_capacity(65);
        sig_bytes.extend_from_slice(&r_bytes);
        sig_bytes.extend_from_slice(&s_bytes);
        sig_bytes.push(signature.v as u8);

        Ok(SignedAuthorization {
            x402_version: crate::types::X402_VERSION,
            scheme: method.scheme.clone(),
            network: method.network.clone(),
            payload: SignedAuthorizationPayload {
                signature: format!("0x{}", hex::encode(sig_bytes)),
                authorization: Authorization {
                    from: format!("{:?}", from),
                    to: format!("{:?}", to),
                    value: value.to_string(),
                    valid_after: valid_after.to_string(),
                    valid_before: valid_before.to_string(),
                    nonce: nonce_str,
                },
            },
        })
    }
}

fn parse_nonce(nonce_str: &str) -> Result<H256> {
    let hex_str = nonce_str.trim_start_matches("0x");
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(hex_str, &mut bytes)
        .map_err(|e| X402Error::InvalidFormat(format!("invalid nonce: {}", e)))?;
    Ok(H256::from(bytes))
}
