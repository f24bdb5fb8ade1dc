//! The Payment Gate: the core request-interception state machine.
//!
//! `Received → Decoded → StructurallyValid → SemanticallyValid →
//! ReplayLocked → Settled`, with `ReplayLocked → RolledBack` the only
//! reverse transition (taken when the validator chain terminally rejects an
//! authorization whose nonce was already locked). Each transition is logged
//! at `debug`/`warn`/`info` via `tracing` rather than `println!`.

use crate::errors::{Result, X402Error};
use crate::replay::ReplayStore;
use crate::types::{Challenge, PaymentMethod, PaymentReceipt, SignedAuthorization, X402_VERSION};
use crate::utils::{current_timestamp, decode_payment_header, is_timestamp_valid, parse_address, string_to_u256};
use crate::validator::{ChainValidator, ValidatorChain};
use std::sync::Arc;

/// What [`PaymentGate::handle`] produced: either a challenge to hand back to
/// the client as the HTTP 402 body, or a settled payment whose receipt the
/// caller should expose (e.g. as `X-PAYMENT-RESPONSE`) before invoking the
/// protected resource.
#[derive(Debug, Clone)]
pub enum GateOutcome {
    /// No (or a previously-rejected) payment was supplied; challenge the
    /// client with the accepted methods.
    Challenge(Challenge),
    /// The authorization was settled; `receipt` should accompany the
    /// response to the now-authorized request.
    Settled(PaymentReceipt),
}

/// Which shape of `X-PAYMENT` a gate expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// `X-PAYMENT` carries a base64(JSON)-encoded [`SignedAuthorization`],
    /// verified and settled through a [`ValidatorChain`].
    SignedAuthorization,
    /// `X-PAYMENT` carries a bare on-chain transaction hash, verified
    /// read-only against a [`ChainValidator`]. Legacy: the client already
    /// submitted the transfer out of band.
    TransactionHash,
}

enum Backend {
    SignedAuthorization(ValidatorChain),
    TransactionHash(ChainValidator),
}

fn is_transaction_hash_format(s: &str) -> bool {
    let hex = s.strip_prefix("0x").unwrap_or(s);
    hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The payment gate for a single protected resource: one accepted
/// [`PaymentMethod`], one replay store, and either a validator fallback
/// chain (current, signed-authorization routes) or a sole
/// [`ChainValidator`] (legacy, bare-transaction-hash routes). A deployment
/// picks the mode per route at construction; `X-PAYMENT`'s shape differs
/// between the two and is never auto-detected.
pub struct PaymentGate {
    method: PaymentMethod,
    replay_store: Arc<dyn ReplayStore>,
    backend: Backend,
}

impl PaymentGate {
    /// Builds a gate for `method` that expects a signed ERC-3009
    /// authorization in `X-PAYMENT`, consulting `replay_store` for nonce
    /// reuse and `validators` to verify and settle.
    pub fn new(
        method: PaymentMethod,
        replay_store: Arc<dyn ReplayStore>,
        validators: ValidatorChain,
    ) -> Self {
        Self {
            method,
            replay_store,
            backend: Backend::SignedAuthorization(validators),
        }
    }

    /// Builds a gate for `method` that expects a bare on-chain transaction
    /// hash in `X-PAYMENT` (legacy mode): the client has already settled
    /// out of band, and `chain` independently confirms the transfer by
    /// inspecting the transaction's logs.
    pub fn new_legacy(
        method: PaymentMethod,
        replay_store: Arc<dyn ReplayStore>,
        chain: ChainValidator,
    ) -> Self {
        Self {
            method,
            replay_store,
            backend: Backend::TransactionHash(chain),
        }
    }

    /// The payment method this gate accepts.
    pub fn method(&self) -> &PaymentMethod {
        &self.method
    }

    /// Which `X-PAYMENT` shape this gate expects.
    pub fn mode(&self) -> GateMode {
        match self.backend {
            Backend::SignedAuthorization(_) => GateMode::SignedAuthorization,
            Backend::TransactionHash(_) => GateMode::TransactionHash,
        }
    }

    /// Runs one request through the gate. `payment_header` is the decoded
    /// `X-PAYMENT` header value, if the client sent one.
    pub async fn handle(&self, payment_header: Option<&str>) -> Result<GateOutcome> {
        let header = match payment_header {
            None => {
                tracing::debug!(scheme = %self.method.scheme, "no X-PAYMENT header, issuing challenge");
                return Ok(GateOutcome::Challenge(Challenge::new(vec![self.method.clone()])?));
            }
            Some(h) => h,
        };

        match &self.backend {
            Backend::SignedAuthorization(validators) => self.handle_signed(header, validators).await,
            Backend::TransactionHash(chain) => self.handle_legacy(header, chain).await,
        }
    }

    async fn handle_signed(&self, header: &str, validators: &ValidatorChain) -> Result<GateOutcome> {
        let signed = decode_payment_header(header)?;
        tracing::debug!(scheme = %signed.scheme, network = %signed.network, "decoded X-PAYMENT header");

        self.check_structural(&signed)?;
        tracing::debug!("authorization structurally valid");

        self.check_semantic(&signed)?;
        tracing::debug!("authorization semantically valid");

        let nonce_key = signed.payload.authorization.nonce.clone();
        let inserted = self.replay_store.try_insert(&nonce_key).await?;
        if !inserted {
            tracing::warn!(nonce = %nonce_key, "replay detected, nonce already consumed");
            return Err(X402Error::Replay);
        }
        tracing::debug!(nonce = %nonce_key, "replay lock acquired");

        match validators.validate(&signed, &self.method).await {
            Ok(receipt) => {
                tracing::info!(tx = %receipt.transaction_hash, "payment settled");
                Ok(GateOutcome::Settled(receipt))
            }
            Err(err) => {
                if err.class() != "replay" {
                    let _ = self.replay_store.remove(&nonce_key).await;
                    tracing::warn!(error = %err, nonce = %nonce_key, "settlement failed, rolled back replay lock");
                }
                Err(err)
            }
        }
    }

    async fn handle_legacy(&self, header: &str, chain: &ChainValidator) -> Result<GateOutcome> {
        let tx_hash = header.trim();
        if !is_transaction_hash_format(tx_hash) {
            return Err(X402Error::InvalidFormat(
                "X-PAYMENT must be a 32-byte transaction hash in legacy mode".to_string(),
            ));
        }
        tracing::debug!(tx = %tx_hash, "decoded legacy X-PAYMENT header");

        let inserted = self.replay_store.try_insert(tx_hash).await?;
        if !inserted {
            tracing::warn!(tx = %tx_hash, "replay detected, transaction hash already consumed");
            return Err(X402Error::Replay);
        }
        tracing::debug!(tx = %tx_hash, "replay lock acquired");

        match chain.verify_transaction(tx_hash, &self.method).await {
            Ok(receipt) => {
                tracing::info!(tx = %receipt.transaction_hash, "payment verified on chain");
                Ok(GateOutcome::Settled(receipt))
            }
            Err(err) => {
                if err.class() != "replay" {
                    let _ = self.replay_store.remove(tx_hash).await;
                    tracing::warn!(error = %err, tx = %tx_hash, "verification failed, rolled back replay lock");
                }
                Err(err)
            }
        }
    }

    fn check_structural(&self, signed: &SignedAuthorization) -> Result<()> {
        if signed.x402_version != X402_VERSION {
            return Err(X402Error::InvalidFormat(format!(
                "unsupported x402 version {}",
                signed.x402_version
            )));
        }
        let sig_hex = signed.payload.signature.trim_start_matches("0x");
        if sig_hex.len() != 130 || hex::decode(sig_hex).is_err() {
            return Err(X402Error::InvalidFormat(
                "signature must be a 65-byte hex string".to_string(),
            ));
        }
        Ok(())
    }

    fn check_semantic(&self, signed: &SignedAuthorization) -> Result<()> {
        if signed.scheme != self.method.scheme {
            return Err(X402Error::UnsupportedScheme(signed.scheme.clone()));
        }
        if signed.network != self.method.network {
            return Err(X402Error::UnsupportedNetwork(signed.network.clone()));
        }

        let auth = &signed.payload.authorization;
        let recipient = parse_address(&self.method.recipient)?;
        let to = parse_address(&auth.to)?;
        if to != recipient {
            return Err(X402Error::InvalidAuthorization(
                "authorization recipient does not match the accepted payment method".to_string(),
            ));
        }

        let value = string_to_u256(&auth.value)?;
        let min = string_to_u256(&self.method.minimum_amount)?;
        let max = string_to_u256(&self.method.maximum_amount)?;
        if value < min || value > max {
            return Err(X402Error::InvalidAuthorization(
                "authorization value outside the accepted amount bounds".to_string(),
            ));
        }

        let valid_after: u64 = auth
            .valid_after
            .parse()
            .map_err(|_| X402Error::InvalidFormat("malformed validAfter".to_string()))?;
        let valid_before: u64 = auth
            .valid_before
            .parse()
            .map_err(|_| X402Error::InvalidFormat("malformed validBefore".to_string()))?;

        if !is_timestamp_valid(valid_after, valid_before) {
            if current_timestamp() >= valid_before {
                return Err(X402Error::Expired);
            }
            return Err(X402Error::InvalidAuthorization(
                "authorization not yet valid".to_string(),
            ));
        }

        Ok(())
    }
}
