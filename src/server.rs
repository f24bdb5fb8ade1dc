//! Server-side wiring: assembles a [`crate::gate::PaymentGate`] from a
//! [`PaymentMethod`] and the validator backends a deployment chooses to
//! enable, in the builder idiom the teacher lineage uses for its own
//! `PaymentConfig`/`FacilitatorConfig`.

use crate::errors::{Result, X402Error};
use crate::gate::PaymentGate;
use crate::network::Network;
use crate::replay::InMemoryReplayStore;
use crate::types::PaymentMethod;
use crate::validator::{ChainValidator, FacilitatorValidator, Validator, ValidatorChain};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default nonce retention: long enough to outlive any authorization's
/// `maxTimeoutSeconds` window many times over.
const DEFAULT_REPLAY_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Builds a [`PaymentGate`] for one [`PaymentMethod`].
///
/// Two mutually exclusive paths:
/// - signed-authorization (current, default): add one or more backends with
///   `with_facilitator`, tried in configuration order;
/// - legacy bare-transaction-hash: call `legacy_transaction_hash` instead,
///   which takes over the whole build and ignores any signed-mode backends
///   configured so far. [`ChainValidator`] is read-only and has no
///   `Validator` impl of its own, so it can only ever back this mode, never
///   sit in a signed-mode fallback chain.
pub struct GateConfig {
    method: PaymentMethod,
    facilitator_url: Option<String>,
    legacy_chain_rpc_url: Option<String>,
    replay_retention: Duration,
    #[cfg(feature = "format-validator")]
    enable_format_validator: bool,
}

impl GateConfig {
    /// Starts a configuration for `method` with no validator backends yet
    /// and the default 24h replay retention.
    pub fn new(method: PaymentMethod) -> Self {
        Self {
            method,
            facilitator_url: None,
            legacy_chain_rpc_url: None,
            replay_retention: DEFAULT_REPLAY_RETENTION,
            #[cfg(feature = "format-validator")]
            enable_format_validator: false,
        }
    }

    /// Adds a facilitator backend at `base_url`, tried first.
    pub fn with_facilitator(mut self, base_url: impl Into<String>) -> Self {
        self.facilitator_url = Some(base_url.into());
        self
    }

    /// Switches this configuration to legacy mode: `X-PAYMENT` is a bare
    /// transaction hash, verified read-only against `rpc_url`. Any
    /// signed-mode backends configured via `with_facilitator` are ignored.
    pub fn legacy_transaction_hash(mut self, rpc_url: impl Into<String>) -> Self {
        self.legacy_chain_rpc_url = Some(rpc_url.into());
        self
    }

    /// Overrides the default 24h nonce retention window.
    pub fn with_replay_retention(mut self, retention: Duration) -> Self {
        self.replay_retention = retention;
        self
    }

    /// Enables the development-only [`crate::validator::FormatValidator`]
    /// backend, tried last. Only available when the `format-validator`
    /// feature is compiled in; never enable this in production.
    #[cfg(feature = "format-validator")]
    pub fn with_format_validator_for_development(mut self) -> Self {
        self.enable_format_validator = true;
        self
    }

    /// Assembles the configured backends into a [`PaymentGate`].
    pub fn build(self) -> Result<PaymentGate> {
        let replay_store = Arc::new(InMemoryReplayStore::new(self.replay_retention));

        if let Some(rpc_url) = &self.legacy_chain_rpc_url {
            let chain = ChainValidator::new(rpc_url)?;
            return Ok(PaymentGate::new_legacy(self.method, replay_store, chain));
        }

        let mut validators: Vec<Box<dyn Validator>> = Vec::new();

        if let Some(url) = &self.facilitator_url {
            validators.push(Box::new(FacilitatorValidator::new(url.clone())?));
        }
        #[cfg(feature = "format-validator")]
        if self.enable_format_validator {
            let chain_id = Network::from_str(&self.method.network)?.chain_id();
            validators.push(Box::new(crate::validator::FormatValidator::new(chain_id)));
        }

        if validators.is_empty() {
            return Err(X402Error::ConfigError(
                "no validator backend configured: call with_facilitator or legacy_transaction_hash"
                    .to_string(),
            ));
        }

        Ok(PaymentGate::new(
            self.method,
            replay_store,
            ValidatorChain::new(validators),
        ))
    }
}

/// Builds a single-method gate for the common case: USDC on Base, paid via
/// a facilitator at `facilitator_url`.
pub fn simple_usdc_base_gate(
    recipient: impl Into<String>,
    amount: impl Into<String>,
    facilitator_url: impl Into<String>,
) -> Result<PaymentGate> {
    let amount = amount.into();
    let method = PaymentMethod::new(
        "exact",
        Network::Base.as_str(),
        "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
        recipient,
        amount.clone(),
        amount,
        300_000,
    )?
    .with_extra("USD Coin", "2");

    GateConfig::new(method).with_facilitator(facilitator_url).build()
}

#[cfg(test)]
mod tests {
    use super::*;

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
    }

    #[test]
    fn test_build_without_any_backend_is_a_config_error() {
        let err = GateConfig::new(sample_method()).build().unwrap_err();
        assert!(matches!(err, X402Error::ConfigError(_)));
    }

    #[test]
    fn test_build_with_facilitator_succeeds() {
        let gate = GateConfig::new(sample_method())
            .with_facilitator("https://facilitator.example.com")
            .build()
            .unwrap();
        assert_eq!(gate.method().scheme, "exact");
    }

    #[test]
    fn test_legacy_transaction_hash_mode_builds_without_a_facilitator() {
        let gate = GateConfig::new(sample_method())
            .legacy_transaction_hash("https://rpc.example.com")
            .build()
            .unwrap();
        assert_eq!(gate.mode(), crate::gate::GateMode::TransactionHash);
    }

    #[test]
    fn test_simple_usdc_base_gate() {
        let gate = simple_usdc_base_gate(
            "0x501aB28fc3C7d29C2D12b243723EB5c5418B9de6",
            "10000",
            "https://facilitator.example.com",
        )
        .unwrap();
        assert_eq!(gate.method().network, "base");
        assert_eq!(gate.method().asset, "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
    }
}
