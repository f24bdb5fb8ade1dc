//! Transaction-hash verification against an EVM RPC node: read-only, no
//! wallet, no transaction submission.
//!
//! This backend never moves funds itself — it fetches a transaction's
//! receipt and checks for a `Transfer` log from the configured asset paying
//! at least `method.minimumAmount` to `method.recipient`. Its input is a
//! transaction hash, not a [`crate::types::SignedAuthorization`], so it does
//! not implement [`crate::validator::Validator`] and cannot sit in a
//! [`crate::validator::ValidatorChain`]. It is the sole backend for legacy
//! bare-transaction-hash routes ([`crate::gate::GateMode::TransactionHash`]),
//! dispatched by [`crate::gate::PaymentGate`] directly.
//!
//! Grounded in the teacher lineage's `schemes/exact_evm.rs` for the
//! `Provider<Http>` plumbing, restructured around log inspection rather than
//! signature recovery since this backend's input is a transaction hash, not
//! a signature.

use crate::errors::{Result, X402Error};
use crate::types::{PaymentMethod, PaymentReceipt};
use crate::utils::{parse_address, string_to_u256};
use ethers::core::utils::keccak256;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, Log, H256, U256, U64};
use std::str::FromStr;

fn transfer_event_topic() -> H256 {
    H256::from(keccak256(b"Transfer(address,address,uint256)"))
}

/// Verifies on-chain `transactionHash`es against a payment method, with no
/// settlement authority of its own.
pub struct ChainValidator {
    provider: Provider<Http>,
    min_confirmations: u64,
}

impl ChainValidator {
    /// Builds a verifier against `rpc_url`, requiring one confirmation.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| X402Error::ConfigError(format!("invalid rpc url '{}': {}", rpc_url, e)))?;
        Ok(Self {
            provider,
            min_confirmations: 1,
        })
    }

    /// Requires `confirmations` blocks atop the transaction's block before
    /// accepting it, guarding against shallow reorgs.
    pub fn with_min_confirmations(mut self, confirmations: u64) -> Self {
        self.min_confirmations = confirmations.max(1);
        self
    }

    /// Fetches `tx_hash`'s receipt and checks it for a qualifying `Transfer`
    /// log, per this backend's read-only contract.
    pub async fn verify_transaction(&self, tx_hash: &str, method: &PaymentMethod) -> Result<PaymentReceipt> {
        let hash = H256::from_str(tx_hash)
            .map_err(|e| X402Error::InvalidFormat(format!("malformed transaction hash: {}", e)))?;

        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| X402Error::ChainUnavailable(e.to_string()))?
            .ok_or(X402Error::UnknownTransaction)?;

        if receipt.status != Some(U64::from(1)) {
            return Err(X402Error::InvalidAuthorization(
                "transaction did not succeed".to_string(),
            ));
        }

        if self.min_confirmations > 1 {
            let tx_block = receipt
                .block_number
                .ok_or_else(|| X402Error::ChainUnavailable("receipt missing block number".to_string()))?;
            let current_block = self
                .provider
                .get_block_number()
                .await
                .map_err(|e| X402Error::ChainUnavailable(e.to_string()))?;
            let confirmations = current_block.saturating_sub(tx_block).as_u64() + 1;
            if confirmations < self.min_confirmations {
                return Err(X402Error::ChainUnavailable(format!(
                    "only {} confirmation(s), require {}",
                    confirmations, self.min_confirmations
                )));
            }
        }

        let asset = parse_address(&method.asset)?;
        let expected_to = parse_address(&method.recipient)?;
        let minimum = string_to_u256(&method.minimum_amount)?;

        let matched = find_qualifying_transfer(&receipt.logs, asset, expected_to, minimum)
            .ok_or(X402Error::AmountMismatch)?;

        Ok(PaymentReceipt {
            transaction_hash: format!("{:?}", receipt.transaction_hash),
            network: method.network.clone(),
            payer: format!("{:?}", matched.from),
            block_number: receipt.block_number.map(|b| b.as_u64()),
            timestamp: None,
        })
    }
}

struct MatchedTransfer {
    from: Address,
}

/// Finds the first log emitted by `asset` that is a `Transfer` event paying
/// `to == expected_to` at least `minimum`. Pure and independent of any live
/// provider so it can be unit-tested against synthetic logs.
fn find_qualifying_transfer(
    logs: &[Log],
    asset: Address,
    expected_to: Address,
    minimum: U256,
) -> Option<MatchedTransfer> {
    let topic = transfer_event_topic();
    logs.iter().find_map(|log| {
        if log.address != asset || log.topics.len() < 3 || log.topics[0] != topic {
            return None;
        }
        let to = Address::from(log.topics[2]);
        if to != expected_to {
            return None;
        }
        let value = U256::from_big_endian(&log.data);
        if value < minimum {
            return None;
        }
        let from = Address::from(log.topics[1]);
        Some(MatchedTransfer { from })
    })
}
