//! # x402-rs
//!
//! A Rust implementation of the x402 protocol for stablecoin-denominated
//! micropayments over HTTP.
//!
//! The x402 protocol repurposes the HTTP 402 "Payment Required" status code
//! into a payment-negotiation handshake for web resources like APIs,
//! content, or files. It is chain-agnostic in principle; this crate targets
//! EVM chains via EIP-3009 `transferWithAuthorization`, which lets a payer
//! authorize a transfer with a signature alone, no gas required from them.
//!
//! ## Features
//!
//! - **Payment Gate**: a state machine ([`gate::PaymentGate`]) that turns an
//!   `X-PAYMENT` header into a 402 challenge, a settled receipt, or a typed
//!   rejection
//! - **Payment Driver**: an HTTP client ([`client::X402Client`]) that
//!   transparently signs and retries on a 402 response
//! - **Pluggable settlement**: signed-authorization routes verify and settle
//!   through an external facilitator ([`validator::FacilitatorValidator`]);
//!   legacy bare-transaction-hash routes verify read-only on-chain
//!   ([`validator::ChainValidator`]) instead — the gate never submits a
//!   transaction itself
//! - **Axum middleware**: [`axum_integration::payment_gate_layer`] wires a
//!   gate into a router with one `.layer(...)` call
//!
//! ## Quick Start
//!
//! ### Server Example
//!
//! ```rust,no_run
//! use x402_rs::server::GateConfig;
//! use x402_rs::types::PaymentMethod;
//!
//! # fn example() -> x402_rs::Result<()> {
//! let method = PaymentMethod::new(
//!     "exact",
//!     "base",
//!     "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", // USDC on Base
//!     "0xYOUR_ADDRESS",
//!     "10000", // maximum amount, atomic units
//!     "10000", // minimum amount, atomic units
//!     300_000, // timeout, ms
//! )?;
//!
//! let gate = GateConfig::new(method)
//!     .with_facilitator("https://facilitator.example.com")
//!     .build()?;
//! # let _ = gate;
//! # Ok(())
//! # }
//! ```
//!
//! ### Client Example
//!
//! ```rust,no_run
//! use x402_rs::client::{X402Client, X402ClientConfig};
//!
//! # async fn example() -> x402_rs::Result<()> {
//! let config = X402ClientConfig::new("0xYOUR_PRIVATE_KEY")?;
//! let client = X402Client::new(config);
//! let response = client.get("https://api.example.com/weather").await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```
//!
//! ## Protocol Overview
//!
//! 1. **Client requests resource**: a plain HTTP request, no payment header.
//! 2. **Server responds 402**: body carries the accepted [`types::PaymentMethod`]s.
//! 3. **Client signs**: picks a method, signs an EIP-3009 authorization.
//! 4. **Client retries**: same request, with `X-PAYMENT` carrying the signed
//!    authorization.
//! 5. **Server verifies and settles**: structural checks, semantic checks
//!    against the accepted method, a single-use nonce lock, then a
//!    [`validator::Validator`] backend verifies the signature and reports
//!    settlement (legacy deployments instead verify a pre-submitted
//!    transaction hash read-only; see [`gate::GateMode`]).
//! 6. **Server responds 200**: the protected resource, with a settlement
//!    receipt in `X-PAYMENT-RESPONSE`.
//!
//! ## Security
//!
//! - **Trust-minimized**: payers sign authorizations bounded to one amount
//!   and one recipient; nothing here can move funds beyond what was signed.
//! - **Replay protection**: a nonce may be consumed exactly once, tracked by
//!   [`replay::ReplayStore`].
//! - **Time-bounded**: every authorization carries a `validAfter`/`validBefore`
//!   window, checked both before and during on-chain settlement.
//! - **EIP-712 signatures**: verified against the payment asset's domain
//!   separator, never against a hand-rolled hash.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod eip712;
pub mod errors;
pub mod gate;
pub mod network;
pub mod replay;
pub mod server;
pub mod signer;
pub mod types;
pub mod utils;
pub mod validator;

#[cfg(feature = "axum-integration")]
pub mod axum_integration;

pub use errors::{Result, X402Error};
pub use gate::{GateMode, GateOutcome, PaymentGate};
pub use network::Network;
pub use types::{Challenge, PaymentMethod, PaymentReceipt, SignedAuthorization, X402_VERSION};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert_eq!(X402_VERSION, 1);
    }

    #[test]
    fn test_module_accessibility() {
        let method = PaymentMethod::new(
            "exact",
            "base-sepolia",
            "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            "0x501aB28fc3C7d29C2D12b243723EB5c5418B9de6",
            "100000",
            "100000",
            300_000,
        )
        .unwrap();
        let _ = server::GateConfig::new(method).with_facilitator("https://facilitator.example.com");
        let _ = client::X402ClientConfig::new(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        );
    }
}
