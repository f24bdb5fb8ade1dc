//! Error types for the x402-rs library.
//!
//! This module defines the error taxonomy from the protocol's error handling
//! design: each variant is a distinct failure class, surfaced in a response
//! body's `error` field via [`X402Error::class`] and mapped to one HTTP
//! status via [`X402Error::status_code`]. No variant's `Display` text leaks
//! raw exception internals beyond a short context string.

use thiserror::Error;

/// Main error type for x402 operations.
#[derive(Error, Debug)]
pub enum X402Error {
    /// No `X-PAYMENT` header was supplied.
    #[error("payment required")]
    PaymentRequired,

    /// The `X-PAYMENT` header could not be decoded as base64(JSON) or JSON,
    /// or its structure is missing required fields.
    #[error("invalid payment format: {0}")]
    InvalidFormat(String),

    /// The header decoded structurally but its fields are semantically wrong:
    /// wrong recipient, network, scheme, or amount out of bounds.
    #[error("invalid authorization: {0}")]
    InvalidAuthorization(String),

    /// `now >= validBefore`.
    #[error("authorization expired")]
    Expired,

    /// The nonce has already been consumed.
    #[error("payment nonce already used")]
    Replay,

    /// The facilitator explicitly rejected the payment. Terminal.
    #[error("payment rejected: {0}")]
    Rejected(String),

    /// The facilitator backend could not be reached, failed, or timed out.
    /// Retryable by a later request carrying the same signature.
    #[error("facilitator unavailable: {0}")]
    FacilitatorUnavailable(String),

    /// The chain RPC backend could not be reached, failed, or timed out.
    /// Retryable.
    #[error("chain rpc unavailable: {0}")]
    ChainUnavailable(String),

    /// The on-chain transfer's value is below the configured minimum.
    #[error("on-chain amount below minimum")]
    AmountMismatch,

    /// The given transaction hash was not found on chain.
    #[error("unknown transaction")]
    UnknownTransaction,

    /// The scheme is not implemented by any configured validator or signer.
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// The network name is not present in the network table.
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// Invalid address format.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid amount (failed to parse as a uint256 decimal string).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Signature construction or recovery failed.
    #[error("signature error: {0}")]
    SignatureError(String),

    /// A `GateConfig`/`FacilitatorBackendConfig`/etc. is missing a required
    /// field or combines fields inconsistently.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// No payment method in a 402 challenge matched the client's wallet.
    #[error("no acceptable payment method")]
    NoAcceptableMethod,

    /// A second 402 was received after a paid retry.
    #[error("payment not accepted")]
    PaymentNotAccepted,

    /// The server's 402 body could not be parsed as a Challenge.
    #[error("bad challenge: {0}")]
    BadChallenge(String),

    /// An unhandled internal error. Never rendered to the client verbatim.
    #[error("internal error: {0}")]
    Internal(String),

    /// Error during HTTP request/response handling.
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Error during JSON serialization/deserialization.
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during Base64 encoding/decoding.
    #[error("base64 error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// Error parsing a URL.
    #[error("url parse error: {0}")]
    UrlParseError(#[from] url::ParseError),
}

/// Result type alias for x402 operations.
pub type Result<T> = std::result::Result<T, X402Error>;

impl From<ethers::core::types::SignatureError> for X402Error {
    fn from(err: ethers::core::types::SignatureError) -> Self {
        X402Error::SignatureError(err.to_string())
    }
}

impl From<ethers::providers::ProviderError> for X402Error {
    fn from(err: ethers::providers::ProviderError) -> Self {
        X402Error::ChainUnavailable(err.to_string())
    }
}

impl X402Error {
    /// The wire error class, as used in the response body's `error` field.
    pub fn class(&self) -> &'static str {
        match self {
            X402Error::PaymentRequired => "payment-required",
            X402Error::InvalidFormat(_)
            | X402Error::JsonError(_)
            | X402Error::Base64Error(_)
            | X402Error::UrlParseError(_) => "invalid-format",
            X402Error::InvalidAuthorization(_)
            | X402Error::UnsupportedNetwork(_)
            | X402Error::UnsupportedScheme(_)
            | X402Error::InvalidAddress(_)
            | X402Error::InvalidAmount(_) => "invalid-authorization",
            X402Error::Expired => "expired",
            X402Error::Replay => "replay",
            X402Error::Rejected(_) => "rejected",
            X402Error::FacilitatorUnavailable(_) => "facilitator-unavailable",
            X402Error::ChainUnavailable(_) => "chain-unavailable",
            X402Error::AmountMismatch => "amount-mismatch",
            X402Error::UnknownTransaction => "unknown-transaction",
            X402Error::SignatureError(_) => "invalid-authorization",
            X402Error::ConfigError(_)
            | X402Error::NoAcceptableMethod
            | X402Error::PaymentNotAccepted
            | X402Error::BadChallenge(_)
            | X402Error::Internal(_)
            | X402Error::HttpError(_) => "internal",
        }
    }

    /// The HTTP status this error class maps to, per the error taxonomy.
    pub fn status_code(&self) -> u16 {
        match self {
            X402Error::PaymentRequired => 402,
            X402Error::InvalidFormat(_)
            | X402Error::JsonError(_)
            | X402Error::Base64Error(_)
            | X402Error::UrlParseError(_) => 400,
            X402Error::InvalidAuthorization(_)
            | X402Error::UnsupportedNetwork(_)
            | X402Error::UnsupportedScheme(_)
            | X402Error::InvalidAddress(_)
            | X402Error::InvalidAmount(_)
            | X402Error::SignatureError(_) => 400,
            X402Error::Expired => 400,
            X402Error::Replay => 400,
            X402Error::Rejected(_) => 402,
            X402Error::FacilitatorUnavailable(_) => 502,
            X402Error::ChainUnavailable(_) => 502,
            X402Error::AmountMismatch => 400,
            X402Error::UnknownTransaction => 400,
            X402Error::ConfigError(_)
            | X402Error::NoAcceptableMethod
            | X402Error::PaymentNotAccepted
            | X402Error::BadChallenge(_)
            | X402Error::Internal(_)
            | X402Error::HttpError(_) => 500,
        }
    }

    /// Whether a client may retry this failure, possibly after acting (pay,
    /// re-sign, wait for chain finality).
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            X402Error::PaymentRequired
                | X402Error::Expired
                | X402Error::FacilitatorUnavailable(_)
                | X402Error::ChainUnavailable(_)
                | X402Error::UnknownTransaction
        )
    }
}
