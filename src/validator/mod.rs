//! The Payment Validator: an ordered fallback chain of backends that turn a
//! [`SignedAuthorization`] into a [`PaymentReceipt`], or a terminal
//! [`X402Error`].
//!
//! Each backend may fail in one of two ways: *unavailable* (the backend
//! itself could not be reached — the chain falls through to the next one)
//! or *terminal* (the authorization itself is bad — the chain stops and
//! surfaces the error). [`X402Error::class`] distinguishes the two: any
//! class ending in `-unavailable` is a fallthrough signal.

pub mod chain;
pub mod facilitator;
#[cfg(feature = "format-validator")]
pub mod format;

use crate::errors::{Result, X402Error};
use crate::types::{PaymentMethod, PaymentReceipt, SignedAuthorization};
use async_trait::async_trait;

pub use chain::ChainValidator;
pub use facilitator::FacilitatorValidator;
#[cfg(feature = "format-validator")]
pub use format::FormatValidator;

/// A single payment validation backend.
#[async_trait]
pub trait Validator: Send + Sync {
    /// A short name for this backend, used in logs.
    fn name(&self) -> &str;

    /// Validates (and, where the backend is authoritative, settles) the
    /// authorization against `method`.
    async fn validate(
        &self,
        signed: &SignedAuthorization,
        method: &PaymentMethod,
    ) -> Result<PaymentReceipt>;
}

fn is_fallthrough(err: &X402Error) -> bool {
    err.class().ends_with("-unavailable")
}

/// An ordered list of [`Validator`] backends, tried in sequence until one
/// returns a definitive outcome (success, or a terminal error).
pub struct ValidatorChain {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidatorChain {
    /// Builds a chain from backends in fallback order: the first entry is
    /// tried first.
    pub fn new(validators: Vec<Box<dyn Validator>>) -> Self {
        Self { validators }
    }

    /// Runs the chain. Stops and returns on the first backend whose result
    /// is not an `*-unavailable` error.
    pub async fn validate(
        &self,
        signed: &SignedAuthorization,
        method: &PaymentMethod,
    ) -> Result<PaymentReceipt> {
        let mut last_unavailable = None;
        for validator in &self.validators {
            tracing::debug!(backend = validator.name(), "attempting validator backend");
            match validator.validate(signed, method).await {
                Ok(receipt) => return Ok(receipt),
                Err(err) if is_fallthrough(&err) => {
                    tracing::warn!(
                        backend = validator.name(),
                        error = %err,
                        "validator backend unavailable, falling through"
                    );
                    last_unavailable = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_unavailable.unwrap_or_else(|| {
            X402Error::Internal("no validator backend configured".to_string())
        }))
    }
}
