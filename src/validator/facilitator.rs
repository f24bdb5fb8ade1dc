//! A [`Validator`] backend that delegates to an external facilitator
//! service's `/verify` and `/settle` HTTP endpoints.
//!
//! Shaped after the teacher lineage's single `verify_and_settle_payment`
//! function (verify, then settle, against the same facilitator base URL),
//! generalized to the canonical [`SignedAuthorization`]/[`PaymentReceipt`]
//! types and given the bounded timeouts a network call into an external
//! service needs.

use super::Validator;
use crate::errors::{Result, X402Error};
use crate::types::{PaymentMethod, PaymentReceipt, SignedAuthorization};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TOTAL_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    x402_version: u32,
    payment_payload: &'a SignedAuthorization,
    payment_requirements: &'a PaymentMethod,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    is_valid: bool,
    #[serde(default)]
    invalid_reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettleRequest<'a> {
    x402_version: u32,
    payment_payload: &'a SignedAuthorization,
    payment_requirements: &'a PaymentMethod,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleResponse {
    /// `transactionHash` is the facilitator's canonical field per the x402
    /// wire format; `txHash`/`tx` are accepted from older facilitators.
    #[serde(default, rename = "transactionHash", alias = "txHash", alias = "tx")]
    tx_hash: Option<String>,
    #[serde(default)]
    block_number: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// Validates and settles payments through an external facilitator service.
pub struct FacilitatorValidator {
    http: Client,
    base_url: String,
}

impl FacilitatorValidator {
    /// Builds a validator pointed at `base_url` (no trailing slash expected),
    /// with the bounded connect/total timeouts a facilitator call requires.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(TOTAL_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Builds a validator with a caller-supplied HTTP client (e.g. one
    /// pointed at a `wiremock` server in tests).
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Validator for FacilitatorValidator {
    fn name(&self) -> &str {
        "facilitator"
    }

    async fn validate(
        &self,
        signed: &SignedAuthorization,
        method: &PaymentMethod,
    ) -> Result<PaymentReceipt> {
        let verify_request = VerifyRequest {
            x402_version: signed.x402_version,
            payment_payload: signed,
            payment_requirements: method,
        };

        let verify_response = self
            .http
            .post(format!("{}/verify", self.base_url))
            .json(&verify_request)
            .send()
            .await
            .map_err(|e| X402Error::FacilitatorUnavailable(e.to_string()))?;

        if verify_response.status().is_server_error() {
            return Err(X402Error::FacilitatorUnavailable(format!(
                "facilitator /verify returned {}",
                verify_response.status()
            )));
        }
        if verify_response.status().is_client_error() {
            return Err(X402Error::Rejected(format!(
                "facilitator /verify returned {}",
                verify_response.status()
            )));
        }

        let verification: VerifyResponse = verify_response
            .json()
            .await
            .map_err(|e| X402Error::FacilitatorUnavailable(e.to_string()))?;

        if !verification.is_valid {
            return Err(X402Error::Rejected(
                verification
                    .invalid_reason
                    .unwrap_or_else(|| "facilitator rejected payment".to_string()),
            ));
        }

        let settle_request = SettleRequest {
            x402_version: signed.x402_version,
            payment_payload: signed,
            payment_requirements: method,
        };

        let settle_response = self
            .http
            .post(format!("{}/settle", self.base_url))
            .json(&settle_request)
            .send()
            .await
            .map_err(|e| X402Error::FacilitatorUnavailable(e.to_string()))?;

        if settle_response.status() == StatusCode::SERVICE_UNAVAILABLE
            || settle_response.status().is_server_error()
        {
            return Err(X402Error::FacilitatorUnavailable(format!(
                "facilitator /settle returned {}",
                settle_response.status()
            )));
        }

        let settlement: SettleResponse = settle_response
            .json()
            .await
            .map_err(|e| X402Error::FacilitatorUnavailable(e.to_string()))?;

        if let Some(error) = settlement.error {
            return Err(X402Error::Rejected(error));
        }

        let transaction_hash = settlement
            .tx_hash
            .ok_or_else(|| X402Error::FacilitatorUnavailable(
                "facilitator settled without a transaction hash".to_string(),
            ))?;

        Ok(PaymentReceipt {
            transaction_hash,
            network: method.network.clone(),
            payer: signed.payload.authorization.from.clone(),
            block_number: settlement.block_number,
            timestamp: None,
        })
    }
}
