//! The Payment Driver: an HTTP client that transparently retries a 402
//! response with a signed payment.
//!
//! Mirrors the teacher lineage's `request_with_payment` algorithm (send,
//! inspect for 402, sign, retry once) generalized to the canonical
//! [`Challenge`]/[`SignedAuthorization`] types and a [`Network`] allow-list.

use crate::errors::{Result, X402Error};
use crate::network::Network;
use crate::signer::AuthorizationSigner;
use crate::types::{Challenge, PaymentMethod};
use crate::utils::encode_payment_header;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::str::FromStr;

/// Configuration and credentials for an [`X402Client`].
pub struct X402ClientConfig {
    signer: AuthorizationSigner,
    http_client: Client,
    preferred_scheme: Option<String>,
    allowed_networks: Option<Vec<Network>>,
}

impl X402ClientConfig {
    /// Builds a configuration for the wallet at `private_key`, defaulting to
    /// the `exact` scheme with no network restriction.
    pub fn new(private_key: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            signer: AuthorizationSigner::new(private_key.as_ref())?,
            http_client: Client::new(),
            preferred_scheme: Some("exact".to_string()),
            allowed_networks: None,
        })
    }

    /// Restricts which schemes this client will pay with.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.preferred_scheme = Some(scheme.into());
        self
    }

    /// Restricts which networks this client will sign authorizations for.
    /// A method on any other network is skipped even if otherwise eligible.
    pub fn with_allowed_networks(mut self, networks: Vec<Network>) -> Self {
        self.allowed_networks = Some(networks);
        self
    }

    /// Supplies a pre-built HTTP client (proxy settings, custom timeouts).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }
}

/// Drives x402-protected HTTP requests: on a 402 response, selects an
/// acceptable method, signs an authorization, and retries exactly once.
pub struct X402Client {
    config: X402ClientConfig,
}

impl X402Client {
    /// Wraps `config` as a client.
    pub fn new(config: X402ClientConfig) -> Self {
        Self { config }
    }

    /// Performs `method url` with automatic x402 payment handling. On a 402
    /// response it signs a matching authorization and retries once; a
    /// second 402 (or an unchanged 402 after the retry) is surfaced as
    /// [`X402Error::PaymentNotAccepted`].
    pub async fn fetch(&self, method: Method, url: &str, body: Option<Value>) -> Result<Response> {
        let response = self.send(method.clone(), url, body.as_ref()).await?;

        if response.status() != StatusCode::PAYMENT_REQUIRED {
            return Ok(response);
        }

        let challenge: Challenge = response
            .json()
            .await
            .map_err(|e| X402Error::BadChallenge(e.to_string()))?;

        let chosen = self.select_method(&challenge)?;
        let signed = self.config.signer.sign(chosen, &chosen.maximum_amount).await?;
        let header = encode_payment_header(&signed)?;

        let retry = self
            .http_request(method, url, body.as_ref())
            .header("X-PAYMENT", header)
            .send()
            .await?;

        if retry.status() == StatusCode::PAYMENT_REQUIRED {
            return Err(X402Error::PaymentNotAccepted);
        }

        // The settlement receipt in X-PAYMENT-RESPONSE is advisory: the
        // caller already has the committed HTTP response and should not
        // block on re-parsing it before proceeding.
        Ok(retry)
    }

    /// Convenience wrapper for `GET`.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.fetch(Method::GET, url, None).await
    }

    /// Convenience wrapper for `POST`.
    pub async fn post(&self, url: &str, body: Value) -> Result<Response> {
        self.fetch(Method::POST, url, Some(body)).await
    }

    fn http_request(&self, method: Method, url: &str, body: Option<&Value>) -> reqwest::RequestBuilder {
        let mut request = self.config.http_client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Response> {
        Ok(self.http_request(method, url, body).send().await?)
    }

    fn select_method<'a>(&self, challenge: &'a Challenge) -> Result<&'a PaymentMethod> {
        let mut candidates: Vec<&PaymentMethod> = challenge.methods.iter().collect();

        if let Some(scheme) = &self.config.preferred_scheme {
            candidates.retain(|m| &m.scheme == scheme);
        }

        if let Some(allowed) = &self.config.allowed_networks {
            candidates.retain(|m| {
                Network::from_str(&m.network)
                    .map(|n| allowed.contains(&n))
                    .unwrap_or(false)
            });
        }

        candidates.into_iter().next().ok_or(X402Error::NoAcceptableMethod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn sample_method(network: &str) -> PaymentMethod {
        PaymentMethod::new(
            "exact",
            network,
            "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            "0x501aB28fc3C7d29C2D12b243723EB5c5418B9de6",
            "100000",
            "100000",
            300_000,
        )
        .unwrap()
    }

    fn client() -> X402Client {
        X402Client::new(X402ClientConfig::new(TEST_KEY).unwrap())
    }

    #[test]
    fn test_select_method_filters_by_scheme() {
        let challenge = Challenge::new(vec![sample_method("base-sepolia")]).unwrap();
        let client = client().config.preferred_scheme.clone();
        assert_eq!(client, Some("exact".to_string()));
        let selected = X402Client::new(X402ClientConfig::new(TEST_KEY).unwrap())
            .select_method(&challenge)
            .unwrap();
        assert_eq!(selected.scheme, "exact");
    }

    #[test]
    fn test_select_method_respects_network_allowlist() {
        let challenge = Challenge::new(vec![sample_method("polygon")]).unwrap();
        let client = X402Client::new(
            X402ClientConfig::new(TEST_KEY)
                .unwrap()
                .with_allowed_networks(vec![Network::Base, Network::BaseSepolia]),
        );
        let err = client.select_method(&challenge).unwrap_err();
        assert!(matches!(err, X402Error::NoAcceptableMethod));
    }

    #[test]
    fn test_select_method_picks_first_eligible() {
        let challenge = Challenge::new(vec![
            sample_method("polygon"),
            sample_method("base-sepolia"),
        ])
        .unwrap();
        let client = X402Client::new(
            X402ClientConfig::new(TEST_KEY)
                .unwrap()
                .with_allowed_networks(vec![Network::BaseSepolia]),
        );
        let selected = client.select_method(&challenge).unwrap();
        assert_eq!(selected.network, "base-sepolia");
    }
}
