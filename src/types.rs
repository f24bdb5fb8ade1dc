//! Core type definitions for the x402 protocol.
//!
//! This module contains the wire and in-memory shapes for a payment method
//! offered by a protected resource, the 402 challenge built from one or more
//! methods, the ERC-3009 authorization a client signs, the signed envelope
//! sent back as `X-PAYMENT`, and the receipt a successful settlement
//! produces.
//!
//! Field-name aliases on the wire (`accepts` vs `methods`, `payTo` vs
//! `recipient`, `maxAmountRequired` vs `maximumAmount`, `maxTimeoutSeconds`
//! vs `timeout`) are normalized once, here, at deserialization time. Every
//! other module in this crate works only with the canonical field names.

use crate::errors::{Result, X402Error};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Version of the x402 protocol.
pub const X402_VERSION: u32 = 1;

/// Scheme/domain hints a payment method may carry for EIP-712 signing, e.g.
/// the token contract's `name()`/`version()`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodExtra {
    /// EIP-712 domain name (e.g. `"USD Coin"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// EIP-712 domain version (e.g. `"2"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// One offered `(scheme, network, asset, recipient, amount)` tuple inside a
/// challenge.
///
/// Invariant: `maximum_amount >= minimum_amount > 0`; `timeout` (ms) is in
/// `[1_000, 3_600_000]`. [`PaymentMethod::new`] enforces both.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethod {
    pub scheme: String,
    pub network: String,
    pub asset: String,
    #[serde(rename = "recipient")]
    pub recipient: String,
    #[serde(rename = "maximumAmount")]
    pub maximum_amount: String,
    #[serde(rename = "minimumAmount")]
    pub minimum_amount: String,
    /// Validity window length, milliseconds.
    pub timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<MethodExtra>,
}

impl PaymentMethod {
    /// Builds a method, checking the amount and timeout invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scheme: impl Into<String>,
        network: impl Into<String>,
        asset: impl Into<String>,
        recipient: impl Into<String>,
        maximum_amount: impl Into<String>,
        minimum_amount: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self> {
        let maximum_amount = maximum_amount.into();
        let minimum_amount = minimum_amount.into();
        let max = crate::utils::string_to_u256(&maximum_amount)?;
        let min = crate::utils::string_to_u256(&minimum_amount)?;
        if min.is_zero() {
            return Err(X402Error::ConfigError(
                "minimumAmount must be > 0".to_string(),
            ));
        }
        if max < min {
            return Err(X402Error::ConfigError(
                "maximumAmount must be >= minimumAmount".to_string(),
            ));
        }
        if !(1_000..=3_600_000).contains(&timeout_ms) {
            return Err(X402Error::ConfigError(
                "timeout must be between 1s and 1h".to_string(),
            ));
        }
        Ok(Self {
            scheme: scheme.into(),
            network: network.into(),
            asset: asset.into(),
            recipient: recipient.into(),
            maximum_amount,
            minimum_amount,
            timeout: timeout_ms,
            description: None,
            extra: None,
        })
    }

    /// Sets the human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the EIP-712 domain hints.
    pub fn with_extra(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.extra = Some(MethodExtra {
            name: Some(name.into()),
            version: Some(version.into()),
        });
        self
    }
}

impl<'de> Deserialize<'de> for PaymentMethod {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Normalize the field-name aliases in one place: decode to a generic
        // Value, then read each field through every accepted wire name
        // before falling back to the canonical one.
        let value = Value::deserialize(deserializer)?;
        let obj = value
            .as_object()
            .ok_or_else(|| DeError::custom("payment method must be a JSON object"))?;

        let get_str = |keys: &[&str]| -> Option<String> {
            keys.iter()
                .find_map(|k| obj.get(*k))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        let scheme =
            get_str(&["scheme"]).ok_or_else(|| DeError::custom("missing field `scheme`"))?;
        let network =
            get_str(&["network"]).ok_or_else(|| DeError::custom("missing field `network`"))?;
        let asset = get_str(&["asset"]).ok_or_else(|| DeError::custom("missing field `asset`"))?;
        let recipient = get_str(&["recipient", "payTo"])
            .ok_or_else(|| DeError::custom("missing field `recipient`/`payTo`"))?;
        let maximum_amount = get_str(&["maximumAmount", "maxAmountRequired"])
            .ok_or_else(|| DeError::custom("missing field `maximumAmount`/`maxAmountRequired`"))?;
        let minimum_amount =
            get_str(&["minimumAmount"]).unwrap_or_else(|| maximum_amount.clone());

        let timeout = if let Some(v) = obj.get("timeout").and_then(|v| v.as_u64()) {
            v
        } else if let Some(secs) = obj.get("maxTimeoutSeconds").and_then(|v| v.as_u64()) {
            secs.saturating_mul(1000)
        } else {
            return Err(DeError::custom(
                "missing field `timeout`/`maxTimeoutSeconds`",
            ));
        };

        let description = get_str(&["description"]);
        let extra = obj
            .get("extra")
            .cloned()
            .map(|v| serde_json::from_value(v).map_err(DeError::custom))
            .transpose()?;

        Ok(PaymentMethod {
            scheme,
            network,
            asset,
            recipient,
            maximum_amount,
            minimum_amount,
            timeout,
            description,
            extra,
        })
    }
}

/// The HTTP 402 body: a non-empty list of accepted payment methods.
#[derive(Serialize, Debug, Clone)]
pub struct Challenge {
    #[serde(rename = "x402Version")]
    pub x402_version: u32,
    pub methods: Vec<PaymentMethod>,
}

impl Challenge {
    /// Builds a challenge from one or more methods.
    pub fn new(methods: Vec<PaymentMethod>) -> Result<Self> {
        if methods.is_empty() {
            return Err(X402Error::ConfigError(
                "a challenge must offer at least one payment method".to_string(),
            ));
        }
        Ok(Self {
            x402_version: X402_VERSION,
            methods,
        })
    }
}

impl<'de> Deserialize<'de> for Challenge {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let obj = value
            .as_object()
            .ok_or_else(|| DeError::custom("challenge must be a JSON object"))?;
        let x402_version = obj
            .get("x402Version")
            .and_then(|v| v.as_u64())
            .unwrap_or(1) as u32;
        let methods_value = obj
            .get("methods")
            .or_else(|| obj.get("accepts"))
            .cloned()
            .ok_or_else(|| DeError::custom("missing field `methods`/`accepts`"))?;
        let methods: Vec<PaymentMethod> =
            serde_json::from_value(methods_value).map_err(DeError::custom)?;
        Ok(Challenge {
            x402_version,
            methods,
        })
    }
}

/// The ERC-3009 `TransferWithAuthorization` payload a client signs.
///
/// Invariants: `valid_after <= now < valid_before`; `nonce` is 32
/// uniformly-random bytes; `value` fits a uint256.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(rename = "validAfter")]
    pub valid_after: String,
    #[serde(rename = "validBefore")]
    pub valid_before: String,
    pub nonce: String,
}

/// The scheme-specific payload inside a [`SignedAuthorization`]: a 65-byte
/// `r || s || v` ECDSA signature over the [`Authorization`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignedAuthorizationPayload {
    pub signature: String,
    pub authorization: Authorization,
}

/// The `X-PAYMENT` wire envelope.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignedAuthorization {
    #[serde(rename = "x402Version")]
    pub x402_version: u32,
    pub scheme: String,
    pub network: String,
    pub payload: SignedAuthorizationPayload,
}

/// A post-settlement record tying a nonce to an on-chain transaction hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    pub network: String,
    pub payer: String,
    #[serde(skip_serializing_if = "Option::is_none", rename = "blockNumber")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_method() -> PaymentMethod {
        PaymentMethod::new(
            "exact",
            "base-sepolia",
            "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            "0x501ab28fc3c7d29c2d12b243723eb5c5418b9de6",
            "100000",
            "100000",
            300_000,
        )
        .unwrap()
        .with_description("Sentiment Analysis")
        .with_extra("USD Coin", "2")
    }

    #[test]
    fn test_payment_method_invariant_max_lt_min() {
        let err =
            PaymentMethod::new("exact", "base", "0xasset", "0xrecipient", "100", "200", 1000)
                .unwrap_err();
        assert!(matches!(err, X402Error::ConfigError(_)));
    }

    #[test]
    fn test_payment_method_invariant_zero_min() {
        let err = PaymentMethod::new("exact", "base", "0xasset", "0xrecipient", "100", "0", 1000)
            .unwrap_err();
        assert!(matches!(err, X402Error::ConfigError(_)));
    }

    #[test]
    fn test_payment_method_invariant_timeout_bounds() {
        assert!(PaymentMethod::new("exact", "base", "0xa", "0xr", "100", "100", 500).is_err());
        assert!(
            PaymentMethod::new("exact", "base", "0xa", "0xr", "100", "100", 3_600_001).is_err()
        );
        assert!(PaymentMethod::new("exact", "base", "0xa", "0xr", "100", "100", 1000).is_ok());
    }

    #[test]
    fn test_deserialize_canonical_names() {
        let raw = json!({
            "scheme": "exact",
            "network": "base-sepolia",
            "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            "recipient": "0x501ab28fc3c7d29c2d12b243723eb5c5418b9de6",
            "maximumAmount": "100000",
            "minimumAmount": "100000",
            "timeout": 300000,
            "description": "Sentiment Analysis",
            "extra": {"name": "USD Coin", "version": "2"}
        });
        let method: PaymentMethod = serde_json::from_value(raw).unwrap();
        assert_eq!(method, sample_method());
    }

    #[test]
    fn test_deserialize_aliased_names() {
        let raw = json!({
            "scheme": "exact",
            "network": "base-sepolia",
            "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            "payTo": "0x501ab28fc3c7d29c2d12b243723eb5c5418b9de6",
            "maxAmountRequired": "100000",
            "maxTimeoutSeconds": 300,
            "description": "Sentiment Analysis",
            "extra": {"name": "USD Coin", "version": "2"}
        });
        let method: PaymentMethod = serde_json::from_value(raw).unwrap();
        assert_eq!(
            method.recipient,
            "0x501ab28fc3c7d29c2d12b243723eb5c5418b9de6"
        );
        assert_eq!(method.maximum_amount, "100000");
        assert_eq!(method.minimum_amount, "100000"); // defaults to max when absent
        assert_eq!(method.timeout, 300_000); // seconds -> ms
    }

    #[test]
    fn test_challenge_alias_accepts() {
        let raw = json!({
            "x402Version": 1,
            "accepts": [{
                "scheme": "exact",
                "network": "base-sepolia",
                "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
                "payTo": "0x501ab28fc3c7d29c2d12b243723eb5c5418b9de6",
                "maxAmountRequired": "100000",
                "maxTimeoutSeconds": 300
            }]
        });
        let challenge: Challenge = serde_json::from_value(raw).unwrap();
        assert_eq!(challenge.methods.len(), 1);
        assert_eq!(challenge.methods[0].scheme, "exact");
    }

    #[test]
    fn test_challenge_requires_non_empty() {
        assert!(Challenge::new(vec![]).is_err());
        assert!(Challenge::new(vec![sample_method()]).is_ok());
    }

    #[test]
    fn test_signed_authorization_round_trip() {
        let signed = SignedAuthorization {
            x402_version: 1,
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string(),
            payload: SignedAuthorizationPayload {
                signature: "0xabcd".to_string(),
                authorization: Authorization {
                    from: "0xFrom".to_string(),
                    to: "0xTo".to_string(),
                    value: "100000".to_string(),
                    valid_after: "1700000000".to_string(),
                    valid_before: "1700000300".to_string(),
                    nonce: "0x00".to_string(),
                },
            },
        };
        let json = serde_json::to_string(&signed).unwrap();
        let decoded: SignedAuthorization = serde_json::from_str(&json).unwrap();
        let rejson = serde_json::to_string(&decoded).unwrap();
        assert_eq!(json, rejson);
    }

    #[test]
    fn test_payment_receipt_serialization_omits_none() {
        let receipt = PaymentReceipt {
            transaction_hash: "0xdeadbeef".to_string(),
            network: "base-sepolia".to_string(),
            payer: "0xFrom".to_string(),
            block_number: None,
            timestamp: None,
        };
        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("blockNumber").is_none());
        assert!(json.get("timestamp").is_none());
        assert_eq!(json["transactionHash"], "0xdeadbeef");
    }
}
