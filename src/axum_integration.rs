//! Axum middleware wiring for the [`crate::gate::PaymentGate`].
//!
//! Grounded in the simple `axum::middleware::from_fn_with_state` style (one
//! async function, no hand-rolled `tower::Layer`/`Service` pair) rather than
//! a full `Layer` implementation, since a single function is enough to
//! translate [`GateOutcome`]/[`X402Error`] into an HTTP response at the one
//! edge this crate owns.

use crate::errors::X402Error;
use crate::gate::{GateOutcome, PaymentGate};
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

const PAYMENT_HEADER: &str = "X-PAYMENT";
const PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

/// An Axum middleware function that gates the wrapped route behind
/// `gate`'s accepted payment method.
///
/// Install with:
/// ```ignore
/// Router::new()
///     .route("/resource", get(handler))
///     .layer(axum::middleware::from_fn_with_state(gate, payment_gate_layer))
/// ```
pub async fn payment_gate_layer(
    State(gate): State<Arc<PaymentGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(PAYMENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match gate.handle(header.as_deref()).await {
        Ok(GateOutcome::Challenge(challenge)) => {
            (StatusCode::PAYMENT_REQUIRED, Json(challenge)).into_response()
        }
        Ok(GateOutcome::Settled(receipt)) => {
            let mut response = next.run(request).await;
            if let Ok(signed_header) = encode_receipt_header(&receipt) {
                if let Ok(value) = axum::http::HeaderValue::from_str(&signed_header) {
                    response.headers_mut().insert(PAYMENT_RESPONSE_HEADER, value);
                }
            }
            response
        }
        Err(err) => error_response(&err),
    }
}

fn encode_receipt_header(receipt: &crate::types::PaymentReceipt) -> crate::errors::Result<String> {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    let json = serde_json::to_string(receipt)?;
    Ok(BASE64.encode(json.as_bytes()))
}

fn error_response(err: &X402Error) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = json!({
        "error": err.class(),
        "message": err.to_string(),
    });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::encode_payment_header;
    use crate::network::Network;
    use crate::replay::InMemoryReplayStore;
    use crate::signer::AuthorizationSigner;
    use crate::types::PaymentMethod;
    use crate::validator::Validator;
    use crate::validator::ValidatorChain;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use std::time::Duration;
    use tower::ServiceExt;

    const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

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
        .with_extra("USD Coin", "2")
    }

    struct AcceptAll;

    #[async_trait]
    impl Validator for AcceptAll {
        fn name(&self) -> &str {
            "accept-all"
        }
        async fn validate(
            &self,
            signed: &crate::types::SignedAuthorization,
            method: &PaymentMethod,
        ) -> crate::errors::Result<crate::types::PaymentReceipt> {
            Ok(crate::types::PaymentReceipt {
                transaction_hash: "0xsettled".to_string(),
                network: method.network.clone(),
                payer: signed.payload.authorization.from.clone(),
                block_number: None,
                timestamp: None,
            })
        }
    }

    fn app() -> Router {
        let store = Arc::new(InMemoryReplayStore::new(Duration::from_secs(60)));
        let gate = Arc::new(PaymentGate::new(
            sample_method(),
            store,
            ValidatorChain::new(vec![Box::new(AcceptAll)]),
        ));
        Router::new()
            .route("/resource", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(gate, payment_gate_layer))
    }

    #[tokio::test]
    async fn test_missing_header_returns_402_challenge() {
        let response = app()
            .oneshot(Request::builder().uri("/resource").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_valid_payment_reaches_handler() {
        let signer = AuthorizationSigner::new(TEST_KEY).unwrap();
        let method = sample_method();
        let signed = signer.sign(&method, &method.maximum_amount).await.unwrap();
        let header = encode_payment_header(&signed).unwrap();

        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/resource")
                    .header(PAYMENT_HEADER, header)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(PAYMENT_RESPONSE_HEADER).is_some());
    }

    #[test]
    fn test_network_table_used_by_signer_matches_method() {
        assert_eq!(Network::BaseSepolia.as_str(), sample_method().network);
    }
}
