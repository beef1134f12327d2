//! Webhook payload construction and delivery.
//!
//! Deliveries are fire-and-forget: one POST per hook with at least one
//! matched statement, no retries, every failure logged and swallowed.
//! Consumers that need reliability poll the API instead.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use tracing::{info, warn};

use openlrs_types::{HookConfig, HookContentType, HookId, StoredStatement};

use crate::config::DispatchConfig;
use crate::error::TaskError;

type HmacSha1 = Hmac<Sha1>;

/// HTTP client for webhook deliveries.
pub struct DeliveryClient {
    client: reqwest::Client,
}

impl DeliveryClient {
    /// Build the delivery client from dispatch configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::HttpClient`] if the underlying client (TLS
    /// backend included) cannot be constructed.
    pub fn new(config: &DispatchConfig) -> Result<Self, TaskError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify)
            .build()?;
        Ok(Self { client })
    }

    /// Deliver a batch of matched statements to one hook endpoint.
    pub async fn deliver(
        &self,
        hook_id: HookId,
        config: &HookConfig,
        matches: &[Arc<StoredStatement>],
    ) {
        let documents: Vec<&str> = matches
            .iter()
            .map(|statement| statement.document.as_str())
            .collect();
        let payload = payload_body(hook_id, &documents);
        let (body, mime) = wire_body(config.content_type, payload);

        let mut request = self
            .client
            .post(&config.endpoint)
            .header("Content-Type", mime)
            .header("Connection", "close");
        // The signature covers the body exactly as sent, `payload=` prefix
        // included, so consumers can verify without re-encoding anything.
        if let Some(secret) = config.signing_secret()
            && let Some(signature) = signature(secret, &body)
        {
            request = request.header("X-LRS-Signature", signature);
        }

        info!(
            endpoint = %config.endpoint,
            statements = matches.len(),
            "Sending statements to hook endpoint"
        );
        match request.body(body).send().await {
            Ok(response) => {
                info!(
                    endpoint = %config.endpoint,
                    status = %response.status(),
                    "Hook endpoint responded"
                );
            }
            Err(error) => {
                warn!(
                    endpoint = %config.endpoint,
                    %error,
                    "Could not send statements to hook"
                );
            }
        }
    }
}

/// Join statement documents verbatim into the delivery payload.
///
/// Documents are embedded exactly as stored, never re-serialized, so the
/// consumer receives each statement byte for byte as the LRS accepted it.
fn payload_body(hook_id: HookId, documents: &[&str]) -> String {
    let joined = documents.join(",");
    format!("{{\"statements\": [{joined}], \"id\": \"{hook_id}\"}}")
}

/// Encode the payload for the wire per the hook's content type.
fn wire_body(content_type: HookContentType, payload: String) -> (String, &'static str) {
    match content_type {
        HookContentType::Json => (payload, "application/json"),
        HookContentType::Form => (
            format!("payload={payload}"),
            "application/x-www-form-urlencoded",
        ),
    }
}

/// Lowercase hex HMAC-SHA1 of `body` keyed by `secret`.
fn signature(secret: &str, body: &str) -> Option<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}
