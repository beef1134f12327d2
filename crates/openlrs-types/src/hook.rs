//! Webhook registrations.
//!
//! A hook couples a statement filter document with delivery configuration.
//! Both halves are stored as raw JSON and parsed again on every dispatch
//! cycle, so a registration that has gone bad surfaces as a per-hook error
//! at dispatch time instead of poisoning the whole store.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::ids::HookId;

/// How the webhook payload is encoded on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HookContentType {
    /// The payload document itself, sent as `application/json`.
    #[default]
    Json,
    /// The payload document behind a `payload=` key, sent as
    /// `application/x-www-form-urlencoded`.
    Form,
}

impl Serialize for HookContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Self::Json => "json",
            Self::Form => "form",
        })
    }
}

impl<'de> Deserialize<'de> for HookContentType {
    // Anything other than the exact string "json" selects the form
    // encoding, matching how consumers have historically registered hooks.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(if value.as_str() == Some("json") {
            Self::Json
        } else {
            Self::Form
        })
    }
}

/// Parsed delivery configuration of a hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    /// URL statements are POSTed to.
    pub endpoint: String,
    /// Payload encoding; JSON unless registered otherwise.
    #[serde(default)]
    pub content_type: HookContentType,
    /// Shared secret for the `X-LRS-Signature` header.
    #[serde(default)]
    pub secret: Option<String>,
}

impl HookConfig {
    /// Parse a stored config document. `endpoint` is the only required
    /// field; unknown fields are ignored.
    pub fn from_value(config: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(config.clone())
    }

    /// The secret to sign payloads with, if one is set and non-empty.
    pub fn signing_secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }
}

/// A registered webhook as held by the hook store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    /// Hook identifier; echoed in every payload this hook receives.
    pub id: HookId,
    /// Raw filter document deciding which statements this hook wants.
    pub filters: Value,
    /// Raw delivery configuration; see [`HookConfig`].
    pub config: Value,
}

impl Hook {
    /// Parse this hook's delivery configuration.
    pub fn parsed_config(&self) -> Result<HookConfig, serde_json::Error> {
        HookConfig::from_value(&self.config)
    }
}
