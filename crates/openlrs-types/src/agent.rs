//! xAPI actors and their inverse-functional identifiers.
//!
//! An actor (xAPI 2.4.2) is an `Agent` or a `Group`. Identified actors carry
//! exactly one inverse-functional identifier ([`Ifi`]); anonymous groups
//! carry none and are identified only by their member list. Identity
//! predicates and the agent store key on the IFI alone, so anonymous groups
//! never participate in either.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Inverse-functional identifier (xAPI 2.4.2.3)
// ---------------------------------------------------------------------------

/// One of the four identifier schemes xAPI allows for an actor.
///
/// Two actor documents denote the same agent exactly when their IFIs are
/// equal. Ordered and hashable so it can key the agent store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ifi {
    /// A `mailto:` IRI.
    Mbox(String),
    /// Hex-encoded SHA1 of a `mailto:` IRI.
    MboxSha1Sum(String),
    /// An `OpenID` URI.
    OpenId(String),
    /// An account on some system, identified by home page and account name.
    Account {
        /// Canonical home page of the system the account lives on.
        home_page: String,
        /// Account name unique within that system.
        name: String,
    },
}

impl Ifi {
    /// Extract the IFI from an actor document, taking the first scheme
    /// present in canonical order.
    ///
    /// Returns `None` for anonymous groups and for documents that are not
    /// objects. Intended for typed extraction from already-validated
    /// statements; use [`Agent::from_value`] for untrusted descriptors.
    pub fn from_actor_value(actor: &Value) -> Option<Self> {
        let obj = actor.as_object()?;
        if let Some(v) = obj.get("mbox").and_then(Value::as_str) {
            return Some(Self::Mbox(v.to_owned()));
        }
        if let Some(v) = obj.get("mbox_sha1sum").and_then(Value::as_str) {
            return Some(Self::MboxSha1Sum(v.to_owned()));
        }
        if let Some(v) = obj.get("openid").and_then(Value::as_str) {
            return Some(Self::OpenId(v.to_owned()));
        }
        obj.get("account").and_then(account_from)
    }
}

impl core::fmt::Display for Ifi {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Mbox(v) | Self::MboxSha1Sum(v) | Self::OpenId(v) => write!(f, "{v}"),
            Self::Account { home_page, name } => write!(f, "{home_page}#{name}"),
        }
    }
}

fn account_from(value: &Value) -> Option<Ifi> {
    let obj = value.as_object()?;
    let home_page = obj.get("homePage").and_then(Value::as_str)?;
    let name = obj.get("name").and_then(Value::as_str)?;
    Some(Ifi::Account {
        home_page: home_page.to_owned(),
        name: name.to_owned(),
    })
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Whether an actor document describes a single agent or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    /// A single person or system.
    Agent,
    /// An identified group of agents.
    Group,
}

/// An identified actor as held by the agent store.
///
/// Anonymous groups are deliberately unrepresentable here: a row always has
/// an IFI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Agent or identified group.
    pub kind: AgentKind,
    /// Display name, if the document carried one.
    pub name: Option<String>,
    /// The identifier this actor is keyed by.
    pub ifi: Ifi,
}

/// Keys an actor descriptor may carry. Anything else invalidates it.
const ALLOWED_KEYS: [&str; 7] = [
    "objectType",
    "name",
    "mbox",
    "mbox_sha1sum",
    "openid",
    "account",
    "member",
];

impl Agent {
    /// Parse an untrusted actor descriptor strictly.
    ///
    /// Returns `None` when the descriptor is not an object, carries unknown
    /// keys, has an `objectType` other than `Agent`/`Group`, does not have
    /// exactly one well-formed IFI, or puts `member` on a plain agent. Hook
    /// filters feed arbitrary documents through here; a `None` means the
    /// descriptor contributes nothing to the filter.
    pub fn from_value(descriptor: &Value) -> Option<Self> {
        let obj = descriptor.as_object()?;
        if obj.keys().any(|k| !ALLOWED_KEYS.contains(&k.as_str())) {
            return None;
        }
        let kind = match obj.get("objectType") {
            None => AgentKind::Agent,
            Some(v) => match v.as_str() {
                Some("Agent") => AgentKind::Agent,
                Some("Group") => AgentKind::Group,
                _ => return None,
            },
        };
        if kind == AgentKind::Agent && obj.contains_key("member") {
            return None;
        }
        let name = match obj.get("name") {
            None => None,
            Some(v) => Some(v.as_str()?.to_owned()),
        };

        let mut ifis = Vec::new();
        if let Some(v) = obj.get("mbox") {
            ifis.push(Ifi::Mbox(v.as_str()?.to_owned()));
        }
        if let Some(v) = obj.get("mbox_sha1sum") {
            ifis.push(Ifi::MboxSha1Sum(v.as_str()?.to_owned()));
        }
        if let Some(v) = obj.get("openid") {
            ifis.push(Ifi::OpenId(v.as_str()?.to_owned()));
        }
        if let Some(v) = obj.get("account") {
            ifis.push(account_from(v)?);
        }
        if ifis.len() != 1 {
            return None;
        }
        let ifi = ifis.pop()?;
        Some(Self { kind, name, ifi })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mbox_agent() {
        let agent = Agent::from_value(&json!({
            "mbox": "mailto:sam@example.com",
            "name": "Sam"
        }))
        .unwrap();
        assert_eq!(agent.kind, AgentKind::Agent);
        assert_eq!(agent.name.as_deref(), Some("Sam"));
        assert_eq!(agent.ifi, Ifi::Mbox("mailto:sam@example.com".into()));
    }

    #[test]
    fn parses_account_group() {
        let agent = Agent::from_value(&json!({
            "objectType": "Group",
            "account": {"homePage": "https://lms.example.com", "name": "cohort-9"}
        }))
        .unwrap();
        assert_eq!(agent.kind, AgentKind::Group);
        assert_eq!(
            agent.ifi,
            Ifi::Account {
                home_page: "https://lms.example.com".into(),
                name: "cohort-9".into()
            }
        );
    }

    #[test]
    fn rejects_two_ifis() {
        let descriptor = json!({
            "mbox": "mailto:sam@example.com",
            "openid": "https://openid.example.com/sam"
        });
        assert!(Agent::from_value(&descriptor).is_none());
    }

    #[test]
    fn rejects_unknown_keys() {
        let descriptor = json!({"mbox": "mailto:sam@example.com", "role": "admin"});
        assert!(Agent::from_value(&descriptor).is_none());
    }

    #[test]
    fn rejects_member_on_plain_agent() {
        let descriptor = json!({
            "mbox": "mailto:sam@example.com",
            "member": []
        });
        assert!(Agent::from_value(&descriptor).is_none());
    }

    #[test]
    fn rejects_account_missing_name() {
        let descriptor = json!({"account": {"homePage": "https://lms.example.com"}});
        assert!(Agent::from_value(&descriptor).is_none());
    }

    #[test]
    fn anonymous_group_has_no_ifi() {
        let actor = json!({
            "objectType": "Group",
            "member": [{"mbox": "mailto:a@example.com"}]
        });
        assert!(Agent::from_value(&actor).is_none());
        assert!(Ifi::from_actor_value(&actor).is_none());
    }

    #[test]
    fn lenient_extraction_prefers_mbox() {
        let actor = json!({
            "mbox": "mailto:sam@example.com",
            "openid": "https://openid.example.com/sam"
        });
        assert_eq!(
            Ifi::from_actor_value(&actor),
            Some(Ifi::Mbox("mailto:sam@example.com".into()))
        );
    }
}
