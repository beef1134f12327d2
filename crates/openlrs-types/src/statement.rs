//! Stored statement records.
//!
//! A [`StoredStatement`] is the typed row the matcher and the background
//! jobs work against. It is extracted once from the validated statement
//! document at store time; the exact serialized form is kept alongside in
//! [`StoredStatement::document`] and reused verbatim for retrieval and for
//! webhook payloads, never re-serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::agent::{Agent, Ifi};
use crate::ids::StatementId;

/// Verb IRI that voids the statement referenced by the object (xAPI 4.3).
pub const VOIDED_VERB: &str = "http://adlnet.gov/expapi/verbs/voided";

// ---------------------------------------------------------------------------
// Statement objects (xAPI 4.1.4)
// ---------------------------------------------------------------------------

/// The object of a stored statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementObject {
    /// An activity, identified by IRI.
    Activity {
        /// The activity IRI.
        id: String,
    },
    /// An agent or group. `None` when the document was an anonymous group.
    Agent {
        /// IFI of the object actor, when identified.
        ifi: Option<Ifi>,
    },
    /// A reference to another stored statement.
    StatementRef {
        /// Identifier of the referenced statement.
        id: StatementId,
    },
    /// An embedded statement. Nesting stops here: a sub-statement cannot
    /// itself contain one.
    SubStatement(Box<SubStatement>),
}

impl StatementObject {
    /// Build the typed object from a validated object document.
    pub fn from_value(object: &Value) -> Option<Self> {
        let object_type = object
            .get("objectType")
            .and_then(Value::as_str)
            .unwrap_or("Activity");
        match object_type {
            "Activity" => Some(Self::Activity {
                id: object.get("id")?.as_str()?.to_owned(),
            }),
            "Agent" | "Group" => Some(Self::Agent {
                ifi: Ifi::from_actor_value(object),
            }),
            "StatementRef" => {
                let raw = object.get("id")?.as_str()?;
                let id = Uuid::parse_str(raw).ok()?;
                Some(Self::StatementRef { id: id.into() })
            }
            "SubStatement" => {
                SubStatement::from_value(object).map(|sub| Self::SubStatement(Box::new(sub)))
            }
            _ => None,
        }
    }
}

/// The object of an embedded sub-statement; everything but another
/// sub-statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubObject {
    /// An activity, identified by IRI.
    Activity {
        /// The activity IRI.
        id: String,
    },
    /// An agent or group. `None` when the document was an anonymous group.
    Agent {
        /// IFI of the object actor, when identified.
        ifi: Option<Ifi>,
    },
    /// A reference to another stored statement.
    StatementRef {
        /// Identifier of the referenced statement.
        id: StatementId,
    },
}

impl SubObject {
    fn from_value(object: &Value) -> Option<Self> {
        let object_type = object
            .get("objectType")
            .and_then(Value::as_str)
            .unwrap_or("Activity");
        match object_type {
            "Activity" => Some(Self::Activity {
                id: object.get("id")?.as_str()?.to_owned(),
            }),
            "Agent" | "Group" => Some(Self::Agent {
                ifi: Ifi::from_actor_value(object),
            }),
            "StatementRef" => {
                let raw = object.get("id")?.as_str()?;
                let id = Uuid::parse_str(raw).ok()?;
                Some(Self::StatementRef { id: id.into() })
            }
            _ => None,
        }
    }
}

/// An embedded statement, one level deep at most.
///
/// Sub-statements never carry `authority`, so related-agent matching inside
/// them covers actor, object, instructor, and team only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubStatement {
    /// IFI of the embedded actor, when identified.
    pub actor: Option<Ifi>,
    /// Verb IRI of the embedded statement.
    pub verb_id: String,
    /// Object of the embedded statement.
    pub object: SubObject,
    /// Context of the embedded statement.
    pub context: Option<StatementContext>,
}

impl SubStatement {
    fn from_value(object: &Value) -> Option<Self> {
        let verb_id = object.get("verb")?.get("id")?.as_str()?.to_owned();
        let inner = SubObject::from_value(object.get("object")?)?;
        Some(Self {
            actor: object.get("actor").and_then(Ifi::from_actor_value),
            verb_id,
            object: inner,
            context: object.get("context").map(StatementContext::from_value),
        })
    }

    fn mentions_agent(&self, ifi: &Ifi) -> bool {
        if self.actor.as_ref() == Some(ifi) {
            return true;
        }
        if let SubObject::Agent {
            ifi: Some(object_ifi),
        } = &self.object
            && object_ifi == ifi
        {
            return true;
        }
        self.context
            .as_ref()
            .is_some_and(|ctx| ctx.mentions_agent(ifi))
    }
}

// ---------------------------------------------------------------------------
// Context (xAPI 4.1.6)
// ---------------------------------------------------------------------------

/// Context fields the matcher cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementContext {
    /// Registration UUID grouping related statements.
    pub registration: Option<Uuid>,
    /// IFI of the instructor, when identified.
    pub instructor: Option<Ifi>,
    /// IFI of the team group, when identified.
    pub team: Option<Ifi>,
    /// Parent context activity IRIs.
    pub parent: Vec<String>,
    /// Grouping context activity IRIs.
    pub grouping: Vec<String>,
    /// Category context activity IRIs.
    pub category: Vec<String>,
    /// Other context activity IRIs.
    pub other: Vec<String>,
}

impl StatementContext {
    /// Extract the matcher-relevant context fields from a validated context
    /// document. Anything missing or malformed is simply absent.
    pub fn from_value(context: &Value) -> Self {
        let activities = context.get("contextActivities");
        Self {
            registration: context
                .get("registration")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok()),
            instructor: context.get("instructor").and_then(Ifi::from_actor_value),
            team: context.get("team").and_then(Ifi::from_actor_value),
            parent: context_activity_ids(activities, "parent"),
            grouping: context_activity_ids(activities, "grouping"),
            category: context_activity_ids(activities, "category"),
            other: context_activity_ids(activities, "other"),
        }
    }

    fn activity_ids(&self) -> impl Iterator<Item = &str> {
        self.parent
            .iter()
            .chain(&self.grouping)
            .chain(&self.category)
            .chain(&self.other)
            .map(String::as_str)
    }

    fn mentions_agent(&self, ifi: &Ifi) -> bool {
        self.instructor.as_ref() == Some(ifi) || self.team.as_ref() == Some(ifi)
    }
}

/// A `contextActivities` slot holds either one activity or a list of them.
fn context_activity_ids(activities: Option<&Value>, key: &str) -> Vec<String> {
    let Some(entry) = activities.and_then(|v| v.get(key)) else {
        return Vec::new();
    };
    let items: &[Value] = match entry {
        Value::Array(list) => list,
        single => core::slice::from_ref(single),
    };
    items
        .iter()
        .filter_map(|item| item.get("id").and_then(Value::as_str).map(str::to_owned))
        .collect()
}

// ---------------------------------------------------------------------------
// Stored statement
// ---------------------------------------------------------------------------

/// The typed record kept for every accepted statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredStatement {
    /// Statement identifier (client-supplied or server-assigned).
    pub id: StatementId,
    /// IFI of the actor, when identified.
    pub actor: Option<Ifi>,
    /// Verb IRI.
    pub verb_id: String,
    /// The statement object.
    pub object: StatementObject,
    /// Context fields, when present.
    pub context: Option<StatementContext>,
    /// IFI of the asserting authority, when identified.
    pub authority: Option<Ifi>,
    /// Client-asserted time of the experience.
    pub timestamp: DateTime<Utc>,
    /// Time the statement was stored.
    pub stored: DateTime<Utc>,
    /// Set once by the voiding job; voided statements stay stored but are
    /// excluded from retrieval and matching.
    pub voided: bool,
    /// The exact serialized statement as accepted. Webhook payloads and
    /// retrieval return this text verbatim.
    pub document: String,
}

impl StoredStatement {
    /// Build the typed record from a validated statement document.
    ///
    /// `document` is the serialization to keep verbatim. Returns `None` only
    /// when the document lacks the shape validation guarantees, which a
    /// caller should treat as a bug rather than user error.
    pub fn from_document(
        id: StatementId,
        stored: DateTime<Utc>,
        value: &Value,
        document: String,
    ) -> Option<Self> {
        let verb_id = value.get("verb")?.get("id")?.as_str()?.to_owned();
        let object = StatementObject::from_value(value.get("object")?)?;
        let timestamp = value
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map_or(stored, |dt| dt.with_timezone(&Utc));
        Some(Self {
            id,
            actor: value.get("actor").and_then(Ifi::from_actor_value),
            verb_id,
            object,
            context: value.get("context").map(StatementContext::from_value),
            authority: value.get("authority").and_then(Ifi::from_actor_value),
            timestamp,
            stored,
            voided: false,
            document,
        })
    }

    /// The object activity IRI, when the object is an activity.
    pub fn object_activity_id(&self) -> Option<&str> {
        match &self.object {
            StatementObject::Activity { id } => Some(id),
            _ => None,
        }
    }

    /// When this is a voiding statement, the id of the statement it voids.
    pub fn voiding_target(&self) -> Option<StatementId> {
        if self.verb_id == VOIDED_VERB
            && let StatementObject::StatementRef { id } = &self.object
        {
            return Some(*id);
        }
        None
    }

    /// Every activity IRI in a related position: the object, the four
    /// context slots, and the same positions inside an embedded
    /// sub-statement.
    pub fn related_activity_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        match &self.object {
            StatementObject::Activity { id } => ids.push(id.as_str()),
            StatementObject::SubStatement(sub) => {
                if let SubObject::Activity { id } = &sub.object {
                    ids.push(id.as_str());
                }
                if let Some(ctx) = &sub.context {
                    ids.extend(ctx.activity_ids());
                }
            }
            _ => {}
        }
        if let Some(ctx) = &self.context {
            ids.extend(ctx.activity_ids());
        }
        ids
    }

    /// Whether `ifi` appears in any related agent position: actor, object,
    /// authority, instructor, or team, or any of those except authority
    /// inside an embedded sub-statement.
    pub fn mentions_agent(&self, ifi: &Ifi) -> bool {
        if self.actor.as_ref() == Some(ifi) || self.authority.as_ref() == Some(ifi) {
            return true;
        }
        match &self.object {
            StatementObject::Agent {
                ifi: Some(object_ifi),
            } if object_ifi == ifi => return true,
            StatementObject::SubStatement(sub) if sub.mentions_agent(ifi) => return true,
            _ => {}
        }
        self.context
            .as_ref()
            .is_some_and(|ctx| ctx.mentions_agent(ifi))
    }
}

/// Collect every identified actor a validated statement document mentions:
/// actor, object (when the object is an actor), authority, instructor, team,
/// and the same positions inside an embedded sub-statement. Anonymous groups
/// are skipped.
pub fn identified_actors(value: &Value) -> Vec<Agent> {
    let mut actors = Vec::new();
    collect_actor(&mut actors, value.get("actor"));
    collect_actor(&mut actors, value.get("authority"));
    collect_context_actors(&mut actors, value.get("context"));
    if let Some(object) = value.get("object") {
        match object.get("objectType").and_then(Value::as_str) {
            Some("Agent" | "Group") => collect_actor(&mut actors, Some(object)),
            Some("SubStatement") => {
                collect_actor(&mut actors, object.get("actor"));
                collect_context_actors(&mut actors, object.get("context"));
                if let Some(inner) = object.get("object")
                    && matches!(
                        inner.get("objectType").and_then(Value::as_str),
                        Some("Agent" | "Group")
                    )
                {
                    collect_actor(&mut actors, Some(inner));
                }
            }
            _ => {}
        }
    }
    actors
}

fn collect_actor(actors: &mut Vec<Agent>, value: Option<&Value>) {
    if let Some(agent) = value.and_then(Agent::from_value) {
        actors.push(agent);
    }
}

fn collect_context_actors(actors: &mut Vec<Agent>, context: Option<&Value>) {
    if let Some(ctx) = context {
        collect_actor(actors, ctx.get("instructor"));
        collect_actor(actors, ctx.get("team"));
    }
}
