//! xAPI activities and their definitions.
//!
//! An activity is created the first time a statement references its IRI and
//! its definition grows over time: later statements and metadata fetched
//! from the IRI itself both merge into the stored record via
//! [`ActivityDefinition::merge_from`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Interaction types (xAPI 4.1.4.1)
// ---------------------------------------------------------------------------

/// The ten CMI interaction types an activity definition may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionType {
    /// Two-state response (true/false).
    TrueFalse,
    /// Selection among declared choices.
    Choice,
    /// Short free-text response.
    FillIn,
    /// Long free-text response.
    LongFillIn,
    /// Response on a declared Likert scale.
    Likert,
    /// Pairing of declared sources to declared targets.
    Matching,
    /// Response per declared step.
    Performance,
    /// Ordering of declared choices.
    Sequencing,
    /// Numeric response or range.
    Numeric,
    /// Anything else.
    Other,
}

/// One entry in an interaction component list (a choice, scale step, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionComponent {
    /// Identifier referenced by `correctResponsesPattern` entries.
    pub id: String,
    /// Localized description of the component.
    #[serde(default)]
    pub description: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Activity definition
// ---------------------------------------------------------------------------

/// Everything an activity says about itself beyond its IRI.
///
/// All fields are optional in the wire form; the struct keeps absent maps and
/// lists as empty so merging never has to distinguish the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityDefinition {
    /// Localized activity name, keyed by language tag.
    pub name: BTreeMap<String, String>,
    /// Localized activity description, keyed by language tag.
    pub description: BTreeMap<String, String>,
    /// IRI categorizing the activity.
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    /// IRI of a document with further information.
    pub more_info: Option<String>,
    /// Declared interaction type, when the activity is an interaction.
    pub interaction_type: Option<InteractionType>,
    /// Patterns describing correct responses to the interaction.
    pub correct_responses_pattern: Vec<String>,
    /// Choice components (choice/sequencing interactions).
    pub choices: Vec<InteractionComponent>,
    /// Scale components (likert interactions).
    pub scale: Vec<InteractionComponent>,
    /// Source components (matching interactions).
    pub source: Vec<InteractionComponent>,
    /// Target components (matching interactions).
    pub target: Vec<InteractionComponent>,
    /// Step components (performance interactions).
    pub steps: Vec<InteractionComponent>,
    /// Extension values keyed by IRI.
    pub extensions: BTreeMap<String, Value>,
}

impl ActivityDefinition {
    /// Parse a definition from a JSON document, ignoring unknown fields.
    ///
    /// Callers validate the document first; this only maps it onto the
    /// typed form and returns `None` if the shapes disagree.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Fold a newer definition into this one.
    ///
    /// `name` and `description` merge additively: the union of both maps,
    /// with the incoming side winning on shared language tags. Every other
    /// field is overwritten wholesale by the incoming side, including being
    /// cleared when the incoming definition lacks it. The incoming side is
    /// always the latest known-valid source, so repeated merges of the same
    /// definition are no-ops.
    pub fn merge_from(&mut self, incoming: &Self) {
        for (tag, label) in &incoming.name {
            self.name.insert(tag.clone(), label.clone());
        }
        for (tag, text) in &incoming.description {
            self.description.insert(tag.clone(), text.clone());
        }
        self.activity_type.clone_from(&incoming.activity_type);
        self.more_info.clone_from(&incoming.more_info);
        self.interaction_type = incoming.interaction_type;
        self.correct_responses_pattern
            .clone_from(&incoming.correct_responses_pattern);
        self.choices.clone_from(&incoming.choices);
        self.scale.clone_from(&incoming.scale);
        self.source.clone_from(&incoming.source);
        self.target.clone_from(&incoming.target);
        self.steps.clone_from(&incoming.steps);
        self.extensions.clone_from(&incoming.extensions);
    }
}

/// An activity record: IRI plus everything known about it so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// The activity IRI.
    pub id: String,
    /// Merged definition accumulated across statements and metadata fetches.
    pub definition: ActivityDefinition,
}
