//! Activity and activity-definition validation.
//!
//! Used in two places: inline definitions on statement objects and context
//! activities, and the `{id, definition}` wrapper the metadata resolver
//! builds around JSON fetched from an activity IRI. Interaction activities
//! get the full CMI treatment: component lists are only allowed for the
//! interaction types that define them, component ids must be unique, and
//! `correctResponsesPattern` entries must reference declared ids.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use openlrs_types::InteractionType;

use crate::common::{
    as_object, check_allowed_fields, check_extensions, check_iri, check_language_map,
    optional_string, require_string,
};
use crate::error::ValidationError;

const ACTIVITY_FIELDS: &[&str] = &["objectType", "id", "definition"];
const DEFINITION_FIELDS: &[&str] = &[
    "name",
    "description",
    "type",
    "moreInfo",
    "interactionType",
    "correctResponsesPattern",
    "choices",
    "scale",
    "source",
    "target",
    "steps",
    "extensions",
];
const COMPONENT_FIELDS: &[&str] = &["id", "description"];
const INTERACTION_FIELDS: &[&str] = &[
    "correctResponsesPattern",
    "choices",
    "scale",
    "source",
    "target",
    "steps",
];

/// Validate an `{id, definition}` activity document.
///
/// This is the check fetched metadata must pass before it is merged into
/// the activity store; a failure discards the fetch, never the activity.
pub fn validate_activity(value: &Value) -> Result<(), ValidationError> {
    let ctx = "activity";
    let obj = as_object(value, ctx)?;
    check_allowed_fields(obj, ACTIVITY_FIELDS, ctx)?;
    if let Some(object_type) = obj.get("objectType")
        && object_type.as_str() != Some("Activity")
    {
        return Err(ValidationError::invalid(
            ctx,
            "objectType must be Activity",
        ));
    }
    let id = require_string(obj, "id", ctx)?;
    check_iri(id, "activity id")?;
    if let Some(definition) = obj.get("definition") {
        validate_definition(definition, "activity definition")?;
    }
    Ok(())
}

/// Ids declared by the component lists, for pattern reference checks.
#[derive(Debug, Default)]
struct DeclaredComponents {
    choices: BTreeSet<String>,
    scale: BTreeSet<String>,
    source: BTreeSet<String>,
    target: BTreeSet<String>,
    steps: BTreeSet<String>,
}

/// Validate an activity definition document at `ctx`.
pub(crate) fn validate_definition(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    let obj = as_object(value, ctx)?;
    check_allowed_fields(obj, DEFINITION_FIELDS, ctx)?;
    if let Some(name) = obj.get("name") {
        check_language_map(name, ctx)?;
    }
    if let Some(description) = obj.get("description") {
        check_language_map(description, ctx)?;
    }
    if let Some(activity_type) = optional_string(obj, "type", ctx)? {
        check_iri(activity_type, ctx)?;
    }
    if let Some(more_info) = optional_string(obj, "moreInfo", ctx)? {
        check_iri(more_info, ctx)?;
    }

    let interaction = match obj.get("interactionType") {
        None => None,
        Some(v) => Some(parse_interaction_type(v, ctx)?),
    };
    if interaction.is_none()
        && INTERACTION_FIELDS
            .iter()
            .any(|field| obj.contains_key(*field))
    {
        return Err(ValidationError::invalid(
            ctx,
            "interaction fields require an interactionType",
        ));
    }

    let declared = DeclaredComponents {
        choices: gated_components(obj, "choices", interaction, ctx, |i| {
            matches!(i, InteractionType::Choice | InteractionType::Sequencing)
        })?,
        scale: gated_components(obj, "scale", interaction, ctx, |i| {
            i == InteractionType::Likert
        })?,
        source: gated_components(obj, "source", interaction, ctx, |i| {
            i == InteractionType::Matching
        })?,
        target: gated_components(obj, "target", interaction, ctx, |i| {
            i == InteractionType::Matching
        })?,
        steps: gated_components(obj, "steps", interaction, ctx, |i| {
            i == InteractionType::Performance
        })?,
    };

    if let Some(patterns) = obj.get("correctResponsesPattern") {
        let patterns = patterns.as_array().ok_or_else(|| {
            ValidationError::invalid(ctx, "'correctResponsesPattern' must be a list")
        })?;
        for pattern in patterns {
            let pattern = pattern.as_str().ok_or_else(|| {
                ValidationError::invalid(ctx, "correctResponsesPattern entries must be strings")
            })?;
            if let Some(interaction) = interaction {
                check_response_pattern(pattern, interaction, &declared, ctx)?;
            }
        }
    }

    if let Some(extensions) = obj.get("extensions") {
        check_extensions(extensions, ctx)?;
    }
    Ok(())
}

fn parse_interaction_type(value: &Value, ctx: &str) -> Result<InteractionType, ValidationError> {
    serde_json::from_value(value.clone()).map_err(|_| {
        ValidationError::invalid(
            ctx,
            format!("'{value}' is not a CMI interaction type"),
        )
    })
}

/// Validate one component list and collect its ids, rejecting the list when
/// the interaction type does not define it.
fn gated_components(
    obj: &Map<String, Value>,
    field: &'static str,
    interaction: Option<InteractionType>,
    ctx: &str,
    allowed_for: impl Fn(InteractionType) -> bool,
) -> Result<BTreeSet<String>, ValidationError> {
    let Some(value) = obj.get(field) else {
        return Ok(BTreeSet::new());
    };
    if !interaction.is_some_and(allowed_for) {
        return Err(ValidationError::invalid(
            ctx,
            format!("'{field}' is not allowed for this interaction type"),
        ));
    }
    let list = value
        .as_array()
        .ok_or_else(|| ValidationError::invalid(ctx, format!("'{field}' must be a list")))?;
    let mut ids = BTreeSet::new();
    for component in list {
        let comp = as_object(component, ctx)?;
        check_allowed_fields(comp, COMPONENT_FIELDS, ctx)?;
        let id = require_string(comp, "id", ctx)?;
        if !ids.insert(id.to_owned()) {
            return Err(ValidationError::invalid(
                ctx,
                format!("duplicate component id '{id}' in '{field}'"),
            ));
        }
        if let Some(description) = comp.get("description") {
            check_language_map(description, ctx)?;
        }
    }
    Ok(ids)
}

/// Check one `correctResponsesPattern` entry against the interaction type.
fn check_response_pattern(
    pattern: &str,
    interaction: InteractionType,
    declared: &DeclaredComponents,
    ctx: &str,
) -> Result<(), ValidationError> {
    match interaction {
        InteractionType::TrueFalse => {
            if pattern == "true" || pattern == "false" {
                Ok(())
            } else {
                Err(ValidationError::invalid(
                    ctx,
                    format!("true-false responses must be 'true' or 'false', got '{pattern}'"),
                ))
            }
        }
        InteractionType::Choice | InteractionType::Sequencing => {
            for id in pattern.split("[,]") {
                if !declared.choices.contains(id) {
                    return Err(ValidationError::invalid(
                        ctx,
                        format!("response references undeclared choice '{id}'"),
                    ));
                }
            }
            Ok(())
        }
        InteractionType::Likert => {
            if declared.scale.contains(pattern) {
                Ok(())
            } else {
                Err(ValidationError::invalid(
                    ctx,
                    format!("response references undeclared scale step '{pattern}'"),
                ))
            }
        }
        InteractionType::Matching => {
            for pair in pattern.split("[,]") {
                let Some((source, target)) = pair.split_once("[.]") else {
                    return Err(ValidationError::invalid(
                        ctx,
                        format!("matching responses must pair source and target, got '{pair}'"),
                    ));
                };
                if !declared.source.contains(source) {
                    return Err(ValidationError::invalid(
                        ctx,
                        format!("response references undeclared source '{source}'"),
                    ));
                }
                if !declared.target.contains(target) {
                    return Err(ValidationError::invalid(
                        ctx,
                        format!("response references undeclared target '{target}'"),
                    ));
                }
            }
            Ok(())
        }
        InteractionType::Performance => {
            for pair in pattern.split("[,]") {
                let Some((step, _answer)) = pair.split_once("[.]") else {
                    return Err(ValidationError::invalid(
                        ctx,
                        format!("performance responses must pair step and answer, got '{pair}'"),
                    ));
                };
                if !declared.steps.contains(step) {
                    return Err(ValidationError::invalid(
                        ctx,
                        format!("response references undeclared step '{step}'"),
                    ));
                }
            }
            Ok(())
        }
        InteractionType::Numeric => {
            let sides: Vec<&str> = pattern.split("[:]").collect();
            if sides.len() > 2 {
                return Err(ValidationError::invalid(
                    ctx,
                    format!("numeric responses take at most one range separator, got '{pattern}'"),
                ));
            }
            for side in sides {
                if !side.is_empty() && side.parse::<f64>().is_err() {
                    return Err(ValidationError::invalid(
                        ctx,
                        format!("'{side}' is not a number"),
                    ));
                }
            }
            Ok(())
        }
        InteractionType::FillIn | InteractionType::LongFillIn | InteractionType::Other => Ok(()),
    }
}
