//! Statement document validation.
//!
//! The checks run in document order and stop at the first violation:
//! 1. Shape -- the statement is an object with only known fields.
//! 2. Actor -- agent/group rules, exactly one IFI for identified actors.
//! 3. Verb -- IRI id, display language map.
//! 4. Object -- dispatch on `objectType`, sub-statements one level deep.
//! 5. Cross rules -- voiding verb vs. object type, context vs. object type.
//! 6. Result, context, timestamps, authority, version, attachments.

use serde_json::{Map, Value};

use openlrs_types::VOIDED_VERB;

use crate::activity::validate_definition;
use crate::common::{
    as_object, check_allowed_fields, check_extensions, check_iri, check_language_map,
    check_timestamp, check_uuid, is_iso8601_duration, is_sha1_hex, optional_string,
    require_string,
};
use crate::error::ValidationError;

const STATEMENT_FIELDS: &[&str] = &[
    "id",
    "actor",
    "verb",
    "object",
    "result",
    "context",
    "timestamp",
    "stored",
    "authority",
    "version",
    "attachments",
];
const SUBSTATEMENT_FIELDS: &[&str] = &[
    "objectType",
    "actor",
    "verb",
    "object",
    "result",
    "context",
    "timestamp",
    "attachments",
];
const AGENT_FIELDS: &[&str] = &["objectType", "name", "mbox", "mbox_sha1sum", "openid", "account"];
const GROUP_FIELDS: &[&str] = &[
    "objectType",
    "name",
    "mbox",
    "mbox_sha1sum",
    "openid",
    "account",
    "member",
];
const ACCOUNT_FIELDS: &[&str] = &["homePage", "name"];
const VERB_FIELDS: &[&str] = &["id", "display"];
const ACTIVITY_OBJECT_FIELDS: &[&str] = &["objectType", "id", "definition"];
const STATEMENT_REF_FIELDS: &[&str] = &["objectType", "id"];
const CONTEXT_FIELDS: &[&str] = &[
    "registration",
    "instructor",
    "team",
    "contextActivities",
    "revision",
    "platform",
    "language",
    "statement",
    "extensions",
];
const CONTEXT_ACTIVITY_KEYS: &[&str] = &["parent", "grouping", "category", "other"];
const RESULT_FIELDS: &[&str] = &["score", "success", "completion", "response", "duration", "extensions"];
const SCORE_FIELDS: &[&str] = &["scaled", "raw", "min", "max"];
const ATTACHMENT_FIELDS: &[&str] = &[
    "usageType",
    "display",
    "description",
    "contentType",
    "length",
    "sha2",
    "fileUrl",
];

/// What kind of object a statement carries, after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectKind {
    Activity,
    Actor,
    StatementRef,
    SubStatement,
}

/// Validate a full statement document.
///
/// Returns at the first violation with a message naming the position in the
/// document. A statement that passes is safe to store and to extract typed
/// records from.
pub fn validate_statement(value: &Value) -> Result<(), ValidationError> {
    let ctx = "statement";
    let obj = as_object(value, ctx)?;
    check_allowed_fields(obj, STATEMENT_FIELDS, ctx)?;
    for field in ["actor", "verb", "object"] {
        if !obj.contains_key(field) {
            return Err(ValidationError::Missing {
                ctx: ctx.to_owned(),
                field,
            });
        }
    }

    if let Some(id) = optional_string(obj, "id", ctx)? {
        check_uuid(id, "statement id")?;
    }
    if let Some(actor) = obj.get("actor") {
        validate_actor(actor, "statement actor")?;
    }
    let verb_id = obj
        .get("verb")
        .map_or(Ok(""), |verb| validate_verb(verb, "statement verb"))?;
    let object_kind = obj.get("object").map_or(
        Ok(ObjectKind::Activity),
        |object| validate_object(object, "statement object", true),
    )?;

    if verb_id == VOIDED_VERB && object_kind != ObjectKind::StatementRef {
        return Err(ValidationError::invalid(
            ctx,
            "the voiding verb requires a StatementRef object",
        ));
    }

    if let Some(result) = obj.get("result") {
        validate_result(result, "statement result")?;
    }
    if let Some(context) = obj.get("context") {
        validate_context(context, "statement context", object_kind == ObjectKind::Activity)?;
    }
    if let Some(timestamp) = optional_string(obj, "timestamp", ctx)? {
        check_timestamp(timestamp, "statement timestamp")?;
    }
    if let Some(stored) = optional_string(obj, "stored", ctx)? {
        check_timestamp(stored, "statement stored")?;
    }
    if let Some(authority) = obj.get("authority") {
        validate_authority(authority, "statement authority")?;
    }
    if let Some(version) = optional_string(obj, "version", ctx)? {
        if !version.starts_with("1.0") {
            return Err(ValidationError::invalid(
                "statement version",
                format!("'{version}' is not a supported xAPI version"),
            ));
        }
    }
    if let Some(attachments) = obj.get("attachments") {
        validate_attachments(attachments, "statement attachments")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

fn validate_actor(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    let obj = as_object(value, ctx)?;
    let object_type = object_type_of(obj, ctx)?;
    match object_type {
        "Agent" => {
            check_allowed_fields(obj, AGENT_FIELDS, ctx)?;
            optional_string(obj, "name", ctx)?;
            if check_ifis(obj, ctx)? != 1 {
                return Err(ValidationError::invalid(
                    ctx,
                    "an agent must have exactly one inverse-functional identifier",
                ));
            }
            Ok(())
        }
        "Group" => {
            check_allowed_fields(obj, GROUP_FIELDS, ctx)?;
            optional_string(obj, "name", ctx)?;
            let ifi_count = check_ifis(obj, ctx)?;
            if ifi_count > 1 {
                return Err(ValidationError::invalid(
                    ctx,
                    "a group may have at most one inverse-functional identifier",
                ));
            }
            match obj.get("member") {
                Some(member) => validate_members(member, ctx),
                None if ifi_count == 0 => Err(ValidationError::invalid(
                    ctx,
                    "an anonymous group must list its members",
                )),
                None => Ok(()),
            }
        }
        other => Err(ValidationError::invalid(
            ctx,
            format!("'{other}' is not a valid actor objectType"),
        )),
    }
}

fn object_type_of<'a>(obj: &'a Map<String, Value>, ctx: &str) -> Result<&'a str, ValidationError> {
    match obj.get("objectType") {
        None => Ok("Agent"),
        Some(value) => value
            .as_str()
            .ok_or_else(|| ValidationError::invalid(ctx, "'objectType' must be a string")),
    }
}

/// Check the shape of every IFI present and return how many there are.
fn check_ifis(obj: &Map<String, Value>, ctx: &str) -> Result<usize, ValidationError> {
    if let Some(mbox) = obj.get("mbox") {
        let mbox = mbox
            .as_str()
            .ok_or_else(|| ValidationError::invalid(ctx, "'mbox' must be a string"))?;
        if mbox.strip_prefix("mailto:").is_none_or(str::is_empty) {
            return Err(ValidationError::invalid(
                ctx,
                format!("mbox '{mbox}' must be a mailto IRI"),
            ));
        }
    }
    if let Some(sha) = obj.get("mbox_sha1sum") {
        let sha = sha
            .as_str()
            .ok_or_else(|| ValidationError::invalid(ctx, "'mbox_sha1sum' must be a string"))?;
        if !is_sha1_hex(sha) {
            return Err(ValidationError::invalid(
                ctx,
                "mbox_sha1sum must be 40 hex characters",
            ));
        }
    }
    if let Some(openid) = obj.get("openid") {
        let openid = openid
            .as_str()
            .ok_or_else(|| ValidationError::invalid(ctx, "'openid' must be a string"))?;
        check_iri(openid, ctx)?;
    }
    if let Some(account) = obj.get("account") {
        let account_obj = as_object(account, ctx)?;
        check_allowed_fields(account_obj, ACCOUNT_FIELDS, ctx)?;
        let home_page = require_string(account_obj, "homePage", ctx)?;
        check_iri(home_page, ctx)?;
        require_string(account_obj, "name", ctx)?;
    }
    Ok(["mbox", "mbox_sha1sum", "openid", "account"]
        .iter()
        .filter(|field| obj.contains_key(**field))
        .count())
}

fn validate_members(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    let members = value
        .as_array()
        .ok_or_else(|| ValidationError::invalid(ctx, "'member' must be a list"))?;
    if members.is_empty() {
        return Err(ValidationError::invalid(ctx, "'member' must not be empty"));
    }
    let member_ctx = format!("{ctx} member");
    for member in members {
        let member_obj = as_object(member, &member_ctx)?;
        if object_type_of(member_obj, &member_ctx)? == "Group" {
            return Err(ValidationError::invalid(
                &member_ctx,
                "group members must be agents, not groups",
            ));
        }
        validate_actor(member, &member_ctx)?;
    }
    Ok(())
}

fn validate_authority(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    validate_actor(value, ctx)?;
    let obj = as_object(value, ctx)?;
    if object_type_of(obj, ctx)? == "Group" {
        let pair_size = obj
            .get("member")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        if pair_size != 2 {
            return Err(ValidationError::invalid(
                ctx,
                "an authority group must pair exactly two agents",
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Verb and object
// ---------------------------------------------------------------------------

fn validate_verb<'a>(value: &'a Value, ctx: &str) -> Result<&'a str, ValidationError> {
    let obj = as_object(value, ctx)?;
    check_allowed_fields(obj, VERB_FIELDS, ctx)?;
    let id = require_string(obj, "id", ctx)?;
    check_iri(id, ctx)?;
    if let Some(display) = obj.get("display") {
        check_language_map(display, ctx)?;
    }
    Ok(id)
}

fn validate_object(
    value: &Value,
    ctx: &str,
    allow_substatement: bool,
) -> Result<ObjectKind, ValidationError> {
    let obj = as_object(value, ctx)?;
    let object_type = match obj.get("objectType") {
        None => "Activity",
        Some(v) => v
            .as_str()
            .ok_or_else(|| ValidationError::invalid(ctx, "'objectType' must be a string"))?,
    };
    match object_type {
        "Activity" => {
            check_allowed_fields(obj, ACTIVITY_OBJECT_FIELDS, ctx)?;
            let id = require_string(obj, "id", ctx)?;
            check_iri(id, ctx)?;
            if let Some(definition) = obj.get("definition") {
                validate_definition(definition, ctx)?;
            }
            Ok(ObjectKind::Activity)
        }
        "Agent" | "Group" => {
            validate_actor(value, ctx)?;
            Ok(ObjectKind::Actor)
        }
        "StatementRef" => {
            check_allowed_fields(obj, STATEMENT_REF_FIELDS, ctx)?;
            let id = require_string(obj, "id", ctx)?;
            check_uuid(id, ctx)?;
            Ok(ObjectKind::StatementRef)
        }
        "SubStatement" if allow_substatement => {
            validate_substatement(obj, "sub-statement")?;
            Ok(ObjectKind::SubStatement)
        }
        "SubStatement" => Err(ValidationError::invalid(
            ctx,
            "a sub-statement cannot contain another sub-statement",
        )),
        other => Err(ValidationError::invalid(
            ctx,
            format!("'{other}' is not a valid objectType"),
        )),
    }
}

fn validate_substatement(obj: &Map<String, Value>, ctx: &str) -> Result<(), ValidationError> {
    // The allowed set excludes id, stored, version, and authority: embedded
    // statements are assertions, not stored records.
    check_allowed_fields(obj, SUBSTATEMENT_FIELDS, ctx)?;
    for field in ["actor", "verb", "object"] {
        if !obj.contains_key(field) {
            return Err(ValidationError::Missing {
                ctx: ctx.to_owned(),
                field,
            });
        }
    }
    if let Some(actor) = obj.get("actor") {
        validate_actor(actor, "sub-statement actor")?;
    }
    let verb_id = obj
        .get("verb")
        .map_or(Ok(""), |verb| validate_verb(verb, "sub-statement verb"))?;
    if verb_id == VOIDED_VERB {
        return Err(ValidationError::invalid(
            ctx,
            "a sub-statement cannot use the voiding verb",
        ));
    }
    let object_kind = obj.get("object").map_or(
        Ok(ObjectKind::Activity),
        |object| validate_object(object, "sub-statement object", false),
    )?;
    if let Some(result) = obj.get("result") {
        validate_result(result, "sub-statement result")?;
    }
    if let Some(context) = obj.get("context") {
        validate_context(
            context,
            "sub-statement context",
            object_kind == ObjectKind::Activity,
        )?;
    }
    if let Some(timestamp) = optional_string(obj, "timestamp", ctx)? {
        check_timestamp(timestamp, "sub-statement timestamp")?;
    }
    if let Some(attachments) = obj.get("attachments") {
        validate_attachments(attachments, "sub-statement attachments")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

fn validate_context(
    value: &Value,
    ctx: &str,
    object_is_activity: bool,
) -> Result<(), ValidationError> {
    let obj = as_object(value, ctx)?;
    check_allowed_fields(obj, CONTEXT_FIELDS, ctx)?;
    if let Some(registration) = optional_string(obj, "registration", ctx)? {
        check_uuid(registration, ctx)?;
    }
    if let Some(instructor) = obj.get("instructor") {
        validate_actor(instructor, "context instructor")?;
    }
    if let Some(team) = obj.get("team") {
        let team_obj = as_object(team, "context team")?;
        if object_type_of(team_obj, "context team")? != "Group" {
            return Err(ValidationError::invalid(
                "context team",
                "a team must be a group",
            ));
        }
        validate_actor(team, "context team")?;
    }
    if let Some(activities) = obj.get("contextActivities") {
        validate_context_activities(activities, "context activities")?;
    }
    for field in ["revision", "platform"] {
        if obj.contains_key(field) {
            if !object_is_activity {
                return Err(ValidationError::invalid(
                    ctx,
                    format!("'{field}' is only allowed when the object is an activity"),
                ));
            }
            optional_string(obj, field, ctx)?;
        }
    }
    optional_string(obj, "language", ctx)?;
    if let Some(statement_ref) = obj.get("statement") {
        let ref_ctx = "context statement";
        let ref_obj = as_object(statement_ref, ref_ctx)?;
        check_allowed_fields(ref_obj, STATEMENT_REF_FIELDS, ref_ctx)?;
        if ref_obj.get("objectType").and_then(Value::as_str) != Some("StatementRef") {
            return Err(ValidationError::invalid(
                ref_ctx,
                "must have objectType StatementRef",
            ));
        }
        let id = require_string(ref_obj, "id", ref_ctx)?;
        check_uuid(id, ref_ctx)?;
    }
    if let Some(extensions) = obj.get("extensions") {
        check_extensions(extensions, ctx)?;
    }
    Ok(())
}

fn validate_context_activities(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    let obj = as_object(value, ctx)?;
    for (key, entry) in obj {
        if !CONTEXT_ACTIVITY_KEYS.contains(&key.as_str()) {
            return Err(ValidationError::unexpected(ctx, key));
        }
        let slot_ctx = format!("{ctx} {key}");
        match entry {
            Value::Array(items) => {
                for item in items {
                    validate_context_activity(item, &slot_ctx)?;
                }
            }
            single => validate_context_activity(single, &slot_ctx)?,
        }
    }
    Ok(())
}

fn validate_context_activity(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    let obj = as_object(value, ctx)?;
    check_allowed_fields(obj, ACTIVITY_OBJECT_FIELDS, ctx)?;
    if let Some(object_type) = obj.get("objectType").and_then(Value::as_str)
        && object_type != "Activity"
    {
        return Err(ValidationError::invalid(
            ctx,
            "context activities must have objectType Activity",
        ));
    }
    let id = require_string(obj, "id", ctx)?;
    check_iri(id, ctx)?;
    if let Some(definition) = obj.get("definition") {
        validate_definition(definition, ctx)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

fn validate_result(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    let obj = as_object(value, ctx)?;
    check_allowed_fields(obj, RESULT_FIELDS, ctx)?;
    if let Some(score) = obj.get("score") {
        validate_score(score, "result score")?;
    }
    for field in ["success", "completion"] {
        if let Some(flag) = obj.get(field)
            && !flag.is_boolean()
        {
            return Err(ValidationError::invalid(
                ctx,
                format!("'{field}' must be a boolean"),
            ));
        }
    }
    optional_string(obj, "response", ctx)?;
    if let Some(duration) = optional_string(obj, "duration", ctx)? {
        if !is_iso8601_duration(duration) {
            return Err(ValidationError::invalid(
                ctx,
                format!("'{duration}' is not an ISO 8601 duration"),
            ));
        }
    }
    if let Some(extensions) = obj.get("extensions") {
        check_extensions(extensions, ctx)?;
    }
    Ok(())
}

fn validate_score(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    let obj = as_object(value, ctx)?;
    check_allowed_fields(obj, SCORE_FIELDS, ctx)?;
    let number = |field: &'static str| -> Result<Option<f64>, ValidationError> {
        match obj.get(field) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| {
                ValidationError::invalid(ctx, format!("'{field}' must be a number"))
            }),
        }
    };
    if let Some(scaled) = number("scaled")? {
        if !(-1.0..=1.0).contains(&scaled) {
            return Err(ValidationError::invalid(
                ctx,
                "'scaled' must be between -1 and 1",
            ));
        }
    }
    let min = number("min")?;
    let max = number("max")?;
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err(ValidationError::invalid(ctx, "'min' must not exceed 'max'"));
    }
    if let Some(raw) = number("raw")? {
        if min.is_some_and(|min| raw < min) || max.is_some_and(|max| raw > max) {
            return Err(ValidationError::invalid(
                ctx,
                "'raw' must lie between 'min' and 'max'",
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

fn validate_attachments(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    let attachments = value
        .as_array()
        .ok_or_else(|| ValidationError::invalid(ctx, "must be a list"))?;
    for attachment in attachments {
        let obj = as_object(attachment, ctx)?;
        check_allowed_fields(obj, ATTACHMENT_FIELDS, ctx)?;
        let usage = require_string(obj, "usageType", ctx)?;
        check_iri(usage, ctx)?;
        let display = obj
            .get("display")
            .ok_or_else(|| ValidationError::missing(ctx, "display"))?;
        check_language_map(display, ctx)?;
        if let Some(description) = obj.get("description") {
            check_language_map(description, ctx)?;
        }
        require_string(obj, "contentType", ctx)?;
        let length = obj
            .get("length")
            .ok_or_else(|| ValidationError::missing(ctx, "length"))?;
        if length.as_u64().is_none() {
            return Err(ValidationError::invalid(
                ctx,
                "'length' must be a non-negative integer",
            ));
        }
        require_string(obj, "sha2", ctx)?;
        if let Some(file_url) = optional_string(obj, "fileUrl", ctx)? {
            check_iri(file_url, ctx)?;
        }
    }
    Ok(())
}
