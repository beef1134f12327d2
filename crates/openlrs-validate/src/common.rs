//! Shared shape checks used by the statement and activity validators.

use chrono::DateTime;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ValidationError;

/// The document at `ctx` must be a JSON object.
pub(crate) fn as_object<'a>(
    value: &'a Value,
    ctx: &str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::not_an_object(ctx))
}

/// Reject any field outside the allowed set for this position.
pub(crate) fn check_allowed_fields(
    obj: &Map<String, Value>,
    allowed: &[&str],
    ctx: &str,
) -> Result<(), ValidationError> {
    for field in obj.keys() {
        if !allowed.contains(&field.as_str()) {
            return Err(ValidationError::unexpected(ctx, field));
        }
    }
    Ok(())
}

/// A required field that must hold a string.
pub(crate) fn require_string<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
    ctx: &str,
) -> Result<&'a str, ValidationError> {
    obj.get(field)
        .ok_or_else(|| ValidationError::missing(ctx, field))?
        .as_str()
        .ok_or_else(|| ValidationError::invalid(ctx, format!("'{field}' must be a string")))
}

/// An optional field that, when present, must hold a string.
pub(crate) fn optional_string<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
    ctx: &str,
) -> Result<Option<&'a str>, ValidationError> {
    match obj.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| ValidationError::invalid(ctx, format!("'{field}' must be a string"))),
    }
}

/// Minimal structural IRI test: a non-empty scheme followed by a non-empty
/// body, no whitespace anywhere.
pub(crate) fn is_iri(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once(':') {
        Some((scheme, rest)) => {
            !rest.is_empty()
                && scheme
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// The value at `field` must be an IRI.
pub(crate) fn check_iri(value: &str, ctx: &str) -> Result<(), ValidationError> {
    if is_iri(value) {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            ctx,
            format!("'{value}' is not an IRI"),
        ))
    }
}

/// The value must parse as a UUID.
pub(crate) fn check_uuid(value: &str, ctx: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::invalid(ctx, format!("'{value}' is not a UUID")))
}

/// The value must parse as an RFC 3339 timestamp.
pub(crate) fn check_timestamp(value: &str, ctx: &str) -> Result<(), ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|_| ValidationError::invalid(ctx, format!("'{value}' is not a timestamp")))
}

fn is_language_tag(tag: &str) -> bool {
    !tag.is_empty()
        && !tag.starts_with('-')
        && !tag.ends_with('-')
        && !tag.contains("--")
        && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// A language map: object with language-tag keys and string values.
pub(crate) fn check_language_map(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    let map = as_object(value, ctx)?;
    for (tag, text) in map {
        if !is_language_tag(tag) {
            return Err(ValidationError::invalid(
                ctx,
                format!("'{tag}' is not a language tag"),
            ));
        }
        if !text.is_string() {
            return Err(ValidationError::invalid(
                ctx,
                format!("value for '{tag}' must be a string"),
            ));
        }
    }
    Ok(())
}

/// An extensions map: object with IRI keys. Values are unconstrained.
pub(crate) fn check_extensions(value: &Value, ctx: &str) -> Result<(), ValidationError> {
    let map = as_object(value, ctx)?;
    for key in map.keys() {
        if !is_iri(key) {
            return Err(ValidationError::invalid(
                ctx,
                format!("extension key '{key}' is not an IRI"),
            ));
        }
    }
    Ok(())
}

/// 40 hex characters, as produced by SHA1.
pub(crate) fn is_sha1_hex(value: &str) -> bool {
    value.len() == 40 && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// An ISO 8601 duration such as `PT4H35M59.14S` or `P3W`.
///
/// Accepts the designators in their standard order and a fractional part on
/// time components. At least one component is required.
pub(crate) fn is_iso8601_duration(value: &str) -> bool {
    let Some(rest) = value.strip_prefix('P') else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };
    if time_part.is_some_and(str::is_empty) {
        return false;
    }
    let mut any_component = false;
    if !scan_duration_part(date_part, &['Y', 'M', 'W', 'D'], false, &mut any_component) {
        return false;
    }
    if let Some(time) = time_part
        && !scan_duration_part(time, &['H', 'M', 'S'], true, &mut any_component)
    {
        return false;
    }
    any_component
}

/// Scan one duration part, enforcing designator order and digit shape.
fn scan_duration_part(
    part: &str,
    order: &[char],
    allow_fraction: bool,
    any_component: &mut bool,
) -> bool {
    let mut min_pos = 0usize;
    let mut number = String::new();
    let mut has_dot = false;
    for c in part.chars() {
        if c.is_ascii_digit() {
            number.push(c);
        } else if c == '.' {
            if !allow_fraction || has_dot || number.is_empty() {
                return false;
            }
            has_dot = true;
            number.push(c);
        } else {
            let Some(pos) = order.iter().position(|&d| d == c) else {
                return false;
            };
            if pos < min_pos || number.is_empty() || number.ends_with('.') {
                return false;
            }
            min_pos = pos.saturating_add(1);
            number.clear();
            has_dot = false;
            *any_component = true;
        }
    }
    // Trailing digits without a designator are malformed.
    number.is_empty()
}
