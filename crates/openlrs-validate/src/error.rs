//! Validation error type.

use thiserror::Error;

/// Why a statement or activity document was rejected.
///
/// Every variant carries the position in the document (`ctx`) so the message
/// alone tells a submitter what to fix. Validation stops at the first
/// violation, so one document produces at most one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A position that must hold a JSON object holds something else.
    #[error("{ctx} is not a JSON object")]
    NotAnObject {
        /// Where in the document.
        ctx: String,
    },

    /// A required field is absent.
    #[error("{ctx} is missing the required field '{field}'")]
    Missing {
        /// Where in the document.
        ctx: String,
        /// The absent field.
        field: &'static str,
    },

    /// A field that is not part of the schema at this position.
    #[error("{ctx} contains the unexpected field '{field}'")]
    Unexpected {
        /// Where in the document.
        ctx: String,
        /// The offending field.
        field: String,
    },

    /// A present field with an unacceptable value.
    #[error("{ctx}: {message}")]
    Invalid {
        /// Where in the document.
        ctx: String,
        /// What is wrong with the value.
        message: String,
    },
}

impl ValidationError {
    pub(crate) fn not_an_object(ctx: &str) -> Self {
        Self::NotAnObject { ctx: ctx.to_owned() }
    }

    pub(crate) fn missing(ctx: &str, field: &'static str) -> Self {
        Self::Missing {
            ctx: ctx.to_owned(),
            field,
        }
    }

    pub(crate) fn unexpected(ctx: &str, field: &str) -> Self {
        Self::Unexpected {
            ctx: ctx.to_owned(),
            field: field.to_owned(),
        }
    }

    pub(crate) fn invalid(ctx: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            ctx: ctx.to_owned(),
            message: message.into(),
        }
    }
}
