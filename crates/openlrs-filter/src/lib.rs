//! Hook filter compilation and statement matching.
//!
//! A hook's `filters` document is compiled into a [`Predicate`] tree once
//! per delivery round, then evaluated against each statement of the freshly
//! stored batch. The grammar and its quirks are documented on
//! [`builder::build_predicate`]; the short version is that absent pieces
//! constrain nothing, and only a structurally non-object document is an
//! error.
//!
//! # Modules
//!
//! - [`predicate`] -- the compiled predicate tree and its field tests
//! - [`builder`] -- compilation from JSON filter documents
//! - [`matcher`] -- evaluation against a stored batch
//! - [`error`] -- compilation errors

pub mod builder;
pub mod error;
pub mod matcher;
pub mod predicate;

// Re-export primary types for convenience.
pub use builder::build_predicate;
pub use error::FilterError;
pub use matcher::find_matches;
pub use predicate::{FieldTest, Predicate};
