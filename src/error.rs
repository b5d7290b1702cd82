//! Error taxonomy for the diff/merge core (spec §7).

use thiserror::Error;

/// Errors surfaced directly by [`crate::diff::diff`].
///
/// There is no partial success for a diff call: it either returns a
/// [`crate::diff::DiffMatch`] or one of these.
#[derive(Debug, Error)]
pub enum XmlDiffError {
    /// Null/empty XML content, unparseable XML, or an unreadable file.
    /// Parsing itself is out of scope for this crate; this variant exists
    /// for callers that plug an external parser in front of `diff`/`merge`
    /// and want a single error type to propagate its failure through.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Contradictory configuration, e.g. a user normalizer that is not
    /// null-safe, or a `key_attribute_names` entry that also appears in
    /// `excluded_attribute_names`.
    #[error("configuration error in `{offending}`: {message}")]
    ConfigurationError {
        /// Identifies the offending normalizer, attribute name, or setting.
        offending: String,
        message: String,
    },
}

/// Result alias for fallible diff operations.
pub type Result<T> = std::result::Result<T, XmlDiffError>;
