//! Error types for catalog loading.
//!
//! Gameplay operations never return these: purchases and rolls reject
//! silently (see [`crate::economy::RejectReason`]). Errors here are for
//! data that is wrong before play starts.

use thiserror::Error;

/// Result type alias using [`CatalogError`].
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Top-level error type for catalog data.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog document failed to parse.
    #[error("Failed to parse catalog '{source_name}': {source}")]
    ParseError {
        /// Name of the document (file path or "builtin").
        source_name: String,
        /// Underlying RON error.
        #[source]
        source: ron::error::SpannedError,
    },

    /// Catalog parsed but is internally inconsistent.
    #[error("Catalog '{source_name}' failed validation: {errors:?}")]
    ValidationError {
        /// Name of the document (file path or "builtin").
        source_name: String,
        /// Every problem found, one message each.
        errors: Vec<String>,
    },
}
