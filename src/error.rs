//! Error types for the extraction core.
//!
//! This module defines every error that can cross the boundary out of the
//! core, per the taxonomy in the design document's error handling section.

/// Result type alias for extraction core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting a statement.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The PDF container is encrypted without the correct key, or is
    /// structurally corrupt (bad header, unreadable xref, zero pages).
    #[error("PDF unreadable: {0}")]
    PdfUnreadable(String),

    /// All three tiers produced fewer than 3 transactions.
    #[error("extraction failed: all tiers produced fewer than 3 transactions ({reason})")]
    ExtractionFailed {
        /// Human-readable reason (last tier attempted, page count, etc).
        reason: String,
    },

    /// A model call deadline was exceeded after the caller's cancellation
    /// token was observed tripped, or the caller cancelled explicitly.
    #[error("extraction cancelled: {0}")]
    ExtractionCancelled(String),

    /// Failed to parse the PDF's object/cross-reference structure.
    #[error("malformed PDF object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where the error occurred.
        offset: usize,
        /// Reason for the parse failure.
        reason: String,
    },

    /// A stream filter is not supported (e.g. embedded font programs that
    /// require filters this crate does not implement).
    #[error("unsupported stream filter: {0}")]
    UnsupportedFilter(String),

    /// IO error reading the PDF source.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A model client returned text that did not parse as the expected
    /// JSON schema.
    #[error("model response did not match expected schema: {0}")]
    SchemaMismatch(String),

    /// A vision or chat model call returned a transport-level failure.
    #[error("model call failed: {0}")]
    ModelCall(String),
}
