//! Error types for result extraction.

use thiserror::Error;

/// Errors produced while extracting or parsing build results.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The tar stream is truncated or carries a malformed header.
    #[error("archive format error: {source}")]
    ArchiveFormat {
        /// Underlying I/O error from the archive reader.
        #[source]
        source: std::io::Error,
    },

    /// The report document does not open with a testsuite element.
    #[error("expected a testsuite element, but got {found}")]
    UnexpectedStructure {
        /// Name of the element actually found.
        found: String,
    },

    /// A testcase element is missing its required name attribute.
    #[error("testcase element is missing its name attribute")]
    MissingName,

    /// The report document is not well-formed XML.
    #[error("malformed report: {message}")]
    MalformedReport {
        /// Parser description of the structural problem.
        message: String,
    },

    /// The reference archive contains no entries.
    #[error("reference archive contains no entries")]
    ReferenceNotFound,

    /// The reference file does not hold a full commit hash.
    #[error("malformed commit reference: {value:?}")]
    MalformedReference {
        /// The trimmed file content that failed validation.
        value: String,
    },
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ReportError>;
