//! Error types for the machine conversion pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CodecError`] - Provider payload decoding errors
//! - [`ConversionError`] - Field and aggregate mapping errors, dispatch errors
//! - [`DocumentError`] - YAML document reading/writing errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Provider Payload Errors
// =============================================================================

/// Errors while decoding the provider payload embedded in a resource.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The resource carries no provider payload at all.
    #[error("Provider spec value is missing")]
    MissingPayload,

    /// The payload declares a kind we do not decode.
    #[error("Unexpected provider spec kind '{found}', expected '{expected}'")]
    UnexpectedKind { expected: String, found: String },

    /// The payload does not have the expected shape.
    #[error("Malformed provider spec: {0}")]
    Malformed(#[from] serde_json::Error),
}

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors raised by the mappers and the dispatcher.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Provider payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] CodecError),

    /// A field needed by a mapping rule is absent.
    #[error("Incomplete data: missing or empty '{field}'")]
    IncompleteData { field: String },

    /// More than one block device without a device name.
    #[error("Found {count} root volumes (block devices without a device name), expected exactly one")]
    DuplicateRootVolume { count: usize },

    /// No strategy registered for this provider.
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Direction other than `capi` or `mapi`.
    #[error("Unsupported conversion direction: {0} (expected 'capi' or 'mapi')")]
    UnsupportedDirection(String),

    /// One of the two artifacts of a machine group is absent.
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// Group and template do not reference each other.
    #[error("Mismatched artifacts: group references template '{expected}', got '{found}'")]
    MismatchedArtifact { expected: String, found: String },

    /// Resources of a kind the requested direction cannot consume.
    #[error("Unexpected input: {0}")]
    UnexpectedInput(String),
}

impl ConversionError {
    pub(crate) fn incomplete(field: impl Into<String>) -> Self {
        Self::IncompleteData { field: field.into() }
    }
}

// =============================================================================
// Document Errors
// =============================================================================

/// Errors while reading or writing YAML documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Failed to read or write a file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax or shape error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A document has no `kind` field.
    #[error("Document {index} has no kind")]
    MissingKind { index: usize },

    /// A document has a kind we do not convert.
    #[error("Document {index} has unsupported kind '{kind}' ({api_version})")]
    UnknownKind {
        index: usize,
        api_version: String,
        kind: String,
    },

    /// Input contained no documents.
    #[error("No documents found in input")]
    Empty,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::convert::pipeline::convert_file`]
/// and [`crate::convert::pipeline::convert_bytes`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Document error.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Conversion error.
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for provider payload operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type for mapping and dispatch operations.
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CodecError -> ConversionError -> PipelineError
        let codec_err = CodecError::MissingPayload;
        let conversion_err: ConversionError = codec_err.into();
        assert!(matches!(conversion_err, ConversionError::Decode(_)));
        let pipeline_err: PipelineError = conversion_err.into();
        assert!(pipeline_err.to_string().contains("missing"));

        // DocumentError -> PipelineError
        let doc_err = DocumentError::MissingKind { index: 2 };
        let pipeline_err: PipelineError = doc_err.into();
        assert!(pipeline_err.to_string().contains("Document 2"));
    }

    #[test]
    fn test_incomplete_data_format() {
        let err = ConversionError::incomplete("blockDevices[0].ebs");
        let msg = err.to_string();
        assert!(msg.contains("blockDevices[0].ebs"));
    }

    #[test]
    fn test_mismatched_artifact_format() {
        let err = ConversionError::MismatchedArtifact {
            expected: "workers".into(),
            found: "masters".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("workers"));
        assert!(msg.contains("masters"));
    }
}
