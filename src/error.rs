//! Error types for rust-edmx

use std::path::PathBuf;
use thiserror::Error;

/// Example of the index annotation grammar, quoted in format errors.
pub const INDEX_ANNOTATION_FORMAT_EXAMPLE: &str =
    "{ Name: MyIndex, Order: 7, IsClustered: True, IsUnique: False } { } { Name: MyOtherIndex, IsUnique: True }";

/// Errors that can occur while reading, writing or merging mapping metadata
#[derive(Error, Debug)]
pub enum EdmxError {
    #[error("ADP_InvalidMultipartNameDelimiterUsage: the multipart name '{name}' uses quote or delimiter characters incorrectly")]
    InvalidMultipartNameDelimiterUsage { name: String },

    #[error("ADP_InvalidMultipartNameToManyParts: the multipart name '{name}' has more than {limit} parts")]
    InvalidMultipartNameTooManyParts { name: String, limit: usize },

    #[error("ADP_InvalidMultipartName: the multipart name '{name}' is empty")]
    InvalidMultipartName { name: String },

    #[error("The annotation value '{value}' is not in the expected index annotation format. Expected: '{expected}'", expected = INDEX_ANNOTATION_FORMAT_EXAMPLE)]
    IndexAnnotationFormat { value: String },

    #[error("The index '{name}' matches more than one existing index in the annotation")]
    IndexAnnotationAmbiguous { name: String },

    #[error("The index with name '{name}' has conflicting configuration specified in index annotations:{details}")]
    IncompatibleIndexAnnotation { name: String, details: String },

    #[error("Unsupported Entity Framework version: {version}")]
    UnsupportedVersion { version: String },

    #[error("Failed to read file: {path}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse XML document: {document}")]
    XmlParseError {
        document: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("Unresolved {kind} reference: {name}")]
    UnresolvedReference { kind: &'static str, name: String },

    #[error("Cannot generate the mapping view for '{set}': {message}")]
    ViewGenerationError { set: String, message: String },
}

impl EdmxError {
    pub(crate) fn invalid_schema(message: impl Into<String>) -> Self {
        EdmxError::InvalidSchema {
            message: message.into(),
        }
    }

    pub(crate) fn unresolved(kind: &'static str, name: impl Into<String>) -> Self {
        EdmxError::UnresolvedReference {
            kind,
            name: name.into(),
        }
    }
}
