//! Layered error definitions
//!
//! Categorized by source: config / model / parameter / dataset / io

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Model Errors =====
    /// Persisted model exists but cannot be decoded
    #[error("model file '{}' is corrupted: {message}", path.display())]
    ModelCorrupted {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Persisted model was written by an incompatible schema
    #[error("model file '{}' has schema version {found}, supported: {supported}", path.display())]
    UnsupportedSchemaVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    /// Model could not be encoded for persistence
    #[error("model serialize error: {message}")]
    ModelSerialize { message: String },

    // ===== Parameter Errors =====
    /// Parameter lookup with an unknown key
    #[error("unknown parameter '{key}'")]
    UnknownParameter { key: String },

    /// Parameter value violates a model invariant
    #[error("invalid value for '{key}': {message}")]
    InvalidParameter { key: String, message: String },

    // ===== Dataset Errors =====
    /// Lane-change dataset row cannot be parsed
    #[error("dataset '{}' line {line}: {message}", path.display())]
    DatasetMalformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create model corruption error with its decoder source
    pub fn model_corrupted<E>(path: &Path, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ModelCorrupted {
            path: path.to_path_buf(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create unknown parameter error
    pub fn unknown_parameter(key: impl Into<String>) -> Self {
        Self::UnknownParameter { key: key.into() }
    }

    /// Create invalid parameter error
    pub fn invalid_parameter(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create dataset parse error
    pub fn dataset_malformed(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self::DatasetMalformed {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_parameter_message() {
        let err = ContractError::unknown_parameter("follow_gap");
        assert_eq!(err.to_string(), "unknown parameter 'follow_gap'");
    }

    #[test]
    fn test_model_corrupted_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "truncated");
        let err = ContractError::model_corrupted(Path::new("data/model.json"), io);
        assert!(err.to_string().contains("data/model.json"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
