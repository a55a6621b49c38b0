use std::fmt;

use configs::PropertyError;
use models::errors::ModelError;
use thiserror::Error;

use crate::storage::StoreError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request carries no operation")]
    MissingOperation,
    #[error("unsupported operation `{0}`")]
    UnsupportedOperation(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    #[error("property retrieval failed: {0}")]
    Property(#[from] PropertyError),
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(reason) => Self::Validation(ValidationError::malformed("entity", reason)),
            ModelError::Encoding(reason) => Self::Store(StoreError::Encoding(reason)),
        }
    }
}

/// Failure classes reported in the response envelope and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    MissingOperation,
    UnsupportedOperation,
    ValidationFailure,
    StoreFailure,
    PropertyRetrievalFailure,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::MissingOperation => "MissingOperation",
            FailureKind::UnsupportedOperation => "UnsupportedOperation",
            FailureKind::ValidationFailure => "ValidationFailure",
            FailureKind::StoreFailure => "StoreFailure",
            FailureKind::PropertyRetrievalFailure => "PropertyRetrievalFailure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl ServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ServiceError::MissingOperation => FailureKind::MissingOperation,
            ServiceError::UnsupportedOperation(_) => FailureKind::UnsupportedOperation,
            ServiceError::Validation(_) => FailureKind::ValidationFailure,
            ServiceError::Store(_) => FailureKind::StoreFailure,
            ServiceError::Property(_) => FailureKind::PropertyRetrievalFailure,
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self.kind() {
            FailureKind::MissingOperation => 1001,
            FailureKind::UnsupportedOperation => 1002,
            FailureKind::ValidationFailure => 1003,
            FailureKind::StoreFailure => 1200,
            FailureKind::PropertyRetrievalFailure => 1300,
        }
    }
}
