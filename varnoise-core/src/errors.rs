use thiserror::Error;

use crate::models::VariantKey;

/// Failure reported by a storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Write conflicts with stored state: {0}")]
    Conflict(String),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Wrap any backend specific error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

#[derive(Error, Debug)]
pub enum VarNoiseError {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("No aggregate record at {0}")]
    KeyNotFound(VariantKey),

    #[error("Sample not registered: {0}")]
    SampleNotFound(String),

    #[error("Sample already registered: {0}")]
    DuplicateSample(String),

    #[error("Malformed observation: {0}")]
    DataError(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Record source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl VarNoiseError {
    /// Wrap an error raised while reading a record source.
    pub fn source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        VarNoiseError::Source(Box::new(err))
    }

    /// True for both flavours of "not found" (missing key, unregistered sample).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VarNoiseError::KeyNotFound(_) | VarNoiseError::SampleNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, VarNoiseError>;
