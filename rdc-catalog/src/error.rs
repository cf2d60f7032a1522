//! Error types for rdc-catalog
//!
//! Read failures are absorbed inside the catalog (placeholder fallback);
//! everything here that reaches a caller is a write failure or a local
//! precondition failure.

use crate::store::StoreError;
use thiserror::Error;

/// Local precondition failures, detected before any remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Gallery already holds the maximum number of photos
    #[error("Photo limit of {max} reached")]
    LimitExceeded { max: usize },

    /// Removing the photo would leave the listing without any
    #[error("A listing must keep at least one photo")]
    MinimumViolation,

    #[error("Photo index {index} out of range (gallery has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Listing name is required")]
    MissingName,

    #[error("City is required")]
    MissingCity,

    #[error("Please upload a photo of the clinic")]
    MissingPhoto,

    #[error("Unknown state code: {0}")]
    InvalidState(String),

    #[error("Nothing to update")]
    EmptyPatch,

    /// Built-in listing shown while the remote catalog is unreadable
    #[error("Listing {id} is a placeholder and cannot be changed")]
    PlaceholderListing { id: String },
}

/// Catalog error taxonomy
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network/service failure during a read
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// A write referenced a column the remote table lacks
    #[error("Remote table has no column {column:?}")]
    SchemaDrift { column: String },

    /// Non-recoverable write failure, with the remote diagnostic
    #[error("Save failed: {0}")]
    SaveFailed(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No listing with this id in the local collection
    #[error("Listing not found: {0}")]
    NotFound(String),

    #[error("Common error: {0}")]
    Common(#[from] rdc_common::Error),
}

impl CatalogError {
    pub fn save_failed(err: &StoreError) -> Self {
        CatalogError::SaveFailed(err.message.clone())
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
