//! rdc-catalog library interface
//!
//! Client-side synchronization of the clinic catalog with its hosted store:
//! record normalization, write-then-reconcile updates, schema-drift fallback
//! and photo gallery handling.

pub mod error;
pub mod forms;
pub mod services;
pub mod store;

pub use crate::error::{CatalogError, CatalogResult, ValidationError};
pub use crate::services::{CatalogSync, GalleryStore, RemoveOutcome};

use rdc_common::config::ResolvedStore;
use std::sync::Arc;
use store::PostgrestStore;

/// Build a catalog backed by the configured PostgREST store
pub fn connect(store: &ResolvedStore) -> CatalogResult<CatalogSync> {
    let client = PostgrestStore::from_config(store)
        .map_err(|e| rdc_common::Error::Config(format!("Remote store client: {}", e)))?;
    tracing::debug!(url = %store.url, table = %store.listings_table, "Remote store configured");
    Ok(CatalogSync::new(Arc::new(client), store.listings_table.clone()))
}
