//! Catalog synchronization
//!
//! Owns the local listing collection and mediates every change to it against
//! the remote store. Writes go to the remote store first; the local collection
//! is only patched after the store confirms, so unsaved data is never shown as
//! saved and a failed write leaves the collection exactly as it was.
//!
//! **Read policy:** any remote failure during [`CatalogSync::load_all`] is
//! absorbed and the built-in placeholder catalog is shown instead.
//!
//! **Write policy:** failures always reach the caller. The single exception is
//! an insert rejected because an optional column (the gallery) does not exist
//! remotely, which is retried once without that column.

use crate::error::{CatalogError, CatalogResult, ValidationError};
use crate::services::normalizer::{self, columns};
use crate::services::placeholders;
use crate::store::{Filter, Order, RemoteStore, Row, StoreError};
use rdc_common::events::{CatalogEvent, EventBus};
use rdc_common::models::GALLERY_MAX;
use rdc_common::{Clinic, ClinicDraft, ClinicPatch};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Insert columns that may be dropped when the remote table lacks them
const OPTIONAL_INSERT_COLUMNS: &[&str] = &[columns::GALLERY];

/// Result of a confirmed-or-not removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The administrator declined the confirmation; nothing was sent
    Cancelled,
}

/// Owner of the local listing collection
pub struct CatalogSync {
    store: Arc<dyn RemoteStore>,
    table: String,
    listings: RwLock<Vec<Clinic>>,
    /// Serializes `load_all` so two loads never interleave list writes
    load_gate: Mutex<()>,
    /// Bumped by `detach`; results from older epochs are not applied
    epoch: AtomicU64,
    events: EventBus,
}

impl CatalogSync {
    pub fn new(store: Arc<dyn RemoteStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            listings: RwLock::new(Vec::new()),
            load_gate: Mutex::new(()),
            epoch: AtomicU64::new(0),
            events: EventBus::default(),
        }
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Snapshot of the local collection
    pub async fn listings(&self) -> Vec<Clinic> {
        self.listings.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Clinic> {
        self.listings
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Stop applying results of remote calls that are already in flight
    ///
    /// Called when the view that started them goes away. In-flight calls still
    /// complete and return their result to the caller.
    pub fn detach(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.current_epoch() == epoch
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Load every listing, newest first
    ///
    /// Never fails: a remote failure (or an empty remote catalog) yields the
    /// built-in placeholder listings.
    pub async fn load_all(&self) -> Vec<Clinic> {
        let _gate = self.load_gate.lock().await;
        let epoch = self.current_epoch();

        let order = Order::desc(columns::ID);
        let (listings, placeholder) = match self.store.select(&self.table, &[], Some(&order)).await
        {
            Ok(rows) if rows.is_empty() => {
                info!(table = %self.table, "Remote catalog is empty, using placeholder listings");
                (placeholders::builtin(), true)
            }
            Ok(rows) => {
                debug!(table = %self.table, rows = rows.len(), "Loaded listings");
                (rows.iter().map(normalizer::normalize_row).collect(), false)
            }
            Err(e) => {
                let err = CatalogError::RemoteUnavailable(e.message.clone());
                warn!(table = %self.table, error = %err, "Catalog read failed");
                if e.mentions_api_key() {
                    warn!("Check that the configured anon key is complete and belongs to this project");
                }
                info!("Using placeholder listings");
                (placeholders::builtin(), true)
            }
        };

        if self.is_current(epoch) {
            *self.listings.write().await = listings.clone();
            self.events.emit_lossy(CatalogEvent::Loaded {
                count: listings.len(),
                placeholder,
            });
        } else {
            debug!("Discarding catalog load started before detach");
        }

        listings
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Local listing that may be written remotely
    ///
    /// Placeholder listings exist only locally, so they are rejected before
    /// any remote call.
    async fn writable(&self, id: &str) -> CatalogResult<Clinic> {
        let clinic = self
            .get(id)
            .await
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        if placeholders::is_placeholder(&clinic) {
            warn!(id = %id, "Refusing to write a placeholder listing");
            return Err(ValidationError::PlaceholderListing { id: id.to_string() }.into());
        }
        Ok(clinic)
    }

    /// Persist a new listing and prepend it to the local collection
    ///
    /// **Algorithm:**
    /// 1. Validate locally and apply creation defaults
    /// 2. Insert including the gallery column
    /// 3. If the table lacks an optional column, retry once without it
    /// 4. Normalize the stored row (server id and defaults) and prepend it
    pub async fn create(&self, draft: ClinicDraft) -> CatalogResult<Clinic> {
        validate_draft(&draft)?;
        let draft = draft.normalized();
        let epoch = self.current_epoch();

        let row = normalizer::draft_row(&draft);
        let inserted = match self.store.insert(&self.table, vec![row.clone()]).await {
            Ok(rows) => rows,
            Err(e) => match droppable_column(&row, &e) {
                Some(column) => {
                    let drift = CatalogError::SchemaDrift {
                        column: column.to_string(),
                    };
                    warn!(error = %drift, "Retrying insert without column");

                    let mut reduced = row;
                    reduced.remove(column);
                    self.store
                        .insert(&self.table, vec![reduced])
                        .await
                        .map_err(|e| {
                            error!(error = %e, "Insert retry failed");
                            CatalogError::save_failed(&e)
                        })?
                }
                None => {
                    error!(error = %e, "Insert failed");
                    return Err(CatalogError::save_failed(&e));
                }
            },
        };

        let stored = inserted.into_iter().next().ok_or_else(|| {
            CatalogError::SaveFailed("Remote store returned no row for the new listing".to_string())
        })?;
        let clinic = normalizer::normalize_row(&stored);

        info!(id = %clinic.id, name = %clinic.name, "Listing created");

        if self.is_current(epoch) {
            self.listings.write().await.insert(0, clinic.clone());
            self.events.emit_lossy(CatalogEvent::Created {
                id: clinic.id.clone(),
            });
        } else {
            debug!(id = %clinic.id, "Created listing not applied after detach");
        }

        Ok(clinic)
    }

    /// Write a patch and merge it into the matching local listing in place
    pub async fn update(&self, id: &str, patch: ClinicPatch) -> CatalogResult<Clinic> {
        validate_patch(&patch)?;
        let mut updated = self.writable(id).await?;
        let epoch = self.current_epoch();

        let row = normalizer::patch_row(&patch);
        let affected = self
            .store
            .update(&self.table, row, &[Filter::eq(columns::ID, id)])
            .await
            .map_err(|e| {
                error!(id = %id, error = %e, "Update failed");
                update_error(&patch, &e)
            })?;

        if affected.is_empty() {
            warn!(id = %id, "Update matched no remote listing");
            return Err(CatalogError::SaveFailed(format!(
                "No remote listing matched id {}",
                id
            )));
        }

        if self.is_current(epoch) {
            let mut listings = self.listings.write().await;
            match listings.iter_mut().find(|c| c.id == id) {
                Some(existing) => {
                    existing.apply(&patch);
                    updated = existing.clone();
                }
                None => updated.apply(&patch),
            }
            drop(listings);
            self.events.emit_lossy(CatalogEvent::Updated { id: id.to_string() });
        } else {
            updated.apply(&patch);
            debug!(id = %id, "Update not applied after detach");
        }

        info!(id = %id, "Listing updated");
        Ok(updated)
    }

    /// Delete a listing after explicit confirmation
    ///
    /// `confirm` is shown the listing about to be deleted; returning `false`
    /// cancels without contacting the remote store.
    pub async fn remove<F>(&self, id: &str, confirm: F) -> CatalogResult<RemoveOutcome>
    where
        F: FnOnce(&Clinic) -> bool,
    {
        let target = self.writable(id).await?;

        if !confirm(&target) {
            info!(id = %id, "Removal cancelled");
            return Ok(RemoveOutcome::Cancelled);
        }

        let epoch = self.current_epoch();
        self.store
            .delete(&self.table, &[Filter::eq(columns::ID, id)])
            .await
            .map_err(|e| {
                error!(id = %id, error = %e, "Delete failed");
                CatalogError::save_failed(&e)
            })?;

        if self.is_current(epoch) {
            self.listings.write().await.retain(|c| c.id != id);
            self.events.emit_lossy(CatalogEvent::Removed { id: id.to_string() });
        }

        info!(id = %id, "Listing removed");
        Ok(RemoveOutcome::Removed)
    }
}

/// Optional column present in `row` that the failure says is missing remotely
fn droppable_column(row: &Row, err: &StoreError) -> Option<&'static str> {
    OPTIONAL_INSERT_COLUMNS
        .iter()
        .copied()
        .find(|column| row.contains_key(*column) && err.is_missing_column(column))
}

/// Failure reported for a rejected update
///
/// A gallery write against a table without the gallery column is reported as
/// schema drift; it is never retried without the gallery.
fn update_error(patch: &ClinicPatch, err: &StoreError) -> CatalogError {
    if patch.gallery.is_some() && err.missing_column_name() == Some(columns::GALLERY) {
        let drift = CatalogError::SchemaDrift {
            column: columns::GALLERY.to_string(),
        };
        CatalogError::SaveFailed(drift.to_string())
    } else {
        CatalogError::save_failed(err)
    }
}

fn validate_draft(draft: &ClinicDraft) -> Result<(), ValidationError> {
    if draft.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if draft.primary_image.as_str().is_empty() && draft.gallery.is_empty() {
        return Err(ValidationError::MissingPhoto);
    }
    if draft.gallery.len() > GALLERY_MAX {
        return Err(ValidationError::LimitExceeded { max: GALLERY_MAX });
    }
    Ok(())
}

fn validate_patch(patch: &ClinicPatch) -> Result<(), ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
    }
    if let Some(gallery) = &patch.gallery {
        if gallery.is_empty() {
            return Err(ValidationError::MinimumViolation);
        }
        if gallery.len() > GALLERY_MAX {
            return Err(ValidationError::LimitExceeded { max: GALLERY_MAX });
        }
    }
    Ok(())
}
