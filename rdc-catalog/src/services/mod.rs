//! Catalog services

pub mod catalog_sync;
pub mod gallery;
pub mod image_pipeline;
pub mod normalizer;
pub mod placeholders;

pub use catalog_sync::{CatalogSync, RemoveOutcome};
pub use gallery::GalleryStore;
pub use image_pipeline::EncodeOptions;
pub use normalizer::RawClinicRow;
