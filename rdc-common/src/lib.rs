//! # Rei das Clínicas Common Library
//!
//! Shared code for the clinic marketplace crates including:
//! - Canonical listing models (Clinic, drafts, patches, image payloads)
//! - Currency codec for masked price inputs
//! - Configuration loading
//! - Catalog event bus

pub mod config;
pub mod currency;
pub mod error;
pub mod events;
pub mod models;

pub use currency::Amount;
pub use error::{Error, Result};
pub use models::{Clinic, ClinicDraft, ClinicPatch, ImagePayload, Location, StateCode};
