//! Listing form state
//!
//! The create form turns administrator input into a [`ClinicDraft`]; the edit
//! form is seeded from an existing [`Clinic`] and produces a [`ClinicPatch`].
//! Both validate locally so that no remote call is made for incomplete input.

use crate::error::ValidationError;
use crate::services::gallery::GalleryStore;
use crate::services::image_pipeline::EncodeOptions;
use rdc_common::config::ImageConfig;
use rdc_common::{Amount, Clinic, ClinicDraft, ClinicPatch, Location, StateCode};

/// Specialty labels chosen for a listing, in selection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialtySelection {
    selected: Vec<String>,
}

impl SpecialtySelection {
    pub fn from_labels(labels: &[String]) -> Self {
        let mut selection = Self::default();
        for label in labels {
            selection.add_custom(label);
        }
        selection
    }

    /// Select a label, or deselect it if already selected
    pub fn toggle(&mut self, label: &str) {
        match self.selected.iter().position(|s| s == label) {
            Some(i) => {
                self.selected.remove(i);
            }
            None => self.selected.push(label.to_string()),
        }
    }

    /// Add a typed label; blank and duplicate labels are ignored
    pub fn add_custom(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.selected.iter().any(|s| s == label) {
            return false;
        }
        self.selected.push(label.to_string());
        true
    }

    pub fn is_selected(&self, label: &str) -> bool {
        self.selected.iter().any(|s| s == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.selected
    }
}

/// Re-mask a money input after a keystroke
pub fn remask(typed: &str) -> String {
    Amount::parse_display(typed).format_display()
}

fn changed<T: PartialEq>(value: T, original: &T) -> Option<T> {
    (value != *original).then_some(value)
}

fn required(value: &str, err: ValidationError) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// Create form
// ============================================================================

/// "Register clinic" form
#[derive(Debug, Clone)]
pub struct ListingForm {
    pub name: String,
    pub state: StateCode,
    pub city: String,
    /// Masked display value (`150.000,00`)
    pub price: String,
    /// Masked display value
    pub monthly_revenue: String,
    pub description: String,
    pub specialties: SpecialtySelection,
    pub gallery: GalleryStore,
}

impl ListingForm {
    pub fn new(images: &ImageConfig) -> Self {
        Self {
            name: String::new(),
            state: StateCode::default(),
            city: String::new(),
            price: String::new(),
            monthly_revenue: String::new(),
            description: String::new(),
            specialties: SpecialtySelection::default(),
            gallery: GalleryStore::new(EncodeOptions::for_create(images)),
        }
    }

    pub fn set_price_input(&mut self, typed: &str) {
        self.price = remask(typed);
    }

    pub fn set_revenue_input(&mut self, typed: &str) {
        self.monthly_revenue = remask(typed);
    }

    /// Validate and build the draft to submit
    pub fn to_draft(&self) -> Result<ClinicDraft, ValidationError> {
        let name = required(&self.name, ValidationError::MissingName)?;
        let city = required(&self.city, ValidationError::MissingCity)?;
        let cover = self
            .gallery
            .cover()
            .cloned()
            .ok_or(ValidationError::MissingPhoto)?;

        Ok(ClinicDraft {
            name,
            location: Location::new(city, self.state).to_string(),
            price: Amount::parse_display(&self.price),
            monthly_revenue: Amount::parse_display(&self.monthly_revenue),
            description: self.description.clone(),
            primary_image: cover,
            specialties: self.specialties.labels().to_vec(),
            gallery: self.gallery.photos().to_vec(),
        }
        .normalized())
    }
}

// ============================================================================
// Edit form
// ============================================================================

/// "Edit dossier" form for a persisted listing
#[derive(Debug, Clone)]
pub struct EditForm {
    original: Clinic,
    pub name: String,
    pub state: StateCode,
    pub city: String,
    pub price: String,
    pub monthly_revenue: String,
    pub description: String,
    pub specialties: SpecialtySelection,
    pub gallery: GalleryStore,
}

impl EditForm {
    pub fn from_clinic(clinic: &Clinic, images: &ImageConfig) -> Self {
        let location = Location::parse(&clinic.location);
        Self {
            original: clinic.clone(),
            name: clinic.name.clone(),
            state: location.state,
            city: location.city,
            price: clinic.price.format_display(),
            monthly_revenue: clinic.monthly_revenue.format_display(),
            description: clinic.description.clone(),
            specialties: SpecialtySelection::from_labels(&clinic.specialties),
            gallery: GalleryStore::from_clinic(clinic, EncodeOptions::for_edit(images)),
        }
    }

    pub fn id(&self) -> &str {
        &self.original.id
    }

    pub fn set_price_input(&mut self, typed: &str) {
        self.price = remask(typed);
    }

    pub fn set_revenue_input(&mut self, typed: &str) {
        self.monthly_revenue = remask(typed);
    }

    /// Changed fields plus the full replacement gallery
    pub fn to_patch(&self) -> Result<ClinicPatch, ValidationError> {
        let name = required(&self.name, ValidationError::MissingName)?;
        let city = required(&self.city, ValidationError::MissingCity)?;
        if self.gallery.is_empty() {
            return Err(ValidationError::MinimumViolation);
        }

        let location = Location::new(city, self.state).to_string();
        let price = Amount::parse_display(&self.price);
        let revenue = Amount::parse_display(&self.monthly_revenue);
        let specialties = self.specialties.labels().to_vec();

        Ok(ClinicPatch {
            name: changed(name, &self.original.name),
            location: changed(location, &self.original.location),
            price: changed(price, &self.original.price),
            monthly_revenue: changed(revenue, &self.original.monthly_revenue),
            description: changed(self.description.clone(), &self.original.description),
            specialties: if specialties.is_empty() {
                None
            } else {
                changed(specialties, &self.original.specialties)
            },
            gallery: Some(self.gallery.photos().to_vec()),
        })
    }
}
