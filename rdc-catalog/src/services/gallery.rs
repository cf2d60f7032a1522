//! Photo gallery for one listing editor session
//!
//! Holds the ordered photos of a listing while it is being created or edited.
//! The first photo is the cover. A populated gallery never drops below one
//! photo and never exceeds [`GALLERY_MAX`].

use crate::error::ValidationError;
use crate::services::image_pipeline::{self, EncodeOptions};
use rdc_common::models::GALLERY_MAX;
use rdc_common::{Clinic, ImagePayload};

/// Ordered photos owned by one form session
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryStore {
    photos: Vec<ImagePayload>,
    /// Cover used while the gallery is still empty
    fallback: Option<ImagePayload>,
    options: EncodeOptions,
}

impl GalleryStore {
    /// Empty gallery for a new listing
    pub fn new(options: EncodeOptions) -> Self {
        Self {
            photos: Vec::new(),
            fallback: None,
            options,
        }
    }

    /// Gallery seeded from an existing listing
    pub fn from_clinic(clinic: &Clinic, options: EncodeOptions) -> Self {
        let photos = if clinic.gallery.is_empty() {
            vec![clinic.primary_image.clone()]
        } else {
            clinic.gallery.clone()
        };
        Self {
            photos,
            fallback: Some(clinic.primary_image.clone()),
            options,
        }
    }

    /// Compress and append a photo
    ///
    /// The limit is checked before compression so a full gallery never pays
    /// for a decode.
    pub async fn add(&mut self, raw: &[u8]) -> Result<&ImagePayload, ValidationError> {
        self.ensure_room()?;
        let compressed = image_pipeline::encode_bytes(raw, self.options).await;
        self.push(compressed)
    }

    /// Append an already-encoded payload
    pub fn push(&mut self, payload: ImagePayload) -> Result<&ImagePayload, ValidationError> {
        self.ensure_room()?;
        self.photos.push(payload);
        Ok(&self.photos[self.photos.len() - 1])
    }

    fn ensure_room(&self) -> Result<(), ValidationError> {
        if self.photos.len() >= GALLERY_MAX {
            return Err(ValidationError::LimitExceeded { max: GALLERY_MAX });
        }
        Ok(())
    }

    /// Remove one photo, keeping the order of the rest
    pub fn remove_at(&mut self, index: usize) -> Result<ImagePayload, ValidationError> {
        if self.photos.len() <= 1 {
            return Err(ValidationError::MinimumViolation);
        }
        if index >= self.photos.len() {
            return Err(ValidationError::IndexOutOfRange {
                index,
                len: self.photos.len(),
            });
        }
        Ok(self.photos.remove(index))
    }

    /// Cover photo: the first element, or the fallback before first population
    pub fn cover(&self) -> Option<&ImagePayload> {
        self.photos.first().or(self.fallback.as_ref())
    }

    pub fn photos(&self) -> &[ImagePayload] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn into_photos(self) -> Vec<ImagePayload> {
        self.photos
    }

    /// Lightbox: index after `current`, wrapping to the first photo
    pub fn next_index(&self, current: usize) -> usize {
        if self.photos.is_empty() {
            return 0;
        }
        (current + 1) % self.photos.len()
    }

    /// Lightbox: index before `current`, wrapping to the last photo
    pub fn prev_index(&self, current: usize) -> usize {
        let len = self.photos.len();
        if len == 0 {
            return 0;
        }
        (current % len + len - 1) % len
    }
}
