//! Canonical listing models
//!
//! These are the in-memory shapes the catalog works with. Remote rows are mapped
//! onto them by the catalog's record normalizer and never used directly.

use crate::currency::Amount;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of photos one listing may carry
pub const GALLERY_MAX: usize = 30;

/// Specialty assigned when the administrator selects none
pub const DEFAULT_SPECIALTY: &str = "Geral";

/// Specialties offered as one-click choices in the listing form
pub const SUGGESTED_SPECIALTIES: [&str; 14] = [
    "Odontologia",
    "Dermatologia",
    "Estética",
    "Ginecologia",
    "Cardiologia",
    "Ortopedia",
    "Oftalmologista",
    "Pediatria",
    "Fisioterapia",
    "Psicologia",
    "Veterinária",
    "Laboratório",
    "Hospital",
    "Pronto Socorro",
];

// ============================================================================
// Image payloads
// ============================================================================

/// Self-describing image blob (`data:<mime>;base64,<bytes>`) or a plain image URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Build a base64 data URL from raw bytes
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_url(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// MIME type declared by a data URL
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, _) = rest.split_once(',')?;
        header.split(';').next().filter(|m| !m.is_empty())
    }

    /// Decoded bytes of a base64 data URL; `None` for URLs or malformed payloads
    pub fn decode(&self) -> Option<Vec<u8>> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        if !header.ends_with(";base64") {
            return None;
        }
        STANDARD.decode(data.trim()).ok()
    }
}

impl fmt::Display for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Data URLs can be megabytes long; show only the header
        if self.is_data_url() {
            let header = self.0.split(',').next().unwrap_or("data:");
            write!(f, "{},… ({} chars)", header, self.0.len())
        } else {
            f.write_str(&self.0)
        }
    }
}

// ============================================================================
// Location
// ============================================================================

/// Brazilian federative unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum StateCode {
    AC,
    AL,
    AP,
    AM,
    BA,
    CE,
    DF,
    ES,
    GO,
    MA,
    MT,
    MS,
    MG,
    PA,
    PB,
    PR,
    PE,
    PI,
    RJ,
    RN,
    RS,
    RO,
    RR,
    SC,
    #[default]
    SP,
    SE,
    TO,
}

impl StateCode {
    /// All units in form display order
    pub const ALL: [StateCode; 27] = [
        StateCode::AC,
        StateCode::AL,
        StateCode::AP,
        StateCode::AM,
        StateCode::BA,
        StateCode::CE,
        StateCode::DF,
        StateCode::ES,
        StateCode::GO,
        StateCode::MA,
        StateCode::MT,
        StateCode::MS,
        StateCode::MG,
        StateCode::PA,
        StateCode::PB,
        StateCode::PR,
        StateCode::PE,
        StateCode::PI,
        StateCode::RJ,
        StateCode::RN,
        StateCode::RS,
        StateCode::RO,
        StateCode::RR,
        StateCode::SC,
        StateCode::SP,
        StateCode::SE,
        StateCode::TO,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StateCode::AC => "AC",
            StateCode::AL => "AL",
            StateCode::AP => "AP",
            StateCode::AM => "AM",
            StateCode::BA => "BA",
            StateCode::CE => "CE",
            StateCode::DF => "DF",
            StateCode::ES => "ES",
            StateCode::GO => "GO",
            StateCode::MA => "MA",
            StateCode::MT => "MT",
            StateCode::MS => "MS",
            StateCode::MG => "MG",
            StateCode::PA => "PA",
            StateCode::PB => "PB",
            StateCode::PR => "PR",
            StateCode::PE => "PE",
            StateCode::PI => "PI",
            StateCode::RJ => "RJ",
            StateCode::RN => "RN",
            StateCode::RS => "RS",
            StateCode::RO => "RO",
            StateCode::RR => "RR",
            StateCode::SC => "SC",
            StateCode::SP => "SP",
            StateCode::SE => "SE",
            StateCode::TO => "TO",
        }
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateCode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        StateCode::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| crate::Error::InvalidInput(format!("unknown state code: {}", s)))
    }
}

impl From<StateCode> for String {
    fn from(code: StateCode) -> Self {
        code.as_str().to_string()
    }
}

impl TryFrom<String> for StateCode {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// City plus state, stored remotely as `"{city}, {UF}"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub state: StateCode,
}

impl Location {
    pub fn new(city: impl Into<String>, state: StateCode) -> Self {
        Self {
            city: city.into(),
            state,
        }
    }

    /// Split a stored location; unknown or missing state falls back to SP
    pub fn parse(stored: &str) -> Self {
        match stored.rsplit_once(", ") {
            Some((city, state)) => Self {
                city: city.trim().to_string(),
                state: state.parse().unwrap_or_default(),
            },
            None => Self {
                city: stored.trim().to_string(),
                state: StateCode::default(),
            },
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.state)
    }
}

// ============================================================================
// Listings
// ============================================================================

/// One clinic-for-sale listing in canonical shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    /// Assigned by the remote store; immutable
    pub id: String,
    pub name: String,
    /// `"{city}, {UF}"`
    pub location: String,
    pub price: Amount,
    pub monthly_revenue: Amount,
    pub description: String,
    /// Cover image; mirrors `gallery[0]`
    pub primary_image: ImagePayload,
    pub specialties: Vec<String>,
    /// Never empty, at most [`GALLERY_MAX`] entries
    pub gallery: Vec<ImagePayload>,
}

impl Clinic {
    /// Label shown on catalog cards
    pub fn headline_specialty(&self) -> &str {
        self.specialties
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_SPECIALTY)
    }

    /// Merge a patch in place; a replacement gallery also replaces the cover
    pub fn apply(&mut self, patch: &ClinicPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(revenue) = patch.monthly_revenue {
            self.monthly_revenue = revenue;
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(specialties) = &patch.specialties {
            self.specialties = specialties.clone();
        }
        if let Some(gallery) = &patch.gallery {
            if let Some(cover) = gallery.first() {
                self.primary_image = cover.clone();
            }
            self.gallery = gallery.clone();
        }
    }
}

/// A listing that has not been persisted yet (no id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicDraft {
    pub name: String,
    pub location: String,
    pub price: Amount,
    pub monthly_revenue: Amount,
    pub description: String,
    pub primary_image: ImagePayload,
    pub specialties: Vec<String>,
    #[serde(default)]
    pub gallery: Vec<ImagePayload>,
}

impl ClinicDraft {
    /// Apply creation defaults
    ///
    /// - no specialties selected → `["Geral"]`
    /// - no gallery → `[primary_image]`
    /// - otherwise the cover is `gallery[0]`
    pub fn normalized(mut self) -> Self {
        if self.specialties.is_empty() {
            self.specialties = vec![DEFAULT_SPECIALTY.to_string()];
        }
        match self.gallery.first() {
            Some(cover) => self.primary_image = cover.clone(),
            None => self.gallery = vec![self.primary_image.clone()],
        }
        self
    }
}

/// Partial update of a persisted listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub price: Option<Amount>,
    pub monthly_revenue: Option<Amount>,
    pub description: Option<String>,
    pub specialties: Option<Vec<String>>,
    /// Full replacement gallery; its first element becomes the cover
    pub gallery: Option<Vec<ImagePayload>>,
}

impl ClinicPatch {
    pub fn is_empty(&self) -> bool {
        self == &ClinicPatch::default()
    }

    pub fn price(price: Amount) -> Self {
        Self {
            price: Some(price),
            ..Self::default()
        }
    }

    pub fn gallery(gallery: Vec<ImagePayload>) -> Self {
        Self {
            gallery: Some(gallery),
            ..Self::default()
        }
    }
}
