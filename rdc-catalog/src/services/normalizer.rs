//! Record normalizer
//!
//! The only conversion boundary between remote rows and the canonical
//! [`Clinic`] shape, in both directions. Reading is total: rows written by
//! older versions of the app (no gallery column, camelCase revenue) and rows
//! with unexpected value types degrade to defaults instead of failing.

use crate::store::Row;
use rdc_common::models::DEFAULT_SPECIALTY;
use rdc_common::{Amount, Clinic, ClinicDraft, ClinicPatch, ImagePayload};
use serde_json::{json, Value};

/// Remote column names of the listings table
pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "nome";
    pub const LOCATION: &str = "localizacao";
    pub const PRICE: &str = "preco";
    pub const MONTHLY_REVENUE: &str = "faturamento_mensal";
    /// Written by early versions of the app
    pub const MONTHLY_REVENUE_LEGACY: &str = "faturamentoMensal";
    pub const DESCRIPTION: &str = "descricao";
    pub const IMAGE: &str = "imagem";
    pub const GALLERY: &str = "fotos";
    pub const SPECIALTIES: &str = "especialidades";
}

/// A listings row exactly as the remote store returned it
///
/// Every field is optional and untyped; [`normalize`] is the only way to
/// turn it into a [`Clinic`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawClinicRow {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub location: Option<Value>,
    pub price: Option<Value>,
    pub monthly_revenue: Option<Value>,
    pub monthly_revenue_legacy: Option<Value>,
    pub description: Option<Value>,
    pub image: Option<Value>,
    pub gallery: Option<Value>,
    pub specialties: Option<Value>,
}

impl From<&Row> for RawClinicRow {
    fn from(row: &Row) -> Self {
        let field = |name: &str| row.get(name).filter(|v| !v.is_null()).cloned();
        Self {
            id: field(columns::ID),
            name: field(columns::NAME),
            location: field(columns::LOCATION),
            price: field(columns::PRICE),
            monthly_revenue: field(columns::MONTHLY_REVENUE),
            monthly_revenue_legacy: field(columns::MONTHLY_REVENUE_LEGACY),
            description: field(columns::DESCRIPTION),
            image: field(columns::IMAGE),
            gallery: field(columns::GALLERY),
            specialties: field(columns::SPECIALTIES),
        }
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn amount(value: Option<&Value>) -> Option<Amount> {
    value.and_then(Amount::from_json)
}

fn strings(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

/// Map a raw row onto the canonical shape
///
/// - revenue: `faturamento_mensal`, else `faturamentoMensal`, else zero
/// - gallery: the `fotos` array when present and non-empty, else `[imagem]`
/// - cover: `imagem`, else the first gallery photo
/// - specialties: the stored labels, else `["Geral"]`
pub fn normalize(raw: &RawClinicRow) -> Clinic {
    let stored_image = match raw.image.as_ref() {
        Some(Value::String(s)) if !s.is_empty() => Some(ImagePayload::new(s.clone())),
        _ => None,
    };

    let stored_gallery: Vec<ImagePayload> = strings(raw.gallery.as_ref())
        .unwrap_or_default()
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(ImagePayload::new)
        .collect();

    let primary_image = stored_image
        .or_else(|| stored_gallery.first().cloned())
        .unwrap_or_else(|| ImagePayload::new(String::new()));

    let gallery = if stored_gallery.is_empty() {
        vec![primary_image.clone()]
    } else {
        stored_gallery
    };

    let specialties = strings(raw.specialties.as_ref())
        .filter(|labels| !labels.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_SPECIALTY.to_string()]);

    Clinic {
        id: text(raw.id.as_ref()),
        name: text(raw.name.as_ref()),
        location: text(raw.location.as_ref()),
        price: amount(raw.price.as_ref()).unwrap_or_default(),
        monthly_revenue: amount(raw.monthly_revenue.as_ref())
            .or_else(|| amount(raw.monthly_revenue_legacy.as_ref()))
            .unwrap_or_default(),
        description: text(raw.description.as_ref()),
        primary_image,
        specialties,
        gallery,
    }
}

/// Convenience: normalize straight from a remote row
pub fn normalize_row(row: &Row) -> Clinic {
    normalize(&RawClinicRow::from(row))
}

fn images(photos: &[ImagePayload]) -> Value {
    Value::Array(photos.iter().map(|p| json!(p.as_str())).collect())
}

/// Insert payload for a (normalized) draft, including the gallery column
pub fn draft_row(draft: &ClinicDraft) -> Row {
    let mut row = Row::new();
    row.insert(columns::NAME.into(), json!(draft.name));
    row.insert(columns::LOCATION.into(), json!(draft.location));
    row.insert(columns::PRICE.into(), json!(draft.price.as_f64()));
    row.insert(
        columns::MONTHLY_REVENUE.into(),
        json!(draft.monthly_revenue.as_f64()),
    );
    row.insert(columns::DESCRIPTION.into(), json!(draft.description));
    row.insert(columns::IMAGE.into(), json!(draft.primary_image.as_str()));
    row.insert(columns::SPECIALTIES.into(), json!(draft.specialties));
    row.insert(columns::GALLERY.into(), images(&draft.gallery));
    row
}

/// Update payload for a patch; a gallery also rewrites the cover column
pub fn patch_row(patch: &ClinicPatch) -> Row {
    let mut row = Row::new();
    if let Some(name) = &patch.name {
        row.insert(columns::NAME.into(), json!(name));
    }
    if let Some(location) = &patch.location {
        row.insert(columns::LOCATION.into(), json!(location));
    }
    if let Some(price) = patch.price {
        row.insert(columns::PRICE.into(), json!(price.as_f64()));
    }
    if let Some(revenue) = patch.monthly_revenue {
        row.insert(columns::MONTHLY_REVENUE.into(), json!(revenue.as_f64()));
    }
    if let Some(description) = &patch.description {
        row.insert(columns::DESCRIPTION.into(), json!(description));
    }
    if let Some(specialties) = &patch.specialties {
        row.insert(columns::SPECIALTIES.into(), json!(specialties));
    }
    if let Some(gallery) = &patch.gallery {
        if let Some(cover) = gallery.first() {
            row.insert(columns::IMAGE.into(), json!(cover.as_str()));
        }
        row.insert(columns::GALLERY.into(), images(gallery));
    }
    row
}
