//! Built-in catalog shown when the remote store cannot be read

use rdc_common::models::DEFAULT_SPECIALTY;
use rdc_common::{Amount, Clinic, ImagePayload};

/// Id prefix marking listings that do not exist remotely
pub const PLACEHOLDER_ID_PREFIX: &str = "placeholder-";

const COVER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="500" viewBox="0 0 800 500"><rect width="800" height="500" fill="#0f172a"/><text x="400" y="260" fill="#e2e8f0" font-family="sans-serif" font-size="36" text-anchor="middle">Rei das Clínicas</text></svg>"##;

/// Neutral cover image for placeholder listings
pub fn placeholder_cover() -> ImagePayload {
    ImagePayload::from_bytes("image/svg+xml", COVER_SVG.as_bytes())
}

fn listing(
    n: u32,
    name: &str,
    location: &str,
    price: u64,
    revenue: u64,
    description: &str,
    specialty: &str,
) -> Clinic {
    let cover = placeholder_cover();
    Clinic {
        id: format!("{}{}", PLACEHOLDER_ID_PREFIX, n),
        name: name.to_string(),
        location: location.to_string(),
        price: Amount::from_cents(price * 100),
        monthly_revenue: Amount::from_cents(revenue * 100),
        description: description.to_string(),
        primary_image: cover.clone(),
        specialties: vec![specialty.to_string()],
        gallery: vec![cover],
    }
}

/// Fixed placeholder listings, newest first
pub fn builtin() -> Vec<Clinic> {
    vec![
        listing(
            3,
            "Clínica Odontológica Centro",
            "São Paulo, SP",
            450_000,
            85_000,
            "Quatro consultórios equipados, carteira ativa de pacientes.",
            "Odontologia",
        ),
        listing(
            2,
            "Centro de Estética Avançada",
            "Belo Horizonte, MG",
            320_000,
            60_000,
            "Ponto consolidado em bairro nobre, equipe treinada.",
            "Estética",
        ),
        listing(
            1,
            "Clínica Médica Integrada",
            "Curitiba, PR",
            780_000,
            140_000,
            "Atendimento multiespecialidades com convênios ativos.",
            DEFAULT_SPECIALTY,
        ),
    ]
}

pub fn is_placeholder(clinic: &Clinic) -> bool {
    clinic.id.starts_with(PLACEHOLDER_ID_PREFIX)
}
