//! rdc-catalog - Clinic catalog administration
//!
//! Lists, creates, edits and removes clinic-for-sale listings in the hosted
//! store, with the same validation, photo compression and fallback rules as
//! the storefront.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rdc_catalog::forms::{EditForm, ListingForm};
use rdc_catalog::{CatalogSync, RemoveOutcome};
use rdc_common::config::{self, LoggingConfig, StoreOverrides, TomlConfig};
use rdc_common::{Clinic, StateCode};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rdc-catalog", version, about = "Clinic catalog administration")]
struct Cli {
    /// Config file (defaults to <config dir>/rei-das-clinicas/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Remote store URL
    #[arg(long, global = true)]
    store_url: Option<String>,

    /// Remote store anon key
    #[arg(long, global = true)]
    anon_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every listing, newest first
    List,
    /// Show one listing as JSON
    Show { id: String },
    /// Create a listing
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        city: String,
        #[arg(long, default_value = "SP")]
        state: String,
        /// Masked amount; digits are read as cents (e.g. 150.000,00)
        #[arg(long, default_value = "")]
        price: String,
        /// Masked amount; digits are read as cents
        #[arg(long, default_value = "")]
        revenue: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "specialty")]
        specialties: Vec<String>,
        /// Photo files; the first one becomes the cover
        #[arg(long = "photo", required = true)]
        photos: Vec<PathBuf>,
    },
    /// Edit listing fields
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        revenue: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Append a photo to a listing's gallery
    AddPhoto { id: String, photo: PathBuf },
    /// Remove a photo from a listing's gallery (0-based index)
    RemovePhoto { id: String, index: usize },
    /// Delete a listing
    Remove {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let toml_config = config::load_or_default(cli.config.as_deref())?;
    init_tracing(&toml_config.logging)?;

    info!("Starting rdc-catalog v{}", env!("CARGO_PKG_VERSION"));

    let overrides = StoreOverrides {
        url: cli.store_url.clone(),
        anon_key: cli.anon_key.clone(),
    };
    let resolved = config::resolve_store(&overrides, &toml_config.store)?;
    let catalog = rdc_catalog::connect(&resolved)?;

    run(cli.command, &catalog, &toml_config).await
}

async fn run(command: Command, catalog: &CatalogSync, toml_config: &TomlConfig) -> Result<()> {
    let images = &toml_config.images;

    match command {
        Command::List => {
            for clinic in catalog.load_all().await {
                print_summary(&clinic);
            }
        }
        Command::Show { id } => {
            let clinic = find(catalog, &id).await?;
            println!("{}", listing_json(&clinic)?);
        }
        Command::Add {
            name,
            city,
            state,
            price,
            revenue,
            description,
            specialties,
            photos,
        } => {
            let mut form = ListingForm::new(images);
            form.name = name;
            form.city = city;
            form.state = parse_state(&state)?;
            form.set_price_input(&price);
            form.set_revenue_input(&revenue);
            form.description = description;
            for label in &specialties {
                form.specialties.add_custom(label);
            }
            for path in &photos {
                let bytes = read_photo(path).await?;
                form.gallery.add(&bytes).await?;
            }

            let draft = form.to_draft()?;
            let clinic = catalog.create(draft).await?;
            println!("Created listing {}", clinic.id);
        }
        Command::Edit {
            id,
            name,
            city,
            state,
            price,
            revenue,
            description,
        } => {
            let clinic = find(catalog, &id).await?;
            let mut form = EditForm::from_clinic(&clinic, images);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(city) = city {
                form.city = city;
            }
            if let Some(state) = state {
                form.state = parse_state(&state)?;
            }
            if let Some(price) = price {
                form.set_price_input(&price);
            }
            if let Some(revenue) = revenue {
                form.set_revenue_input(&revenue);
            }
            if let Some(description) = description {
                form.description = description;
            }

            let updated = catalog.update(&id, form.to_patch()?).await?;
            print_summary(&updated);
        }
        Command::AddPhoto { id, photo } => {
            let clinic = find(catalog, &id).await?;
            let mut form = EditForm::from_clinic(&clinic, images);
            let bytes = read_photo(&photo).await?;
            form.gallery.add(&bytes).await?;

            let updated = catalog.update(&id, form.to_patch()?).await?;
            println!("Listing {} now has {} photos", updated.id, updated.gallery.len());
        }
        Command::RemovePhoto { id, index } => {
            let clinic = find(catalog, &id).await?;
            let mut form = EditForm::from_clinic(&clinic, images);
            form.gallery.remove_at(index)?;

            let updated = catalog.update(&id, form.to_patch()?).await?;
            println!("Listing {} now has {} photos", updated.id, updated.gallery.len());
        }
        Command::Remove { id, yes } => {
            find(catalog, &id).await?;
            let outcome = catalog
                .remove(&id, |clinic| yes || confirm_removal(clinic))
                .await?;
            match outcome {
                RemoveOutcome::Removed => println!("Removed listing {}", id),
                RemoveOutcome::Cancelled => println!("Cancelled"),
            }
        }
    }

    Ok(())
}

/// Load the catalog and look one listing up
async fn find(catalog: &CatalogSync, id: &str) -> Result<Clinic> {
    catalog.load_all().await;
    match catalog.get(id).await {
        Some(clinic) => Ok(clinic),
        None => bail!("Listing not found: {}", id),
    }
}

fn parse_state(raw: &str) -> Result<StateCode> {
    raw.parse::<StateCode>()
        .map_err(|_| rdc_catalog::ValidationError::InvalidState(raw.to_string()).into())
}

async fn read_photo(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read photo {}", path.display()))
}

fn confirm_removal(clinic: &Clinic) -> bool {
    print!(
        "Are you sure you want to remove \"{}\" ({})? [y/N] ",
        clinic.name, clinic.location
    );
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "sim")
}

fn listing_json(clinic: &Clinic) -> serde_json::Result<String> {
    serde_json::to_string_pretty(clinic)
}

fn print_summary(clinic: &Clinic) {
    println!(
        "{:<14} {:<40} {:<28} R$ {:>16}  R$ {:>14}/mês  {:<16} {} photo(s)",
        clinic.id,
        clinic.name,
        clinic.location,
        clinic.price,
        clinic.monthly_revenue,
        clinic.headline_specialty(),
        clinic.gallery.len()
    );
}
