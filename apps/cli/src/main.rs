#![deny(warnings)]

//! Headless CLI for creating, editing and pricing property documents.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use estate_core::{Catalog, GridSize, PropertyDocument, TileCategory};
use estate_econ::aggregate;
use estate_grid::BlockRequest;
use estate_runtime::Session;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ESTATE_GIT_SHA"),
    ", ",
    env!("ESTATE_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "estate", version, long_version = LONG_VERSION)]
#[command(about = "Design and price grid-based properties", long_about = None)]
struct Cli {
    /// Catalog YAML to use instead of the bundled one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List countries, subregions, traits, tiles and qualities
    Catalog,
    /// Create a property document with an empty grid
    New {
        #[arg(long)]
        country: String,
        /// Subregion name
        #[arg(long)]
        region: String,
        /// Trait to select; repeat for several
        #[arg(long = "trait")]
        traits: Vec<String>,
        /// Grid size as <x>x<y>, one of the catalog's sizes
        #[arg(long)]
        size: GridSize,
        #[arg(long, default_value = "New Property")]
        name: String,
        #[arg(long, default_value = "")]
        player: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print multipliers and totals for a document
    Price {
        file: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Place a tile into a document and save it in place
    Place {
        file: PathBuf,
        #[arg(long)]
        x: usize,
        #[arg(long)]
        y: usize,
        #[arg(long, default_value_t = 0)]
        level: usize,
        /// Tile kind display name
        #[arg(long)]
        tile: String,
        #[arg(long)]
        quality: Option<String>,
    },
    /// Check that a document parses and every name in it resolves
    Check { file: PathBuf },
    /// Write the download form of a document into a directory
    Export {
        file: PathBuf,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(p) => Catalog::load(p).with_context(|| format!("loading catalog {}", p.display())),
        None => Catalog::builtin().context("loading bundled catalog"),
    }
}

fn load_document(path: &Path) -> Result<PropertyDocument> {
    persistence::load(path).with_context(|| format!("reading {}", path.display()))
}

fn print_catalog(catalog: &Catalog) {
    println!("Countries:");
    for country in catalog.countries() {
        println!("  {}", country.name);
        for region in &country.regions {
            println!("    {}", region.name);
            for s in &region.subregions {
                println!(
                    "      {} | danger {} | land {} | build {} | tp {} | traits: {}",
                    s.name,
                    s.danger_level,
                    s.land_cost,
                    s.build_cost,
                    s.tp_value,
                    s.traits.join(", ")
                );
            }
        }
    }
    println!("Traits:");
    for t in catalog.traits() {
        if t.exclusive_with.is_empty() {
            println!("  {} - {}", t.name, t.description);
        } else {
            println!(
                "  {} - {} (excludes {})",
                t.name,
                t.description,
                t.exclusive_with.join(", ")
            );
        }
    }
    for (label, category) in [
        ("Indoor", TileCategory::Indoor),
        ("Outdoor", TileCategory::Outdoor),
        ("Special", TileCategory::Special),
    ] {
        println!("{label} tiles:");
        for k in catalog.tile_kinds_in(category) {
            println!(
                "  {} | {} gp | {} tp | qualities: {}",
                k.display_name,
                k.base_gold_cost,
                k.base_tp_cost,
                k.possible_qualities.join(", ")
            );
        }
    }
    println!("Qualities:");
    for q in catalog.qualities() {
        println!("  {} ({})", q.name, q.icon);
    }
    let sizes: Vec<String> = catalog.grid_sizes().iter().map(GridSize::to_string).collect();
    println!("Grid sizes: {}", sizes.join(", "));
}

fn print_header(doc: &PropertyDocument) {
    println!(
        "{} - {} - {}",
        doc.property_name,
        doc.country().unwrap_or("(no country)"),
        doc.region().unwrap_or("(no region)")
    );
    if !doc.region_traits_selected.is_empty() {
        println!("Traits: {}", doc.region_traits_selected.join(", "));
    }
}

#[allow(clippy::too_many_arguments)]
fn run_new(
    catalog: &Catalog,
    country: &str,
    region: &str,
    traits: &[String],
    size: GridSize,
    name: String,
    player: String,
    out: &Path,
) -> Result<()> {
    let mut session = Session::new(catalog);
    session.set_identity(name, player);
    session.start_new()?;
    session.select_country(country)?;
    session.next()?;
    session.select_region(region)?;
    session.next()?;
    for t in traits {
        session.toggle_trait(t)?;
    }
    session.next()?;
    session.select_grid_size(size)?;
    session.next()?;
    persistence::save(out, session.document())
        .with_context(|| format!("writing {}", out.display()))?;
    print_header(session.document());
    println!("{}", session.totals()?);
    Ok(())
}

fn run_place(
    catalog: &Catalog,
    file: &Path,
    level: usize,
    x: usize,
    y: usize,
    request: BlockRequest,
) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let mut session = Session::new(catalog);
    session.load(&text)?;
    session.set_level(level)?;
    session.place(x, y, &request)?;
    persistence::save(file, session.document())
        .with_context(|| format!("writing {}", file.display()))?;
    println!("{}", session.totals()?);
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup; RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = load_catalog(cli.catalog.as_deref())?;
    info!(countries = catalog.countries().len(), "catalog ready");

    match cli.command {
        Commands::Catalog => print_catalog(&catalog),
        Commands::New {
            country,
            region,
            traits,
            size,
            name,
            player,
            out,
        } => run_new(&catalog, &country, &region, &traits, size, name, player, &out)?,
        Commands::Price { file, json } => {
            let doc = load_document(&file)?;
            let totals = aggregate(&catalog, &doc)?;
            if json {
                let out = serde_json::json!({
                    "totals": totals,
                    "rounded": totals.rounded(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_header(&doc);
                println!("{totals}");
            }
        }
        Commands::Place {
            file,
            x,
            y,
            level,
            tile,
            quality,
        } => run_place(&catalog, &file, level, x, y, BlockRequest::kind(tile, quality))?,
        Commands::Check { file } => {
            let doc = load_document(&file)?;
            aggregate(&catalog, &doc).with_context(|| format!("checking {}", file.display()))?;
            println!(
                "OK: {} | {} grid | {} tiles",
                doc.property_name,
                doc.grid_size(),
                doc.tile_count()
            );
        }
        Commands::Export { file, dir } => {
            let doc = load_document(&file)?;
            let export = persistence::export(&doc)?;
            fs::create_dir_all(&dir)?;
            let path = dir.join(export.file_name);
            fs::write(&path, export.body)?;
            println!("Wrote {} ({})", path.display(), export.mime_type);
        }
    }

    Ok(())
}
