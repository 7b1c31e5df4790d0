// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use geojson::JsonObject;
use patrolzones::export::feature_collection;
use patrolzones::kmeans::InitStrategy;
use patrolzones::{Geolocated, PipelineConfig, generate_patrol_zones};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Full pipeline result
    Json,
    /// Boundary lines and incident markers as a FeatureCollection
    Geojson,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Cluster incident locations into patrol zones", long_about = None)]
struct Args {
    /// Incident CSV with latitude and longitude columns
    #[arg(short, long)]
    input: PathBuf,
    /// Number of patrol zones to generate
    #[arg(short = 'n', long, default_value_t = 5)]
    zones: usize,
    /// RON pipeline config. Falls back to PATROLZONES_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the clustering seed
    #[arg(long)]
    seed: Option<u64>,
    /// Override the alpha shape radius
    #[arg(long)]
    alpha: Option<f64>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Write here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
struct IncidentRecord {
    #[serde(
        default,
        alias = "lat",
        alias = "Latitude",
        deserialize_with = "csv::invalid_option"
    )]
    latitude: Option<f64>,
    #[serde(
        default,
        alias = "lon",
        alias = "Longitude",
        deserialize_with = "csv::invalid_option"
    )]
    longitude: Option<f64>,
    #[serde(default, alias = "Severity")]
    severity: Option<String>,
}

impl Geolocated for IncidentRecord {
    fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    fn longitude(&self) -> Option<f64> {
        self.longitude
    }
}

fn read_incidents(path: &Path) -> Result<Vec<IncidentRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut records = Vec::new();
    let mut skipped = 0;
    for row in reader.deserialize::<IncidentRecord>() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                tracing::debug!("skipping unreadable row: {}", e);
            }
        }
    }

    tracing::info!(read = records.len(), skipped, "loaded incidents from {}", path.display());
    Ok(records)
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| std::env::var_os("PATROLZONES_CONFIG").map(PathBuf::from));

    let mut config = match path {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.kmeans.init = InitStrategy::Random { seed };
    }
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    config.validate()?;

    Ok(config)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    let records = read_incidents(&args.input)?;
    let zones = generate_patrol_zones(&records, args.zones, &config)?;

    if zones.boundary.is_empty() {
        tracing::warn!("not enough data to outline any patrol zone");
    }

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    match args.format {
        OutputFormat::Json => serde_json::to_writer_pretty(&mut writer, &zones)?,
        OutputFormat::Geojson => {
            let collection = feature_collection(&zones, |point| {
                let mut properties = JsonObject::new();
                if let Some(severity) = &records[point.source].severity {
                    properties.insert("severity".to_string(), severity.clone().into());
                }
                properties
            });
            serde_json::to_writer_pretty(&mut writer, &collection)?;
        }
    }
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
