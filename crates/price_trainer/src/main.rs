//! Agriprice trainer CLI
//!
//! Fits a market's price model (and optionally its encoders) from the
//! market's training CSV and writes the artifacts the dashboard loads.

use agriprice_core::{ArtifactLayout, FeatureSchema};
use agriprice_trainer::{build_dataset, fit_encoders, ForestConfig, ForestTrainer, TrainingLog};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaArg {
    /// vegetable, variety, temperature, rainfall, province, market, month, day of year
    Dated,
    /// same without the calendar columns
    Undated,
}

impl From<SchemaArg> for FeatureSchema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Dated => FeatureSchema::dated(),
            SchemaArg::Undated => FeatureSchema::undated(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "agriprice-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fit a per-market price forest from its training CSV", long_about = None)]
struct Args {
    /// Selling market name, e.g. "Nuwara Eliya"
    #[arg(short, long)]
    market: String,

    /// Training CSV (vegetable,variety,temperature,rainfall,province,selling_market,Month,DayOfYear,price)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory holding model and encoder files
    #[arg(short, long, default_value = "models")]
    output: PathBuf,

    /// Fit new encoders from the CSV instead of loading the existing ones
    #[arg(long)]
    fit_encoders: bool,

    #[arg(long, value_enum, default_value = "dated")]
    schema: SchemaArg,

    /// Number of trees
    #[arg(long, default_value = "100")]
    trees: usize,

    /// Maximum tree depth
    #[arg(long, default_value = "12")]
    max_depth: usize,

    /// Minimum samples per leaf
    #[arg(long, default_value = "1")]
    min_samples_leaf: usize,

    /// Seed for bootstrap sampling
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Agriprice trainer v{}", env!("CARGO_PKG_VERSION"));

    let log = TrainingLog::new(&args.input);
    let rows = log
        .read_all()
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    anyhow::ensure!(!rows.is_empty(), "{} has no rows", args.input.display());
    info!("Loaded {} training rows for {}", rows.len(), args.market);

    let layout = ArtifactLayout::new(&args.output);
    let encoders = if args.fit_encoders {
        let encoders = fit_encoders(&rows);
        layout
            .save_encoders(&args.market, &encoders)
            .context("Failed to write encoders")?;
        info!(
            "Fitted encoders: {} vegetables, {} varieties, {} provinces, {} markets",
            encoders.vegetable.classes().len(),
            encoders.variety.classes().len(),
            encoders.province.classes().len(),
            encoders.market.classes().len()
        );
        encoders
    } else {
        layout
            .load_encoders(&args.market)
            .context("Failed to load encoders; pass --fit-encoders to create them")?
    };

    let schema = FeatureSchema::from(args.schema);
    let dataset = build_dataset(&rows, &encoders, &schema)?;
    for (name, (min, max)) in schema.names().iter().zip(dataset.feature_stats()) {
        info!("  {}: min={} max={}", name, min, max);
    }

    let config = ForestConfig {
        num_trees: args.trees,
        max_depth: args.max_depth,
        min_samples_leaf: args.min_samples_leaf,
        seed: args.seed,
    };
    info!(
        "Training {} trees (max depth {}, min leaf {}, seed {})",
        config.num_trees, config.max_depth, config.min_samples_leaf, config.seed
    );

    let model = ForestTrainer::new(config).train(&dataset, schema, &args.market)?;
    let path = layout
        .write_model(&args.market, &model)
        .context("Failed to write model")?;

    info!("Model written to {}", path.display());
    info!("Model hash: {}", model.hash_hex()?);
    Ok(())
}
