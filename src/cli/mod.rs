//! House price CLI module
//!
//! Command-line interface for serving, training, prediction and model
//! chunk staging.

use clap::{Parser, Subcommand};
use colored::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::dataset::PropertyRecord;
use crate::inference::PredictionService;
use crate::model::TrainedModel;
use crate::staging;
use crate::training::{ModelType, ModelVariant, Trainer, TrainingConfig};

// ─── Output helpers ────────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}

fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

/// One aligned `label  value` line
fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<14} {}", muted(label), value);
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

/// Print a step without a newline; [`step_done`] completes the line
fn step_run(msg: &str) {
    print!("  {} {}... ", "›".cyan(), msg);
    let _ = std::io::stdout().flush();
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "house-price")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "House price prediction service and model staging tools")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction API
    Serve {
        /// Server host (defaults to API_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Server port (defaults to API_PORT or 5000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Train a model on a CSV dataset
    Train {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long, default_value = "price")]
        target: String,

        /// Training setup (generic, listing)
        #[arg(long, default_value = "generic")]
        variant: String,

        /// Comma-separated candidates (rf, linear, tree); overrides the variant's list
        #[arg(short, long)]
        models: Option<String>,

        /// Random seed for the split and the estimators
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output model file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Predict prices with a trained model
    Predict {
        /// Trained model file
        #[arg(short, long)]
        model: PathBuf,

        /// JSON file or inline JSON: one object or an array of objects
        #[arg(short, long)]
        input: String,
    },

    /// Split a model file into numbered chunks
    Split {
        /// Model file to split
        #[arg(short, long)]
        model: PathBuf,

        /// Chunk size in MiB
        #[arg(long, default_value = "80")]
        chunk_size_mb: u64,

        /// Directory for the chunks and manifest (defaults to the model's directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Rebuild a model file from its chunks
    Reconstruct {
        /// Directory holding the chunks and manifest
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { host, port } => cmd_serve(host, port).await,
        Commands::Train { data, target, variant, models, seed, output } => {
            cmd_train(&data, &target, &variant, models.as_deref(), seed, output.as_deref())
        }
        Commands::Predict { model, input } => cmd_predict(&model, &input),
        Commands::Split { model, chunk_size_mb, out_dir } => {
            cmd_split(&model, chunk_size_mb, out_dir.as_deref())
        }
        Commands::Reconstruct { dir } => cmd_reconstruct(&dir),
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Parse a comma-separated candidate list
pub fn parse_models(list: &str) -> anyhow::Result<Vec<ModelType>> {
    let models = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ModelType>())
        .collect::<Result<Vec<_>, _>>()?;

    if models.is_empty() {
        anyhow::bail!("No models given");
    }
    Ok(models)
}

pub fn cmd_train(
    data_path: &Path,
    target: &str,
    variant: &str,
    models: Option<&str>,
    seed: u64,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Train");

    let variant: ModelVariant = variant.parse()?;
    let mut config = TrainingConfig::for_variant(variant, target).with_random_seed(seed);
    if let Some(list) = models {
        config = config.with_candidates(parse_models(list)?);
    }

    step_run(&format!("Training on {}", data_path.display().to_string().cyan()));
    let start = Instant::now();
    let model = Trainer::new(config).fit_csv(data_path)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    println!();
    println!("  {:<24} {:>10} {:>12} {:>14}", muted("Model"), muted("R²"), muted("MAE"), muted("Time"));
    println!("  {}", dim(&"─".repeat(62)));
    for report in model.candidates() {
        let name = report.model_type.name();
        let marker = if report.model_type == model.model_type() { ok("*") } else { dim(" ") };
        println!(
            "  {:<24} {:>10.4} {:>12.2} {:>13.3}s {}",
            name, report.metrics.r2, report.metrics.mae, report.training_time_secs, marker
        );
    }
    println!("  {}", dim(&"─".repeat(62)));

    let metrics = model.metrics();
    println!();
    field("Selected", model.model_type().name().white().bold());
    field("MAE", format!("{:.4}", metrics.mae));
    field("MSE", format!("{:.4}", metrics.mse));
    field("R²", format!("{:.4} ({:.2}%)", metrics.r2, metrics.r2_percentage).white().bold());
    field("Train / test", format!("{} / {}", model.n_train_samples(), model.n_test_samples()));
    println!();

    if let Some(path) = output {
        model.save(path)?;
        step_ok(&format!("Model saved to {}", path.display()));
        println!();
    }

    Ok(())
}

/// Read records from a JSON file, or from the argument itself when it is not a file
pub fn load_records(input: &str) -> anyhow::Result<Vec<PropertyRecord>> {
    let text = if Path::new(input).is_file() {
        std::fs::read_to_string(input)?
    } else {
        input.to_string()
    };

    let value: serde_json::Value = serde_json::from_str(&text)?;
    let objects = match &value {
        serde_json::Value::Object(object) => vec![object],
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or_else(|| anyhow::anyhow!("Every array element must be a JSON object"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        _ => anyhow::bail!("Input must be a JSON object or an array of objects"),
    };

    objects
        .into_iter()
        .map(|object| PropertyRecord::from_json_object(object).map_err(Into::into))
        .collect()
}

pub fn cmd_predict(model_path: &Path, input: &str) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let model = TrainedModel::load(model_path)?;
    step_done(&format!("{} ({} features)", model.model_type().name(), model.schema().len()));

    let records = load_records(input)?;
    let prices = PredictionService::default().predict_batch(&model, &records)?;

    println!();
    for (i, price) in prices.iter().enumerate() {
        println!("  {:<8} {}", muted(&format!("#{}", i + 1)), format!("{:.2}", price).white().bold());
    }
    println!();

    Ok(())
}

pub fn cmd_split(model_path: &Path, chunk_size_mb: u64, out_dir: Option<&Path>) -> anyhow::Result<()> {
    section("Split");

    if chunk_size_mb == 0 {
        anyhow::bail!("Chunk size must be at least 1 MiB");
    }

    let out_dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => model_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    step_run(&format!("Splitting {}", model_path.display()));
    let manifest = staging::split_file(model_path, &out_dir, chunk_size_mb * 1024 * 1024)?;
    step_done(&format!("{} parts", manifest.total_parts));

    println!();
    field("Size", format!("{:.2} MB", manifest.total_size as f64 / (1024.0 * 1024.0)));
    for name in manifest.chunk_names() {
        step_ok(&name);
    }
    step_ok(&format!("Manifest written to {}", out_dir.join(staging::MANIFEST_FILE_NAME).display()));
    println!();

    Ok(())
}

pub fn cmd_reconstruct(dir: &Path) -> anyhow::Result<()> {
    section("Reconstruct");

    let manifest = staging::ChunkManifest::read(dir)?;
    step_run(&format!("Joining {} parts into {}", manifest.total_parts, manifest.original_filename));
    let path = staging::reconstruct(dir)?;
    step_done("size and sha256 verified");

    step_ok(&format!("Model reconstructed at {}", path.display()));
    println!();

    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: host.unwrap_or(defaults.host.clone()),
        port: port.unwrap_or(defaults.port),
        ..defaults
    };

    section(&format!("House Price API v{}", env!("CARGO_PKG_VERSION")));
    field("Health", format!("http://{}:{}/health", config.host, config.port));
    field("Predict", format!("http://{}:{}/predict", config.host, config.port));
    field("Dataset", config.dataset_path.display());
    field("Model", config.model_path.display());
    println!("  {}", dim("ctrl+c to stop"));
    println!();

    run_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_models() {
        let models = parse_models("rf, linear,tree").unwrap();
        assert_eq!(models, vec![ModelType::RandomForest, ModelType::LinearRegression, ModelType::DecisionTree]);
        assert!(parse_models("").is_err());
        assert!(parse_models("svm").is_err());
    }

    #[test]
    fn test_load_records_inline() {
        let one = load_records(r#"{"baths": 3, "city": "Lahore"}"#).unwrap();
        assert_eq!(one.len(), 1);

        let many = load_records(r#"[{"baths": 3}, {"baths": 4}]"#).unwrap();
        assert_eq!(many.len(), 2);

        assert!(load_records("[1, 2]").is_err());
        assert!(load_records("42").is_err());
    }

    #[test]
    fn test_load_records_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, r#"{"bedrooms": 2}"#).unwrap();
        assert_eq!(load_records(path.to_str().unwrap()).unwrap().len(), 1);
    }

    #[test]
    fn test_cli_parses_split() {
        let cli = Cli::try_parse_from(["house-price", "split", "--model", "m.bin", "--chunk-size-mb", "10"]).unwrap();
        match cli.command {
            Commands::Split { chunk_size_mb, .. } => assert_eq!(chunk_size_mb, 10),
            _ => panic!("expected split"),
        }
    }
}
