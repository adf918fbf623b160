//! CLI entry point for training the fertilizer classifier.

use agrisense_learning::{ArtifactStore, TrainerConfig, TrainingReport, load_dataset, train};
use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "agrisense-train",
    version,
    about = "Train the fertilizer recommendation classifier",
    long_about = "Trains a random forest fertilizer classifier from a soil readings CSV\n\
                  and writes the model plus its category encoders to an artifact\n\
                  directory.\n\n\
                  EXAMPLES:\n  \
                  # Train with defaults\n  \
                  agrisense-train -i data_core.csv\n\n  \
                  # Custom artifact directory and seed\n  \
                  agrisense-train -i data_core.csv -o artifacts/ --seed 7\n\n  \
                  # Machine-readable report\n  \
                  agrisense-train -i data_core.csv --json | jq .accuracy"
)]
struct Args {
    /// Path to the training CSV file
    #[arg(short, long)]
    input: PathBuf,

    /// Directory to write the model and encoder artifacts to
    #[arg(short, long, default_value = "./artifacts")]
    output: PathBuf,

    /// Number of trees in the forest
    #[arg(long, default_value = "100")]
    n_trees: usize,

    /// Maximum tree depth
    #[arg(long, default_value = "10")]
    max_depth: usize,

    /// Minimum samples required to attempt a split
    #[arg(long, default_value = "4")]
    min_samples_split: usize,

    /// Minimum samples each side of a split must retain
    #[arg(long, default_value = "2")]
    min_samples_leaf: usize,

    /// Held-out fraction for evaluation
    #[arg(long, default_value = "0.2")]
    test_size: f64,

    /// Random seed for the split and bootstrap draws
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Disable balanced class weights
    #[arg(long, default_value = "false")]
    no_balance: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Output the training report as JSON to stdout
    ///
    /// Disables all progress logs; only the JSON report is written.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled so stdout
/// carries only the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = TrainerConfig::builder()
        .n_trees(args.n_trees)
        .max_depth(args.max_depth)
        .min_samples_split(args.min_samples_split)
        .min_samples_leaf(args.min_samples_leaf)
        .test_size(args.test_size)
        .seed(args.seed)
        .balance_classes(!args.no_balance)
        .build()?;

    info!("Loading dataset from: {}", args.input.display());
    let df = load_dataset(&args.input)?;

    let (bundle, report) = train(&df, &config)?;

    let store = ArtifactStore::new(&args.output);
    store.save(&bundle)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&report, &store);
    Ok(())
}

/// Print a human-readable training summary.
///
/// Uses `println!` intentionally: this is the primary CLI output and should
/// be visible regardless of log level.
fn print_summary(report: &TrainingReport, store: &ArtifactStore) {
    println!();
    println!("{}", "=".repeat(70));
    println!("TRAINING COMPLETE");
    println!("{}", "=".repeat(70));
    println!();
    println!(
        "Rows: {} train / {} held out",
        report.train_rows, report.test_rows
    );
    println!("Held-out accuracy: {:.3}", report.accuracy);
    println!();

    println!("Per-class report:");
    println!(
        "{:<20} {:>9} {:>9} {:>9} {:>9}",
        "Fertilizer", "Precision", "Recall", "F1", "Support"
    );
    println!("{}", "-".repeat(60));
    for class in &report.class_reports {
        println!(
            "{:<20} {:>9.3} {:>9.3} {:>9.3} {:>9}",
            class.label, class.precision, class.recall, class.f1, class.support
        );
    }
    println!();

    println!("Feature importance:");
    for (name, importance) in &report.feature_importance {
        println!("  {:<16} {:.4}", name, importance);
    }
    println!();

    println!("Artifacts written to: {}", store.dir().display());
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(70));
}
