//! `tde-classify`: classify trajectory files against a registry of models.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use tde_classifier::{ClassifierConfig, OutputFormat, Session};

// --- CLI Arguments ---
#[derive(Parser, Debug)]
#[command(version, about = "Classify sensor trajectories against time-delay embedding models", long_about = None)]
struct Args {
    /// Registry file listing one model descriptor path per line
    #[arg(short, long)]
    models: PathBuf,

    /// Trajectory files to classify
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (single input only; defaults to <input>.dmp)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of nearest neighbours averaged per point
    #[arg(short = 'k', long)]
    neighbors: Option<usize>,

    /// Match window length in embedded points
    #[arg(short = 's', long)]
    match_steps: Option<usize>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Zero-based input columns to read (repeatable)
    #[arg(long = "column")]
    columns: Vec<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => Self::Text,
            Format::Json => Self::Json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.output.is_some() && args.inputs.len() > 1 {
        bail!("--output can only be used with a single input");
    }

    let mut config = match &args.config {
        Some(path) => ClassifierConfig::from_json_file(path)?,
        None => ClassifierConfig::default(),
    };
    if let Some(k) = args.neighbors {
        config.neighbors = k;
    }
    if let Some(steps) = args.match_steps {
        config.match_steps = steps;
    }
    if let Some(format) = args.format {
        config.output_format = format.into();
    }
    if !args.columns.is_empty() {
        config.reader.columns = Some(args.columns.clone());
    }

    let mut session = Session::open(&args.models, config)
        .with_context(|| format!("loading models from {}", args.models.display()))?;

    for input in &args.inputs {
        let result = session
            .classify_file(input, args.output.as_deref())
            .with_context(|| format!("classifying {}", input.display()))?;
        println!("{}\t{}", input.display(), result.len());
    }

    session.teardown();
    Ok(())
}
