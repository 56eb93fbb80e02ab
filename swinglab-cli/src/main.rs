//! SwingLab CLI — run the candidate-evaluation pipeline from the shell.
//!
//! Commands:
//! - `run` — execute the pipeline against a JSON data fixture and print the
//!   markdown report (optionally exporting artifacts to a directory)
//! - `sample` — write the bundled synthetic fixture for experimentation

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use swinglab_runner::{
    run_pipeline, sample_fixture, FixtureProvider, PipelineConfig, PipelineRequest,
};

#[derive(Parser)]
#[command(name = "swinglab", about = "SwingLab — staged equity candidate evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline against a resolved JSON data fixture.
    Run {
        /// Path to the fixture JSON (snapshot, sector universe, bundles).
        #[arg(long)]
        data: PathBuf,

        /// As-of date (YYYY-MM-DD). Defaults to the fixture snapshot date.
        #[arg(long)]
        as_of: Option<String>,

        /// Account balance the position sizing works from.
        #[arg(long, default_value_t = 100_000_000.0)]
        balance: f64,

        /// Evaluate exactly these tickers instead of screening sectors.
        /// Repeatable.
        #[arg(long = "ticker")]
        tickers: Vec<String>,

        /// Bypass the regime gate and sector screen entirely (requires
        /// --ticker).
        #[arg(long, default_value_t = false)]
        force_analysis: bool,

        /// Pipeline config TOML. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for report.json / report.md / plans.csv.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write the bundled synthetic fixture to a JSON file.
    Sample {
        /// Output path.
        #[arg(long, default_value = "fixture.json")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    match Cli::parse().command {
        Commands::Run {
            data,
            as_of,
            balance,
            tickers,
            force_analysis,
            config,
            out,
        } => {
            let raw = std::fs::read_to_string(&data)
                .with_context(|| format!("reading fixture {}", data.display()))?;
            let fixture = FixtureProvider::from_json(&raw).context("parsing fixture JSON")?;

            let as_of = match as_of {
                Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .with_context(|| format!("invalid --as-of '{s}'"))?,
                None => match &fixture.snapshot {
                    Some(snapshot) => snapshot.as_of,
                    None => bail!("fixture has no snapshot; pass --as-of explicitly"),
                },
            };

            let config = match config {
                Some(path) => PipelineConfig::load(&path)?,
                None => PipelineConfig::default(),
            };

            let request = PipelineRequest {
                as_of,
                tickers: (!tickers.is_empty()).then_some(tickers),
                account_balance: balance,
                force_analysis,
            };

            let report = run_pipeline(&fixture, &request, &config)?;
            println!("{}", report.to_markdown());

            if let Some(dir) = out {
                report.save_artifacts(&dir)?;
                eprintln!("artifacts written to {}", dir.display());
            }
        }
        Commands::Sample { out } => {
            let fixture = sample_fixture();
            std::fs::write(&out, fixture.to_json()?)
                .with_context(|| format!("writing {}", out.display()))?;
            eprintln!("sample fixture written to {}", out.display());
        }
    }

    Ok(())
}
