use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use serde_json::Value;
use tracing::info;

use registry_floors::assemble::{self, FloorSummary};
use registry_floors::envelope;
use registry_floors::{BuildingQuery, EngineConfig, FetchBatchResult, RawRow, Reconciler};

#[derive(Parser)]
#[command(name = "registry_floors", about = "Per-floor summary from the building register")]
struct Cli {
    /// Extra config file (TOML/JSON/YAML); registry.toml in the cwd is read if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and reconcile the floor outline of one building
    Fetch {
        #[arg(long)]
        sigungu_cd: String,
        #[arg(long)]
        bjdong_cd: String,
        /// Land type (0 = land, 1 = mountain)
        #[arg(long)]
        plat_gb_cd: Option<String>,
        /// Main lot number
        #[arg(long)]
        bun: Option<String>,
        /// Sub lot number
        #[arg(long)]
        ji: Option<String>,
        /// Pretty-print the JSON summary
        #[arg(long)]
        pretty: bool,
    },
    /// Reconcile a saved response envelope (or a JSON array of rows) offline
    Summarize {
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// List endpoint candidates in priority order
    Endpoints,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch {
            sigungu_cd,
            bjdong_cd,
            plat_gb_cd,
            bun,
            ji,
            pretty,
        } => {
            let settings = load_config(cli.config.as_deref())?;
            let query = BuildingQuery {
                sigungu_cd,
                bjdong_cd,
                plat_gb_cd,
                bun,
                ji,
            };
            let engine = Reconciler::from_config(settings)?;
            let summary = engine
                .reconcile(&query)
                .await
                .context("Reconciliation aborted")?;
            print_summary(&summary, pretty)
        }
        Commands::Summarize { file, pretty } => {
            let batch = read_batch(&file)?;
            let summary = assemble::summarize(&batch);
            print_summary(&summary, pretty)
        }
        Commands::Endpoints => {
            let settings = load_config(cli.config.as_deref())?;
            for (i, e) in settings.endpoints.iter().enumerate() {
                println!("{:>2}. {:<40} {}", i + 1, e.name, e.url);
            }
            Ok(())
        }
    };

    info!("Done in {:.1}s", t0.elapsed().as_secs_f64());
    result
}

/// registry.toml (optional) → --config file → REGISTRY_* environment.
fn load_config(extra: Option<&Path>) -> Result<EngineConfig> {
    let mut builder =
        Config::builder().add_source(config::File::with_name("registry").required(false));
    if let Some(path) = extra {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder
        .add_source(config::Environment::with_prefix("REGISTRY"))
        .build()
        .context("Failed to load configuration")?;

    settings
        .try_deserialize::<EngineConfig>()
        .context("Invalid configuration")
}

fn read_batch(path: &Path) -> Result<FetchBatchResult> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not JSON", path.display()))?;

    let (total_count, rows) = match value {
        Value::Array(items) => {
            let rows: Vec<RawRow> = items.into_iter().filter_map(RawRow::from_value).collect();
            (rows.len() as u64, rows)
        }
        other => {
            let page = envelope::decode_json(&other)?;
            (page.total_count, page.rows)
        }
    };

    Ok(FetchBatchResult {
        endpoint_used: None,
        total_count,
        rows,
        failed_pages: Vec::new(),
    })
}

fn print_summary(summary: &FloorSummary, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(summary)?
    } else {
        serde_json::to_string(summary)?
    };
    println!("{}", out);
    Ok(())
}
