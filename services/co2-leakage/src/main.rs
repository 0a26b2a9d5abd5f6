//! CO2 leakage command line tool.
//!
//! Publishes surfaces from a directory store and summarizes containment
//! tables, printing results as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use co2_common::{Co2Scale, SurfaceAddress, TruncatedSurfaceAddress};
use co2_leakage::{
    ContainmentDataProvider, SurfacePublisher, SurfaceRequest, VisualizationConfig,
};
use storage::{DirectorySurfaceStore, InMemoryTableProvider};

#[derive(Parser, Debug)]
#[command(name = "co2-leakage")]
#[command(about = "CO2 leakage surface publishing and containment summaries")]
struct Args {
    /// Visualization configuration file (YAML)
    #[arg(short, long, env = "CO2_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the filter menu options of a containment table
    Menu {
        #[arg(long)]
        table: PathBuf,
    },

    /// Print one realization of a containment table, scaled
    Extract {
        #[arg(long)]
        table: PathBuf,
        #[arg(long)]
        realization: i32,
        #[arg(long, default_value = "tons")]
        scale: String,
    },

    /// Print the fully aggregated rows of a containment table
    Condensed {
        #[arg(long)]
        table: PathBuf,
        #[arg(long, default_value = "tons")]
        scale: String,
    },

    /// Publish one surface and print its metadata
    Publish {
        #[command(flatten)]
        surface: SurfaceArgs,
        #[arg(long)]
        attribute: String,
        #[arg(long)]
        realization: i32,
    },

    /// Publish a plume count surface over several realizations
    Truncate {
        #[command(flatten)]
        surface: SurfaceArgs,
        #[arg(long)]
        basis_attribute: String,
        /// Comma separated realization list, e.g. 0,1,2
        #[arg(long, value_delimiter = ',', required = true)]
        realizations: Vec<i32>,
        #[arg(long)]
        threshold: f64,
        #[arg(long, default_value_t = 0.0)]
        smoothing: f64,
    },
}

#[derive(clap::Args, Debug)]
struct SurfaceArgs {
    /// Root directory of the surface store
    #[arg(long)]
    surfaces: PathBuf,
    /// Ensemble identifier
    #[arg(long, default_value = "ensemble")]
    provider: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    date: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Menu { table } => {
            let provider = open_table(&table)?;
            print_json(provider.menu_options())?;
        }
        Command::Extract {
            table,
            realization,
            scale,
        } => {
            let provider = open_table(&table)?;
            let scale = parse_scale(&scale);
            let frame = provider.extract_dataframe(realization, &scale)?;
            print_json(&frame.to_records())?;
        }
        Command::Condensed { table, scale } => {
            let provider = open_table(&table)?;
            let frame = provider.extract_condensed_dataframe(&parse_scale(&scale))?;
            print_json(&frame.to_records())?;
        }
        Command::Publish {
            surface,
            attribute,
            realization,
        } => {
            let request = SurfaceRequest::Plain(SurfaceAddress::simulated(
                surface.name.clone(),
                attribute,
                surface.date.clone(),
                realization,
            ));
            publish(&surface, config, request).await?;
        }
        Command::Truncate {
            surface,
            basis_attribute,
            realizations,
            threshold,
            smoothing,
        } => {
            let request = SurfaceRequest::Truncated(TruncatedSurfaceAddress {
                name: surface.name.clone(),
                datestr: surface.date.clone(),
                realizations,
                basis_attribute,
                threshold,
                smoothing,
            });
            publish(&surface, config, request).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<VisualizationConfig> {
    let config = match path {
        Some(path) => {
            let mut config = VisualizationConfig::from_file(path)?;
            config.apply_env();
            config
        }
        None => VisualizationConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

fn open_table(path: &Path) -> Result<ContainmentDataProvider> {
    let provider_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "containment".to_string());
    let table = InMemoryTableProvider::from_json_file(provider_id, path)
        .with_context(|| format!("loading containment table {}", path.display()))?;
    Ok(ContainmentDataProvider::new(Arc::new(table))?)
}

fn parse_scale(tag: &str) -> Co2Scale {
    match tag.parse() {
        Ok(scale) => scale,
        Err(never) => match never {},
    }
}

async fn publish(
    surface: &SurfaceArgs,
    config: VisualizationConfig,
    request: SurfaceRequest,
) -> Result<()> {
    let store = DirectorySurfaceStore::new(surface.provider.clone(), &surface.surfaces);
    let publisher = SurfacePublisher::new(Arc::new(store), config);

    match publisher.publish_and_describe(&request).await? {
        Some(published) => {
            info!(url = %published.url, "Surface published");
            print_json(&published)?;
        }
        None => anyhow::bail!("surface not found in {}", surface.surfaces.display()),
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
