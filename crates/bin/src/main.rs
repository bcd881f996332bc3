//! iporisk CLI binary.
//!
//! Projects the risk metrics of a new listing from its closest reference
//! peers.

mod integration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use integration::config::{Overrides, load_config};
use integration::query_input::{AttributeArgs, build_query};
use iporisk::Subsector;
use iporisk_data::load_reference;
use iporisk_model::RiskProjector;
use iporisk_output::{ExportFormat, Exporter, ProjectionExport, ReportBuilder};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "iporisk")]
#[command(about = "iporisk: peer-based risk projection for IPO stocks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Project risk metrics for a new listing
    Project {
        /// Reference dataset (CSV)
        #[arg(long)]
        dataset: PathBuf,

        /// Query record (JSON); attribute flags override its values
        #[arg(long)]
        query: Option<PathBuf>,

        /// Sub-sector of the new listing
        #[arg(long)]
        subsector: Option<String>,

        #[command(flatten)]
        attributes: AttributeArgs,

        /// Projection configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of peers to average
        #[arg(long)]
        top_k: Option<usize>,

        /// Use the grid-sampled membership function
        #[arg(long)]
        discretized: bool,

        /// Evaluate metrics in parallel
        #[arg(long)]
        parallel: bool,

        /// List the peers behind each value
        #[arg(long)]
        peers: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Also write a JSON or CSV export to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List the known sub-sector labels
    Subsectors {
        /// Count reference rows per label in this dataset
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Project {
            dataset,
            query,
            subsector,
            attributes,
            config,
            top_k,
            discretized,
            parallel,
            peers,
            format,
            output,
        } => {
            let overrides = Overrides {
                top_k,
                discretized,
                parallel,
            };
            let config = load_config(config.as_deref(), &overrides)?;
            let query = build_query(query.as_deref(), subsector.as_deref(), &attributes)?;
            let dataset = load_reference(&dataset)
                .with_context(|| format!("failed to load dataset {}", dataset.display()))?;

            info!(subsector = %query.subsector, rows = dataset.len(), "projecting");
            let projector = RiskProjector::new(Arc::new(dataset), config)?;
            let projection = projector.project(&query)?;

            let export = ProjectionExport::from_projection(&projection);
            match format {
                OutputFormat::Text | OutputFormat::Markdown => {
                    let report = ReportBuilder::new()
                        .projection(&projection)
                        .show_peers(peers)
                        .build()?;
                    if format == OutputFormat::Text {
                        print!("{}", report.to_ascii_table());
                    } else {
                        print!("{}", report.to_markdown());
                    }
                }
                OutputFormat::Json => {
                    println!("{}", export.export_to_string(ExportFormat::PrettyJson)?);
                }
                OutputFormat::Csv => {
                    print!("{}", export.export_to_string(ExportFormat::Csv)?);
                }
            }

            if let Some(path) = output {
                let export_format = match path.extension().and_then(|e| e.to_str()) {
                    Some("csv") => ExportFormat::Csv,
                    _ => ExportFormat::PrettyJson,
                };
                export.export_to_file(&path, export_format)?;
                info!(path = %path.display(), "wrote export");
            }
        }
        Commands::Subsectors { dataset } => list_subsectors(dataset)?,
    }

    Ok(())
}

fn list_subsectors(dataset: Option<PathBuf>) -> Result<()> {
    let dataset = dataset.map(load_reference).transpose()?;

    println!("IDX Sub-sectors:");
    println!("================\n");

    for subsector in Subsector::all() {
        let label = subsector.label();
        match &dataset {
            Some(d) => println!("{:>4}  {:?}", d.count_in_subsector(label), label),
            None => println!("{label:?}"),
        }
    }

    if let Some(d) = &dataset {
        let unknown: Vec<&str> = d
            .subsectors()
            .into_iter()
            .filter(|s| Subsector::from_label(s).is_none())
            .collect();
        if !unknown.is_empty() {
            println!("\nLabels in the dataset outside the known list:");
            for label in unknown {
                println!("{:>4}  {:?}", d.count_in_subsector(label), label);
            }
        }
    }

    Ok(())
}
