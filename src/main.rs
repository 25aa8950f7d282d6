use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;
use vulnscope::config::{Config, ModelConfig, ObservabilityConfig, StoreConfig, TrainingConfig};
use vulnscope::ingest::{feed, weakness};
use vulnscope::ml::artifacts::ArtifactStore;
use vulnscope::ml::pipeline::TrainingPipeline;
use vulnscope::models::{RecordUpdate, VulnerabilityRecord};
use vulnscope::query::{QueryEngine, ReportOutcome};
use vulnscope::state::create_store;

#[derive(Parser)]
#[command(name = "vulnscope")]
#[command(about = "Vulnerability intelligence store and severity classifier", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import vulnerability records from an NVD-style JSON feed
    ImportCves {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Import weakness-taxonomy entries from a CSV export
    ImportCwes {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Add or replace a vulnerability record
    Add {
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        severity: Option<String>,

        #[arg(short, long)]
        platform: Option<String>,

        #[arg(short = 'c', long)]
        cvss_score: Option<f64>,
    },

    /// Update selected fields of an existing record
    Update {
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        severity: Option<String>,

        #[arg(short, long)]
        platform: Option<String>,

        #[arg(short = 'c', long)]
        cvss_score: Option<f64>,
    },

    /// Show a stored record
    Show {
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,
    },

    /// Delete a stored record
    Delete {
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,
    },

    /// Train the severity model on all stored records
    Train,

    /// Predict severities for one or more identifiers
    Query {
        #[arg(value_name = "IDENTIFIER", required = true)]
        identifiers: Vec<String>,
    },

    /// Show store counts and model status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vulnscope=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        default_config()
    });

    let cli = Cli::parse();

    let store = create_store(&config.store)?;
    let artifacts = Arc::new(ArtifactStore::new(&config.model.dir)?);

    match cli.command {
        Commands::ImportCves { file } => {
            let summary = feed::import_feed(store.as_ref(), &file).await?;
            println!(
                "Imported {} records ({} skipped)",
                summary.imported, summary.skipped
            );
        }

        Commands::ImportCwes { file } => {
            let summary = weakness::import_weaknesses(store.as_ref(), &file).await?;
            println!(
                "Imported {} weaknesses ({} skipped)",
                summary.imported, summary.skipped
            );
        }

        Commands::Add {
            identifier,
            description,
            severity,
            platform,
            cvss_score,
        } => {
            let mut record = VulnerabilityRecord::new(identifier, description);
            record.severity = severity;
            record.platform = platform;
            record.cvss_score = cvss_score;
            record.validate()?;

            store.save_record(&record).await?;
            println!("Saved {}", record.identifier);
        }

        Commands::Update {
            identifier,
            description,
            severity,
            platform,
            cvss_score,
        } => {
            let update = RecordUpdate {
                description,
                severity,
                platform,
                cvss_score,
                ..Default::default()
            };
            if update.is_empty() {
                eprintln!("Nothing to update");
                std::process::exit(1);
            }

            store.update_record(&identifier, update).await?;
            println!("Updated {}", identifier);
        }

        Commands::Show { identifier } => match store.get_record(&identifier).await? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => {
                eprintln!("No record for {}", identifier);
                std::process::exit(1);
            }
        },

        Commands::Delete { identifier } => {
            store.delete_record(&identifier).await?;
            println!("Deleted {}", identifier);
        }

        Commands::Train => {
            let pipeline = TrainingPipeline::new(store, artifacts, config.training);
            let report = pipeline.run().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Query { identifiers } => {
            let engine = QueryEngine::new(store, artifacts);
            match engine.report(&identifiers).await? {
                ReportOutcome::NoData => println!("No data for the requested identifiers"),
                ReportOutcome::Report(entries) => {
                    println!("{}", serde_json::to_string_pretty(&entries)?)
                }
            }
        }

        Commands::Status => {
            let status = serde_json::json!({
                "records": store.count_records().await?,
                "weaknesses": store.count_weaknesses().await?,
                "model_available": artifacts.is_available(),
                "last_trained": artifacts.last_trained(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

fn default_config() -> Config {
    Config {
        store: StoreConfig {
            backend: Default::default(),
            path: "./data/store".into(),
        },
        model: ModelConfig {
            dir: "./data/models".into(),
        },
        training: TrainingConfig::default(),
        observability: ObservabilityConfig {
            log_level: "info".to_string(),
            json_logs: false,
            service_name: "vulnscope".to_string(),
        },
    }
}
