//! phystatus CLI - diagnostics for the per-channel physical status store

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use phystatus::config::{self, PhyStatusConfig};
use phystatus::storage::PhysicalStatusStore;
use phystatus::ui::{self, Icons};
use phystatus::{ChannelSnapshot, MeasurementResults};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "phystatus")]
#[command(version)]
#[command(about = "Per-channel physical status store for GSM base stations")]
#[command(long_about = r#"
phystatus keeps the latest measurement snapshot of every logical channel:
  • Serving-cell level and quality (full and sub sampled)
  • Uplink RSSI, timing error, FER
  • Commanded MS power and timing advance
  • Up to six neighbor cells per report

Example usage:
  phystatus init
  phystatus record --input reports.json
  phystatus dump
  phystatus show --key "C0T2 TCH/F"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "phystatus.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the status table
    Init {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Dump every stored channel status
    Dump {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the status of one channel
    Show {
        /// Channel descriptor, e.g. "C0T2 TCH/F"
        #[arg(short, long)]
        key: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show statistics about the status table
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Apply measurement snapshots from a JSON file
    Record {
        /// JSON file with one {channel, report} object or an array of them
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

/// One channel snapshot paired with the report it produced
#[derive(Debug, Deserialize)]
struct Sample {
    channel: ChannelSnapshot,
    report: MeasurementResults,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SampleInput {
    Many(Vec<Sample>),
    One(Sample),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(Some(cli.config.as_path()))?.unwrap_or_default();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(config.log_level.as_deref().unwrap_or("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { database, force } => {
            let database = database.unwrap_or_else(|| config.database_path_in(Path::new(".")));
            let new_config = PhyStatusConfig {
                database: Some(database.display().to_string()),
                log_level: config.log_level.clone(),
            };
            config::write_config(&cli.config, &new_config, force)?;

            let store = open_store(&database)?;
            store.close()?;

            ui::success(&format!("Status table ready in {}", database.display()));
            ui::info("Config", &cli.config.display().to_string());
        }

        Commands::Dump { database, format } => {
            let store = open_store(&resolve_database(database, &config))?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&store.records()?)?);
            } else {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                let written = store.dump(&mut out)?;
                out.flush()?;
                tracing::debug!("Dumped {} channel records", written);
            }
        }

        Commands::Show { key, database, format } => {
            // normalize the descriptor when it parses; fall back to the raw key
            let key = key
                .parse::<phystatus::ChannelDescriptor>()
                .map(|d| d.descriptive_string())
                .unwrap_or(key);

            let store = open_store(&resolve_database(database, &config))?;
            match store.get(&key)? {
                Some(status) if format == "json" => {
                    println!("{}", serde_json::to_string_pretty(&status)?);
                }
                Some(status) => {
                    ui::header(&format!("Channel {}", key));
                    print!("{}", status);
                }
                None => {
                    ui::error(&format!("No status recorded for {}", key));
                    anyhow::bail!("No status recorded for {}", key);
                }
            }
        }

        Commands::Stats { database } => {
            let database = resolve_database(database, &config);
            let store = open_store(&database)?;
            let stats = store.stats()?;

            ui::header(&format!("Physical Status ({})", database.display()));
            println!("{}", ui::table::stats_table(&stats));
        }

        Commands::Record { input, database } => {
            let contents = std::fs::read_to_string(&input)?;
            let samples = match serde_json::from_str::<SampleInput>(&contents)? {
                SampleInput::Many(samples) => samples,
                SampleInput::One(sample) => vec![sample],
            };

            let store = open_store(&resolve_database(database, &config))?;
            let mut failed = 0;

            for sample in &samples {
                match store.set_physical(&sample.channel, &sample.report) {
                    Ok(()) => {
                        tracing::info!("{} Recorded {}", Icons::PHONE, sample.channel.descriptor);
                    }
                    Err(e) => {
                        ui::warn(&format!("{}: {}", sample.channel.descriptor, e));
                        failed += 1;
                    }
                }
            }

            ui::section("Record");
            ui::summary_row("Snapshots:", &samples.len().to_string());
            ui::summary_row("Failed:", &failed.to_string());
            if failed > 0 {
                anyhow::bail!("{} of {} snapshots were not recorded", failed, samples.len());
            }
            ui::success("All snapshots recorded");
        }
    }

    Ok(())
}

fn resolve_database(flag: Option<PathBuf>, config: &PhyStatusConfig) -> PathBuf {
    flag.unwrap_or_else(|| config.database_path_in(Path::new(".")))
}

fn open_store(database: &Path) -> anyhow::Result<PhysicalStatusStore> {
    config::ensure_db_dir(database)?;
    tracing::debug!("{} Opening {}", Icons::DATABASE, database.display());
    Ok(PhysicalStatusStore::open(database)?)
}
