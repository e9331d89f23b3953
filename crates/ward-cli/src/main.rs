//! ward CLI - capability-checked clinical visit orchestration
//!
//! Each invocation loads the ward snapshot, runs one operation through the
//! orchestrator and writes the snapshot back, so denials and reads are
//! audited across runs just like writes. The cycle runs under an exclusive
//! lock on `<data>.lock`, so parallel invocations queue instead of
//! overwriting each other.
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`WARD_*`)
//! 3. Project config (`.ward/config.toml` under `-C`, default current directory)
//! 4. Global config (`~/.ward/config.toml`)
//! 5. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `WARD_DEBUG`: Enable debug mode (`true`/`false`)
//! - `WARD_DATA_PATH`: Snapshot file location
//! - `WARD_CONSULTATION_FEE`: Default consultation fee

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use ward_runtime::config::{ConfigError, ConfigResolver};
use ward_runtime::{ConfigLoader, Orchestrator, SnapshotFile, WardConfig};

/// ward CLI - capability-checked clinical visit orchestration
#[derive(Parser, Debug)]
#[command(name = "ward")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// Snapshot file (overrides config and WARD_DATA_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Demographic fields shared by `register` and `visit`.
#[derive(clap::Args, Debug, Clone, Default)]
struct DemographicArgs {
    #[arg(long)]
    age: Option<u32>,
    #[arg(long)]
    gender: Option<String>,
    /// Height in centimetres
    #[arg(long)]
    height: Option<f64>,
    /// Weight in kilograms
    #[arg(long)]
    weight: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a patient, or update the one with the same phone
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[command(flatten)]
        demographics: DemographicArgs,
    },
    /// Find a patient by phone, falling back to the latest by name
    Find {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Open a visit for a patient
    Visit {
        /// Patient id
        patient: u64,
        #[arg(long)]
        symptoms: String,
        #[command(flatten)]
        demographics: DemographicArgs,
    },
    /// Run diagnosis on a visit
    Diagnose { visit: u64 },
    /// Assign the first free room to a visit
    AssignRoom { visit: u64 },
    /// Complete a visit without billing
    Complete { visit: u64 },
    /// Bill a visit and complete it
    Bill {
        visit: u64,
        /// Consultation fee (defaults to billing.consultation_fee)
        #[arg(long)]
        fee: Option<f64>,
    },
    /// Show a visit with its patient and bill
    Show { visit: u64 },
    /// List patients, newest first
    Patients,
    /// Inspect room occupancy
    Rooms,
    /// Free every room without touching visits
    ResetRooms,
    /// Show recent audit entries, newest first
    Logs {
        /// Number of entries (defaults to audit.default_limit)
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// CLI-based configuration resolver.
///
/// Loads file/env config via [`ConfigLoader`] and applies CLI flags as
/// the highest-priority layer.
struct CliConfigResolver {
    project_root: PathBuf,
    debug: bool,
    data: Option<PathBuf>,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        let project_root = args.project.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get current directory, using '.'");
                PathBuf::from(".")
            })
        });
        Self {
            project_root,
            debug: args.debug,
            data: args.data.clone(),
        }
    }

    fn resolve(&self) -> Result<WardConfig, ConfigError> {
        let mut config = ConfigLoader::new()
            .with_project_root(&self.project_root)
            .load()?;
        self.apply(&mut config);
        Ok(config)
    }
}

impl ConfigResolver for CliConfigResolver {
    fn apply(&self, config: &mut WardConfig) {
        if self.debug {
            config.debug = true;
        }
        if let Some(ref p) = self.data {
            config.data_path = Some(p.clone());
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let resolver = CliConfigResolver::from_args(&args);
    let config = resolver
        .resolve()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    // Terminal filter: --debug / config.debug > --verbose > RUST_LOG env > default "warn".
    // Logs go to stderr so stdout stays machine-readable with --json.
    let filter = if args.debug || config.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();

    info!(path = %resolver.project_root.display(), "Project root");

    let file = SnapshotFile::new(config.data_path());
    // Held across load, execute and save so concurrent runs see each other's
    // rooms and audit entries.
    let lock = file.lock()?;
    let orch = match file.load()? {
        Some(snapshot) => Orchestrator::restore(snapshot, &config)?,
        None => {
            debug!(path = %file.path().display(), "No snapshot, starting fresh");
            Orchestrator::from_config(&config)?
        }
    };

    let outcome = commands::execute(&orch, &args.command, &config);

    // Save even on failure: denied checks are part of the audit trail.
    file.save(&orch.snapshot())?;
    drop(lock);

    let report = outcome?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.json)?);
    } else {
        println!("{}", report.text);
    }
    Ok(())
}
