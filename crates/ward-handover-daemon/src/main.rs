use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ward_handover_core::{CoreConfig, Database, PatientLifecycle, WardHandoverCore};

#[derive(Parser)]
#[command(name = "ward-handover")]
#[command(about = "Ward handover archive maintenance")]
struct Cli {
    /// SQLite database path (overrides WARD_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Days an archived patient is kept before purge (overrides WARD_RETENTION_DAYS)
    #[arg(long, global = true)]
    retention_days: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the periodic archive sweeper until interrupted
    Run,
    /// Run a single sweep pass and print the report
    Sweep,
    /// List archived patients and when they will be purged
    Archived,
}

/// Entry point for the ward handover maintenance daemon.
///
/// # Environment Variables
/// - `WARD_DB_PATH`: database file (default: "ward-handover.db")
/// - `WARD_RETENTION_DAYS`: archive retention in days (default: 7)
/// - `WARD_SWEEP_INTERVAL_SECS`: seconds between sweeps (default: 3600)
/// - `WARD_SESSION_TTL_HOURS`: bearer session lifetime (default: 12)
/// - `RUST_LOG`: log filter, on top of `ward_handover=info`
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ward_handover=info".parse()?)
                .add_directive("ward_handover_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Run => run(config),
        Commands::Sweep => sweep(&config),
        Commands::Archived => archived(&config),
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let mut config = CoreConfig::from_env().context("invalid environment configuration")?;
    if let Some(path) = &cli.db {
        config = config.with_database_path(path)?;
    }
    if let Some(days) = cli.retention_days {
        config = config.with_retention_days(days)?;
    }
    Ok(config)
}

fn run(config: CoreConfig) -> anyhow::Result<()> {
    tracing::info!("++ Opening ward database at {}", config.database_path().display());
    let core = WardHandoverCore::with_config(config)?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("failed to install interrupt handler")?;

    let sweeper = core.spawn_sweeper();
    rx.recv().context("interrupt channel closed")?;

    tracing::info!("Interrupted, stopping sweeper");
    sweeper.shutdown();
    sweeper.join();
    Ok(())
}

fn sweep(config: &CoreConfig) -> anyhow::Result<()> {
    let db = open(config)?;
    let report = PatientLifecycle::new(&db).sweep_expired(Utc::now(), config.retention())?;

    println!("Cutoff: {}", report.cutoff.to_rfc3339());
    if report.purged.is_empty() {
        println!("No archived patients past retention.");
    }
    for id in &report.purged {
        println!("Purged: {}", id);
    }
    if report.skipped > 0 {
        println!("Skipped (restored or already removed): {}", report.skipped);
    }
    for failure in &report.failed {
        eprintln!("Failed: {}: {}", failure.patient_id, failure.error);
    }

    if !report.failed.is_empty() {
        anyhow::bail!("{} patient(s) could not be purged", report.failed.len());
    }
    Ok(())
}

fn archived(config: &CoreConfig) -> anyhow::Result<()> {
    let db = open(config)?;
    let patients = PatientLifecycle::new(&db).list_archived()?;

    if patients.is_empty() {
        println!("No archived patients.");
        return Ok(());
    }

    let now = Utc::now();
    for patient in patients {
        let Some(due) = patient.purge_due_at(config.retention()) else {
            continue;
        };
        let remaining = due - now;
        let left = if remaining > chrono::Duration::zero() {
            format!("{}d {}h left", remaining.num_days(), remaining.num_hours() % 24)
        } else {
            "due at next sweep".to_string()
        };
        println!(
            "ID: {}, MRN: {}, Name: {}, Ward/Bed: {}-{}, Purge: {} ({})",
            patient.id,
            patient.mrn,
            patient.name,
            patient.department.code(),
            patient.bed,
            due.to_rfc3339(),
            left
        );
    }
    Ok(())
}

fn open(config: &CoreConfig) -> anyhow::Result<Database> {
    Database::open(config.database_path())
        .with_context(|| format!("failed to open {}", config.database_path().display()))
}
