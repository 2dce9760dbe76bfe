//! ledgersync, the operator tool for the ledger sync engine.
//!
//! Supports:
//! - Queue inspection (status/pending)
//! - Manual push/pull cycles against the remote API
//! - Document upload cycles with a directory-export uploader
//! - Integrity checking and store compaction
//!
//! # Usage
//!
//! ```bash
//! # Show queue status
//! ledgersync --db ledger.db status
//!
//! # Deliver pending changes
//! ledgersync --db ledger.db --api https://api.example.com push
//!
//! # Merge remote snapshots into the local store
//! ledgersync --db ledger.db --api https://api.example.com pull
//!
//! # Record a change manually
//! ledgersync --db ledger.db enqueue --entity product --reference P-1 \
//!     --payload '{"codigo":"P-1"}' --operation update
//!
//! # Audit provider references
//! ledgersync --db ledger.db check
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{ChangeOp, Store};
use ledger_sync::{SyncConfig, SyncService};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "ledgersync")]
#[command(version = "0.1.0")]
#[command(about = "Ledger offline-first sync tool")]
struct Cli {
    /// Ledger database file
    #[arg(long, default_value = "ledger.db")]
    db: PathBuf,

    /// Remote API base URL
    #[arg(long, default_value = "https://api.ledger.example")]
    api: String,

    /// Managed document storage root
    #[arg(long, default_value = "documents")]
    documents: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show outbox and document queue status
    Status,

    /// List pending outbox changes
    Pending,

    /// Deliver pending changes to the remote API
    Push,

    /// Fetch remote snapshots and merge them into the local store
    Pull,

    /// Upload pending documents by exporting them to a directory
    Upload {
        /// Destination directory
        #[arg(long)]
        dest: PathBuf,
    },

    /// Record a change in the outbox
    Enqueue {
        /// Entity tag ("product", "provider", "order")
        #[arg(long)]
        entity: String,
        /// The entity's natural key
        #[arg(long)]
        reference: String,
        /// JSON payload delivered verbatim
        #[arg(long)]
        payload: String,
        /// create, update or delete
        #[arg(long)]
        operation: String,
    },

    /// Copy a file into managed document storage and queue it for upload
    AddDocument {
        /// File to store
        file: PathBuf,
    },

    /// Report dangling provider references
    Check,

    /// Reclaim unused space in the database file
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ledgersync=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let store = Arc::new(Store::open(&cli.db).context("Failed to open ledger database")?);
    let mut config = SyncConfig::new(&cli.api);
    config.document_root = cli.documents;
    let service =
        SyncService::new(config, store).context("Failed to start the sync service")?;

    match cli.command {
        Commands::Status => cmd_status(&service),
        Commands::Pending => cmd_pending(&service),
        Commands::Push => cmd_push(&service).await,
        Commands::Pull => cmd_pull(&service).await,
        Commands::Upload { dest } => cmd_upload(&service, dest).await,
        Commands::Enqueue {
            entity,
            reference,
            payload,
            operation,
        } => cmd_enqueue(&service, &entity, &reference, &payload, &operation),
        Commands::AddDocument { file } => cmd_add_document(&service, &file),
        Commands::Check => cmd_check(&service),
        Commands::Compact => cmd_compact(&service),
    }
}

fn cmd_status(service: &SyncService) -> Result<()> {
    let counts = service.queue_counts()?;
    let documents = service.pending_documents()?;
    println!("Outbox: {} pending, {} done, {} dead", counts.pending, counts.done, counts.dead);
    println!("Documents: {} pending", documents.len());
    Ok(())
}

fn cmd_pending(service: &SyncService) -> Result<()> {
    let pending = service.pending_changes()?;
    if pending.is_empty() {
        println!("No pending changes.");
        return Ok(());
    }
    println!("Pending changes ({}):", pending.len());
    for change in &pending {
        println!(
            "  #{} {} {} {} | {} attempts | created {}",
            change.id,
            change.operation.as_str(),
            change.entity,
            change.reference,
            change.attempts,
            change.created_at,
        );
    }
    Ok(())
}

async fn cmd_push(service: &SyncService) -> Result<()> {
    let ran = service.push_pending().wait().await?;
    if !ran {
        println!("Push skipped (offline or queue unavailable).");
        return Ok(());
    }
    let counts = service.queue_counts()?;
    println!(
        "Push cycle complete: {} pending, {} done, {} dead",
        counts.pending, counts.done, counts.dead
    );
    Ok(())
}

async fn cmd_pull(service: &SyncService) -> Result<()> {
    let report = service.pull_updates().wait().await?;
    if report.offline {
        println!("Pull skipped (offline).");
        return Ok(());
    }
    println!(
        "Pull complete: {} applied, {} skipped",
        report.applied, report.skipped
    );
    for kind in &report.failed_kinds {
        println!("  fetch of {kind} failed");
    }
    Ok(())
}

async fn cmd_upload(service: &SyncService, dest: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&dest)
        .with_context(|| format!("Failed to create destination {dest:?}"))?;

    let uploader = move |path: &Path| {
        let Some(name) = path.file_name() else {
            return false;
        };
        std::fs::copy(path, dest.join(name)).is_ok()
    };
    let report = service.upload_pending(uploader).wait().await?;
    println!(
        "Upload cycle complete: {} uploaded, {} failed, {} missing",
        report.uploaded, report.failed, report.missing
    );
    Ok(())
}

fn cmd_enqueue(
    service: &SyncService,
    entity: &str,
    reference: &str,
    payload: &str,
    operation: &str,
) -> Result<()> {
    let operation = ChangeOp::parse(&operation.to_uppercase())
        .with_context(|| format!("Unknown operation {operation:?}"))?;
    let id = service.enqueue_change(entity, reference, payload, operation)?;
    println!("Queued change #{id}.");
    Ok(())
}

fn cmd_add_document(service: &SyncService, file: &Path) -> Result<()> {
    let stored = service
        .store_local_copy(file)
        .with_context(|| format!("Failed to store {file:?}"))?;
    println!("Stored {stored:?} and queued it for upload.");
    Ok(())
}

fn cmd_check(service: &SyncService) -> Result<()> {
    let issues = service.check_references()?;
    if issues.is_empty() {
        println!("No integrity issues found.");
        return Ok(());
    }
    println!("Integrity issues ({}):", issues.len());
    for issue in &issues {
        println!("  {issue}");
    }
    Ok(())
}

fn cmd_compact(service: &SyncService) -> Result<()> {
    service.compact()?;
    println!("Database compacted.");
    Ok(())
}
