use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use group_reconciler::config::GroupSyncConfig;
use group_reconciler::differ::{diff, LocalState};
use group_reconciler::pg_store::PgStore;
use group_reconciler::reconciler::{ReconcileReport, Reconciler};
use group_reconciler::results::ResultImporter;
use group_reconciler::snapshot::ExternalSnapshot;
use group_reconciler::source::{
    load_snapshot_file, snapshot_files, FileSnapshotSource, HttpResultImporter, HttpSnapshotSource, SnapshotSource,
};
use group_reconciler::types::CompetitionGroup;
use group_reconciler::web::{self, AppState};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare a snapshot file against the database and print the diff
    Diff {
        /// Path to the snapshot JSON file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Apply one snapshot file, or every snapshot in a directory
    Reconcile {
        /// Snapshot JSON file or directory of snapshot files
        #[arg(short, long)]
        path: PathBuf,
        /// Also import match results for completed fixtures
        #[arg(long)]
        import_results: bool,
    },
    /// Download a group snapshot from the scraping service
    Fetch {
        #[arg(long)]
        category: String,
        #[arg(long)]
        league: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        season: String,
        /// Directory snapshots are written to
        #[arg(short, long, default_value = "snapshots")]
        out: PathBuf,
    },
    /// Serve the review API
    Serve,
    /// Create the database schema
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = GroupSyncConfig::from_env();

    match cli.command {
        Commands::Diff { file } => {
            let snapshot = load_snapshot_file(&file)
                .await
                .with_context(|| format!("Failed to load snapshot {:?}", file))?;
            let store = PgStore::connect(&config.database).await?;
            let local = LocalState::load(&store, &snapshot.group).await?;
            let result = diff(&snapshot.group, &snapshot, &local);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Reconcile { path, import_results } => {
            let store = PgStore::connect(&config.database).await?;
            let importer = if import_results {
                Some(HttpResultImporter::new(&config.scraping)?)
            } else {
                None
            };
            let mut reconciler = Reconciler::new(&store);
            if let Some(importer) = &importer {
                reconciler = reconciler.with_importer(importer as &dyn ResultImporter);
            }
            reconcile_path(&reconciler, &path).await?;
        }
        Commands::Fetch {
            category,
            league,
            group,
            season,
            out,
        } => {
            let group = CompetitionGroup {
                category,
                league,
                group_name: group,
                season,
            };
            let raw = HttpSnapshotSource::new(&config.scraping)?.fetch(&group).await?;
            // Payloads that fail validation are not written.
            ExternalSnapshot::try_from(raw.clone()).context("Fetched snapshot is invalid")?;
            let target = FileSnapshotSource::new(&out).path_for(&group);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, serde_json::to_string_pretty(&raw)?).await?;
            info!("Wrote snapshot for {} to {:?}", group, target);
        }
        Commands::Serve => {
            let store = PgStore::connect(&config.database).await?;
            let importer = HttpResultImporter::new(&config.scraping)?;
            let state = AppState {
                store: Arc::new(store),
                importer: Some(Arc::new(importer)),
            };
            web::serve(state, &config.server).await?;
        }
        Commands::InitDb => {
            let store = PgStore::connect(&config.database).await?;
            store.apply_schema().await?;
        }
    }

    Ok(())
}

async fn reconcile_path(reconciler: &Reconciler<'_>, path: &Path) -> Result<()> {
    if !path.is_dir() {
        let snapshot = load_snapshot_file(path)
            .await
            .with_context(|| format!("Failed to load snapshot {:?}", path))?;
        let report = reconciler.reconcile(&snapshot.group, &snapshot).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let files = snapshot_files(path).await?;
    info!("Reconciling {} snapshot files from {:?}", files.len(), path);
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} groups ({eta})")?,
    );

    let mut totals = ReconcileReport::default();
    let mut failed_files = 0;
    for file in &files {
        match load_snapshot_file(file).await {
            Ok(snapshot) => {
                let report = reconciler.reconcile(&snapshot.group, &snapshot).await;
                if !report.is_clean() {
                    warn!("{:?}: {} issues", file, report.errors.len());
                }
                accumulate(&mut totals, report);
            }
            Err(err) => {
                error!("Skipping {:?}: {}", file, err);
                failed_files += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    info!(
        "Batch finished: {} clubs, {} teams, {} memberships, {} fixtures created, {} fixtures updated, \
         {} repairs, {} issues, {} unreadable files",
        totals.clubs_created,
        totals.teams_created,
        totals.team_seasons_created,
        totals.fixtures_created,
        totals.fixtures_updated,
        totals.repairs.len(),
        totals.errors.len(),
        failed_files
    );
    println!("{}", serde_json::to_string_pretty(&totals)?);
    Ok(())
}

fn accumulate(totals: &mut ReconcileReport, report: ReconcileReport) {
    totals.clubs_created += report.clubs_created;
    totals.teams_created += report.teams_created;
    totals.team_seasons_created += report.team_seasons_created;
    totals.team_seasons_reactivated += report.team_seasons_reactivated;
    totals.fixtures_created += report.fixtures_created;
    totals.fixtures_updated += report.fixtures_updated;
    totals.results_imported += report.results_imported;
    totals.repairs.extend(report.repairs);
    totals.errors.extend(report.errors);
}
