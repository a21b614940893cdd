//! Matchday - football matches and teams from the command line.
//!
//! Data comes from the API while the network is reachable and from the local
//! cache otherwise. Every successful fetch refreshes the cache.

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use matchday_core::cache::CacheAges;
use matchday_core::{
    ApiClient, AppError, CacheStore, Config, ConnectivityMonitor, DataRepository, LocalDataSource,
    MatchItem, MatchesSync, MatchesView, Repository, Snapshot, SyncOrchestrator, SyncSource,
    TcpProbe, TeamDetailView, TeamFilter, TeamItem, TeamSummary, TeamsSync, TeamsView,
};

/// Log file name prefix inside the configured log directory
const LOG_FILE_PREFIX: &str = "matchday.log";

#[derive(Parser)]
#[command(name = "matchday")]
#[command(about = "Football matches and teams, online or from the local cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Skip the network and read the local cache only
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List previous and upcoming matches
    Matches {
        /// Only matches involving this team (repeatable, remembered for next time)
        #[arg(short, long = "team", value_name = "NAME")]
        teams: Vec<String>,

        /// Forget the remembered teams and show everything
        #[arg(long, conflicts_with = "teams")]
        all: bool,
    },

    /// List teams, marking the selected ones
    Teams {
        /// Select this team (repeatable, remembered for next time)
        #[arg(short, long = "team", value_name = "NAME")]
        teams: Vec<String>,
    },

    /// Summarise one team's cached matches
    Team {
        /// Team name, e.g. "Team Red Dragons"
        name: String,
    },

    /// Show cache location and age
    Status,
}

/// Initialize the tracing subscriber for logging.
/// Returns the file writer guard, which must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=matchday_core=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::load().context("Failed to load configuration")?;

    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!(base_url = %config.base_url, offline = cli.offline, "Matchday starting");

    let store = Arc::new(
        CacheStore::open(config.cache_dir()?).context("Failed to open local cache")?,
    );
    let local = LocalDataSource::new(Arc::clone(&store));

    match cli.command {
        Commands::Status => {
            print_status(&config, &local.cache_ages().await);
            Ok(())
        }
        Commands::Team { name } => {
            let repository = build_repository(&config, local)?;
            show_team(repository, name).await
        }
        Commands::Matches { teams, all } => {
            if all {
                remember_teams(&mut config, Vec::new());
            } else if !teams.is_empty() {
                remember_teams(&mut config, teams);
            }
            let filter: TeamFilter = config.selected_teams.iter().cloned().collect();
            let repository = build_repository(&config, local)?;
            show_matches(&config, repository, filter, cli.offline).await
        }
        Commands::Teams { teams } => {
            if !teams.is_empty() {
                remember_teams(&mut config, teams);
            }
            let filter: TeamFilter = config.selected_teams.iter().cloned().collect();
            let repository = build_repository(&config, local)?;
            show_teams(&config, repository, filter, cli.offline).await
        }
    }
}

fn build_repository(config: &Config, local: LocalDataSource) -> Result<Arc<dyn Repository>> {
    let api = ApiClient::with_base_url(config.base_url.clone(), config.request_timeout())
        .context("Failed to create API client")?;
    Ok(Arc::new(DataRepository::new(Arc::new(api), Arc::new(local))))
}

/// Store the team filter for later runs. A failed save only costs the memory.
fn remember_teams(config: &mut Config, teams: Vec<String>) {
    config.selected_teams = teams;
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save selected teams");
    }
}

/// Feed reachability into `sync`.
///
/// Forced offline, or when the monitor cannot start, the orchestrator is told
/// the network is down. The returned monitor must be kept alive.
async fn connect<S: SyncSource>(
    sync: &SyncOrchestrator<S>,
    config: &Config,
    offline: bool,
) -> Option<ConnectivityMonitor> {
    if offline {
        sync.set_reachable(false).await;
        return None;
    }

    let probe = TcpProbe::new(config.probe_host.clone());
    let mut monitor = ConnectivityMonitor::new(probe, config.probe_interval());
    let changes = monitor.changes();
    match monitor.start() {
        Ok(()) => {
            sync.follow_connectivity(changes);
            Some(monitor)
        }
        Err(e) => {
            warn!(error = %e, "Connectivity monitor unavailable, using cached data");
            sync.set_reachable(false).await;
            None
        }
    }
}

async fn first_snapshot<I: Clone>(snapshot: &mut watch::Receiver<Snapshot<I>>) -> Result<Snapshot<I>> {
    snapshot
        .changed()
        .await
        .context("View stopped before producing any data")?;
    Ok(snapshot.borrow_and_update().clone())
}

/// Most recent error published so far, if any.
fn last_error(errors: &mut broadcast::Receiver<AppError>) -> Option<AppError> {
    let mut last = None;
    loop {
        match errors.try_recv() {
            Ok(e) => last = Some(e),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    last
}

async fn show_matches(
    config: &Config,
    repository: Arc<dyn Repository>,
    filter: TeamFilter,
    offline: bool,
) -> Result<()> {
    let sync = SyncOrchestrator::spawn(MatchesSync::new(repository));
    let mut errors = sync.subscribe_errors();
    let view = MatchesView::spawn(sync.subscribe(), filter);
    let mut snapshot = view.snapshot();

    let _monitor = connect(&sync, config, offline).await;
    sync.request_load().await;

    let snapshot = first_snapshot(&mut snapshot).await?;
    print_matches(&snapshot, &view.filter());
    sync.flush().await;

    if let Some(e) = last_error(&mut errors) {
        eprintln!("Error: {}", e);
    }
    Ok(())
}

async fn show_teams(
    config: &Config,
    repository: Arc<dyn Repository>,
    filter: TeamFilter,
    offline: bool,
) -> Result<()> {
    let sync = SyncOrchestrator::spawn(TeamsSync::new(repository));
    let mut errors = sync.subscribe_errors();
    let view = TeamsView::spawn(sync.subscribe(), filter);
    let mut snapshot = view.snapshot();

    let _monitor = connect(&sync, config, offline).await;
    sync.request_load().await;

    let snapshot = first_snapshot(&mut snapshot).await?;
    print_teams(&snapshot, *view.apply_enabled().borrow());
    sync.flush().await;

    if let Some(e) = last_error(&mut errors) {
        eprintln!("Error: {}", e);
    }
    Ok(())
}

async fn show_team(repository: Arc<dyn Repository>, name: String) -> Result<()> {
    let view = TeamDetailView::spawn(name, repository);
    let mut summary = view.summary();
    view.request_load();

    summary
        .changed()
        .await
        .context("Team summary stopped before producing any data")?;
    let loaded = summary.borrow_and_update().clone();
    match loaded {
        Some(Ok(summary)) => print_summary(&summary),
        Some(Err(e)) => eprintln!("Error: {}", e),
        None => {}
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_matches(snapshot: &Snapshot<MatchItem>, filter: &TeamFilter) {
    if !filter.is_empty() {
        let teams: Vec<&str> = filter.iter().collect();
        println!("Teams: {}", teams.join(", "));
    }
    if snapshot.is_empty() {
        println!("No matches.");
        return;
    }

    for section in &snapshot.sections {
        println!();
        println!("{} ({})", section.title, section.items.len());
        for item in &section.items {
            println!(
                "  {:<18} {} - {}",
                item.date.as_deref().unwrap_or("TBD"),
                item.home,
                item.away
            );
            if let Some(ref highlights) = item.highlights {
                println!("  {:<18} {}", "", highlights);
            }
        }
    }
}

fn print_teams(snapshot: &Snapshot<TeamItem>, apply_enabled: bool) {
    if snapshot.is_empty() {
        println!("No teams.");
        return;
    }

    for team in snapshot.items() {
        let mark = if team.is_selected { "x" } else { " " };
        println!("[{}] {}", mark, team.display_name());
    }
    if apply_enabled {
        println!();
        println!("Run `matchday matches` to see the selected teams' matches.");
    }
}

fn print_summary(summary: &TeamSummary) {
    println!("{}", summary.title);
    println!("  {}", summary.total);
    println!("  {}", summary.previous);
    println!("  {}", summary.upcoming);
}

fn print_status(config: &Config, ages: &CacheAges) {
    match config.cache_dir() {
        Ok(dir) => println!("Cache:   {}", dir.display()),
        Err(e) => println!("Cache:   unavailable ({})", e),
    }
    println!("API:     {}", config.base_url);
    println!("Matches: {}", ages.matches_age());
    println!("Teams:   {}", ages.teams_age());
    if !config.selected_teams.is_empty() {
        println!("Teams selected: {}", config.selected_teams.join(", "));
    }
}
