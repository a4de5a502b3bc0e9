#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the rider-safety application.
//!
//! One-shot subcommands print a single backend view; `watch` mounts a
//! full session and streams prediction snapshots until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use transit_safety_api::{BackendApi, BackendClient};
use transit_safety_api_models::StatsPeriod;
use transit_safety_app::{SessionView, run_predictions, run_stations, run_stats, run_sync};
use transit_safety_prefs::Preferences;

/// How often the watch loop sweeps expired toasts.
const TOAST_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "transit-safety", about = "Transit rider-safety client")]
struct Args {
    /// Backend base URL.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    base_url: String,

    /// Map container id passed to the map backend.
    #[arg(long, default_value = "map")]
    container_id: String,

    /// Path to the persisted preference file.
    #[arg(long, default_value = "data/preferences.toml")]
    preferences: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Coarse statistics periods accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PeriodArg {
    All,
    Today,
    Week,
    Month,
}

#[derive(Subcommand)]
enum Command {
    /// List the stations.
    Stations,
    /// Show a statistics overview.
    Stats {
        /// Coarse period selector.
        #[arg(long, value_enum, default_value_t = PeriodArg::All)]
        period: PeriodArg,
        /// Explicit range start (overrides --period together with --date-to).
        #[arg(long)]
        date_from: Option<NaiveDate>,
        /// Explicit range end.
        #[arg(long)]
        date_to: Option<NaiveDate>,
    },
    /// Show the next hour of predictions.
    Predictions,
    /// Trigger a best-effort backend incident sync.
    Sync,
    /// Mount a session and stream prediction updates until Ctrl-C.
    Watch,
}

fn stats_period(period: PeriodArg, from: Option<NaiveDate>, to: Option<NaiveDate>) -> StatsPeriod {
    if let (Some(date_from), Some(date_to)) = (from, to) {
        return StatsPeriod::Range { date_from, date_to };
    }
    match period {
        PeriodArg::All => StatsPeriod::All,
        PeriodArg::Today => StatsPeriod::Today,
        PeriodArg::Week => StatsPeriod::ThisWeek,
        PeriodArg::Month => StatsPeriod::ThisMonth,
    }
}

async fn run_watch(
    api: Arc<dyn BackendApi>,
    prefs: Preferences,
    container_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = SessionView::new(api, prefs);
    session.mount(container_id).await?;

    if let Some(message) = session.map_error() {
        println!("Map unavailable: {message}");
    }

    session.load_statistics(StatsPeriod::All).await;
    if let Some(snapshot) = session.stats().snapshot() {
        println!("Total incidents on record: {}", snapshot.total_incidents);
    } else if let Some(error) = session.stats().error() {
        println!("Statistics unavailable: {error}");
    }

    let Some(mut predictions) = session.subscribe_predictions() else {
        log::error!("No prediction feed after mount; nothing to watch");
        session.unmount();
        return Ok(());
    };
    let mut sweep = tokio::time::interval(TOAST_SWEEP_INTERVAL);

    println!("Watching predictions (Ctrl-C to stop)...");
    loop {
        tokio::select! {
            changed = predictions.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = predictions.borrow().clone();
                if let Some(error) = &snapshot.error {
                    println!("Prediction refresh failed: {error}");
                    continue;
                }
                println!(
                    "{} prediction(s) in the next hour",
                    snapshot.entries.len()
                );
                for entry in &snapshot.entries {
                    println!(
                        "  {}  {:<8}  {}  ({})",
                        entry.prediction.predicted_time.format("%H:%M"),
                        entry.risk,
                        entry.prediction.station,
                        entry.prediction.incident_type
                    );
                }
            }
            _ = sweep.tick() => {
                session.notifications_mut().expire(Utc::now());
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    session.unmount();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let args = Args::parse();

    let prefs = match Preferences::load(&args.preferences) {
        Ok(prefs) => prefs,
        Err(e) => {
            log::warn!("Could not load preferences; using defaults: {e}");
            Preferences::default()
        }
    };

    let client = BackendClient::new(&args.base_url)?;

    match args.command.unwrap_or(Command::Watch) {
        Command::Stations => run_stations(&client).await?,
        Command::Stats {
            period,
            date_from,
            date_to,
        } => run_stats(&client, stats_period(period, date_from, date_to)).await?,
        Command::Predictions => run_predictions(&client).await?,
        Command::Sync => run_sync(&client).await?,
        Command::Watch => {
            let api: Arc<dyn BackendApi> = Arc::new(client);
            run_watch(api, prefs, &args.container_id).await?;
        }
    }

    Ok(())
}
