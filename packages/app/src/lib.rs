#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Session wiring for the rider-safety application.
//!
//! [`SessionView`] is the explicit owner of everything the map screen
//! needs: the map overlay, the filter state, the statistics view, the
//! prediction poller, and the notification center. All of it is created
//! on [`SessionView::mount`] and torn down on [`SessionView::unmount`]
//! — there is no ambient module-level state, and no component talks to
//! another except through the shared backend data. Each backend failure
//! is scoped to the component that triggered it; nothing here aborts
//! the process.

use std::sync::Arc;

use chrono::Utc;
use transit_safety_api::{ApiError, BackendApi};
use transit_safety_api_models::{ApiIncident, ApiStation, StatsPeriod};
use transit_safety_filter::{FilterDimension, FilterState, FilterValue};
use transit_safety_map::{HeadlessBackend, MapError, MapOverlay};
use transit_safety_notifications::NotificationCenter;
use transit_safety_predictions::PredictionSelection;
use transit_safety_predictions::poller::{FeedSnapshot, PredictionPoller};
use transit_safety_prefs::Preferences;
use transit_safety_spatial::StationIndex;
use transit_safety_stats::StatsView;

/// Errors surfaced while mounting or driving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The map could not be created.
    #[error(transparent)]
    Map(#[from] MapError),
}

/// Owner and lifecycle of the map screen's state.
///
/// Created per view entry; the underlying map and the polling task are
/// singletons within one mounted session and are destroyed on unmount,
/// then re-created fresh on re-entry.
pub struct SessionView {
    api: Arc<dyn BackendApi>,
    prefs: Preferences,
    stations: Vec<ApiStation>,
    incidents: Vec<ApiIncident>,
    index: Option<StationIndex>,
    overlay: MapOverlay<HeadlessBackend>,
    filter: FilterState,
    stats: StatsView,
    notifications: NotificationCenter,
    poller: Option<PredictionPoller>,
}

impl SessionView {
    /// Creates an unmounted session.
    #[must_use]
    pub fn new(api: Arc<dyn BackendApi>, prefs: Preferences) -> Self {
        Self {
            api,
            prefs,
            stations: Vec::new(),
            incidents: Vec::new(),
            index: None,
            overlay: MapOverlay::new(HeadlessBackend::default()),
            filter: FilterState::new(),
            stats: StatsView::new(),
            notifications: NotificationCenter::new(),
            poller: None,
        }
    }

    /// Mounts the view: fetches the session's station list, builds the
    /// spatial index, initializes the map, draws the first marker set,
    /// and starts the prediction poller.
    ///
    /// A failed incident fetch or map creation degrades the view (empty
    /// incident layer, error banner) instead of failing the mount; only
    /// a failed station fetch is a mount error, since nothing else can
    /// render without reference data.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Api`] if the station fetch fails.
    pub async fn mount(&mut self, container_id: &str) -> Result<(), SessionError> {
        self.stations = self.api.fetch_stations().await?;
        self.index = Some(StationIndex::build(&self.stations));
        log::info!("Session mounted with {} stations", self.stations.len());

        match self.api.fetch_incidents().await {
            Ok(incidents) => self.incidents = incidents,
            Err(e) => {
                log::warn!("Incident fetch failed; showing empty incident layer: {e}");
                self.incidents = Vec::new();
            }
        }

        if let Err(e) = self.overlay.initialize(container_id) {
            // The overlay keeps the user-visible error state; the rest
            // of the view stays usable without the map.
            log::error!("Map unavailable for this session: {e}");
        }
        self.redraw();

        self.poller = Some(PredictionPoller::spawn(
            Arc::clone(&self.api),
            PredictionSelection::new(),
        ));
        Ok(())
    }

    /// Unmounts the view: stops the polling task and destroys the map.
    pub fn unmount(&mut self) {
        // Dropping the poller aborts its task and timer.
        self.poller = None;
        self.overlay.close();
        log::info!("Session unmounted");
    }

    /// Enables or disables a filter dimension and re-renders.
    pub fn toggle_filter(&mut self, dimension: FilterDimension, enabled: bool) {
        self.filter.toggle_dimension(dimension, enabled);
        self.redraw();
    }

    /// Sets a filter value and re-renders.
    pub fn set_filter_value(&mut self, value: FilterValue) {
        self.filter.set_value(value);
        self.redraw();
    }

    /// Clears a filter value and re-renders.
    pub fn clear_filter_value(&mut self, dimension: FilterDimension) {
        self.filter.clear_value(dimension);
        self.redraw();
    }

    /// The currently visible (filtered) stations and incidents.
    #[must_use]
    pub fn visible(&self) -> (Vec<ApiStation>, Vec<ApiIncident>) {
        self.filter.apply(&self.stations, &self.incidents)
    }

    /// Recomputes the visible subset and redraws every marker.
    ///
    /// Synchronous — filtering runs over already-fetched data.
    fn redraw(&mut self) {
        if !self.overlay.is_ready() {
            return;
        }
        let (stations, incidents) = self.filter.apply(&self.stations, &self.incidents);
        if let Err(e) = self.overlay.set_markers(&stations, &incidents) {
            log::error!("Marker redraw failed: {e}");
        }
    }

    /// Loads statistics for a period. Failures keep the previous
    /// figures with an inline error (see [`StatsView`]).
    pub async fn load_statistics(&mut self, period: StatsPeriod) {
        if let Err(e) = self.stats.load(self.api.as_ref(), period).await {
            log::warn!("Statistics unavailable: {e}");
        }
    }

    /// The station nearest to a position, when the user reports an
    /// incident or recenters the map. Requires location to be enabled.
    #[must_use]
    pub fn nearest_station(&self, latitude: f64, longitude: f64) -> Option<&ApiStation> {
        if !self.prefs.location_enabled {
            return None;
        }
        self.index.as_ref()?.nearest(latitude, longitude)
    }

    /// The latest prediction snapshot, if the poller has produced one.
    #[must_use]
    pub fn latest_predictions(&self) -> Option<FeedSnapshot> {
        self.poller.as_ref().map(PredictionPoller::latest)
    }

    /// Subscribes to prediction snapshots. `None` before mount.
    #[must_use]
    pub fn subscribe_predictions(
        &self,
    ) -> Option<tokio::sync::watch::Receiver<FeedSnapshot>> {
        self.poller.as_ref().map(PredictionPoller::subscribe)
    }

    /// The statistics view.
    #[must_use]
    pub const fn stats(&self) -> &StatsView {
        &self.stats
    }

    /// The map overlay's user-visible error, if map creation failed.
    #[must_use]
    pub fn map_error(&self) -> Option<&str> {
        self.overlay.error_message()
    }

    /// Mutable access to the notification center, for the push/event
    /// hookup and the owning timer loop.
    pub const fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    /// The notification center.
    #[must_use]
    pub const fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// The persisted preference flags this session was created with.
    #[must_use]
    pub const fn prefs(&self) -> &Preferences {
        &self.prefs
    }
}

/// Prints the station list, one-shot.
///
/// # Errors
///
/// Returns [`ApiError`] if the fetch fails.
pub async fn run_stations(api: &dyn BackendApi) -> Result<(), ApiError> {
    let stations = api.fetch_stations().await?;
    println!("{} stations", stations.len());
    for station in &stations {
        println!(
            "  {} [{}] ({:.4}, {:.4})",
            station.nombre, station.troncal, station.latitude, station.longitude
        );
    }
    Ok(())
}

/// Prints a statistics overview for a period, one-shot.
///
/// # Errors
///
/// Returns [`ApiError`] if the fetch fails.
pub async fn run_stats(api: &dyn BackendApi, period: StatsPeriod) -> Result<(), ApiError> {
    let mut view = StatsView::new();
    view.load(api, period).await?;
    let Some(snapshot) = view.snapshot() else {
        return Ok(());
    };
    println!("Total incidents: {}", snapshot.total_incidents);
    if let Some(station) = &snapshot.most_affected_station {
        println!("Most affected station: {station}");
    }
    if let Some(hour) = snapshot.most_dangerous_hour {
        println!("Most dangerous hour: {hour}:00");
    }
    if let Some(ty) = &snapshot.most_common_type {
        println!("Most common type: {ty}");
    }
    println!("Incident types:");
    for row in view.type_leaderboard() {
        println!("  {:>6}  {}", row.count, row.name);
    }
    println!("Top stations:");
    for row in view.station_leaderboard() {
        println!("  {:>6}  {}", row.count, row.name);
    }
    Ok(())
}

/// Prints the current prediction feed, one-shot.
///
/// # Errors
///
/// Returns [`ApiError`] if the fetch fails.
pub async fn run_predictions(api: &dyn BackendApi) -> Result<(), ApiError> {
    use transit_safety_predictions::PredictionFeed;

    let mut feed = PredictionFeed::new();
    feed.refresh(api, Utc::now()).await?;
    if feed.entries().is_empty() {
        println!("No predictions in the next hour");
    }
    for entry in feed.entries() {
        println!(
            "  {}  {:<8}  {}  ({})",
            entry.prediction.predicted_time.format("%H:%M"),
            entry.risk,
            entry.prediction.station,
            entry.prediction.incident_type
        );
    }
    Ok(())
}

/// Triggers a best-effort backend incident sync, one-shot.
///
/// # Errors
///
/// Returns [`ApiError`] if the trigger is rejected.
pub async fn run_sync(api: &dyn BackendApi) -> Result<(), ApiError> {
    api.sync_incidents().await?;
    println!("Sync accepted");
    Ok(())
}
