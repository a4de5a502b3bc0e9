#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Predictive alert feed.
//!
//! Each refresh fully replaces the prior prediction list — nothing is
//! merged or diffed. The pipeline order is fixed: first the rolling
//! one-hour time window (inclusive at both edges), then the user's
//! line/station selection, then an ascending sort by predicted time.
//! Fetch failures keep the previous list on screen with an inline
//! error; the next polling cycle self-corrects.

pub mod poller;

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use transit_safety_api::{ApiError, BackendApi};
use transit_safety_api_models::{ApiPrediction, ApiStation};
use transit_safety_transit_models::RiskLevel;

/// Rolling window ahead of "now" that predictions are shown for.
#[must_use]
pub fn feed_window() -> Duration {
    Duration::hours(1)
}

/// How the user scopes the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// No additional filtering.
    #[default]
    All,
    /// Keep predictions on the selected trunk lines.
    ByLines,
    /// Keep predictions at the selected stations.
    ByStations,
}

/// The user's line/station selection.
///
/// The selectable stations depend on the selected lines: choosing lines
/// immediately recomputes the eligible-station set and drops selected
/// stations that fall outside it. An empty selection set never means
/// "nothing" — it means "no constraint".
#[derive(Debug, Clone, Default)]
pub struct PredictionSelection {
    mode: FilterMode,
    selected_lines: BTreeSet<String>,
    selected_stations: BTreeSet<String>,
}

impl PredictionSelection {
    /// Creates an unconstrained selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current filter mode.
    #[must_use]
    pub const fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Switches the filter mode. The stored sets are kept.
    pub const fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
    }

    /// Currently selected trunk lines.
    #[must_use]
    pub const fn selected_lines(&self) -> &BTreeSet<String> {
        &self.selected_lines
    }

    /// Currently selected stations.
    #[must_use]
    pub const fn selected_stations(&self) -> &BTreeSet<String> {
        &self.selected_stations
    }

    /// Replaces the selected-line set and reconciles the dependent
    /// station selection: stations no longer eligible under the new
    /// lines are dropped.
    pub fn set_selected_lines(&mut self, lines: BTreeSet<String>, stations: &[ApiStation]) {
        self.selected_lines = lines;
        let eligible: BTreeSet<&str> = self
            .eligible_stations(stations)
            .into_iter()
            .map(|s| s.nombre.as_str())
            .collect();
        self.selected_stations
            .retain(|name| eligible.contains(name.as_str()));
    }

    /// Replaces the selected-station set.
    pub fn set_selected_stations(&mut self, stations: BTreeSet<String>) {
        self.selected_stations = stations;
    }

    /// Stations selectable under the current line selection.
    ///
    /// An empty line selection makes every station eligible.
    #[must_use]
    pub fn eligible_stations<'a>(&self, stations: &'a [ApiStation]) -> Vec<&'a ApiStation> {
        stations
            .iter()
            .filter(|s| {
                self.selected_lines.is_empty() || self.selected_lines.contains(&s.troncal)
            })
            .collect()
    }

    /// Whether the selection keeps a prediction.
    fn keeps(&self, prediction: &ApiPrediction) -> bool {
        match self.mode {
            FilterMode::All => true,
            FilterMode::ByLines => {
                self.selected_lines.is_empty()
                    || prediction
                        .troncal
                        .as_deref()
                        .is_some_and(|line| self.selected_lines.contains(line))
            }
            FilterMode::ByStations => {
                self.selected_stations.is_empty()
                    || self.selected_stations.contains(&prediction.station)
            }
        }
    }
}

/// One rendered feed row: the prediction plus its risk classification.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    /// The prediction.
    pub prediction: ApiPrediction,
    /// Risk classification of the prediction's score.
    pub risk: RiskLevel,
}

/// Runs the filtering pipeline over a raw prediction set.
///
/// Order matters: time window first, then selection, then the ascending
/// sort. The window is `[now, now + 1h]`, inclusive at both edges — a
/// prediction at exactly `now + 1h` is kept, one millisecond later is
/// not.
#[must_use]
pub fn build_feed(
    mut predictions: Vec<ApiPrediction>,
    now: DateTime<Utc>,
    selection: &PredictionSelection,
) -> Vec<FeedEntry> {
    let horizon = now + feed_window();
    predictions.retain(|p| p.predicted_time >= now && p.predicted_time <= horizon);
    predictions.retain(|p| selection.keeps(p));
    predictions.sort_by_key(|p| p.predicted_time);
    predictions
        .into_iter()
        .map(|prediction| {
            let risk = prediction.risk_level();
            FeedEntry { prediction, risk }
        })
        .collect()
}

/// Display-side prediction feed state.
///
/// Holds the raw predictions from the last successful fetch so a
/// selection change can re-derive the visible list synchronously,
/// without a server round trip.
#[derive(Debug, Default)]
pub struct PredictionFeed {
    selection: PredictionSelection,
    raw: Vec<ApiPrediction>,
    entries: Vec<FeedEntry>,
    error: Option<String>,
}

impl PredictionFeed {
    /// Creates an empty feed with an unconstrained selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty feed with the given selection.
    #[must_use]
    pub fn with_selection(selection: PredictionSelection) -> Self {
        Self {
            selection,
            ..Self::default()
        }
    }

    /// The visible feed entries, ascending by predicted time.
    #[must_use]
    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    /// The inline error from the most recent failed refresh.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The current selection.
    #[must_use]
    pub const fn selection(&self) -> &PredictionSelection {
        &self.selection
    }

    /// Fetches a fresh prediction set and rebuilds the visible list.
    ///
    /// Success replaces the whole list; failure keeps the prior list
    /// and records an inline error.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`ApiError`]; the feed state is already
    /// updated either way.
    pub async fn refresh(
        &mut self,
        api: &dyn BackendApi,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        match api.fetch_predictions().await {
            Ok(predictions) => {
                self.raw = predictions;
                self.entries = build_feed(self.raw.clone(), now, &self.selection);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Prediction refresh failed: {e}");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Applies a new line selection and re-derives the visible list
    /// from the already-fetched predictions.
    pub fn set_selected_lines(
        &mut self,
        lines: BTreeSet<String>,
        stations: &[ApiStation],
        now: DateTime<Utc>,
    ) {
        self.selection.set_selected_lines(lines, stations);
        self.entries = build_feed(self.raw.clone(), now, &self.selection);
    }

    /// Applies a new station selection and re-derives the visible list.
    pub fn set_selected_stations(&mut self, stations: BTreeSet<String>, now: DateTime<Utc>) {
        self.selection.set_selected_stations(stations);
        self.entries = build_feed(self.raw.clone(), now, &self.selection);
    }

    /// Switches the filter mode and re-derives the visible list.
    pub fn set_mode(&mut self, mode: FilterMode, now: DateTime<Utc>) {
        self.selection.set_mode(mode);
        self.entries = build_feed(self.raw.clone(), now, &self.selection);
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use async_trait::async_trait;
    use transit_safety_api::{ApiError, BackendApi};
    use transit_safety_api_models::{
        ApiIncident, ApiPrediction, ApiStation, ApiStatistics, StatsPeriod,
    };

    /// Backend fake that serves the same prediction set on every fetch.
    pub(crate) struct StaticApi {
        pub(crate) predictions: Vec<ApiPrediction>,
    }

    #[async_trait]
    impl BackendApi for StaticApi {
        async fn fetch_stations(&self) -> Result<Vec<ApiStation>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_incidents(&self) -> Result<Vec<ApiIncident>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_predictions(&self) -> Result<Vec<ApiPrediction>, ApiError> {
            Ok(self.predictions.clone())
        }

        async fn fetch_statistics(
            &self,
            _period: &StatsPeriod,
        ) -> Result<ApiStatistics, ApiError> {
            Err(ApiError::Status { status: 404 })
        }

        async fn sync_incidents(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }
}
