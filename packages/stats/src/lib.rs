#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics dashboard view state.
//!
//! [`StatsView`] issues one fetch per period change and replaces the
//! whole displayed snapshot atomically on success — partial merges with
//! stale data would show mismatched old/new figures. On failure the
//! last successfully loaded snapshot stays on screen next to an inline
//! error, and nothing retries silently. The two leaderboards are
//! re-derived from the snapshot's count mappings on demand.

use transit_safety_api::{ApiError, BackendApi};
use transit_safety_api_models::{ApiStatistics, CountMap, StatsPeriod};

/// One row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Incident-type or station name.
    pub name: String,
    /// Incident count.
    pub count: u64,
}

/// Display-side statistics state for one mounted dashboard.
#[derive(Debug)]
pub struct StatsView {
    period: StatsPeriod,
    snapshot: Option<ApiStatistics>,
    error: Option<String>,
}

impl Default for StatsView {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsView {
    /// Creates an empty view showing the all-time period.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            period: StatsPeriod::All,
            snapshot: None,
            error: None,
        }
    }

    /// Fetches statistics for `period` and updates the view.
    ///
    /// On success the displayed snapshot is replaced wholesale and any
    /// prior error is cleared. On failure the previous snapshot is
    /// preserved and the error is recorded for inline display; there is
    /// no automatic retry.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`ApiError`] so the caller can log it in
    /// context; the view state is already updated either way.
    pub async fn load(
        &mut self,
        api: &dyn BackendApi,
        period: StatsPeriod,
    ) -> Result<(), ApiError> {
        self.period = period.clone();
        match api.fetch_statistics(&period).await {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Statistics load for period '{period}' failed: {e}");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// The period most recently requested.
    #[must_use]
    pub const fn period(&self) -> &StatsPeriod {
        &self.period
    }

    /// The last successfully loaded snapshot, if any.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&ApiStatistics> {
        self.snapshot.as_ref()
    }

    /// The inline error message from the most recent failed load.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Incident-type leaderboard, most incidents first.
    #[must_use]
    pub fn type_leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.snapshot
            .as_ref()
            .map_or_else(Vec::new, |s| leaderboard(&s.incident_types))
    }

    /// Affected-station leaderboard, most incidents first.
    #[must_use]
    pub fn station_leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.snapshot
            .as_ref()
            .map_or_else(Vec::new, |s| leaderboard(&s.top_stations))
    }
}

/// Sorts a count mapping descending by count.
///
/// The sort is stable over the mapping's insertion order, so ties keep
/// their first-seen order from the source JSON.
fn leaderboard(counts: &CountMap) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = counts
        .iter()
        .map(|(name, count)| LeaderboardEntry {
            name: name.to_string(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use transit_safety_api_models::{ApiIncident, ApiPrediction, ApiStation};

    /// Backend fake that replays a scripted sequence of statistics
    /// responses.
    struct ScriptedApi {
        statistics: Mutex<VecDeque<Result<ApiStatistics, ApiError>>>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<Result<ApiStatistics, ApiError>>) -> Self {
            Self {
                statistics: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl BackendApi for ScriptedApi {
        async fn fetch_stations(&self) -> Result<Vec<ApiStation>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_incidents(&self) -> Result<Vec<ApiIncident>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_predictions(&self) -> Result<Vec<ApiPrediction>, ApiError> {
            Ok(Vec::new())
        }

        async fn fetch_statistics(
            &self,
            _period: &StatsPeriod,
        ) -> Result<ApiStatistics, ApiError> {
            self.statistics
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected statistics fetch")
        }

        async fn sync_incidents(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn snapshot(total: u64) -> ApiStatistics {
        serde_json::from_value(serde_json::json!({
            "total_incidents": total,
            "most_affected_station": "Calle 100",
            "most_dangerous_hour": 18,
            "most_common_type": "THEFT",
            "incident_types": {"THEFT": 30, "ASSAULT": 12},
            "top_stations": {"Calle 100": {"total": 25}, "Marly": 17}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn success_replaces_snapshot_atomically() {
        let api = ScriptedApi::new(vec![Ok(snapshot(42))]);
        let mut view = StatsView::new();
        view.load(&api, StatsPeriod::All).await.unwrap();
        assert_eq!(view.snapshot().unwrap().total_incidents, 42);
        assert!(view.error().is_none());
    }

    #[tokio::test]
    async fn failure_preserves_last_good_snapshot() {
        let api = ScriptedApi::new(vec![
            Ok(snapshot(42)),
            Err(ApiError::Status { status: 500 }),
        ]);
        let mut view = StatsView::new();
        view.load(&api, StatsPeriod::All).await.unwrap();

        let result = view.load(&api, StatsPeriod::Today).await;
        assert!(result.is_err());
        // Last-good figures stay on screen, with an inline error.
        assert_eq!(view.snapshot().unwrap().total_incidents, 42);
        assert!(view.error().unwrap().contains("500"));
        assert_eq!(view.period(), &StatsPeriod::Today);
    }

    #[tokio::test]
    async fn success_after_failure_clears_the_error() {
        let api = ScriptedApi::new(vec![
            Err(ApiError::Status { status: 503 }),
            Ok(snapshot(7)),
        ]);
        let mut view = StatsView::new();
        assert!(view.load(&api, StatsPeriod::All).await.is_err());
        assert!(view.snapshot().is_none());

        view.load(&api, StatsPeriod::All).await.unwrap();
        assert_eq!(view.snapshot().unwrap().total_incidents, 7);
        assert!(view.error().is_none());
    }

    #[test]
    fn leaderboard_is_descending_with_stable_ties() {
        let counts: CountMap =
            serde_json::from_str(r#"{"A": 5, "B": 9, "C": 9}"#).unwrap();
        let rows = leaderboard(&counts);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        // B and C tie on 9; B keeps its first-seen position.
        assert_eq!(names, ["B", "C", "A"]);
    }

    #[tokio::test]
    async fn leaderboards_come_from_the_snapshot() {
        let api = ScriptedApi::new(vec![Ok(snapshot(42))]);
        let mut view = StatsView::new();
        assert!(view.type_leaderboard().is_empty());

        view.load(&api, StatsPeriod::All).await.unwrap();
        let types = view.type_leaderboard();
        assert_eq!(types[0].name, "THEFT");
        assert_eq!(types[0].count, 30);
        let stations = view.station_leaderboard();
        assert_eq!(stations[0].name, "Calle 100");
        assert_eq!(stations[0].count, 25);
    }
}
