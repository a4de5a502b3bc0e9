//! Background polling task for the prediction feed.
//!
//! The poller owns a [`PredictionFeed`] and refreshes it on a fixed
//! interval, publishing each result as an immutable snapshot over a
//! `watch` channel. The render layer subscribes instead of mutating
//! anything itself. Dropping the poller aborts the task, so the timer's
//! lifetime is tied to the owning view — an unmounted view can never be
//! updated.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use transit_safety_api::BackendApi;

use crate::{FeedEntry, PredictionFeed, PredictionSelection};

/// Fixed refresh interval.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Immutable snapshot published after each refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// Visible entries, ascending by predicted time.
    pub entries: Vec<FeedEntry>,
    /// Inline error from the cycle, if the fetch failed.
    pub error: Option<String>,
    /// When the cycle ran. `None` only for the initial empty snapshot.
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Handle to the polling task.
///
/// One poller per mounted view. Dropping it cancels the task.
pub struct PredictionPoller {
    handle: JoinHandle<()>,
    receiver: watch::Receiver<FeedSnapshot>,
}

impl PredictionPoller {
    /// Starts polling immediately (the first refresh happens on spawn,
    /// then every [`POLL_INTERVAL`]).
    ///
    /// Responses apply in arrival order; a stale response can briefly
    /// overwrite a fresher one, which the next cycle corrects.
    #[must_use]
    pub fn spawn(api: Arc<dyn BackendApi>, selection: PredictionSelection) -> Self {
        let (sender, receiver) = watch::channel(FeedSnapshot::default());

        let handle = tokio::spawn(async move {
            let mut feed = PredictionFeed::with_selection(selection);
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let now = Utc::now();
                // refresh already logs and records failures in the feed.
                let _ = feed.refresh(api.as_ref(), now).await;

                let snapshot = FeedSnapshot {
                    entries: feed.entries().to_vec(),
                    error: feed.error().map(ToString::to_string),
                    refreshed_at: Some(now),
                };
                if sender.send(snapshot).is_err() {
                    log::debug!("Prediction poller stopping: no subscribers left");
                    break;
                }
            }
        });

        Self { handle, receiver }
    }

    /// Subscribes to refresh snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.receiver.clone()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn latest(&self) -> FeedSnapshot {
        self.receiver.borrow().clone()
    }
}

impl Drop for PredictionPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::StaticApi;
    use chrono::Duration as ChronoDuration;
    use transit_safety_api_models::ApiPrediction;
    use transit_safety_transit_models::IncidentType;

    #[tokio::test]
    async fn poller_publishes_an_initial_snapshot() {
        let prediction = ApiPrediction {
            station: "Calle 100".to_string(),
            troncal: Some("Autonorte".to_string()),
            incident_type: IncidentType::Robbery,
            predicted_time: Utc::now() + ChronoDuration::minutes(30),
            risk_score: 0.9,
        };
        let api = Arc::new(StaticApi {
            predictions: vec![prediction],
        });

        let poller = PredictionPoller::spawn(api, PredictionSelection::new());
        let mut receiver = poller.subscribe();

        tokio::time::timeout(Duration::from_secs(5), receiver.changed())
            .await
            .expect("no snapshot within 5s")
            .expect("poller dropped its sender");

        let snapshot = receiver.borrow().clone();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].prediction.station, "Calle 100");
        assert!(snapshot.refreshed_at.is_some());
    }

    #[tokio::test]
    async fn dropping_the_poller_cancels_the_task() {
        let api = Arc::new(StaticApi {
            predictions: Vec::new(),
        });
        let poller = PredictionPoller::spawn(api, PredictionSelection::new());
        let mut receiver = poller.subscribe();
        tokio::time::timeout(Duration::from_secs(5), receiver.changed())
            .await
            .expect("no snapshot within 5s")
            .expect("poller dropped its sender");

        drop(poller);
        // The sender side goes away once the task is aborted.
        assert!(
            tokio::time::timeout(Duration::from_secs(5), async {
                while receiver.changed().await.is_ok() {}
            })
            .await
            .is_ok()
        );
    }
}
