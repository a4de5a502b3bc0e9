#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map overlay controller.
//!
//! [`MapOverlay`] owns a single map instance created through the
//! [`MapBackend`] seam (the external map widget's documented API lives
//! behind it). Marker updates are full clear-and-redraw — no incremental
//! diffing — which trades efficiency for correctness simplicity. If the
//! backend fails to create the map (library load failure), the overlay
//! enters a sticky failed state for the rest of the view's life and
//! never retries on its own.

use std::collections::BTreeMap;

use transit_safety_api_models::{ApiIncident, ApiStation};
use transit_safety_transit_models::MarkerSeverity;

/// Errors from the map overlay.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MapError {
    /// The underlying map library failed to load or create the map.
    #[error("map backend unavailable: {message}")]
    BackendUnavailable {
        /// What the backend reported.
        message: String,
    },

    /// A drawing call arrived before `initialize` succeeded.
    #[error("map is not initialized")]
    NotInitialized,
}

/// A marker to draw on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// CSS hex color, derived from [`MarkerSeverity`].
    pub color: &'static str,
    /// Label shown in the marker popup.
    pub label: String,
}

/// Seam over the external map widget.
///
/// One implementation wraps the real map library; [`HeadlessBackend`]
/// records calls for tests and terminal sessions.
pub trait MapBackend {
    /// Creates the underlying map inside the named container.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::BackendUnavailable`] if the map library
    /// cannot be loaded.
    fn create(&mut self, container_id: &str) -> Result<(), MapError>;

    /// Draws one marker.
    fn add_marker(&mut self, marker: &Marker);

    /// Removes every drawn marker.
    fn clear_markers(&mut self);

    /// Destroys the map and detaches its listeners.
    fn destroy(&mut self);
}

/// Lifecycle state of the overlay.
#[derive(Debug)]
enum OverlayState {
    /// No map yet.
    Idle,
    /// Map created and accepting marker updates.
    Ready {
        container_id: String,
    },
    /// Map creation failed; unavailable for the rest of the session.
    Failed {
        message: String,
    },
}

/// Owns the single map instance for a mounted view.
///
/// Created on mount, torn down with [`MapOverlay::close`] on unmount;
/// re-entry builds a fresh overlay (no pooling).
pub struct MapOverlay<B> {
    backend: B,
    state: OverlayState,
}

impl<B: MapBackend> MapOverlay<B> {
    /// Wraps a backend; no map exists until [`Self::initialize`].
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            state: OverlayState::Idle,
        }
    }

    /// Creates the underlying map in `container_id`.
    ///
    /// Idempotent: a second call while the map is live is a no-op and
    /// the map is not re-created.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::BackendUnavailable`] if creation fails, and
    /// on every later call for this overlay — the failure is sticky and
    /// is never retried automatically.
    pub fn initialize(&mut self, container_id: &str) -> Result<(), MapError> {
        match &self.state {
            OverlayState::Ready { container_id: live } => {
                log::debug!("Map already initialized in '{live}'; ignoring initialize");
                Ok(())
            }
            OverlayState::Failed { message } => Err(MapError::BackendUnavailable {
                message: message.clone(),
            }),
            OverlayState::Idle => match self.backend.create(container_id) {
                Ok(()) => {
                    log::info!("Map created in container '{container_id}'");
                    self.state = OverlayState::Ready {
                        container_id: container_id.to_string(),
                    };
                    Ok(())
                }
                Err(e) => {
                    log::error!("Map creation failed: {e}");
                    self.state = OverlayState::Failed {
                        message: e.to_string(),
                    };
                    Err(e)
                }
            },
        }
    }

    /// Whether the map is live and accepting marker updates.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, OverlayState::Ready { .. })
    }

    /// The user-visible error message, if map creation failed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            OverlayState::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Clears all previously drawn markers and draws the new set.
    ///
    /// Station markers are colored by the severity tier of the
    /// station's incident count; each incident is drawn at its own
    /// position with the color of the station it is attributed to.
    /// Returns the number of markers drawn.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NotInitialized`] if no map is live.
    pub fn set_markers(
        &mut self,
        stations: &[ApiStation],
        incidents: &[ApiIncident],
    ) -> Result<usize, MapError> {
        if !self.is_ready() {
            return Err(MapError::NotInitialized);
        }

        let counts = incident_counts(incidents);
        let severity_of =
            |station: &str| MarkerSeverity::from_count(counts.get(station).copied().unwrap_or(0));

        self.backend.clear_markers();

        let mut drawn = 0;
        for station in stations {
            let count = counts.get(station.nombre.as_str()).copied().unwrap_or(0);
            self.backend.add_marker(&Marker {
                latitude: station.latitude,
                longitude: station.longitude,
                color: severity_of(&station.nombre).color(),
                label: format!("{} ({count} incidents)", station.nombre),
            });
            drawn += 1;
        }

        for incident in incidents {
            let color = incident
                .nearest_station
                .as_deref()
                .map_or(MarkerSeverity::Low, |s| severity_of(s))
                .color();
            self.backend.add_marker(&Marker {
                latitude: incident.latitude,
                longitude: incident.longitude,
                color,
                label: incident.incident_type.to_string(),
            });
            drawn += 1;
        }

        log::debug!("Redrew {drawn} markers");
        Ok(drawn)
    }

    /// Destroys the map and detaches listeners. A later
    /// [`Self::initialize`] creates a fresh map.
    pub fn close(&mut self) {
        if self.is_ready() {
            self.backend.destroy();
            log::info!("Map closed");
        }
        self.state = OverlayState::Idle;
    }
}

/// Counts incidents per nearest station.
#[must_use]
pub fn incident_counts(incidents: &[ApiIncident]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for incident in incidents {
        if let Some(station) = &incident.nearest_station {
            *counts.entry(station.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// In-memory backend that records drawing calls.
///
/// Stands in where no real map widget is mounted (terminal sessions)
/// and doubles as the scripted backend in tests.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    /// Markers currently drawn.
    pub markers: Vec<Marker>,
    /// Number of `create` calls that succeeded.
    pub create_calls: usize,
    /// Number of `clear_markers` calls.
    pub clear_calls: usize,
    /// Number of `destroy` calls.
    pub destroy_calls: usize,
    /// When set, `create` fails with this message.
    pub fail_create_with: Option<String>,
}

impl MapBackend for HeadlessBackend {
    fn create(&mut self, container_id: &str) -> Result<(), MapError> {
        if let Some(message) = &self.fail_create_with {
            return Err(MapError::BackendUnavailable {
                message: message.clone(),
            });
        }
        self.create_calls += 1;
        log::debug!("Headless map created in '{container_id}'");
        Ok(())
    }

    fn add_marker(&mut self, marker: &Marker) {
        self.markers.push(marker.clone());
    }

    fn clear_markers(&mut self) {
        self.clear_calls += 1;
        self.markers.clear();
    }

    fn destroy(&mut self) {
        self.destroy_calls += 1;
        self.markers.clear();
    }
}
