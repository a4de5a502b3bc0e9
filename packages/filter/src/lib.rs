#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Multi-dimension filtering of stations and incidents.
//!
//! [`FilterState`] holds four independently toggled dimensions (trunk
//! line, station, incident type, security level). [`FilterState::apply`]
//! is a pure function over already-fetched data — it runs synchronously
//! on every change, and the visible set is always the conjunction of
//! all *enabled* dimension predicates. An enabled dimension with no
//! value selected constrains nothing; that is distinct from a disabled
//! dimension, whose stored value is ignored entirely.

use std::collections::BTreeMap;

use transit_safety_api_models::{ApiIncident, ApiStation};
use transit_safety_transit_models::{IncidentType, MarkerSeverity};

/// The four filterable dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterDimension {
    /// Trunk-line identifier (troncal).
    Line,
    /// Station name.
    Station,
    /// Incident classification.
    IncidentType,
    /// Marker severity tier of the station's incident count.
    SecurityLevel,
}

/// A value for one dimension, carrying its own dimension tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Trunk-line identifier.
    Line(String),
    /// Station name.
    Station(String),
    /// Incident classification.
    IncidentType(IncidentType),
    /// Severity tier.
    SecurityLevel(MarkerSeverity),
}

impl FilterValue {
    /// The dimension this value belongs to.
    #[must_use]
    pub const fn dimension(&self) -> FilterDimension {
        match self {
            Self::Line(_) => FilterDimension::Line,
            Self::Station(_) => FilterDimension::Station,
            Self::IncidentType(_) => FilterDimension::IncidentType,
            Self::SecurityLevel(_) => FilterDimension::SecurityLevel,
        }
    }
}

/// One dimension's toggle plus its (possibly unset) selected value.
#[derive(Debug, Clone)]
struct Dimension<T> {
    enabled: bool,
    value: Option<T>,
}

impl<T> Default for Dimension<T> {
    fn default() -> Self {
        Self {
            enabled: false,
            value: None,
        }
    }
}

impl<T> Dimension<T> {
    /// The active constraint: `Some` only when the dimension is both
    /// enabled and has a value.
    fn constraint(&self) -> Option<&T> {
        if self.enabled { self.value.as_ref() } else { None }
    }
}

/// Sparse selection over the four filter dimensions.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    line: Dimension<String>,
    station: Dimension<String>,
    incident_type: Dimension<IncidentType>,
    security_level: Dimension<MarkerSeverity>,
}

impl FilterState {
    /// Creates a state with every dimension disabled and unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables a dimension. The stored value is kept either
    /// way; a disabled dimension simply ignores it.
    pub fn toggle_dimension(&mut self, dimension: FilterDimension, enabled: bool) {
        match dimension {
            FilterDimension::Line => self.line.enabled = enabled,
            FilterDimension::Station => self.station.enabled = enabled,
            FilterDimension::IncidentType => self.incident_type.enabled = enabled,
            FilterDimension::SecurityLevel => self.security_level.enabled = enabled,
        }
    }

    /// Stores a value for the dimension the value belongs to. Does not
    /// change the dimension's enabled state.
    pub fn set_value(&mut self, value: FilterValue) {
        match value {
            FilterValue::Line(line) => self.line.value = Some(line),
            FilterValue::Station(station) => self.station.value = Some(station),
            FilterValue::IncidentType(ty) => self.incident_type.value = Some(ty),
            FilterValue::SecurityLevel(level) => self.security_level.value = Some(level),
        }
    }

    /// Clears the stored value for a dimension, returning it to the
    /// "enabled but unconstrained" pass-through state if enabled.
    pub fn clear_value(&mut self, dimension: FilterDimension) {
        match dimension {
            FilterDimension::Line => self.line.value = None,
            FilterDimension::Station => self.station.value = None,
            FilterDimension::IncidentType => self.incident_type.value = None,
            FilterDimension::SecurityLevel => self.security_level.value = None,
        }
    }

    /// Whether a dimension is currently enabled.
    #[must_use]
    pub const fn is_enabled(&self, dimension: FilterDimension) -> bool {
        match dimension {
            FilterDimension::Line => self.line.enabled,
            FilterDimension::Station => self.station.enabled,
            FilterDimension::IncidentType => self.incident_type.enabled,
            FilterDimension::SecurityLevel => self.security_level.enabled,
        }
    }

    /// Computes the visible subset of stations and incidents.
    ///
    /// Pure and synchronous. Input order is preserved; with every
    /// dimension disabled (or enabled but unset) the inputs come back
    /// unchanged.
    ///
    /// Incidents are attributed to their nearest station: the line and
    /// security-level predicates resolve an incident through that
    /// station, and an incident with no station attribution fails any
    /// such active constraint.
    #[must_use]
    pub fn apply(
        &self,
        stations: &[ApiStation],
        incidents: &[ApiIncident],
    ) -> (Vec<ApiStation>, Vec<ApiIncident>) {
        let line_of: BTreeMap<&str, &str> = stations
            .iter()
            .map(|s| (s.nombre.as_str(), s.troncal.as_str()))
            .collect();

        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for incident in incidents {
            if let Some(station) = incident.nearest_station.as_deref() {
                *counts.entry(station).or_insert(0) += 1;
            }
        }
        let severity_of =
            |station: &str| MarkerSeverity::from_count(counts.get(station).copied().unwrap_or(0));

        let visible_stations: Vec<ApiStation> = stations
            .iter()
            .filter(|station| {
                self.line
                    .constraint()
                    .is_none_or(|line| station.troncal == *line)
                    && self
                        .station
                        .constraint()
                        .is_none_or(|name| station.nombre == *name)
                    && self
                        .security_level
                        .constraint()
                        .is_none_or(|level| severity_of(&station.nombre) == *level)
            })
            .cloned()
            .collect();

        let visible_incidents: Vec<ApiIncident> = incidents
            .iter()
            .filter(|incident| {
                let station = incident.nearest_station.as_deref();
                self.line.constraint().is_none_or(|line| {
                    station.and_then(|s| line_of.get(s).copied()) == Some(line.as_str())
                }) && self
                    .station
                    .constraint()
                    .is_none_or(|name| station == Some(name.as_str()))
                    && self
                        .incident_type
                        .constraint()
                        .is_none_or(|ty| incident.incident_type == *ty)
                    && self
                        .security_level
                        .constraint()
                        .is_none_or(|level| station.is_some_and(|s| severity_of(s) == *level))
            })
            .cloned()
            .collect();

        (visible_stations, visible_incidents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn station(nombre: &str, troncal: &str) -> ApiStation {
        ApiStation {
            nombre: nombre.to_string(),
            troncal: troncal.to_string(),
            latitude: 4.6,
            longitude: -74.1,
        }
    }

    fn incident(ty: IncidentType, nearest: Option<&str>) -> ApiIncident {
        ApiIncident {
            latitude: 4.6,
            longitude: -74.1,
            incident_type: ty,
            occurred_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            nearest_station: nearest.map(ToString::to_string),
        }
    }

    fn fixture() -> (Vec<ApiStation>, Vec<ApiIncident>) {
        let stations = vec![
            station("Portal Norte", "Autonorte"),
            station("Calle 100", "Autonorte"),
            station("Portal Sur", "NQS"),
        ];
        let incidents = vec![
            incident(IncidentType::Theft, Some("Portal Norte")),
            incident(IncidentType::Assault, Some("Portal Sur")),
            incident(IncidentType::Theft, Some("Calle 100")),
            incident(IncidentType::Harassment, None),
        ];
        (stations, incidents)
    }

    #[test]
    fn all_disabled_returns_inputs_unchanged() {
        let (stations, incidents) = fixture();
        let state = FilterState::new();
        let (vs, vi) = state.apply(&stations, &incidents);
        assert_eq!(vs, stations);
        assert_eq!(vi, incidents);
    }

    #[test]
    fn enabled_without_value_is_pass_through() {
        let (stations, incidents) = fixture();
        let mut state = FilterState::new();
        state.toggle_dimension(FilterDimension::Line, true);
        state.toggle_dimension(FilterDimension::IncidentType, true);
        let (vs, vi) = state.apply(&stations, &incidents);
        assert_eq!(vs.len(), stations.len());
        assert_eq!(vi.len(), incidents.len());
    }

    #[test]
    fn disabled_dimension_ignores_stored_value() {
        let (stations, incidents) = fixture();
        let mut state = FilterState::new();
        state.set_value(FilterValue::Line("NQS".to_string()));
        // Value stored but dimension never enabled.
        let (vs, vi) = state.apply(&stations, &incidents);
        assert_eq!(vs.len(), 3);
        assert_eq!(vi.len(), 4);
    }

    #[test]
    fn line_filter_restricts_stations_and_incidents() {
        let (stations, incidents) = fixture();
        let mut state = FilterState::new();
        state.toggle_dimension(FilterDimension::Line, true);
        state.set_value(FilterValue::Line("Autonorte".to_string()));
        let (vs, vi) = state.apply(&stations, &incidents);
        assert_eq!(vs.len(), 2);
        // The unattributed incident fails the line constraint.
        assert_eq!(vi.len(), 2);
        assert!(vi.iter().all(|i| {
            matches!(
                i.nearest_station.as_deref(),
                Some("Portal Norte" | "Calle 100")
            )
        }));
    }

    #[test]
    fn dimensions_combine_with_and() {
        let (stations, incidents) = fixture();
        let mut state = FilterState::new();
        state.toggle_dimension(FilterDimension::Line, true);
        state.set_value(FilterValue::Line("Autonorte".to_string()));
        state.toggle_dimension(FilterDimension::IncidentType, true);
        state.set_value(FilterValue::IncidentType(IncidentType::Theft));
        let (_, vi) = state.apply(&stations, &incidents);
        assert_eq!(vi.len(), 2);

        state.set_value(FilterValue::Station("Calle 100".to_string()));
        state.toggle_dimension(FilterDimension::Station, true);
        let (vs, vi) = state.apply(&stations, &incidents);
        assert_eq!(vs.len(), 1);
        assert_eq!(vi.len(), 1);
    }

    #[test]
    fn clearing_value_restores_full_set() {
        let (stations, incidents) = fixture();
        let mut state = FilterState::new();
        state.toggle_dimension(FilterDimension::Line, true);
        state.set_value(FilterValue::Line("Autonorte".to_string()));
        let (restricted, _) = state.apply(&stations, &incidents);
        assert!(restricted.len() < stations.len());

        state.clear_value(FilterDimension::Line);
        let (vs, vi) = state.apply(&stations, &incidents);
        assert_eq!(vs, stations);
        assert_eq!(vi, incidents);
    }

    #[test]
    fn security_level_filters_by_incident_count() {
        let stations = vec![station("Busy", "A"), station("Quiet", "A")];
        let mut incidents: Vec<ApiIncident> = (0..25)
            .map(|_| incident(IncidentType::Theft, Some("Busy")))
            .collect();
        incidents.push(incident(IncidentType::Theft, Some("Quiet")));

        let mut state = FilterState::new();
        state.toggle_dimension(FilterDimension::SecurityLevel, true);
        state.set_value(FilterValue::SecurityLevel(MarkerSeverity::Medium));
        let (vs, vi) = state.apply(&stations, &incidents);
        assert_eq!(vs.len(), 1);
        assert_eq!(vs[0].nombre, "Busy");
        assert_eq!(vi.len(), 25);
    }

    #[test]
    fn order_is_preserved() {
        let (stations, incidents) = fixture();
        let mut state = FilterState::new();
        state.toggle_dimension(FilterDimension::IncidentType, true);
        state.set_value(FilterValue::IncidentType(IncidentType::Theft));
        let (_, vi) = state.apply(&stations, &incidents);
        assert_eq!(
            vi.iter()
                .map(|i| i.nearest_station.clone().unwrap())
                .collect::<Vec<_>>(),
            ["Portal Norte", "Calle 100"]
        );
    }
}
