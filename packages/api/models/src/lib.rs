#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Wire types for the rider-safety backend JSON endpoints.
//!
//! Field names follow the backend contract verbatim — station fields keep
//! their original Spanish names (`nombre`, `troncal`), statistics fields
//! are snake_case. The statistics count mappings are modeled as
//! [`CountMap`], an insertion-ordered map that preserves the JSON
//! document order of its entries; the leaderboard tie-break rule depends
//! on that order surviving deserialization.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use transit_safety_transit_models::{IncidentType, RiskLevel};

/// A transit station as returned by `GET /api/stations`.
///
/// Immutable reference data, fetched once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStation {
    /// Station name.
    pub nombre: String,
    /// Trunk-line identifier grouping multiple stations.
    pub troncal: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// A reported incident as returned by `GET /api/incidents`.
///
/// Append-only from the client's perspective; only the backend creates
/// these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiIncident {
    /// Latitude where the incident was reported.
    pub latitude: f64,
    /// Longitude where the incident was reported.
    pub longitude: f64,
    /// Incident classification.
    pub incident_type: IncidentType,
    /// When the incident occurred (ISO 8601).
    pub occurred_at: DateTime<Utc>,
    /// Name of the nearest station, when the backend resolved one.
    pub nearest_station: Option<String>,
}

/// A predicted incident as returned by `GET /api/predictions`.
///
/// Ephemeral — each polling cycle replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiPrediction {
    /// Station the prediction applies to.
    pub station: String,
    /// Trunk line, when the backend attributes one.
    pub troncal: Option<String>,
    /// Predicted incident classification.
    pub incident_type: IncidentType,
    /// When the incident is predicted to occur (ISO 8601).
    pub predicted_time: DateTime<Utc>,
    /// Probability in `[0, 1]` that the incident occurs.
    pub risk_score: f64,
}

impl ApiPrediction {
    /// Classifies this prediction's risk score.
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

/// An insertion-ordered mapping of names to incident counts.
///
/// JSON objects deserialize into this in document order, which is the
/// "first-seen" order the leaderboard tie-break rule is defined over.
/// Values arrive in two wire shapes — a bare integer or `{"total": n}` —
/// and both normalize to a plain count here; the bare count is the
/// canonical shape and is what serialization emits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountMap {
    entries: Vec<(String, u64)>,
}

impl CountMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Looks up the count for a name, scanning in insertion order.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, count)| *count)
    }
}

impl FromIterator<(String, u64)> for CountMap {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The two wire shapes a count value can arrive in.
#[derive(Deserialize)]
#[serde(untagged)]
enum CountValue {
    /// Bare integer count.
    Plain(u64),
    /// Object wrapper around the count.
    Nested {
        /// The count.
        total: u64,
    },
}

impl CountValue {
    const fn count(self) -> u64 {
        match self {
            Self::Plain(count) | Self::Nested { total: count } => count,
        }
    }
}

impl<'de> Deserialize<'de> for CountMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CountMapVisitor;

        impl<'de> Visitor<'de> for CountMapVisitor {
            type Value = CountMap;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of name to count (int or {\"total\": int})")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, CountValue>()? {
                    entries.push((name, value.count()));
                }
                Ok(CountMap { entries })
            }
        }

        deserializer.deserialize_map(CountMapVisitor)
    }
}

impl Serialize for CountMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, count) in &self.entries {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Aggregate statistics as returned by `GET /api/statistics`.
///
/// Treated as an immutable value, replaced wholesale on each fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStatistics {
    /// Total incidents in the selected period.
    pub total_incidents: u64,
    /// Station with the most incidents, if any incidents exist.
    pub most_affected_station: Option<String>,
    /// Hour of day (0-23) with the most incidents.
    pub most_dangerous_hour: Option<u32>,
    /// Most common incident type name.
    pub most_common_type: Option<String>,
    /// Incident counts per type, in backend order.
    #[serde(default)]
    pub incident_types: CountMap,
    /// Incident counts per station, in backend order.
    #[serde(default)]
    pub top_stations: CountMap,
}

/// Period selector for the statistics endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsPeriod {
    /// All recorded incidents.
    All,
    /// Incidents from today.
    Today,
    /// Incidents from the current week.
    ThisWeek,
    /// Incidents from the current month.
    ThisMonth,
    /// Incidents in an explicit date range.
    Range {
        /// Inclusive start date.
        date_from: NaiveDate,
        /// Inclusive end date.
        date_to: NaiveDate,
    },
}

impl StatsPeriod {
    /// Returns the query-string pairs for this period.
    ///
    /// [`Self::All`] sends no parameters; the coarse periods send
    /// `period=...`; a range sends `dateFrom` and `dateTo`.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::All => Vec::new(),
            Self::Today => vec![("period", "today".to_string())],
            Self::ThisWeek => vec![("period", "week".to_string())],
            Self::ThisMonth => vec![("period", "month".to_string())],
            Self::Range { date_from, date_to } => vec![
                ("dateFrom", date_from.format("%Y-%m-%d").to_string()),
                ("dateTo", date_to.format("%Y-%m-%d").to_string()),
            ],
        }
    }
}

impl std::fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Today => write!(f, "today"),
            Self::ThisWeek => write!(f, "week"),
            Self::ThisMonth => write!(f, "month"),
            Self::Range { date_from, date_to } => write!(f, "{date_from}..{date_to}"),
        }
    }
}
