#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Transit rider-safety incident taxonomy and classification types.
//!
//! This crate defines the fixed incident-type enumeration shared by the
//! whole system, plus the two pure classifications derived from backend
//! numbers: marker severity (from an incident count) and risk level
//! (from a prediction risk score).

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Incident count at or above which a station marker is drawn as
/// high severity.
pub const HIGH_SEVERITY_THRESHOLD: u64 = 50;

/// Incident count at or above which a station marker is drawn as
/// medium severity.
pub const MEDIUM_SEVERITY_THRESHOLD: u64 = 20;

/// Kinds of rider-safety incidents reported in the system.
///
/// This is a closed enumeration; the backend only ever produces these
/// values. Anything it cannot classify arrives as [`Self::Other`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    /// Theft without force (pickpocketing, bag snatching)
    Theft,
    /// Taking property by force or threat
    Robbery,
    /// Verbal or physical harassment of a rider
    Harassment,
    /// Physical attack on a rider
    Assault,
    /// Damage to stations, vehicles, or rider property
    Vandalism,
    /// Behavior reported as suspicious but not yet an offense
    SuspiciousActivity,
    /// Drug use or sale on the system
    Drugs,
    /// Incidents that don't map to any other type
    Other,
}

impl IncidentType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Theft,
            Self::Robbery,
            Self::Harassment,
            Self::Assault,
            Self::Vandalism,
            Self::SuspiciousActivity,
            Self::Drugs,
            Self::Other,
        ]
    }
}

/// Severity tier for a station marker, derived from the incident count
/// at that station.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkerSeverity {
    /// Fewer than 20 incidents.
    Low,
    /// 20 to 49 incidents.
    Medium,
    /// 50 or more incidents.
    High,
}

impl MarkerSeverity {
    /// Classifies an incident count into a severity tier.
    ///
    /// `>= 50` is high, `>= 20` is medium, anything below is low.
    #[must_use]
    pub const fn from_count(count: u64) -> Self {
        if count >= HIGH_SEVERITY_THRESHOLD {
            Self::High
        } else if count >= MEDIUM_SEVERITY_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Returns the marker color for this tier as a CSS hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#2e7d32",
            Self::Medium => "#f9a825",
            Self::High => "#c62828",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }
}

/// Risk classification for a predicted incident.
///
/// Derived from a backend risk score in `[0, 1]`. The score is scaled to
/// a percentage and partitioned with strict lower bounds: `> 70` is
/// high, `> 40` is medium, everything else is low. The three ranges are
/// disjoint and cover every score, so each score maps to exactly one
/// level.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Percentage score of 40 or below.
    Low,
    /// Percentage score above 40, up to and including 70.
    Medium,
    /// Percentage score strictly above 70.
    High,
}

impl RiskLevel {
    /// Classifies a raw risk score in `[0, 1]`.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        let pct = score * 100.0;
        if pct > 70.0 {
            Self::High
        } else if pct > 40.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Returns the display color for this level as a CSS hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#2e7d32",
            Self::Medium => "#f9a825",
            Self::High => "#c62828",
        }
    }
}
