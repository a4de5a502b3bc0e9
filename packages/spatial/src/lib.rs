#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index over station coordinates.
//!
//! Builds an R-tree from the session's station list and provides
//! nearest-station and radius lookups. Used to attach a nearest-station
//! reference to a reported incident position and to drive the "nearby
//! stations" panel.

use geo::{Distance, Haversine, Point};
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use transit_safety_api_models::ApiStation;

/// Meters per degree of latitude, used to size envelope queries.
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// How many R-tree candidates to refine with the precise haversine
/// distance. Degree-space nearest-neighbor order can differ from
/// great-circle order when candidates span longitudes.
const NEAREST_CANDIDATES: usize = 8;

/// A station stored in the R-tree as a `[lon, lat]` point.
struct StationEntry {
    position: [f64; 2],
    station: ApiStation,
}

impl RTreeObject for StationEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for StationEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx.mul_add(dx, dy * dy)
    }
}

/// Pre-built R-tree over the session's stations.
///
/// Constructed once after the stations fetch and shared read-only for
/// the rest of the session.
pub struct StationIndex {
    tree: RTree<StationEntry>,
}

impl StationIndex {
    /// Builds the index from a station list.
    #[must_use]
    pub fn build(stations: &[ApiStation]) -> Self {
        let entries = stations
            .iter()
            .map(|station| StationEntry {
                position: [station.longitude, station.latitude],
                station: station.clone(),
            })
            .collect();
        let tree = RTree::bulk_load(entries);
        log::debug!("Built station index with {} stations", tree.size());
        Self { tree }
    }

    /// Number of indexed stations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no stations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Returns the station closest to the given position by
    /// great-circle distance.
    #[must_use]
    pub fn nearest(&self, latitude: f64, longitude: f64) -> Option<&ApiStation> {
        self.nearest_with_distance(latitude, longitude)
            .map(|(station, _)| station)
    }

    /// Returns the closest station together with its haversine distance
    /// in meters.
    ///
    /// Candidates come from the R-tree in degree-space order and the
    /// closest few are re-ranked with the precise distance.
    #[must_use]
    pub fn nearest_with_distance(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Option<(&ApiStation, f64)> {
        let origin = Point::new(longitude, latitude);
        self.tree
            .nearest_neighbor_iter(&[longitude, latitude])
            .take(NEAREST_CANDIDATES)
            .map(|entry| {
                let here = Point::new(entry.position[0], entry.position[1]);
                (&entry.station, Haversine.distance(origin, here))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Returns stations within `radius_meters` of the position, closest
    /// first.
    #[must_use]
    pub fn within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Vec<(&ApiStation, f64)> {
        let origin = Point::new(longitude, latitude);

        // Envelope pre-filter in degrees, then precise haversine check.
        let half_lat = radius_meters / METERS_PER_DEGREE_LAT;
        let cos_lat = latitude.to_radians().cos().max(0.01);
        let half_lon = half_lat / cos_lat;
        let envelope = AABB::from_corners(
            [longitude - half_lon, latitude - half_lat],
            [longitude + half_lon, latitude + half_lat],
        );

        let mut matches: Vec<(&ApiStation, f64)> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|entry| {
                let here = Point::new(entry.position[0], entry.position[1]);
                let distance = Haversine.distance(origin, here);
                (distance <= radius_meters).then_some((&entry.station, distance))
            })
            .collect();

        matches.sort_by(|a, b| a.1.total_cmp(&b.1));
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(nombre: &str, latitude: f64, longitude: f64) -> ApiStation {
        ApiStation {
            nombre: nombre.to_string(),
            troncal: "Autonorte".to_string(),
            latitude,
            longitude,
        }
    }

    fn index() -> StationIndex {
        StationIndex::build(&[
            station("Portal Norte", 4.7545, -74.0465),
            station("Calle 100", 4.6866, -74.0521),
            station("Calle 72", 4.6585, -74.0621),
            station("Portal Sur", 4.5781, -74.1534),
        ])
    }

    #[test]
    fn nearest_returns_closest_station() {
        let index = index();
        // A point a few hundred meters from Calle 100.
        let nearest = index.nearest(4.6880, -74.0530).unwrap();
        assert_eq!(nearest.nombre, "Calle 100");
    }

    #[test]
    fn nearest_on_empty_index_is_none() {
        let index = StationIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.nearest(4.6, -74.1).is_none());
    }

    #[test]
    fn nearest_distance_is_plausible() {
        let index = index();
        let (station, meters) = index.nearest_with_distance(4.6866, -74.0521).unwrap();
        assert_eq!(station.nombre, "Calle 100");
        assert!(meters < 1.0, "expected ~0m, got {meters}");
    }

    #[test]
    fn within_radius_is_sorted_and_bounded() {
        let index = index();
        // 4km around Calle 100 covers Calle 72 but not the portals.
        let nearby = index.within_radius(4.6866, -74.0521, 4000.0);
        let names: Vec<_> = nearby.iter().map(|(s, _)| s.nombre.as_str()).collect();
        assert_eq!(names, ["Calle 100", "Calle 72"]);
        assert!(nearby.windows(2).all(|w| w[0].1 <= w[1].1));
    }
}
