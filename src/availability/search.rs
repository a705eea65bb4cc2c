//! Exact radius filtering of candidate venues
//!
//! The persistence layer hands over candidates that are already roughly
//! nearby (see [`BoundingBox`]); this module computes exact distances with an
//! injected [`DistanceMetric`], keeps the ones inside the radius and orders
//! them.
//!
//! [`BoundingBox`]: crate::domain::geo::BoundingBox

use crate::domain::geo::{Coordinate, Distance, DistanceUnit};
use crate::domain::identifiers::VenueId;
use crate::domain::validation_constants::distance::EARTH_MEAN_RADIUS_METERS;
use crate::domain::venue::Venue;
use serde::Serialize;
use tracing::warn;

/// Distance between two coordinates, expressed in the requested unit
pub trait DistanceMetric: Send + Sync {
    fn distance(&self, from: Coordinate, to: Coordinate, unit: DistanceUnit) -> f64;
}

/// Great-circle distance on a spherical Earth
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceMetric for Haversine {
    fn distance(&self, from: Coordinate, to: Coordinate, unit: DistanceUnit) -> f64 {
        let (lat1, lat2) = (from.lat().to_radians(), to.lat().to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (to.lon() - from.lon()).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let central_angle = 2.0 * a.sqrt().min(1.0).asin();
        central_angle * EARTH_MEAN_RADIUS_METERS / unit.meters_per_unit()
    }
}

/// Something with an identity and a position
pub trait Locatable {
    fn venue_id(&self) -> VenueId;
    fn coordinate(&self) -> Coordinate;
}

impl Locatable for Venue {
    fn venue_id(&self) -> VenueId {
        self.id
    }

    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

impl<T: Locatable + ?Sized> Locatable for &T {
    fn venue_id(&self) -> VenueId {
        (**self).venue_id()
    }

    fn coordinate(&self) -> Coordinate {
        (**self).coordinate()
    }
}

impl Locatable for (VenueId, Coordinate) {
    fn venue_id(&self) -> VenueId {
        self.0
    }

    fn coordinate(&self) -> Coordinate {
        self.1
    }
}

/// A candidate that fell inside the search radius
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithinRadius<T> {
    pub item: T,
    /// Distance from the search center, in the radius's unit
    pub distance: Distance,
}

/// Candidates no farther than `radius` from `center`, nearest first
///
/// The boundary is inclusive. Candidates at the same distance are ordered by
/// ascending venue id. Distances come back in the radius's unit.
pub fn filter_within_radius<T, M>(
    center: Coordinate,
    radius: Distance,
    candidates: impl IntoIterator<Item = T>,
    metric: &M,
) -> Vec<WithinRadius<T>>
where
    T: Locatable,
    M: DistanceMetric + ?Sized,
{
    let unit = radius.unit();
    let mut matches: Vec<WithinRadius<T>> = candidates
        .into_iter()
        .filter_map(|item| {
            let raw = metric.distance(center, item.coordinate(), unit);
            match Distance::try_new(raw, unit) {
                Ok(distance) => Some(WithinRadius { item, distance }),
                Err(_) => {
                    warn!(
                        venue = %item.venue_id(),
                        distance = raw,
                        "metric returned an unusable distance"
                    );
                    None
                }
            }
        })
        .filter(|candidate| candidate.distance.value() <= radius.value())
        .collect();

    matches.sort_by(|a, b| {
        a.distance
            .value()
            .total_cmp(&b.distance.value())
            .then_with(|| a.item.venue_id().cmp(&b.item.venue_id()))
    });
    matches
}
