//! Geographic value types: coordinates, distances and bounding boxes
//!
//! Distances always carry their unit explicitly. Nothing in this module
//! computes great-circle distance; that belongs to a [`DistanceMetric`]
//! (see `availability::search`).
//!
//! [`DistanceMetric`]: crate::availability::search::DistanceMetric

use crate::domain::errors::ValidationError;
use crate::domain::validation_constants::{coordinate, distance};
use derive_more::Display;
use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Latitude in decimal degrees
#[nutype(
    validate(finite, greater_or_equal = -90.0, less_or_equal = 90.0),
    derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Display)
)]
pub struct Latitude(f64);

/// Longitude in decimal degrees
#[nutype(
    validate(finite, greater_or_equal = -180.0, less_or_equal = 180.0),
    derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Display)
)]
pub struct Longitude(f64);

/// A point on the Earth's surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: Latitude,
    pub longitude: Longitude,
}

impl Coordinate {
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            latitude: Latitude::try_new(latitude)
                .map_err(|e| ValidationError::invalid_field("latitude", e))?,
            longitude: Longitude::try_new(longitude)
                .map_err(|e| ValidationError::invalid_field("longitude", e))?,
        })
    }

    pub fn lat(&self) -> f64 {
        self.latitude.into_inner()
    }

    pub fn lon(&self) -> f64 {
        self.longitude.into_inner()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat(), self.lon())
    }
}

/// Unit a distance is expressed in
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    #[display("mi")]
    Miles,
    #[display("km")]
    Kilometers,
}

impl DistanceUnit {
    pub fn meters_per_unit(self) -> f64 {
        match self {
            DistanceUnit::Miles => distance::METERS_PER_MILE,
            DistanceUnit::Kilometers => distance::METERS_PER_KILOMETER,
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mi" | "mile" | "miles" => Ok(DistanceUnit::Miles),
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
                Ok(DistanceUnit::Kilometers)
            }
            other => Err(ValidationError::invalid_field(
                "distance unit",
                format!("'{other}' is neither miles nor kilometers"),
            )),
        }
    }
}

/// A non-negative, finite distance with an explicit unit
///
/// Comparisons between distances are unit-aware.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Distance {
    value: f64,
    unit: DistanceUnit,
}

impl Distance {
    pub fn try_new(value: f64, unit: DistanceUnit) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::invalid_field(
                "distance",
                format!("{value} {unit} must be finite and non-negative"),
            ));
        }
        Ok(Self { value, unit })
    }

    pub fn miles(value: f64) -> Result<Self, ValidationError> {
        Self::try_new(value, DistanceUnit::Miles)
    }

    pub fn kilometers(value: f64) -> Result<Self, ValidationError> {
        Self::try_new(value, DistanceUnit::Kilometers)
    }

    pub fn from_meters(meters: f64) -> Result<Self, ValidationError> {
        Self::kilometers(meters / distance::METERS_PER_KILOMETER)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    pub fn as_meters(&self) -> f64 {
        self.value * self.unit.meters_per_unit()
    }

    pub fn as_miles(&self) -> f64 {
        self.in_unit(DistanceUnit::Miles)
    }

    pub fn as_kilometers(&self) -> f64 {
        self.in_unit(DistanceUnit::Kilometers)
    }

    pub fn in_unit(&self, unit: DistanceUnit) -> f64 {
        if unit == self.unit {
            self.value
        } else {
            self.as_meters() / unit.meters_per_unit()
        }
    }

    /// Re-express this distance in another unit
    pub fn to_unit(self, unit: DistanceUnit) -> Self {
        Self {
            value: self.in_unit(unit),
            unit,
        }
    }
}

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(std::cmp::Ordering::Equal)
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        // Same-unit comparisons avoid a conversion round trip so that a value
        // exactly on a boundary stays exactly on it.
        if self.unit == other.unit {
            self.value.partial_cmp(&other.value)
        } else {
            self.as_meters().partial_cmp(&other.as_meters())
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.value, self.unit)
    }
}

/// A latitude/longitude box used as a coarse prefilter before exact radius
/// filtering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// The smallest box that contains every point within `radius` of `center`
    ///
    /// Near the poles, or when the box would wrap the antimeridian, the
    /// longitude range widens to the whole globe.
    pub fn around(center: Coordinate, radius: Distance) -> Self {
        let angular = radius.as_meters() / distance::EARTH_MEAN_RADIUS_METERS;
        let lat = center.lat().to_radians();
        let lon = center.lon().to_radians();

        let min_lat = lat - angular;
        let max_lat = lat + angular;
        let pole_lat = coordinate::MAX_LATITUDE.to_radians();

        let full_range = (coordinate::MIN_LONGITUDE, coordinate::MAX_LONGITUDE);
        let (min_longitude, max_longitude) = if min_lat > -pole_lat && max_lat < pole_lat {
            let delta = (angular.sin() / lat.cos()).clamp(-1.0, 1.0).asin();
            let (min_lon, max_lon) = ((lon - delta).to_degrees(), (lon + delta).to_degrees());
            if min_lon < coordinate::MIN_LONGITUDE || max_lon > coordinate::MAX_LONGITUDE {
                full_range
            } else {
                (min_lon, max_lon)
            }
        } else {
            full_range
        };

        Self {
            min_latitude: min_lat.to_degrees().max(coordinate::MIN_LATITUDE),
            max_latitude: max_lat.to_degrees().min(coordinate::MAX_LATITUDE),
            min_longitude,
            max_longitude,
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.lat())
            && (self.min_longitude..=self.max_longitude).contains(&point.lon())
    }
}
