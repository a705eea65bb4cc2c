//! Venue aggregate and its validated attributes

use crate::domain::errors::ValidationError;
use crate::domain::geo::Coordinate;
use crate::domain::identifiers::VenueId;
use crate::domain::schedule::WeeklySchedule;
use nutype::nutype;
use serde::Serialize;

/// Display name of a venue
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct VenueName(String);

/// A required line of a postal address
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct AddressLine(String);

/// IANA time zone identifier such as `America/Chicago`
///
/// Only the shape is checked here. Whether the zone exists is decided by a
/// `ZoneResolver` when the venue is evaluated.
#[nutype(
    sanitize(trim),
    validate(
        not_empty,
        len_char_max = 64,
        predicate = |id: &str| id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '+'))
    ),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct TimeZoneId(String);

impl TimeZoneId {
    pub fn parse(id: impl Into<String>) -> Result<Self, ValidationError> {
        Self::try_new(id.into()).map_err(|e| ValidationError::invalid_field("time zone", e))
    }
}

/// Postal address
///
/// Region and postcode are optional because not every country uses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub street: AddressLine,
    pub locality: AddressLine,
    pub region: Option<String>,
    pub postcode: Option<String>,
    pub country: AddressLine,
}

impl Address {
    pub fn try_new(
        street: impl Into<String>,
        locality: impl Into<String>,
        region: Option<String>,
        postcode: Option<String>,
        country: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let line = |field: &'static str, value: String| {
            AddressLine::try_new(value).map_err(|e| ValidationError::invalid_field(field, e))
        };
        Ok(Self {
            street: line("street", street.into())?,
            locality: line("locality", locality.into())?,
            region: region.filter(|r| !r.trim().is_empty()),
            postcode: postcode.filter(|p| !p.trim().is_empty()),
            country: line("country", country.into())?,
        })
    }
}

/// A venue: where it is, which zone its clocks run in, and when it is open
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: VenueName,
    pub address: Address,
    pub coordinate: Coordinate,
    pub time_zone: TimeZoneId,
    pub schedule: WeeklySchedule,
}

impl Venue {
    pub fn new(
        id: VenueId,
        name: VenueName,
        address: Address,
        coordinate: Coordinate,
        time_zone: TimeZoneId,
        schedule: WeeklySchedule,
    ) -> Self {
        Self {
            id,
            name,
            address,
            coordinate,
            time_zone,
            schedule,
        }
    }
}
