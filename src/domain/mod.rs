//! Domain types for Pulse venue availability
//!
//! This module contains the value types that describe venues, their weekly
//! opening hours, and the specials they run. Every type validates itself on
//! construction so the evaluators can treat their inputs as well-formed.

pub mod errors;
pub mod geo;
pub mod identifiers;
pub mod recurrence;
pub mod schedule;
pub mod special;
pub mod validation_constants;
pub mod venue;

pub use errors::{ConfigurationError, ValidationError};
pub use geo::{BoundingBox, Coordinate, Distance, DistanceUnit};
pub use identifiers::{SpecialId, VenueId};
pub use recurrence::{CronExpression, RecurrenceRule, WeekdaySet};
pub use schedule::{DayOfWeek, TimeWindow, WeeklySchedule};
pub use special::{Special, SpecialBuilder, SpecialCategory, SpecialContent};
pub use venue::{Address, TimeZoneId, Venue, VenueName};
