//! Storage-shaped records and their conversions to domain types
//!
//! Records mirror how venues and specials are stored: days as integers,
//! open/close times that may be missing, and recurrence spread over an
//! `is_recurring` flag plus optional cron and weekday-mask columns. Every
//! conversion into the domain is explicit and validating; nothing is
//! defaulted when the stored data is inconsistent.

use crate::domain::errors::ValidationError;
use crate::domain::geo::Coordinate;
use crate::domain::identifiers::{SpecialId, VenueId};
use crate::domain::recurrence::{CronExpression, RecurrenceRule, WeekdaySet};
use crate::domain::schedule::{DayOfWeek, TimeWindow, WeeklySchedule};
use crate::domain::special::{Special, SpecialCategory, SpecialContent};
use crate::domain::venue::{Address, TimeZoneId, Venue, VenueName};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub street: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub country: String,
}

/// One row of a venue's opening hours
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default, with = "wall_clock", skip_serializing_if = "Option::is_none")]
    pub open_time: Option<NaiveTime>,
    #[serde(default, with = "wall_clock", skip_serializing_if = "Option::is_none")]
    pub close_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub id: Uuid,
    pub name: String,
    pub address: AddressRecord,
    pub latitude: f64,
    pub longitude: f64,
    pub time_zone: String,
    #[serde(default)]
    pub schedule: Vec<ScheduleRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRecord {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub content: String,
    pub category: String,
    pub start_date: NaiveDate,
    #[serde(with = "required_wall_clock")]
    pub start_time: NaiveTime,
    #[serde(default, with = "wall_clock", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_schedule: Option<String>,
    /// Bit `n` set means day `n` (0 = Sunday)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_days: Option<u8>,
}

/// A whole catalog as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub venues: Vec<VenueRecord>,
    #[serde(default)]
    pub specials: Vec<SpecialRecord>,
}

impl TryFrom<&ScheduleRecord> for TimeWindow {
    type Error = ValidationError;

    fn try_from(record: &ScheduleRecord) -> Result<Self, Self::Error> {
        let day = DayOfWeek::from_index(record.day_of_week)?;
        if record.is_closed {
            return Ok(TimeWindow::closed(day));
        }
        let open = record.open_time.ok_or(ValidationError::IncompleteWindow {
            day,
            missing: "open",
        })?;
        let close = record.close_time.ok_or(ValidationError::IncompleteWindow {
            day,
            missing: "close",
        })?;
        TimeWindow::open(day, open, close)
    }
}

impl From<&TimeWindow> for ScheduleRecord {
    fn from(window: &TimeWindow) -> Self {
        let hours = window.hours();
        Self {
            day_of_week: window.day().index(),
            is_closed: window.is_closed(),
            open_time: hours.map(|(open, _)| open),
            close_time: hours.map(|(_, close)| close),
        }
    }
}

impl TryFrom<&AddressRecord> for Address {
    type Error = ValidationError;

    fn try_from(record: &AddressRecord) -> Result<Self, Self::Error> {
        Address::try_new(
            record.street.clone(),
            record.city.clone(),
            record.state.clone(),
            record.postal_code.clone(),
            record.country.clone(),
        )
    }
}

impl From<&Address> for AddressRecord {
    fn from(address: &Address) -> Self {
        Self {
            street: address.street.to_string(),
            city: address.locality.to_string(),
            state: address.region.clone(),
            postal_code: address.postcode.clone(),
            country: address.country.to_string(),
        }
    }
}

impl TryFrom<&VenueRecord> for Venue {
    type Error = ValidationError;

    fn try_from(record: &VenueRecord) -> Result<Self, Self::Error> {
        let name = VenueName::try_new(record.name.clone())
            .map_err(|e| ValidationError::invalid_field("venue name", e))?;
        let windows = record
            .schedule
            .iter()
            .map(TimeWindow::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Venue::new(
            VenueId::new(record.id),
            name,
            Address::try_from(&record.address)?,
            Coordinate::try_new(record.latitude, record.longitude)?,
            TimeZoneId::parse(record.time_zone.clone())?,
            WeeklySchedule::new(windows)?,
        ))
    }
}

impl From<&Venue> for VenueRecord {
    fn from(venue: &Venue) -> Self {
        Self {
            id: venue.id.into_inner(),
            name: venue.name.to_string(),
            address: AddressRecord::from(&venue.address),
            latitude: venue.coordinate.lat(),
            longitude: venue.coordinate.lon(),
            time_zone: venue.time_zone.to_string(),
            schedule: venue.schedule.windows().map(ScheduleRecord::from).collect(),
        }
    }
}

/// Fold the three recurrence columns into one rule
fn recurrence_from_columns(record: &SpecialRecord) -> Result<RecurrenceRule, ValidationError> {
    match (
        record.is_recurring,
        record.cron_schedule.as_deref(),
        record.recurring_days,
    ) {
        (false, None, None) => Ok(RecurrenceRule::OneTime),
        (false, _, _) => Err(ValidationError::RecurrenceMismatch(
            "a one-time special cannot carry a cron schedule or recurring days",
        )),
        (true, Some(_), Some(_)) => Err(ValidationError::RecurrenceMismatch(
            "a recurring special needs a cron schedule or recurring days, not both",
        )),
        (true, Some(expression), None) => {
            Ok(RecurrenceRule::Cron(CronExpression::parse(expression)?))
        }
        (true, None, Some(bits)) => Ok(RecurrenceRule::Weekly(WeekdaySet::from_bits(bits)?)),
        (true, None, None) => Err(ValidationError::RecurrenceMismatch(
            "a recurring special needs a cron schedule or recurring days",
        )),
    }
}

impl TryFrom<&SpecialRecord> for Special {
    type Error = ValidationError;

    fn try_from(record: &SpecialRecord) -> Result<Self, Self::Error> {
        let content = SpecialContent::try_new(record.content.clone())
            .map_err(|e| ValidationError::invalid_field("special content", e))?;
        let category: SpecialCategory = record.category.parse()?;

        let mut builder = Special::builder(
            VenueId::new(record.venue_id),
            content,
            category,
            record.start_date,
            record.start_time,
        )
        .id(SpecialId::new(record.id))
        .recurrence(recurrence_from_columns(record)?);
        if let Some(end) = record.end_time {
            builder = builder.end_time(end);
        }
        if let Some(expiration) = record.expiration_date {
            builder = builder.expiration_date(expiration);
        }
        builder.build()
    }
}

impl From<&Special> for SpecialRecord {
    fn from(special: &Special) -> Self {
        let (cron_schedule, recurring_days) = match special.recurrence() {
            RecurrenceRule::OneTime => (None, None),
            RecurrenceRule::Weekly(days) => (None, Some(days.bits())),
            RecurrenceRule::Cron(expression) => (Some(expression.as_str().to_string()), None),
        };
        Self {
            id: special.id().into_inner(),
            venue_id: special.venue_id().into_inner(),
            content: special.content().to_string(),
            category: special.category().to_string(),
            start_date: special.start_date(),
            start_time: special.start_time(),
            end_time: special.end_time(),
            expiration_date: special.expiration_date(),
            is_recurring: special.is_recurring(),
            cron_schedule,
            recurring_days,
        }
    }
}

/// `HH:MM` or `HH:MM:SS` wall-clock times, written back as `HH:MM` when the
/// seconds are zero
mod wall_clock {
    use chrono::{NaiveTime, Timelike};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(super) fn parse<E: de::Error>(raw: &str) -> Result<NaiveTime, E> {
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .map_err(|_| E::custom(format!("'{raw}' is not a HH:MM time")))
    }

    pub(super) fn format(time: &NaiveTime) -> String {
        if time.second() == 0 {
            time.format("%H:%M").to_string()
        } else {
            time.format("%H:%M:%S").to_string()
        }
    }

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => serializer.serialize_some(&format(time)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw))
            .transpose()
    }
}

mod required_wall_clock {
    use super::wall_clock;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&wall_clock::format(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        wall_clock::parse(&String::deserialize(deserializer)?)
    }
}
