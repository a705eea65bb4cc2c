//! Evaluation entry points with an injected clock and zone resolver
//!
//! The pure functions in `venue_hours` and `specials` take a resolved zone
//! and an explicit instant. [`Evaluator`] supplies both from its collaborators
//! and is the only place a venue's zone identifier gets resolved.

use crate::availability::clock::Clock;
use crate::availability::specials::{evaluate_special, next_occurrence, SpecialActivity};
use crate::availability::venue_hours::{
    next_transition_within, open_window_at_local, Availability, Transition,
};
use crate::availability::zone::{to_local, ZoneResolver};
use crate::domain::errors::ValidationError;
use crate::domain::validation_constants::schedule::{
    MIN_TRANSITION_HORIZON_DAYS, TRANSITION_HORIZON_DAYS,
};
use crate::domain::special::Special;
use crate::domain::venue::Venue;
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, instrument, warn};

pub struct Evaluator<C, Z> {
    clock: C,
    zones: Z,
    transition_horizon_days: i64,
}

impl<C: Clock, Z: ZoneResolver> Evaluator<C, Z> {
    pub fn new(clock: C, zones: Z) -> Self {
        Self {
            clock,
            zones,
            transition_horizon_days: TRANSITION_HORIZON_DAYS,
        }
    }

    /// Limit how many local days ahead transitions are searched for
    ///
    /// Anything shorter than [`MIN_TRANSITION_HORIZON_DAYS`] could miss the
    /// next opening of a venue and is widened to it.
    pub fn with_transition_horizon(mut self, days: i64) -> Self {
        if days < MIN_TRANSITION_HORIZON_DAYS {
            warn!(
                requested = days,
                used = MIN_TRANSITION_HORIZON_DAYS,
                "transition horizon too short; widening"
            );
        }
        self.transition_horizon_days = days.max(MIN_TRANSITION_HORIZON_DAYS);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Resolve the venue's zone, failing on identifiers the zone database
    /// does not know
    pub fn zone_for(&self, venue: &Venue) -> Result<Tz> {
        let zone = self.zones.resolve(&venue.time_zone)?;
        debug!(venue = %venue.id, %zone, "resolved venue time zone");
        Ok(zone)
    }

    /// The venue's local calendar date at `instant`
    pub fn local_date(&self, venue: &Venue, instant: DateTime<Utc>) -> Result<NaiveDate> {
        Ok(to_local(instant, self.zone_for(venue)?).date())
    }

    pub fn venue_availability(&self, venue: &Venue) -> Result<Availability> {
        self.venue_availability_at(venue, self.now())
    }

    #[instrument(skip(self, venue), fields(venue = %venue.id))]
    pub fn venue_availability_at(&self, venue: &Venue, at: DateTime<Utc>) -> Result<Availability> {
        let zone = self.zone_for(venue)?;
        let window = open_window_at_local(&venue.schedule, to_local(at, zone)).copied();
        let next_change =
            next_transition_within(&venue.schedule, zone, at, self.transition_horizon_days)
                .instant();
        Ok(Availability {
            is_open: window.is_some(),
            window,
            next_change,
        })
    }

    pub fn next_transition(&self, venue: &Venue) -> Result<Transition> {
        self.next_transition_at(venue, self.now())
    }

    pub fn next_transition_at(&self, venue: &Venue, at: DateTime<Utc>) -> Result<Transition> {
        let zone = self.zone_for(venue)?;
        Ok(next_transition_within(
            &venue.schedule,
            zone,
            at,
            self.transition_horizon_days,
        ))
    }

    pub fn special_activity(&self, special: &Special, venue: &Venue) -> Result<SpecialActivity> {
        self.special_activity_at(special, venue, self.now())
    }

    /// Evaluate a special in its venue's zone
    ///
    /// The special must belong to `venue`.
    #[instrument(skip(self, special, venue), fields(special = %special.id()))]
    pub fn special_activity_at(
        &self,
        special: &Special,
        venue: &Venue,
        at: DateTime<Utc>,
    ) -> Result<SpecialActivity> {
        ensure_owned_by(special, venue)?;
        let zone = self.zone_for(venue)?;
        Ok(evaluate_special(special, at, zone))
    }

    /// Next date, starting from the venue's local today, on which the special
    /// occurs
    pub fn upcoming_occurrence(
        &self,
        special: &Special,
        venue: &Venue,
        horizon_days: u32,
    ) -> Result<Option<NaiveDate>> {
        self.upcoming_occurrence_at(special, venue, self.now(), horizon_days)
    }

    pub fn upcoming_occurrence_at(
        &self,
        special: &Special,
        venue: &Venue,
        at: DateTime<Utc>,
        horizon_days: u32,
    ) -> Result<Option<NaiveDate>> {
        ensure_owned_by(special, venue)?;
        let from = self.local_date(venue, at)?;
        Ok(next_occurrence(special, from, horizon_days))
    }
}

fn ensure_owned_by(special: &Special, venue: &Venue) -> Result<()> {
    if special.venue_id() != venue.id {
        return Err(ValidationError::invalid_field(
            "special",
            format!("{} belongs to venue {}, not {}", special.id(), special.venue_id(), venue.id),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::clock::FixedClock;
    use crate::availability::zone::TzDatabase;
    use crate::domain::geo::Coordinate;
    use crate::domain::identifiers::VenueId;
    use crate::domain::schedule::{DayOfWeek, TimeWindow, WeeklySchedule};
    use crate::domain::special::{SpecialCategory, SpecialContent};
    use crate::domain::venue::{Address, TimeZoneId, VenueName};
    use crate::Error;
    use chrono::{NaiveTime, TimeZone};
    use rstest::rstest;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn venue(zone: &str) -> Venue {
        Venue::new(
            VenueId::generate(),
            VenueName::try_new("The Anchor".to_string()).unwrap(),
            Address::try_new("1 Dock Rd", "Chicago", None, None, "US").unwrap(),
            Coordinate::try_new(41.88, -87.63).unwrap(),
            TimeZoneId::parse(zone).unwrap(),
            WeeklySchedule::new([TimeWindow::open(DayOfWeek::Friday, t(18, 0), t(2, 0)).unwrap()])
                .unwrap(),
        )
    }

    fn evaluator_at(at: DateTime<Utc>) -> Evaluator<FixedClock, TzDatabase> {
        Evaluator::new(FixedClock::new(at), TzDatabase)
    }

    #[test]
    fn availability_uses_injected_clock() {
        // Saturday 01:00 in Chicago
        let evaluator = evaluator_at(Utc.with_ymd_and_hms(2025, 5, 3, 6, 0, 0).unwrap());
        let availability = evaluator.venue_availability(&venue("America/Chicago")).unwrap();
        assert!(availability.is_open);
        assert_eq!(
            availability.next_change,
            Some(Utc.with_ymd_and_hms(2025, 5, 3, 7, 0, 0).unwrap())
        );
    }

    #[rstest]
    #[case(3)]
    #[case(MIN_TRANSITION_HORIZON_DAYS)]
    #[case(30)]
    fn any_transition_horizon_reaches_next_opening(#[case] days: i64) {
        // Saturday noon in Chicago; the next opening is Friday 18:00 CDT
        let evaluator = evaluator_at(Utc.with_ymd_and_hms(2025, 5, 3, 17, 0, 0).unwrap())
            .with_transition_horizon(days);
        let venue = venue("America/Chicago");
        assert_eq!(
            evaluator.next_transition(&venue).unwrap(),
            Transition::At {
                at: Utc.with_ymd_and_hms(2025, 5, 9, 23, 0, 0).unwrap(),
                opens: true
            }
        );
    }

    #[test]
    fn unknown_zone_fails_with_configuration_error() {
        let evaluator = evaluator_at(Utc::now());
        let result = evaluator.venue_availability(&venue("Atlantis/Capital"));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn special_from_another_venue_is_rejected() {
        let evaluator = evaluator_at(Utc::now());
        let special = Special::builder(
            VenueId::generate(),
            SpecialContent::try_new("Oysters".to_string()).unwrap(),
            SpecialCategory::Food,
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            t(17, 0),
        )
        .build()
        .unwrap();

        let result = evaluator.special_activity(&special, &venue("America/Chicago"));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn special_is_evaluated_in_venue_zone() {
        // 2025-05-01 23:30 UTC is 18:30 in Chicago
        let evaluator = evaluator_at(Utc.with_ymd_and_hms(2025, 5, 1, 23, 30, 0).unwrap());
        let venue = venue("America/Chicago");
        let special = Special::builder(
            venue.id,
            SpecialContent::try_new("Oysters".to_string()).unwrap(),
            SpecialCategory::Food,
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            t(17, 0),
        )
        .end_time(t(20, 0))
        .build()
        .unwrap();

        let activity = evaluator.special_activity(&special, &venue).unwrap();
        assert!(activity.is_active);
        assert_eq!(activity.time_remaining, Some(chrono::Duration::minutes(90)));
        assert_eq!(
            evaluator.upcoming_occurrence(&special, &venue, 30).unwrap(),
            Some(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
        );
    }
}
