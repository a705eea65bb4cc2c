//! Is a venue open, and when does that change?
//!
//! All functions here are pure: they take a schedule, a resolved zone and an
//! instant, and never read a clock.

use crate::availability::zone::{instants_of, offset_changes, to_local};
use crate::domain::schedule::{DayOfWeek, TimeWindow, WeeklySchedule};
use crate::domain::validation_constants::schedule::{
    MIN_TRANSITION_HORIZON_DAYS, TRANSITION_HORIZON_DAYS,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, warn};

/// The next change in a venue's open/closed state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// The venue opens (`opens == true`) or closes at `at`
    At { at: DateTime<Utc>, opens: bool },
    /// The venue never changes state; every day is closed
    Never,
}

impl Transition {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Transition::At { at, .. } => Some(*at),
            Transition::Never => None,
        }
    }
}

/// Result of evaluating a venue's schedule at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub is_open: bool,
    /// The window that makes the venue open: today's, or yesterday's window
    /// running past midnight. `None` while closed.
    pub window: Option<TimeWindow>,
    pub next_change: Option<DateTime<Utc>>,
}

/// The window covering a local date-time, if any
pub fn open_window_at_local(
    schedule: &WeeklySchedule,
    local: NaiveDateTime,
) -> Option<&TimeWindow> {
    let day = DayOfWeek::from(local.weekday());
    let time = local.time();

    let today = schedule.window_for(day);
    if today.contains_same_day(time) {
        return Some(today);
    }
    let yesterday = schedule.window_for(day.previous());
    yesterday.contains_next_day(time).then_some(yesterday)
}

/// Whether the venue is open at a local wall-clock date-time
pub fn is_open_at_local(schedule: &WeeklySchedule, local: NaiveDateTime) -> bool {
    open_window_at_local(schedule, local).is_some()
}

/// Whether the venue is open at `instant`
pub fn is_open(schedule: &WeeklySchedule, zone: Tz, instant: DateTime<Utc>) -> bool {
    is_open_at_local(schedule, to_local(instant, zone))
}

/// The next instant after `instant` at which the venue opens or closes
///
/// Only a bounded number of days is examined, so a schedule closed all week
/// yields [`Transition::Never`] instead of looping.
pub fn next_transition(schedule: &WeeklySchedule, zone: Tz, instant: DateTime<Utc>) -> Transition {
    next_transition_within(schedule, zone, instant, TRANSITION_HORIZON_DAYS)
}

/// [`next_transition`] looking at most `horizon_days` local days ahead
///
/// Horizons shorter than [`MIN_TRANSITION_HORIZON_DAYS`] are widened to it.
/// Besides every reading of each open and close time, the instants where the
/// zone's offset changes are candidates: a repeated hour can reopen a venue
/// and a skipped one can close it.
pub fn next_transition_within(
    schedule: &WeeklySchedule,
    zone: Tz,
    instant: DateTime<Utc>,
    horizon_days: i64,
) -> Transition {
    if schedule.is_closed_all_week() {
        debug!("schedule is closed every day; no transition");
        return Transition::Never;
    }

    let horizon_days = horizon_days.max(MIN_TRANSITION_HORIZON_DAYS);
    let currently_open = is_open(schedule, zone, instant);
    let today = to_local(instant, zone).date();

    let mut boundaries: Vec<DateTime<Utc>> = (-1..=horizon_days)
        .filter_map(|offset| today.checked_add_signed(Duration::days(offset)))
        .flat_map(|date| window_boundaries(schedule, date))
        .flat_map(|local| {
            let resolved = instants_of(local, zone);
            if resolved.is_empty() {
                warn!(%local, %zone, "skipping unresolvable schedule boundary");
            }
            resolved
        })
        .chain(offset_changes(zone, instant, instant + Duration::days(horizon_days)))
        .filter(|at| *at > instant)
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    boundaries
        .into_iter()
        .find_map(|at| {
            let opens = is_open(schedule, zone, at);
            (opens != currently_open).then_some(Transition::At { at, opens })
        })
        .unwrap_or(Transition::Never)
}

// Local open and close date-times of the window that starts on `date`
fn window_boundaries(schedule: &WeeklySchedule, date: NaiveDate) -> Vec<NaiveDateTime> {
    let window = schedule.window_for(DayOfWeek::from(date.weekday()));
    let Some((open, close)) = window.hours() else {
        return Vec::new();
    };

    let close_date = if close < open { date.succ_opt() } else { Some(date) };
    let mut boundaries = vec![date.and_time(open)];
    if let Some(close_date) = close_date {
        boundaries.push(close_date.and_time(close));
    }
    boundaries
}

/// Open/closed state, covering window and next change at `instant`
pub fn evaluate_availability(
    schedule: &WeeklySchedule,
    zone: Tz,
    instant: DateTime<Utc>,
) -> Availability {
    let window = open_window_at_local(schedule, to_local(instant, zone)).copied();
    Availability {
        is_open: window.is_some(),
        window,
        next_change: next_transition(schedule, zone, instant).instant(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};
    use chrono_tz::America::Chicago;
    use rstest::rstest;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn chicago(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Chicago
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    /// Friday 18:00-02:00 only
    fn friday_late() -> WeeklySchedule {
        WeeklySchedule::new([TimeWindow::open(DayOfWeek::Friday, t(18, 0), t(2, 0)).unwrap()])
            .unwrap()
    }

    /// Mon-Fri 09:00-17:00
    fn office_hours() -> WeeklySchedule {
        WeeklySchedule::new(
            [
                DayOfWeek::Monday,
                DayOfWeek::Tuesday,
                DayOfWeek::Wednesday,
                DayOfWeek::Thursday,
                DayOfWeek::Friday,
            ]
            .map(|day| TimeWindow::open(day, t(9, 0), t(17, 0)).unwrap()),
        )
        .unwrap()
    }

    // 2025-05-02 is a Friday
    #[rstest]
    #[case(chicago(2025, 5, 2, 17, 59), false)]
    #[case(chicago(2025, 5, 2, 18, 0), true)]
    #[case(chicago(2025, 5, 2, 23, 59), true)]
    #[case(chicago(2025, 5, 3, 1, 0), true)]
    #[case(chicago(2025, 5, 3, 1, 59), true)]
    #[case(chicago(2025, 5, 3, 2, 0), false)]
    #[case(chicago(2025, 5, 3, 3, 0), false)]
    #[case(chicago(2025, 5, 3, 18, 30), false)]
    fn overnight_friday_window(#[case] at: DateTime<Utc>, #[case] expected: bool) {
        assert_eq!(is_open(&friday_late(), Chicago, at), expected);
    }

    #[test]
    fn same_day_window_excludes_close_time() {
        let schedule = office_hours();
        assert!(is_open(&schedule, Chicago, chicago(2025, 5, 5, 9, 0)));
        assert!(is_open(&schedule, Chicago, chicago(2025, 5, 5, 16, 59)));
        assert!(!is_open(&schedule, Chicago, chicago(2025, 5, 5, 17, 0)));
        assert!(!is_open(&schedule, Chicago, chicago(2025, 5, 4, 12, 0)));
    }

    #[test]
    fn midnight_close_is_exclusive_and_does_not_leak_into_next_day() {
        let schedule = WeeklySchedule::new([
            TimeWindow::open(DayOfWeek::Saturday, t(20, 0), t(0, 0)).unwrap(),
        ])
        .unwrap();
        assert!(is_open(&schedule, Chicago, chicago(2025, 5, 3, 23, 59)));
        assert!(!is_open(&schedule, Chicago, chicago(2025, 5, 4, 0, 0)));
        assert_eq!(
            next_transition(&schedule, Chicago, chicago(2025, 5, 3, 21, 0)),
            Transition::At {
                at: chicago(2025, 5, 4, 0, 0),
                opens: false
            }
        );
    }

    #[test]
    fn early_morning_uses_yesterdays_overnight_window() {
        let saturday_one_am = chicago(2025, 5, 3, 1, 0);
        let availability = evaluate_availability(&friday_late(), Chicago, saturday_one_am);
        assert!(availability.is_open);
        assert_eq!(
            availability.window.map(|w| w.day()),
            Some(DayOfWeek::Friday)
        );
        assert_eq!(availability.next_change, Some(chicago(2025, 5, 3, 2, 0)));
    }

    #[test]
    fn closed_day_does_not_spill_over() {
        // Thursday is closed; Friday 01:00 must not be treated as open
        assert!(!is_open(&friday_late(), Chicago, chicago(2025, 5, 2, 1, 0)));
    }

    #[test]
    fn next_transition_finds_next_opening() {
        // Saturday noon: next opening is the following Friday 18:00
        assert_eq!(
            next_transition(&friday_late(), Chicago, chicago(2025, 5, 3, 12, 0)),
            Transition::At {
                at: chicago(2025, 5, 9, 18, 0),
                opens: true
            }
        );
    }

    #[test]
    fn next_transition_skips_seamless_handover_between_days() {
        // Open until midnight Monday and from midnight Tuesday: no change at 00:00
        let schedule = WeeklySchedule::new([
            TimeWindow::open(DayOfWeek::Monday, t(12, 0), t(0, 0)).unwrap(),
            TimeWindow::open(DayOfWeek::Tuesday, t(0, 0), t(3, 0)).unwrap(),
        ])
        .unwrap();
        assert_eq!(
            next_transition(&schedule, Chicago, chicago(2025, 5, 5, 22, 0)),
            Transition::At {
                at: chicago(2025, 5, 6, 3, 0),
                opens: false
            }
        );
    }

    #[test]
    fn short_horizon_is_widened_to_reach_next_opening() {
        let saturday_noon = chicago(2025, 5, 3, 12, 0);
        assert_eq!(
            next_transition_within(&friday_late(), Chicago, saturday_noon, 3),
            Transition::At {
                at: chicago(2025, 5, 9, 18, 0),
                opens: true
            }
        );
    }

    /// Saturday 20:00-01:30; clocks fall back from 02:00 CDT to 01:00 CST
    /// early on Sunday 2 Nov 2025
    fn closes_inside_repeated_hour() -> WeeklySchedule {
        WeeklySchedule::new([
            TimeWindow::open(DayOfWeek::Saturday, t(20, 0), t(1, 30)).unwrap(),
        ])
        .unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn repeated_hour_reopens_a_venue_that_closed_inside_it() {
        let schedule = closes_inside_repeated_hour();

        // 01:30 CDT: first close
        assert_eq!(
            next_transition(&schedule, Chicago, utc(2025, 11, 2, 6, 0)),
            Transition::At {
                at: utc(2025, 11, 2, 6, 30),
                opens: false
            }
        );
        // 01:45 CDT: wall clock falls back to 01:00 CST and the window applies again
        assert!(!is_open(&schedule, Chicago, utc(2025, 11, 2, 6, 45)));
        assert_eq!(
            next_transition(&schedule, Chicago, utc(2025, 11, 2, 6, 45)),
            Transition::At {
                at: utc(2025, 11, 2, 7, 0),
                opens: true
            }
        );
        // 01:30 CST: second close
        assert_eq!(
            next_transition(&schedule, Chicago, utc(2025, 11, 2, 7, 0)),
            Transition::At {
                at: utc(2025, 11, 2, 7, 30),
                opens: false
            }
        );
    }

    #[test]
    fn skipped_hour_closes_a_venue_open_until_inside_it() {
        // Saturday 22:00-02:30; 02:30 never happens on 9 Mar 2025
        let schedule = WeeklySchedule::new([
            TimeWindow::open(DayOfWeek::Saturday, t(22, 0), t(2, 30)).unwrap(),
        ])
        .unwrap();
        assert_eq!(
            next_transition(&schedule, Chicago, utc(2025, 3, 9, 7, 30)),
            Transition::At {
                at: utc(2025, 3, 9, 8, 0),
                opens: false
            }
        );
    }

    #[test]
    fn next_transition_is_never_when_closed_all_week() {
        let schedule = WeeklySchedule::closed();
        assert_eq!(
            next_transition(&schedule, Chicago, chicago(2025, 5, 3, 12, 0)),
            Transition::Never
        );
        let availability = evaluate_availability(&schedule, Chicago, chicago(2025, 5, 3, 12, 0));
        assert!(!availability.is_open);
        assert_eq!(availability.window, None);
        assert_eq!(availability.next_change, None);
    }

    #[test]
    fn evaluation_follows_venue_zone() {
        // 23:30 UTC Friday is 18:30 in Chicago (open) but 00:30 Saturday in London
        let at = Utc.with_ymd_and_hms(2025, 5, 2, 23, 30, 0).unwrap();
        assert!(is_open(&friday_late(), Chicago, at));
        assert!(is_open(&friday_late(), chrono_tz::Europe::London, at));
        let at = Utc.with_ymd_and_hms(2025, 5, 3, 2, 30, 0).unwrap();
        assert!(is_open(&friday_late(), Chicago, at));
        assert!(!is_open(&friday_late(), chrono_tz::Europe::London, at));
    }

    #[test]
    fn local_evaluation_ignores_zones() {
        let friday_evening = NaiveDate::from_ymd_opt(2025, 5, 2)
            .unwrap()
            .and_time(t(19, 0));
        assert!(is_open_at_local(&friday_late(), friday_evening));
    }
}
