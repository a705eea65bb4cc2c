//! Is a special running, and for how much longer?

use crate::availability::zone::{next_instant_of, to_local};
use crate::domain::special::Special;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::warn;

/// Result of evaluating a special at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpecialActivity {
    pub is_active: bool,
    /// The date the running occurrence started on
    pub occurrence_date: Option<NaiveDate>,
    #[serde(serialize_with = "serialize_minutes")]
    pub time_remaining: Option<Duration>,
}

impl SpecialActivity {
    pub fn inactive() -> Self {
        Self {
            is_active: false,
            occurrence_date: None,
            time_remaining: None,
        }
    }
}

fn serialize_minutes<S: serde::Serializer>(
    remaining: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match remaining {
        Some(duration) => serializer.serialize_some(&duration.num_minutes()),
        None => serializer.serialize_none(),
    }
}

/// Start date of the occurrence running at a local date-time, if any
///
/// An occurrence that runs past midnight is still attributed to the day it
/// started, and the start/expiration bounds are checked against that day.
pub fn active_occurrence(special: &Special, local: NaiveDateTime) -> Option<NaiveDate> {
    let date = local.date();
    let time = local.time();
    let start = special.start_time();

    let started_today = time >= start
        && special
            .end_time()
            .is_none_or(|end| end < start || time < end)
        && special.occurs_on(date);
    if started_today {
        return Some(date);
    }

    let end = special.end_time()?;
    if special.spans_midnight() && time < end {
        let yesterday = date.pred_opt()?;
        if special.occurs_on(yesterday) {
            return Some(yesterday);
        }
    }
    None
}

/// Whether the special is running at `instant`
pub fn is_active(special: &Special, instant: DateTime<Utc>, zone: Tz) -> bool {
    active_occurrence(special, to_local(instant, zone)).is_some()
}

/// Local date-time at which the occurrence that started on `date` ends
fn occurrence_end(special: &Special, date: NaiveDate) -> Option<NaiveDateTime> {
    match special.end_time() {
        Some(end) if end > special.start_time() => Some(date.and_time(end)),
        // Overnight, until midnight, or open-ended: all end on the next day
        Some(end) => Some(date.succ_opt()?.and_time(end)),
        None => Some(date.succ_opt()?.and_time(NaiveTime::MIN)),
    }
}

/// Time left in the running occurrence, or `None` if the special is not
/// running at `instant`
pub fn time_remaining(special: &Special, instant: DateTime<Utc>, zone: Tz) -> Option<Duration> {
    let date = active_occurrence(special, to_local(instant, zone))?;
    remaining_from(special, date, instant, zone)
}

fn remaining_from(
    special: &Special,
    date: NaiveDate,
    instant: DateTime<Utc>,
    zone: Tz,
) -> Option<Duration> {
    // During a repeated hour the end time is read twice; the running stretch
    // ends at the first reading still ahead
    let end = occurrence_end(special, date).and_then(|local| next_instant_of(local, zone, instant));
    if end.is_none() {
        warn!(special = %special.id(), %date, "occurrence end cannot be resolved");
    }
    end.map(|end| end - instant)
}

/// Activity, occurrence date and remaining time at `instant`
pub fn evaluate_special(special: &Special, instant: DateTime<Utc>, zone: Tz) -> SpecialActivity {
    match active_occurrence(special, to_local(instant, zone)) {
        Some(date) => SpecialActivity {
            is_active: true,
            occurrence_date: Some(date),
            time_remaining: remaining_from(special, date, instant, zone),
        },
        None => SpecialActivity::inactive(),
    }
}

/// First date on or after `from` on which an occurrence starts, looking at
/// most `horizon_days` ahead
pub fn next_occurrence(special: &Special, from: NaiveDate, horizon_days: u32) -> Option<NaiveDate> {
    let first = from.max(special.start_date());
    first
        .iter_days()
        .take(horizon_days as usize)
        .take_while(|date| special.expiration_date().is_none_or(|last| *date <= last))
        .find(|date| special.occurs_on(*date))
}
