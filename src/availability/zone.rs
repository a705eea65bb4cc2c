//! Time zone resolution and local/UTC conversion

use crate::domain::errors::ConfigurationError;
use crate::domain::validation_constants::schedule::{
    DST_GAP_LOOKBACK_HOURS, OFFSET_SCAN_STEP_HOURS,
};
use crate::domain::venue::TimeZoneId;
use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Turns a venue's zone identifier into a usable time zone
pub trait ZoneResolver: Send + Sync {
    fn resolve(&self, id: &TimeZoneId) -> Result<Tz, ConfigurationError>;
}

/// Resolves identifiers against the IANA database compiled into `chrono-tz`
#[derive(Debug, Clone, Copy, Default)]
pub struct TzDatabase;

impl ZoneResolver for TzDatabase {
    fn resolve(&self, id: &TimeZoneId) -> Result<Tz, ConfigurationError> {
        id.as_ref()
            .parse::<Tz>()
            .map_err(|_| ConfigurationError::UnknownTimeZone(id.to_string()))
    }
}

impl<Z: ZoneResolver + ?Sized> ZoneResolver for &Z {
    fn resolve(&self, id: &TimeZoneId) -> Result<Tz, ConfigurationError> {
        (**self).resolve(id)
    }
}

impl<Z: ZoneResolver + ?Sized> ZoneResolver for std::sync::Arc<Z> {
    fn resolve(&self, id: &TimeZoneId) -> Result<Tz, ConfigurationError> {
        (**self).resolve(id)
    }
}

/// Local wall-clock date and time of `instant` in `zone`
pub fn to_local(instant: DateTime<Utc>, zone: Tz) -> NaiveDateTime {
    instant.with_timezone(&zone).naive_local()
}

/// The instant a local wall-clock time refers to
///
/// An ambiguous time (clocks fell back) resolves to its earlier instant. A
/// time inside a gap (clocks jumped forward) resolves to the end of the gap:
/// the first instant whose wall clock reads at or after `local`.
pub fn to_instant(local: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(at) => Some(at.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let resolved = gap_end(local, zone);
            if resolved.is_none() {
                warn!(%local, %zone, "local time cannot be resolved to an instant");
            }
            resolved
        }
    }
}

/// Every instant at which the wall clock in `zone` reads `local`, earliest
/// first
///
/// A time repeated by a fall-back transition has two; a time skipped by a
/// spring-forward transition is read at the end of the gap.
pub fn instants_of(local: NaiveDateTime, zone: Tz) -> Vec<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(at) => vec![at.with_timezone(&Utc)],
        LocalResult::Ambiguous(first, second) => {
            vec![first.with_timezone(&Utc), second.with_timezone(&Utc)]
        }
        LocalResult::None => gap_end(local, zone).into_iter().collect(),
    }
}

/// The first instant strictly after `after` at which the wall clock reads
/// `local`
pub fn next_instant_of(
    local: NaiveDateTime,
    zone: Tz,
    after: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    instants_of(local, zone).into_iter().find(|at| *at > after)
}

/// Instants in `(from, to]` at which the UTC offset of `zone` changes
///
/// Assumes at most one change per scan step.
pub fn offset_changes(zone: Tz, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let step = Duration::hours(OFFSET_SCAN_STEP_HOURS);
    let mut changes = Vec::new();
    let mut lo = from;
    while lo < to {
        let hi = (lo + step).min(to);
        let before = offset_at(lo, zone);
        if offset_at(hi, zone) != before {
            changes.push(first_change(lo, hi, before, zone));
        }
        lo = hi;
    }
    changes
}

fn offset_at(instant: DateTime<Utc>, zone: Tz) -> FixedOffset {
    instant.with_timezone(&zone).offset().fix()
}

// `lo` carries the old offset and `hi` the new one
fn first_change(
    mut lo: DateTime<Utc>,
    mut hi: DateTime<Utc>,
    before: FixedOffset,
    zone: Tz,
) -> DateTime<Utc> {
    while (hi - lo).num_seconds() > 1 {
        let mid = lo + Duration::seconds((hi - lo).num_seconds() / 2);
        if offset_at(mid, zone) == before {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}

fn offset_seconds_near(local: NaiveDateTime, zone: Tz, hours: i64) -> Option<i64> {
    let nearby = local.checked_add_signed(Duration::hours(hours))?;
    let offset = zone.offset_from_local_datetime(&nearby).earliest()?;
    Some(i64::from(offset.fix().local_minus_utc()))
}

fn read_with_offset(local: NaiveDateTime, offset_seconds: i64) -> Option<DateTime<Utc>> {
    let utc = local.checked_sub_signed(Duration::seconds(offset_seconds))?;
    Some(Utc.from_utc_datetime(&utc))
}

// Reading `local` with the offsets from either side of the gap brackets the
// jump; bisect down to the first second past it.
fn gap_end(local: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    let before = offset_seconds_near(local, zone, -DST_GAP_LOOKBACK_HOURS)?;
    let after = offset_seconds_near(local, zone, DST_GAP_LOOKBACK_HOURS)?;
    let mut lo = read_with_offset(local, after)?;
    let mut hi = read_with_offset(local, before)?;
    if to_local(lo, zone) >= local || to_local(hi, zone) < local {
        return None;
    }

    while (hi - lo).num_seconds() > 1 {
        let mid = lo + Duration::seconds((hi - lo).num_seconds() / 2);
        if to_local(mid, zone) >= local {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Some(hi)
}
