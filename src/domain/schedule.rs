//! Weekly opening schedule for a venue
//!
//! A schedule holds exactly one [`TimeWindow`] per day of the week. Windows
//! carry local wall-clock times only; they become instants when combined with
//! a date and the venue's time zone.

use crate::domain::errors::ValidationError;
use crate::domain::validation_constants::schedule::DAYS_PER_WEEK;
use chrono::{NaiveTime, Weekday};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Day of the week, numbered 0 (Sunday) through 6 (Saturday)
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; DAYS_PER_WEEK] = [
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    pub fn from_index(index: u8) -> Result<Self, ValidationError> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(ValidationError::DayOutOfRange(index))
    }

    /// 0 for Sunday through 6 for Saturday
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn previous(self) -> Self {
        Self::ALL[(usize::from(self.index()) + DAYS_PER_WEEK - 1) % DAYS_PER_WEEK]
    }

    pub fn next(self) -> Self {
        Self::ALL[(usize::from(self.index()) + 1) % DAYS_PER_WEEK]
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        // num_days_from_sunday is always 0..=6
        Self::ALL[weekday.num_days_from_sunday() as usize]
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Sunday => Weekday::Sun,
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = ValidationError;

    /// Accepts full names, three-letter abbreviations or the 0..=6 index
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(index) = trimmed.parse::<u8>() {
            return Self::from_index(index);
        }
        trimmed
            .parse::<Weekday>()
            .map(Self::from)
            .map_err(|_| ValidationError::invalid_field("day of week", format!("'{s}'")))
    }
}

/// One day's opening hours
///
/// When `is_closed` is set the open and close times are ignored. A close time
/// earlier than the open time means the window runs past local midnight into
/// the next calendar day; a close of 00:00 means "until the end of the day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    day: DayOfWeek,
    open: NaiveTime,
    close: NaiveTime,
    is_closed: bool,
}

impl TimeWindow {
    /// Build a window, rejecting a non-closed window that opens and closes at
    /// the same time
    pub fn try_new(
        day: DayOfWeek,
        open: NaiveTime,
        close: NaiveTime,
        is_closed: bool,
    ) -> Result<Self, ValidationError> {
        if !is_closed && open == close {
            return Err(ValidationError::ZeroLengthWindow { day });
        }
        Ok(Self {
            day,
            open,
            close,
            is_closed,
        })
    }

    pub fn open(
        day: DayOfWeek,
        open: NaiveTime,
        close: NaiveTime,
    ) -> Result<Self, ValidationError> {
        Self::try_new(day, open, close, false)
    }

    pub fn closed(day: DayOfWeek) -> Self {
        Self {
            day,
            open: NaiveTime::MIN,
            close: NaiveTime::MIN,
            is_closed: true,
        }
    }

    pub fn day(&self) -> DayOfWeek {
        self.day
    }

    pub fn open_time(&self) -> NaiveTime {
        self.open
    }

    pub fn close_time(&self) -> NaiveTime {
        self.close
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Open and close times, or `None` for a closed day
    pub fn hours(&self) -> Option<(NaiveTime, NaiveTime)> {
        (!self.is_closed).then_some((self.open, self.close))
    }

    /// True when the window continues past local midnight into the next day
    ///
    /// A close of exactly 00:00 ends at midnight and does not spill over.
    pub fn spans_midnight(&self) -> bool {
        !self.is_closed && self.close < self.open && self.close != NaiveTime::MIN
    }

    /// Whether `time` on this window's own day falls inside the window
    pub fn contains_same_day(&self, time: NaiveTime) -> bool {
        if self.is_closed || time < self.open {
            return false;
        }
        // close < open covers both overnight windows and a midnight close
        self.close < self.open || time < self.close
    }

    /// Whether `time` on the day after this window's day falls inside the
    /// part of the window that spilled past midnight
    pub fn contains_next_day(&self, time: NaiveTime) -> bool {
        self.spans_midnight() && time < self.close
    }
}

/// Seven time windows, one per day of the week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySchedule {
    windows: [TimeWindow; DAYS_PER_WEEK],
}

impl WeeklySchedule {
    /// Build a schedule from any set of windows
    ///
    /// Days without a window are closed. Two windows for the same day are
    /// rejected rather than silently overwritten.
    pub fn new(windows: impl IntoIterator<Item = TimeWindow>) -> Result<Self, ValidationError> {
        let mut slots: [Option<TimeWindow>; DAYS_PER_WEEK] = [None; DAYS_PER_WEEK];
        for window in windows {
            let slot = &mut slots[usize::from(window.day().index())];
            if slot.is_some() {
                return Err(ValidationError::DuplicateScheduleDay(window.day()));
            }
            *slot = Some(window);
        }

        let windows = DayOfWeek::ALL.map(|day| {
            slots[usize::from(day.index())].unwrap_or_else(|| TimeWindow::closed(day))
        });
        Ok(Self { windows })
    }

    /// A schedule closed every day
    pub fn closed() -> Self {
        Self {
            windows: DayOfWeek::ALL.map(TimeWindow::closed),
        }
    }

    /// The window for `day`; always present
    pub fn window_for(&self, day: DayOfWeek) -> &TimeWindow {
        &self.windows[usize::from(day.index())]
    }

    /// Replace one day's window
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.windows[usize::from(window.day().index())] = window;
        self
    }

    pub fn windows(&self) -> impl Iterator<Item = &TimeWindow> {
        self.windows.iter()
    }

    pub fn is_closed_all_week(&self) -> bool {
        self.windows.iter().all(TimeWindow::is_closed)
    }
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self::closed()
    }
}
