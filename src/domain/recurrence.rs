//! Recurrence rules for specials
//!
//! A special either happens once, on a fixed set of weekdays, or on the dates
//! selected by a cron expression. The evaluator dispatches on the variant
//! instead of re-parsing strings at evaluation time.

use crate::domain::errors::ValidationError;
use crate::domain::schedule::DayOfWeek;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a special repeats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rule", rename_all = "snake_case")]
pub enum RecurrenceRule {
    /// Valid only on the special's start date
    OneTime,
    /// Valid on every listed weekday
    Weekly(WeekdaySet),
    /// Valid on every date the expression selects
    Cron(CronExpression),
}

impl RecurrenceRule {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, RecurrenceRule::OneTime)
    }

    /// Whether the rule selects `date` for a special first valid on `start_date`
    ///
    /// Start and expiration bounds are the caller's concern; this only answers
    /// the pattern question.
    pub fn matches(&self, start_date: NaiveDate, date: NaiveDate) -> bool {
        match self {
            RecurrenceRule::OneTime => date == start_date,
            RecurrenceRule::Weekly(days) => days.contains(DayOfWeek::from(date.weekday())),
            RecurrenceRule::Cron(expression) => expression.matches(date),
        }
    }
}

/// A set of weekdays stored as a 7-bit mask, bit 0 = Sunday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    const ALL_BITS: u8 = 0b111_1111;

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn every_day() -> Self {
        Self(Self::ALL_BITS)
    }

    /// Monday through Friday
    pub fn weekdays() -> Self {
        Self(0b011_1110)
    }

    /// Saturday and Sunday
    pub fn weekends() -> Self {
        Self(0b100_0001)
    }

    pub fn from_bits(bits: u8) -> Result<Self, ValidationError> {
        if bits & !Self::ALL_BITS != 0 {
            return Err(ValidationError::WeekdayMaskOutOfRange(bits));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, day: DayOfWeek) -> bool {
        self.0 & (1 << day.index()) != 0
    }

    pub fn insert(&mut self, day: DayOfWeek) {
        self.0 |= 1 << day.index();
    }

    pub fn with(mut self, day: DayOfWeek) -> Self {
        self.insert(day);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Days in the set, Sunday first
    pub fn iter(self) -> impl Iterator<Item = DayOfWeek> {
        DayOfWeek::ALL.into_iter().filter(move |day| self.contains(*day))
    }
}

impl FromIterator<DayOfWeek> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = DayOfWeek>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl TryFrom<u8> for WeekdaySet {
    type Error = ValidationError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

impl From<WeekdaySet> for u8 {
    fn from(set: WeekdaySet) -> Self {
        set.bits()
    }
}

/// A parsed cron expression used to select calendar dates
///
/// Accepts the classic five fields (`minute hour day-of-month month
/// day-of-week`), an optional leading seconds field, and the `@daily` style
/// macros. Only the month, day-of-month and day-of-week fields decide which
/// dates match; time-of-day fields are validated and otherwise ignored since a
/// special's own start and end times govern the daily window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronExpression {
    source: String,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
    day_of_month_restricted: bool,
    day_of_week_restricted: bool,
}

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Inclusive bounds and optional symbolic names for one cron field
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    /// Value the first name maps to
    names_start: u32,
    allows_question_mark: bool,
}

const SECOND: FieldSpec = FieldSpec {
    name: "second",
    min: 0,
    max: 59,
    names: &[],
    names_start: 0,
    allows_question_mark: false,
};
const MINUTE: FieldSpec = FieldSpec {
    name: "minute",
    ..SECOND
};
const HOUR: FieldSpec = FieldSpec {
    name: "hour",
    max: 23,
    ..SECOND
};
const DAY_OF_MONTH: FieldSpec = FieldSpec {
    name: "day-of-month",
    min: 1,
    max: 31,
    names: &[],
    names_start: 0,
    allows_question_mark: true,
};
const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: &MONTH_NAMES,
    names_start: 1,
    allows_question_mark: false,
};
// 7 is accepted as a second spelling of Sunday
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 7,
    names: &WEEKDAY_NAMES,
    names_start: 0,
    allows_question_mark: true,
};

impl CronExpression {
    pub fn parse(expression: &str) -> Result<Self, ValidationError> {
        let source = expression.trim();
        let fail = |reason: String| ValidationError::invalid_recurrence(source, reason);

        let expanded = match source {
            s if s.starts_with('@') => expand_macro(s).ok_or_else(|| {
                fail(format!("unknown macro '{s}'"))
            })?,
            s => s,
        };

        let fields: Vec<&str> = expanded.split_whitespace().collect();
        let (seconds, rest) = match fields.len() {
            5 => (None, &fields[..]),
            6 => (Some(fields[0]), &fields[1..]),
            n => return Err(fail(format!("expected 5 or 6 fields, found {n}"))),
        };

        if let Some(seconds) = seconds {
            parse_field(seconds, &SECOND).map_err(&fail)?;
        }
        parse_field(rest[0], &MINUTE).map_err(&fail)?;
        parse_field(rest[1], &HOUR).map_err(&fail)?;
        let days_of_month = parse_field(rest[2], &DAY_OF_MONTH).map_err(&fail)?;
        let months = parse_field(rest[3], &MONTH).map_err(&fail)?;
        let mut days_of_week = parse_field(rest[4], &DAY_OF_WEEK).map_err(&fail)?;
        if days_of_week & (1 << 7) != 0 {
            days_of_week = (days_of_week & !(1 << 7)) | 1;
        }

        Ok(Self {
            source: source.to_string(),
            days_of_month,
            months,
            days_of_week,
            day_of_month_restricted: is_restricted(rest[2]),
            day_of_week_restricted: is_restricted(rest[4]),
        })
    }

    /// The expression exactly as it was written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the expression selects `date`
    ///
    /// When both day-of-month and day-of-week are restricted a date matches
    /// if either one does, as in classic cron.
    pub fn matches(&self, date: NaiveDate) -> bool {
        if self.months & (1 << date.month()) == 0 {
            return false;
        }
        let dom = self.days_of_month & (1 << date.day()) != 0;
        let dow = self.days_of_week & (1 << date.weekday().num_days_from_sunday()) != 0;

        if self.day_of_month_restricted && self.day_of_week_restricted {
            dom || dow
        } else {
            dom && dow
        }
    }
}

fn expand_macro(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "@yearly" | "@annually" => Some("0 0 1 1 *"),
        "@monthly" => Some("0 0 1 * *"),
        "@weekly" => Some("0 0 * * 0"),
        "@daily" | "@midnight" => Some("0 0 * * *"),
        "@hourly" => Some("0 * * * *"),
        _ => None,
    }
}

// A field that starts with '*' or is '?' leaves the day unrestricted
fn is_restricted(field: &str) -> bool {
    !(field.starts_with('*') || field == "?")
}

fn parse_field(text: &str, layout: &FieldSpec) -> Result<u64, String> {
    if text == "?" {
        return if layout.allows_question_mark {
            Ok(bits_between(layout.min, layout.max, 1))
        } else {
            Err(format!("'?' is not allowed in the {} field", layout.name))
        };
    }

    let mut bits = 0u64;
    for part in text.split(',') {
        if part.is_empty() {
            return Err(format!("empty list entry in the {} field", layout.name));
        }
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| format!("invalid step '{step}' in the {} field", layout.name))?;
                if step == 0 {
                    return Err(format!("step must be positive in the {} field", layout.name));
                }
                (range, Some(step))
            }
            None => (part, None),
        };

        let (start, end) = if range == "*" {
            (layout.min, layout.max)
        } else if let Some((start, end)) = range.split_once('-') {
            (parse_value(start, layout)?, parse_value(end, layout)?)
        } else {
            let value = parse_value(range, layout)?;
            // "5/15" means "from 5 to the end, every 15"
            (value, if step.is_some() { layout.max } else { value })
        };

        if start > end {
            return Err(format!(
                "range {start}-{end} runs backwards in the {} field",
                layout.name
            ));
        }
        bits |= bits_between(start, end, step.unwrap_or(1));
    }
    Ok(bits)
}

fn parse_value(text: &str, layout: &FieldSpec) -> Result<u32, String> {
    let value = match text.parse::<u32>() {
        Ok(value) => value,
        Err(_) => layout
            .names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(text))
            .map(|index| index as u32 + layout.names_start)
            .ok_or_else(|| format!("'{text}' is not a valid {} value", layout.name))?,
    };
    if (layout.min..=layout.max).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{value} is outside {}..={} for the {} field",
            layout.min, layout.max, layout.name
        ))
    }
}

fn bits_between(start: u32, end: u32, step: u32) -> u64 {
    (start..=end)
        .step_by(step as usize)
        .fold(0, |bits, value| bits | (1 << value))
}

impl FromStr for CronExpression {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CronExpression {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CronExpression> for String {
    fn from(expression: CronExpression) -> Self {
        expression.source
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
