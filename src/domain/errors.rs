//! Error types raised by domain construction and zone resolution
//!
//! Validation errors are raised when a value is built (or a record is
//! converted), configuration errors when external configuration data such as
//! a time zone name cannot be resolved. Neither is ever coerced to a default.

use crate::domain::schedule::DayOfWeek;
use thiserror::Error;

/// A domain value failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("time window for {day} opens and closes at the same time; mark the day closed instead")]
    ZeroLengthWindow { day: DayOfWeek },

    #[error("open window for {day} is missing its {missing} time")]
    IncompleteWindow { day: DayOfWeek, missing: &'static str },

    #[error("day of week must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    DayOutOfRange(u8),

    #[error("schedule contains more than one window for {0}")]
    DuplicateScheduleDay(DayOfWeek),

    #[error("invalid recurrence expression '{expression}': {reason}")]
    InvalidRecurrence { expression: String, reason: String },

    #[error("weekday mask {0:#b} has bits outside Sunday..Saturday")]
    WeekdayMaskOutOfRange(u8),

    #[error("weekly recurrence must include at least one day")]
    EmptyWeekdaySet,

    #[error("recurrence is inconsistent: {0}")]
    RecurrenceMismatch(&'static str),

    #[error("special starts and ends at the same time")]
    ZeroLengthSpecial,

    #[error("special expires on {expiration} before it starts on {start}")]
    ExpiresBeforeStart {
        start: chrono::NaiveDate,
        expiration: chrono::NaiveDate,
    },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn invalid_field(field: &'static str, reason: impl ToString) -> Self {
        Self::InvalidField {
            field,
            reason: reason.to_string(),
        }
    }

    pub fn invalid_recurrence(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecurrence {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// External configuration data could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown or unsupported time zone '{0}'")]
    UnknownTimeZone(String),
}
