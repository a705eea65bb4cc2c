//! Promotional specials run by venues

use crate::domain::errors::ValidationError;
use crate::domain::identifiers::{SpecialId, VenueId};
use crate::domain::recurrence::RecurrenceRule;
use chrono::{NaiveDate, NaiveTime};
use derive_more::Display;
use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Description of a special as shown to users
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 500),
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
pub struct SpecialContent(String);

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialCategory {
    #[display("food")]
    Food,
    #[display("drink")]
    Drink,
    #[display("entertainment")]
    Entertainment,
}

impl FromStr for SpecialCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "food" => Ok(SpecialCategory::Food),
            "drink" | "drinks" => Ok(SpecialCategory::Drink),
            "entertainment" => Ok(SpecialCategory::Entertainment),
            other => Err(ValidationError::invalid_field(
                "category",
                format!("'{other}' is not food, drink or entertainment"),
            )),
        }
    }
}

/// A special offered by one venue
///
/// The daily window runs from `start_time` to `end_time`, or to the end of
/// the local day when there is no end time. An end time earlier than the
/// start time makes each occurrence run past local midnight. Date bounds
/// apply to the day an occurrence starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Special {
    id: SpecialId,
    venue_id: VenueId,
    content: SpecialContent,
    category: SpecialCategory,
    start_date: NaiveDate,
    start_time: NaiveTime,
    end_time: Option<NaiveTime>,
    expiration_date: Option<NaiveDate>,
    recurrence: RecurrenceRule,
}

impl Special {
    pub fn builder(
        venue_id: VenueId,
        content: SpecialContent,
        category: SpecialCategory,
        start_date: NaiveDate,
        start_time: NaiveTime,
    ) -> SpecialBuilder {
        SpecialBuilder {
            id: SpecialId::generate(),
            venue_id,
            content,
            category,
            start_date,
            start_time,
            end_time: None,
            expiration_date: None,
            recurrence: RecurrenceRule::OneTime,
        }
    }

    pub fn id(&self) -> SpecialId {
        self.id
    }

    pub fn venue_id(&self) -> VenueId {
        self.venue_id
    }

    pub fn content(&self) -> &SpecialContent {
        &self.content
    }

    pub fn category(&self) -> SpecialCategory {
        self.category
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn end_time(&self) -> Option<NaiveTime> {
        self.end_time
    }

    pub fn expiration_date(&self) -> Option<NaiveDate> {
        self.expiration_date
    }

    pub fn recurrence(&self) -> &RecurrenceRule {
        &self.recurrence
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }

    /// True when each occurrence continues past local midnight
    pub fn spans_midnight(&self) -> bool {
        self.end_time
            .is_some_and(|end| end < self.start_time && end != NaiveTime::MIN)
    }

    /// Whether `date` lies between the start date and the expiration date
    pub fn is_within_bounds(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.expiration_date.is_none_or(|last| date <= last)
    }

    /// Whether an occurrence starts on `date`
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.is_within_bounds(date) && self.recurrence.matches(self.start_date, date)
    }
}

/// Builder for [`Special`]; validation happens in [`SpecialBuilder::build`]
#[derive(Debug, Clone)]
pub struct SpecialBuilder {
    id: SpecialId,
    venue_id: VenueId,
    content: SpecialContent,
    category: SpecialCategory,
    start_date: NaiveDate,
    start_time: NaiveTime,
    end_time: Option<NaiveTime>,
    expiration_date: Option<NaiveDate>,
    recurrence: RecurrenceRule,
}

impl SpecialBuilder {
    pub fn id(mut self, id: SpecialId) -> Self {
        self.id = id;
        self
    }

    pub fn end_time(mut self, end_time: NaiveTime) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn expiration_date(mut self, expiration_date: NaiveDate) -> Self {
        self.expiration_date = Some(expiration_date);
        self
    }

    pub fn recurrence(mut self, recurrence: RecurrenceRule) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn build(self) -> Result<Special, ValidationError> {
        if self.end_time == Some(self.start_time) {
            return Err(ValidationError::ZeroLengthSpecial);
        }
        if let Some(expiration) = self.expiration_date {
            if expiration < self.start_date {
                return Err(ValidationError::ExpiresBeforeStart {
                    start: self.start_date,
                    expiration,
                });
            }
        }
        if let RecurrenceRule::Weekly(days) = &self.recurrence {
            if days.is_empty() {
                return Err(ValidationError::EmptyWeekdaySet);
            }
        }

        Ok(Special {
            id: self.id,
            venue_id: self.venue_id,
            content: self.content,
            category: self.category,
            start_date: self.start_date,
            start_time: self.start_time,
            end_time: self.end_time,
            expiration_date: self.expiration_date,
            recurrence: self.recurrence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recurrence::{CronExpression, WeekdaySet};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn happy_hour() -> SpecialBuilder {
        Special::builder(
            VenueId::generate(),
            SpecialContent::try_new("Half-price pints".to_string()).unwrap(),
            SpecialCategory::Drink,
            date(2025, 5, 1),
            t(17, 0),
        )
    }

    #[test]
    fn one_time_special_is_not_recurring() {
        let special = happy_hour().end_time(t(20, 0)).build().unwrap();
        assert!(!special.is_recurring());
        assert!(special.occurs_on(date(2025, 5, 1)));
        assert!(!special.occurs_on(date(2025, 5, 2)));
    }

    #[test]
    fn equal_start_and_end_is_rejected() {
        assert_eq!(
            happy_hour().end_time(t(17, 0)).build(),
            Err(ValidationError::ZeroLengthSpecial)
        );
    }

    #[test]
    fn expiration_before_start_is_rejected() {
        let result = happy_hour().expiration_date(date(2025, 4, 30)).build();
        assert!(matches!(
            result,
            Err(ValidationError::ExpiresBeforeStart { .. })
        ));
    }

    #[test]
    fn empty_weekly_rule_is_rejected() {
        let result = happy_hour()
            .recurrence(RecurrenceRule::Weekly(WeekdaySet::empty()))
            .build();
        assert_eq!(result, Err(ValidationError::EmptyWeekdaySet));
    }

    #[test]
    fn recurring_special_respects_bounds() {
        let special = happy_hour()
            .end_time(t(19, 0))
            .expiration_date(date(2025, 8, 31))
            .recurrence(RecurrenceRule::Cron(
                CronExpression::parse("0 17 * * *").unwrap(),
            ))
            .build()
            .unwrap();

        assert!(special.is_recurring());
        assert!(!special.occurs_on(date(2025, 4, 30)));
        assert!(special.occurs_on(date(2025, 6, 15)));
        assert!(special.occurs_on(date(2025, 8, 31)));
        assert!(!special.occurs_on(date(2025, 9, 1)));
    }

    #[test]
    fn late_night_special_spans_midnight() {
        let special = happy_hour().end_time(t(1, 0)).build().unwrap();
        assert!(special.spans_midnight());

        let until_midnight = happy_hour().end_time(t(0, 0)).build().unwrap();
        assert!(!until_midnight.spans_midnight());
    }

    #[test]
    fn content_is_length_limited() {
        use crate::domain::validation_constants::special::MAX_CONTENT_LENGTH;
        assert!(SpecialContent::try_new("x".repeat(MAX_CONTENT_LENGTH)).is_ok());
        assert!(SpecialContent::try_new("x".repeat(MAX_CONTENT_LENGTH + 1)).is_err());
        assert!(SpecialContent::try_new(" ".to_string()).is_err());
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Drinks".parse::<SpecialCategory>(), Ok(SpecialCategory::Drink));
        assert_eq!(SpecialCategory::Entertainment.to_string(), "entertainment");
        assert!("sports".parse::<SpecialCategory>().is_err());
    }
}
