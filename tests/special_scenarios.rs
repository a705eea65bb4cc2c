//! End-to-end evaluation scenarios for venues and specials, including
//! daylight saving transitions

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::America::Chicago;
use pulse_availability::availability::{Evaluator, FixedClock, Transition, TzDatabase};
use pulse_availability::domain::{
    Address, Coordinate, CronExpression, DayOfWeek, RecurrenceRule, Special, SpecialCategory,
    SpecialContent, TimeWindow, TimeZoneId, Venue, VenueId, VenueName, WeekdaySet, WeeklySchedule,
};
use rstest::rstest;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// An unambiguous Chicago wall-clock time as an instant
fn chicago(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Chicago
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc)
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn venue(windows: impl IntoIterator<Item = TimeWindow>) -> Venue {
    Venue::new(
        VenueId::generate(),
        VenueName::try_new("Lakeside Tap".to_string()).unwrap(),
        Address::try_new("200 E Randolph St", "Chicago", Some("IL".into()), None, "US").unwrap(),
        Coordinate::try_new(41.8847, -87.6212).unwrap(),
        TimeZoneId::parse("America/Chicago").unwrap(),
        WeeklySchedule::new(windows).unwrap(),
    )
}

fn evaluator(now: DateTime<Utc>) -> Evaluator<FixedClock, TzDatabase> {
    Evaluator::new(FixedClock::new(now), TzDatabase)
}

fn special(venue: &Venue, start_date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Special {
    Special::builder(
        venue.id,
        SpecialContent::try_new("$5 margaritas".to_string()).unwrap(),
        SpecialCategory::Drink,
        start_date,
        start,
    )
    .end_time(end)
    .build()
    .unwrap()
}

#[rstest]
#[case(chicago(2025, 5, 1, 18, 0), true)]
#[case(chicago(2025, 5, 1, 20, 0), false)]
#[case(chicago(2025, 5, 2, 18, 0), false)]
fn one_time_special_on_its_day(#[case] at: DateTime<Utc>, #[case] expected: bool) {
    let venue = venue([]);
    let special = special(&venue, date(2025, 5, 1), t(17, 0), t(20, 0));

    let activity = evaluator(at).special_activity(&special, &venue).unwrap();
    assert_eq!(activity.is_active, expected);
}

#[rstest]
#[case(chicago(2025, 8, 31, 18, 0), true)]
#[case(chicago(2025, 9, 1, 18, 0), false)]
#[case(chicago(2025, 6, 15, 19, 0), false)]
fn daily_cron_special_until_expiration(#[case] at: DateTime<Utc>, #[case] expected: bool) {
    let venue = venue([]);
    let special = Special::builder(
        venue.id,
        SpecialContent::try_new("Happy hour".to_string()).unwrap(),
        SpecialCategory::Drink,
        date(2025, 5, 1),
        t(17, 0),
    )
    .end_time(t(19, 0))
    .expiration_date(date(2025, 8, 31))
    .recurrence(RecurrenceRule::Cron(CronExpression::parse("0 17 * * *").unwrap()))
    .build()
    .unwrap();

    let activity = evaluator(at).special_activity(&special, &venue).unwrap();
    assert_eq!(activity.is_active, expected);
}

#[test]
fn late_friday_venue_stays_open_past_midnight() {
    let venue = venue([TimeWindow::open(DayOfWeek::Friday, t(18, 0), t(2, 0)).unwrap()]);

    let saturday_early = evaluator(chicago(2025, 5, 3, 1, 0));
    assert!(saturday_early.venue_availability(&venue).unwrap().is_open);

    let saturday_later = evaluator(chicago(2025, 5, 3, 3, 0));
    let availability = saturday_later.venue_availability(&venue).unwrap();
    assert!(!availability.is_open);
    assert_eq!(availability.next_change, Some(chicago(2025, 5, 9, 18, 0)));
}

#[test]
fn closing_after_spring_forward_uses_new_offset() {
    // Saturday 8 Mar 2025 22:00 to Sunday 03:00; clocks jump 02:00 -> 03:00
    let venue = venue([TimeWindow::open(DayOfWeek::Saturday, t(22, 0), t(3, 0)).unwrap()]);

    // 01:30 CST
    let transition = evaluator(utc(2025, 3, 9, 7, 30)).next_transition(&venue).unwrap();
    assert_eq!(
        transition,
        Transition::At {
            at: utc(2025, 3, 9, 8, 0),
            opens: false
        }
    );
}

#[test]
fn opening_inside_the_gap_happens_when_the_gap_ends() {
    // 02:30 never happens on 9 Mar 2025; the first wall-clock time past it is 03:00 CDT
    let venue = venue([TimeWindow::open(DayOfWeek::Sunday, t(2, 30), t(5, 0)).unwrap()]);

    let transition = evaluator(utc(2025, 3, 9, 7, 0)).next_transition(&venue).unwrap();
    assert_eq!(
        transition,
        Transition::At {
            at: utc(2025, 3, 9, 8, 0),
            opens: true
        }
    );
    assert!(!evaluator(utc(2025, 3, 9, 7, 59)).venue_availability(&venue).unwrap().is_open);
    assert!(evaluator(utc(2025, 3, 9, 8, 0)).venue_availability(&venue).unwrap().is_open);
}

#[test]
fn remaining_time_includes_the_repeated_hour() {
    // Overnight 22:00-03:00 starting Saturday 1 Nov 2025; clocks fall back at 02:00 CDT
    let venue = venue([]);
    let special = Special::builder(
        venue.id,
        SpecialContent::try_new("Late-night tacos".to_string()).unwrap(),
        SpecialCategory::Food,
        date(2025, 11, 1),
        t(22, 0),
    )
    .end_time(t(3, 0))
    .build()
    .unwrap();

    // Midnight CDT is 05:00 UTC; 03:00 CST is 09:00 UTC
    let activity = evaluator(utc(2025, 11, 2, 5, 0))
        .special_activity(&special, &venue)
        .unwrap();
    assert!(activity.is_active);
    assert_eq!(activity.occurrence_date, Some(date(2025, 11, 1)));
    assert_eq!(activity.time_remaining, Some(Duration::hours(4)));
}

#[test]
fn special_ending_inside_the_repeated_hour_counts_down_to_the_reading_ahead() {
    // 00:30-01:30 on Sunday 2 Nov 2025; 01:30 is read at 06:30 and 07:30 UTC
    let venue = venue([]);
    let special = special(&venue, date(2025, 11, 2), t(0, 30), t(1, 30));

    // 01:15 CST, the second pass through the hour
    let activity = evaluator(utc(2025, 11, 2, 7, 15))
        .special_activity(&special, &venue)
        .unwrap();
    assert!(activity.is_active);
    assert_eq!(activity.time_remaining, Some(Duration::minutes(15)));
}

#[test]
fn venue_closing_inside_the_repeated_hour_reopens_when_clocks_fall_back() {
    let venue = venue([TimeWindow::open(DayOfWeek::Saturday, t(20, 0), t(1, 30)).unwrap()]);

    // 01:45 CDT: closed until the wall clock reads 01:00 CST
    let availability = evaluator(utc(2025, 11, 2, 6, 45))
        .venue_availability(&venue)
        .unwrap();
    assert!(!availability.is_open);
    assert_eq!(availability.next_change, Some(utc(2025, 11, 2, 7, 0)));

    let reopened = evaluator(utc(2025, 11, 2, 7, 10))
        .venue_availability(&venue)
        .unwrap();
    assert!(reopened.is_open);
    assert_eq!(reopened.next_change, Some(utc(2025, 11, 2, 7, 30)));
}

#[test]
fn special_ending_inside_the_gap_ends_when_the_gap_ends() {
    let venue = venue([]);
    let special = special(&venue, date(2025, 3, 9), t(1, 0), t(2, 30));

    // 01:45 CST
    let activity = evaluator(utc(2025, 3, 9, 7, 45))
        .special_activity(&special, &venue)
        .unwrap();
    assert_eq!(activity.time_remaining, Some(Duration::minutes(15)));

    let after = evaluator(utc(2025, 3, 9, 8, 0))
        .special_activity(&special, &venue)
        .unwrap();
    assert!(!after.is_active);
}

#[test]
fn weekly_special_follows_weekday_mask() {
    let venue = venue([]);
    let special = Special::builder(
        venue.id,
        SpecialContent::try_new("Trivia night".to_string()).unwrap(),
        SpecialCategory::Entertainment,
        date(2025, 1, 1),
        t(19, 0),
    )
    .end_time(t(21, 0))
    .recurrence(RecurrenceRule::Weekly(WeekdaySet::empty().with(DayOfWeek::Wednesday)))
    .build()
    .unwrap();

    // 2025-05-07 is a Wednesday
    let wednesday = evaluator(chicago(2025, 5, 7, 20, 0));
    assert!(wednesday.special_activity(&special, &venue).unwrap().is_active);
    assert_eq!(
        wednesday.upcoming_occurrence(&special, &venue, 14).unwrap(),
        Some(date(2025, 5, 7))
    );

    let thursday = evaluator(chicago(2025, 5, 8, 20, 0));
    assert!(!thursday.special_activity(&special, &venue).unwrap().is_active);
    assert_eq!(
        thursday.upcoming_occurrence(&special, &venue, 14).unwrap(),
        Some(date(2025, 5, 14))
    );
}
