//! Validation constants for domain types
//!
//! This module centralizes the limits and magic numbers used throughout the
//! domain layer so that construction, record conversion and tests agree.

/// Venue text limits
pub mod venue {
    /// Maximum venue name length
    pub const MAX_NAME_LENGTH: usize = 200;

    /// Maximum length of any single address line
    pub const MAX_ADDRESS_LINE_LENGTH: usize = 200;
}

/// Special text limits
pub mod special {
    /// Maximum length of a special's description
    pub const MAX_CONTENT_LENGTH: usize = 500;
}

/// Coordinate bounds in decimal degrees
pub mod coordinate {
    pub const MIN_LATITUDE: f64 = -90.0;
    pub const MAX_LATITUDE: f64 = 90.0;
    pub const MIN_LONGITUDE: f64 = -180.0;
    pub const MAX_LONGITUDE: f64 = 180.0;
}

/// Distance and Earth-model constants
pub mod distance {
    /// IUGG mean Earth radius
    pub const EARTH_MEAN_RADIUS_METERS: f64 = 6_371_008.8;

    pub const METERS_PER_MILE: f64 = 1_609.344;

    pub const METERS_PER_KILOMETER: f64 = 1_000.0;
}

/// Time zone identifier limits
pub mod time_zone {
    /// Longest IANA identifiers are around 30 characters
    pub const MAX_LENGTH: usize = 64;
}

/// Schedule evaluation bounds
pub mod schedule {
    pub const DAYS_PER_WEEK: usize = 7;

    /// Local days after today scanned for the next open/close boundary
    pub const TRANSITION_HORIZON_DAYS: i64 = 8;

    /// Days scanned when looking for the next occurrence of a special
    pub const UPCOMING_HORIZON_DAYS: u32 = 60;

    /// How far either side of a DST gap to look for the offsets that
    /// applied before and after clocks jumped forward
    pub const DST_GAP_LOOKBACK_HOURS: i64 = 24;

    /// Step used when scanning for UTC offset changes; zones change offset
    /// at most once within it
    pub const OFFSET_SCAN_STEP_HOURS: i64 = 6;

    /// Shortest transition horizon that reaches the next window of every weekday
    pub const MIN_TRANSITION_HORIZON_DAYS: i64 = DAYS_PER_WEEK as i64 + 1;
}
