//! Availability evaluation
//!
//! Pure, synchronous evaluators for venue opening hours, special activity and
//! radius search, plus the injected clock and zone resolver they are driven
//! by. Nothing in here holds mutable state, so every function is safe to call
//! from any thread.

pub mod clock;
pub mod evaluator;
pub mod search;
pub mod specials;
pub mod venue_hours;
pub mod zone;

pub use clock::{Clock, FixedClock, SystemClock};
pub use evaluator::Evaluator;
pub use search::{filter_within_radius, DistanceMetric, Haversine, Locatable, WithinRadius};
pub use specials::{
    active_occurrence, evaluate_special, is_active, next_occurrence, time_remaining,
    SpecialActivity,
};
pub use venue_hours::{
    evaluate_availability, is_open, is_open_at_local, next_transition, next_transition_within,
    open_window_at_local, Availability, Transition,
};
pub use zone::{to_instant, to_local, TzDatabase, ZoneResolver};
