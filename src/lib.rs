//! Pulse - venue availability and recurring-special evaluation
//!
//! Answers three questions for the Pulse specials finder: is a venue open at
//! a given instant (and when does that change), is a special running (and
//! for how much longer), and which venues lie within a radius of a point.
//! Every evaluation happens in the venue's own time zone.

pub mod application;
pub mod availability;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::{Application, SearchRequest, SearchTime, VenueSearch};
pub use error::{Error, Result};
