//! Application services and business logic orchestration
//!
//! This module wires the catalog, the evaluators and configuration into the
//! search service the CLI talks to.

pub mod app;
pub mod search;

pub use app::{Application, CatalogSearch};
pub use search::{SearchHit, SearchRequest, SearchTime, SpecialStatus, VenueSearch, VenueStatus};
