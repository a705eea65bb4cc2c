//! Venue search and status queries
//!
//! [`VenueSearch`] ties the repository to the evaluators: it prefilters by
//! bounding box, applies the exact radius, then evaluates opening hours and
//! specials per venue at the requested time.

use crate::availability::clock::{Clock, SystemClock};
use crate::availability::evaluator::Evaluator;
use crate::availability::search::{filter_within_radius, DistanceMetric, Haversine, WithinRadius};
use crate::availability::specials::SpecialActivity;
use crate::availability::venue_hours::{Availability, Transition};
use crate::availability::zone::{to_instant, to_local, TzDatabase, ZoneResolver};
use crate::config::Settings;
use crate::domain::errors::ValidationError;
use crate::domain::geo::{BoundingBox, Coordinate, Distance};
use crate::domain::identifiers::{SpecialId, VenueId};
use crate::domain::schedule::DayOfWeek;
use crate::domain::special::{Special, SpecialCategory, SpecialContent};
use crate::domain::validation_constants::schedule::UPCOMING_HORIZON_DAYS;
use crate::domain::venue::{Address, Venue, VenueName};
use crate::infrastructure::catalog::VenueRepository;
use crate::{Error, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// When a search or status query is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchTime {
    /// The injected clock's current instant
    #[default]
    Now,
    At(DateTime<Utc>),
    /// The next `day` at `time`, in each venue's own zone, counting today
    Weekly { day: DayOfWeek, time: NaiveTime },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub center: Coordinate,
    pub radius: Distance,
    pub when: SearchTime,
    pub open_only: bool,
    /// Keep only venues with at least one special running
    pub running_only: bool,
    /// Keep only specials of this category
    pub category: Option<SpecialCategory>,
}

impl SearchRequest {
    pub fn new(center: Coordinate, radius: Distance) -> Self {
        Self {
            center,
            radius,
            when: SearchTime::Now,
            open_only: false,
            running_only: false,
            category: None,
        }
    }
}

/// A special as evaluated at the query time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialStatus {
    pub id: SpecialId,
    pub content: SpecialContent,
    pub category: SpecialCategory,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub is_recurring: bool,
    #[serde(flatten)]
    pub activity: SpecialActivity,
    /// First local date on or after the query date with an occurrence
    pub next_occurrence: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub venue_id: VenueId,
    pub name: VenueName,
    pub address: Address,
    pub coordinate: Coordinate,
    pub distance: Distance,
    pub evaluated_at: DateTime<Utc>,
    pub availability: Availability,
    pub specials: Vec<SpecialStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueStatus {
    pub venue: Venue,
    pub evaluated_at: DateTime<Utc>,
    pub local_time: NaiveDateTime,
    pub availability: Availability,
    pub next_transition: Transition,
    pub specials: Vec<SpecialStatus>,
}

/// Search service over a [`VenueRepository`]
pub struct VenueSearch<R, C = SystemClock, Z = TzDatabase> {
    repository: R,
    evaluator: Evaluator<C, Z>,
    metric: Arc<dyn DistanceMetric>,
    max_radius: Option<Distance>,
    upcoming_horizon_days: u32,
}

impl<R, C, Z> VenueSearch<R, C, Z>
where
    R: VenueRepository,
    C: Clock,
    Z: ZoneResolver,
{
    pub fn new(repository: R, evaluator: Evaluator<C, Z>) -> Self {
        Self {
            repository,
            evaluator,
            metric: Arc::new(Haversine),
            max_radius: None,
            upcoming_horizon_days: UPCOMING_HORIZON_DAYS,
        }
    }

    /// Apply the search limits from configuration
    pub fn from_settings(
        repository: R,
        evaluator: Evaluator<C, Z>,
        settings: &Settings,
    ) -> Result<Self> {
        Ok(Self::new(repository, evaluator)
            .with_max_radius(settings.max_radius()?)
            .with_upcoming_horizon(settings.schedule.upcoming_horizon_days))
    }

    pub fn with_metric(mut self, metric: impl DistanceMetric + 'static) -> Self {
        self.metric = Arc::new(metric);
        self
    }

    pub fn with_max_radius(mut self, max_radius: Distance) -> Self {
        self.max_radius = Some(max_radius);
        self
    }

    pub fn with_upcoming_horizon(mut self, days: u32) -> Self {
        self.upcoming_horizon_days = days;
        self
    }

    pub fn evaluator(&self) -> &Evaluator<C, Z> {
        &self.evaluator
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Venues within the radius, nearest first, evaluated at the request time
    #[instrument(skip(self, request), fields(center = %request.center, radius = %request.radius))]
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        self.check_radius(request.radius)?;

        let bounds = BoundingBox::around(request.center, request.radius);
        let candidates = self.repository.venues_in_bounds(bounds).await?;
        let candidate_count = candidates.len();
        let nearby = filter_within_radius(
            request.center,
            request.radius,
            candidates,
            self.metric.as_ref(),
        );

        let mut hits = Vec::with_capacity(nearby.len());
        for WithinRadius {
            item: venue,
            distance,
        } in nearby
        {
            let at = self.resolve_instant(&venue, request.when)?;
            let availability = self.evaluator.venue_availability_at(&venue, at)?;
            if request.open_only && !availability.is_open {
                continue;
            }

            let specials = self.special_statuses(&venue, at, request.category).await?;
            if request.running_only && !specials.iter().any(|s| s.activity.is_active) {
                continue;
            }

            hits.push(SearchHit {
                venue_id: venue.id,
                name: venue.name,
                address: venue.address,
                coordinate: venue.coordinate,
                distance,
                evaluated_at: at,
                availability,
                specials,
            });
        }

        info!(
            candidates = candidate_count,
            hits = hits.len(),
            "search executed"
        );
        Ok(hits)
    }

    /// Full status of one venue at the requested time
    #[instrument(skip(self))]
    pub async fn venue_status(&self, id: VenueId, when: SearchTime) -> Result<VenueStatus> {
        let venue = self
            .repository
            .venue(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("venue {id}")))?;

        let at = self.resolve_instant(&venue, when)?;
        let zone = self.evaluator.zone_for(&venue)?;
        let availability = self.evaluator.venue_availability_at(&venue, at)?;
        let next_transition = self.evaluator.next_transition_at(&venue, at)?;
        let specials = self.special_statuses(&venue, at, None).await?;

        Ok(VenueStatus {
            local_time: to_local(at, zone),
            evaluated_at: at,
            availability,
            next_transition,
            specials,
            venue,
        })
    }

    fn check_radius(&self, radius: Distance) -> Result<()> {
        match self.max_radius {
            Some(max) if radius > max => Err(ValidationError::invalid_field(
                "radius",
                format!("{radius} exceeds the maximum of {max}"),
            )
            .into()),
            _ => Ok(()),
        }
    }

    /// The instant a venue is evaluated at
    ///
    /// A weekly time resolves against the venue's own zone, so two venues in
    /// different zones get different instants for "Friday 18:00".
    fn resolve_instant(&self, venue: &Venue, when: SearchTime) -> Result<DateTime<Utc>> {
        match when {
            SearchTime::Now => Ok(self.evaluator.now()),
            SearchTime::At(at) => Ok(at),
            SearchTime::Weekly { day, time } => {
                let zone = self.evaluator.zone_for(venue)?;
                let today = to_local(self.evaluator.now(), zone).date();
                let local = next_weekday(today, day).and_time(time);
                let at = to_instant(local, zone).ok_or_else(|| {
                    ValidationError::invalid_field(
                        "search time",
                        format!("{local} does not exist in {zone}"),
                    )
                })?;
                debug!(venue = %venue.id, %local, %at, "resolved weekly search time");
                Ok(at)
            }
        }
    }

    async fn special_statuses(
        &self,
        venue: &Venue,
        at: DateTime<Utc>,
        category: Option<SpecialCategory>,
    ) -> Result<Vec<SpecialStatus>> {
        let specials = self.repository.specials_for_venue(venue.id).await?;

        let mut statuses = specials
            .iter()
            .filter(|special| category.is_none_or(|wanted| special.category() == wanted))
            .map(|special| self.special_status(special, venue, at))
            .collect::<Result<Vec<_>>>()?;

        // Running specials first, then by start time
        statuses.sort_by(|a, b| {
            b.activity
                .is_active
                .cmp(&a.activity.is_active)
                .then_with(|| a.start_time.cmp(&b.start_time))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(statuses)
    }

    fn special_status(
        &self,
        special: &Special,
        venue: &Venue,
        at: DateTime<Utc>,
    ) -> Result<SpecialStatus> {
        Ok(SpecialStatus {
            id: special.id(),
            content: special.content().clone(),
            category: special.category(),
            start_time: special.start_time(),
            end_time: special.end_time(),
            is_recurring: special.is_recurring(),
            activity: self.evaluator.special_activity_at(special, venue, at)?,
            next_occurrence: self.evaluator.upcoming_occurrence_at(
                special,
                venue,
                at,
                self.upcoming_horizon_days,
            )?,
        })
    }
}

/// `from` itself if it falls on `day`, otherwise the next such date
fn next_weekday(from: NaiveDate, day: DayOfWeek) -> NaiveDate {
    let today = DayOfWeek::from(from.weekday()).index();
    let ahead = (day.index() + 7 - today) % 7;
    from + Duration::days(i64::from(ahead))
}
