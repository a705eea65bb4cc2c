//! Read access to venues and specials
//!
//! [`VenueRepository`] is the seam the application layer searches through.
//! [`JsonCatalog`] implements it over a catalog document loaded into memory;
//! the document is converted in full at load time so a malformed record
//! fails the load instead of a later query.

use crate::domain::errors::ValidationError;
use crate::domain::geo::BoundingBox;
use crate::domain::identifiers::VenueId;
use crate::domain::special::Special;
use crate::domain::venue::Venue;
use crate::infrastructure::records::CatalogDocument;
use crate::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Source of venues and their specials
#[async_trait]
pub trait VenueRepository: Send + Sync {
    /// A single venue, or `None` if the id is unknown
    async fn venue(&self, id: VenueId) -> Result<Option<Venue>>;

    /// Venues whose coordinate lies inside `bounds`
    ///
    /// This is a coarse prefilter; callers apply the exact radius check.
    async fn venues_in_bounds(&self, bounds: BoundingBox) -> Result<Vec<Venue>>;

    /// All specials of a venue, in no particular order
    async fn specials_for_venue(&self, id: VenueId) -> Result<Vec<Special>>;
}

#[async_trait]
impl<R: VenueRepository + ?Sized> VenueRepository for Arc<R> {
    async fn venue(&self, id: VenueId) -> Result<Option<Venue>> {
        (**self).venue(id).await
    }

    async fn venues_in_bounds(&self, bounds: BoundingBox) -> Result<Vec<Venue>> {
        (**self).venues_in_bounds(bounds).await
    }

    async fn specials_for_venue(&self, id: VenueId) -> Result<Vec<Special>> {
        (**self).specials_for_venue(id).await
    }
}

/// In-memory catalog built from a [`CatalogDocument`]
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    venues: BTreeMap<VenueId, Venue>,
    specials: BTreeMap<VenueId, Vec<Special>>,
}

impl JsonCatalog {
    /// Convert every record, rejecting duplicates and orphaned specials
    pub fn from_document(document: &CatalogDocument) -> Result<Self> {
        let mut venues = BTreeMap::new();
        for record in &document.venues {
            let venue = Venue::try_from(record).inspect_err(|e| {
                warn!(venue = %record.id, error = %e, "rejecting venue record");
            })?;
            if venues.insert(venue.id, venue).is_some() {
                return Err(ValidationError::invalid_field(
                    "venue id",
                    format!("{} appears more than once", record.id),
                )
                .into());
            }
        }

        let mut specials: BTreeMap<VenueId, Vec<Special>> = BTreeMap::new();
        for record in &document.specials {
            let special = Special::try_from(record).inspect_err(|e| {
                warn!(special = %record.id, error = %e, "rejecting special record");
            })?;
            if !venues.contains_key(&special.venue_id()) {
                return Err(ValidationError::invalid_field(
                    "special",
                    format!("{} references unknown venue {}", record.id, record.venue_id),
                )
                .into());
            }
            specials.entry(special.venue_id()).or_default().push(special);
        }

        debug!(
            venues = venues.len(),
            specials = document.specials.len(),
            "catalog converted"
        );
        Ok(Self { venues, specials })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::from_document(&document)
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let catalog = Self::from_json_str(&raw)?;
        info!(
            venues = catalog.venue_count(),
            specials = catalog.special_count(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn venue_count(&self) -> usize {
        self.venues.len()
    }

    pub fn special_count(&self) -> usize {
        self.specials.values().map(Vec::len).sum()
    }

    /// The catalog back in its stored shape
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            venues: self.venues.values().map(Into::into).collect(),
            specials: self.specials.values().flatten().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl VenueRepository for JsonCatalog {
    async fn venue(&self, id: VenueId) -> Result<Option<Venue>> {
        Ok(self.venues.get(&id).cloned())
    }

    async fn venues_in_bounds(&self, bounds: BoundingBox) -> Result<Vec<Venue>> {
        Ok(self
            .venues
            .values()
            .filter(|venue| bounds.contains(venue.coordinate))
            .cloned()
            .collect())
    }

    async fn specials_for_venue(&self, id: VenueId) -> Result<Vec<Special>> {
        Ok(self.specials.get(&id).cloned().unwrap_or_default())
    }
}
