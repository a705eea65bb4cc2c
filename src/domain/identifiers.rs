//! Identifiers for venues and specials
//!
//! Each identifier is a newtype around a UUID. They are totally ordered so
//! that search results can break distance ties deterministically.

use nutype::nutype;
use uuid::Uuid;

/// Unique identifier for a venue
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRef
))]
pub struct VenueId(Uuid);

impl VenueId {
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl Default for VenueId {
    fn default() -> Self {
        Self::generate()
    }
}

/// Unique identifier for a special
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRef
))]
pub struct SpecialId(Uuid);

impl SpecialId {
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl Default for SpecialId {
    fn default() -> Self {
        Self::generate()
    }
}
