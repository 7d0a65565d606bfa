//! Provider capability flags.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::LocationType;
use crate::identity::DEFAULT_TYPE_ORDER;

/// Something a provider may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    SuggestLocations,
    NearbyLocations,
    Departures,
    Trips,
    /// Trip search through a via location
    TripsVia,
    /// Departures of equivalent stations on request
    EquivalentStations,
}

/// What a provider supports, fixed for the lifetime of a provider instance.
///
/// # Examples
///
/// ```
/// use transit_provider::domain::LocationType;
/// use transit_provider::provider::{Capabilities, Capability};
///
/// let caps = Capabilities::new([Capability::Trips, Capability::Departures])
///     .with_suggest_types([LocationType::Station]);
/// assert!(caps.has_capabilities(&[Capability::Trips]));
/// assert!(!caps.has_capabilities(&[Capability::Trips, Capability::TripsVia]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    operations: BTreeSet<Capability>,
    suggest_types: BTreeSet<LocationType>,
    type_order: Vec<LocationType>,
}

impl Capabilities {
    pub fn new(operations: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            operations: operations.into_iter().collect(),
            suggest_types: BTreeSet::new(),
            type_order: DEFAULT_TYPE_ORDER.to_vec(),
        }
    }

    /// Location types the provider can resolve from free text.
    pub fn with_suggest_types(mut self, types: impl IntoIterator<Item = LocationType>) -> Self {
        self.suggest_types = types.into_iter().collect();
        self
    }

    /// Type order used to break ties between equally scored suggestions.
    pub fn with_type_order(mut self, order: impl IntoIterator<Item = LocationType>) -> Self {
        self.type_order = order.into_iter().collect();
        self
    }

    /// True if every listed capability is supported.
    pub fn has_capabilities(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().all(|c| self.operations.contains(c))
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.operations.contains(&capability)
    }

    pub fn operations(&self) -> &BTreeSet<Capability> {
        &self.operations
    }

    pub fn suggest_types(&self) -> &BTreeSet<LocationType> {
        &self.suggest_types
    }

    pub fn type_order(&self) -> &[LocationType] {
        &self.type_order
    }
}
