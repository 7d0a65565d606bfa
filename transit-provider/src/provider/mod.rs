//! The provider interface every backend driver implements.
//!
//! A [`NetworkProvider`] answers the five queries over one transit
//! network. Callers depend only on this trait; a concrete driver maps it to
//! its backend's wire protocol.
//!
//! Two tiers of failure are kept apart:
//!
//! - `Err(ProviderError)` is a caller programming error (a malformed
//!   location, a blank station id, paging in a direction the context does
//!   not allow). It is reported before any round trip.
//! - `Ok(result)` with a status other than OK is an operational outcome
//!   (unknown station, backend unreachable, no trips) that every caller is
//!   expected to branch on.

mod capability;
mod config;
mod error;
pub mod guard;
mod network;
mod options;
mod registry;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::context::TripsContext;
use crate::domain::{Location, LocationType, Point, Product, Style};
use crate::result::{
    NearbyLocationsResult, QueryDeparturesResult, QueryTripsResult, SuggestLocationsResult,
};

pub use capability::{Capabilities, Capability};
pub use config::{ConfigError, ProviderConfig};
pub use error::ProviderError;
pub use guard::Guarded;
pub use network::NetworkId;
pub use options::{Accessibility, Optimize, TripFlag, TripOptions, TripQuery, WalkSpeed};
pub use registry::Registry;

/// A backend driver for one transit network.
///
/// Implementations must be safe to call concurrently and keep no mutable
/// state between calls. Limits are advisory upper bounds where `0` means
/// the backend default; a result never holds more entries than a non-zero
/// limit. An empty `types` set means every location type.
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    /// The network this provider answers for.
    fn id(&self) -> &NetworkId;

    /// What this provider supports. Fixed for the lifetime of the instance.
    fn capabilities(&self) -> &Capabilities;

    /// True if every listed capability is supported.
    fn has_capabilities(&self, capabilities: &[Capability]) -> bool {
        self.capabilities().has_capabilities(capabilities)
    }

    /// Products a trip query uses when the caller does not restrict them.
    fn default_products(&self) -> BTreeSet<Product> {
        Product::all_except_high_speed()
    }

    /// Badge style for a line of this network.
    fn line_style(
        &self,
        _network: Option<&str>,
        product: Option<Product>,
        _label: Option<&str>,
    ) -> Style {
        Style::standard(product)
    }

    /// Polygon bounding the area this provider covers, if known.
    async fn area(&self) -> Option<Vec<Point>> {
        None
    }

    /// Locations near `location`, which must carry an id or a point.
    async fn query_nearby_locations(
        &self,
        location: &Location,
        types: &BTreeSet<LocationType>,
        max_distance: u32,
        max_locations: u32,
    ) -> Result<NearbyLocationsResult, ProviderError>;

    /// Locations matching free text. Empty or short queries are not errors.
    async fn suggest_locations(
        &self,
        query: &str,
        types: &BTreeSet<LocationType>,
        max_locations: u32,
    ) -> Result<SuggestLocationsResult, ProviderError>;

    /// Departures from a station, starting at `time` (now or the start of
    /// the backend's data when `None`).
    ///
    /// With `equivs`, departures of equivalent stations are included as
    /// separate boards.
    async fn query_departures(
        &self,
        station_id: &str,
        time: Option<DateTime<Utc>>,
        max_departures: u32,
        equivs: bool,
    ) -> Result<QueryDeparturesResult, ProviderError>;

    /// Trips for a query.
    async fn query_trips(&self, query: &TripQuery) -> Result<QueryTripsResult, ProviderError>;

    /// Earlier or later trips relative to a previous result.
    ///
    /// The context is not consumed: calling twice with the same context
    /// yields equal trips, and a context stays usable after paging from it.
    async fn query_more_trips(
        &self,
        context: &TripsContext,
        later: bool,
    ) -> Result<QueryTripsResult, ProviderError>;
}
