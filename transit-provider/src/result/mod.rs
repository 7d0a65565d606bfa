//! Typed results of the four query kinds.
//!
//! Each result carries exactly one status from a closed enumeration. The
//! constructors guarantee that results with a status other than OK carry
//! no locations, departures or trips, so callers only need to look at the
//! payload after matching on the status.

mod departures;
mod header;
mod nearby;
mod suggest;
mod trips;

pub use departures::{DeparturesStatus, QueryDeparturesResult};
pub use header::ResultHeader;
pub use nearby::{NearbyLocationsResult, NearbyStatus};
pub use suggest::{SuggestLocationsResult, SuggestStatus, SuggestedLocation};
pub use trips::{QueryTripsResult, TripsStatus};
