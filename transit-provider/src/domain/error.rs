//! Domain error types.
//!
//! These errors represent values that violate a domain invariant at
//! construction time. They are caller programming errors and distinct
//! from the operational statuses carried by query results.

use super::LocationType;

/// Error returned when constructing a [`Point`](super::Point) outside the valid range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointError {
    /// Latitude outside [-90e6, 90e6] microdegrees
    #[error("latitude out of range: {0} microdegrees")]
    Latitude(i32),

    /// Longitude outside [-180e6, 180e6] microdegrees
    #[error("longitude out of range: {0} microdegrees")]
    Longitude(i32),

    /// Coordinate given in degrees was not a finite number
    #[error("coordinate is not a finite number")]
    NotFinite,
}

/// Error returned when a [`Location`](super::Location) violates its invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// ANY locations are free-text input and never carry an id
    #[error("location of type ANY cannot have an id")]
    AnyWithId,

    /// Ids are either absent or non-blank
    #[error("location id cannot be blank")]
    BlankId,

    /// A place is a qualifier for a name
    #[error("location place cannot be set without a name")]
    PlaceWithoutName,

    /// Coordinate locations need a point
    #[error("coordinate location is missing its point")]
    MissingPoint,

    /// Coordinate locations carry nothing but a point
    #[error("coordinate location cannot have {0}")]
    CoordWithDetail(&'static str),

    /// Invalid point
    #[error(transparent)]
    Point(#[from] PointError),
}

/// Error returned when a trip or leg cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TripError {
    /// Trip has no legs
    #[error("trip must have at least one leg")]
    EmptyTrip,

    /// Stop of a public leg is missing the time the leg needs
    #[error("missing required time data: {0}")]
    MissingTime(&'static str),

    /// Leg arrives before it departs
    #[error("leg arrives before it departs")]
    ArrivalBeforeDeparture,
}

/// Error returned when a departure cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DepartureError {
    /// Neither planned nor predicted time is known
    #[error("departure needs a planned or predicted time")]
    MissingTime,

    /// Departures belong to station locations
    #[error("departures belong to a station, not {0:?}")]
    NotAStation(LocationType),
}

/// Error returned when parsing an unknown product code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown product code: {0:?}")]
pub struct InvalidProductCode(pub char);

/// Error returned when parsing a line style.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    /// Colours are written `#rrggbb` or `#aarrggbb`
    #[error("invalid colour: {0:?}")]
    InvalidColor(String),
}
