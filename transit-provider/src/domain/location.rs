//! Location types.
//!
//! A [`Location`] identifies a place usable in a query: a station, an
//! address, a point of interest, a bare coordinate, or free text (`Any`)
//! that the backend still has to resolve.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::error::LocationError;
use super::{Point, Product};

/// Maximum distance in meters at which two id-less locations are the same place.
pub const SAME_PLACE_EPSILON_METERS: f64 = 1.0;

/// Names that are meaningless without their place ("Hauptbahnhof" of which city?).
const NON_UNIQUE_NAMES: &[&str] = &[
    "Bahnhof",
    "Bf",
    "Busbahnhof",
    "Dorf",
    "Hauptbahnhof",
    "Hbf",
    "Kirche",
    "Markt",
    "Nord",
    "Ost",
    "Schiffst.",
    "Schiffstation",
    "Süd",
    "West",
    "ZOB",
    "Zentrum",
];

/// Kind of place a [`Location`] represents.
///
/// The declaration order is the default ordering used when sorting
/// otherwise equal suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    /// Any of the below; mainly free-text user input
    Any,
    /// A station or stop
    Station,
    /// A point of interest
    Poi,
    /// A postal address
    Address,
    /// A plain coordinate, e.g. from GPS
    Coord,
}

impl LocationType {
    /// All location types, in declaration order.
    pub const ALL: [LocationType; 5] = [
        LocationType::Any,
        LocationType::Station,
        LocationType::Poi,
        LocationType::Address,
        LocationType::Coord,
    ];
}

/// A place usable in a query.
///
/// Locations are immutable and validated on construction:
///
/// - `Any` locations never carry an id
/// - ids are never blank
/// - a place is only set together with a name
/// - `Coord` locations carry a point and nothing else
///
/// # Equality
///
/// Two locations are equal when their types match and either both ids
/// match, or (without ids) both points match exactly, or (without ids
/// and points) place and name match. See [`Location::is_same_place`]
/// for the tolerant comparison used when deduplicating.
///
/// # Examples
///
/// ```
/// use transit_provider::domain::{Location, LocationType};
///
/// let a = Location::coord(52_377_548, 4_901_218).unwrap();
/// let b = Location::coord(52_377_548, 4_901_218).unwrap();
/// assert_eq!(a, b);
///
/// let station = Location::station("8400058").unwrap();
/// assert_eq!(station.kind(), LocationType::Station);
/// assert_ne!(a, station);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct Location {
    #[serde(rename = "type")]
    kind: LocationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    point: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    products: Option<BTreeSet<Product>>,
}

#[derive(Deserialize)]
struct RawLocation {
    #[serde(rename = "type")]
    kind: LocationType,
    id: Option<String>,
    point: Option<Point>,
    place: Option<String>,
    name: Option<String>,
    products: Option<BTreeSet<Product>>,
}

impl TryFrom<RawLocation> for Location {
    type Error = LocationError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        let location = Location::new(raw.kind, raw.id, raw.point, raw.place, raw.name)?;
        Ok(match raw.products {
            Some(products) => location.with_products(products),
            None => location,
        })
    }
}

impl Location {
    /// Create a location, checking its invariants.
    pub fn new(
        kind: LocationType,
        id: Option<String>,
        point: Option<Point>,
        place: Option<String>,
        name: Option<String>,
    ) -> Result<Self, LocationError> {
        if id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(LocationError::BlankId);
        }
        if kind == LocationType::Any && id.is_some() {
            return Err(LocationError::AnyWithId);
        }
        if place.is_some() && name.is_none() {
            return Err(LocationError::PlaceWithoutName);
        }
        if kind == LocationType::Coord {
            if point.is_none() {
                return Err(LocationError::MissingPoint);
            }
            if id.is_some() {
                return Err(LocationError::CoordWithDetail("an id"));
            }
            if name.is_some() {
                return Err(LocationError::CoordWithDetail("a name"));
            }
        }

        Ok(Self {
            kind,
            id,
            point,
            place,
            name,
            products: None,
        })
    }

    /// A coordinate location from microdegrees.
    pub fn coord(lat_e6: i32, lon_e6: i32) -> Result<Self, LocationError> {
        let point = Point::from_e6(lat_e6, lon_e6)?;
        Ok(Self::from_point(point))
    }

    /// A coordinate location from an already validated point.
    pub fn from_point(point: Point) -> Self {
        Self {
            kind: LocationType::Coord,
            id: None,
            point: Some(point),
            place: None,
            name: None,
            products: None,
        }
    }

    /// A station known only by its backend id.
    pub fn station(id: impl Into<String>) -> Result<Self, LocationError> {
        Self::new(LocationType::Station, Some(id.into()), None, None, None)
    }

    /// Free-text input for the backend to resolve.
    pub fn any(name: impl Into<String>) -> Result<Self, LocationError> {
        Self::new(LocationType::Any, None, None, None, Some(name.into()))
    }

    /// Returns a copy of this location serving the given products.
    pub fn with_products(mut self, products: BTreeSet<Product>) -> Self {
        self.products = Some(products);
        self
    }

    /// The kind of place.
    pub fn kind(&self) -> LocationType {
        self.kind
    }

    /// Backend-assigned identifier.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Coordinate, if known.
    pub fn point(&self) -> Option<Point> {
        self.point
    }

    /// Administrative area or city.
    pub fn place(&self) -> Option<&str> {
        self.place.as_deref()
    }

    /// Human-readable label.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Products serving this location, if the backend reported them.
    pub fn products(&self) -> Option<&BTreeSet<Product>> {
        self.products.as_ref()
    }

    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    pub fn has_point(&self) -> bool {
        self.point.is_some()
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// True if a backend can use this location without resolving free text.
    ///
    /// Stations need an id, addresses and coordinates need a point, and
    /// points of interest are always accepted.
    pub fn is_identified(&self) -> bool {
        match self.kind {
            LocationType::Station => self.has_id(),
            LocationType::Poi => true,
            LocationType::Address | LocationType::Coord => self.has_point(),
            LocationType::Any => false,
        }
    }

    /// A short display name, prefixed with the place when the name alone is ambiguous.
    pub fn unique_short_name(&self) -> Option<String> {
        match (&self.place, &self.name) {
            (Some(place), Some(name)) if NON_UNIQUE_NAMES.contains(&name.as_str()) => {
                Some(format!("{place}, {name}"))
            }
            (_, Some(name)) => Some(name.clone()),
            _ => self.id.clone(),
        }
    }

    /// True if both locations denote the same place.
    ///
    /// Types must match. When both carry an id, the ids decide. When
    /// either lacks one, both points must be known and at most
    /// [`SAME_PLACE_EPSILON_METERS`] apart. Locations with neither id nor
    /// point fall back to exact equality.
    pub fn is_same_place(&self, other: &Location) -> bool {
        if self.kind != other.kind {
            return false;
        }
        if let (Some(a), Some(b)) = (&self.id, &other.id) {
            return a == b;
        }
        match (self.point, other.point) {
            (Some(a), Some(b)) => a.distance_to(&b) <= SAME_PLACE_EPSILON_METERS,
            (None, None) if self.id.is_none() && other.id.is_none() => self == other,
            _ => false,
        }
    }

    /// Compare every field, unlike `==` which compares identity only.
    pub fn equals_all_fields(&self, other: &Location) -> bool {
        self.kind == other.kind
            && self.id == other.id
            && self.point == other.point
            && self.place == other.place
            && self.name == other.name
            && self.products == other.products
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        if self.id.is_some() || other.id.is_some() {
            return self.id == other.id;
        }
        if self.point.is_some() || other.point.is_some() {
            return self.point == other.point;
        }
        self.place == other.place && self.name == other.name
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        if let Some(id) = &self.id {
            id.hash(state);
        } else if let Some(point) = &self.point {
            point.hash(state);
        } else {
            self.place.hash(state);
            self.name.hash(state);
        }
    }
}
