//! Domain types shared by every provider operation.
//!
//! This module contains the location, line, line style, stop, trip and departure
//! value types. All types enforce their invariants at construction time,
//! so code that receives them can trust their validity.

mod departure;
mod error;
mod line;
mod location;
mod point;
mod product;
mod stop;
mod style;
mod trip;

pub use departure::{Departure, StationDepartures};
pub use error::{
    DepartureError, InvalidProductCode, LocationError, PointError, StyleError, TripError,
};
pub use line::{Line, LineAttr, LineDestination};
pub use location::{Location, LocationType, SAME_PLACE_EPSILON_METERS};
pub use point::{MAX_LAT_E6, MAX_LON_E6, Point};
pub use product::Product;
pub use stop::{Position, Stop};
pub use style::{Color, Shape, Style, StyleMap};
pub use trip::{IndividualLeg, IndividualType, Leg, PublicLeg, Trip};
