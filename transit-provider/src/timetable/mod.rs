//! Static-timetable backend.
//!
//! Serves all five provider operations from a JSON timetable: places with
//! coordinates and equivalence groups, services with timed calls, and the
//! period the timetable is valid for. The timetable is loaded once, from a
//! string, a file or an HTTP endpoint, and never changes afterwards.
//!
//! Key characteristics:
//! - Trip search covers direct and one-change connections, with walks to
//!   and from coordinates, addresses and points of interest
//! - Paging contexts are self-contained, so any context can be reused or
//!   passed between processes as a token

mod convert;
mod error;
mod provider;
mod search;
mod types;

pub use convert::ConversionError;
pub use error::TimetableError;
pub use provider::TimetableProvider;
pub use types::{CallRecord, LineRecord, PlaceRecord, ServiceRecord, TimetableFile};
