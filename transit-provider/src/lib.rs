//! Public-transport provider abstraction.
//!
//! One interface, [`provider::NetworkProvider`], answers the questions a
//! journey-planning client asks of any transit network: which stops are
//! near a place, which places match some text, what departs from a station,
//! and how to get from A to B, with paging to earlier and later trips.
//! Backend drivers implement the interface; callers only see the typed
//! results and their status enums.

pub mod context;
pub mod domain;
pub mod identity;
pub mod provider;
pub mod result;
pub mod timetable;
pub mod transport;
