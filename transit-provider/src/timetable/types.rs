//! Timetable file DTOs.
//!
//! These types map directly to the JSON timetable format. Optional fields
//! may be omitted; [`convert`](super::convert) validates the records and
//! skips the ones it cannot use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{LocationType, Product, StyleMap};

/// A complete timetable file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableFile {
    /// Network id the provider answers for.
    pub network: String,

    /// Name reported in result headers.
    #[serde(default)]
    pub server_product: Option<String>,

    /// Timetable version reported in result headers.
    #[serde(default)]
    pub version: Option<String>,

    /// Start of the period the timetable covers.
    pub valid_from: DateTime<Utc>,

    /// End of the period the timetable covers.
    pub valid_until: DateTime<Utc>,

    /// Minimum time to change between services at one station.
    #[serde(default = "default_min_change_minutes")]
    pub min_change_minutes: i64,

    /// Longest walk to or from a station, in metres.
    #[serde(default = "default_max_walk_meters")]
    pub max_walk_meters: u32,

    /// Stations, addresses and points of interest.
    pub places: Vec<PlaceRecord>,

    /// Services with their calls.
    #[serde(default)]
    pub services: Vec<ServiceRecord>,

    /// Line badge styles keyed by `network|P|label`, `network|P`, `Plabel` or `P`.
    #[serde(default, skip_serializing_if = "StyleMap::is_empty")]
    pub styles: StyleMap,
}

const fn default_min_change_minutes() -> i64 {
    2
}

const fn default_max_walk_meters() -> u32 {
    1500
}

/// A station, address or point of interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: String,

    /// Place type, STATION when omitted.
    #[serde(default = "default_place_type", rename = "type")]
    pub kind: LocationType,

    pub name: String,

    #[serde(default)]
    pub place: Option<String>,

    /// Latitude in microdegrees.
    pub lat: i32,

    /// Longitude in microdegrees.
    pub lon: i32,

    /// Stations sharing a group are equivalent (one physical hub).
    #[serde(default)]
    pub group: Option<String>,
}

const fn default_place_type() -> LocationType {
    LocationType::Station
}

/// A vehicle run calling at a sequence of stations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub line: LineRecord,

    /// Destination station id; the last call when omitted.
    #[serde(default)]
    pub destination: Option<String>,

    #[serde(default)]
    pub bikes_allowed: bool,

    #[serde(default)]
    pub wheelchair_accessible: bool,

    pub calls: Vec<CallRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRecord {
    pub label: String,
    pub product: Product,

    #[serde(default)]
    pub network: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

/// A call at a station. At least one of `arr` and `dep` must be given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub station: String,

    #[serde(default)]
    pub arr: Option<DateTime<Utc>>,

    #[serde(default)]
    pub dep: Option<DateTime<Utc>>,

    #[serde(default)]
    pub platform: Option<String>,
}
