//! Conversion from timetable DTOs to the in-memory timetable.
//!
//! Records that violate a domain invariant are logged and skipped, so one
//! bad service does not take down the whole network.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::domain::{
    Line, LineAttr, Location, LocationError, LocationType, Point, Product, StyleMap,
};
use crate::provider::NetworkId;
use crate::result::ResultHeader;

use super::error::TimetableError;
use super::types::{CallRecord, PlaceRecord, ServiceRecord, TimetableFile};

/// Product name reported when the file does not name one.
const DEFAULT_SERVER_PRODUCT: &str = "timetable";

/// Error converting a single record.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// The place does not make a valid location
    #[error("invalid place {id}: {source}")]
    InvalidPlace { id: String, source: LocationError },

    /// Place ids are unique
    #[error("duplicate place id: {0}")]
    DuplicateId(String),

    /// Calls reference stations by id
    #[error("service {service} calls at unknown station {station}")]
    UnknownStation { service: String, station: String },

    /// A service runs between at least two stations
    #[error("service {0} needs at least two calls")]
    TooFewCalls(String),

    /// Every call needs an arrival or a departure time
    #[error("service {service} has no time at {station}")]
    MissingTime { service: String, station: String },

    /// Call times never decrease along a service
    #[error("service {0} goes back in time")]
    TimeTravel(String),
}

/// A station, address or point of interest.
#[derive(Debug, Clone)]
pub struct Place {
    pub location: Location,
    pub point: Point,
    pub group: Option<String>,
}

impl Place {
    pub fn is_station(&self) -> bool {
        self.location.kind() == LocationType::Station
    }
}

/// A call with both times filled in.
///
/// A missing arrival copies the departure and vice versa. Passengers may
/// board at every call but the last and alight at every call but the first.
#[derive(Debug, Clone)]
pub struct Call {
    pub station: usize,
    pub arrival: DateTime<Utc>,
    pub departure: DateTime<Utc>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub id: String,
    pub line: Line,
    pub destination: Option<Location>,
    pub bikes_allowed: bool,
    pub wheelchair_accessible: bool,
    pub calls: Vec<Call>,
}

/// A validated, indexed timetable.
#[derive(Debug, Clone)]
pub struct Timetable {
    pub network: NetworkId,
    pub header: ResultHeader,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub min_change: Duration,
    pub max_walk_meters: u32,
    pub places: Vec<Place>,
    pub services: Vec<Service>,
    pub styles: StyleMap,
    by_id: HashMap<String, usize>,
    /// Boardable calls per place as (service, call), by departure time
    departures_at: Vec<Vec<(usize, usize)>>,
}

impl Timetable {
    /// Index of the place with `id`.
    pub fn place_index(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Calls at `place` where passengers can board, earliest first.
    pub fn departures_at(&self, place: usize) -> &[(usize, usize)] {
        self.departures_at
            .get(place)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `place` followed by the other stations of its group, by id.
    pub fn equivalents(&self, place: usize) -> Vec<usize> {
        let mut result = vec![place];
        let Some(group) = self.places.get(place).and_then(|p| p.group.as_deref()) else {
            return result;
        };
        let mut others: Vec<usize> = (0..self.places.len())
            .filter(|&i| i != place)
            .filter(|&i| self.places[i].is_station())
            .filter(|&i| self.places[i].group.as_deref() == Some(group))
            .collect();
        others.sort_by(|&a, &b| self.places[a].location.id().cmp(&self.places[b].location.id()));
        result.extend(others);
        result
    }

    /// Products of all services.
    pub fn products(&self) -> BTreeSet<Product> {
        self.services
            .iter()
            .filter_map(|s| s.line.product)
            .collect()
    }

    /// Bounding box of all places as a closed ring (SW, SE, NE, NW), or
    /// `None` if there are no places.
    pub fn bounds(&self) -> Option<Vec<Point>> {
        let first = self.places.first()?.point;
        let (mut south, mut west) = (first.lat_e6(), first.lon_e6());
        let (mut north, mut east) = (south, west);
        for place in &self.places[1..] {
            south = south.min(place.point.lat_e6());
            north = north.max(place.point.lat_e6());
            west = west.min(place.point.lon_e6());
            east = east.max(place.point.lon_e6());
        }
        [(south, west), (south, east), (north, east), (north, west)]
            .into_iter()
            .map(|(lat, lon)| Point::from_e6(lat, lon).ok())
            .collect()
    }

    /// True if `time` lies within the validity window.
    pub fn covers(&self, time: DateTime<Utc>) -> bool {
        self.valid_from <= time && time <= self.valid_until
    }
}

/// Build a timetable from a parsed file.
pub fn convert_timetable(file: TimetableFile) -> Result<Timetable, TimetableError> {
    if file.network.trim().is_empty() {
        return Err(TimetableError::BlankNetwork);
    }
    if file.valid_until < file.valid_from {
        return Err(TimetableError::InvalidWindow);
    }

    let network = NetworkId::new(&file.network);
    let mut header = ResultHeader::new(
        network.clone(),
        file.server_product
            .as_deref()
            .unwrap_or(DEFAULT_SERVER_PRODUCT),
    );
    if let Some(version) = &file.version {
        header = header.with_server_version(version);
    }

    let mut places = Vec::with_capacity(file.places.len());
    let mut by_id = HashMap::with_capacity(file.places.len());
    for record in &file.places {
        if by_id.contains_key(&record.id) {
            warn!(error = %ConversionError::DuplicateId(record.id.clone()), "skipping place");
            continue;
        }
        match convert_place(record) {
            Ok(place) => {
                by_id.insert(record.id.clone(), places.len());
                places.push(place);
            }
            Err(e) => warn!(error = %e, "skipping place"),
        }
    }

    let mut services = Vec::with_capacity(file.services.len());
    for record in &file.services {
        match convert_service(record, &file.network, &file.styles, &places, &by_id) {
            Ok(service) => services.push(service),
            Err(e) => warn!(error = %e, "skipping service"),
        }
    }

    let departures_at = index_departures(places.len(), &services);
    attach_products(&mut places, &services);

    Ok(Timetable {
        network,
        header,
        valid_from: file.valid_from,
        valid_until: file.valid_until,
        min_change: Duration::minutes(file.min_change_minutes.max(0)),
        max_walk_meters: file.max_walk_meters,
        places,
        services,
        styles: file.styles,
        by_id,
        departures_at,
    })
}

fn convert_place(record: &PlaceRecord) -> Result<Place, ConversionError> {
    let invalid = |source: LocationError| ConversionError::InvalidPlace {
        id: record.id.clone(),
        source,
    };

    let point = Point::from_e6(record.lat, record.lon).map_err(|e| invalid(e.into()))?;
    let location = Location::new(
        record.kind,
        Some(record.id.clone()),
        Some(point),
        record.place.clone(),
        Some(record.name.clone()),
    )
    .map_err(invalid)?;

    Ok(Place {
        location,
        point,
        group: record.group.clone(),
    })
}

fn convert_service(
    record: &ServiceRecord,
    network: &str,
    styles: &StyleMap,
    places: &[Place],
    by_id: &HashMap<String, usize>,
) -> Result<Service, ConversionError> {
    if record.calls.len() < 2 {
        return Err(ConversionError::TooFewCalls(record.id.clone()));
    }

    let calls = record
        .calls
        .iter()
        .map(|call| convert_call(record, call, places, by_id))
        .collect::<Result<Vec<_>, _>>()?;

    let in_order = calls.iter().all(|c| c.arrival <= c.departure)
        && calls
            .windows(2)
            .all(|pair| pair[0].departure <= pair[1].arrival);
    if !in_order {
        return Err(ConversionError::TimeTravel(record.id.clone()));
    }

    let destination_id = record
        .destination
        .as_deref()
        .or_else(|| record.calls.last().map(|c| c.station.as_str()));
    let destination = destination_id
        .and_then(|id| by_id.get(id))
        .map(|&i| places[i].location.clone());

    let mut line = Line::new(
        Some(record.line.network.clone().unwrap_or_else(|| network.to_string())),
        Some(record.line.product),
        Some(record.line.label.clone()),
    );
    line.id = Some(format!("{network}:{}", record.line.label));
    line.name = record.line.name.clone();
    line.style = Some(styles.lookup(
        line.network.as_deref(),
        line.product,
        line.label.as_deref(),
    ));
    if record.bikes_allowed {
        line = line.with_attr(LineAttr::BicycleCarriage);
    }
    if record.wheelchair_accessible {
        line = line.with_attr(LineAttr::WheelChairAccess);
    }

    Ok(Service {
        id: record.id.clone(),
        line,
        destination,
        bikes_allowed: record.bikes_allowed,
        wheelchair_accessible: record.wheelchair_accessible,
        calls,
    })
}

fn convert_call(
    service: &ServiceRecord,
    call: &CallRecord,
    places: &[Place],
    by_id: &HashMap<String, usize>,
) -> Result<Call, ConversionError> {
    let station = by_id
        .get(&call.station)
        .copied()
        .filter(|&i| places[i].is_station())
        .ok_or_else(|| ConversionError::UnknownStation {
            service: service.id.clone(),
            station: call.station.clone(),
        })?;

    let (arrival, departure) = match (call.arr, call.dep) {
        (Some(arr), Some(dep)) => (arr, dep),
        (Some(t), None) | (None, Some(t)) => (t, t),
        (None, None) => {
            return Err(ConversionError::MissingTime {
                service: service.id.clone(),
                station: call.station.clone(),
            });
        }
    };

    Ok(Call {
        station,
        arrival,
        departure,
        platform: call.platform.clone(),
    })
}

fn index_departures(num_places: usize, services: &[Service]) -> Vec<Vec<(usize, usize)>> {
    let mut index = vec![Vec::new(); num_places];
    for (s, service) in services.iter().enumerate() {
        let boardable = service.calls.len().saturating_sub(1);
        for (c, call) in service.calls.iter().enumerate().take(boardable) {
            index[call.station].push((s, c));
        }
    }
    for calls in &mut index {
        calls.sort_by_key(|&(s, c)| (services[s].calls[c].departure, s, c));
    }
    index
}

/// Stations report the products of the services calling there.
fn attach_products(places: &mut [Place], services: &[Service]) {
    let mut products: HashMap<usize, BTreeSet<Product>> = HashMap::new();
    for service in services {
        let Some(product) = service.line.product else {
            continue;
        };
        for call in &service.calls {
            products.entry(call.station).or_default().insert(product);
        }
    }
    for (i, served) in products {
        let place = &mut places[i];
        place.location = place.location.clone().with_products(served);
    }
}
