//! [`NetworkProvider`] over an in-memory timetable.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::context::TripsContext;
use crate::domain::{
    Departure, DepartureError, LineDestination, Location, LocationType, Point, Position, Product,
    StationDepartures, Style,
};
use crate::identity::rank_suggestions;
use crate::provider::guard::{self, limit, type_allowed};
use crate::provider::{
    Capabilities, Capability, NetworkId, NetworkProvider, ProviderConfig, ProviderError,
    TripQuery,
};
use crate::result::{
    NearbyLocationsResult, QueryDeparturesResult, QueryTripsResult, ResultHeader,
    SuggestLocationsResult, SuggestedLocation, TripsStatus,
};
use crate::transport::HttpTransport;

use super::convert::{Timetable, convert_timetable};
use super::error::TimetableError;
use super::search::{Access, Page, Search, TripKey, find_trips, select_page};
use super::types::TimetableFile;

/// Trips per page when the configuration asks for the default.
const DEFAULT_NUM_TRIPS: usize = 6;

/// Path of the timetable document below the configured endpoint.
const TIMETABLE_PATH: &str = "timetable.json";

const NO_QUERY: &[(&str, &str)] = &[];

/// Suggestion priorities, best first.
const PRIORITY_EXACT: i32 = 100;
const PRIORITY_PREFIX: i32 = 90;
const PRIORITY_WORD_PREFIX: i32 = 50;
const PRIORITY_SUBSTRING: i32 = 10;

/// A provider answering from a static timetable.
///
/// The timetable is immutable and shared, so clones are cheap and calls
/// never contend. Paging contexts carry the original query and the bounds
/// of the page they were created for; the trip list is recomputed on every
/// call, which keeps contexts reusable.
#[derive(Debug, Clone)]
pub struct TimetableProvider {
    timetable: Arc<Timetable>,
    capabilities: Capabilities,
    num_trips: usize,
}

/// Where a page of trips starts and ends.
#[derive(Debug, Serialize, Deserialize)]
struct Cursor {
    query: TripQuery,
    first: TripKey,
    last: TripKey,
}

/// A resolved trip endpoint.
#[derive(Debug)]
struct Endpoint {
    location: Location,
    access: Vec<Access>,
}

impl TimetableProvider {
    /// Build a provider from a parsed timetable file.
    pub fn new(file: TimetableFile, config: &ProviderConfig) -> Result<Self, TimetableError> {
        let timetable = convert_timetable(file)?;
        debug!(
            network = %timetable.network,
            places = timetable.places.len(),
            services = timetable.services.len(),
            "loaded timetable"
        );

        let num_trips = match config.num_trips {
            0 => DEFAULT_NUM_TRIPS,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };

        let capabilities = Capabilities::new([
            Capability::SuggestLocations,
            Capability::NearbyLocations,
            Capability::Departures,
            Capability::Trips,
            Capability::TripsVia,
            Capability::EquivalentStations,
        ])
        .with_suggest_types([
            LocationType::Station,
            LocationType::Poi,
            LocationType::Address,
        ]);

        Ok(Self {
            timetable: Arc::new(timetable),
            capabilities,
            num_trips,
        })
    }

    pub fn from_json_str(json: &str, config: &ProviderConfig) -> Result<Self, TimetableError> {
        let file: TimetableFile = serde_json::from_str(json)?;
        Self::new(file, config)
    }

    /// Load a timetable file from disk.
    pub async fn load(
        path: impl AsRef<Path>,
        config: &ProviderConfig,
    ) -> Result<Self, TimetableError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&json, config)
    }

    /// Download the timetable from the configured endpoint.
    ///
    /// There is no default endpoint, so the configuration must set one.
    pub async fn fetch(config: &ProviderConfig) -> Result<Self, TimetableError> {
        let Some(endpoint) = config.endpoint_override.as_deref() else {
            return Err(TimetableError::NoEndpoint);
        };
        let transport = HttpTransport::new(config, endpoint)?;
        let file: TimetableFile = transport.get_json(TIMETABLE_PATH, NO_QUERY).await?;
        Self::new(file, config)
    }

    /// Start of the period the timetable covers.
    pub fn valid_from(&self) -> DateTime<Utc> {
        self.timetable.valid_from
    }

    /// End of the period the timetable covers.
    pub fn valid_until(&self) -> DateTime<Utc> {
        self.timetable.valid_until
    }

    fn header(&self) -> ResultHeader {
        self.timetable.header.clone()
    }

    fn board(
        &self,
        station: usize,
        time: DateTime<Utc>,
        max: usize,
    ) -> Result<StationDepartures, DepartureError> {
        let tt = &*self.timetable;
        let mut departures = Vec::new();
        let mut lines: Vec<LineDestination> = Vec::new();

        for &(s, c) in tt.departures_at(station) {
            let service = &tt.services[s];
            let call = &service.calls[c];

            let line = LineDestination::new(service.line.clone(), service.destination.clone());
            if !lines.contains(&line) {
                lines.push(line);
            }

            if call.departure < time || departures.len() >= max {
                continue;
            }
            departures.push(Departure::new(
                Some(call.departure),
                None,
                service.line.clone(),
                call.platform.as_deref().map(Position::new),
                service.destination.clone(),
            )?);
        }

        lines.sort_by(|a, b| a.line.cmp(&b.line));
        StationDepartures::new(tt.places[station].location.clone(), departures, Some(lines))
    }

    fn resolve(&self, location: &Location, unknown: TripsStatus) -> Result<Endpoint, TripsStatus> {
        if let Some(id) = location.id() {
            return self
                .timetable
                .place_index(id)
                .map(|i| self.endpoint_at(i))
                .ok_or(unknown);
        }

        if let Some(point) = location.point() {
            return Ok(Endpoint {
                location: location.clone(),
                access: self.walkable_stations(point),
            });
        }

        match self.places_named(location).as_slice() {
            [] if location.kind() == LocationType::Address => {
                Err(TripsStatus::UnresolvableAddress)
            }
            [] => Err(unknown),
            [i] => Ok(self.endpoint_at(*i)),
            _ => Err(TripsStatus::Ambiguous),
        }
    }

    fn endpoint_at(&self, index: usize) -> Endpoint {
        let place = &self.timetable.places[index];
        let access = if place.is_station() {
            vec![Access::at(index)]
        } else {
            self.walkable_stations(place.point)
        };
        Endpoint {
            location: place.location.clone(),
            access,
        }
    }

    /// Stations within walking distance of `point`, nearest first.
    fn walkable_stations(&self, point: Point) -> Vec<Access> {
        let max = f64::from(self.timetable.max_walk_meters);
        let mut access: Vec<Access> = self
            .timetable
            .places
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_station())
            .filter_map(|(i, p)| {
                let meters = point.distance_to(&p.point).ceil();
                (meters <= max).then(|| Access::walking(i, meters as u32))
            })
            .collect();
        access.sort_by_key(|a| (a.meters, a.station));
        access
    }

    /// Places whose name (or place-qualified short name) matches a name-only location.
    fn places_named(&self, location: &Location) -> Vec<usize> {
        let Some(name) = location.name().map(|n| n.trim().to_lowercase()) else {
            return Vec::new();
        };

        self.timetable
            .places
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                location.kind() == LocationType::Any || p.location.kind() == location.kind()
            })
            .filter(|(_, p)| {
                let same = |candidate: Option<String>| {
                    candidate.is_some_and(|c| c.to_lowercase() == name)
                };
                same(p.location.name().map(str::to_string)) || same(p.location.unique_short_name())
            })
            .filter(|(_, p)| {
                location.place().is_none_or(|wanted| {
                    p.location
                        .place()
                        .is_some_and(|place| place.to_lowercase() == wanted.trim().to_lowercase())
                })
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Run a trip search and cut out one page.
    fn plan(&self, query: &TripQuery, page: Page) -> QueryTripsResult {
        let tt = &*self.timetable;
        let with_status = |status| {
            QueryTripsResult::from_status(self.id().clone(), status).with_header(self.header())
        };

        if query.from.is_same_place(&query.to) {
            return with_status(TripsStatus::TooClose);
        }
        if !tt.covers(query.time) {
            debug!(time = %query.time, "outside timetable validity");
            return with_status(TripsStatus::InvalidDate);
        }

        let resolved = self.resolve(&query.from, TripsStatus::UnknownFrom).and_then(|from| {
            let to = self.resolve(&query.to, TripsStatus::UnknownTo)?;
            let via = query
                .via
                .as_ref()
                .map(|via| self.resolve(via, TripsStatus::UnknownVia))
                .transpose()?;
            Ok((from, via, to))
        });
        let (from, via, to) = match resolved {
            Ok(endpoints) => endpoints,
            Err(status) => return with_status(status),
        };
        if from.location.is_same_place(&to.location) {
            return with_status(TripsStatus::TooClose);
        }

        let via_stations: Option<Vec<usize>> = via
            .as_ref()
            .map(|v| v.access.iter().map(|a| a.station).collect());
        let trips = find_trips(
            tt,
            &Search {
                from: &from.location,
                origin: &from.access,
                to: &to.location,
                destination: &to.access,
                via: via_stations.as_deref(),
                options: &query.options,
            },
        );

        let keys: Vec<TripKey> = trips.iter().map(TripKey::of).collect();
        let selected = select_page(&keys, &page, self.num_trips);
        let (Some(&first), Some(&last)) = (selected.first(), selected.last()) else {
            return with_status(TripsStatus::NoTrips);
        };

        let cursor = Cursor {
            query: query.clone(),
            first: keys[first].clone(),
            last: keys[last].clone(),
        };
        let context =
            match TripsContext::new(self.id().clone(), first > 0, last + 1 < keys.len(), &cursor) {
                Ok(context) => context,
                Err(e) => {
                    warn!(error = %e, "failed to encode trips context");
                    return QueryTripsResult::service_down(self.id().clone(), e.to_string())
                        .with_header(self.header());
                }
            };

        let page_trips = selected.into_iter().map(|i| trips[i].clone()).collect();
        QueryTripsResult::ok(
            Some(from.location),
            via.map(|v| v.location),
            Some(to.location),
            page_trips,
            context,
        )
        .with_header(self.header())
    }
}

/// How well `location` matches a lowercased query, if at all.
fn match_priority(location: &Location, needle: &str) -> Option<i32> {
    if location.id().is_some_and(|id| id.to_lowercase() == needle) {
        return Some(PRIORITY_EXACT);
    }

    let name = location.name()?.to_lowercase();
    let qualified = location
        .place()
        .map(|place| format!("{} {name}", place.to_lowercase()));

    if name == needle || qualified.as_deref() == Some(needle) {
        Some(PRIORITY_EXACT)
    } else if name.starts_with(needle) || qualified.is_some_and(|q| q.starts_with(needle)) {
        Some(PRIORITY_PREFIX)
    } else if name
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word.starts_with(needle))
    {
        Some(PRIORITY_WORD_PREFIX)
    } else if name.contains(needle) {
        Some(PRIORITY_SUBSTRING)
    } else {
        None
    }
}

#[async_trait]
impl NetworkProvider for TimetableProvider {
    fn id(&self) -> &NetworkId {
        &self.timetable.network
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Every product the timetable runs.
    fn default_products(&self) -> BTreeSet<Product> {
        let products = self.timetable.products();
        if products.is_empty() {
            Product::all_except_high_speed()
        } else {
            products
        }
    }

    fn line_style(
        &self,
        network: Option<&str>,
        product: Option<Product>,
        label: Option<&str>,
    ) -> Style {
        self.timetable.styles.lookup(network, product, label)
    }

    async fn area(&self) -> Option<Vec<Point>> {
        self.timetable.bounds()
    }

    #[instrument(skip_all, fields(network = %self.id()))]
    async fn query_nearby_locations(
        &self,
        location: &Location,
        types: &BTreeSet<LocationType>,
        max_distance: u32,
        max_locations: u32,
    ) -> Result<NearbyLocationsResult, ProviderError> {
        guard::check_nearby_location(location)?;

        let tt = &*self.timetable;
        let known = location.id().and_then(|id| tt.place_index(id));
        let Some(center) = location.point().or_else(|| known.map(|i| tt.places[i].point)) else {
            debug!("unknown location, nothing nearby");
            return Ok(NearbyLocationsResult::ok(Vec::new()).with_header(self.header()));
        };

        let max_distance = match max_distance {
            0 => f64::INFINITY,
            meters => f64::from(meters),
        };
        let mut found: Vec<(f64, usize)> = tt
            .places
            .iter()
            .enumerate()
            .filter(|&(i, p)| Some(i) != known && type_allowed(types, &p.location))
            .map(|(i, p)| (center.distance_to(&p.point), i))
            .filter(|&(distance, _)| distance <= max_distance)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.truncate(limit(max_locations));

        let locations = found
            .into_iter()
            .map(|(_, i)| tt.places[i].location.clone())
            .collect();
        Ok(NearbyLocationsResult::ok(locations).with_header(self.header()))
    }

    #[instrument(skip_all, fields(network = %self.id(), query = %query))]
    async fn suggest_locations(
        &self,
        query: &str,
        types: &BTreeSet<LocationType>,
        max_locations: u32,
    ) -> Result<SuggestLocationsResult, ProviderError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(SuggestLocationsResult::ok(Vec::new()).with_header(self.header()));
        }

        let suggestable = self.capabilities.suggest_types();
        let suggested = self
            .timetable
            .places
            .iter()
            .map(|p| &p.location)
            .filter(|l| suggestable.contains(&l.kind()) && type_allowed(types, l))
            .filter_map(|l| {
                match_priority(l, &needle).map(|priority| SuggestedLocation::new(l.clone(), priority))
            })
            .collect();

        let mut ranked = rank_suggestions(suggested, self.capabilities.type_order());
        ranked.truncate(limit(max_locations));
        Ok(SuggestLocationsResult::ok(ranked).with_header(self.header()))
    }

    #[instrument(skip_all, fields(network = %self.id(), station = %station_id, equivs = equivs))]
    async fn query_departures(
        &self,
        station_id: &str,
        time: Option<DateTime<Utc>>,
        max_departures: u32,
        equivs: bool,
    ) -> Result<QueryDeparturesResult, ProviderError> {
        guard::check_station_id(station_id)?;

        let tt = &*self.timetable;
        let Some(station) = tt
            .place_index(station_id.trim())
            .filter(|&i| tt.places[i].is_station())
        else {
            debug!("unknown station");
            return Ok(QueryDeparturesResult::invalid_station().with_header(self.header()));
        };

        let time = time.unwrap_or(tt.valid_from);
        let stations = if equivs {
            tt.equivalents(station)
        } else {
            vec![station]
        };

        let max = limit(max_departures);
        let boards = stations
            .into_iter()
            .map(|s| self.board(s, time, max))
            .collect::<Result<Vec<_>, _>>();

        Ok(match boards {
            Ok(boards) => QueryDeparturesResult::ok(boards),
            Err(e) => {
                warn!(error = %e, "failed to build departure board");
                QueryDeparturesResult::service_down(e.to_string())
            }
        }
        .with_header(self.header()))
    }

    #[instrument(skip_all, fields(network = %self.id(), dep = query.dep))]
    async fn query_trips(&self, query: &TripQuery) -> Result<QueryTripsResult, ProviderError> {
        guard::check_trip_query(query, &self.capabilities)?;

        let page = if query.dep {
            Page::Departing(query.time)
        } else {
            Page::Arriving(query.time)
        };
        Ok(self.plan(query, page))
    }

    #[instrument(skip_all, fields(network = %self.id(), later = later))]
    async fn query_more_trips(
        &self,
        context: &TripsContext,
        later: bool,
    ) -> Result<QueryTripsResult, ProviderError> {
        guard::check_paging(self.id(), context, later)?;

        let cursor: Cursor = match context.payload() {
            Ok(cursor) => cursor,
            Err(e) => {
                warn!(error = %e, "undecodable trips context");
                return Ok(QueryTripsResult::service_down(self.id().clone(), e.to_string())
                    .with_header(self.header()));
            }
        };

        let page = if later {
            Page::After(cursor.last)
        } else {
            Page::Before(cursor.first)
        };
        Ok(self.plan(&cursor.query, page))
    }
}
