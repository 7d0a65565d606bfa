//! Journey search over a static timetable.
//!
//! Finds direct and one-change itineraries between two sets of access
//! stations, prunes the dominated ones and turns the rest into [`Trip`]s
//! in a stable order. The search always covers the whole timetable, so the
//! same query yields the same trip list and paging can be expressed as
//! positions in that list.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{
    IndividualLeg, IndividualType, Leg, Location, Position, PublicLeg, Stop, Trip, TripError,
};
use crate::provider::{Accessibility, TripFlag, TripOptions};

use super::convert::{Service, Timetable};

/// A station an endpoint can be reached from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub station: usize,
    /// Walking distance between the endpoint and the station
    pub meters: u32,
    /// False when the endpoint is the station itself
    pub walk: bool,
}

impl Access {
    pub fn at(station: usize) -> Self {
        Self {
            station,
            meters: 0,
            walk: false,
        }
    }

    pub fn walking(station: usize, meters: u32) -> Self {
        Self {
            station,
            meters,
            walk: true,
        }
    }
}

/// A ride on one service from one call to a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ride {
    service: usize,
    board: usize,
    alight: usize,
}

#[derive(Debug, Clone)]
struct Itinerary {
    origin: Access,
    rides: Vec<Ride>,
    destination: Access,
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
}

impl Itinerary {
    fn changes(&self) -> usize {
        self.rides.len().saturating_sub(1)
    }

    fn walk_meters(&self) -> u32 {
        self.origin.meters.saturating_add(self.destination.meters)
    }

    /// True if `other` is at least as good in every respect and better in one.
    fn dominated_by(&self, other: &Itinerary) -> bool {
        let as_good = other.departure >= self.departure
            && other.arrival <= self.arrival
            && other.changes() <= self.changes();
        let better = other.departure > self.departure
            || other.arrival < self.arrival
            || other.changes() < self.changes();
        as_good && better
    }
}

/// Position of a trip in the stable result order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TripKey {
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub id: String,
}

impl TripKey {
    pub fn of(trip: &Trip) -> Self {
        Self {
            departure: trip.first_departure_time(),
            arrival: trip.last_arrival_time(),
            id: trip.id().to_string(),
        }
    }
}

/// The part of a trip list a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// The first trips departing at or after a time
    Departing(DateTime<Utc>),
    /// The last trips arriving at or before a time
    Arriving(DateTime<Utc>),
    /// The trips following a key
    After(TripKey),
    /// The trips preceding a key
    Before(TripKey),
}

/// Positions of at most `size` trips on `page`, in ascending order.
///
/// `keys` must be sorted.
pub fn select_page(keys: &[TripKey], page: &Page, size: usize) -> Vec<usize> {
    let positions = |keep: &dyn Fn(&TripKey) -> bool| -> Vec<usize> {
        (0..keys.len()).filter(|&i| keep(&keys[i])).collect()
    };
    let first = |mut selected: Vec<usize>| {
        selected.truncate(size);
        selected
    };
    let last = |mut selected: Vec<usize>| {
        let skip = selected.len().saturating_sub(size);
        selected.drain(..skip);
        selected
    };

    match page {
        Page::Departing(time) => first(positions(&|k| k.departure >= *time)),
        Page::Arriving(time) => last(positions(&|k| k.arrival <= *time)),
        Page::After(key) => first(positions(&|k| k > key)),
        Page::Before(key) => last(positions(&|k| k < key)),
    }
}

/// A resolved trip search.
#[derive(Debug, Clone, Copy)]
pub struct Search<'a> {
    pub from: &'a Location,
    pub origin: &'a [Access],
    pub to: &'a Location,
    pub destination: &'a [Access],
    /// Stations the trip must pass through
    pub via: Option<&'a [usize]>,
    pub options: &'a TripOptions,
}

/// All non-dominated trips for `search`, ordered by [`TripKey`].
pub fn find_trips(timetable: &Timetable, search: &Search<'_>) -> Vec<Trip> {
    let itineraries = remove_dominated(find_itineraries(timetable, search));

    let mut trips: Vec<Trip> = itineraries
        .iter()
        .filter_map(|itinerary| match to_trip(timetable, search, itinerary) {
            Ok(trip) => Some(trip),
            Err(e) => {
                warn!(error = %e, "skipping itinerary");
                None
            }
        })
        .collect();

    trips.sort_by_cached_key(TripKey::of);
    trips.dedup_by(|a, b| a.id() == b.id());
    trips
}

fn usable(service: &Service, options: &TripOptions) -> bool {
    if !options.allows(service.line.product) {
        return false;
    }
    if options.flags.contains(&TripFlag::Bike) && !service.bikes_allowed {
        return false;
    }
    if options.accessibility == Some(Accessibility::BarrierFree) && !service.wheelchair_accessible
    {
        return false;
    }
    true
}

fn find_itineraries(timetable: &Timetable, search: &Search<'_>) -> Vec<Itinerary> {
    let walk_speed = search.options.walk_speed.unwrap_or_default();
    let destinations: HashMap<usize, Access> = search
        .destination
        .iter()
        .map(|access| (access.station, *access))
        .collect();

    let itinerary = |origin: Access, rides: Vec<Ride>, destination: Access| {
        let first = rides.first()?;
        let last = rides.last()?;
        let departure = timetable.services[first.service].calls[first.board].departure
            - walk_speed.walk_time(origin.meters);
        let arrival = timetable.services[last.service].calls[last.alight].arrival
            + walk_speed.walk_time(destination.meters);
        Some(Itinerary {
            origin,
            rides,
            destination,
            departure,
            arrival,
        })
    };

    let mut result = Vec::new();

    for origin in search.origin {
        for &(s1, board1) in timetable.departures_at(origin.station) {
            let first = &timetable.services[s1];
            if !usable(first, search.options) {
                continue;
            }

            for alight1 in board1 + 1..first.calls.len() {
                let ride1 = Ride {
                    service: s1,
                    board: board1,
                    alight: alight1,
                };
                let change_at = first.calls[alight1].station;

                if let Some(&destination) = destinations.get(&change_at) {
                    result.extend(itinerary(*origin, vec![ride1], destination));
                    break;
                }

                let ready = first.calls[alight1].arrival + timetable.min_change;
                for &(s2, board2) in timetable.departures_at(change_at) {
                    let second = &timetable.services[s2];
                    if s2 == s1
                        || second.calls[board2].departure < ready
                        || !usable(second, search.options)
                    {
                        continue;
                    }
                    for alight2 in board2 + 1..second.calls.len() {
                        let station = second.calls[alight2].station;
                        if let Some(&destination) = destinations.get(&station) {
                            let ride2 = Ride {
                                service: s2,
                                board: board2,
                                alight: alight2,
                            };
                            result.extend(itinerary(*origin, vec![ride1, ride2], destination));
                            break;
                        }
                    }
                }
            }
        }
    }

    if let Some(via) = search.via {
        result.retain(|itinerary| passes_via(timetable, itinerary, via));
    }
    result
}

fn passes_via(timetable: &Timetable, itinerary: &Itinerary, via: &[usize]) -> bool {
    itinerary.rides.iter().any(|ride| {
        timetable.services[ride.service].calls[ride.board..=ride.alight]
            .iter()
            .any(|call| via.contains(&call.station))
    })
}

/// Drop itineraries that another itinerary beats on departure, arrival and changes.
///
/// Of several equally good itineraries, the one walking least is kept.
fn remove_dominated(mut itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    itineraries.sort_by(|a, b| {
        b.departure
            .cmp(&a.departure)
            .then(a.arrival.cmp(&b.arrival))
            .then(a.changes().cmp(&b.changes()))
            .then(a.walk_meters().cmp(&b.walk_meters()))
    });

    let mut kept: Vec<Itinerary> = Vec::with_capacity(itineraries.len());
    for itinerary in itineraries {
        let beaten = kept.iter().any(|k| {
            itinerary.dominated_by(k)
                || (k.departure == itinerary.departure
                    && k.arrival == itinerary.arrival
                    && k.changes() == itinerary.changes())
        });
        if !beaten {
            kept.push(itinerary);
        }
    }
    kept
}

fn to_trip(
    timetable: &Timetable,
    search: &Search<'_>,
    itinerary: &Itinerary,
) -> Result<Trip, TripError> {
    let mut legs = Vec::with_capacity(itinerary.rides.len() + 2);

    if itinerary.origin.walk {
        let station = &timetable.places[itinerary.origin.station].location;
        legs.push(Leg::Individual(IndividualLeg::new(
            IndividualType::Walk,
            search.from.clone(),
            itinerary.departure,
            station.clone(),
            departure_of(timetable, itinerary.rides.first()),
            itinerary.origin.meters,
        )?));
    }

    for ride in &itinerary.rides {
        legs.push(Leg::Public(public_leg(timetable, ride)?));
    }

    if itinerary.destination.walk {
        let station = &timetable.places[itinerary.destination.station].location;
        legs.push(Leg::Individual(IndividualLeg::new(
            IndividualType::Walk,
            station.clone(),
            arrival_of(timetable, itinerary.rides.last()),
            search.to.clone(),
            itinerary.arrival,
            itinerary.destination.meters,
        )?));
    }

    let changes = u32::try_from(itinerary.changes()).unwrap_or(u32::MAX);
    Trip::new(
        None,
        search.from.clone(),
        search.to.clone(),
        legs,
        Some(changes),
    )
}

fn departure_of(timetable: &Timetable, ride: Option<&Ride>) -> DateTime<Utc> {
    ride.map(|r| timetable.services[r.service].calls[r.board].departure)
        .unwrap_or_default()
}

fn arrival_of(timetable: &Timetable, ride: Option<&Ride>) -> DateTime<Utc> {
    ride.map(|r| timetable.services[r.service].calls[r.alight].arrival)
        .unwrap_or_default()
}

fn public_leg(timetable: &Timetable, ride: &Ride) -> Result<PublicLeg, TripError> {
    let service = &timetable.services[ride.service];
    let stop_at = |index: usize| {
        let call = &service.calls[index];
        let mut stop = Stop::new(timetable.places[call.station].location.clone());
        let position = call.platform.as_deref().map(Position::new);
        if index > ride.board {
            stop.planned_arrival_time = Some(call.arrival);
            stop.planned_arrival_position = position.clone();
        }
        if index < ride.alight {
            stop.planned_departure_time = Some(call.departure);
            stop.planned_departure_position = position;
        }
        stop
    };

    PublicLeg::new(
        service.line.clone(),
        service.destination.clone(),
        stop_at(ride.board),
        stop_at(ride.alight),
        (ride.board + 1..ride.alight).map(&stop_at).collect(),
    )
}
