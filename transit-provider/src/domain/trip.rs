//! Trip and leg types.
//!
//! A [`Trip`] is an ordered sequence of [`Leg`]s from an origin to a
//! destination. Public legs ride a [`Line`]; individual legs cover walking,
//! cycling, driving or transfers between them.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::TripError;
use super::{Line, Location, Point, Product, Stop};

/// Kind of movement on an individual leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndividualType {
    Walk,
    Bike,
    Car,
    Transfer,
    CheckIn,
    CheckOut,
}

/// A leg on a public transport line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPublicLeg")]
pub struct PublicLeg {
    line: Line,
    destination: Option<Location>,
    departure_stop: Stop,
    arrival_stop: Stop,
    intermediate_stops: Vec<Stop>,
    path: Vec<Point>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct RawPublicLeg {
    line: Line,
    destination: Option<Location>,
    departure_stop: Stop,
    arrival_stop: Stop,
    #[serde(default)]
    intermediate_stops: Vec<Stop>,
    #[serde(default)]
    path: Vec<Point>,
    message: Option<String>,
}

impl TryFrom<RawPublicLeg> for PublicLeg {
    type Error = TripError;

    fn try_from(raw: RawPublicLeg) -> Result<Self, Self::Error> {
        let leg = PublicLeg::new(
            raw.line,
            raw.destination,
            raw.departure_stop,
            raw.arrival_stop,
            raw.intermediate_stops,
        )?;
        Ok(Self {
            path: raw.path,
            message: raw.message,
            ..leg
        })
    }
}

impl PublicLeg {
    /// Create a public leg.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the departure stop has no departure time, the
    /// arrival stop has no arrival time, or the leg arrives before it departs.
    pub fn new(
        line: Line,
        destination: Option<Location>,
        departure_stop: Stop,
        arrival_stop: Stop,
        intermediate_stops: Vec<Stop>,
    ) -> Result<Self, TripError> {
        if departure_stop.departure_time(false).is_none() {
            return Err(TripError::MissingTime("departure"));
        }
        if arrival_stop.arrival_time(false).is_none() {
            return Err(TripError::MissingTime("arrival"));
        }
        // Real-time data may reorder predicted times, the plan may not.
        if let (Some(dep), Some(arr)) = (
            departure_stop.planned_departure_time,
            arrival_stop.planned_arrival_time,
        ) {
            if arr < dep {
                return Err(TripError::ArrivalBeforeDeparture);
            }
        }

        Ok(Self {
            line,
            destination,
            departure_stop,
            arrival_stop,
            intermediate_stops,
            path: Vec::new(),
            message: None,
        })
    }

    /// Returns a copy with the given geometry.
    pub fn with_path(mut self, path: Vec<Point>) -> Self {
        self.path = path;
        self
    }

    /// Returns a copy with the given message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    /// Final destination of the vehicle, which may lie beyond this leg.
    pub fn destination(&self) -> Option<&Location> {
        self.destination.as_ref()
    }

    pub fn departure_stop(&self) -> &Stop {
        &self.departure_stop
    }

    pub fn arrival_stop(&self) -> &Stop {
        &self.arrival_stop
    }

    pub fn intermediate_stops(&self) -> &[Stop] {
        &self.intermediate_stops
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    // The constructor guarantees both times are present.
    fn departs(&self, prefer_planned: bool) -> DateTime<Utc> {
        self.departure_stop
            .departure_time(prefer_planned)
            .unwrap_or_default()
    }

    fn arrives(&self, prefer_planned: bool) -> DateTime<Utc> {
        self.arrival_stop
            .arrival_time(prefer_planned)
            .unwrap_or_default()
    }
}

/// A leg covered on foot, by bike or car, or as a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIndividualLeg")]
pub struct IndividualLeg {
    kind: IndividualType,
    departure: Location,
    departure_time: DateTime<Utc>,
    arrival: Location,
    arrival_time: DateTime<Utc>,
    path: Vec<Point>,
    distance_meters: u32,
}

#[derive(Deserialize)]
struct RawIndividualLeg {
    kind: IndividualType,
    departure: Location,
    departure_time: DateTime<Utc>,
    arrival: Location,
    arrival_time: DateTime<Utc>,
    #[serde(default)]
    path: Vec<Point>,
    distance_meters: u32,
}

impl TryFrom<RawIndividualLeg> for IndividualLeg {
    type Error = TripError;

    fn try_from(raw: RawIndividualLeg) -> Result<Self, Self::Error> {
        let leg = IndividualLeg::new(
            raw.kind,
            raw.departure,
            raw.departure_time,
            raw.arrival,
            raw.arrival_time,
            raw.distance_meters,
        )?;
        Ok(leg.with_path(raw.path))
    }
}

impl IndividualLeg {
    /// Create an individual leg.
    pub fn new(
        kind: IndividualType,
        departure: Location,
        departure_time: DateTime<Utc>,
        arrival: Location,
        arrival_time: DateTime<Utc>,
        distance_meters: u32,
    ) -> Result<Self, TripError> {
        if arrival_time < departure_time {
            return Err(TripError::ArrivalBeforeDeparture);
        }
        Ok(Self {
            kind,
            departure,
            departure_time,
            arrival,
            arrival_time,
            path: Vec::new(),
            distance_meters,
        })
    }

    /// Returns a copy with the given geometry.
    pub fn with_path(mut self, path: Vec<Point>) -> Self {
        self.path = path;
        self
    }

    pub fn kind(&self) -> IndividualType {
        self.kind
    }

    pub fn distance_meters(&self) -> u32 {
        self.distance_meters
    }

    /// Returns a copy shifted to start at `departure_time`, keeping its duration.
    pub fn moved_to(&self, departure_time: DateTime<Utc>) -> Self {
        let duration = self.arrival_time - self.departure_time;
        Self {
            departure_time,
            arrival_time: departure_time + duration,
            ..self.clone()
        }
    }
}

/// One uninterrupted segment of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "leg_type", rename_all = "snake_case")]
pub enum Leg {
    /// Riding a public transport line
    Public(PublicLeg),
    /// Walking, cycling, driving or transferring
    Individual(IndividualLeg),
}

impl Leg {
    pub fn departure(&self) -> &Location {
        match self {
            Leg::Public(leg) => &leg.departure_stop.location,
            Leg::Individual(leg) => &leg.departure,
        }
    }

    pub fn arrival(&self) -> &Location {
        match self {
            Leg::Public(leg) => &leg.arrival_stop.location,
            Leg::Individual(leg) => &leg.arrival,
        }
    }

    /// Departure time, predicted where known.
    pub fn departure_time(&self) -> DateTime<Utc> {
        self.departure_time_preferring(false)
    }

    /// Arrival time, predicted where known.
    pub fn arrival_time(&self) -> DateTime<Utc> {
        self.arrival_time_preferring(false)
    }

    pub fn departure_time_preferring(&self, prefer_planned: bool) -> DateTime<Utc> {
        match self {
            Leg::Public(leg) => leg.departs(prefer_planned),
            Leg::Individual(leg) => leg.departure_time,
        }
    }

    pub fn arrival_time_preferring(&self, prefer_planned: bool) -> DateTime<Utc> {
        match self {
            Leg::Public(leg) => leg.arrives(prefer_planned),
            Leg::Individual(leg) => leg.arrival_time,
        }
    }

    /// Earliest time occurring on this leg.
    pub fn min_time(&self) -> DateTime<Utc> {
        match self {
            Leg::Public(leg) => leg.departure_stop.min_time().unwrap_or(leg.departs(false)),
            Leg::Individual(leg) => leg.departure_time,
        }
    }

    /// Latest time occurring on this leg.
    pub fn max_time(&self) -> DateTime<Utc> {
        match self {
            Leg::Public(leg) => leg.arrival_stop.max_time().unwrap_or(leg.arrives(false)),
            Leg::Individual(leg) => leg.arrival_time,
        }
    }

    pub fn path(&self) -> &[Point] {
        match self {
            Leg::Public(leg) => &leg.path,
            Leg::Individual(leg) => &leg.path,
        }
    }

    /// Line ridden on this leg, if it is a public one.
    pub fn line(&self) -> Option<&Line> {
        match self {
            Leg::Public(leg) => Some(&leg.line),
            Leg::Individual(_) => None,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Leg::Public(_))
    }

    pub fn as_public(&self) -> Option<&PublicLeg> {
        match self {
            Leg::Public(leg) => Some(leg),
            Leg::Individual(_) => None,
        }
    }

    pub fn as_individual(&self) -> Option<&IndividualLeg> {
        match self {
            Leg::Public(_) => None,
            Leg::Individual(leg) => Some(leg),
        }
    }
}

/// A complete itinerary from origin to destination.
///
/// # Invariants
///
/// - At least one leg
/// - The id is stable for identical legs, so two queries returning the
///   same connection produce equal trips
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTrip")]
pub struct Trip {
    id: String,
    from: Location,
    to: Location,
    legs: Vec<Leg>,
    changes: Option<u32>,
}

#[derive(Deserialize)]
struct RawTrip {
    id: Option<String>,
    from: Location,
    to: Location,
    legs: Vec<Leg>,
    changes: Option<u32>,
}

impl TryFrom<RawTrip> for Trip {
    type Error = TripError;

    fn try_from(raw: RawTrip) -> Result<Self, Self::Error> {
        Trip::new(raw.id, raw.from, raw.to, raw.legs, raw.changes)
    }
}

impl Trip {
    /// Create a trip, generating an id from the legs when none is given.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `legs` is empty.
    pub fn new(
        id: Option<String>,
        from: Location,
        to: Location,
        legs: Vec<Leg>,
        changes: Option<u32>,
    ) -> Result<Self, TripError> {
        if legs.is_empty() {
            return Err(TripError::EmptyTrip);
        }
        let id = id.unwrap_or_else(|| generate_id(&legs));
        Ok(Self {
            id,
            from,
            to,
            legs,
            changes,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from(&self) -> &Location {
        &self.from
    }

    pub fn to(&self) -> &Location {
        &self.to
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn first_departure_time(&self) -> DateTime<Utc> {
        self.legs[0].departure_time()
    }

    pub fn last_arrival_time(&self) -> DateTime<Utc> {
        self.legs[self.legs.len() - 1].arrival_time()
    }

    pub fn first_public_leg(&self) -> Option<&PublicLeg> {
        self.legs.iter().find_map(Leg::as_public)
    }

    pub fn last_public_leg(&self) -> Option<&PublicLeg> {
        self.legs.iter().rev().find_map(Leg::as_public)
    }

    /// Duration of the whole trip, including leading and trailing individual legs.
    pub fn duration(&self) -> Duration {
        self.last_arrival_time() - self.first_departure_time()
    }

    /// Duration from the first public departure to the last public arrival.
    ///
    /// Returns `None` if the trip has no public legs.
    pub fn public_duration(&self) -> Option<Duration> {
        let first = self.first_public_leg()?.departs(false);
        let last = self.last_public_leg()?.arrives(false);
        Some(last - first)
    }

    /// Earliest time occurring in this trip.
    pub fn min_time(&self) -> DateTime<Utc> {
        self.legs.iter().map(Leg::min_time).min().unwrap_or_default()
    }

    /// Latest time occurring in this trip.
    pub fn max_time(&self) -> DateTime<Utc> {
        self.legs.iter().map(Leg::max_time).max().unwrap_or_default()
    }

    /// Number of changes: as reported by the backend, or public legs minus one.
    ///
    /// Returns `None` for trips made only of individual legs.
    pub fn num_changes(&self) -> Option<u32> {
        if self.changes.is_some() {
            return self.changes;
        }
        let public = self.legs.iter().filter(|l| l.is_public()).count() as u32;
        public.checked_sub(1)
    }

    /// Products used by the public legs.
    pub fn products(&self) -> BTreeSet<Product> {
        self.legs
            .iter()
            .filter_map(|l| l.line().and_then(|line| line.product))
            .collect()
    }

    /// True if the trip looks travelable: no cancelled boarding or alighting
    /// and no leg starting before the previous one ended.
    pub fn is_travelable(&self) -> bool {
        let mut time: Option<DateTime<Utc>> = None;

        for leg in &self.legs {
            if let Leg::Public(public) = leg {
                if public.departure_stop.departure_cancelled || public.arrival_stop.arrival_cancelled
                {
                    return false;
                }
            }

            let departs = leg.departure_time();
            if time.is_some_and(|t| departs < t) {
                return false;
            }
            let arrives = leg.arrival_time();
            if arrives < departs {
                return false;
            }
            time = Some(arrives);
        }

        true
    }

    /// Returns a copy where individual legs overlapping the previous leg are
    /// moved to start when it ends.
    pub fn adjusted_untravelable_individual_legs(&self) -> Trip {
        let mut legs = self.legs.clone();
        for i in 1..legs.len() {
            let prev_arrival = legs[i - 1].arrival_time();
            if let Leg::Individual(leg) = &legs[i] {
                if leg.departure_time < prev_arrival {
                    legs[i] = Leg::Individual(leg.moved_to(prev_arrival));
                }
            }
        }
        Trip {
            legs,
            ..self.clone()
        }
    }
}

fn location_key(location: &Location) -> String {
    match (location.id(), location.point()) {
        (Some(id), _) => id.to_string(),
        (None, Some(point)) => point.to_string(),
        (None, None) => location.name().unwrap_or_default().to_string(),
    }
}

/// Stable id from departure/arrival places, planned times and lines.
fn generate_id(legs: &[Leg]) -> String {
    let mut id = String::new();
    for (i, leg) in legs.iter().enumerate() {
        if i > 0 {
            id.push('|');
        }
        let _ = write!(
            id,
            "{}-{}-",
            location_key(leg.departure()),
            location_key(leg.arrival())
        );
        match leg {
            Leg::Individual(_) => id.push_str("individual"),
            Leg::Public(public) => {
                if let Some(t) = public.departure_stop.planned_departure_time {
                    let _ = write!(id, "{}-", t.timestamp());
                }
                if let Some(t) = public.arrival_stop.planned_arrival_time {
                    let _ = write!(id, "{}-", t.timestamp());
                }
                let _ = write!(
                    id,
                    "{}{}",
                    public.line.product_code(),
                    public.line.label.as_deref().unwrap_or_default()
                );
            }
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, h, m, 0).unwrap()
    }

    fn station(id: &str) -> Location {
        Location::station(id).unwrap()
    }

    fn public(from: &str, dep: DateTime<Utc>, to: &str, arr: DateTime<Utc>, label: &str) -> Leg {
        let mut board = Stop::new(station(from));
        board.planned_departure_time = Some(dep);
        let mut alight = Stop::new(station(to));
        alight.planned_arrival_time = Some(arr);
        let line = Line::new(None, Some(Product::SuburbanTrain), Some(label.into()));
        Leg::Public(PublicLeg::new(line, None, board, alight, Vec::new()).unwrap())
    }

    fn walk(from: &str, dep: DateTime<Utc>, to: &str, arr: DateTime<Utc>) -> Leg {
        Leg::Individual(
            IndividualLeg::new(IndividualType::Walk, station(from), dep, station(to), arr, 250)
                .unwrap(),
        )
    }

    #[test]
    fn empty_trip_rejected() {
        let err = Trip::new(None, station("A"), station("B"), Vec::new(), None).unwrap_err();
        assert_eq!(err, TripError::EmptyTrip);
    }

    #[test]
    fn public_leg_needs_times() {
        let board = Stop::new(station("A"));
        let mut alight = Stop::new(station("B"));
        alight.planned_arrival_time = Some(at(10, 0));
        let err = PublicLeg::new(Line::default(), None, board, alight, Vec::new()).unwrap_err();
        assert_eq!(err, TripError::MissingTime("departure"));
    }

    #[test]
    fn individual_leg_rejects_backwards_time() {
        let err = IndividualLeg::new(
            IndividualType::Walk,
            station("A"),
            at(10, 5),
            station("B"),
            at(10, 0),
            100,
        )
        .unwrap_err();
        assert_eq!(err, TripError::ArrivalBeforeDeparture);
    }

    #[test]
    fn derived_times_and_changes() {
        let legs = vec![
            walk("X", at(9, 50), "A", at(9, 58)),
            public("A", at(10, 0), "B", at(10, 20), "S1"),
            walk("B", at(10, 20), "C", at(10, 25)),
            public("C", at(10, 30), "D", at(11, 0), "S2"),
        ];
        let trip = Trip::new(None, station("X"), station("D"), legs, None).unwrap();

        assert_eq!(trip.first_departure_time(), at(9, 50));
        assert_eq!(trip.last_arrival_time(), at(11, 0));
        assert_eq!(trip.duration(), Duration::minutes(70));
        assert_eq!(trip.public_duration(), Some(Duration::minutes(60)));
        assert_eq!(trip.num_changes(), Some(1));
        assert_eq!(trip.products(), BTreeSet::from([Product::SuburbanTrain]));
        assert_eq!(trip.min_time(), at(9, 50));
        assert_eq!(trip.max_time(), at(11, 0));
        assert!(trip.is_travelable());
    }

    #[test]
    fn walk_only_trip_has_no_changes() {
        let trip = Trip::new(
            None,
            station("A"),
            station("B"),
            vec![walk("A", at(10, 0), "B", at(10, 10))],
            None,
        )
        .unwrap();
        assert_eq!(trip.num_changes(), None);
        assert_eq!(trip.public_duration(), None);
    }

    #[test]
    fn generated_id_is_stable() {
        let legs = || vec![public("A", at(10, 0), "B", at(10, 20), "S1")];
        let a = Trip::new(None, station("A"), station("B"), legs(), None).unwrap();
        let b = Trip::new(None, station("A"), station("B"), legs(), None).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a, b);
        assert!(a.id().starts_with("A-B-"));
        assert!(a.id().ends_with("SS1"));

        let later = Trip::new(
            None,
            station("A"),
            station("B"),
            vec![public("A", at(10, 10), "B", at(10, 30), "S1")],
            None,
        )
        .unwrap();
        assert_ne!(a.id(), later.id());
    }

    #[test]
    fn overlapping_walk_is_not_travelable_until_adjusted() {
        let legs = vec![
            public("A", at(10, 0), "B", at(10, 20), "S1"),
            walk("B", at(10, 15), "C", at(10, 22)),
            public("C", at(10, 30), "D", at(11, 0), "S2"),
        ];
        let trip = Trip::new(None, station("A"), station("D"), legs, None).unwrap();
        assert!(!trip.is_travelable());

        let adjusted = trip.adjusted_untravelable_individual_legs();
        assert!(adjusted.is_travelable());
        assert_eq!(adjusted.legs()[1].departure_time(), at(10, 20));
        assert_eq!(adjusted.legs()[1].arrival_time(), at(10, 27));
    }

    #[test]
    fn serde_roundtrip_with_mixed_legs() {
        let legs = vec![
            walk("X", at(9, 50), "A", at(9, 58)),
            public("A", at(10, 0), "B", at(10, 20), "S1"),
            walk("B", at(10, 20), "C", at(10, 25)),
        ];
        let trip = Trip::new(None, station("X"), station("C"), legs, Some(0)).unwrap();

        let json = serde_json::to_string(&trip).unwrap();
        assert_eq!(json.matches("\"kind\"").count(), 2);
        assert!(json.contains("\"leg_type\":\"individual\""));

        let back: Trip = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trip);
        assert_eq!(back.id(), trip.id());
        let first = back.legs()[0].as_individual().map(IndividualLeg::kind);
        assert_eq!(first, Some(IndividualType::Walk));
        assert_eq!(back.first_departure_time(), at(9, 50));
    }

    #[test]
    fn deserialize_rejects_broken_trips() {
        let trip = Trip::new(
            None,
            station("A"),
            station("B"),
            vec![public("A", at(10, 0), "B", at(10, 20), "S1")],
            None,
        )
        .unwrap();
        let mut json = serde_json::to_value(&trip).unwrap();

        let mut no_legs = json.clone();
        no_legs["legs"] = serde_json::json!([]);
        assert!(serde_json::from_value::<Trip>(no_legs).is_err());

        json["legs"][0]["departure_stop"]["planned_departure_time"] = serde_json::Value::Null;
        assert!(serde_json::from_value::<Trip>(json).is_err());

        let backwards = walk("A", at(10, 0), "B", at(10, 10));
        let mut json = serde_json::to_value(&backwards).unwrap();
        json["arrival_time"] = serde_json::json!("2024-03-15T09:00:00Z");
        assert!(serde_json::from_value::<Leg>(json).is_err());
    }

    #[test]
    fn cancelled_boarding_is_not_travelable() {
        let mut board = Stop::new(station("A"));
        board.planned_departure_time = Some(at(10, 0));
        board.departure_cancelled = true;
        let mut alight = Stop::new(station("B"));
        alight.planned_arrival_time = Some(at(10, 20));
        let leg = PublicLeg::new(Line::default(), None, board, alight, Vec::new()).unwrap();
        let trip =
            Trip::new(None, station("A"), station("B"), vec![Leg::Public(leg)], None).unwrap();
        assert!(!trip.is_travelable());
    }
}
