//! Departure board types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DepartureError;
use super::{Line, LineDestination, Location, LocationType, Position};

/// A single departure on a departure board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDeparture")]
pub struct Departure {
    planned_time: Option<DateTime<Utc>>,
    predicted_time: Option<DateTime<Utc>>,
    line: Line,
    position: Option<Position>,
    destination: Option<Location>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct RawDeparture {
    planned_time: Option<DateTime<Utc>>,
    predicted_time: Option<DateTime<Utc>>,
    line: Line,
    position: Option<Position>,
    destination: Option<Location>,
    message: Option<String>,
}

impl TryFrom<RawDeparture> for Departure {
    type Error = DepartureError;

    fn try_from(raw: RawDeparture) -> Result<Self, Self::Error> {
        let departure = Departure::new(
            raw.planned_time,
            raw.predicted_time,
            raw.line,
            raw.position,
            raw.destination,
        )?;
        Ok(Self {
            message: raw.message,
            ..departure
        })
    }
}

impl Departure {
    /// Create a departure.
    ///
    /// # Errors
    ///
    /// Returns `Err` if neither a planned nor a predicted time is given.
    pub fn new(
        planned_time: Option<DateTime<Utc>>,
        predicted_time: Option<DateTime<Utc>>,
        line: Line,
        position: Option<Position>,
        destination: Option<Location>,
    ) -> Result<Self, DepartureError> {
        if planned_time.is_none() && predicted_time.is_none() {
            return Err(DepartureError::MissingTime);
        }
        Ok(Self {
            planned_time,
            predicted_time,
            line,
            position,
            destination,
            message: None,
        })
    }

    /// Returns a copy with the given message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Best known time: predicted if available, otherwise planned.
    pub fn time(&self) -> DateTime<Utc> {
        self.predicted_time
            .or(self.planned_time)
            .unwrap_or_default()
    }

    pub fn planned_time(&self) -> Option<DateTime<Utc>> {
        self.planned_time
    }

    pub fn predicted_time(&self) -> Option<DateTime<Utc>> {
        self.predicted_time
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    /// Platform or stand.
    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn destination(&self) -> Option<&Location> {
        self.destination.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// The departures of one station, ordered by time ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStationDepartures")]
pub struct StationDepartures {
    location: Location,
    departures: Vec<Departure>,
    lines: Option<Vec<LineDestination>>,
}

#[derive(Deserialize)]
struct RawStationDepartures {
    location: Location,
    #[serde(default)]
    departures: Vec<Departure>,
    lines: Option<Vec<LineDestination>>,
}

impl TryFrom<RawStationDepartures> for StationDepartures {
    type Error = DepartureError;

    fn try_from(raw: RawStationDepartures) -> Result<Self, Self::Error> {
        StationDepartures::new(raw.location, raw.departures, raw.lines)
    }
}

impl StationDepartures {
    /// Create the departures of a station, sorting them by time.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `location` is not a station.
    pub fn new(
        location: Location,
        mut departures: Vec<Departure>,
        lines: Option<Vec<LineDestination>>,
    ) -> Result<Self, DepartureError> {
        if location.kind() != LocationType::Station {
            return Err(DepartureError::NotAStation(location.kind()));
        }
        departures.sort_by_key(Departure::time);
        Ok(Self {
            location,
            departures,
            lines,
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn departures(&self) -> &[Departure] {
        &self.departures
    }

    /// Lines serving this station, if the backend reports them.
    pub fn lines(&self) -> Option<&[LineDestination]> {
        self.lines.as_deref()
    }

    /// Keep at most `max` departures (the earliest ones).
    pub fn truncate(&mut self, max: usize) {
        self.departures.truncate(max);
    }
}
