//! Stops along a public leg.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Location;

/// A platform or stand, optionally with a section ("7", section "A-C").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub name: String,
    pub section: Option<String>,
}

impl Position {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            section: None,
        }
    }

    pub fn with_section(name: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            section: Some(section.into()),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.section {
            Some(section) => write!(f, "{} {}", self.name, section),
            None => f.write_str(&self.name),
        }
    }
}

/// A call of a vehicle at a location, with planned and predicted times.
///
/// Predicted values come from real-time data and override planned values
/// when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub location: Location,

    pub planned_arrival_time: Option<DateTime<Utc>>,
    pub predicted_arrival_time: Option<DateTime<Utc>>,
    pub planned_arrival_position: Option<Position>,
    pub predicted_arrival_position: Option<Position>,
    #[serde(default)]
    pub arrival_cancelled: bool,

    pub planned_departure_time: Option<DateTime<Utc>>,
    pub predicted_departure_time: Option<DateTime<Utc>>,
    pub planned_departure_position: Option<Position>,
    pub predicted_departure_position: Option<Position>,
    #[serde(default)]
    pub departure_cancelled: bool,
}

impl Stop {
    /// A stop with no times or positions yet.
    pub fn new(location: Location) -> Self {
        Self {
            location,
            planned_arrival_time: None,
            predicted_arrival_time: None,
            planned_arrival_position: None,
            predicted_arrival_position: None,
            arrival_cancelled: false,
            planned_departure_time: None,
            predicted_departure_time: None,
            planned_departure_position: None,
            predicted_departure_position: None,
            departure_cancelled: false,
        }
    }

    /// Arrival time, predicted if known unless `prefer_planned` is set.
    pub fn arrival_time(&self, prefer_planned: bool) -> Option<DateTime<Utc>> {
        pick_time(
            self.planned_arrival_time,
            self.predicted_arrival_time,
            prefer_planned,
        )
    }

    /// Departure time, predicted if known unless `prefer_planned` is set.
    pub fn departure_time(&self, prefer_planned: bool) -> Option<DateTime<Utc>> {
        pick_time(
            self.planned_departure_time,
            self.predicted_departure_time,
            prefer_planned,
        )
    }

    pub fn is_arrival_time_predicted(&self, prefer_planned: bool) -> bool {
        !(prefer_planned && self.planned_arrival_time.is_some())
            && self.predicted_arrival_time.is_some()
    }

    pub fn is_departure_time_predicted(&self, prefer_planned: bool) -> bool {
        !(prefer_planned && self.planned_departure_time.is_some())
            && self.predicted_departure_time.is_some()
    }

    pub fn arrival_position(&self) -> Option<&Position> {
        self.predicted_arrival_position
            .as_ref()
            .or(self.planned_arrival_position.as_ref())
    }

    pub fn departure_position(&self) -> Option<&Position> {
        self.predicted_departure_position
            .as_ref()
            .or(self.planned_departure_position.as_ref())
    }

    /// Predicted minus planned arrival, when both are known.
    pub fn arrival_delay(&self) -> Option<Duration> {
        Some(self.predicted_arrival_time? - self.planned_arrival_time?)
    }

    /// Predicted minus planned departure, when both are known.
    pub fn departure_delay(&self) -> Option<Duration> {
        Some(self.predicted_departure_time? - self.planned_departure_time?)
    }

    /// Earliest departure time this stop could see.
    pub fn min_time(&self) -> Option<DateTime<Utc>> {
        match (self.planned_departure_time, self.predicted_departure_time) {
            (Some(planned), Some(predicted)) => Some(planned.min(predicted)),
            (planned, predicted) => planned.or(predicted),
        }
    }

    /// Latest arrival time this stop could see.
    pub fn max_time(&self) -> Option<DateTime<Utc>> {
        match (self.planned_arrival_time, self.predicted_arrival_time) {
            (Some(planned), Some(predicted)) => Some(planned.max(predicted)),
            (planned, predicted) => planned.or(predicted),
        }
    }
}

fn pick_time(
    planned: Option<DateTime<Utc>>,
    predicted: Option<DateTime<Utc>>,
    prefer_planned: bool,
) -> Option<DateTime<Utc>> {
    if prefer_planned && planned.is_some() {
        planned
    } else {
        predicted.or(planned)
    }
}
