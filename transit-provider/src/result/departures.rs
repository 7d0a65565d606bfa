//! Departure board result.

use serde::{Deserialize, Serialize};

use super::ResultHeader;
use crate::domain::StationDepartures;

/// Outcome of a departure board query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeparturesStatus {
    Ok,
    InvalidStation,
    ServiceDown,
}

/// Departures of the queried station, plus those of equivalent stations
/// when they were requested and the backend supports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryDeparturesResult {
    header: Option<ResultHeader>,
    status: DeparturesStatus,
    station_departures: Vec<StationDepartures>,
    diagnostic: Option<String>,
}

impl QueryDeparturesResult {
    pub fn ok(station_departures: Vec<StationDepartures>) -> Self {
        Self {
            header: None,
            status: DeparturesStatus::Ok,
            station_departures,
            diagnostic: None,
        }
    }

    pub fn from_status(status: DeparturesStatus) -> Self {
        Self {
            header: None,
            status,
            station_departures: Vec::new(),
            diagnostic: None,
        }
    }

    pub fn invalid_station() -> Self {
        Self::from_status(DeparturesStatus::InvalidStation)
    }

    pub fn service_down(diagnostic: impl Into<String>) -> Self {
        Self::from_status(DeparturesStatus::ServiceDown).with_diagnostic(diagnostic)
    }

    pub fn with_header(mut self, header: ResultHeader) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    pub fn header(&self) -> Option<&ResultHeader> {
        self.header.as_ref()
    }

    pub fn status(&self) -> DeparturesStatus {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == DeparturesStatus::Ok
    }

    pub fn station_departures(&self) -> &[StationDepartures] {
        &self.station_departures
    }

    /// Departures of the station with the given id, if it is in the result.
    pub fn find_station_departures(&self, station_id: &str) -> Option<&StationDepartures> {
        self.station_departures
            .iter()
            .find(|sd| sd.location().id() == Some(station_id))
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub(crate) fn truncate_each(mut self, max: usize) -> Self {
        for board in &mut self.station_departures {
            board.truncate(max);
        }
        self
    }
}
