//! Nearby locations result.

use serde::{Deserialize, Serialize};

use super::ResultHeader;
use crate::domain::Location;

/// Outcome of a nearby locations query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NearbyStatus {
    Ok,
    ServiceDown,
}

/// Locations near a point or station, nearest first where the backend ranks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NearbyLocationsResult {
    header: Option<ResultHeader>,
    status: NearbyStatus,
    locations: Vec<Location>,
    diagnostic: Option<String>,
}

impl NearbyLocationsResult {
    /// A successful result. An empty list means nothing was found.
    pub fn ok(locations: Vec<Location>) -> Self {
        Self {
            header: None,
            status: NearbyStatus::Ok,
            locations,
            diagnostic: None,
        }
    }

    /// A result carrying only a status.
    pub fn from_status(status: NearbyStatus) -> Self {
        Self {
            header: None,
            status,
            locations: Vec::new(),
            diagnostic: None,
        }
    }

    pub fn service_down(diagnostic: impl Into<String>) -> Self {
        Self::from_status(NearbyStatus::ServiceDown).with_diagnostic(diagnostic)
    }

    pub fn with_header(mut self, header: ResultHeader) -> Self {
        self.header = Some(header);
        self
    }

    /// Attach an out-of-band message, e.g. the transport error behind SERVICE_DOWN.
    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    pub fn header(&self) -> Option<&ResultHeader> {
        self.header.as_ref()
    }

    pub fn status(&self) -> NearbyStatus {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == NearbyStatus::Ok
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn into_locations(self) -> Vec<Location> {
        self.locations
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub(crate) fn map_locations(mut self, f: impl FnOnce(Vec<Location>) -> Vec<Location>) -> Self {
        self.locations = f(self.locations);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_down_has_no_locations() {
        let result = NearbyLocationsResult::service_down("connection refused");
        assert_eq!(result.status(), NearbyStatus::ServiceDown);
        assert!(result.locations().is_empty());
        assert_eq!(result.diagnostic(), Some("connection refused"));
    }

    #[test]
    fn status_serializes_screaming() {
        let json = serde_json::to_string(&NearbyStatus::ServiceDown).unwrap();
        assert_eq!(json, "\"SERVICE_DOWN\"");
    }
}
