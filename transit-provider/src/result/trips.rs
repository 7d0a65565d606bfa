//! Trip search result.

use serde::{Deserialize, Serialize};

use super::ResultHeader;
use crate::context::TripsContext;
use crate::domain::{Location, Trip};
use crate::provider::NetworkId;

/// Outcome of a trip search or a page of earlier/later trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripsStatus {
    Ok,
    /// An endpoint matched several places; resolve it with a suggest query
    Ambiguous,
    /// Origin and destination are the same place
    TooClose,
    UnknownFrom,
    UnknownTo,
    UnknownVia,
    NoTrips,
    /// Requested time lies outside the backend's timetable period
    InvalidDate,
    ServiceDown,
    UnresolvableAddress,
}

/// Trips found for a query, with the context for paging.
///
/// Every result carries a context, even when it cannot page. Results whose
/// status is not OK have no trips and a terminal context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTripsResult {
    header: Option<ResultHeader>,
    status: TripsStatus,
    from: Option<Location>,
    via: Option<Location>,
    to: Option<Location>,
    trips: Vec<Trip>,
    #[serde(skip)]
    context: TripsContext,
    diagnostic: Option<String>,
}

impl QueryTripsResult {
    /// A successful result. An empty trip list is allowed.
    ///
    /// `from`, `via` and `to` are the endpoints as the backend resolved them.
    pub fn ok(
        from: Option<Location>,
        via: Option<Location>,
        to: Option<Location>,
        trips: Vec<Trip>,
        context: TripsContext,
    ) -> Self {
        Self {
            header: None,
            status: TripsStatus::Ok,
            from,
            via,
            to,
            trips,
            context,
            diagnostic: None,
        }
    }

    /// A result carrying only a status and a terminal context.
    pub fn from_status(network: NetworkId, status: TripsStatus) -> Self {
        Self {
            header: None,
            status,
            from: None,
            via: None,
            to: None,
            trips: Vec::new(),
            context: TripsContext::terminal(network),
            diagnostic: None,
        }
    }

    pub fn service_down(network: NetworkId, diagnostic: impl Into<String>) -> Self {
        Self::from_status(network, TripsStatus::ServiceDown).with_diagnostic(diagnostic)
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

    pub fn status(&self) -> TripsStatus {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == TripsStatus::Ok
    }

    pub fn from(&self) -> Option<&Location> {
        self.from.as_ref()
    }

    pub fn via(&self) -> Option<&Location> {
        self.via.as_ref()
    }

    pub fn to(&self) -> Option<&Location> {
        self.to.as_ref()
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn into_trips(self) -> Vec<Trip> {
        self.trips
    }

    /// Continuation for earlier/later trips.
    pub fn context(&self) -> &TripsContext {
        &self.context
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_ok_results_are_terminal() {
        let network = NetworkId::new("TEST");
        for status in [
            TripsStatus::Ambiguous,
            TripsStatus::TooClose,
            TripsStatus::UnknownFrom,
            TripsStatus::UnknownTo,
            TripsStatus::UnknownVia,
            TripsStatus::NoTrips,
            TripsStatus::InvalidDate,
            TripsStatus::ServiceDown,
            TripsStatus::UnresolvableAddress,
        ] {
            let result = QueryTripsResult::from_status(network.clone(), status);
            assert_eq!(result.status(), status);
            assert!(result.trips().is_empty());
            assert!(result.context().is_terminal());
            assert_eq!(result.context().network(), &network);
        }
    }

    #[test]
    fn service_down_keeps_diagnostic() {
        let result = QueryTripsResult::service_down(NetworkId::new("TEST"), "HTTP 503");
        assert_eq!(result.diagnostic(), Some("HTTP 503"));
        assert!(!result.is_ok());
    }
}
