//! Location suggestion result.

use serde::{Deserialize, Serialize};

use super::ResultHeader;
use crate::domain::Location;

/// Outcome of a free-text location search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestStatus {
    Ok,
    ServiceDown,
}

/// A location with the backend's confidence that it matches the query.
///
/// Higher priority means a better match. Priorities are only comparable
/// within one result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedLocation {
    pub location: Location,
    pub priority: i32,
}

impl SuggestedLocation {
    pub fn new(location: Location, priority: i32) -> Self {
        Self { location, priority }
    }
}

impl From<Location> for SuggestedLocation {
    fn from(location: Location) -> Self {
        Self::new(location, 0)
    }
}

/// Suggestions for a free-text query, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestLocationsResult {
    header: Option<ResultHeader>,
    status: SuggestStatus,
    suggested: Vec<SuggestedLocation>,
    diagnostic: Option<String>,
}

impl SuggestLocationsResult {
    pub fn ok(suggested: Vec<SuggestedLocation>) -> Self {
        Self {
            header: None,
            status: SuggestStatus::Ok,
            suggested,
            diagnostic: None,
        }
    }

    pub fn from_status(status: SuggestStatus) -> Self {
        Self {
            header: None,
            status,
            suggested: Vec::new(),
            diagnostic: None,
        }
    }

    pub fn service_down(diagnostic: impl Into<String>) -> Self {
        Self::from_status(SuggestStatus::ServiceDown).with_diagnostic(diagnostic)
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

    pub fn status(&self) -> SuggestStatus {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == SuggestStatus::Ok
    }

    pub fn suggested(&self) -> &[SuggestedLocation] {
        &self.suggested
    }

    /// The suggested locations without their priorities.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.suggested.iter().map(|s| &s.location)
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub(crate) fn map_suggested(
        mut self,
        f: impl FnOnce(Vec<SuggestedLocation>) -> Vec<SuggestedLocation>,
    ) -> Self {
        self.suggested = f(self.suggested);
        self
    }
}
