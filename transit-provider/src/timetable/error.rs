//! Timetable loading error types.

use crate::transport::TransportError;

/// Errors from loading a timetable.
///
/// Individual malformed records are skipped with a warning, so these only
/// cover problems with the file as a whole.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    /// Reading the file failed
    #[error("failed to read timetable: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid timetable document
    #[error("invalid timetable JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Downloading the timetable failed
    #[error("failed to fetch timetable: {0}")]
    Transport(#[from] TransportError),

    /// Fetching needs an endpoint override
    #[error("no timetable endpoint configured")]
    NoEndpoint,

    /// Network ids are never blank
    #[error("timetable network id is blank")]
    BlankNetwork,

    /// The validity window ends before it starts
    #[error("timetable validity ends before it starts")]
    InvalidWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            TimetableError::NoEndpoint.to_string(),
            "no timetable endpoint configured"
        );

        let err = TimetableError::from(TransportError::RateLimited);
        assert_eq!(
            err.to_string(),
            "failed to fetch timetable: rate limited by backend"
        );

        let json_err = serde_json::from_str::<u32>("x").unwrap_err();
        assert!(
            TimetableError::from(json_err)
                .to_string()
                .starts_with("invalid timetable JSON")
        );
    }
}
