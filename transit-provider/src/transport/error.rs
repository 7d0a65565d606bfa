//! HTTP transport error types.

/// Errors from an HTTP round trip.
///
/// Drivers never surface these to callers directly: any of them turns the
/// operation's result into SERVICE_DOWN, with [`diagnostic`](Self::diagnostic)
/// attached as the out-of-band message.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON parse error: {message}{}", body_suffix(.body))]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Backend returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Invalid credential
    #[error("unauthorized (invalid API credential)")]
    Unauthorized,

    /// Rate limited by the backend
    #[error("rate limited by backend")]
    RateLimited,

    /// Credential or endpoint cannot be used
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_ref()
        .map(|b| format!(" (body: {b})"))
        .unwrap_or_default()
}

impl TransportError {
    /// Message to attach to a SERVICE_DOWN result.
    pub fn diagnostic(&self) -> String {
        self.to_string()
    }
}
