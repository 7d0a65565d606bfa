//! Trip pagination contexts.
//!
//! A [`TripsContext`] is the continuation token returned with every trip
//! result. Callers only ever ask it two questions, [`can_query_earlier`]
//! and [`can_query_later`], and hand it back to
//! [`NetworkProvider::query_more_trips`] to page.
//!
//! The payload belongs to the backend driver that created the context. It
//! is stored as serialized JSON, so a context is an immutable value:
//! cloning is cheap, it can be shared across tasks without locks, and
//! paging from the same context twice sees the same input both times.
//! Drivers whose backend uses single-use server cursors must capture
//! enough state in the payload (typically the absolute time window and
//! the search parameters) to regenerate a page deterministically.
//!
//! [`can_query_earlier`]: TripsContext::can_query_earlier
//! [`can_query_later`]: TripsContext::can_query_later
//! [`NetworkProvider::query_more_trips`]: crate::provider::NetworkProvider::query_more_trips

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::provider::NetworkId;

/// Errors from encoding or decoding a context.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Driver payload could not be serialized
    #[error("failed to encode context payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// Driver payload is not what the driver expected
    #[error("corrupted context payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// Context carries no payload (terminal contexts never do)
    #[error("context has no payload")]
    MissingPayload,

    /// Token string is not valid base64
    #[error("malformed context token: {0}")]
    Token(#[from] base64::DecodeError),

    /// Token decodes but is not a context
    #[error("malformed context token: {0}")]
    TokenJson(#[source] serde_json::Error),
}

/// Opaque continuation token for earlier/later trip queries.
///
/// # Examples
///
/// ```
/// use transit_provider::context::{ContextState, TripsContext};
/// use transit_provider::provider::NetworkId;
///
/// let ctx = TripsContext::terminal(NetworkId::new("VBB"));
/// assert!(!ctx.can_query_earlier());
/// assert!(!ctx.can_query_later());
/// assert_eq!(ContextState::of(&ctx), ContextState::Terminal);
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripsContext {
    network: NetworkId,
    earlier: bool,
    later: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Arc<str>>,
}

impl TripsContext {
    /// A context that allows no further paging.
    pub fn terminal(network: NetworkId) -> Self {
        Self {
            network,
            earlier: false,
            later: false,
            payload: None,
        }
    }

    /// Create a context carrying a driver payload.
    ///
    /// A context without either paging direction drops the payload, since
    /// nothing will ever read it.
    pub fn new<T: Serialize>(
        network: NetworkId,
        can_query_earlier: bool,
        can_query_later: bool,
        payload: &T,
    ) -> Result<Self, ContextError> {
        if !can_query_earlier && !can_query_later {
            return Ok(Self::terminal(network));
        }
        let json = serde_json::to_string(payload).map_err(ContextError::Encode)?;
        Ok(Self {
            network,
            earlier: can_query_earlier,
            later: can_query_later,
            payload: Some(Arc::from(json)),
        })
    }

    /// True if earlier trips can be queried from this context.
    pub fn can_query_earlier(&self) -> bool {
        self.earlier
    }

    /// True if later trips can be queried from this context.
    pub fn can_query_later(&self) -> bool {
        self.later
    }

    /// True if paging in the given direction is allowed.
    pub fn can_query(&self, later: bool) -> bool {
        if later { self.later } else { self.earlier }
    }

    /// True if no paging direction is left.
    pub fn is_terminal(&self) -> bool {
        !self.earlier && !self.later
    }

    /// Network of the driver that created this context.
    pub fn network(&self) -> &NetworkId {
        &self.network
    }

    /// Decode the driver payload.
    ///
    /// For driver implementations only: callers treat contexts as opaque and
    /// page through [`NetworkProvider::query_more_trips`]. Only the driver
    /// that created the context knows `T`; a decode failure means the context
    /// was corrupted or came from a different driver version.
    ///
    /// [`NetworkProvider::query_more_trips`]: crate::provider::NetworkProvider::query_more_trips
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ContextError> {
        let json = self.payload.as_deref().ok_or(ContextError::MissingPayload)?;
        serde_json::from_str(json).map_err(ContextError::Decode)
    }

    /// Encode this context as a URL-safe token string.
    pub fn to_token(&self) -> Result<String, ContextError> {
        let json = serde_json::to_vec(self).map_err(ContextError::Encode)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Restore a context from a token produced by [`to_token`](Self::to_token).
    pub fn from_token(token: &str) -> Result<Self, ContextError> {
        let json = URL_SAFE_NO_PAD.decode(token.trim())?;
        serde_json::from_slice(&json).map_err(ContextError::TokenJson)
    }
}

impl fmt::Debug for TripsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TripsContext")
            .field("network", &self.network)
            .field("state", &ContextState::of(self))
            .finish_non_exhaustive()
    }
}

/// Caller-side view of a context, derived from its two predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextState {
    CanEarlierAndLater,
    EarlierOnly,
    LaterOnly,
    Terminal,
}

impl ContextState {
    pub fn of(context: &TripsContext) -> Self {
        match (context.can_query_earlier(), context.can_query_later()) {
            (true, true) => ContextState::CanEarlierAndLater,
            (true, false) => ContextState::EarlierOnly,
            (false, true) => ContextState::LaterOnly,
            (false, false) => ContextState::Terminal,
        }
    }
}

impl From<&TripsContext> for ContextState {
    fn from(context: &TripsContext) -> Self {
        Self::of(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Cursor {
        window_start: i64,
        window_end: i64,
    }

    fn network() -> NetworkId {
        NetworkId::new("TEST")
    }

    #[test]
    fn terminal_has_no_directions() {
        let ctx = TripsContext::terminal(network());
        assert!(ctx.is_terminal());
        assert!(!ctx.can_query(true));
        assert!(!ctx.can_query(false));
        assert!(matches!(ctx.payload::<Cursor>(), Err(ContextError::MissingPayload)));
    }

    #[test]
    fn states_follow_predicates() {
        let cursor = Cursor {
            window_start: 1,
            window_end: 2,
        };
        let both = TripsContext::new(network(), true, true, &cursor).unwrap();
        let earlier = TripsContext::new(network(), true, false, &cursor).unwrap();
        let later = TripsContext::new(network(), false, true, &cursor).unwrap();
        let none = TripsContext::new(network(), false, false, &cursor).unwrap();

        assert_eq!(ContextState::of(&both), ContextState::CanEarlierAndLater);
        assert_eq!(ContextState::of(&earlier), ContextState::EarlierOnly);
        assert_eq!(ContextState::of(&later), ContextState::LaterOnly);
        assert_eq!(ContextState::from(&none), ContextState::Terminal);
        assert_eq!(none, TripsContext::terminal(network()));
    }

    #[test]
    fn payload_roundtrip_is_repeatable() {
        let cursor = Cursor {
            window_start: 100,
            window_end: 200,
        };
        let ctx = TripsContext::new(network(), false, true, &cursor).unwrap();
        assert_eq!(ctx.payload::<Cursor>().unwrap(), cursor);
        // Reading does not consume anything
        assert_eq!(ctx.payload::<Cursor>().unwrap(), cursor);
        assert_eq!(ctx.clone().payload::<Cursor>().unwrap(), cursor);
    }

    #[test]
    fn wrong_payload_type_is_corruption() {
        let ctx = TripsContext::new(network(), true, false, &"not a cursor").unwrap();
        assert!(matches!(ctx.payload::<Cursor>(), Err(ContextError::Decode(_))));
    }

    #[test]
    fn token_roundtrip() {
        let cursor = Cursor {
            window_start: 7,
            window_end: 9,
        };
        let ctx = TripsContext::new(network(), true, true, &cursor).unwrap();
        let token = ctx.to_token().unwrap();
        assert!(!token.contains('='));
        assert!(!token.contains('/'));

        let back = TripsContext::from_token(&token).unwrap();
        assert_eq!(back, ctx);
        assert_eq!(back.payload::<Cursor>().unwrap(), cursor);
    }

    #[test]
    fn malformed_tokens() {
        assert!(matches!(
            TripsContext::from_token("***"),
            Err(ContextError::Token(_))
        ));
        let not_json = URL_SAFE_NO_PAD.encode(b"hello");
        assert!(matches!(
            TripsContext::from_token(&not_json),
            Err(ContextError::TokenJson(_))
        ));
    }

    #[test]
    fn debug_hides_payload() {
        let ctx = TripsContext::new(network(), false, true, &"secret-cursor").unwrap();
        let debug = format!("{ctx:?}");
        assert!(debug.contains("LaterOnly"));
        assert!(!debug.contains("secret-cursor"));
    }

    #[test]
    fn contexts_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TripsContext>();
    }
}
