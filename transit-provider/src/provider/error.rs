//! Provider call errors.

use super::{Capability, NetworkId};

/// A caller programming error, rejected before any backend round trip.
///
/// Operational outcomes such as an unknown station or an unreachable
/// backend are never reported this way; they are statuses on the result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// An argument is malformed for the operation
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: &'static str,
    },

    /// The context does not allow paging in the requested direction
    #[error("context does not allow querying {} trips", direction(.later))]
    PagingNotAllowed { later: bool },

    /// The context was created by a different network's provider
    #[error("context belongs to network {found}, not {expected}")]
    ForeignContext { expected: NetworkId, found: NetworkId },

    /// No provider is registered for the context's network
    #[error("no provider for network {0}")]
    UnknownNetwork(NetworkId),

    /// The provider does not offer this operation
    #[error("provider does not support {0:?}")]
    Unsupported(Capability),
}

fn direction(later: &bool) -> &'static str {
    if *later { "later" } else { "earlier" }
}
