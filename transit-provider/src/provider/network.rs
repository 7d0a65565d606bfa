//! Network identifiers.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifies the transit network a provider answers for ("VBB", "BVG", ...).
///
/// Contexts are tagged with the network of the driver that created them, so a
/// context can never be fed into a different backend by accident.
///
/// # Examples
///
/// ```
/// use transit_provider::provider::NetworkId;
///
/// let vbb = NetworkId::new("VBB");
/// assert_eq!(vbb.as_str(), "VBB");
/// assert_eq!(vbb, NetworkId::from("VBB"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(Arc<str>);

impl NetworkId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NetworkId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkId({})", self.0)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
