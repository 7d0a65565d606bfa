//! Result metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::NetworkId;

/// Backend metadata attached to a result, when the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultHeader {
    pub network: NetworkId,
    pub server_product: String,
    pub server_version: Option<String>,
    pub server_name: Option<String>,
    pub server_time: Option<DateTime<Utc>>,
}

impl ResultHeader {
    pub fn new(network: NetworkId, server_product: impl Into<String>) -> Self {
        Self {
            network,
            server_product: server_product.into(),
            server_version: None,
            server_name: None,
            server_time: None,
        }
    }

    pub fn with_server_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = Some(version.into());
        self
    }

    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    pub fn with_server_time(mut self, time: DateTime<Utc>) -> Self {
        self.server_time = Some(time);
        self
    }
}
