//! Providers keyed by network.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{NetworkId, NetworkProvider, ProviderError};
use crate::context::TripsContext;
use crate::result::QueryTripsResult;

/// A set of providers, one per network.
///
/// Contexts are tagged with the network that created them, so the registry
/// can route a paging request back to the owning driver without the caller
/// knowing which backend produced the original result.
#[derive(Clone, Default)]
pub struct Registry {
    providers: HashMap<NetworkId, Arc<dyn NetworkProvider>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider, returning the one it replaces for the same network.
    pub fn register(
        &mut self,
        provider: Arc<dyn NetworkProvider>,
    ) -> Option<Arc<dyn NetworkProvider>> {
        let id = provider.id().clone();
        debug!(network = %id, "registering provider");
        self.providers.insert(id, provider)
    }

    pub fn get(&self, network: &NetworkId) -> Option<&Arc<dyn NetworkProvider>> {
        self.providers.get(network)
    }

    /// Registered networks, in no particular order.
    pub fn networks(&self) -> impl Iterator<Item = &NetworkId> {
        self.providers.keys()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Page from a context using the provider that created it.
    pub async fn query_more_trips(
        &self,
        context: &TripsContext,
        later: bool,
    ) -> Result<QueryTripsResult, ProviderError> {
        let provider = self
            .get(context.network())
            .ok_or_else(|| ProviderError::UnknownNetwork(context.network().clone()))?;
        provider.query_more_trips(context, later).await
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.providers.keys()).finish()
    }
}
