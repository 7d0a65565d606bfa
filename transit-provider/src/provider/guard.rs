//! Argument checks and the [`Guarded`] decorator.
//!
//! The check functions reject caller programming errors at the call
//! boundary. Drivers call them first thing; [`Guarded`] wraps any driver
//! and applies them together with the result rules every provider shares:
//! dedup and ranking of suggestions, limits, and the TOO_CLOSE shortcut.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use super::{Capabilities, Capability, NetworkId, NetworkProvider, ProviderError, TripQuery};
use crate::context::TripsContext;
use crate::domain::{Location, LocationType, Point, Product, Style};
use crate::identity::{dedup_locations, rank_suggestions};
use crate::result::{
    NearbyLocationsResult, QueryDeparturesResult, QueryTripsResult, SuggestLocationsResult,
    TripsStatus,
};

/// Reject the call if the provider lacks `capability`.
pub fn check_capability(
    capabilities: &Capabilities,
    capability: Capability,
) -> Result<(), ProviderError> {
    if capabilities.supports(capability) {
        Ok(())
    } else {
        Err(ProviderError::Unsupported(capability))
    }
}

/// A nearby query needs an id or a point to search around.
pub fn check_nearby_location(location: &Location) -> Result<(), ProviderError> {
    if location.has_id() || location.has_point() {
        Ok(())
    } else {
        Err(ProviderError::InvalidArgument {
            name: "location",
            reason: "needs an id or a point",
        })
    }
}

pub fn check_station_id(station_id: &str) -> Result<(), ProviderError> {
    if station_id.trim().is_empty() {
        Err(ProviderError::InvalidArgument {
            name: "station_id",
            reason: "must not be blank",
        })
    } else {
        Ok(())
    }
}

/// Every trip endpoint must be identified or at least named for resolution.
pub fn check_trip_query(
    query: &TripQuery,
    capabilities: &Capabilities,
) -> Result<(), ProviderError> {
    check_endpoint("from", &query.from)?;
    check_endpoint("to", &query.to)?;
    if let Some(via) = &query.via {
        check_capability(capabilities, Capability::TripsVia)?;
        check_endpoint("via", via)?;
    }
    Ok(())
}

fn check_endpoint(name: &'static str, location: &Location) -> Result<(), ProviderError> {
    if location.is_identified() || location.has_name() {
        Ok(())
    } else {
        Err(ProviderError::InvalidArgument {
            name,
            reason: "needs an id, a point or a name",
        })
    }
}

/// The context must come from this network and allow the requested direction.
pub fn check_paging(
    network: &NetworkId,
    context: &TripsContext,
    later: bool,
) -> Result<(), ProviderError> {
    if context.network() != network {
        return Err(ProviderError::ForeignContext {
            expected: network.clone(),
            found: context.network().clone(),
        });
    }
    if !context.can_query(later) {
        return Err(ProviderError::PagingNotAllowed { later });
    }
    Ok(())
}

/// True if a location passes a type filter. An empty filter, or one
/// containing [`LocationType::Any`], passes everything.
pub fn type_allowed(types: &BTreeSet<LocationType>, location: &Location) -> bool {
    types.is_empty() || types.contains(&LocationType::Any) || types.contains(&location.kind())
}

/// Convert a limit to a length bound, where `0` means unbounded.
pub fn limit(max: u32) -> usize {
    if max == 0 {
        usize::MAX
    } else {
        usize::try_from(max).unwrap_or(usize::MAX)
    }
}

/// Wraps a driver with the argument checks and shared result rules.
///
/// Non-OK results are passed through untouched.
#[derive(Debug, Clone)]
pub struct Guarded<P> {
    inner: P,
}

impl<P: NetworkProvider> Guarded<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

#[async_trait]
impl<P: NetworkProvider> NetworkProvider for Guarded<P> {
    fn id(&self) -> &NetworkId {
        self.inner.id()
    }

    fn capabilities(&self) -> &Capabilities {
        self.inner.capabilities()
    }

    fn default_products(&self) -> BTreeSet<Product> {
        self.inner.default_products()
    }

    fn line_style(
        &self,
        network: Option<&str>,
        product: Option<Product>,
        label: Option<&str>,
    ) -> Style {
        self.inner.line_style(network, product, label)
    }

    async fn area(&self) -> Option<Vec<Point>> {
        self.inner.area().await
    }

    #[instrument(skip_all, fields(network = %self.id()))]
    async fn query_nearby_locations(
        &self,
        location: &Location,
        types: &BTreeSet<LocationType>,
        max_distance: u32,
        max_locations: u32,
    ) -> Result<NearbyLocationsResult, ProviderError> {
        check_capability(self.capabilities(), Capability::NearbyLocations)
            .and_then(|()| check_nearby_location(location))
            .inspect_err(|e| warn!(error = %e, "rejected nearby query"))?;

        let result = self
            .inner
            .query_nearby_locations(location, types, max_distance, max_locations)
            .await?;
        if !result.is_ok() {
            debug!(status = ?result.status(), "nearby query failed");
            return Ok(result);
        }

        let max = limit(max_locations);
        Ok(result.map_locations(|locations| {
            let mut locations = dedup_locations(locations);
            locations.retain(|l| type_allowed(types, l));
            locations.truncate(max);
            locations
        }))
    }

    #[instrument(skip_all, fields(network = %self.id(), query = %query))]
    async fn suggest_locations(
        &self,
        query: &str,
        types: &BTreeSet<LocationType>,
        max_locations: u32,
    ) -> Result<SuggestLocationsResult, ProviderError> {
        check_capability(self.capabilities(), Capability::SuggestLocations)
            .inspect_err(|e| warn!(error = %e, "rejected suggest query"))?;

        let result = self
            .inner
            .suggest_locations(query, types, max_locations)
            .await?;
        if !result.is_ok() {
            debug!(status = ?result.status(), "suggest query failed");
            return Ok(result);
        }

        let type_order = self.capabilities().type_order();
        let max = limit(max_locations);
        Ok(result.map_suggested(|suggested| {
            let mut ranked = rank_suggestions(suggested, type_order);
            ranked.retain(|s| type_allowed(types, &s.location));
            ranked.truncate(max);
            ranked
        }))
    }

    #[instrument(skip_all, fields(network = %self.id(), station = %station_id, equivs = equivs))]
    async fn query_departures(
        &self,
        station_id: &str,
        time: Option<DateTime<Utc>>,
        max_departures: u32,
        equivs: bool,
    ) -> Result<QueryDeparturesResult, ProviderError> {
        check_capability(self.capabilities(), Capability::Departures)
            .and_then(|()| check_station_id(station_id))
            .inspect_err(|e| warn!(error = %e, "rejected departures query"))?;

        let result = self
            .inner
            .query_departures(station_id, time, max_departures, equivs)
            .await?;
        if !result.is_ok() {
            debug!(status = ?result.status(), "departures query failed");
            return Ok(result);
        }
        Ok(result.truncate_each(limit(max_departures)))
    }

    #[instrument(skip_all, fields(network = %self.id(), dep = query.dep))]
    async fn query_trips(&self, query: &TripQuery) -> Result<QueryTripsResult, ProviderError> {
        check_capability(self.capabilities(), Capability::Trips)
            .and_then(|()| check_trip_query(query, self.capabilities()))
            .inspect_err(|e| warn!(error = %e, "rejected trip query"))?;

        if query.from.is_same_place(&query.to) {
            debug!("origin and destination are the same place");
            return Ok(QueryTripsResult::from_status(
                self.id().clone(),
                TripsStatus::TooClose,
            ));
        }

        let result = self.inner.query_trips(query).await?;
        if !result.is_ok() {
            debug!(status = ?result.status(), "trip query failed");
        }
        Ok(result)
    }

    #[instrument(skip_all, fields(network = %self.id(), later = later))]
    async fn query_more_trips(
        &self,
        context: &TripsContext,
        later: bool,
    ) -> Result<QueryTripsResult, ProviderError> {
        check_capability(self.capabilities(), Capability::Trips)
            .and_then(|()| check_paging(self.id(), context, later))
            .inspect_err(|e| warn!(error = %e, "rejected paging request"))?;

        let result = self.inner.query_more_trips(context, later).await?;
        if !result.is_ok() {
            debug!(status = ?result.status(), "paging failed");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::result::SuggestedLocation;

    /// Driver returning canned results and counting backend calls.
    struct Canned {
        id: NetworkId,
        capabilities: Capabilities,
        calls: AtomicUsize,
    }

    impl Canned {
        fn new(capabilities: Capabilities) -> Self {
            Self {
                id: NetworkId::new("CANNED"),
                capabilities,
                calls: AtomicUsize::new(0),
            }
        }

        fn all() -> Self {
            Self::new(Capabilities::new([
                Capability::SuggestLocations,
                Capability::NearbyLocations,
                Capability::Departures,
                Capability::Trips,
            ]))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn station(id: &str, name: &str) -> Location {
        Location::new(
            LocationType::Station,
            Some(id.to_string()),
            None,
            None,
            Some(name.to_string()),
        )
        .unwrap()
    }

    fn poi(name: &str) -> Location {
        Location::new(
            LocationType::Poi,
            Some(format!("poi-{name}")),
            None,
            None,
            Some(name.to_string()),
        )
        .unwrap()
    }

    #[async_trait]
    impl NetworkProvider for Canned {
        fn id(&self) -> &NetworkId {
            &self.id
        }

        fn capabilities(&self) -> &Capabilities {
            &self.capabilities
        }

        async fn query_nearby_locations(
            &self,
            _location: &Location,
            _types: &BTreeSet<LocationType>,
            _max_distance: u32,
            _max_locations: u32,
        ) -> Result<NearbyLocationsResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(NearbyLocationsResult::ok(vec![
                station("1", "A"),
                station("1", "A again"),
                poi("Museum"),
                station("2", "B"),
                station("3", "C"),
            ]))
        }

        async fn suggest_locations(
            &self,
            _query: &str,
            _types: &BTreeSet<LocationType>,
            _max_locations: u32,
        ) -> Result<SuggestLocationsResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SuggestLocationsResult::ok(vec![
                SuggestedLocation::new(station("1", "Alexanderplatz"), 10),
                SuggestedLocation::new(poi("Alexa"), 50),
                SuggestedLocation::new(station("1", "Alex"), 20),
                SuggestedLocation::new(station("2", "Alt-Mariendorf"), 30),
            ]))
        }

        async fn query_departures(
            &self,
            _station_id: &str,
            _time: Option<DateTime<Utc>>,
            _max_departures: u32,
            _equivs: bool,
        ) -> Result<QueryDeparturesResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(QueryDeparturesResult::invalid_station())
        }

        async fn query_trips(
            &self,
            _query: &TripQuery,
        ) -> Result<QueryTripsResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(QueryTripsResult::from_status(self.id.clone(), TripsStatus::NoTrips))
        }

        async fn query_more_trips(
            &self,
            _context: &TripsContext,
            _later: bool,
        ) -> Result<QueryTripsResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(QueryTripsResult::from_status(self.id.clone(), TripsStatus::NoTrips))
        }
    }

    fn at_nine() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-15T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn limit_zero_is_unbounded() {
        assert_eq!(limit(0), usize::MAX);
        assert_eq!(limit(3), 3);
    }

    #[test]
    fn nearby_needs_id_or_point() {
        let named = Location::any("somewhere").unwrap();
        assert!(check_nearby_location(&named).is_err());
        assert!(check_nearby_location(&station("1", "A")).is_ok());
        let coord = Location::from_point(Point::from_e6(52_000_000, 13_000_000).unwrap());
        assert!(check_nearby_location(&coord).is_ok());
    }

    #[test]
    fn type_filter() {
        let stop = station("1", "A");
        assert!(type_allowed(&BTreeSet::new(), &stop));
        assert!(type_allowed(&BTreeSet::from([LocationType::Any]), &stop));
        assert!(type_allowed(&BTreeSet::from([LocationType::Station]), &stop));
        assert!(!type_allowed(&BTreeSet::from([LocationType::Poi]), &stop));
    }

    #[test]
    fn blank_station_id_rejected() {
        assert!(check_station_id("   ").is_err());
        assert!(check_station_id("900100003").is_ok());
    }

    #[test]
    fn paging_checks() {
        let network = NetworkId::new("A");
        let later_only = TripsContext::new(network.clone(), false, true, &()).unwrap();

        assert!(check_paging(&network, &later_only, true).is_ok());
        assert_eq!(
            check_paging(&network, &later_only, false),
            Err(ProviderError::PagingNotAllowed { later: false })
        );
        assert!(matches!(
            check_paging(&NetworkId::new("B"), &later_only, true),
            Err(ProviderError::ForeignContext { .. })
        ));
    }

    #[tokio::test]
    async fn nearby_dedups_filters_and_truncates() {
        let provider = Guarded::new(Canned::all());
        let location = station("0", "Origin");
        let stations: BTreeSet<_> = [LocationType::Station].into();

        let result = provider
            .query_nearby_locations(&location, &stations, 0, 2)
            .await
            .unwrap();
        let ids: Vec<_> = result.locations().iter().map(|l| l.id().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2"]);

        let result = provider
            .query_nearby_locations(&location, &BTreeSet::new(), 0, 0)
            .await
            .unwrap();
        assert_eq!(result.locations().len(), 4);
    }

    #[tokio::test]
    async fn suggestions_ranked_and_deduped() {
        let provider = Guarded::new(Canned::all());
        let result = provider
            .suggest_locations("Al", &BTreeSet::new(), 0)
            .await
            .unwrap();
        let names: Vec<_> = result.locations().map(|l| l.name().unwrap()).collect();
        assert_eq!(names, vec!["Alexa", "Alt-Mariendorf", "Alex"]);
    }

    #[tokio::test]
    async fn too_close_skips_backend() {
        let provider = Guarded::new(Canned::all());
        let query = TripQuery::departing(station("1", "A"), station("1", "A"), at_nine());

        let result = provider.query_trips(&query).await.unwrap();
        assert_eq!(result.status(), TripsStatus::TooClose);
        assert!(result.trips().is_empty());
        assert!(result.context().is_terminal());
        assert_eq!(provider.inner().calls(), 0);
    }

    #[tokio::test]
    async fn via_needs_capability() {
        let provider = Guarded::new(Canned::all());
        let query = TripQuery::departing(station("1", "A"), station("2", "B"), at_nine())
            .via(station("3", "C"));
        let err = provider.query_trips(&query).await.unwrap_err();
        assert_eq!(err, ProviderError::Unsupported(Capability::TripsVia));
        assert_eq!(provider.inner().calls(), 0);
    }

    #[tokio::test]
    async fn wrong_direction_rejected_before_backend() {
        let provider = Guarded::new(Canned::all());
        let context = TripsContext::terminal(provider.id().clone());

        for later in [true, false] {
            let err = provider.query_more_trips(&context, later).await.unwrap_err();
            assert_eq!(err, ProviderError::PagingNotAllowed { later });
        }
        assert_eq!(provider.inner().calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_operation() {
        let provider = Guarded::new(Canned::new(Capabilities::new([Capability::Trips])));
        let err = provider
            .query_departures("1", None, 10, false)
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::Unsupported(Capability::Departures));
    }

    #[tokio::test]
    async fn statuses_pass_through() {
        let provider = Guarded::new(Canned::all());
        let result = provider
            .query_departures("999999", None, 10, false)
            .await
            .unwrap();
        assert!(result.station_departures().is_empty());
        assert_eq!(provider.inner().calls(), 1);
    }

    #[tokio::test]
    async fn network_defaults_forwarded() {
        let provider = Guarded::new(Canned::all());
        assert_eq!(provider.default_products(), Product::all_except_high_speed());
        assert_eq!(
            provider.line_style(Some("CANNED"), Some(Product::Tram), Some("M4")),
            Style::standard(Some(Product::Tram))
        );
        assert_eq!(provider.area().await, None);
        assert_eq!(provider.inner().calls(), 0);
    }
}
