//! Integration tests for the HTTP transport (wiremock-based)

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use transit_provider::context::TripsContext;
use transit_provider::domain::{Location, LocationType, StationDepartures, Trip};
use transit_provider::provider::{
    Capabilities, Capability, Guarded, NetworkId, NetworkProvider, ProviderConfig, ProviderError,
    TripQuery,
};
use transit_provider::result::{
    DeparturesStatus, NearbyLocationsResult, NearbyStatus, QueryDeparturesResult,
    QueryTripsResult, SuggestLocationsResult, SuggestStatus, SuggestedLocation, TripsStatus,
};
use transit_provider::timetable::{TimetableError, TimetableProvider};
use transit_provider::transport::{HttpTransport, TransportError};

const TIMETABLE: &str = include_str!("data/timetable.json");

#[derive(Debug, Deserialize, PartialEq)]
struct Stop {
    id: String,
    name: String,
}

fn config_for_mock(base_url: &str) -> ProviderConfig {
    ProviderConfig::default()
        .with_endpoint(base_url)
        .with_timeout(5)
}

const fn sample_stops_json() -> &'static str {
    r#"[
        {"id": "900100003", "name": "S+U Alexanderplatz"},
        {"id": "900100004", "name": "S Alexanderplatz Bhf"}
    ]"#
}

#[tokio::test]
async fn test_get_json_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stops"))
        .and(query_param("query", "alexanderplatz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_stops_json()))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for_mock(&server.uri()), "http://unused").unwrap();
    let stops: Vec<Stop> = transport
        .get_json("stops", &[("query", "alexanderplatz")])
        .await
        .unwrap();

    assert_eq!(stops.len(), 2);
    assert_eq!(
        stops[0],
        Stop {
            id: "900100003".into(),
            name: "S+U Alexanderplatz".into(),
        }
    );
}

#[tokio::test]
async fn test_trailing_slash_in_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stops"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let endpoint = format!("{}/", server.uri());
    let transport = HttpTransport::new(&config_for_mock(&endpoint), "http://unused").unwrap();
    assert_eq!(transport.base_url(), server.uri());

    let stops: Vec<Stop> = transport.get_json("/stops", &()).await.unwrap();
    assert!(stops.is_empty());
}

#[tokio::test]
async fn test_zero_timeout_uses_default() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stops"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sample_stops_json())
                .set_delay(std::time::Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let config = config_for_mock(&server.uri()).with_timeout(0);
    let transport = HttpTransport::new(&config, "http://unused").unwrap();
    let stops: Vec<Stop> = transport.get_json("stops", &()).await.unwrap();
    assert_eq!(stops.len(), 2);
}

#[tokio::test]
async fn test_authorization_header_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stops"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for_mock(&server.uri()).with_api_authorization("Bearer secret-token");
    let transport = HttpTransport::new(&config, "http://unused").unwrap();

    let stops: Vec<Stop> = transport.get_json("stops", &()).await.unwrap();
    assert!(stops.is_empty());
}

#[tokio::test]
async fn test_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for_mock(&server.uri()), "http://unused").unwrap();
    let result = transport.get_json::<Vec<Stop>, _>("stops", &()).await;

    assert!(matches!(result, Err(TransportError::Unauthorized)));
}

#[tokio::test]
async fn test_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for_mock(&server.uri()), "http://unused").unwrap();
    let result = transport.get_json::<Vec<Stop>, _>("stops", &()).await;

    assert!(matches!(result, Err(TransportError::RateLimited)));
}

#[tokio::test]
async fn test_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for_mock(&server.uri()), "http://unused").unwrap();
    let err = transport
        .get_json::<Vec<Stop>, _>("stops", &())
        .await
        .unwrap_err();

    match &err {
        TransportError::Api { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.diagnostic(), "API error 500: Internal Server Error");
}

#[tokio::test]
async fn test_malformed_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for_mock(&server.uri()), "http://unused").unwrap();
    let err = transport
        .get_json::<Vec<Stop>, _>("stops", &())
        .await
        .unwrap_err();

    match err {
        TransportError::Json { body, .. } => assert_eq!(body.as_deref(), Some("not json")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_fetch_timetable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/timetable.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TIMETABLE))
        .mount(&server)
        .await;

    let provider = TimetableProvider::fetch(&config_for_mock(&server.uri()))
        .await
        .unwrap();
    assert_eq!(provider.id().as_str(), "TESTNET");

    let result = provider
        .query_departures("100", None, 1, false)
        .await
        .unwrap();
    assert_eq!(result.status(), DeparturesStatus::Ok);
    assert_eq!(result.station_departures()[0].departures().len(), 1);
}

#[tokio::test]
async fn test_fetch_without_endpoint() {
    let result = TimetableProvider::fetch(&ProviderConfig::default()).await;
    assert!(matches!(result, Err(TimetableError::NoEndpoint)));
}

#[tokio::test]
async fn test_fetch_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = TimetableProvider::fetch(&config_for_mock(&server.uri())).await;
    assert!(matches!(
        result,
        Err(TimetableError::Transport(TransportError::Api { status: 503, .. }))
    ));
}

/// Driver answering every operation from one JSON endpoint per query kind.
struct HttpDriver {
    id: NetworkId,
    capabilities: Capabilities,
    transport: HttpTransport,
}

impl HttpDriver {
    fn new(base_url: &str) -> Self {
        Self {
            id: NetworkId::new("HTTP"),
            capabilities: Capabilities::new([
                Capability::SuggestLocations,
                Capability::NearbyLocations,
                Capability::Departures,
                Capability::Trips,
            ]),
            transport: HttpTransport::new(&config_for_mock(base_url), "http://unused").unwrap(),
        }
    }

    async fn trips(&self, query: &[(&str, &str)]) -> QueryTripsResult {
        match self.transport.get_json::<Vec<Trip>, _>("trips", query).await {
            Ok(trips) => {
                let context = TripsContext::terminal(self.id.clone());
                QueryTripsResult::ok(None, None, None, trips, context)
            }
            Err(e) => QueryTripsResult::service_down(self.id.clone(), e.diagnostic()),
        }
    }
}

#[async_trait]
impl NetworkProvider for HttpDriver {
    fn id(&self) -> &NetworkId {
        &self.id
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn query_nearby_locations(
        &self,
        location: &Location,
        _types: &BTreeSet<LocationType>,
        _max_distance: u32,
        _max_locations: u32,
    ) -> Result<NearbyLocationsResult, ProviderError> {
        let id = location.id().unwrap_or_default();
        Ok(
            match self.transport.get_json::<Vec<Location>, _>("nearby", &[("id", id)]).await {
                Ok(locations) => NearbyLocationsResult::ok(locations),
                Err(e) => NearbyLocationsResult::service_down(e.diagnostic()),
            },
        )
    }

    async fn suggest_locations(
        &self,
        query: &str,
        _types: &BTreeSet<LocationType>,
        _max_locations: u32,
    ) -> Result<SuggestLocationsResult, ProviderError> {
        Ok(
            match self
                .transport
                .get_json::<Vec<SuggestedLocation>, _>("suggest", &[("q", query)])
                .await
            {
                Ok(suggested) => SuggestLocationsResult::ok(suggested),
                Err(e) => SuggestLocationsResult::service_down(e.diagnostic()),
            },
        )
    }

    async fn query_departures(
        &self,
        station_id: &str,
        _time: Option<DateTime<Utc>>,
        _max_departures: u32,
        _equivs: bool,
    ) -> Result<QueryDeparturesResult, ProviderError> {
        Ok(
            match self
                .transport
                .get_json::<Vec<StationDepartures>, _>("departures", &[("station", station_id)])
                .await
            {
                Ok(boards) => QueryDeparturesResult::ok(boards),
                Err(e) => QueryDeparturesResult::service_down(e.diagnostic()),
            },
        )
    }

    async fn query_trips(&self, query: &TripQuery) -> Result<QueryTripsResult, ProviderError> {
        let from = query.from.id().unwrap_or_default();
        let to = query.to.id().unwrap_or_default();
        Ok(self.trips(&[("from", from), ("to", to)]).await)
    }

    async fn query_more_trips(
        &self,
        context: &TripsContext,
        _later: bool,
    ) -> Result<QueryTripsResult, ProviderError> {
        let cursor: String = match context.payload() {
            Ok(cursor) => cursor,
            Err(e) => return Ok(QueryTripsResult::service_down(self.id.clone(), e.to_string())),
        };
        Ok(self.trips(&[("cursor", cursor.as_str())]).await)
    }
}

async fn assert_every_operation_down(server: &MockServer, expected: &str) {
    let provider = Guarded::new(HttpDriver::new(&server.uri()));
    let station = Location::station("100").unwrap();
    let any = BTreeSet::new();

    let nearby = provider.query_nearby_locations(&station, &any, 0, 0).await.unwrap();
    assert_eq!(nearby.status(), NearbyStatus::ServiceDown);
    assert!(nearby.locations().is_empty());
    assert!(nearby.diagnostic().is_some_and(|d| d.contains(expected)));

    let suggest = provider.suggest_locations("haupt", &any, 0).await.unwrap();
    assert_eq!(suggest.status(), SuggestStatus::ServiceDown);
    assert!(suggest.suggested().is_empty());
    assert!(suggest.diagnostic().is_some_and(|d| d.contains(expected)));

    let departures = provider.query_departures("100", None, 0, false).await.unwrap();
    assert_eq!(departures.status(), DeparturesStatus::ServiceDown);
    assert!(departures.station_departures().is_empty());
    assert!(departures.diagnostic().is_some_and(|d| d.contains(expected)));

    let at = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
    let query = TripQuery::departing(station, Location::station("200").unwrap(), at);
    let trips = provider.query_trips(&query).await.unwrap();
    assert_eq!(trips.status(), TripsStatus::ServiceDown);
    assert!(trips.trips().is_empty());
    assert!(trips.context().is_terminal());
    assert!(trips.diagnostic().is_some_and(|d| d.contains(expected)));

    let context = TripsContext::new(provider.id().clone(), true, true, &"page-2").unwrap();
    let more = provider.query_more_trips(&context, true).await.unwrap();
    assert_eq!(more.status(), TripsStatus::ServiceDown);
    assert!(more.trips().is_empty());
    assert!(more.context().is_terminal());
    assert!(more.diagnostic().is_some_and(|d| d.contains(expected)));
}

#[tokio::test]
async fn test_server_error_is_service_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    assert_every_operation_down(&server, "maintenance").await;
}

#[tokio::test]
async fn test_unauthorized_is_service_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let expected = TransportError::Unauthorized.diagnostic();
    assert_every_operation_down(&server, &expected).await;
}

#[tokio::test]
async fn test_rate_limited_is_service_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let expected = TransportError::RateLimited.diagnostic();
    assert_every_operation_down(&server, &expected).await;
}

#[tokio::test]
async fn test_malformed_body_is_service_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    assert_every_operation_down(&server, "<html>").await;
}

#[tokio::test]
async fn test_driver_decodes_successful_responses() {
    let server = MockServer::start().await;
    let stations = vec![Location::station("100").unwrap(), Location::station("101").unwrap()];
    Mock::given(method("GET"))
        .and(path("/nearby"))
        .and(query_param("id", "100"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(serde_json::to_string(&stations).unwrap()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/trips"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let provider = HttpDriver::new(&server.uri());
    let nearby = provider
        .query_nearby_locations(&stations[0], &BTreeSet::new(), 0, 0)
        .await
        .unwrap();
    assert_eq!(nearby.status(), NearbyStatus::Ok);
    assert_eq!(nearby.locations(), stations.as_slice());

    let context = TripsContext::new(provider.id().clone(), false, true, &"page-2").unwrap();
    let more = provider.query_more_trips(&context, true).await.unwrap();
    assert_eq!(more.status(), TripsStatus::Ok);
    assert!(more.trips().is_empty());
}
