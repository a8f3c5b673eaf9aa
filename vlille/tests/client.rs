//! End-to-end tests against a local stand-in for the station API proxy.

use std::collections::HashMap;

use axum::Router;
use axum::extract::Query;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::runtime::Handle;
use vlille::{
    Coordinates, Deferred, Resolution, Scheduler, StationId, TransportError, Vlille, VlilleConfig,
};

const STATIONS_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<markers>
  <marker id="1" lat="50.6419" lng="3.07599" name="Metropole" />
  <marker id="2" lat="50.6367" lng="3.06915" name="Rihour" />
  <marker id="3" lat="50.6292" lng="3.0573" name="Republique" />
  <marker id="4" lat="50.6371" lng="3.0630" name="Nationale" />
  <marker id="5" lat="50.6050" lng="3.1380" name="Villeneuve" />
</markers>"#;

const STATION_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<bikestation>
  <adress>PLACE DE LA REPUBLIQUE</adress>
  <status>0</status>
  <bikes>7</bikes>
  <attachs>13</attachs>
  <paiement>AVEC_TPE</paiement>
  <lastupd>4 secondes</lastupd>
</bikestation>"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn xml(body: &'static str) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], body)
}

async fn stations() -> impl IntoResponse {
    xml(STATIONS_XML)
}

async fn station(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
    match params.get("borne").map(String::as_str) {
        Some("3") => xml(STATION_XML).into_response(),
        _ => (StatusCode::NOT_FOUND, "no such station").into_response(),
    }
}

/// Serve a fake proxy on an ephemeral port and return its base URL
/// (without a trailing slash).
async fn serve() -> String {
    let app = Router::new()
        .route("/proxy/xml-stations.aspx", get(stations))
        .route("/proxy/xml-station.aspx", get(station))
        .route("/broken/xml-stations.aspx", get(|| async { "not <xml" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn client(path: &str) -> Vlille {
    init_tracing();
    let base = serve().await;
    let scheduler = Scheduler::spawn_on(&Handle::current());
    Vlille::new(VlilleConfig::new(format!("{base}/{path}")), &scheduler).unwrap()
}

#[tokio::test]
async fn lists_stations() {
    let client = client("proxy").await;

    let stations = client.stations().await.unwrap();

    assert_eq!(stations.len(), 5);
    assert_eq!(stations[0].name(), Some("Metropole"));
    assert_eq!(stations[4].id(), Some(StationId::parse("5").unwrap()));
}

#[tokio::test]
async fn fetches_one_station() {
    let client = client("proxy/").await;
    let id = StationId::parse("3").unwrap();

    let details = client.station(&id).await.unwrap();

    assert_eq!(details.address(), Some("PLACE DE LA REPUBLIQUE"));
    assert_eq!(details.bikes(), Some(7));
    assert_eq!(details.attachs(), Some(13));
    assert_eq!(details.last_update(), Some("4 secondes"));
}

#[tokio::test]
async fn unknown_station_is_a_status_error() {
    let client = client("proxy").await;
    let id = StationId::parse("99").unwrap();

    let reason = client.station(&id).await.unwrap_err();

    match reason.downcast_ref::<TransportError>() {
        Some(TransportError::Status { status, body }) => {
            assert_eq!(*status, 404);
            assert_eq!(body, "no such station");
        }
        other => panic!("unexpected rejection: {other:?}"),
    }
}

#[tokio::test]
async fn unparsable_body_is_an_xml_error() {
    let client = client("broken").await;

    let reason = client.stations().await.unwrap_err();

    assert!(matches!(
        reason.downcast_ref::<TransportError>(),
        Some(TransportError::Xml(_))
    ));
}

#[tokio::test]
async fn unreachable_proxy_is_a_network_error() {
    let scheduler = Scheduler::spawn_on(&Handle::current());
    let client = Vlille::new(
        VlilleConfig::new("http://127.0.0.1:1/proxy").with_timeout(2),
        &scheduler,
    )
    .unwrap();

    let reason = client.stations().await.unwrap_err();

    assert!(matches!(
        reason.downcast_ref::<TransportError>(),
        Some(TransportError::Network(_))
    ));
}

#[tokio::test]
async fn closest_stations_default_to_three() {
    let client = client("proxy").await;
    let origin = Coordinates::new(50.6292, 3.0573);

    let closest = client.closest_stations(origin, None).await.unwrap();

    let names: Vec<_> = closest.iter().map(|r| r.station.name().unwrap()).collect();
    assert_eq!(names, vec!["Republique", "Nationale", "Rihour"]);
    assert_eq!(closest[0].distance, 0.0);
    assert!(closest.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn closest_stations_with_custom_max() {
    let client = client("proxy").await;
    let origin = Coordinates::new(50.6292, 3.0573);

    let closest = client.closest_stations(origin, Some(1)).await.unwrap();

    assert_eq!(closest.len(), 1);
    assert_eq!(closest[0].station.name(), Some("Republique"));
}

#[tokio::test]
async fn queries_chain_into_further_requests() {
    let client = client("proxy").await;
    let origin = Coordinates::new(50.6292, 3.0573);
    let follow_up = client.clone();

    let details: Deferred<_> = client
        .closest_stations(origin, Some(1))
        .and_then(move |closest| {
            let id = closest[0].station.id().unwrap();
            Ok(Resolution::from(follow_up.station(&id)))
        });

    assert_eq!(details.await.unwrap().bikes(), Some(7));
}
