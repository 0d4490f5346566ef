//! Drives `NearbyClient` against an in-process server on an ephemeral port.

use geofire_cli::client::{ClientError, NearbyClient};
use geofire_query::grid::{cell_of, COARSE_RESOLUTION, FINE_RESOLUTION};
use geofire_query::{GeoPoint, MemoryStore, OrderBy, QueryRequest, StoredRecord};
use geofire_server::config::AuthMode;
use geofire_server::{routes::build_router, AppState, ServerConfig, TelemetryConfig};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const AUSTIN: (f64, f64) = (30.2651242, -97.7308078);

fn store() -> MemoryStore {
    let store = MemoryStore::new();
    let point = GeoPoint::new(30.2660, -97.7320).unwrap();
    let doc = json!({
        "name": "Lamar Lounge",
        "h3index7": cell_of(point, COARSE_RESOLUTION).unwrap().to_string(),
        "h3index15": cell_of(point, FINE_RESOLUTION).unwrap().to_string(),
    });
    store
        .insert("businesses", StoredRecord::new("lounge", doc))
        .unwrap();
    // Present in the ring but missing its fine location
    let center = cell_of(GeoPoint::new(AUSTIN.0, AUSTIN.1).unwrap(), COARSE_RESOLUTION).unwrap();
    store
        .insert(
            "businesses",
            StoredRecord::new(
                "nowhere",
                json!({"name": "Nowhere Diner", "h3index7": center.to_string()}),
            ),
        )
        .unwrap();
    store
}

async fn spawn_server(config: ServerConfig, store: MemoryStore) -> String {
    let telemetry = TelemetryConfig::with_server_config(&config);
    let state = Arc::new(AppState::with_store(config, telemetry, Arc::new(store)).unwrap());
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn austin_request() -> QueryRequest {
    QueryRequest::at(GeoPoint::new(AUSTIN.0, AUSTIN.1).unwrap()).with_order_by(OrderBy::AToZ)
}

#[tokio::test]
async fn nearby_query_roundtrip() {
    let url = spawn_server(ServerConfig::default(), store()).await;
    let client = NearbyClient::new(&url, None, Duration::from_secs(10)).unwrap();
    assert!(!client.base_url().ends_with('/'));

    let result = client.nearby(&austin_request()).await.unwrap();
    assert!(result.elapsed_ms.is_some());

    let mut businesses = result.response.businesses;
    businesses.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(businesses.len(), 2);
    assert_eq!(businesses[0].id, "lounge");
    assert!(businesses[0].distance.is_some());
    assert_eq!(businesses[1].id, "nowhere");
    assert!(businesses[1].distance.is_none());
}

#[tokio::test]
async fn health_and_stats_roundtrip() {
    let url = spawn_server(ServerConfig::default(), store()).await;
    let client = NearbyClient::new(&url, None, Duration::from_secs(10)).unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health["status"], "ok");

    client.nearby(&austin_request()).await.unwrap();
    let stats = client.stats().await.unwrap();
    assert_eq!(stats["queries"]["queries"], 1);
    assert_eq!(stats["queries"]["recordsWithoutDistance"], 1);
}

#[tokio::test]
async fn error_statuses_map_to_client_errors() {
    let config = ServerConfig {
        auth_mode: AuthMode::Required,
        auth_secret: Some("secret".into()),
        ..Default::default()
    };
    let url = spawn_server(config, store()).await;

    let anonymous = NearbyClient::new(&url, None, Duration::from_secs(10)).unwrap();
    let err = anonymous.nearby(&austin_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)), "{err}");

    let unavailable = store();
    unavailable.set_available(false);
    let url = spawn_server(ServerConfig::default(), unavailable).await;
    let client = NearbyClient::new(&url, None, Duration::from_secs(10)).unwrap();
    let err = client.nearby(&austin_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::Unavailable(_)), "{err}");
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = NearbyClient::new(&format!("http://{addr}"), None, Duration::from_secs(5)).unwrap();
    let err = client.nearby(&austin_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "{err}");
}
