use axum::body::Body;
use geofire_query::grid::{cell_of, COARSE_RESOLUTION, FINE_RESOLUTION};
use geofire_query::{GeoPoint, MemoryStore, StoredRecord};
use geofire_server::config::AuthMode;
use geofire_server::{
    routes::build_router, AppState, GeoFireServer, ServerConfig, StartupError, TelemetryConfig,
};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tower::ServiceExt;

const AUSTIN: (f64, f64) = (30.2651242, -97.7308078);
const SECRET: &str = "integration-secret";

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    let places = [
        ("taco", "Taco Stand", 30.2655, -97.7310),
        ("books", "Book People", 30.2684, -97.7335),
        ("coffee", "Coffee Bar", 30.2640, -97.7290),
    ];
    for (id, name, lat, lng) in places {
        let point = GeoPoint::new(lat, lng).unwrap();
        let doc = json!({
            "name": name,
            "category": "food",
            "h3index7": cell_of(point, COARSE_RESOLUTION).unwrap().to_string(),
            "h3index15": cell_of(point, FINE_RESOLUTION).unwrap().to_string(),
        });
        store.insert("businesses", StoredRecord::new(id, doc)).unwrap();
    }
    store
}

fn state_with(cfg: ServerConfig, store: MemoryStore) -> Arc<AppState> {
    let telemetry = TelemetryConfig::with_server_config(&cfg);
    Arc::new(AppState::with_store(cfg, telemetry, Arc::new(store)).expect("AppState::with_store"))
}

fn test_state() -> Arc<AppState> {
    let cfg = ServerConfig {
        cors_enabled: false,
        ..Default::default()
    };
    state_with(cfg, seeded_store())
}

fn auth_state(mode: AuthMode) -> Arc<AppState> {
    let cfg = ServerConfig {
        cors_enabled: false,
        auth_mode: mode,
        auth_secret: Some(SECRET.to_string()),
        auth_issuer: Some("geofire-tests".to_string()),
        ..Default::default()
    };
    state_with(cfg, seeded_store())
}

fn token(secret: &str) -> String {
    let claims = json!({
        "sub": "tester",
        "iss": "geofire-tests",
        "exp": 4_102_444_800u64,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn nearby_request(body: JsonValue, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/businesses/nearby")
        .header("content-type", "application/json");
    if let Some(t) = bearer {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn austin_body() -> JsonValue {
    json!({
        "geoPoint": {"latitude": AUSTIN.0, "longitude": AUSTIN.1},
        "filterDistance": "None",
        "orderBy": "A_to_Z"
    })
}

async fn json_body(resp: http::Response<Body>) -> (StatusCode, JsonValue) {
    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let json: JsonValue = serde_json::from_slice(&bytes).expect("valid JSON response");
    (status, json)
}

#[tokio::test]
async fn health_check_ok() {
    let app = build_router(test_state());

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let (status, json) = json_body(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("ok"));
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn nearby_returns_businesses_with_distances() {
    let app = build_router(test_state());

    let resp = app.oneshot(nearby_request(austin_body(), None)).await.unwrap();
    assert!(resp.headers().contains_key("x-query-elapsed-ms"));

    let (status, json) = json_body(resp).await;
    assert_eq!(status, StatusCode::OK);

    let businesses = json["businesses"].as_array().expect("businesses array");
    let mut ids: Vec<_> = businesses.iter().filter_map(|b| b["id"].as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["books", "coffee", "taco"]);

    for b in businesses {
        let km = b["distance"]["distanceKm"].as_f64().expect("distanceKm");
        let mi = b["distance"]["distanceMi"].as_f64().expect("distanceMi");
        assert!(km > 0.0 && km < 1.0, "{b}");
        assert!(mi < km);
        assert_eq!(b["category"], "food");
        // Cell fields are not echoed as attributes
        assert!(b.get("h3index7").is_none());
    }
}

#[tokio::test]
async fn invalid_coordinate_is_bad_request() {
    let app = build_router(test_state());
    let body = json!({"geoPoint": {"latitude": 95.0, "longitude": 0.0}});

    let (status, json) = json_body(app.oneshot(nearby_request(body, None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert_eq!(json["@type"], "err:geo/InvalidCoordinate");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = build_router(test_state());
    let req = Request::builder()
        .method("POST")
        .uri("/v1/businesses/nearby")
        .body(Body::from("{\"geoPoint\": "))
        .unwrap();

    let (status, json) = json_body(app.oneshot(req).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["@type"], "err:json/Parse");
    assert!(json.get("cause").is_some());
}

#[tokio::test]
async fn empty_body_is_bad_request() {
    let app = build_router(test_state());
    let req = Request::builder()
        .method("POST")
        .uri("/v1/businesses/nearby")
        .body(Body::empty())
        .unwrap();

    let (status, _) = json_body(app.oneshot(req).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unavailable_store_is_service_unavailable() {
    let store = seeded_store();
    store.set_available(false);
    let state = state_with(ServerConfig::default(), store);
    let app = build_router(state.clone());

    let (status, json) =
        json_body(app.oneshot(nearby_request(austin_body(), None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["@type"], "err:store/Unavailable");
    assert_eq!(state.metrics.snapshot().rejected, 1);
}

#[tokio::test]
async fn required_auth_rejects_missing_and_bad_tokens() {
    let state = auth_state(AuthMode::Required);

    let resp = build_router(state.clone())
        .oneshot(nearby_request(austin_body(), None))
        .await
        .unwrap();
    let (status, json) = json_body(resp).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["@type"], "err:auth/Unauthorized");

    let bad = token("wrong-secret");
    let resp = build_router(state.clone())
        .oneshot(nearby_request(austin_body(), Some(&bad)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let good = token(SECRET);
    let resp = build_router(state)
        .oneshot(nearby_request(austin_body(), Some(&good)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn optional_auth_accepts_anonymous_but_not_bad_tokens() {
    let state = auth_state(AuthMode::Optional);

    let resp = build_router(state.clone())
        .oneshot(nearby_request(austin_body(), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = build_router(state)
        .oneshot(nearby_request(austin_body(), Some("garbage")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stats_reflect_served_queries() {
    let state = test_state();

    for _ in 0..2 {
        let resp = build_router(state.clone())
            .oneshot(nearby_request(austin_body(), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = build_router(state)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, json) = json_body(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["queries"]["queries"], 2);
    assert_eq!(json["queries"]["results"], 6);
    assert_eq!(json["resolution"], 7);
    assert_eq!(json["ringRadius"], 1);
}

#[test]
fn startup_rejects_auth_without_secret() {
    let cfg = ServerConfig {
        auth_mode: AuthMode::Required,
        ..Default::default()
    };
    let telemetry = TelemetryConfig::with_server_config(&cfg);
    let result = AppState::with_store(cfg, telemetry, Arc::new(MemoryStore::new()));
    assert!(result.is_err());
}

#[test]
fn startup_rejects_oversized_ring_radius() {
    let cfg = ServerConfig {
        ring_radius: 1_000_000,
        ..Default::default()
    };
    let telemetry = TelemetryConfig::with_server_config(&cfg);
    let result = AppState::with_store(cfg, telemetry, Arc::new(MemoryStore::new()));
    assert!(matches!(result, Err(StartupError::Engine(_))));
}

#[test]
fn startup_loads_seed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("businesses.json");
    std::fs::write(
        &path,
        r#"[{"id": "one", "name": "One", "h3index7": "872a8f4c5ffffff"}]"#,
    )
    .unwrap();

    let cfg = ServerConfig {
        data_file: Some(path),
        ..Default::default()
    };
    let telemetry = TelemetryConfig::with_server_config(&cfg);
    assert!(AppState::new(cfg, telemetry).is_ok());
}

#[tokio::test]
async fn run_reports_occupied_listen_address() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let cfg = ServerConfig {
        listen_addr: taken.local_addr().unwrap(),
        ..Default::default()
    };

    let server = GeoFireServer::new(cfg).unwrap();
    let err = server.run().await.unwrap_err();
    assert!(matches!(err, StartupError::Io(_)), "{err}");
}
