use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use futures_util::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use trailway_api::{
    app,
    auth::issue_token,
    state::{AppState, AuthConfig, RateLimitConfig},
};
use trailway_core::memory::{InMemoryBookingRepository, StaticTripCatalog};
use trailway_core::SystemClock;
use trailway_seats::SeatSettings;
use trailway_store::RedisClient;

const SECRET: &str = "integration-secret-0123";

fn test_app() -> Router {
    test_app_with(SeatSettings::default())
}

fn test_app_with(settings: SeatSettings) -> Router {
    app(base_state(settings))
}

fn base_state(settings: SeatSettings) -> AppState {
    AppState::new(
        Arc::new(StaticTripCatalog::single(1, 40)),
        Arc::new(InMemoryBookingRepository::new()),
        Arc::new(SystemClock),
        settings,
        AuthConfig {
            secret: SECRET.to_string(),
            expiration: 3600,
        },
        RateLimitConfig {
            requests: 100,
            window_seconds: 60,
        },
    )
}

fn token(user: &str) -> String {
    issue_token(SECRET, user, "CUSTOMER", None, 3600).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("Authorization", format!("Bearer {}", token(user)));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn booking_request(seats: &[i32]) -> Value {
    json!({
        "trip_id": 1,
        "seat_numbers": seats,
        "gender": "F",
        "age": 31,
        "phone_number": "9876543210"
    })
}

#[tokio::test]
async fn test_health_and_guest_login() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "disabled");
    assert_eq!(body["redis"], "disabled");

    let (status, body) = send(&app, "POST", "/auth/guest", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let guest_token = body["token"].as_str().unwrap().to_string();
    assert!(body["user_id"].as_str().unwrap().starts_with("guest-"));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/trips/1/seats/3/lock")
        .header("Authorization", format!("Bearer {}", guest_token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_unreachable_redis() {
    let redis = RedisClient::new("redis://127.0.0.1:1").await.unwrap();
    let app = app(base_state(SeatSettings::default()).with_redis(Some(Arc::new(redis))));

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["redis"], "unavailable");
    assert_eq!(body["database"], "disabled");
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = test_app();
    let (status, body) = send(&app, "POST", "/v1/trips/1/seats/7/lock", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/trips/1/seats/7/lock")
        .header("Authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::UNAUTHORIZED);

    // The seat map itself is public.
    let (status, body) = send(&app, "GET", "/v1/trips/1/seats", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_seats"], 40);
    assert_eq!(body["available_seats"], 40);
}

#[tokio::test]
async fn test_lock_and_unlock_rules() {
    let app = test_app();

    let (status, grant) = send(&app, "POST", "/v1/trips/1/seats/7/lock", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grant["seat_number"], 7);
    assert!(grant["expires_at"].is_string());

    let (status, body) = send(&app, "POST", "/v1/trips/1/seats/7/lock", Some("bob"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "seat held by another user");

    let (status, _) = send(&app, "POST", "/v1/trips/1/seats/7/unlock", Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", "/v1/trips/1/seats/7/unlock", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["released"], true);

    let (status, body) = send(&app, "POST", "/v1/trips/1/seats/7/unlock", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["released"], false);
    assert_eq!(body["message"], "No action taken");

    let (status, _) = send(&app, "POST", "/v1/trips/1/seats/41/lock", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "POST", "/v1/trips/9/seats/1/lock", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_flow() {
    let app = test_app();
    for seat in [1, 2] {
        let (status, _) = send(&app, "POST", &format!("/v1/trips/1/seats/{}/lock", seat), Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    // Seat 3 was never locked: nothing is booked.
    let (status, body) = send(&app, "POST", "/v1/bookings", Some("alice"), Some(booking_request(&[1, 2, 3]))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "seat 3 is not held by you");

    send(&app, "POST", "/v1/trips/1/seats/3/lock", Some("alice"), None).await;
    let (status, booking) = send(&app, "POST", "/v1/bookings", Some("alice"), Some(booking_request(&[3, 1, 2]))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["seat_numbers"], json!([1, 2, 3]));
    assert_eq!(booking["status"], "CONFIRMED");
    let number = booking["booking_number"].as_str().unwrap().to_string();
    assert!(number.starts_with("ABC-"));
    assert_eq!(number.len(), 10);

    let (status, mine) = send(&app, "GET", "/v1/bookings/mine", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, found) = send(&app, "GET", &format!("/v1/bookings/{}", number), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["booking_number"], number.as_str());
    let (status, _) = send(&app, "GET", &format!("/v1/bookings/{}", number), Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, snapshot) = send(&app, "GET", "/v1/trips/1/seats", None, None).await;
    assert_eq!(snapshot["booked_seats"], json!([1, 2, 3]));
    assert_eq!(snapshot["locked_count"], 0);

    let (status, body) = send(&app, "POST", "/v1/trips/1/seats/2/lock", Some("bob"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "seat booked");
}

#[tokio::test]
async fn test_booking_validation() {
    let app = test_app();
    send(&app, "POST", "/v1/trips/1/seats/5/lock", Some("alice"), None).await;

    let mut request = booking_request(&[5]);
    request["age"] = json!(0);
    let (status, _) = send(&app, "POST", "/v1/bookings", Some("alice"), Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/v1/bookings", Some("alice"), Some(booking_request(&[]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/v1/bookings", Some("alice"), Some(booking_request(&[1, 2, 3, 4, 5, 6, 7]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_release_all() {
    let app = test_app();
    for seat in [10, 11, 12] {
        send(&app, "POST", &format!("/v1/trips/1/seats/{}/lock", seat), Some("alice"), None).await;
    }
    let (status, body) = send(&app, "POST", "/v1/trips/1/locks/release", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["released"], json!([10, 11, 12]));

    let (status, _) = send(&app, "POST", "/v1/trips/1/seats/11/lock", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_stream_starts_with_initial_state() {
    let app = test_app();
    send(&app, "POST", "/v1/trips/1/seats/9/lock", Some("alice"), None).await;

    let request = Request::builder()
        .uri(format!("/v1/trips/1/stream?access_token={}", token("bob")))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let mut body = response.into_body().into_data_stream();
    let mut text = String::new();
    while !text.contains("\n\n") {
        let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .expect("no initial event")
            .expect("stream ended")
            .unwrap();
        text.push_str(&String::from_utf8_lossy(&chunk));
    }

    assert!(text.starts_with("event: INITIAL_STATE"));
    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap();
    let initial: Value = serde_json::from_str(data).unwrap();
    assert_eq!(initial["type"], "INITIAL_STATE");
    assert_eq!(initial["locked_seats"], json!([{ "seat_number": 9, "user_id": "alice" }]));

    // Live events follow on the same stream.
    send(&app, "POST", "/v1/trips/1/seats/10/lock", Some("carol"), None).await;
    let mut text = String::new();
    while !text.contains("\n\n") {
        let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .expect("no live event")
            .expect("stream ended")
            .unwrap();
        text.push_str(&String::from_utf8_lossy(&chunk));
    }
    assert!(text.starts_with("event: SEAT_LOCKED"));
    assert!(text.contains("\"seat_number\":10"));
}

#[tokio::test]
async fn test_lagging_stream_is_closed() {
    let app = test_app_with(SeatSettings {
        channel_capacity: 2,
        ..SeatSettings::default()
    });

    let request = Request::builder()
        .uri(format!("/v1/trips/1/stream?access_token={}", token("bob")))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut body = response.into_body().into_data_stream();

    let mut text = String::new();
    while !text.contains("\n\n") {
        let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .expect("no initial event")
            .expect("stream ended")
            .unwrap();
        text.push_str(&String::from_utf8_lossy(&chunk));
    }
    assert!(text.starts_with("event: INITIAL_STATE"));

    // More events than the channel buffers while nobody reads.
    for seat in 1..=5 {
        let (status, _) = send(&app, "POST", &format!("/v1/trips/1/seats/{}/lock", seat), Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let ended = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(chunk) = body.next().await {
            chunk.unwrap();
        }
    })
    .await;
    assert!(ended.is_ok(), "lagging stream was not closed");
}
