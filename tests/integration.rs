use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use offer_dispatch::api::rest::router;
use offer_dispatch::config::DispatchSettings;
use offer_dispatch::engine::source::QueuedOfferSource;
use offer_dispatch::models::offer::{GeoPoint, Offer, PaymentMethod, Place};
use offer_dispatch::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

fn setup() -> (axum::Router, Arc<QueuedOfferSource>) {
    let source = Arc::new(QueuedOfferSource::new());
    let state = AppState::new(source.clone(), DispatchSettings::default(), 64);
    (router(Arc::new(state)), source)
}

fn offer(net: u64, ttl_secs: u64) -> Offer {
    let place = |label: &str, lat: f64| Place {
        label: label.to_string(),
        location: GeoPoint { lat, lng: 106.82 },
    };

    Offer {
        id: Uuid::new_v4(),
        pickup: place("Kopi Kenangan Kuningan City", -6.224),
        dropoff: place("Menara Imperium", -6.209),
        order_value: 54_500,
        delivery_fee: 32_000,
        driver_net_earning: net,
        payment_method: PaymentMethod::CardGateway,
        distance_km: 1.7,
        ttl_secs,
        created_at: Utc::now(),
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn register(app: &axum::Router, name: &str) -> String {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/workers", json!({ "name": name })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["worker_id"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn go_online(app: &axum::Router, worker_id: &str) -> StatusCode {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/online",
            json!({ "worker_id": worker_id }),
        ))
        .await
        .unwrap()
        .status()
}

async fn session(app: &axum::Router, worker_id: &str) -> Value {
    let res = app
        .clone()
        .oneshot(get_request(&format!("/session/{worker_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

async fn post_for_worker(
    app: &axum::Router,
    uri: &str,
    worker_id: &str,
) -> axum::response::Response {
    app.clone()
        .oneshot(json_request("POST", uri, json!({ "worker_id": worker_id })))
        .await
        .unwrap()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _source) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["workers"], 0);
    assert_eq!(body["online"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _source) = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("workers_online"));
    assert!(body.contains("offers_presented_total"));
}

#[tokio::test]
async fn register_worker_starts_offline_and_idle() {
    let (app, _source) = setup();
    let worker_id = register(&app, "Budi").await;

    let body = session(&app, &worker_id).await;
    assert_eq!(body["name"], "Budi");
    assert_eq!(body["online"], false);
    assert_eq!(body["state"], "idle");
    assert!(body.get("offer").is_none());
}

#[tokio::test]
async fn register_worker_empty_name_returns_400() {
    let (app, _source) = setup();
    let response = app
        .oneshot(json_request("POST", "/workers", json!({ "name": "  " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_worker_returns_404() {
    let (app, _source) = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";

    let res = post_for_worker(&app, "/online", fake_id).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["kind"], "no_active_session");

    let res = app
        .oneshot(get_request(&format!("/session/{fake_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn full_offer_to_completion_flow() {
    let (app, source) = setup();
    source.push(offer(29_247, 30));
    let worker_id = register(&app, "Budi").await;

    assert_eq!(go_online(&app, &worker_id).await, StatusCode::NO_CONTENT);
    assert_eq!(go_online(&app, &worker_id).await, StatusCode::NO_CONTENT);
    settle().await;

    let body = session(&app, &worker_id).await;
    assert_eq!(body["online"], true);
    assert_eq!(body["state"], "offer_pending");
    assert_eq!(body["seconds_remaining"], 30);
    assert_eq!(body["offer"]["driver_net_earning"], 29_247);
    assert_eq!(body["offer"]["payment_method"], "card_gateway");
    let offer_id = body["offer"]["id"].as_str().unwrap().to_string();

    let res = post_for_worker(&app, &format!("/offers/{offer_id}/accept"), &worker_id).await;
    assert_eq!(res.status(), StatusCode::OK);
    let job = body_json(res).await;
    assert_eq!(job["id"], offer_id);
    assert_eq!(job["phase"], "pickup");
    assert_eq!(job["earnings"]["driver_net_earning"], 29_247);

    let res = post_for_worker(&app, "/offline", &worker_id).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["kind"], "precondition_failed");

    let body = session(&app, &worker_id).await;
    assert_eq!(body["state"], "on_job");
    assert_eq!(body["job"]["phase"], "pickup");

    let advance = format!("/jobs/{offer_id}/advance");
    let res = post_for_worker(&app, &advance, &worker_id).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["phase"], "delivery");

    let res = post_for_worker(&app, &advance, &worker_id).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["phase"], "completed");

    let res = post_for_worker(&app, &advance, &worker_id).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["kind"], "invalid_transition");

    let body = session(&app, &worker_id).await;
    assert_eq!(body["state"], "idle");

    let res = app
        .clone()
        .oneshot(get_request(&format!("/workers/{worker_id}/earnings")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let earnings = body_json(res).await;
    assert_eq!(earnings["completed_jobs"], 1);
    assert_eq!(earnings["total_net_earning"], 29_247);

    let res = post_for_worker(&app, "/offline", &worker_id).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test(start_paused = true)]
async fn reject_then_second_resolution_conflicts() {
    let (app, source) = setup();
    source.push(offer(15_300, 30));
    let worker_id = register(&app, "Sari").await;

    go_online(&app, &worker_id).await;
    settle().await;
    let body = session(&app, &worker_id).await;
    let offer_id = body["offer"]["id"].as_str().unwrap().to_string();

    let reject = format!("/offers/{offer_id}/reject");
    let res = post_for_worker(&app, &reject, &worker_id).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(session(&app, &worker_id).await["state"], "idle");

    let res = post_for_worker(&app, &reject, &worker_id).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["kind"], "already_resolved");
}

#[tokio::test(start_paused = true)]
async fn accepting_expired_offer_returns_410() {
    let (app, source) = setup();
    source.push(offer(24_100, 30));
    let worker_id = register(&app, "Agus").await;

    go_online(&app, &worker_id).await;
    settle().await;
    let body = session(&app, &worker_id).await;
    let offer_id = body["offer"]["id"].as_str().unwrap().to_string();

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(session(&app, &worker_id).await["state"], "idle");

    let res = post_for_worker(&app, &format!("/offers/{offer_id}/accept"), &worker_id).await;
    assert_eq!(res.status(), StatusCode::GONE);
    assert_eq!(body_json(res).await["kind"], "offer_expired");
}

#[tokio::test(start_paused = true)]
async fn location_updates_are_stored_and_validated() {
    let (app, source) = setup();
    source.push(offer(29_247, 30));
    let worker_id = register(&app, "Budi").await;

    go_online(&app, &worker_id).await;
    settle().await;
    let body = session(&app, &worker_id).await;
    let offer_id = body["offer"]["id"].as_str().unwrap().to_string();
    post_for_worker(&app, &format!("/offers/{offer_id}/accept"), &worker_id).await;

    let location = format!("/jobs/{offer_id}/location");
    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &location,
            json!({ "worker_id": worker_id, "location": { "lat": -6.225, "lng": 106.83 } }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let job = body_json(res).await;
    assert_eq!(job["worker_position"]["lat"], -6.225);
    assert_eq!(job["worker_position"]["lng"], 106.83);

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &location,
            json!({ "worker_id": worker_id, "location": { "lat": 95.0, "lng": 106.83 } }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = session(&app, &worker_id).await;
    assert_eq!(body["job"]["worker_position"]["lat"], -6.225);
}

#[tokio::test]
async fn list_workers_reports_every_session() {
    let (app, _source) = setup();
    register(&app, "Budi").await;
    register(&app, "Sari").await;

    let res = app.oneshot(get_request("/workers")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}
