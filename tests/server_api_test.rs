#![cfg(feature = "server")]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use trip_planner::adapters::{build_registry, KeywordInterpreter};
use trip_planner::app::server::{router, AppState};
use trip_planner::domain::agent_card::AgentCard;
use trip_planner::{OrchestrationEngine, PlannerConfig};

async fn car_agent() -> MockServer {
    let server = MockServer::start_async().await;
    let card = json!({
        "agentId": "car-rental-004",
        "displayName": "DriveAway Car Rentals",
        "endpointUrl": server.base_url(),
        "capabilities": [{"capabilityId": "searchCars"}, {"capabilityId": "bookCar"}]
    });
    server
        .mock_async(|when, then| {
            when.method(GET).path("/agent-card");
            then.status(200).json_body(card);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/searchCars").body_contains("\"carType\":\"Suv\"");
            then.status(200)
                .json_body(json!({"cars": [{"carId": "CAR-SUV-1", "type": "SUV"}]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/bookCar").body_contains("CAR-SUV-1");
            then.status(200)
                .json_body(json!({"bookingId": "CAR-4411", "status": "Confirmed"}));
        })
        .await;
    server
}

async fn app(agent: &MockServer) -> axum::Router {
    let mut config = PlannerConfig::default();
    config.discovery.agents = vec![agent.base_url()];

    let client = reqwest::Client::new();
    let registry = build_registry(&config, &client).await;
    let engine = OrchestrationEngine::new(
        Arc::new(KeywordInterpreter::new().unwrap()),
        Arc::new(registry),
        config,
    );
    router(Arc::new(AppState {
        engine,
        agent_card: AgentCard::planner("http://127.0.0.1:5000"),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_plan_trip_over_http_books_suv() {
    let agent = car_agent().await;
    let request = Request::builder()
        .method("POST")
        .uri("/planTrip")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"query": "I need a rental SUV in Auckland on 2026-12-20"}).to_string(),
        ))
        .unwrap();

    let (status, body) = send(app(&agent).await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Success");
    assert_eq!(body["summary"], "Successfully booked: Car Rental.");
    assert_eq!(body["details"]["carRentalBookingId"], "CAR-4411");
    assert_eq!(body["details"]["flightBookingId"], Value::Null);
    assert_eq!(body["details"]["errors"], json!([]));
}

#[tokio::test]
async fn test_request_for_undiscovered_service_fails_per_service() {
    let agent = car_agent().await;
    let request = Request::builder()
        .method("POST")
        .uri("/planTrip")
        .header("content-type", "application/json")
        .body(Body::from(json!({"query": "book a hotel in Auckland"}).to_string()))
        .unwrap();

    let (status, body) = send(app(&agent).await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Failed");
    assert_eq!(body["summary"], "Booking failed for all requested services.");
    assert_eq!(body["details"]["errors"][0]["serviceKind"], "Hotel");
    assert_eq!(body["details"]["errors"][0]["errorKind"], "UnknownCapability");
}

#[tokio::test]
async fn test_health_reports_version() {
    let agent = car_agent().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(app(&agent).await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
