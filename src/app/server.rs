use crate::app::response::TripResponse;
use crate::config::PlannerConfig;
use crate::core::engine::OrchestrationEngine;
use crate::domain::agent_card::AgentCard;
use crate::domain::intent::{TripIntent, TripRequest};
use crate::utils::error::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub struct AppState {
    pub engine: OrchestrationEngine<PlannerConfig>,
    pub agent_card: AgentCard,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct PlanTripRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub intent: Option<TripIntent>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/planTrip", post(plan_trip))
        .route("/agent-card", get(agent_card))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind_address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!("🚀 Planner listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn bad_request(message: impl Into<String>) -> Response {
    let message = message.into();
    tracing::warn!("⚠️ Rejected /planTrip request: {}", message);
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

async fn plan_trip(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<PlanTripRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(format!("Invalid request body: {}", rejection.body_text())),
    };

    let request = match (body.intent, body.query) {
        (Some(intent), _) => TripRequest::Parsed(intent),
        (None, Some(query)) if !query.trim().is_empty() => TripRequest::Text(query),
        (None, Some(_)) => return bad_request("Query must not be empty"),
        (None, None) => return bad_request("Missing 'query' or 'intent' in request"),
    };

    let result = state.engine.plan_trip(request).await;
    (StatusCode::OK, Json(TripResponse::from(&result))).into_response()
}

async fn agent_card(State(state): State<Arc<AppState>>) -> Json<AgentCard> {
    Json(state.agent_card.clone())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
    })
}
