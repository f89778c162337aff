//! HTTP Controller (Driver Adapter)
//!
//! Axum REST front end. Every route wraps its input into a command document,
//! hands it to the engine through the [`CommandBridge`], and returns the
//! engine's response document unchanged.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::Value;

use crate::application::dto::{CommandAction, CommandEnvelope};
use crate::application::ports::ChannelError;
use crate::infrastructure::channel::CommandBridge;

use super::response::{BridgeFailure, HealthResponse, ServiceInfoResponse};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Sending half of the engine's command channel.
    pub bridge: CommandBridge,
    /// Application version.
    pub version: String,
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/order", post(place_order))
        .route("/order/{ticket}", delete(delete_order))
        .route("/position/{ticket}", delete(close_position))
        .route("/positions", get(positions))
        .route("/orders", get(orders))
        .route("/stats", get(stats))
        .route("/safe-shutdown", post(safe_shutdown))
        .with_state(state)
}

async fn service_info() -> impl IntoResponse {
    Json(ServiceInfoResponse {
        status: "online".to_string(),
        service: "split-order-engine".to_string(),
    })
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

async fn place_order(
    State(state): State<AppState>,
    Json(order): Json<Value>,
) -> Result<Json<Value>, BridgeFailure> {
    forward(
        &state,
        CommandEnvelope::with_data(CommandAction::PlaceOrder, order),
    )
    .await
}

async fn delete_order(
    State(state): State<AppState>,
    Path(ticket): Path<u64>,
) -> Result<Json<Value>, BridgeFailure> {
    forward(
        &state,
        CommandEnvelope::for_ticket(CommandAction::DeleteOrder, ticket),
    )
    .await
}

async fn close_position(
    State(state): State<AppState>,
    Path(ticket): Path<u64>,
) -> Result<Json<Value>, BridgeFailure> {
    forward(
        &state,
        CommandEnvelope::for_ticket(CommandAction::ClosePosition, ticket),
    )
    .await
}

async fn positions(State(state): State<AppState>) -> Result<Json<Value>, BridgeFailure> {
    forward(&state, CommandEnvelope::bare(CommandAction::GetPositions)).await
}

async fn orders(State(state): State<AppState>) -> Result<Json<Value>, BridgeFailure> {
    forward(&state, CommandEnvelope::bare(CommandAction::GetOrders)).await
}

async fn stats(State(state): State<AppState>) -> Result<Json<Value>, BridgeFailure> {
    forward(&state, CommandEnvelope::bare(CommandAction::GetStats)).await
}

async fn safe_shutdown(State(state): State<AppState>) -> Result<Json<Value>, BridgeFailure> {
    forward(&state, CommandEnvelope::bare(CommandAction::SafeShutdown)).await
}

async fn forward(
    state: &AppState,
    envelope: CommandEnvelope,
) -> Result<Json<Value>, BridgeFailure> {
    let action = envelope.action.clone();
    let body = state.bridge.send(&envelope).await.map_err(|e| {
        tracing::warn!(action = %action, error = %e, "Engine did not answer");
        BridgeFailure(e)
    })?;
    let document =
        serde_json::from_str(&body).map_err(|e| ChannelError::Malformed(e.to_string()))?;
    Ok(Json(document))
}
