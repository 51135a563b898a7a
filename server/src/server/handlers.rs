//! HTTP request handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::server::state::ServerState;
use crate::utils::version_info;
use crate::webhook::gate::{self, GateDecision};

/// Signature header sent by the hosting service
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Event-type header sent by the hosting service
pub const EVENT_HEADER: &str = "x-github-event";

/// Webhook acknowledgement body
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub message: String,
}

/// Webhook handler
///
/// Verifies the delivery signature before anything else, then filters by
/// event type, project, and branch. An accepted push is acknowledged
/// immediately; the deploy run executes in the background and its outcome
/// is only visible in the per-run log.
pub async fn webhook_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if !state.verifier.verify(&body, signature) {
        info!("Invalid webhook signature");
        return (
            StatusCode::UNAUTHORIZED,
            Json(WebhookResponse {
                status: "rejected",
                message: "Invalid signature".to_string(),
            }),
        );
    }

    let event = headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    match gate::evaluate(event, &body, &state.config) {
        GateDecision::Accept { project, config } => {
            state.dispatcher.dispatch(&project, config).await;
            (
                StatusCode::OK,
                Json(WebhookResponse {
                    status: "accepted",
                    message: format!("Deploying {}", project),
                }),
            )
        }
        GateDecision::IgnoredEvent { event } => (
            StatusCode::OK,
            Json(WebhookResponse {
                status: "ignored",
                message: format!("Ignored event: {}", event),
            }),
        ),
        GateDecision::InvalidPayload { reason } => {
            info!("Unparseable push payload: {}", reason);
            (
                StatusCode::BAD_REQUEST,
                Json(WebhookResponse {
                    status: "invalid",
                    message: "Invalid push payload".to_string(),
                }),
            )
        }
        GateDecision::UnknownProject { repo } => {
            info!("No config found for repo: {}", repo);
            (
                StatusCode::OK,
                Json(WebhookResponse {
                    status: "ignored",
                    message: format!("No config for repo: {}", repo),
                }),
            )
        }
        GateDecision::BranchMismatch { branch, configured } => {
            info!("Ignoring push to {} (configured: {})", branch, configured);
            (
                StatusCode::OK,
                Json(WebhookResponse {
                    status: "ignored",
                    message: format!("Ignored branch: {}", branch),
                }),
            )
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "shipgate".to_string(),
        version: version.version,
    })
}
