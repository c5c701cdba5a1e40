//! Routes for the Visitor Statistics bounded context.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use epri_core::error::DomainError;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use epri_visitor_stats::application::query_handlers::{self, SiteStatsView};
use epri_visitor_stats::application::{command_handlers, session_issuer};
use epri_visitor_stats::domain::commands;

use crate::error::ApiError;
use crate::middleware::admin::require_admin;
use crate::state::AppState;

/// Request body for POST /track.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisitRequest {
    /// The client's session id. Required; checked by the handler so a missing
    /// value yields a 400 with a readable message.
    pub session_id: Option<String>,
    /// The visited page. Defaults to `/`.
    pub page_path: Option<String>,
}

/// Response body for POST /track.
#[derive(Debug, Serialize)]
pub struct TrackVisitResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable outcome.
    pub message: &'static str,
    /// Whether a new visit was recorded.
    pub tracked: bool,
}

/// Response body wrapping the site statistics.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Always `true`.
    pub success: bool,
    /// Current counters.
    pub data: SiteStatsView,
}

/// Response body for GET /session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Always `true`.
    pub success: bool,
    /// Newly issued session id.
    pub session_id: String,
}

/// Response body for POST /reset.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable outcome.
    pub message: &'static str,
}

/// POST /track
#[instrument(skip(state, payload))]
async fn track_visit(
    State(state): State<AppState>,
    payload: Result<Json<TrackVisitRequest>, JsonRejection>,
) -> Result<Json<TrackVisitResponse>, ApiError> {
    let Json(request) = payload
        .map_err(|rejection| ApiError::from_json_rejection(&rejection, state.expose_error_detail))?;

    let command = commands::TrackVisit {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
        page_path: request.page_path,
    };

    info!(correlation_id = %command.correlation_id, "handling track_visit command");

    let result = command_handlers::handle_track_visit(
        &command,
        state.clock.as_ref(),
        &*state.visit_repository,
    )
    .await
    .map_err(state.fail("Failed to track visit"))?;

    Ok(Json(TrackVisitResponse {
        success: true,
        message: "Visit tracked successfully",
        tracked: result.tracked,
    }))
}

/// GET /stats
#[instrument(skip(state))]
async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let data = query_handlers::get_site_stats(state.clock.as_ref(), &*state.visit_repository)
        .await
        .map_err(state.fail("Failed to get visitor stats"))?;

    Ok(Json(StatsResponse {
        success: true,
        data,
    }))
}

/// GET /session
#[instrument(skip(state))]
async fn issue_session(State(state): State<AppState>) -> Result<Json<SessionResponse>, ApiError> {
    let issued = match state.entropy.lock() {
        Ok(mut entropy) => session_issuer::issue_session_id(&mut *entropy),
        Err(_) => Err(DomainError::Infrastructure(
            "entropy source lock poisoned".into(),
        )),
    };
    let session_id = issued.map_err(state.fail("Failed to generate session ID"))?;

    Ok(Json(SessionResponse {
        success: true,
        session_id,
    }))
}

/// POST /reset
#[instrument(skip(state))]
async fn reset_counters(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    let command = commands::ResetCounters {
        correlation_id: Uuid::new_v4(),
    };

    info!(correlation_id = %command.correlation_id, "handling reset_counters command");

    command_handlers::handle_reset_counters(
        &command,
        state.clock.as_ref(),
        &*state.visit_repository,
    )
    .await
    .map_err(state.fail("Failed to reset counter"))?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Counter reset successfully",
    }))
}

/// POST /reconcile
#[instrument(skip(state))]
async fn reconcile_counters(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let command = commands::ReconcileCounters {
        correlation_id: Uuid::new_v4(),
    };

    info!(correlation_id = %command.correlation_id, "handling reconcile_counters command");

    let stats = command_handlers::handle_reconcile_counters(
        &command,
        state.clock.as_ref(),
        &*state.visit_repository,
    )
    .await
    .map_err(state.fail("Failed to reconcile counters"))?;

    Ok(Json(StatsResponse {
        success: true,
        data: stats.into(),
    }))
}

/// Returns the router for the visitor statistics context. `/reset` and
/// `/reconcile` sit behind the admin credential check.
pub fn router(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/reset", post(reset_counters))
        .route("/reconcile", post(reconcile_counters))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/track", post(track_visit))
        .route("/stats", get(get_stats))
        .route("/session", get(issue_session))
        .merge(admin)
}
