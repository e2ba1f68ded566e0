//! REST API handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use prometheus::{IntGauge, Opts, Registry, TextEncoder};
use serde_json::Value;

use super::types::{ErrorResponse, ListSessionsResponse, SessionSummary};
use crate::error::ProxyError;
use crate::handler::{CommandHandler, Request};
use crate::session::SessionRegistry;
use crate::state::StateProvider;
use crate::Result;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub handler: CommandHandler,
    pub metrics: Registry,
    sessions_active: IntGauge,
}

impl AppState {
    /// Build the application state around an existing handler.
    ///
    /// Registers the process state collector (optionally labelled with the
    /// instance UUID) and the active sessions gauge.
    pub fn new(handler: CommandHandler, include_uuid: bool) -> Result<Self> {
        let metrics = Registry::new();
        metrics.register(Box::new(handler.state().metrics_collector(include_uuid)?))?;

        let sessions_active = IntGauge::with_opts(
            Opts::new("sessions_active", "Number of active logical sessions.")
                .namespace("proxy_core"),
        )?;
        metrics.register(Box::new(sessions_active.clone()))?;

        Ok(Self {
            handler,
            metrics,
            sessions_active,
        })
    }

    /// In-memory state and a default session registry.
    pub fn in_memory() -> Result<Self> {
        let handler = CommandHandler::new(
            Arc::new(StateProvider::new(None)),
            Arc::new(SessionRegistry::new()),
        );
        Self::new(handler, true)
    }

    pub fn state(&self) -> &Arc<StateProvider> {
        self.handler.state()
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        self.handler.sessions()
    }
}

fn error_status(err: &ProxyError) -> StatusCode {
    match err {
        ProxyError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
        ProxyError::CommandNotFound(_) => StatusCode::NOT_FOUND,
        ProxyError::TelemetryLocked => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: ProxyError) -> ApiError {
    (error_status(&err), Json(ErrorResponse::from(&err)))
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "name": "proxy-core",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "uuid": state.state().get().uuid,
    }))
}

/// Run a command document.
pub async fn run_command(
    State(state): State<AppState>,
    Json(document): Json<Value>,
) -> std::result::Result<Json<Value>, ApiError> {
    let req = Request::new(document).map_err(api_error)?;

    let reply = state.handler.handle(&req).map_err(|e| {
        tracing::debug!(command = req.command_name(), "Command failed: {}", e);
        api_error(e)
    })?;

    Ok(Json(reply))
}

/// List active sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Json<ListSessionsResponse> {
    let sessions: Vec<_> = state
        .sessions()
        .list()
        .iter()
        .map(SessionSummary::from_record)
        .collect();

    Json(ListSessionsResponse {
        count: sessions.len(),
        idle_timeout_secs: state.sessions().idle_timeout().as_secs(),
        sessions,
    })
}

/// Prometheus metrics in text exposition format.
pub async fn metrics(
    State(state): State<AppState>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    state.sessions_active.set(state.sessions().len() as i64);

    let body = TextEncoder::new()
        .encode_to_string(&state.metrics.gather())
        .map_err(|e| api_error(e.into()))?;

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

/// Debug dump of the process state.
pub async fn debug_vars(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.state().debug_var().to_string(),
    )
}
