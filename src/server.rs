//! HTTP surface: routes, CORS and JSON error responses.

use crate::pipeline;
use crate::request::RenderRequest;
use crate::{Error, Launcher, ServiceConfig, SourceKind};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use log::{error, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// How long browsers may cache a CORS preflight answer
pub const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Immutable state shared by all requests
pub struct AppState<L: Launcher> {
    pub config: ServiceConfig,
    pub launcher: L,
}

type SharedState<L> = Arc<AppState<L>>;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// An error on its way out of a handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                message: message.into(),
                error: None,
                details: Vec::new(),
            },
        }
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.body.error = Some(error.into());
        self
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match err {
            Error::Unauthorized => Self::new(status, "Invalid API Key"),
            Error::Validation { message, details } => {
                let mut api = Self::new(status, message);
                if !details.is_empty() {
                    api = api.with_error("HTML/CSS syntax errors detected");
                    api.body.details = details;
                }
                api
            }
            Error::ContentLoad { source_kind, reason } => {
                let message = match source_kind {
                    SourceKind::Url => "Failed to load the website",
                    SourceKind::Markup => "Invalid HTML content or timeout",
                };
                Self::new(status, message).with_error(reason)
            }
            other => {
                error!("Screenshot generation error: {}", other);
                Self::new(status, "Failed to generate screenshot").with_error(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid request body").with_error(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthBody {
    message: &'static str,
    status: &'static str,
    timestamp: String,
}

async fn health() -> impl IntoResponse {
    Json(HealthBody {
        message: "HTML & CSS Screenshot Generator API is running",
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

fn cache_control(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Url => "public, max-age=3600",
        SourceKind::Markup => "no-cache, no-store, must-revalidate",
    }
}

/// `POST` handler: validate, render on the blocking pool, answer with PNG bytes
async fn render<L: Launcher>(
    State(state): State<SharedState<L>>,
    body: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;
    let validated = request
        .validate(&state.config.api_key, state.config.strict_markup)
        .inspect_err(|e| warn!("rejected render request: {}", e))?;

    let worker = Arc::clone(&state);
    let shot = tokio::task::spawn_blocking(move || pipeline::render(&worker.launcher, &worker.config, validated))
        .await
        .map_err(|e| Error::Internal(format!("render task failed: {}", e)))??;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(header::CONTENT_LENGTH, shot.len())
        .header(header::CACHE_CONTROL, cache_control(shot.source_kind))
        .body(Body::from(shot.png))
        .map_err(|e| Error::Internal(format!("failed to build response: {}", e)))?;
    Ok(response)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(PREFLIGHT_MAX_AGE)
}

/// Build the service router.
///
/// `/api/screenshot` and `/api/capture` both accept markup or URL requests;
/// `/healthz` only answers `GET`.
pub fn router<L: Launcher>(state: AppState<L>) -> Router {
    let shared = Arc::new(state);

    let endpoint = || {
        post(render::<L>)
            .get(health)
            .options(preflight)
            .fallback(method_not_allowed)
    };

    Router::new()
        .route("/api/screenshot", endpoint())
        .route("/api/capture", endpoint())
        .route("/healthz", get(health).fallback(method_not_allowed))
        .layer(cors_layer())
        .with_state(shared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_details_are_carried() {
        let api = ApiError::from(Error::Validation {
            message: "Code validation failed".into(),
            details: vec!["Missing <head> section".into()],
        });
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.body.error.as_deref(), Some("HTML/CSS syntax errors detected"));
        assert_eq!(api.body.details.len(), 1);
    }

    #[test]
    fn empty_fields_are_omitted() {
        let api = ApiError::from(Error::Unauthorized);
        let json = serde_json::to_value(&api.body).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Invalid API Key" }));
    }

    #[test]
    fn content_load_wording_depends_on_source() {
        let url = ApiError::from(Error::ContentLoad { source_kind: SourceKind::Url, reason: "dns".into() });
        assert_eq!(url.body.message, "Failed to load the website");
        assert_eq!(url.body.error.as_deref(), Some("dns"));

        let markup = ApiError::from(Error::ContentLoad { source_kind: SourceKind::Markup, reason: "t".into() });
        assert_eq!(markup.body.message, "Invalid HTML content or timeout");
    }

    #[test]
    fn internal_errors_are_500() {
        let api = ApiError::from(Error::Initialization("no chrome".into()));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.message, "Failed to generate screenshot");
    }
}
