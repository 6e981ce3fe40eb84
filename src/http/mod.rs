//! REST transport for the match-search engine.
//!
//! Router shape follows the service conventions: CORS + trace layers,
//! optional bearer-token auth with an authless mode for local use, and
//! JSON error bodies mapped from the crate error taxonomy.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Db;
use crate::error::{KinmatchError, Result};
use crate::matchsearch::{self, MatchRequest};
use crate::model::RelationshipLabel;
use crate::store::{persons, relations};

/// Check if a port is available by attempting to bind to it
async fn check_port_available(port: u16) -> bool {
    tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .is_ok()
}

/// HTTP server wrapper
pub struct HttpServer {
    state: AppState,
    port: u16,
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    db: Arc<Db>,
    config: Arc<Config>,
    api_key: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    ///
    /// The API key env var must be set unless authless mode is enabled.
    pub fn new(db: Db, config: Config) -> Result<Self> {
        let api_key = if config.http_server.authless {
            String::new()
        } else {
            std::env::var(&config.http_server.api_key_env).map_err(|_| {
                KinmatchError::Config(format!(
                    "Environment variable {} not set. Set it in your .env file or as an \
                     environment variable, or enable authless mode.",
                    config.http_server.api_key_env
                ))
            })?
        };

        let port = config.http_server.port;
        Ok(Self {
            state: AppState {
                db: Arc::new(db),
                config: Arc::new(config),
                api_key,
            },
            port,
        })
    }

    /// Run the HTTP server until the process exits.
    pub async fn run(&self) -> Result<()> {
        let app = self.create_router();
        let addr = format!("127.0.0.1:{}", self.port);

        if !check_port_available(self.port).await {
            return Err(KinmatchError::Config(format!(
                "Port {} is already in use. Stop the other process or change \
                 http_server.port in config.toml.",
                self.port
            )));
        }

        log::info!("Starting kinmatch HTTP server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .await
            .map_err(|e| {
                KinmatchError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("HTTP server error: {}", e),
                ))
            })?;

        Ok(())
    }

    /// Create the axum router
    fn create_router(&self) -> Router {
        let allowed_origins = &self.state.config.http_server.allowed_origins;

        // Restrict CORS to configured origins; allow Any when none are set
        // (local dev / authless mode)
        let cors = if allowed_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<axum::http::HeaderValue> = allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(handle_health))
            .route("/api/search", post(handle_search))
            .route("/api/persons", post(handle_create_person))
            .route("/api/persons/:id", get(handle_get_person))
            .route(
                "/api/persons/:id/relationships",
                get(handle_person_relationships),
            )
            .route("/api/relationships", post(handle_create_relationship))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
            .with_state(self.state.clone())
    }
}

/// Map a crate error onto an HTTP response: not-found and validation
/// failures are client errors, everything else is a logged 500.
fn error_response(err: KinmatchError) -> Response {
    let (status, message) = match &err {
        KinmatchError::PersonNotFound(id) => {
            (StatusCode::NOT_FOUND, format!("Person not found: {}", id))
        }
        KinmatchError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        _ => {
            log::error!("Internal error serving request: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Validate Authorization header unless authless mode is enabled.
fn validate_auth(state: &AppState, headers: &HeaderMap) -> std::result::Result<(), Response> {
    if state.config.http_server.authless {
        return Ok(());
    }

    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "Missing Authorization header",
                    "message": "Use 'Authorization: Bearer <api-key>' header"
                })),
            )
                .into_response()
        })?;

    match auth_header.strip_prefix("Bearer ") {
        Some(provided) if provided == state.api_key => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid API key" })),
        )
            .into_response()),
    }
}

async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "kinmatch",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}

/// POST /api/search
async fn handle_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<MatchRequest>,
) -> Response {
    if let Err(response) = validate_auth(&state, &headers) {
        return response;
    }

    match matchsearch::find_matches(&state.db, &state.config.matching, &request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/persons
async fn handle_create_person(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<persons::NewPerson>,
) -> Response {
    if let Err(response) = validate_auth(&state, &headers) {
        return response;
    }

    match persons::create_person(&state.db, new).await {
        Ok(person) => (StatusCode::CREATED, Json(person)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/persons/:id
async fn handle_get_person(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(person_id): Path<String>,
) -> Response {
    if let Err(response) = validate_auth(&state, &headers) {
        return response;
    }

    match persons::require_person(&state.db, &person_id).await {
        Ok(person) => (StatusCode::OK, Json(person)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/persons/:id/relationships
async fn handle_person_relationships(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(person_id): Path<String>,
) -> Response {
    if let Err(response) = validate_auth(&state, &headers) {
        return response;
    }

    let result = async {
        persons::require_person(&state.db, &person_id).await?;
        relations::related_persons(&state.db, &person_id).await
    }
    .await;

    match result {
        Ok(related) => {
            let body: Vec<_> = related
                .into_iter()
                .map(|(id, label)| {
                    serde_json::json!({ "person_id": id, "relationship": label.as_str() })
                })
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Body for POST /api/relationships
#[derive(Debug, Deserialize)]
struct NewRelationship {
    person_id: String,
    related_person_id: String,
    /// What related_person is to person, e.g. "Father".
    relationship: String,
}

/// POST /api/relationships
async fn handle_create_relationship(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<NewRelationship>,
) -> Response {
    if let Err(response) = validate_auth(&state, &headers) {
        return response;
    }

    let label = match RelationshipLabel::from_str(&new.relationship) {
        Ok(label) => label,
        Err(e) => return error_response(e),
    };

    match relations::add_relationship(&state.db, &new.person_id, &new.related_person_id, label)
        .await
    {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "person_id": new.person_id,
                "related_person_id": new.related_person_id,
                "relationship": label.as_str()
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
