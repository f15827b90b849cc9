//! HTTP API server.
//!
//! `POST /query` answers a question; `GET /health` reports liveness.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VidyaError;
use crate::tutor::Tutor;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidya doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    for key in preflight::missing_enrichment_keys(&settings) {
        Output::warning(&format!("{} not set; the matching enrichment field will be null.", key));
    }

    let tutor = Arc::new(Tutor::from_settings(&settings)?);
    let app = router(tutor);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Vidya API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query", "POST /query");
    println!();
    Output::info("Press Ctrl+C to stop the server.");
    info!("Serving on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router around a shared tutor.
pub fn router(tutor: Arc<Tutor>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/query", post(query))
        .layer(cors)
        .with_state(tutor)
}

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { detail })).into_response()
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
    State(tutor): State<Arc<Tutor>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    match tutor.answer(&req.question).await {
        Ok(response) => Json(response).into_response(),
        Err(VidyaError::InvalidInput(detail)) => error_response(StatusCode::BAD_REQUEST, detail),
        Err(e) => {
            error!("Query failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
