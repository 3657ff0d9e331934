use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use sautii_core::{FilterSpec, SautiiError, SearchRequest};
use sautii_search::SearchEngine;
use sautii_storage::IssueStore;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod metrics;

#[derive(Clone)]
pub struct AppState {
    engine: SearchEngine<dyn IssueStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn IssueStore>) -> Self {
        Self {
            engine: SearchEngine::new(store),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .route("/api/issues", get(search_query))
        .route("/api/issues/:id", get(get_issue))
        .route("/api/search/issues", post(search_body))
        .route("/api/search/facets", get(facets_query).post(facets_body))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn error_response(e: &SautiiError) -> Response {
    let status = match e {
        SautiiError::NotFound => StatusCode::NOT_FOUND,
        SautiiError::Invalid(_) => StatusCode::BAD_REQUEST,
        SautiiError::Store(_) | SautiiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": e.to_string()}))).into_response()
}

fn bad_body(rejection: JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": format!("invalid request body: {}", rejection.body_text())})),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_text() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    let _ = encoder.encode(&metric_families, &mut buf);
    (StatusCode::OK, String::from_utf8(buf).unwrap_or_default())
}

async fn run_search(app: &AppState, endpoint: &'static str, spec: FilterSpec) -> Response {
    metrics::SEARCH_REQUESTS_TOTAL
        .with_label_values(&[endpoint])
        .inc();
    let _timer = metrics::SEARCH_DURATION_SEC
        .with_label_values(&[endpoint])
        .start_timer();
    match app.engine.search(&spec).await {
        Ok(result) => {
            metrics::SEARCH_MATCHED.observe(result.total as f64);
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            metrics::SEARCH_FAILURES_TOTAL
                .with_label_values(&[endpoint])
                .inc();
            tracing::error!(endpoint, error = %e, "search failed");
            error_response(&e)
        }
    }
}

async fn run_facets(app: &AppState, endpoint: &'static str, spec: FilterSpec) -> Response {
    metrics::SEARCH_REQUESTS_TOTAL
        .with_label_values(&[endpoint])
        .inc();
    let _timer = metrics::SEARCH_DURATION_SEC
        .with_label_values(&[endpoint])
        .start_timer();
    match app.engine.facets(&spec).await {
        Ok(facets) => (StatusCode::OK, Json(facets)).into_response(),
        Err(e) => {
            metrics::SEARCH_FAILURES_TOTAL
                .with_label_values(&[endpoint])
                .inc();
            tracing::error!(endpoint, error = %e, "facet search failed");
            error_response(&e)
        }
    }
}

async fn search_query(
    State(app): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let spec = FilterSpec::from_request(SearchRequest::from_pairs(pairs));
    run_search(&app, "search_query", spec).await
}

async fn search_body(
    State(app): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(req)) => run_search(&app, "search_body", FilterSpec::from_request(req)).await,
        Err(rejection) => bad_body(rejection),
    }
}

async fn facets_query(
    State(app): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let spec = FilterSpec::from_request(SearchRequest::from_pairs(pairs));
    run_facets(&app, "facets_query", spec).await
}

async fn facets_body(
    State(app): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(req)) => run_facets(&app, "facets_body", FilterSpec::from_request(req)).await,
        Err(rejection) => bad_body(rejection),
    }
}

async fn get_issue(State(app): State<AppState>, Path(id): Path<String>) -> Response {
    match app.engine.store().get(&id).await {
        Ok(issue) => (StatusCode::OK, Json(issue)).into_response(),
        Err(e) => error_response(&e),
    }
}
