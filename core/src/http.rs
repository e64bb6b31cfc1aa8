use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::{ApiError, StartupError};
use crate::ml::InputSchema;
use crate::scorer::Scorer;
use crate::types::{BatchRequest, BatchResponse, CustomerRecord, ScoredResult};

/// Read-only state shared by every handler. Built once at startup.
#[derive(Clone)]
pub struct ApiState {
    pub schema: Arc<InputSchema>,
    pub scorer: Arc<Scorer>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    threshold: f64,
    n_required_cols: usize,
}

pub fn router(state: ApiState, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schema/input_columns", get(input_columns))
        .route("/predict", post(predict))
        .route("/predict_batch", post(predict_batch))
        .with_state(state)
        .layer(cors_layer(cors_origin))
}

pub async fn serve<F>(
    addr: &str,
    state: ApiState,
    cors_origin: &str,
    shutdown: F,
) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state, cors_origin);

    let addr: SocketAddr = addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        threshold: state.scorer.threshold(),
        n_required_cols: state.schema.required.len(),
    })
}

async fn input_columns(State(state): State<ApiState>) -> Json<InputSchema> {
    Json(state.schema.as_ref().clone())
}

async fn predict(
    State(state): State<ApiState>,
    payload: Result<Json<CustomerRecord>, JsonRejection>,
) -> Result<Json<ScoredResult>, ApiError> {
    let Json(record) = payload.map_err(invalid_input)?;

    let results = score_records(&state, &[record])?;
    results
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::InvalidInput("model returned no score".to_string()))
}

async fn predict_batch(
    State(state): State<ApiState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(batch) = payload.map_err(invalid_input)?;

    let results = score_records(&state, &batch.items)?;
    Ok(Json(BatchResponse { results }))
}

fn score_records(
    state: &ApiState,
    records: &[CustomerRecord],
) -> Result<Vec<ScoredResult>, ApiError> {
    let table = state.schema.normalize(records);
    let scores = state.scorer.score(&table)?;
    Ok(state.scorer.results(&scores))
}

fn invalid_input(rejection: JsonRejection) -> ApiError {
    ApiError::InvalidInput(rejection.body_text())
}

/// `*` allows any origin, otherwise a comma-separated list.
fn cors_layer(allowed: &str) -> CorsLayer {
    let origin = if allowed.trim() == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            allowed
                .split(',')
                .map(str::trim)
                .filter(|origin| *origin != "*")
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
