use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use wayfarer_agents::{AgentConfig, CompletionModel, OpenAiModel, TravelDesk};
use wayfarer_core::{DomainKind, RequestError, TravelRequest};
use wayfarer_observability::AppMetrics;

const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8501";

pub struct ApiState<M> {
    pub desk: Arc<TravelDesk<M>>,
    pub metrics: Arc<AppMetrics>,
    pub allowed_origins: Arc<Vec<String>>,
}

impl<M> Clone for ApiState<M> {
    fn clone(&self) -> Self {
        Self {
            desk: Arc::clone(&self.desk),
            metrics: Arc::clone(&self.metrics),
            allowed_origins: Arc::clone(&self.allowed_origins),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: wayfarer_observability::MetricsSnapshot,
    services: serde_json::Value,
}

pub fn build_app() -> Result<Router> {
    let metrics = AppMetrics::shared();
    let config = AgentConfig::from_env();

    let model = OpenAiModel::new(config.model.clone()).context("failed to initialize model client")?;
    if !model.is_configured() {
        warn!("no OpenAI API key configured; recommendations will come back empty");
    }

    let desk = TravelDesk::new(Arc::new(model), &config, metrics.clone())
        .context("failed to wire recommendation services")?;

    let state = ApiState {
        desk: Arc::new(desk),
        metrics,
        allowed_origins: Arc::new(parse_allowed_origins(
            env::var("WAYFARER_ALLOWED_ORIGINS").ok().as_deref(),
        )),
    };

    Ok(build_router(state))
}

pub fn build_router<M>(state: ApiState<M>) -> Router
where
    M: CompletionModel + 'static,
{
    Router::new()
        .route("/health", get(health::<M>))
        .route("/run", post(plan::<M>))
        .route("/run/flights", post(run_flights::<M>))
        .route("/run/lodging", post(run_lodging::<M>))
        .route("/run/stay", post(run_lodging::<M>))
        .route("/run/activities", post(run_activities::<M>))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state)
}

async fn health<M>(State(state): State<ApiState<M>>) -> impl IntoResponse
where
    M: CompletionModel + 'static,
{
    let coordinator = state.desk.coordinator();
    let services = DomainKind::ALL
        .iter()
        .map(|kind| {
            (
                kind.as_code().to_string(),
                json!(coordinator.client(*kind).describe()),
            )
        })
        .collect::<serde_json::Map<_, _>>();

    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        services: serde_json::Value::Object(services),
    };
    (StatusCode::OK, Json(payload))
}

async fn plan<M>(State(state): State<ApiState<M>>, Json(request): Json<TravelRequest>) -> Response
where
    M: CompletionModel + 'static,
{
    if let Err(err) = request.validate() {
        return invalid_request(err);
    }

    let plan = state.desk.coordinator().plan(&request).await;
    if plan.is_empty() {
        info!(destination = %request.destination, "no recommendations in any category");
    }
    (StatusCode::OK, Json(plan.to_envelope())).into_response()
}

async fn run_flights<M>(state: State<ApiState<M>>, request: Json<TravelRequest>) -> Response
where
    M: CompletionModel + 'static,
{
    recommend(state, DomainKind::Flights, request).await
}

async fn run_lodging<M>(state: State<ApiState<M>>, request: Json<TravelRequest>) -> Response
where
    M: CompletionModel + 'static,
{
    recommend(state, DomainKind::Lodging, request).await
}

async fn run_activities<M>(state: State<ApiState<M>>, request: Json<TravelRequest>) -> Response
where
    M: CompletionModel + 'static,
{
    recommend(state, DomainKind::Activities, request).await
}

async fn recommend<M>(
    State(state): State<ApiState<M>>,
    kind: DomainKind,
    Json(request): Json<TravelRequest>,
) -> Response
where
    M: CompletionModel + 'static,
{
    if let Err(err) = request.validate() {
        return invalid_request(err);
    }

    let body = state.desk.agent(kind).reply(&request).await;
    (StatusCode::OK, Json(body)).into_response()
}

fn invalid_request(err: RequestError) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "error": "invalid_request",
            "message": err.to_string(),
        })),
    )
        .into_response()
}

fn parse_allowed_origins(raw: Option<&str>) -> Vec<String> {
    let origins = raw
        .unwrap_or_default()
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        vec![DEFAULT_ALLOWED_ORIGIN.to_string()]
    } else {
        origins
    }
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN)]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
