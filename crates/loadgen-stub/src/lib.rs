//! Stub of the delivery-ETA prediction API (JSON + Prometheus)
//!
//! Honors the request/response contract the load driver exercises so runs
//! and tests have something to talk to. Predictions are a fixed formula.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use serde_json::json;

use loadgen_core::record::FEATURE_NAMES;
use loadgen_core::{BatchRequest, DeliveryRecord};

static ENCODER: Lazy<TextEncoder> = Lazy::new(TextEncoder::new);

const REQUESTS_TOTAL: &str = "stub_requests_total";

/// Per-instance request counters, labelled by route and status.
#[derive(Clone)]
pub struct StubMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
}

impl StubMetrics {
    fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let requests_total = IntCounterVec::new(
            Opts::new(REQUESTS_TOTAL, "Requests served by the stub API"),
            &["route", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;
        Ok(Self { registry, requests_total })
    }

    fn hit(&self, route: &str, status: StatusCode) {
        self.requests_total.with_label_values(&[route, status.as_str()]).inc();
    }

    pub fn hits(&self, route: &str, status: u16) -> u64 {
        let status = status.to_string();
        self.requests_total.with_label_values(&[route, status.as_str()]).get()
    }

    /// Requests seen on `route` across every status.
    pub fn route_total(&self, route: &str) -> u64 {
        let mut total = 0.0;
        for family in self.registry.gather() {
            if family.get_name() != REQUESTS_TOTAL { continue; }
            for metric in family.get_metric() {
                let on_route = metric.get_label().iter().any(|l| l.get_name() == "route" && l.get_value() == route);
                if on_route { total += metric.get_counter().get_value(); }
            }
        }
        total as u64
    }

    pub fn encode(&self) -> prometheus::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        ENCODER.encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

#[derive(Clone)]
pub struct StubState {
    healthy: bool,
    metrics: StubMetrics,
}

/// Builds the router; `healthy = false` makes `/health` answer 503.
pub fn app(healthy: bool) -> prometheus::Result<(Router, StubMetrics)> {
    let metrics = StubMetrics::new()?;
    let state = StubState { healthy, metrics: metrics.clone() };
    let router = Router::new()
        .route("/health", get(health))
        .route("/model/info", get(model_info))
        .route("/predict", post(predict))
        .route("/predict/batch", post(predict_batch))
        .route("/metrics", get(metrics_text))
        .fallback(not_found)
        .with_state(state);
    Ok((router, metrics))
}

async fn health(State(state): State<StubState>) -> Response {
    let (status, body) = if state.healthy {
        (StatusCode::OK, json!({ "status": "healthy" }))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, json!({ "status": "unhealthy" }))
    };
    state.metrics.hit("/health", status);
    (status, Json(body)).into_response()
}

async fn model_info(State(state): State<StubState>) -> Response {
    state.metrics.hit("/model/info", StatusCode::OK);
    Json(json!({
        "model_name": "delivery-eta-stub",
        "version": env!("CARGO_PKG_VERSION"),
        "features": FEATURE_NAMES,
    }))
    .into_response()
}

fn estimate_minutes(rec: &DeliveryRecord) -> f64 {
    let base = rec.osrm_time / 60.0 * rec.factor * rec.cutoff_factor;
    if rec.is_heavy_delay { base + 15.0 } else { base }
}

fn reject(state: &StubState, route: &str, rejection: JsonRejection) -> Response {
    let status = rejection.status();
    tracing::debug!(target: "stub", route, status = status.as_u16(), "rejected payload");
    state.metrics.hit(route, status);
    (status, Json(json!({ "detail": rejection.body_text() }))).into_response()
}

async fn predict(State(state): State<StubState>, payload: Result<Json<DeliveryRecord>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(rec)) => {
            state.metrics.hit("/predict", StatusCode::OK);
            Json(json!({ "predicted_eta_minutes": estimate_minutes(&rec) })).into_response()
        }
        Err(rejection) => reject(&state, "/predict", rejection),
    }
}

async fn predict_batch(State(state): State<StubState>, payload: Result<Json<BatchRequest>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(batch)) => {
            state.metrics.hit("/predict/batch", StatusCode::OK);
            let predictions: Vec<f64> = batch.deliveries.iter().map(estimate_minutes).collect();
            Json(json!({ "count": predictions.len(), "predictions": predictions })).into_response()
        }
        Err(rejection) => reject(&state, "/predict/batch", rejection),
    }
}

async fn metrics_text(State(state): State<StubState>) -> Response {
    match state.metrics.encode() {
        Ok(buffer) => ([("content-type", ENCODER.format_type().to_string())], buffer).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn not_found(State(state): State<StubState>) -> Response {
    state.metrics.hit("unmatched", StatusCode::NOT_FOUND);
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response()
}
