use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use loadgen_common::config::LoadgenConfig;
use loadgen_common::LoadgenError;
use loadgen_core::RequestKind;
use loadgen_driver::LoadDriver;
use loadgen_stub::{app, StubMetrics};
use tokio::sync::watch;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap(); });
    format!("http://{}:{}", addr.ip(), addr.port())
}

async fn spawn_stub(healthy: bool) -> (String, StubMetrics) {
    let (app, metrics): (Router, _) = app(healthy).unwrap();
    (serve(app).await, metrics)
}

fn quick_config(api_base: String) -> LoadgenConfig {
    LoadgenConfig {
        api_base,
        workers: 3,
        duration_secs: 1,
        min_delay_ms: 5,
        max_delay_ms: 20,
        seed: Some(11),
        ..Default::default()
    }
}

#[tokio::test]
async fn runs_workers_until_duration_elapses() {
    let (base, metrics) = spawn_stub(true).await;
    let driver = LoadDriver::new(quick_config(base)).unwrap();
    let (_tx, rx) = watch::channel(false);

    let started = Instant::now();
    let summary = driver.run(rx).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(summary.workers, 3);
    assert!(!summary.interrupted);
    assert!(summary.total_sent() > 10);
    assert_eq!(summary.total_failed(), 0);
    assert_eq!(summary.total_ok(), summary.total_sent());
    assert!(summary.kind(RequestKind::Predict).sent > summary.kind(RequestKind::Health).sent);

    // startup health check + any health kinds picked by workers
    assert_eq!(metrics.route_total("/health"), 1 + summary.kind(RequestKind::Health).sent);
    assert_eq!(metrics.hits("/predict", 200), summary.kind(RequestKind::Predict).sent);
}

#[tokio::test]
async fn error_scenarios_are_reported_not_fatal() {
    let (base, metrics) = spawn_stub(true).await;
    let driver = LoadDriver::new(quick_config(base)).unwrap();
    let (_tx, rx) = watch::channel(false);

    let summary = driver.run(rx).await.unwrap();

    let statuses: Vec<_> = summary.error_scenarios.iter().map(|s| s.status).collect();
    assert_eq!(statuses, vec![Some(422), Some(422), Some(404)]);
    assert_eq!(metrics.hits("/predict", 422), 2);
    assert_eq!(metrics.hits("unmatched", 404), 1);
}

#[tokio::test]
async fn unhealthy_target_sends_no_load() {
    let (base, metrics) = spawn_stub(false).await;
    let driver = LoadDriver::new(quick_config(base)).unwrap();
    let (_tx, rx) = watch::channel(false);

    let err = driver.run(rx).await.unwrap_err();
    assert!(matches!(err, LoadgenError::Unhealthy { status: 503 }));

    assert_eq!(metrics.route_total("/health"), 1);
    assert_eq!(metrics.route_total("/predict"), 0);
    assert_eq!(metrics.route_total("/predict/batch"), 0);
    assert_eq!(metrics.route_total("/model/info"), 0);
    assert_eq!(metrics.route_total("unmatched"), 0);
}

#[tokio::test]
async fn unreachable_target_aborts() {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let driver = LoadDriver::new(quick_config(format!("http://{}", addr))).unwrap();
    let (_tx, rx) = watch::channel(false);
    let err = driver.run(rx).await.unwrap_err();
    assert!(matches!(err, LoadgenError::Unreachable(_)));
}

#[tokio::test]
async fn shutdown_stops_a_long_run() {
    let (base, _metrics) = spawn_stub(true).await;
    let config = LoadgenConfig { duration_secs: 600, ..quick_config(base) };
    let driver = LoadDriver::new(config).unwrap();
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = tx.send(true);
    });

    let started = Instant::now();
    let summary = driver.run(rx).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(summary.interrupted);
    assert_eq!(summary.workers, 3);
}

#[tokio::test]
async fn shutdown_during_startup_skips_workers() {
    let router = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route(
            "/predict",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::OK
            }),
        );
    let base = serve(router).await;
    let config = LoadgenConfig { duration_secs: 600, ..quick_config(base) };
    let driver = LoadDriver::new(config).unwrap();
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = tx.send(true);
    });

    let started = Instant::now();
    let summary = driver.run(rx).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(summary.interrupted);
    assert_eq!(summary.workers, 0);
    assert_eq!(summary.total_sent(), 0);
    assert!(summary.error_scenarios.is_empty());
}

#[tokio::test]
async fn server_errors_are_tallied_and_workers_keep_going() {
    let router = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .fallback(|| async { StatusCode::INTERNAL_SERVER_ERROR });
    let base = serve(router).await;
    let driver = LoadDriver::new(quick_config(base)).unwrap();
    let (_tx, rx) = watch::channel(false);

    let summary = driver.run(rx).await.unwrap();

    assert_eq!(summary.workers, 3);
    assert!(!summary.interrupted);
    assert!(summary.total_sent() > summary.workers as u64);
    assert!(summary.total_failed() > 0);
    assert_eq!(summary.total_ok(), summary.kind(RequestKind::Health).sent);
    for kind in [RequestKind::Predict, RequestKind::Batch, RequestKind::ModelInfo] {
        let tally = summary.kind(kind);
        assert_eq!(tally.non_success, tally.sent);
        assert_eq!(tally.transport_errors, 0);
    }
    assert!(summary.kind(RequestKind::Predict).non_success > 0);

    let statuses: Vec<_> = summary.error_scenarios.iter().map(|s| s.status).collect();
    assert_eq!(statuses, vec![Some(500), Some(500), Some(500)]);
}

#[test]
fn invalid_config_is_rejected() {
    let config = LoadgenConfig { workers: 0, ..Default::default() };
    assert!(matches!(LoadDriver::new(config), Err(LoadgenError::Config(_))));
}

#[test]
fn unbounded_duration_is_rejected_before_running() {
    let config = LoadgenConfig { duration_secs: u64::MAX, ..Default::default() };
    assert!(matches!(LoadDriver::new(config), Err(LoadgenError::Config(_))));
    let config = LoadgenConfig { max_delay_ms: u64::MAX, ..Default::default() };
    assert!(matches!(LoadDriver::new(config), Err(LoadgenError::Config(_))));
}
