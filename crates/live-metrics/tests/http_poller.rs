use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::routing::get;
use live_metrics::{
    DisplayTarget, Error, HttpStatusSource, MemoryBoard, MetricsPoller, PollEvent, PollerConfig,
    StatusSource, TickOutcome,
};

const SCENARIO_BODY: &str = r#"{"model_status":{"accuracy":92.33,"training_samples":500000,"avg_fuel_savings":14.0,"prediction_time_ms":8.0}}"#;

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn json_route(body: &'static str) -> Router {
    Router::new().route(
        "/api/model-performance",
        get(move || async move { ([(header::CONTENT_TYPE, "application/json")], body) }),
    )
}

fn config() -> PollerConfig {
    PollerConfig::default().with_request_timeout(Duration::from_secs(5))
}

fn http_poller(base_url: &str, board: Arc<MemoryBoard>) -> Arc<MetricsPoller> {
    let source = HttpStatusSource::new(base_url, &config()).unwrap();
    Arc::new(MetricsPoller::new(Arc::new(source), board, config()).unwrap())
}

#[tokio::test]
async fn test_scenario_payload_renders_expected_text() {
    let base_url = spawn_server(json_route(SCENARIO_BODY)).await;
    let board = Arc::new(MemoryBoard::full());
    let poller = http_poller(&base_url, board.clone());

    let outcome = poller.refresh_metrics().await;

    assert_eq!(outcome, TickOutcome::Rendered { seq: 1, written: 4 });
    assert_eq!(board.text(DisplayTarget::ModelAccuracy).as_deref(), Some("92.3%"));
    assert_eq!(board.text(DisplayTarget::TrainingSamples).as_deref(), Some("500,000"));
    assert_eq!(board.text(DisplayTarget::AvgFuelSavings).as_deref(), Some("14.0%"));
    assert_eq!(board.text(DisplayTarget::PredictionTime).as_deref(), Some("8.0ms"));
}

#[tokio::test]
async fn test_backend_payload_with_extra_sections() {
    let body = r#"{
        "model_status": {
            "accuracy": 98.7,
            "training_samples": 847392,
            "avg_fuel_savings": 12.3,
            "prediction_time_ms": 4.2,
            "model_version": "v2.1.3",
            "last_updated": "2024-05-01T10:00:00",
            "health_status": "excellent"
        },
        "training_progress": {"current_epoch": 127, "total_epochs": 150},
        "feature_importance": [{"name": "Engine Load", "importance": 0.234}]
    }"#;
    let base_url = spawn_server(json_route(body)).await;
    let board = Arc::new(MemoryBoard::full());
    let poller = http_poller(&base_url, board.clone());

    poller.update_live_metrics().await;

    assert_eq!(board.text(DisplayTarget::ModelAccuracy).as_deref(), Some("98.7%"));
    assert_eq!(board.text(DisplayTarget::TrainingSamples).as_deref(), Some("847,392"));
    assert_eq!(board.text(DisplayTarget::AvgFuelSavings).as_deref(), Some("12.3%"));
    assert_eq!(board.text(DisplayTarget::PredictionTime).as_deref(), Some("4.2ms"));
}

#[tokio::test]
async fn test_missing_model_status_leaves_board_untouched() {
    let base_url = spawn_server(json_route(r#"{"training_progress": {}}"#)).await;
    let board = Arc::new(MemoryBoard::full());
    let poller = http_poller(&base_url, board.clone());

    assert_eq!(
        poller.update_live_metrics().await,
        TickOutcome::NoStatus { seq: 1 }
    );
    assert_eq!(board.writes(), 0);
}

#[tokio::test]
async fn test_error_status_is_a_failure() {
    let router = Router::new().route(
        "/api/model-performance",
        get(|| async { (StatusCode::NOT_FOUND, "<html>Not Found</html>") }),
    );
    let base_url = spawn_server(router).await;

    let source = HttpStatusSource::new(&base_url, &config()).unwrap();
    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, Error::Status { status, .. } if status == 404));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_non_json_body_writes_nothing() {
    let router = Router::new().route(
        "/api/model-performance",
        get(|| async { "<!doctype html><p>maintenance</p>" }),
    );
    let base_url = spawn_server(router).await;
    let board = Arc::new(MemoryBoard::full());
    let poller = http_poller(&base_url, board.clone());

    assert_eq!(
        poller.update_live_metrics().await,
        TickOutcome::Failed { seq: 1 }
    );
    assert_eq!(board.writes(), 0);
}

#[tokio::test]
async fn test_connection_refused_writes_nothing() {
    // Reserve a port, then close it so nothing listens there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let board = Arc::new(MemoryBoard::full());
    let poller = http_poller(&format!("http://{}", addr), board.clone());

    assert_eq!(
        poller.update_live_metrics().await,
        TickOutcome::Failed { seq: 1 }
    );
    assert_eq!(board.writes(), 0);
    assert_eq!(poller.stats().failed, 1);
}

#[tokio::test]
async fn test_started_poller_renders_first_tick_immediately() {
    let base_url = spawn_server(json_route(SCENARIO_BODY)).await;
    let board = Arc::new(MemoryBoard::full());
    let poller = http_poller(&base_url, board.clone());
    let mut events = poller.events().subscribe();

    let handle = poller.clone().start();

    let rendered = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let PollEvent::Rendered { written, .. } = events.recv().await.unwrap() {
                break written;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(rendered.len(), 4);
    assert_eq!(board.text(DisplayTarget::TrainingSamples).as_deref(), Some("500,000"));

    handle.stop().await;
    assert_eq!(poller.stats().ticks_started, 1);
}
