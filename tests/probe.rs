//! Request probe behaviour through the full router.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use reqlog::logging::{OutputFormat, Severity};
use tower::ServiceExt;

mod common;
use common::Harness;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn info_threshold_logs_arrival_and_completion() {
    let harness = Harness::new(Severity::Info, OutputFormat::Json, false);

    let res = harness
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let echoed_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();

    let records = harness.records();
    assert_eq!(records.len(), 2);
    let (arrival, completion) = (&records[0], &records[1]);

    assert_eq!(arrival["level"], "INFO");
    assert_eq!(arrival["caller"], "probe");
    assert_eq!(arrival["request_id"], echoed_id.as_str());
    assert_eq!(arrival["method"], "GET");
    assert_eq!(arrival["path"], "/health");
    assert_eq!(arrival["ip"], "198.51.100.4");
    assert!(arrival["message"]
        .as_str()
        .unwrap()
        .contains("New Request Arrived: Requester ip is 198.51.100.4"));

    assert_eq!(completion["request_id"], echoed_id.as_str());
    assert_eq!(completion["status"], 200);
    assert!(completion["duration_ms"].as_f64().unwrap() >= 0.0);
    let message = completion["message"].as_str().unwrap();
    assert!(message.contains("Time consumed for query to /health is"), "{}", message);
    assert!(message.ends_with(" seconds"));

    // Not tracing: the collector is never touched.
    assert_eq!(harness.collector.snapshot().total_requests, 0);
}

#[tokio::test]
async fn error_threshold_is_silent() {
    let harness = Harness::new(Severity::Error, OutputFormat::Raw, false);
    let res = harness.router.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(harness.sink.is_empty());
}

#[tokio::test]
async fn handler_records_carry_user_and_correlation() {
    let harness = Harness::new(Severity::Debug, OutputFormat::Json, false);
    let user = uuid::Uuid::new_v4();

    harness
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-user-id", user.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let records = harness.records();
    assert_eq!(records.len(), 3);
    let handler = &records[1];
    assert_eq!(handler["level"], "DEBUG");
    assert_eq!(handler["caller"], "handler");
    assert_eq!(handler["user"], user.to_string());
    assert_eq!(handler["request_id"], records[0]["request_id"]);
    assert_eq!(handler["message"], "Serving GET /");
}

#[tokio::test]
async fn invalid_user_header_is_ignored() {
    let harness = Harness::new(Severity::Debug, OutputFormat::Json, false);
    harness
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-user-id", "not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let records = harness.records();
    assert!(records.iter().all(|r| r.get("user").is_none()));
}

#[tokio::test]
async fn tracing_collects_concurrent_requests() {
    const N: usize = 100;
    let harness = Harness::new(Severity::Trace, OutputFormat::Json, true);

    let mut tasks = Vec::new();
    for _ in 0..N {
        let router = harness.router.clone();
        tasks.push(tokio::spawn(async move {
            router.oneshot(get("/work/20")).await.unwrap().status()
        }));
    }

    let mut max_seen = 0;
    let mut samples = Vec::new();
    for task in tasks {
        samples.push(harness.collector.snapshot());
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }
    for snap in &samples {
        assert!(snap.max_concurrent_requests >= max_seen, "high-water mark decreased");
        assert!(snap.max_concurrent_requests >= snap.concurrent_requests);
        max_seen = snap.max_concurrent_requests;
    }

    let stats = harness.collector.snapshot();
    assert_eq!(stats.total_requests, N as u64);
    assert_eq!(stats.concurrent_requests, 0);
    assert!(stats.max_concurrent_requests <= N as u64);
    assert!(stats.max_concurrent_requests >= max_seen);
    assert_eq!(stats.dropped_events, 0);

    let records = harness.finish().await;
    let collector_records: Vec<_> = records.iter().filter(|r| r["caller"] == "collector").collect();
    assert_eq!(collector_records.len(), 2 * N);
    assert!(collector_records.iter().all(|r| r["level"] == "DEBUG"));
    let probe_records = records.iter().filter(|r| r["caller"] == "probe").count();
    assert_eq!(probe_records, 2 * N);
}

#[tokio::test]
async fn fully_overlapping_requests_peak_at_three() {
    let harness = Harness::new(Severity::Trace, OutputFormat::Json, true);

    let a = harness.router.clone().oneshot(get("/work/200"));
    let b = harness.router.clone().oneshot(get("/work/200"));
    let c = harness.router.clone().oneshot(get("/work/200"));

    let sample = async {
        // All three are sleeping inside the handler by now.
        tokio::time::sleep(Duration::from_millis(100)).await;
        harness.collector.snapshot()
    };
    let (ra, rb, rc, during) = tokio::join!(a, b, c, sample);
    for res in [ra, rb, rc] {
        assert_eq!(res.unwrap().status(), StatusCode::OK);
    }

    assert_eq!(during.concurrent_requests, 3);
    let after = harness.collector.snapshot();
    assert_eq!(after.max_concurrent_requests, 3);
    assert_eq!(after.concurrent_requests, 0);
    assert_eq!(after.total_requests, 3);
}

#[tokio::test]
async fn tracing_without_running_collector_does_not_stall() {
    // Aggregator never started: events are dropped, requests still finish.
    let harness = Harness::new(Severity::Trace, OutputFormat::Raw, false);

    let res = tokio::time::timeout(
        Duration::from_secs(5),
        harness.router.clone().oneshot(get("/")),
    )
    .await
    .expect("request must not block on the collector")
    .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let stats = harness.collector.snapshot();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.concurrent_requests, 0);
    assert_eq!(stats.dropped_events, 2);
}

#[tokio::test]
async fn cancelled_request_is_still_completed() {
    let harness = Harness::new(Severity::Trace, OutputFormat::Json, false);

    let slow = harness.router.clone().oneshot(get("/work/5000"));
    let outcome = tokio::time::timeout(Duration::from_millis(50), slow).await;
    assert!(outcome.is_err(), "request should have been cancelled");

    let stats = harness.collector.snapshot();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.concurrent_requests, 0);

    let records = harness.records();
    let completion = records
        .iter()
        .find(|r| r["message"].as_str().unwrap_or_default().contains("Time consumed"))
        .expect("completion record written on cancellation");
    assert!(completion.get("status").is_none());
}

#[tokio::test]
async fn stats_endpoint_reports_counters() {
    let harness = Harness::new(Severity::Trace, OutputFormat::Json, false);
    harness.router.clone().oneshot(get("/")).await.unwrap();

    let res = harness.router.clone().oneshot(get("/stats")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), 64 * 1024).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

    // The /stats request itself is in flight while it is served.
    assert_eq!(value["requests"]["total_requests"], 2);
    assert_eq!(value["requests"]["concurrent_requests"], 1);
    assert!(value["memory"]["gc_cycles"].is_number());
}
