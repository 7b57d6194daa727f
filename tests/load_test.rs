//! Load testing against a live server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqlog::collector::{Collector, MemorySnapshot};
use reqlog::config::AppConfig;
use reqlog::http::HttpServer;
use reqlog::lifecycle::Shutdown;
use reqlog::logging::{LogSettings, Logger, MemorySink, OutputFormat, Severity};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn test_load_with_tracing() {
    // 1. Wire the service at TRACE with an in-memory sink
    let sink = MemorySink::new();
    let settings = Arc::new(LogSettings::new(Severity::Trace, OutputFormat::Json));
    settings.set_color(false);
    let logger = Logger::new(Arc::clone(&settings), Arc::new(sink.clone()));

    let shutdown = Shutdown::new();
    let (collector, aggregator) = Collector::new(4096);
    let collector_task = aggregator.spawn(logger.named("collector"), MemorySnapshot::default);

    // 2. Start the server on an ephemeral port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(AppConfig::default(), logger, collector.clone());
    let server_task = tokio::spawn(server.run(listener, shutdown.clone()));

    // 3. Run load
    let concurrency = 20;
    let requests_per_task = 25;
    let total_requests = concurrency * requests_per_task;

    let client = reqwest::Client::new();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = format!("http://{}/work/5", addr);
        tasks.push(tokio::spawn(async move {
            let mut ok = 0usize;
            for _ in 0..requests_per_task {
                let res = client.get(&url).send().await.unwrap();
                assert!(res.headers().contains_key("x-request-id"));
                if res.status().is_success() {
                    ok += 1;
                }
            }
            ok
        }));
    }

    let mut succeeded = 0;
    for task in tasks {
        succeeded += task.await.unwrap();
    }
    println!(
        "{} requests in {:?} ({} concurrent clients)",
        total_requests,
        start.elapsed(),
        concurrency
    );
    assert_eq!(succeeded, total_requests);

    // 4. Counters settle once every request has completed
    let stats = collector.snapshot();
    assert_eq!(stats.total_requests, total_requests as u64);
    assert_eq!(stats.concurrent_requests, 0);
    assert!(stats.max_concurrent_requests >= 1);
    assert!(stats.max_concurrent_requests <= concurrency as u64);

    // /stats is served by the same counters
    let body: serde_json::Value = client
        .get(format!("http://{}/stats", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["requests"]["total_requests"], total_requests as u64 + 1);

    // 5. Graceful shutdown drains the collector: once the server is gone only
    //    our handle keeps the queue open
    let stats = Arc::clone(collector.stats());
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server_task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    drop(collector);
    tokio::time::timeout(Duration::from_secs(5), collector_task)
        .await
        .unwrap()
        .unwrap();

    let collector_lines = sink
        .lines()
        .iter()
        .filter(|line| line.contains("\"caller\":\"collector\""))
        .count();
    assert_eq!(stats.dropped_events(), 0);
    assert_eq!(collector_lines, 2 * (total_requests + 1));
}

#[tokio::test]
async fn test_remote_address_from_peer() {
    let sink = MemorySink::new();
    let settings = Arc::new(LogSettings::new(Severity::Info, OutputFormat::Json));
    let logger = Logger::new(settings, Arc::new(sink.clone()));
    let (collector, _aggregator) = Collector::new(16);

    let shutdown = Shutdown::new();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(AppConfig::default(), logger, collector);
    let server_task = tokio::spawn(server.run(listener, shutdown.clone()));

    // HTTP/1.0 without a Host header: only the socket peer is left.
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET /health HTTP/1.0\r\n\r\n").await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.") && response.contains(" 200 "), "{}", response);
    assert!(response.ends_with("OK"));

    shutdown.trigger();
    server_task.await.unwrap().unwrap();

    let arrival: serde_json::Value = serde_json::from_str(&sink.lines()[0]).unwrap();
    assert_eq!(arrival["ip"], "127.0.0.1");
    assert!(arrival["message"]
        .as_str()
        .unwrap()
        .contains("Requester ip is 127.0.0.1; Request info: [GET /health]"));
}
