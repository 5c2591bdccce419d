//! Concurrency tests: the quota holds and every request is accounted for.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use response_pipeline::processing::Echo;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn quota_holds_under_concurrency() {
    let limit = 50;
    let concurrency = 20;
    let requests_per_task = 10;
    let total_requests = concurrency * requests_per_task;

    let server = common::start_server(common::throttled_config(limit, 60_000), Echo).await;
    let client = reqwest::Client::new();
    let url = common::url(&server, "/");
    let start = Instant::now();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            let mut statuses = Vec::new();
            for _ in 0..requests_per_task {
                let res = client.get(&url).send().await.unwrap();
                statuses.push(res.status());
            }
            statuses
        }));
    }

    let mut ok = 0;
    let mut throttled = 0;
    for task in tasks {
        for status in task.await.unwrap() {
            match status {
                StatusCode::OK => ok += 1,
                StatusCode::TOO_MANY_REQUESTS => throttled += 1,
                other => panic!("unexpected status {other}"),
            }
        }
    }

    let elapsed = start.elapsed();
    println!(
        "{} requests in {:?} ({:.0} req/s)",
        total_requests,
        elapsed,
        total_requests as f64 / elapsed.as_secs_f64()
    );

    assert_eq!(ok, limit as usize);
    assert_eq!(throttled, total_requests - limit as usize);

    let stats = server.pipeline().statistics().clone();
    assert_eq!(stats.total_events_received(), total_requests as u64);
    assert!(
        common::eventually(|| {
            let stats = stats.clone();
            async move { stats.processed_events() == limit as u64 }
        })
        .await
    );
    assert!(stats.max_processing_time() >= stats.min_processing_time());

    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn window_refills_after_period() {
    let server = common::start_server(common::throttled_config(3, 1_000), Echo).await;
    let client = reqwest::Client::new();
    let url = common::url(&server, "/");

    for _ in 0..3 {
        assert_eq!(client.get(&url).send().await.unwrap().status(), StatusCode::OK);
    }
    assert_eq!(
        client.get(&url).send().await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-ratelimit-remaining"], "2");

    server.stop().await.unwrap();
}
