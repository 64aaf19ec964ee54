//! Concurrent load against the gateway; checks the shared estimator stays coherent.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use weather_gateway::resilience::EstimatorMode;

mod common;

#[tokio::test]
async fn test_load_performance() {
    let provider_calls = Arc::new(AtomicU32::new(0));
    let pc = provider_calls.clone();
    let backend_addr = common::start_programmable_backend(move |_| {
        pc.fetch_add(1, Ordering::SeqCst);
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            (200, common::PARIS.to_string())
        }
    })
    .await;

    let mut config = common::gateway_config(backend_addr);
    config.estimator.min_timeout_secs = 0.05;
    let min_timeout = config.estimator.min_timeout_secs;
    let max_timeout = config.estimator.max_timeout_secs;
    let gateway = common::start_gateway(config).await;

    let client = common::client();
    let total_requests: u32 = 200;
    let concurrency: u32 = 20;
    let start = Instant::now();

    let mut handles = Vec::new();
    for worker in 0..concurrency {
        let client = client.clone();
        let url = gateway.url("");
        handles.push(tokio::spawn(async move {
            let mut ok: u32 = 0;
            for i in 0..(total_requests / concurrency) {
                // Distinct cities so every request reaches the provider.
                let res = client
                    .get(format!("{url}/get_weather?city=City{worker}x{i}"))
                    .send()
                    .await;
                if let Ok(res) = res {
                    if res.status() == 200 {
                        ok += 1;
                    }
                }
            }
            ok
        }));
    }

    let mut success_count: u32 = 0;
    for handle in handles {
        success_count += handle.await.unwrap();
    }
    let duration = start.elapsed();

    println!("Load test: {} requests in {:?}", total_requests, duration);
    println!("Throughput: {:.2} req/s", total_requests as f64 / duration.as_secs_f64());

    assert_eq!(success_count, total_requests);
    assert_eq!(provider_calls.load(Ordering::SeqCst), total_requests);

    let snapshot = gateway.state.estimator.snapshot();
    assert_eq!(snapshot.mode, EstimatorMode::Active);
    assert!(snapshot.current_timeout >= min_timeout);
    assert!(snapshot.current_timeout <= max_timeout);
    // 200 fast samples leave almost nothing of the 3s prior.
    assert!(snapshot.smoothed_rtt < 0.5, "srtt = {}", snapshot.smoothed_rtt);
    assert!(snapshot.current_timeout < 3.0);
}
