//! End-to-end tests for the gateway routes against a mock provider.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

mod common;

#[tokio::test]
async fn test_health_sets_request_id_and_security_headers() {
    let backend_addr = common::start_fixed_backend(200, common::PARIS).await;
    let gateway = common::start_gateway(common::gateway_config(backend_addr)).await;
    let client = common::client();

    let res = client.get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let request_id = res.headers()["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(request_id.len(), 12);
    assert!(request_id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(res.headers()["x-frame-options"], "DENY");
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client
        .get(gateway.url("/health"))
        .header("x-request-id", "abc123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc123");
}

#[tokio::test]
async fn test_security_headers_can_be_disabled() {
    let backend_addr = common::start_fixed_backend(200, common::PARIS).await;
    let mut config = common::gateway_config(backend_addr);
    config.security.enable_headers = false;
    let gateway = common::start_gateway(config).await;

    let res = common::client().get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("x-content-type-options").is_none());
    assert!(res.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn test_weather_lookup_then_cache_hit() {
    let call_count = Arc::new(AtomicU32::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (cc, s) = (call_count.clone(), seen.clone());
    let backend_addr = common::start_programmable_backend(move |line| {
        cc.fetch_add(1, Ordering::SeqCst);
        s.lock().unwrap().push(line);
        async { (200, common::PARIS.to_string()) }
    })
    .await;
    let gateway = common::start_gateway(common::gateway_config(backend_addr)).await;
    let client = common::client();

    let res = client.get(gateway.url("/get_weather?city=Paris")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["city"], "Paris");
    assert_eq!(body["temperature"], 18.4);
    assert_eq!(body["description"], "ciel dégagé");
    assert_eq!(body["humidity"], 52);
    assert_eq!(body["visibility"], 9000);
    assert!(body.get("_cached").is_none());

    {
        let seen = seen.lock().unwrap();
        let line = &seen[0];
        assert!(line.starts_with("GET /data/2.5/weather?"), "{line}");
        assert!(line.contains("appid=test-key"));
        assert!(line.contains("units=metric"));
        assert!(line.contains("lang=fr"));
        assert!(line.contains("q=Paris"));
    }

    // Case differs, cache key does not.
    let res = client.get(gateway.url("/get_weather?city=paris")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["_cached"], true);
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.state.cache.len(), 1);

    let snapshot = gateway.state.estimator.snapshot();
    assert!(snapshot.smoothed_rtt < 3.0, "A fast answer must pull srtt down");
}

#[tokio::test]
async fn test_weather_by_coordinates() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let backend_addr = common::start_programmable_backend(move |line| {
        s.lock().unwrap().push(line);
        async { (200, common::PARIS.to_string()) }
    })
    .await;
    let gateway = common::start_gateway(common::gateway_config(backend_addr)).await;

    let res = common::client()
        .get(gateway.url("/get_weather?lat=48.8566&lon=2.3522"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let seen = seen.lock().unwrap();
    assert!(seen[0].contains("lat=48.8566"));
    assert!(seen[0].contains("lon=2.3522"));
    assert!(!seen[0].contains("q="));
}

#[tokio::test]
async fn test_invalid_queries_are_rejected_before_the_provider() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let backend_addr = common::start_programmable_backend(move |_| {
        cc.fetch_add(1, Ordering::SeqCst);
        async { (200, common::PARIS.to_string()) }
    })
    .await;
    let gateway = common::start_gateway(common::gateway_config(backend_addr)).await;
    let client = common::client();

    for path in [
        "/get_weather",
        "/get_weather?city=P",
        "/get_weather?lat=91&lon=0",
        "/get_weather?lat=abc&lon=2",
        "/get_weather?lat=48.8",
    ] {
        let res = client.get(gateway.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 400, "{path}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Provide a valid city name or valid coordinates.");
    }
    assert_eq!(call_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_autocomplete() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let backend_addr = common::start_programmable_backend(move |line| {
        cc.fetch_add(1, Ordering::SeqCst);
        async move {
            if line.starts_with("GET /geo/1.0/direct?") && line.contains("limit=5") {
                (
                    200,
                    r#"[
                        {"name":"Paris","country":"FR","state":"Ile-de-France","lat":48.85,"lon":2.35},
                        {"name":"Paris","country":"US","lat":33.66,"lon":-95.55}
                    ]"#
                    .to_string(),
                )
            } else {
                (404, "[]".to_string())
            }
        }
    })
    .await;
    let gateway = common::start_gateway(common::gateway_config(backend_addr)).await;
    let client = common::client();

    let res = client.get(gateway.url("/autocomplete?q=Par")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body[0]["label"], "Paris, Ile-de-France, FR");
    assert_eq!(body[1]["label"], "Paris, US");
    assert_eq!(body[1]["lon"], -95.55);

    let res = client.get(gateway.url("/autocomplete?q=P")).send().await.unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!([]));
    assert_eq!(call_count.load(Ordering::SeqCst), 1);

    // Autocomplete never feeds the estimator.
    let snapshot = gateway.state.estimator.snapshot();
    assert!((snapshot.smoothed_rtt - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_autocomplete_degrades_to_empty_list() {
    let backend_addr = common::start_fixed_backend(500, r#"{"message":"boom"}"#).await;
    let gateway = common::start_gateway(common::gateway_config(backend_addr)).await;

    let res = common::client()
        .get(gateway.url("/autocomplete?q=Lyon"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_stats_reports_estimator_and_cache() {
    let backend_addr = common::start_fixed_backend(200, common::PARIS).await;
    let gateway = common::start_gateway(common::gateway_config(backend_addr)).await;
    let client = common::client();

    let stats: serde_json::Value = client
        .get(gateway.url("/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(stats["cache_entries"], 0);
    assert_eq!(stats["estimator"]["smoothed_rtt"], 3.0);
    assert_eq!(stats["estimator"]["rtt_variance"], 0.5);
    assert_eq!(stats["estimator"]["current_timeout"], 5.0);
    assert_eq!(stats["estimator"]["mode"], "active");

    client.get(gateway.url("/get_weather?city=Paris")).send().await.unwrap();

    let stats: serde_json::Value = client
        .get(gateway.url("/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["cache_entries"], 1);
    assert!(stats["estimator"]["smoothed_rtt"].as_f64().unwrap() < 3.0);
}

#[tokio::test]
async fn test_weather_rate_limit() {
    let backend_addr = common::start_fixed_backend(200, common::PARIS).await;
    let mut config = common::gateway_config(backend_addr);
    config.rate_limit.enabled = true;
    config.rate_limit.weather_per_minute = 2;
    config.rate_limit.default_per_minute = 100;
    let gateway = common::start_gateway(config).await;
    let client = common::client();

    for _ in 0..2 {
        let res = client.get(gateway.url("/get_weather?city=Paris")).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }

    let res = client.get(gateway.url("/get_weather?city=Paris")).send().await.unwrap();
    assert_eq!(res.status(), 429);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Rate limit exceeded.");

    // Other routes draw from the default budget.
    let res = client.get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let backend_addr = common::start_fixed_backend(200, common::PARIS).await;
    let gateway = common::start_gateway(common::gateway_config(backend_addr)).await;

    let res = common::client().get(gateway.url("/readme")).send().await.unwrap();
    assert_eq!(res.status(), 404);
}
