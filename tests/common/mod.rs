//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use weather_gateway::config::GatewayConfig;
use weather_gateway::http::AppState;
use weather_gateway::{HttpServer, Shutdown, TimeoutEstimator};

pub const API_KEY: &str = "test-key";

pub const PARIS: &str = r#"{
    "name": "Paris",
    "weather": [{"description": "ciel dégagé", "icon": "01d"}],
    "main": {"temp": 18.4, "feels_like": 17.9, "humidity": 52, "pressure": 1019},
    "wind": {"speed": 4.1},
    "sys": {"sunrise": 1700000000, "sunset": 1700040000},
    "coord": {"lat": 48.85, "lon": 2.35},
    "visibility": 9000
}"#;

/// Start a programmable mock provider on an ephemeral port.
///
/// `f` receives the HTTP request line (e.g. `GET /data/2.5/weather?q=Paris HTTP/1.1`)
/// and returns the status code and JSON body to answer with.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let request_line = read_request_line(&mut socket).await;
                        let (status, body) = f(request_line).await;
                        let status_text = match status {
                            200 => "200 OK",
                            401 => "401 Unauthorized",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock provider answering every request with the same status and body.
pub async fn start_fixed_backend(status: u16, body: &'static str) -> SocketAddr {
    start_programmable_backend(move |_| async move { (status, body.to_string()) }).await
}

async fn read_request_line(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Gateway config pointing at `backend`, with rate limiting off and metrics off.
pub fn gateway_config(backend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.api_key = API_KEY.into();
    config.upstream.weather_url = format!("http://{backend}/data/2.5/weather");
    config.upstream.geocoding_url = format!("http://{backend}/geo/1.0/direct");
    config.rate_limit.enabled = false;
    config
}

pub struct RunningGateway {
    pub addr: SocketAddr,
    pub state: AppState,
    pub shutdown: Shutdown,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> RunningGateway {
    let estimator = Arc::new(TimeoutEstimator::new(config.estimator.clone()));
    let server = HttpServer::new(config, estimator).unwrap();
    let state = server.state().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningGateway {
        addr,
        state,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
