//! Shared utilities for integration tests.

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

use integration_hub::config::{EndpointConfig, RetryConfig, ServiceType};
use integration_hub::{IntegrationRequest, Transport, TransportError, TransportResponse};

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` receives the raw request head (request line and headers) and returns
/// the status and body to answer with.
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
                        let head = read_request(&mut socket).await;
                        let (status, body) = f(head).await;
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read the request head and drain a `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::from_utf8_lossy(&buf).into_owned(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    let mut body_read = buf.len() - head_end;
    while body_read < content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body_read += n,
        }
    }
    head
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Endpoint with fast retries and no jitter.
pub fn endpoint(id: &str, service_type: ServiceType, base_url: impl Into<String>) -> EndpointConfig {
    let mut config = EndpointConfig::new(id, id, service_type, base_url);
    config.timeout_ms = 2_000;
    config.retry = RetryConfig {
        max_attempts: 3,
        base_delay_ms: 10,
        max_delay_ms: 100,
        backoff_multiplier: 2.0,
        jitter: false,
    };
    config
}

/// Transport replaying scripted outcomes, repeating the last one. Records the
/// (Tokio) time of every call.
pub struct ScriptedTransport {
    outcomes: Mutex<Vec<Result<TransportResponse, TransportError>>>,
    calls: AtomicU32,
    call_times: Mutex<Vec<Instant>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new(outcomes: Vec<Result<TransportResponse, TransportError>>) -> Arc<Self> {
        Self::with_latency(outcomes, Duration::ZERO)
    }

    pub fn with_latency(
        outcomes: Vec<Result<TransportResponse, TransportError>>,
        latency: Duration,
    ) -> Arc<Self> {
        assert!(!outcomes.is_empty());
        Arc::new(Self {
            outcomes: Mutex::new(outcomes),
            calls: AtomicU32::new(0),
            call_times: Mutex::new(Vec::new()),
            latency,
        })
    }

    /// Replace the remaining script.
    pub fn set(&self, outcomes: Vec<Result<TransportResponse, TransportError>>) {
        assert!(!outcomes.is_empty());
        *self.outcomes.lock().unwrap() = outcomes;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute_request<'a>(
        &'a self,
        _request: &'a IntegrationRequest,
        _request_id: &'a str,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        let next = {
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.len() > 1 {
                outcomes.remove(0)
            } else {
                outcomes[0].clone()
            }
        };
        let latency = self.latency;
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            next
        })
    }
}

pub fn status(code: u16) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse::new(code, "{}"))
}
