//! Shared utilities for integration testing: mock cameras over raw TCP and
//! a proxy-under-test harness.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use cam_proxy::config::ProxyConfig;
use cam_proxy::http::HttpServer;
use cam_proxy::lifecycle::Shutdown;
use cam_proxy::proxy::UpstreamHandle;

/// One canned HTTP/1.1 response.
#[derive(Clone)]
pub struct CameraReply {
    pub status_line: &'static str,
    /// None drops the Content-Type header entirely.
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl CameraReply {
    pub fn json(body: &str) -> Self {
        Self {
            status_line: "200 OK",
            content_type: Some("application/json"),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn jpeg(body: Vec<u8>) -> Self {
        Self {
            status_line: "200 OK",
            content_type: Some("image/jpeg"),
            body,
        }
    }

    pub fn error(status_line: &'static str) -> Self {
        Self {
            status_line,
            content_type: Some("text/plain"),
            body: b"camera says no".to_vec(),
        }
    }

    pub fn without_content_type(mut self) -> Self {
        self.content_type = None;
        self
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\n",
            self.status_line,
            self.body.len()
        );
        if let Some(content_type) = self.content_type {
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        head.push_str("Connection: close\r\n\r\n");

        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

/// Read the request head so the camera only answers complete requests.
/// Returns the request path.
async fn read_request_path(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf)
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string()
}

/// Start a mock camera that answers every request with the same reply.
/// Returns the camera address and a counter of accepted connections.
#[allow(dead_code)]
pub async fn start_mock_camera(reply: CameraReply) -> (SocketAddr, Arc<AtomicUsize>) {
    start_programmable_camera(move |_path| reply.clone()).await
}

/// Start a mock camera whose reply depends on the request path.
pub async fn start_programmable_camera<F>(f: F) -> (SocketAddr, Arc<AtomicUsize>)
where
    F: Fn(&str) -> CameraReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let conns = connections.clone();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    conns.fetch_add(1, Ordering::SeqCst);
                    let f = f.clone();
                    tokio::spawn(async move {
                        let path = read_request_path(&mut socket).await;
                        let reply = f(&path);
                        let _ = socket.write_all(&reply.to_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, connections)
}

/// Start a mock camera that serves an endless multipart stream: its own
/// header block, then one part every few milliseconds until the client
/// goes away.
pub async fn start_stream_camera(frame: Vec<u8>) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let conns = connections.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    conns.fetch_add(1, Ordering::SeqCst);
                    let frame = frame.clone();
                    tokio::spawn(async move {
                        let _ = read_request_path(&mut socket).await;
                        let head = b"HTTP/1.1 200 OK\r\nContent-Type: multipart/x-mixed-replace; boundary=cam\r\n\r\n";
                        if socket.write_all(head).await.is_err() {
                            return;
                        }
                        loop {
                            let part = format!(
                                "--cam\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
                                frame.len()
                            );
                            if socket.write_all(part.as_bytes()).await.is_err()
                                || socket.write_all(&frame).await.is_err()
                                || socket.write_all(b"\r\n").await.is_err()
                            {
                                return;
                            }
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, connections)
}

/// An address with nothing listening on it.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A proxy spawned for one test.
pub struct ProxyUnderTest {
    pub url: String,
    pub upstream: UpstreamHandle,
    pub shutdown: Shutdown,
}

impl ProxyUnderTest {
    #[allow(dead_code)]
    pub fn route(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }
}

/// Spawn the proxy against the given camera address.
pub async fn spawn_proxy(camera: SocketAddr) -> ProxyUnderTest {
    let mut config = ProxyConfig::default();
    config.upstream.address = camera.ip().to_string();
    config.upstream.port = camera.port();
    spawn_proxy_with(config).await
}

/// Spawn the proxy with a fully custom configuration.
pub async fn spawn_proxy_with(config: ProxyConfig) -> ProxyUnderTest {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (_config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let upstream = server.upstream();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, rx).await;
    });

    ProxyUnderTest {
        url: format!("http://{addr}"),
        upstream,
        shutdown,
    }
}
