#![allow(dead_code)]

use anyhow::Context as _;
use axum::extract::Path;
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde_json::Value;
use std::process::{Child, Command};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use unrelated_test_support::{KillOnDrop, TestServer};

pub fn pick_unused_port() -> anyhow::Result<u16> {
    unrelated_test_support::pick_unused_port()
}

pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    unrelated_test_support::wait_http_ok(url, timeout_dur).await
}

pub fn spawn_bridge(port: u16, mule_base_url: &str, extra_args: &[&str]) -> anyhow::Result<Child> {
    let bin = env!("CARGO_BIN_EXE_unrelated-mcp-bridge");
    Command::new(bin)
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .arg("--mule-base-url")
        .arg(mule_base_url)
        .arg("--log-level")
        .arg("info")
        .args(extra_args)
        .spawn()
        .context("spawn bridge")
}

/// A running bridge process plus its base URL.
pub struct Bridge {
    pub base_url: String,
    _child: KillOnDrop,
}

pub async fn start_bridge(mule_base_url: &str, extra_args: &[&str]) -> anyhow::Result<Bridge> {
    let port = pick_unused_port()?;
    let child = KillOnDrop(spawn_bridge(port, mule_base_url, extra_args)?);
    let base_url = format!("http://127.0.0.1:{port}");
    wait_http_ok(&format!("{base_url}/health"), Duration::from_secs(20)).await?;
    Ok(Bridge {
        base_url,
        _child: child,
    })
}

/// Payloads received by the mock Mule backend, as `(tool, body)`.
pub type Received = Arc<Mutex<Vec<(String, Value)>>>;

/// Mock Mule app: answers every `POST /mcp/{tool}` with `reply` and records the request.
pub async fn start_mule(reply: Value) -> anyhow::Result<(TestServer, Received)> {
    async fn handle(
        Extension((reply, received)): Extension<(Arc<Value>, Received)>,
        Path(tool): Path<String>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        if let Ok(mut r) = received.lock() {
            r.push((tool, body));
        }
        Json(reply.as_ref().clone())
    }

    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/mcp/{tool}", post(handle))
        .layer(Extension((Arc::new(reply), received.clone())));
    let server = TestServer::start(app).await?;
    Ok((server, received))
}

pub fn received(r: &Received) -> Vec<(String, Value)> {
    r.lock().map(|v| v.clone()).unwrap_or_default()
}
