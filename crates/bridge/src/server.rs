//! HTTP surface: `/health`, `/tools`, `/invoke/{tool}`.

use crate::backend::HttpBackend;
use crate::config::Cli;
use crate::dispatch::{Dispatcher, InvocationSuccess};
use crate::error::{BridgeError, Result};
use crate::registry::ToolRegistry;
use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::Path,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;

pub struct AppState {
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Build registry, backend client and dispatcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the tools file is invalid, the backend base URL is invalid, or (with
    /// input validation enabled) an input schema does not compile.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let registry = match &cli.tools_file {
            Some(path) => ToolRegistry::load(path)?,
            None => ToolRegistry::builtin(),
        };
        let registry = Arc::new(registry);
        let backend = Arc::new(HttpBackend::new(&cli.mule_base_url, cli.backend_timeout())?);

        let dispatcher = if cli.validate_input {
            Dispatcher::with_input_validation(registry, backend)?
        } else {
            Dispatcher::new(registry, backend)
        };
        Ok(Self { dispatcher })
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/invoke/{tool_name}", post(invoke))
}

/// Router with state attached, ready to serve.
pub fn app(state: Arc<AppState>) -> Router {
    router().layer(Extension(state))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    time: String,
}

#[derive(Serialize)]
struct ToolsResponse<'a> {
    tools: &'a ToolRegistry,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn list_tools(Extension(state): Extension<Arc<AppState>>) -> Response {
    Json(ToolsResponse {
        tools: state.dispatcher.registry(),
    })
    .into_response()
}

async fn invoke(
    Extension(state): Extension<Arc<AppState>>,
    Path(tool_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Json<InvocationSuccess>, BridgeError> {
    // Only JSON bodies are read; anything else is invoked with an empty payload.
    let body: &[u8] = if is_json_content_type(&headers) {
        &body
    } else {
        &[]
    };
    state.dispatcher.invoke(&tool_name, body).await.map(Json)
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|ct| ct.trim().eq_ignore_ascii_case("application/json"))
}
