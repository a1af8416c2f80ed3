//! HTTP bridge exposing a fixed set of named tools.
//!
//! - `GET /tools` describes every tool and its input schema
//! - `POST /invoke/{tool}` forwards the payload to `{backend}/mcp/{tool}` and wraps the reply
//! - `GET /health` is a liveness probe

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod registry;
pub mod server;
