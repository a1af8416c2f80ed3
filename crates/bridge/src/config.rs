//! Command-line / environment configuration.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "unrelated-mcp-bridge", version, about)]
pub struct Cli {
    /// Port the bridge listens on.
    #[arg(long, env = "MCP_SERVER_PORT", default_value_t = 4000)]
    pub port: u16,

    /// Address the bridge binds to.
    #[arg(long, env = "MCP_SERVER_HOST", default_value = "0.0.0.0")]
    pub host: std::net::IpAddr,

    /// Base URL of the Mule backend; tools are forwarded to `{base}/mcp/{tool}`.
    #[arg(long, env = "MULE_BASE_URL", default_value = "http://localhost:8081")]
    pub mule_base_url: String,

    /// Backend call timeout in seconds (unset or 0 = no explicit timeout).
    #[arg(long, env = "MULE_TIMEOUT_SECS")]
    pub backend_timeout_secs: Option<u64>,

    /// YAML/JSON file overriding tool descriptions and input schemas.
    #[arg(long, env = "MCP_TOOLS_FILE")]
    pub tools_file: Option<PathBuf>,

    /// Reject payloads that violate the tool's input schema instead of forwarding them.
    #[arg(long, env = "MCP_VALIDATE_INPUT", default_value_t = false)]
    pub validate_input: bool,

    /// Tracing filter directive (e.g. `info`, `unrelated_mcp_bridge=debug`).
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub fn backend_timeout(&self) -> Option<Duration> {
        self.backend_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}
