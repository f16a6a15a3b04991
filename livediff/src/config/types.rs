use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::orchestrator::DiffRequest;

/// Default listen port when neither config nor CLI names one.
pub const DEFAULT_PORT: u16 = 5000;

/// Default tracing filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "livediff=debug,tower_http=info";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Parsed and validated livediff config.
#[derive(Debug, Clone)]
pub struct Config {
    /// Contract version. Always "v1".
    pub version: String,
    /// The two files to compare. Either may be unset.
    pub files: FilesConfig,
    pub server: ServerConfig,
    pub diff: DiffConfig,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Config {
    /// The immutable per-request view handed to the `/` route.
    pub fn diff_request(&self) -> DiffRequest {
        DiffRequest::new(self.files.file1.clone(), self.files.file2.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesConfig {
    pub file1: Option<String>,
    pub file2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Attach an allow-all CORS layer.
    pub cors: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            cors: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffConfig {
    pub execution: DiffExecution,
}

/// Where the synchronous diff computation runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiffExecution {
    /// On the async worker that is handling the request.
    Inline,
    /// On tokio's blocking thread pool.
    #[default]
    Blocking,
}
