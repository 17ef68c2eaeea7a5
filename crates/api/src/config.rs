/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Base URL of the mesh service.
    pub mesh_service_url: String,
    /// Base URL the mesh service can reach this server under; the
    /// progress callback path is appended to it.
    pub callback_base_url: String,
    /// How many projects may be processed concurrently.
    pub max_concurrent_pipelines: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                       |
    /// | `MESH_SERVICE_URL`         | `http://localhost:8000`    |
    /// | `CALLBACK_BASE_URL`        | `http://localhost:3000`    |
    /// | `MAX_CONCURRENT_PIPELINES` | `5`                        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let mesh_service_url =
            std::env::var("MESH_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000".into());

        let callback_base_url =
            std::env::var("CALLBACK_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());

        let max_concurrent_pipelines: usize = std::env::var("MAX_CONCURRENT_PIPELINES")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("MAX_CONCURRENT_PIPELINES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            mesh_service_url,
            callback_base_url,
            max_concurrent_pipelines,
        }
    }

    /// Absolute URL the mesh service POSTs progress callbacks to.
    pub fn callback_url(&self) -> String {
        format!(
            "{}/api/v1/callbacks/progress",
            self.callback_base_url.trim_end_matches('/')
        )
    }
}
