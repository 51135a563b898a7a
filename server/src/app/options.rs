//! Application configuration options

use crate::deploy::executor;

/// Main application options
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// HTTP server configuration
    pub server: ServerOptions,

    /// Deploy executor options
    pub deploy: executor::Options,
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
        }
    }
}
