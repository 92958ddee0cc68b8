//! Configuration types and loading
//!
//! Typed settings with defaults, overridable from the environment.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Attachment storage configuration
    pub storage: StorageConfig,

    /// Authentication configuration
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
    pub max_body_size_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for uploaded attachments
    pub local_path: String,
    /// Public URL prefix under which stored attachments are served
    pub base_url: String,
    /// Maximum size of a single attachment in bytes
    pub max_attachment_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HS256 secret for bearer token verification
    pub jwt_secret: String,
    /// Token expiration in seconds
    pub token_expiration_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                request_timeout_seconds: 60,
                max_body_size_bytes: 50 * 1024 * 1024,
            },
            storage: StorageConfig {
                local_path: "uploads".to_string(),
                base_url: "/uploads".to_string(),
                max_attachment_size: 20 * 1024 * 1024,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                token_expiration_seconds: 86400,
            },
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %port, "unparsable PORT, using default");
                config.server.port
            });
        }
        if let Ok(size) = std::env::var("CARMART_MAX_BODY_SIZE") {
            if let Ok(bytes) = size.parse() {
                config.server.max_body_size_bytes = bytes;
            }
        }

        if let Ok(path) = std::env::var("CARMART_UPLOADS_PATH") {
            config.storage.local_path = path;
        }
        if let Ok(url) = std::env::var("CARMART_UPLOADS_BASE_URL") {
            config.storage.base_url = url;
        }
        if let Ok(size) = std::env::var("CARMART_MAX_ATTACHMENT_SIZE") {
            if let Ok(bytes) = size.parse() {
                config.storage.max_attachment_size = bytes;
            }
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.auth.jwt_secret = secret;
        } else if let Ok(secret) = std::env::var("SECRET_KEY_BASE") {
            config.auth.jwt_secret = secret;
        }
        if let Ok(exp) = std::env::var("JWT_EXPIRATION_SECONDS") {
            config.auth.token_expiration_seconds =
                exp.parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "JWT_EXPIRATION_SECONDS".to_string(),
                        message: "expected an integer number of seconds".to_string(),
                    })?;
        }

        Ok(config)
    }

    /// Get the socket address the server should bind to
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::SocketAddr;
        let ip: std::net::IpAddr = self.server.host.parse().unwrap_or([0, 0, 0, 0].into());
        SocketAddr::new(ip, self.server.port)
    }
}
