use std::sync::OnceLock;
use thiserror::Error;

static SERVER_CONFIG: OnceLock<ServerConfig> = OnceLock::new();

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Process-wide server configuration, loaded from the environment once at
/// startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, e.g. "127.0.0.1:8080"
    pub bind_address: String,

    /// SurrealDB endpoint ("memory" for the embedded engine)
    pub database_url: String,

    pub database_namespace: String,

    pub database_name: String,

    /// HMAC secret the auth service signs session tokens with
    pub jwt_secret: String,

    /// Object storage bucket for attachments and transcripts
    pub storage_bucket: String,

    pub storage_region: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;
        if jwt_secret.len() < 32 {
            return Err(ConfigError::InvalidValue {
                var: "JWT_SECRET".to_string(),
                message: "must be at least 32 bytes".to_string(),
            });
        }

        Ok(Self {
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "memory".to_string()),
            database_namespace: std::env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "confab".to_string()),
            database_name: std::env::var("DATABASE_NAME").unwrap_or_else(|_| "main".to_string()),
            jwt_secret,
            storage_bucket: std::env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "confab-uploads".to_string()),
            storage_region: std::env::var("STORAGE_REGION")
                .unwrap_or_else(|_| "eu-west-1".to_string()),
        })
    }

    /// Load from the environment and pin for the lifetime of the process.
    pub fn init() -> Result<&'static ServerConfig, ConfigError> {
        let config = Self::from_env()?;
        SERVER_CONFIG.set(config).map_err(|_| ConfigError::AlreadyInitialized)?;
        Self::get()
    }

    pub fn get() -> Result<&'static ServerConfig, ConfigError> {
        SERVER_CONFIG
            .get()
            .ok_or_else(|| ConfigError::MissingVar("configuration not initialized".to_string()))
    }
}
