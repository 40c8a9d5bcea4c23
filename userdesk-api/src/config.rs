/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `API_PRODUCTION`: Enables HSTS and strict CORS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `IDENTITY_ISSUER`: Expected `iss` claim of bearer tokens (required)
/// - `IDENTITY_JWKS_URL`: Provider key-set endpoint (required)
/// - `IDENTITY_API_URL`: Provider admin API base URL (required)
/// - `IDENTITY_API_KEY`: Service credential for the admin API (required)
/// - `STORAGE_BASE_URL`: Object store base URL (required)
/// - `STORAGE_API_KEY`: Object store credential (required)
/// - `STORAGE_BUCKET`: Bucket for profile images (required)
/// - `STORAGE_FOLDER`: Folder prefix inside the bucket (default: profiles)

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Identity-provider configuration
    pub identity: IdentityConfig,

    /// Object-storage configuration
    pub storage: StorageConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive (development)
    pub cors_origins: Vec<String>,

    /// Production mode: enables HSTS headers
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Identity-provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Expected token issuer
    pub issuer: String,

    /// JWK-set endpoint used to validate bearer tokens
    pub jwks_url: String,

    /// Admin API base URL for account management
    pub api_url: String,

    /// Service credential for the admin API
    pub api_key: String,
}

/// Object-storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store base URL
    pub base_url: String,

    /// Service credential
    pub api_key: String,

    /// Bucket holding profile images
    pub bucket: String,

    /// Folder prefix inside the bucket
    pub folder: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or
    /// have invalid values.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let cors_origins = env::var("API_CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let production = matches!(
            env::var("API_PRODUCTION").as_deref(),
            Ok("true") | Ok("1")
        );

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let identity = IdentityConfig {
            issuer: require_env("IDENTITY_ISSUER")?,
            jwks_url: require_env("IDENTITY_JWKS_URL")?,
            api_url: require_env("IDENTITY_API_URL")?,
            api_key: require_env("IDENTITY_API_KEY")?,
        };

        let storage = StorageConfig {
            base_url: require_env("STORAGE_BASE_URL")?,
            api_key: require_env("STORAGE_API_KEY")?,
            bucket: require_env("STORAGE_BUCKET")?,
            folder: env::var("STORAGE_FOLDER").unwrap_or_else(|_| "profiles".to_string()),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            identity,
            storage,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn require_env(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} environment variable is required", name))
}
