use crate::warehouse::PartialLoadPolicy;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the warehouse tooling.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub source: SourceConfig,
    pub warehouse: WarehouseConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let source_path = env::var("DW_SOURCE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/candidates.csv"));
        let delimiter = match env::var("DW_SOURCE_DELIMITER") {
            Ok(value) => parse_delimiter(&value)?,
            Err(_) => b';',
        };

        let database_path = env::var("DW_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("selection_dw.sqlite3"));
        let load_policy = match env::var("DW_LOAD_POLICY") {
            Ok(value) => value
                .parse::<PartialLoadPolicy>()
                .map_err(|_| ConfigError::InvalidLoadPolicy { value })?,
            Err(_) => PartialLoadPolicy::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            source: SourceConfig {
                path: source_path,
                delimiter,
            },
            warehouse: WarehouseConfig {
                database_path,
                load_policy,
            },
        })
    }
}

/// Accepts exactly one ASCII character, e.g. `;` or `,`.
pub fn parse_delimiter(value: &str) -> Result<u8, ConfigError> {
    let mut bytes = value.bytes();
    match (bytes.next(), bytes.next()) {
        (Some(byte), None) if byte.is_ascii() => Ok(byte),
        _ => Err(ConfigError::InvalidDelimiter {
            value: value.to_string(),
        }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location and dialect of the recruitment export.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub delimiter: u8,
}

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub database_path: PathBuf,
    pub load_policy: PartialLoadPolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDelimiter { value: String },
    InvalidLoadPolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDelimiter { value } => write!(
                f,
                "DW_SOURCE_DELIMITER must be a single ASCII character, got '{value}'"
            ),
            ConfigError::InvalidLoadPolicy { value } => write!(
                f,
                "DW_LOAD_POLICY must be keep_partial or rollback_all, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDelimiter { .. }
            | ConfigError::InvalidLoadPolicy { .. } => None,
        }
    }
}
