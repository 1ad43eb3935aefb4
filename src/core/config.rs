//! Configuration management

use clap::Parser;
use config::builder::DefaultState;
use config::{
    Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError as BuilderError, Environment,
    File,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholder secret shipped in the defaults; refused at validation time.
pub const PLACEHOLDER_JWT_SECRET: &str = "change-this-secret-in-production";

/// Minimum accepted length of the signing secret, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid security configuration: {0}")]
    InvalidSecurity(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration with precedence:
    /// CLI args > Environment variables > Config file > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();

        let mut builder = with_defaults(ConfigBuilder::builder())?;

        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(config_path.display().to_string()));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        // Example: CURALINK_SECURITY__JWT_SECRET=...
        builder = builder.add_source(
            Environment::with_prefix("CURALINK")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(host) = &cli_args.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(db_path) = &cli_args.database {
            builder = builder.set_override("database.path", db_path.display().to_string())?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path, on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let config: Config = with_defaults(ConfigBuilder::builder())?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.security.validate()?;
        Ok(())
    }
}

fn with_defaults(builder: Builder<DefaultState>) -> Result<Builder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("server.request_timeout", 30)?
        .set_default("database.path", "./data/curalink.db")?
        .set_default("database.connection_pool_size", 10)?
        .set_default("database.busy_timeout", 5000)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "json")?
        .set_default("logging.output", "stdout")?
        .set_default("security.jwt_secret", PLACEHOLDER_JWT_SECRET)?
        .set_default("security.jwt_algorithm", "HS256")?
        .set_default("security.token_ttl_minutes", 60 * 24 * 7)?
        .set_default("security.bcrypt_cost", bcrypt::DEFAULT_COST as i64)?
        .set_default(
            "security.allowed_origins",
            vec![
                "http://localhost:3000",
                "http://localhost:3001",
                "http://127.0.0.1:3000",
            ],
        )?)
}

/// Command-line arguments for configuration override
#[derive(Debug, Parser)]
#[command(name = "curalink")]
#[command(about = "CuraLink Backend Server", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database file path
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: u64, // seconds
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidServer("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidServer("port must be greater than 0".to_string()));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidServer(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub connection_pool_size: usize,
    pub busy_timeout: u64, // milliseconds
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDatabase("path cannot be empty".to_string()));
        }

        if self.connection_pool_size == 0 {
            return Err(ConfigError::InvalidDatabase(
                "connection_pool_size must be greater than 0".to_string(),
            ));
        }

        if self.busy_timeout == 0 {
            return Err(ConfigError::InvalidDatabase(
                "busy_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidLogging(format!(
                "level must be one of: {:?}",
                valid_levels
            )));
        }

        let valid_formats = ["json", "text"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidLogging(format!(
                "format must be one of: {:?}",
                valid_formats
            )));
        }

        let valid_outputs = ["stdout", "file"];
        if !valid_outputs.contains(&self.output.as_str()) {
            return Err(ConfigError::InvalidLogging(format!(
                "output must be one of: {:?}",
                valid_outputs
            )));
        }

        if self.output == "file" && self.log_file.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_file must be specified when output is 'file'".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub allowed_origins: Vec<String>,
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret == PLACEHOLDER_JWT_SECRET {
            return Err(ConfigError::InvalidSecurity(
                "jwt_secret must be set (CURALINK_SECURITY__JWT_SECRET)".to_string(),
            ));
        }

        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::InvalidSecurity(format!(
                "jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }

        let valid_algorithms = ["HS256", "HS384", "HS512"];
        if !valid_algorithms.contains(&self.jwt_algorithm.as_str()) {
            return Err(ConfigError::InvalidSecurity(format!(
                "jwt_algorithm must be one of: {:?}",
                valid_algorithms
            )));
        }

        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.token_ttl_minutes) {
            return Err(ConfigError::InvalidSecurity(format!(
                "token_ttl_minutes must be between 1 and {}",
                MAX_TOKEN_TTL_MINUTES
            )));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidSecurity(
                "bcrypt_cost must be between 4 and 31".to_string(),
            ));
        }

        if self.allowed_origins.is_empty() {
            return Err(ConfigError::InvalidSecurity(
                "allowed_origins cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn security_config() -> SecurityConfig {
        SecurityConfig {
            jwt_secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            jwt_algorithm: "HS256".to_string(),
            token_ttl_minutes: 60,
            bcrypt_cost: 4,
            allowed_origins: vec!["*".to_string()],
        }
    }

    pub(crate) fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                request_timeout: 30,
            },
            database: DatabaseConfig {
                path: PathBuf::from(":memory:"),
                connection_pool_size: 1,
                busy_timeout: 5000,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "text".to_string(),
                output: "stdout".to_string(),
                log_file: None,
            },
            security: security_config(),
        }
    }

    #[test]
    fn test_test_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_placeholder_secret_rejected() {
        let mut security = security_config();
        security.jwt_secret = PLACEHOLDER_JWT_SECRET.to_string();
        assert!(matches!(
            security.validate(),
            Err(ConfigError::InvalidSecurity(_))
        ));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut security = security_config();
        security.jwt_secret = "short".to_string();
        assert!(security.validate().is_err());
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let mut security = security_config();
        security.jwt_algorithm = "RS256".to_string();
        assert!(security.validate().is_err());
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut security = security_config();
        security.token_ttl_minutes = 0;
        assert!(security.validate().is_err());
        security.token_ttl_minutes = i64::MAX;
        assert!(matches!(
            security.validate(),
            Err(ConfigError::InvalidSecurity(_))
        ));
        security.token_ttl_minutes = MAX_TOKEN_TTL_MINUTES;
        assert!(security.validate().is_ok());
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let mut security = security_config();
        security.bcrypt_cost = 3;
        assert!(security.validate().is_err());
        security.bcrypt_cost = 12;
        assert!(security.validate().is_ok());
    }

    #[test]
    fn test_from_file_layers_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[security]\n\
             jwt_secret = \"0123456789abcdef0123456789abcdef\"\n\
             token_ttl_minutes = 15\n\n\
             [server]\n\
             port = 9000"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.security.token_ttl_minutes, 15);
        assert_eq!(config.security.jwt_algorithm, "HS256");
        assert_eq!(config.database.connection_pool_size, 10);
    }

    #[test]
    fn test_from_file_without_secret_fails() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 9000").unwrap();

        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::InvalidSecurity(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file(Path::new("/nonexistent/curalink.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
