//! Connection configuration loaded from environment variables.

use crate::error::ControllerError;
use prism_client::PrismConfig;
use std::env;

/// Connection settings for the Prism Central endpoint.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// PC hostname or IP address
    pub hostname: String,
    /// PC username
    pub username: String,
    /// PC password
    pub password: String,
    /// PC port
    pub port: u16,
    /// Verify the server certificate
    pub validate_certs: bool,
}

impl ConnectionConfig {
    /// Load connection settings from the environment.
    ///
    /// `PC_HOSTNAME`, `PC_USERNAME` and `PC_PASSWORD` are mandatory; missing
    /// credentials abort the invocation before any operation runs.
    ///
    /// # Errors
    /// [`ControllerError::InvalidConfig`] when a mandatory variable is unset
    /// or `PC_PORT` does not parse.
    pub fn from_env() -> Result<Self, ControllerError> {
        let hostname = env::var("PC_HOSTNAME").map_err(|_| {
            ControllerError::InvalidConfig(
                "PC_HOSTNAME environment variable is required".to_string(),
            )
        })?;
        let username = env::var("PC_USERNAME").map_err(|_| {
            ControllerError::InvalidConfig(
                "PC_USERNAME environment variable is required".to_string(),
            )
        })?;
        let password = env::var("PC_PASSWORD").map_err(|_| {
            ControllerError::InvalidConfig(
                "PC_PASSWORD environment variable is required".to_string(),
            )
        })?;
        let port = match env::var("PC_PORT") {
            Ok(raw) => raw.parse().map_err(|_| {
                ControllerError::InvalidConfig(format!("PC_PORT '{raw}' is not a valid port"))
            })?,
            Err(_) => 9440,
        };
        let validate_certs = match env::var("VALIDATE_CERTS") {
            Ok(raw) => !matches!(raw.to_lowercase().as_str(), "false" | "no" | "0"),
            Err(_) => true,
        };

        Ok(Self {
            hostname,
            username,
            password,
            port,
            validate_certs,
        })
    }
}

impl From<ConnectionConfig> for PrismConfig {
    fn from(config: ConnectionConfig) -> Self {
        PrismConfig {
            hostname: config.hostname,
            username: config.username,
            password: config.password,
            port: config.port,
            validate_certs: config.validate_certs,
        }
    }
}
