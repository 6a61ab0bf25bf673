use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use cantoria_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Where member data and sessions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// In-process adapters seeded with one demo account per role.
    Memory,
    /// PostgreSQL for member data and a remote identity server for sessions.
    Remote {
        database_url: String,
        identity_url: Url,
        identity_api_key: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub console_host: String,
    pub console_port: u16,
    pub frontend_url: String,
    pub backend: BackendConfig,
}

impl ConsoleConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let console_host = lookup("CONSOLE_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let console_port = match lookup("CONSOLE_PORT") {
            Some(value) => value.parse::<u16>().map_err(|error| {
                AppError::Validation(format!("invalid CONSOLE_PORT '{value}': {error}"))
            })?,
            None => 3001,
        };
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());

        let backend = match lookup("BACKEND_MODE")
            .unwrap_or_else(|| "memory".to_owned())
            .as_str()
        {
            "memory" => BackendConfig::Memory,
            "remote" => {
                let identity_url = required_non_empty(&lookup, "IDENTITY_URL")?;
                BackendConfig::Remote {
                    database_url: required_non_empty(&lookup, "DATABASE_URL")?,
                    identity_url: Url::parse(&identity_url).map_err(|error| {
                        AppError::Validation(format!("invalid IDENTITY_URL: {error}"))
                    })?,
                    identity_api_key: required_non_empty(&lookup, "IDENTITY_API_KEY")?,
                }
            }
            other => {
                return Err(AppError::Validation(format!(
                    "BACKEND_MODE must be either 'memory' or 'remote', got '{other}'"
                )));
            }
        };

        Ok(Self {
            console_host,
            console_port,
            frontend_url,
            backend,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.console_host).map_err(|error| {
            AppError::Validation(format!(
                "invalid CONSOLE_HOST '{}': {error}",
                self.console_host
            ))
        })?;
        Ok(SocketAddr::from((host, self.console_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
