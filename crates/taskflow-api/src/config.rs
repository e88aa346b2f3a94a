//! Server configuration read from the environment.

use std::net::SocketAddr;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_WORKSPACE_ID: &str = "default";

/// Runtime settings for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Workspace stamped on events created through the API.
    pub workspace_id: String,
}

impl ApiConfig {
    /// Reads `HOST`, `PORT` and `TASKFLOW_WORKSPACE_ID`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `PORT` is not a valid u16 or
    /// `TASKFLOW_WORKSPACE_ID` is blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => DEFAULT_PORT,
        };
        let workspace_id =
            lookup("TASKFLOW_WORKSPACE_ID").unwrap_or_else(|| DEFAULT_WORKSPACE_ID.to_owned());
        if workspace_id.trim().is_empty() {
            return Err(AppError::Config(
                "TASKFLOW_WORKSPACE_ID must not be blank".to_owned(),
            ));
        }
        Ok(Self {
            host,
            port,
            workspace_id,
        })
    }

    /// The address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unparseable `HOST:PORT` pair.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
