//! Service configuration read from the environment.

use std::time::Duration;

use dcevent_core::endpoints::{DEFAULT_API_BASE_URL, Endpoints};

use crate::error::AppError;

/// Runtime configuration of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the danceconvention.net REST API (`DCEVENT_API_URL`).
    pub api_base_url: String,
    /// Optional language passed as `?lang=` (`DCEVENT_LANG`).
    pub lang: Option<String>,
    /// Per-request timeout of upstream fetches (`DCEVENT_HTTP_TIMEOUT_SECS`).
    pub http_timeout: Duration,
    /// Bind host (`HOST`).
    pub host: String,
    /// Bind port (`PORT`).
    pub port: u16,
}

impl Config {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url =
            lookup("DCEVENT_API_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let lang = lookup("DCEVENT_LANG").filter(|l| !l.is_empty());
        let timeout_secs: u64 = lookup("DCEVENT_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|e| {
                AppError::Config(format!(
                    "DCEVENT_HTTP_TIMEOUT_SECS must be a number of seconds: {e}"
                ))
            })?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

        Ok(Self {
            api_base_url,
            lang,
            http_timeout: Duration::from_secs(timeout_secs),
            host,
            port,
        })
    }

    /// URL templates for the configured API.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DCEVENT_API_URL` is not an http(s) URL.
    pub fn endpoints(&self) -> Result<Endpoints, AppError> {
        Endpoints::new(&self.api_base_url)
            .map(|endpoints| endpoints.with_lang(self.lang.clone()))
            .map_err(|e| AppError::Config(format!("DCEVENT_API_URL: {e}")))
    }
}
