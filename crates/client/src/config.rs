//! # Client Configuration Module
//!
//! Loads the settings the booking client needs from environment variables,
//! falling back to defaults that match a locally running backend.
//!
//! ## Environment Variables
//!
//! - `API_BASE_URL`: Backend address (default: "http://localhost:8015")
//! - `API_AUTH_SCHEME`: How the token is sent, "raw" or "bearer" (default: "raw")
//! - `API_REQUEST_TIMEOUT_SECONDS`: Per-request timeout (default: 10)
//! - `ROOMBOOK_TIMEZONE`: IANA zone the booking days are laid out in (default: "UTC")
//! - `ROOMBOOK_DAY_START` / `ROOMBOOK_DAY_END`: Bookable window (default: "06:00" / "24:00")
//! - `ROOMBOOK_SESSION_FILE`: Where the CLI keeps the session (default: ".roombook-session.json")
//! - `LOG_LEVEL`: Logging level (default: "info")

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use chrono_tz::Tz;
use eyre::{eyre, Result, WrapErr};
use roombook_core::slots::{SlotWindow, DEFAULT_STEP_MINUTES};
use tracing::Level;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8015";
pub const DEFAULT_SESSION_FILE: &str = ".roombook-session.json";

/// How the session token is placed in the `Authorization` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthScheme {
    /// The token alone, which is what the booking backend parses.
    #[default]
    Raw,
    /// `Bearer <token>`, for deployments behind a standard gateway.
    Bearer,
}

impl AuthScheme {
    pub fn header_value(self, token: &str) -> String {
        match self {
            AuthScheme::Raw => token.to_string(),
            AuthScheme::Bearer => format!("Bearer {}", token),
        }
    }
}

impl FromStr for AuthScheme {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(AuthScheme::Raw),
            "bearer" => Ok(AuthScheme::Bearer),
            other => Err(eyre!("Unknown auth scheme '{}', expected raw or bearer", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash
    pub base_url: String,

    pub auth_scheme: AuthScheme,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Zone the day's slots are generated in
    pub timezone: Tz,

    /// Bookable part of each day
    pub slot_window: SlotWindow,

    pub session_file: PathBuf,

    pub log_level: Level,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_scheme: AuthScheme::default(),
            request_timeout: 10,
            timezone: Tz::UTC,
            slot_window: SlotWindow::default(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            log_level: Level::INFO,
        }
    }
}

impl ClientConfig {
    /// Creates a ClientConfig from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `API_AUTH_SCHEME`, `ROOMBOOK_TIMEZONE` or the day
    /// window variables are set to values that cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("API_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.base_url);

        let auth_scheme = match lookup("API_AUTH_SCHEME") {
            Some(scheme) => scheme.parse().wrap_err("Invalid API_AUTH_SCHEME value")?,
            None => defaults.auth_scheme,
        };

        let request_timeout = lookup("API_REQUEST_TIMEOUT_SECONDS")
            .and_then(|secs| secs.trim().parse().ok())
            .unwrap_or(defaults.request_timeout);

        let timezone = match lookup("ROOMBOOK_TIMEZONE") {
            Some(tz) => tz
                .trim()
                .parse::<Tz>()
                .map_err(|e| eyre!("Invalid ROOMBOOK_TIMEZONE value: {}", e))?,
            None => defaults.timezone,
        };

        let slot_window = match (lookup("ROOMBOOK_DAY_START"), lookup("ROOMBOOK_DAY_END")) {
            (None, None) => defaults.slot_window,
            (start, end) => {
                let start = start.unwrap_or_else(|| defaults.slot_window.start().to_string());
                let end = end.unwrap_or_else(|| defaults.slot_window.end().to_string());
                SlotWindow::parse(&start, &end, DEFAULT_STEP_MINUTES)
                    .map_err(|e| eyre!("Invalid ROOMBOOK_DAY_START/ROOMBOOK_DAY_END: {}", e))?
            }
        };

        let session_file = lookup("ROOMBOOK_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);

        let log_level = match lookup("LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        Ok(Self {
            base_url,
            auth_scheme,
            request_timeout,
            timezone,
            slot_window,
            session_file,
            log_level,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Joins `path` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
