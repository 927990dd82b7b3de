//! Configuration module for environment variable parsing.
//!
//! Configuration is read once at startup and injected into the web layer
//! and publisher as an explicit struct. Nothing downstream touches the
//! process environment.

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_COMPOSIO_API_URL: &str = "https://api.composio.dev";

/// Fatal configuration problems detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("either COMPOSIO_API_KEY or NOTION_API_KEY must be set")]
    NoDestination,
}

/// Where created records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Direct writes against the Notion pages API.
    Notion {
        api_key: String,
        base_url: String,
        version: String,
    },
    /// Writes routed through Composio's Notion row-insert action.
    Composio { api_key: String, base_url: String },
}

impl Destination {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Destination::Notion { .. } => "notion",
            Destination::Composio { .. } => "composio",
        }
    }
}

/// Bounded exponential backoff for outbound publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(5000),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret Smartlead signs webhook bodies with
    pub webhook_secret: String,

    /// Target Notion database identifier
    pub database_id: String,

    /// Outbound write target and its credentials
    pub destination: Destination,

    /// Per-attempt HTTP timeout for outbound calls
    pub request_timeout: Duration,

    /// Retry schedule for transient publish failures
    pub retry: RetryPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let webhook_secret =
            get("SMARTLEAD_WEBHOOK_SECRET").ok_or(ConfigError::Missing("SMARTLEAD_WEBHOOK_SECRET"))?;

        let database_id =
            get("NOTION_DATABASE_ID").ok_or(ConfigError::Missing("NOTION_DATABASE_ID"))?;

        let destination = match (get("COMPOSIO_API_KEY"), get("NOTION_API_KEY")) {
            (Some(api_key), _) => Destination::Composio {
                api_key,
                base_url: trim_base_url(
                    get("COMPOSIO_API_URL").unwrap_or_else(|| DEFAULT_COMPOSIO_API_URL.to_string()),
                ),
            },
            (None, Some(api_key)) => Destination::Notion {
                api_key,
                base_url: trim_base_url(
                    get("NOTION_API_URL").unwrap_or_else(|| DEFAULT_NOTION_API_URL.to_string()),
                ),
                version: get("NOTION_VERSION").unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
            },
            (None, None) => return Err(ConfigError::NoDestination),
        };

        let defaults = RetryPolicy::default();

        let retry = RetryPolicy {
            max_attempts: parse_or(&get, "PUBLISH_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            base_delay: Duration::from_millis(parse_or(
                &get,
                "PUBLISH_BASE_DELAY_MS",
                defaults.base_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(parse_or(
                &get,
                "PUBLISH_MAX_DELAY_MS",
                defaults.max_delay.as_millis() as u64,
            )),
        };

        Ok(Config {
            port: parse_or(&get, "PORT", 8080),
            webhook_secret,
            database_id,
            destination,
            request_timeout: Duration::from_millis(parse_or(&get, "REQUEST_TIMEOUT_MS", 30_000)),
            retry,
        })
    }
}

/// Parse a numeric variable, falling back to `default` when unset or invalid.
fn parse_or<G, T>(get: &G, name: &str, default: T) -> T
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = match get(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
