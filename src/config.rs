use clap::Parser;
use reqwest::Url;

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_BASE_URL: &str = "https://api.instagram.com";
const MAX_TIMEOUT_SECS: u64 = 120;
const RESERVED_PATHS: &[&str] = &["/", "/media", "/health"];

#[derive(Parser, Clone)]
#[command(name = "feedchecker")]
#[command(author = "Dabe Vlohn")]
#[command(version = "0.2.0")]
#[command(about = "Instagram OAuth client that shows your recent posts and comments")]
pub struct Config {
    /// OAuth client ID registered with the provider
    /// env: FEEDCHECKER_CLIENT_ID
    #[arg(long, env = "FEEDCHECKER_CLIENT_ID")]
    pub client_id: String,

    /// OAuth client secret
    /// env: FEEDCHECKER_CLIENT_SECRET
    #[arg(long, env = "FEEDCHECKER_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Redirect URI registered with the provider; its path is where the
    /// callback route is mounted
    /// env: FEEDCHECKER_REDIRECT_URI
    #[arg(long, env = "FEEDCHECKER_REDIRECT_URI")]
    pub redirect_uri: String,

    /// Provider origin (default: https://api.instagram.com)
    /// env: FEEDCHECKER_API_BASE_URL
    #[arg(long, env = "FEEDCHECKER_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Listen address (default: 127.0.0.1)
    /// env: FEEDCHECKER_ADDRESS
    #[arg(long, env = "FEEDCHECKER_ADDRESS", default_value = "127.0.0.1")]
    pub address: String,

    /// HTTP port (default: 8080)
    /// env: FEEDCHECKER_PORT
    #[arg(long, env = "FEEDCHECKER_PORT", default_value = "8080")]
    pub port: u16,

    /// Timeout in seconds for every provider call
    /// env: FEEDCHECKER_TIMEOUT_SECS
    #[arg(long, env = "FEEDCHECKER_TIMEOUT_SECS", default_value = "15")]
    pub timeout_secs: u64,

    /// Idle lifetime of a signed-in session, in seconds
    /// env: FEEDCHECKER_SESSION_TTL_SECS
    #[arg(long, env = "FEEDCHECKER_SESSION_TTL_SECS", default_value = "3600")]
    pub session_ttl_secs: u64,

    /// Log raw provider responses
    #[arg(long, env = "FEEDCHECKER_DEBUG")]
    pub debug: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("api_base_url", &self.api_base_url)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("timeout_secs", &self.timeout_secs)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Config {
    /// Checks the configuration once at startup
    pub fn validate(&self) -> AppResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(AppError::Config("client id must not be empty".to_string()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(AppError::Config(
                "client secret must not be empty".to_string(),
            ));
        }

        self.callback_path()?;
        parse_absolute(&self.api_base_url, "api base url")?;

        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(AppError::Config(format!(
                "timeout must be between 1 and {} seconds",
                MAX_TIMEOUT_SECS
            )));
        }
        if self.session_ttl_secs == 0 {
            return Err(AppError::Config(
                "session ttl must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Path component of the redirect URI, used as the callback route.
    pub fn callback_path(&self) -> AppResult<String> {
        let url = parse_absolute(&self.redirect_uri, "redirect uri")?;
        let path = url.path();
        if RESERVED_PATHS.contains(&path) || path.starts_with("/post/") {
            return Err(AppError::Config(format!(
                "redirect uri path '{}' collides with a built-in route",
                path
            )));
        }
        Ok(path.to_string())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

fn parse_absolute(value: &str, what: &str) -> AppResult<Url> {
    let url = Url::parse(value)
        .map_err(|e| AppError::Config(format!("invalid {} '{}': {}", what, value, e)))?;
    if url.cannot_be_a_base() {
        return Err(AppError::Config(format!(
            "{} '{}' is not an absolute http(s) url",
            what, value
        )));
    }
    Ok(url)
}

#[cfg(test)]
pub(crate) fn test_config(api_base_url: &str) -> Config {
    Config::parse_from([
        "feedchecker",
        "--client-id",
        "test_client",
        "--client-secret",
        "test_secret",
        "--redirect-uri",
        "http://localhost:8080/access",
        "--api-base-url",
        api_base_url,
        "--timeout-secs",
        "5",
    ])
}
