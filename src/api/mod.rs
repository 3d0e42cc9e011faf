pub mod instagram;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

pub use instagram::{InstagramSession, SessionCredential};

const USER_AGENT: &str = "feedchecker/0.2";

pub const AUTHORIZE_PATH: &[&str] = &["oauth", "authorize", ""];
pub const TOKEN_PATH: &[&str] = &["oauth", "access_token"];
pub const RECENT_MEDIA_PATH: &[&str] = &["v1", "users", "self", "media", "recent", ""];
pub const CURRENT_USER_PATH: &[&str] = &["v1", "users", "self", ""];

/// Comments endpoint for one media object: `/v1/media/{id}/comments`.
pub fn comments_path(media_id: &str) -> [&str; 4] {
    ["v1", "media", media_id, "comments"]
}

/// Builds the shared HTTP client used for every provider call
pub fn build_http_client(config: &Config) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(AppError::Network)
}

/// Resolves path segments against the provider origin. Each segment is
/// percent-encoded; a trailing empty segment yields a trailing slash.
pub fn endpoint_url(base_url: &str, segments: &[&str]) -> AppResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::Config(format!("invalid api base url '{}': {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Config(format!("api base url '{}' cannot be a base", base_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Authorization URL the browser is sent to in order to start the flow.
pub fn authorization_url(config: &Config) -> AppResult<Url> {
    let mut url = endpoint_url(&config.api_base_url, AUTHORIZE_PATH)?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("response_type", "code");
    Ok(url)
}

/// Reads the whole body, checks the status and parses JSON. The response is
/// consumed here, so the connection goes back to the pool on every path.
pub async fn read_json(response: Response, endpoint: &str, log_body: bool) -> AppResult<Value> {
    let status = response.status();
    let body = response.text().await.map_err(AppError::from_transport)?;

    if log_body {
        debug!("Response from {} ({}): {}", endpoint, status, body);
    }

    if !status.is_success() {
        error!("Provider returned status {} for {}", status, endpoint);
        return Err(AppError::Status {
            endpoint: endpoint.to_string(),
            status,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        error!("Failed to parse JSON from {}: {}", endpoint, e);
        AppError::Json(e)
    })
}

/// Unwraps the `{"data": ...}` envelope every read endpoint uses.
pub fn take_data<T: DeserializeOwned>(mut envelope: Value) -> AppResult<T> {
    match envelope.get_mut("data").map(Value::take) {
        Some(Value::Null) | None => Err(AppError::MissingField("data")),
        Some(data) => Ok(serde_json::from_value(data)?),
    }
}
