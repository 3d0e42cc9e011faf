use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{Comment, Post, User};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

use super::{
    comments_path, endpoint_url, read_json, take_data, CURRENT_USER_PATH, RECENT_MEDIA_PATH,
    TOKEN_PATH,
};

/// Client identity plus the authorization code of one sign-in attempt, and
/// the access token once the code has been exchanged.
#[derive(Clone)]
pub struct SessionCredential {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub code: String,
    access_token: Option<String>,
}

impl SessionCredential {
    pub fn new(config: &Config, code: impl Into<String>) -> Self {
        SessionCredential {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_uri.clone(),
            code: code.into(),
            access_token: None,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_url", &self.redirect_url)
            .field("code", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// One connection to the Instagram API: owns a credential set and at most
/// one access token.
#[derive(Debug, Clone)]
pub struct InstagramSession {
    http_client: Client,
    base_url: String,
    credential: SessionCredential,
    log_bodies: bool,
}

impl InstagramSession {
    pub fn new(http_client: Client, config: &Config, credential: SessionCredential) -> Self {
        InstagramSession {
            http_client,
            base_url: config.api_base_url.clone(),
            credential,
            log_bodies: config.debug,
        }
    }

    pub fn credential(&self) -> &SessionCredential {
        &self.credential
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_authenticated()
    }

    /// Exchanges the authorization code for an access token.
    ///
    /// Returns `Ok(true)` and stores the token when the response carries a
    /// non-empty `access_token`, `Ok(false)` when it does not. Transport
    /// failures, non-2xx statuses and unparseable bodies are errors.
    #[instrument(skip(self), fields(client_id = %self.credential.client_id))]
    pub async fn exchange_token(&mut self) -> AppResult<bool> {
        let url = endpoint_url(&self.base_url, TOKEN_PATH)?;
        debug!("Exchanging authorization code at {}", url);

        let params = [
            ("client_id", self.credential.client_id.as_str()),
            ("client_secret", self.credential.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.credential.redirect_url.as_str()),
            ("code", self.credential.code.as_str()),
        ];

        let response = self
            .http_client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("Token exchange request failed: {}", e);
                AppError::from_transport(e)
            })?;

        // Token bodies are never logged.
        let body = read_json(response, "/oauth/access_token", false).await?;

        match body.get("access_token").and_then(|v| v.as_str()) {
            Some(token) if !token.is_empty() => {
                self.credential.access_token = Some(token.to_string());
                info!("Access token obtained");
                Ok(true)
            }
            _ => {
                warn!("Token response has no usable access_token");
                Ok(false)
            }
        }
    }

    /// Recent posts of the signed-in user, newest first as the provider
    /// returns them. One malformed post fails the whole call.
    #[instrument(skip(self))]
    pub async fn fetch_recent_media(&self) -> AppResult<Vec<Post>> {
        let posts: Vec<Post> = self.get_data(RECENT_MEDIA_PATH).await?;
        info!("Fetched {} recent posts", posts.len());
        if let Some(newest) = posts.first().and_then(Post::created_at) {
            debug!("Newest post is from {}", newest);
        }
        Ok(posts)
    }

    #[instrument(skip(self))]
    pub async fn fetch_current_user(&self) -> AppResult<User> {
        let user: User = self.get_data(CURRENT_USER_PATH).await?;
        debug!("Fetched profile of {}", user.username);
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn fetch_comments(&self, media_id: &str) -> AppResult<Vec<Comment>> {
        let comments: Vec<Comment> = self.get_data(&comments_path(media_id)).await?;
        info!("Fetched {} comments for media {}", comments.len(), media_id);
        if let Some(latest) = comments.iter().filter_map(Comment::created_at).max() {
            debug!("Latest comment is from {}", latest);
        }
        Ok(comments)
    }

    /// GET an authenticated endpoint and unwrap its `data` field.
    async fn get_data<T: DeserializeOwned>(&self, segments: &[&str]) -> AppResult<T> {
        let token = self
            .credential
            .access_token()
            .filter(|t| !t.is_empty())
            .ok_or(AppError::NotAuthenticated)?;

        let url = endpoint_url(&self.base_url, segments)?;
        let endpoint = url.path().to_string();
        debug!("Fetching {}", endpoint);

        let response = self
            .http_client
            .get(url)
            .query(&[("access_token", token)])
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", endpoint, e);
                AppError::from_transport(e)
            })?;

        let envelope = read_json(response, &endpoint, self.log_bodies).await?;
        take_data(envelope)
    }
}
