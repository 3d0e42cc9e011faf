use crate::api::{self, InstagramSession, SessionCredential};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{MediaViewModel, PostViewModel};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::session_store::{SessionKey, SessionStore};

/// Query string the provider appends when it sends the browser back.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_reason: Option<String>,
}

/// Result of a serving request: either a payload for the view layer, or
/// "start over" (the caller is not signed in, or the item is not there).
#[derive(Debug, PartialEq)]
pub enum Flow<T> {
    Render(T),
    Restart,
}

#[derive(Debug, PartialEq)]
pub enum CallbackOutcome {
    Authenticated(SessionKey),
    Restart,
}

/// Drives the sign-in redirect sequence and the pages served afterwards.
pub struct FlowController {
    config: Arc<Config>,
    http_client: Client,
    store: Arc<dyn SessionStore>,
}

impl FlowController {
    pub fn new(config: Arc<Config>, store: Arc<dyn SessionStore>) -> AppResult<Self> {
        let http_client = api::build_http_client(&config)?;
        Ok(FlowController {
            config,
            http_client,
            store,
        })
    }

    /// Where the browser goes when the user asks to sign in.
    pub fn authorization_url(&self) -> AppResult<Url> {
        api::authorization_url(&self.config)
    }

    /// Handles the provider callback. Any failure ends in `Restart`; no
    /// session is stored unless the token exchange succeeded.
    #[instrument(skip(self, params))]
    pub async fn complete_authorization(&self, params: CallbackParams) -> CallbackOutcome {
        if let Some(error) = params.error {
            info!(
                "Authorization denied: {} ({})",
                error,
                params.error_reason.as_deref().unwrap_or("no reason given")
            );
            return CallbackOutcome::Restart;
        }

        let code = match params.code {
            Some(code) if !code.is_empty() => code,
            _ => {
                warn!("Callback without authorization code");
                return CallbackOutcome::Restart;
            }
        };

        let credential = SessionCredential::new(&self.config, code);
        let mut session = InstagramSession::new(self.http_client.clone(), &self.config, credential);

        match session.exchange_token().await {
            Ok(true) => {}
            Ok(false) => return CallbackOutcome::Restart,
            Err(e) => {
                warn!("Token exchange failed: {}", e);
                return CallbackOutcome::Restart;
            }
        }

        let key = SessionKey::generate();
        if let Err(e) = self.store.save(key.clone(), session).await {
            warn!("Could not store session: {}", e);
            return CallbackOutcome::Restart;
        }

        info!("Signed in, session {:?}", key);
        CallbackOutcome::Authenticated(key)
    }

    /// Current user plus recent media.
    #[instrument(skip(self))]
    pub async fn media(&self, key: Option<&SessionKey>) -> AppResult<Flow<MediaViewModel>> {
        let Some(session) = self.current_session(key).await else {
            return Ok(Flow::Restart);
        };

        let media = session.fetch_recent_media().await?;
        let user = session.fetch_current_user().await?;

        Ok(Flow::Render(MediaViewModel { user, media }))
    }

    /// One post with its comments. Only the most recent page of media is
    /// searched; an id outside it restarts the flow.
    #[instrument(skip(self))]
    pub async fn post(
        &self,
        key: Option<&SessionKey>,
        media_id: &str,
    ) -> AppResult<Flow<PostViewModel>> {
        let Some(session) = self.current_session(key).await else {
            return Ok(Flow::Restart);
        };

        let recent = session.fetch_recent_media().await?;
        let Some(post) = recent.into_iter().find(|post| post.id == media_id) else {
            debug!("Media {} is not among the recent posts", media_id);
            return Ok(Flow::Restart);
        };

        debug!(
            "Found media {} ({} likes, {} comments)",
            post.id,
            post.like_count(),
            post.comment_count()
        );
        let comments = session.fetch_comments(&post.id).await?;
        Ok(Flow::Render(PostViewModel { post, comments }))
    }

    async fn current_session(&self, key: Option<&SessionKey>) -> Option<Arc<InstagramSession>> {
        let Some(key) = key else {
            debug!("Request without session cookie");
            return None;
        };

        let session = self.store.load(key).await;
        if session.is_none() {
            debug!("Unknown or expired session {:?}", key);
        }
        session
    }
}
