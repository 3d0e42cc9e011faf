use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::flow::{CallbackOutcome, CallbackParams, Flow, FlowController};
use super::session_store::SessionKey;
use crate::error::AppResult;

pub const SESSION_COOKIE: &str = "feedchecker_session";

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>FeedChecker</title></head>
<body>
<h1>FeedChecker</h1>
<p>Sign in with Instagram to see your recent posts and their comments.</p>
<form method="post" action="/"><button type="submit">Log in</button></form>
</body>
</html>
"#;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    flow: Arc<FlowController>,
}

impl AppState {
    pub fn new(flow: Arc<FlowController>) -> Self {
        Self { flow }
    }
}

/// Builds the router; the callback is mounted at `callback_path`.
pub fn create_router(state: AppState, callback_path: &str) -> Router {
    Router::new()
        .route("/", get(index).post(login))
        .route(callback_path, get(access))
        .route("/media", get(media))
        .route("/post/:media_id", get(post))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn login(State(state): State<AppState>) -> AppResult<Redirect> {
    let url = state.flow.authorization_url()?;
    debug!("Redirecting to provider authorization page");
    Ok(Redirect::to(url.as_str()))
}

async fn access(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match state.flow.complete_authorization(params).await {
        CallbackOutcome::Authenticated(key) => (
            AppendHeaders([(header::SET_COOKIE, session_cookie(&key))]),
            Redirect::to("/media"),
        )
            .into_response(),
        CallbackOutcome::Restart => restart(),
    }
}

async fn media(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let key = session_key(&headers);
    Ok(render(state.flow.media(key.as_ref()).await?))
}

async fn post(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let key = session_key(&headers);
    Ok(render(state.flow.post(key.as_ref(), &media_id).await?))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

fn render<T: Serialize>(flow: Flow<T>) -> Response {
    match flow {
        Flow::Render(view) => Json(view).into_response(),
        Flow::Restart => restart(),
    }
}

fn restart() -> Response {
    Redirect::to("/").into_response()
}

fn session_cookie(key: &SessionKey) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        key.as_str()
    )
}

/// Finds our cookie among all `Cookie` headers.
fn session_key(headers: &HeaderMap) -> Option<SessionKey> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionKey::parse(value))
}
