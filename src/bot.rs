//! Slack webhook server and event routing.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use log::{debug, error, info, warn};
use serde::Deserialize;

use crate::chatbot::{Chatbot, ReplySender, dispatch_mention};
use crate::completion::CompletionGateway;
use crate::config::{Config, OAuthConfig};
use crate::conversation::InMemoryConversationStore;
use crate::error::Result;
use crate::slack::{
    AppMention, EventEnvelope, InstallationStore, SlackClient, authorize_url, verify_signature,
};

pub const EVENTS_PATH: &str = "/slack/events";
pub const INSTALL_PATH: &str = "/slack/install";
pub const OAUTH_REDIRECT_PATH: &str = "/slack/oauth_redirect";

/// Shared state behind every route.
pub struct AppState {
    pub chatbot: Arc<Chatbot>,
    pub slack: SlackClient,
    pub signing_secret: String,
    pub installations: InstallationStore,
    pub oauth: Option<OAuthConfig>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        debug!("Initializing completion gateway");
        let gateway = CompletionGateway::new(&config.completion);
        let store = Arc::new(InMemoryConversationStore::new());

        Self {
            chatbot: Arc::new(Chatbot::new(store, gateway, config.context_window)),
            slack: SlackClient::new(&config.slack.api_url, &config.slack.bot_token),
            signing_secret: config.slack.signing_secret.clone(),
            installations: InstallationStore::new(),
            oauth: config.oauth.clone(),
        }
    }

    /// Client carrying the token of the workspace the event came from.
    fn replier_for(&self, team_id: Option<&str>) -> SlackClient {
        match team_id.and_then(|team| self.installations.token(team)) {
            Some(token) => self.slack.with_token(token),
            None => self.slack.clone(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(EVENTS_PATH, post(handle_events))
        .route(INSTALL_PATH, get(handle_install))
        .route(OAUTH_REDIRECT_PATH, get(handle_oauth_redirect))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Run the webhook server until Ctrl-C.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;
    let state = Arc::new(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Listening for Slack events on port {}", config.port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {e}");
            }
            info!("Shutdown signal received, shutting down...");
        })
        .await?;

    Ok(())
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

async fn handle_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = verify_signature(
        &state.signing_secret,
        header(&headers, "X-Slack-Request-Timestamp"),
        header(&headers, "X-Slack-Signature"),
        &body,
        Utc::now().timestamp(),
    ) {
        warn!("Rejected Slack request: {e}");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let envelope: EventEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Failed to parse Slack request body: {e}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if let Some(challenge) = &envelope.challenge {
        info!("Answering Slack endpoint verification");
        return Json(serde_json::json!({ "challenge": challenge })).into_response();
    }

    if envelope.kind.as_deref() != Some("event_callback") {
        debug!("Ignoring Slack payload of type {:?}", envelope.kind);
        return StatusCode::OK.into_response();
    }

    match envelope.event_type() {
        Some("app_mention") => {
            let event = envelope.event.clone().unwrap_or_default();
            match serde_json::from_value::<AppMention>(event) {
                Ok(mention) => {
                    let replier: Arc<dyn ReplySender> =
                        Arc::new(state.replier_for(envelope.team_id.as_deref()));
                    dispatch_mention(Arc::clone(&state.chatbot), replier, mention);
                }
                Err(e) => warn!("Dropping malformed app_mention event: {e}"),
            }
        }
        other => debug!("Ignoring unhandled Slack event type {other:?}"),
    }

    StatusCode::OK.into_response()
}

async fn handle_install(State(state): State<Arc<AppState>>) -> Response {
    let Some(oauth) = &state.oauth else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match authorize_url(&oauth.client_id) {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            error!("Failed to build Slack authorize URL: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct OAuthCallback {
    code: Option<String>,
    error: Option<String>,
}

async fn handle_oauth_redirect(
    State(state): State<Arc<AppState>>,
    Query(callback): Query<OAuthCallback>,
) -> Response {
    let Some(oauth) = &state.oauth else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(reason) = callback.error {
        warn!("Slack installation was not approved: {reason}");
        return (StatusCode::BAD_REQUEST, "Installation cancelled").into_response();
    }
    let Some(code) = callback.code else {
        return (StatusCode::BAD_REQUEST, "Missing authorization code").into_response();
    };

    match state
        .slack
        .oauth_access(&oauth.client_id, &oauth.client_secret, &code)
        .await
    {
        Ok(access) => {
            let team = access
                .team_name
                .clone()
                .unwrap_or_else(|| access.team_id.clone());
            state.installations.insert(access.team_id, access.access_token);
            info!(
                "Installed to workspace {team} ({} installations)",
                state.installations.len()
            );
            format!("Installed to {team}").into_response()
        }
        Err(e) => {
            error!("OAuth code exchange failed: {e}");
            (StatusCode::BAD_GATEWAY, "Installation failed").into_response()
        }
    }
}
