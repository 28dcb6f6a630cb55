//! Minimal Slack Web API client.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    thread_ts: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthAccessResponse {
    ok: bool,
    error: Option<String>,
    access_token: Option<String>,
    team: Option<Team>,
}

#[derive(Debug, Deserialize)]
struct Team {
    id: String,
    name: Option<String>,
}

/// Workspace credentials returned by a completed OAuth installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthAccess {
    pub access_token: String,
    pub team_id: String,
    pub team_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Same API endpoint and connection pool, different workspace token.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            api_url: self.api_url.clone(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_url)
    }

    /// Post `text` as a reply in the given thread.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when Slack answers `ok: false`.
    pub async fn post_message(&self, channel: &str, thread_ts: &str, text: &str) -> Result<()> {
        debug!("Posting reply to channel {channel}, thread {thread_ts}");

        let response = self
            .client
            .post(self.method_url("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&PostMessageRequest {
                channel,
                text,
                thread_ts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::SlackApi(format!(
                "chat.postMessage returned {status}"
            )));
        }

        let body: ApiResponse = response.json().await?;
        if !body.ok {
            return Err(BotError::SlackApi(
                body.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        Ok(())
    }

    /// Exchange an OAuth authorization code for a workspace access token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when Slack rejects the code.
    pub async fn oauth_access(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<OAuthAccess> {
        debug!("Exchanging OAuth code for workspace token");

        let response = self
            .client
            .post(self.method_url("oauth.v2.access"))
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::SlackApi(format!(
                "oauth.v2.access returned {status}"
            )));
        }

        let body: OAuthAccessResponse = response.json().await?;
        if !body.ok {
            return Err(BotError::SlackApi(
                body.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        match (body.access_token, body.team) {
            (Some(access_token), Some(team)) => Ok(OAuthAccess {
                access_token,
                team_id: team.id,
                team_name: team.name,
            }),
            _ => Err(BotError::SlackApi(
                "oauth.v2.access response is missing the token or team".to_string(),
            )),
        }
    }
}
