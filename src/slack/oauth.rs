//! OAuth installation support: authorize URL and per-workspace tokens.

use dashmap::DashMap;
use url::Url;

const AUTHORIZE_URL: &str = "https://slack.com/oauth/v2/authorize";
const BOT_SCOPES: &str = "app_mentions:read,chat:write";

/// Slack's install page for this app.
///
/// # Errors
///
/// Never in practice; the base URL is a constant.
pub fn authorize_url(client_id: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        AUTHORIZE_URL,
        &[("client_id", client_id), ("scope", BOT_SCOPES)],
    )
}

/// Access tokens of workspaces that installed the app, keyed by team id.
#[derive(Debug, Default)]
pub struct InstallationStore {
    tokens: DashMap<String, String>,
}

impl InstallationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) a workspace's token.
    pub fn insert(&self, team_id: impl Into<String>, access_token: impl Into<String>) {
        self.tokens.insert(team_id.into(), access_token.into());
    }

    #[must_use]
    pub fn token(&self, team_id: &str) -> Option<String> {
        self.tokens.get(team_id).map(|token| token.value().clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
