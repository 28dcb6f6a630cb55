//! Events API payloads consumed by the relay.

use serde::Deserialize;

use crate::error::{BotError, Result};

/// Outer body of an Events API request.
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Endpoint verification token, echoed back as-is.
    pub challenge: Option<serde_json::Value>,
    pub team_id: Option<String>,
    pub event: Option<serde_json::Value>,
}

impl EventEnvelope {
    /// Inner event type, e.g. `app_mention`.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.event.as_ref()?.get("type")?.as_str()
    }
}

/// An `app_mention` event.
#[derive(Debug, Clone, Deserialize)]
pub struct AppMention {
    pub text: Option<String>,
    pub user: Option<String>,
    pub channel: String,
    pub ts: String,
    pub thread_ts: Option<String>,
}

impl AppMention {
    /// Key of the thread this mention belongs to.
    ///
    /// A top-level mention starts a new thread keyed by its own timestamp.
    #[must_use]
    pub fn thread_key(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }

    /// Message text with the leading bot mention removed.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::InvalidEvent`] when there is no text left to answer.
    pub fn prompt(&self) -> Result<String> {
        let text = self
            .text
            .as_deref()
            .ok_or_else(|| BotError::InvalidEvent("mention has no text".to_string()))?;
        let prompt = strip_bot_mention(text);
        if prompt.is_empty() {
            return Err(BotError::InvalidEvent(
                "mention has no text besides the mention itself".to_string(),
            ));
        }
        Ok(prompt)
    }
}

/// Remove the leading address to the bot, either a `<@USER>` token or a
/// plain `@name` word. Mentions later in the text are kept.
#[must_use]
pub fn strip_bot_mention(text: &str) -> String {
    let trimmed = text.trim_start();
    let rest = if let Some(after) = trimmed.strip_prefix("<@") {
        after.find('>').map_or(trimmed, |end| &after[end + 1..])
    } else if trimmed.starts_with('@') {
        trimmed
            .split_once(char::is_whitespace)
            .map_or("", |(_, tail)| tail)
    } else {
        trimmed
    };
    rest.trim().to_string()
}
