use thiserror::Error;

use crate::completion::CompletionError;

/// Reply sent when the mention could not be interpreted.
pub const NOT_UNDERSTOOD_REPLY: &str =
    "Sorry, I didn't understand your message. Could you rephrase it?";

/// Reply sent for every other failure.
pub const APOLOGY_REPLY: &str = "Sorry, I encountered an error. Please try again later.";

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event handler failed: {0}")]
    Internal(String),
}

impl BotError {
    /// Returns the text shown to the Slack user.
    ///
    /// Upstream details are logged, never replied.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            BotError::InvalidEvent(_) => NOT_UNDERSTOOD_REPLY,
            _ => APOLOGY_REPLY,
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
