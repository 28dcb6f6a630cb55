//! Completion provider gateway - turns a conversation window into generated text.

mod gateway;
mod provider;

use thiserror::Error;

pub use gateway::CompletionGateway;
pub use provider::Provider;

/// Why a completion attempt produced no text.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Completion API error ({status}): {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Completion response error: {0}")]
    Response(String),
}

/// Outcome of exactly one completion attempt.
pub type CompletionResult = std::result::Result<String, CompletionError>;
