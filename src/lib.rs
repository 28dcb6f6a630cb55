pub mod bot;
pub mod chatbot;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod slack;
pub mod types;

use error::Result;

/// Load configuration and serve Slack events until shutdown.
pub async fn run() -> Result<()> {
    bot::run().await
}
