//! Reply sending for Slack threads.

use async_trait::async_trait;
use log::debug;

use crate::error::Result;
use crate::slack::SlackClient;

/// Capability to post a text reply into a conversation thread.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_reply(&self, channel: &str, thread_key: &str, text: &str) -> Result<()>;
}

#[async_trait]
impl ReplySender for SlackClient {
    async fn send_reply(&self, channel: &str, thread_key: &str, text: &str) -> Result<()> {
        self.post_message(channel, thread_key, text).await?;
        debug!(
            "Replied in channel {channel}, thread {thread_key} ({} characters)",
            text.len()
        );
        Ok(())
    }
}
