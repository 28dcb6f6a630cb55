//! Main handler for bot mentions.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::completion::CompletionGateway;
use crate::conversation::ConversationStore;
use crate::error::{APOLOGY_REPLY, BotError, Result};
use crate::slack::AppMention;
use crate::types::Turn;

use super::response::ReplySender;

/// Everything needed to answer a mention.
pub struct Chatbot {
    store: Arc<dyn ConversationStore>,
    gateway: CompletionGateway,
    context_window: usize,
}

impl Chatbot {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        gateway: CompletionGateway,
        context_window: usize,
    ) -> Self {
        Self {
            store,
            gateway,
            context_window,
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn ConversationStore {
        &*self.store
    }

    /// Produce the reply text for a mention, recording the exchange.
    ///
    /// Never fails: problems are logged and turned into a canned reply.
    pub async fn respond(&self, mention: &AppMention) -> String {
        info!(
            "Received mention from {} in channel {}, thread {}",
            mention.user.as_deref().unwrap_or("unknown user"),
            mention.channel,
            mention.thread_key()
        );

        let prompt = match mention.prompt() {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Ignoring mention in channel {}: {e}", mention.channel);
                return e.user_message().to_string();
            }
        };

        let thread_key = mention.thread_key();
        self.store.append(thread_key, Turn::user(prompt));
        let window = self.store.window(thread_key, self.context_window);
        debug!(
            "Thread {thread_key} context window has {} turns",
            window.len()
        );

        match self.gateway.complete(&window).await {
            Ok(reply) => {
                self.store.append(thread_key, Turn::assistant(reply.clone()));
                reply
            }
            Err(e) => {
                let e = BotError::from(e);
                error!("Completion failed for thread {thread_key}: {e}");
                e.user_message().to_string()
            }
        }
    }

    /// Answer a mention and post the reply into its thread.
    ///
    /// # Errors
    ///
    /// Returns an error only if the reply could not be delivered.
    pub async fn handle_mention(
        &self,
        mention: &AppMention,
        replier: &dyn ReplySender,
    ) -> Result<()> {
        let reply = self.respond(mention).await;
        replier
            .send_reply(&mention.channel, mention.thread_key(), &reply)
            .await
    }
}

/// Handle a mention in the background, outside the webhook request.
///
/// A panic inside the handler is caught here, logged, and answered with the
/// apology reply so the thread is never left without a response.
pub fn dispatch_mention(
    chatbot: Arc<Chatbot>,
    replier: Arc<dyn ReplySender>,
    mention: AppMention,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let worker = {
            let replier = Arc::clone(&replier);
            let mention = mention.clone();
            tokio::spawn(async move { chatbot.handle_mention(&mention, replier.as_ref()).await })
        };

        let outcome = match worker.await {
            Ok(result) => result,
            Err(join_error) => {
                error!(
                    "Mention handler for thread {} aborted: {join_error}",
                    mention.thread_key()
                );
                replier
                    .send_reply(&mention.channel, mention.thread_key(), APOLOGY_REPLY)
                    .await
                    .map_err(|e| BotError::Internal(format!("{join_error}; apology failed: {e}")))
            }
        };

        if let Err(e) = outcome {
            error!(
                "Failed to reply in channel {}, thread {}: {e}",
                mention.channel,
                mention.thread_key()
            );
        }
    })
}
