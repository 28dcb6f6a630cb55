//! Slack collaborator: inbound event payloads, request signing, Web API calls.

mod client;
mod events;
mod oauth;
mod signature;

pub use client::{OAuthAccess, SlackClient};
pub use events::{AppMention, EventEnvelope, strip_bot_mention};
pub use oauth::{InstallationStore, authorize_url};
pub use signature::{SignatureError, compute_signature, verify_signature};
