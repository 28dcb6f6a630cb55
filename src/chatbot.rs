//! AI chatbot module - handles bot mentions and thread conversations.

mod handler;
mod response;

pub use handler::{Chatbot, dispatch_mention};
pub use response::ReplySender;
