//! Per-thread conversation history.

use dashmap::DashMap;

use crate::types::Turn;

/// Storage for thread conversation history.
///
/// Implementations must keep every appended turn: two appends to the same
/// thread racing each other both land, in some order.
pub trait ConversationStore: Send + Sync {
    /// Append a turn to the end of the thread, creating the thread if needed.
    fn append(&self, thread_key: &str, turn: Turn);

    /// Returns the last `size` turns of the thread in their original order.
    ///
    /// Unknown threads yield an empty window.
    fn window(&self, thread_key: &str, size: usize) -> Vec<Turn>;

    /// Number of turns stored for the thread.
    fn len(&self, thread_key: &str) -> usize;

    /// Number of threads seen so far.
    fn thread_count(&self) -> usize;
}

/// Process-local store. History lives as long as the process does.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    threads: DashMap<String, Vec<Turn>>,
}

impl InMemoryConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn append(&self, thread_key: &str, turn: Turn) {
        // The entry guard holds the shard lock for the whole push.
        self.threads
            .entry(thread_key.to_string())
            .or_default()
            .push(turn);
    }

    fn window(&self, thread_key: &str, size: usize) -> Vec<Turn> {
        self.threads
            .get(thread_key)
            .map(|turns| {
                let start = turns.len().saturating_sub(size);
                turns.value()[start..].to_vec()
            })
            .unwrap_or_default()
    }

    fn len(&self, thread_key: &str) -> usize {
        self.threads.get(thread_key).map_or(0, |turns| turns.len())
    }

    fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::MessageRole;

    fn filled(key: &str, count: usize) -> InMemoryConversationStore {
        let store = InMemoryConversationStore::new();
        for i in 0..count {
            store.append(key, Turn::user(format!("message {i}")));
        }
        store
    }

    fn contents(turns: &[Turn]) -> Vec<&str> {
        turns.iter().map(Turn::content).collect()
    }

    #[test]
    fn unknown_thread_has_empty_window() {
        let store = InMemoryConversationStore::new();
        assert!(store.window("100.0", 5).is_empty());
        assert_eq!(store.len("100.0"), 0);
        assert_eq!(store.thread_count(), 0);
    }

    #[test]
    fn window_returns_appended_turns_in_order() {
        let store = InMemoryConversationStore::new();
        store.append("100.0", Turn::user("question"));
        store.append("100.0", Turn::assistant("answer"));

        let window = store.window("100.0", 5);
        assert_eq!(contents(&window), ["question", "answer"]);
        assert_eq!(window[0].role(), MessageRole::User);
        assert_eq!(window[1].role(), MessageRole::Assistant);
    }

    #[test]
    fn window_keeps_only_the_most_recent_turns() {
        let store = filled("t", 8);
        let window = store.window("t", 5);
        assert_eq!(
            contents(&window),
            ["message 3", "message 4", "message 5", "message 6", "message 7"]
        );
        // Storage itself is not truncated.
        assert_eq!(store.len("t"), 8);
    }

    #[test]
    fn window_larger_than_thread_returns_everything() {
        let store = filled("t", 3);
        assert_eq!(store.window("t", 10).len(), 3);
        assert!(store.window("t", 0).is_empty());
    }

    #[test]
    fn threads_are_isolated() {
        let store = InMemoryConversationStore::new();
        store.append("a", Turn::user("in a"));
        store.append("b", Turn::user("in b"));

        assert_eq!(contents(&store.window("a", 5)), ["in a"]);
        assert_eq!(contents(&store.window("b", 5)), ["in b"]);
        assert_eq!(store.thread_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_all_retained() {
        let store = Arc::new(InMemoryConversationStore::new());
        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.append("shared", Turn::user(i.to_string())) })
            })
            .collect();
        for task in tasks {
            task.await.expect("append task panicked");
        }

        assert_eq!(store.len("shared"), 64);
        let mut seen: Vec<usize> = store
            .window("shared", 64)
            .iter()
            .map(|turn| turn.content().parse().expect("numeric content"))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..64).collect::<Vec<_>>());
    }
}
