//! Bounded conversation log owned by the session

use tracing::debug;

use crate::pipeline::Message;

/// Ordered message log carried between turns
///
/// Holds at most `max_messages`; when a replacement is longer the oldest
/// messages are dropped.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Vec<Message>,
    max_messages: usize,
}

impl ConversationStore {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages: max_messages.max(1),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replace the log with the messages from a finished run
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            debug!("Dropping {} oldest messages", excess);
            self.messages.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_clear() {
        let mut store = ConversationStore::new(10);
        store.replace(vec![Message::user("hi"), Message::assistant("hello")]);
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_bounded_keeps_newest() {
        let mut store = ConversationStore::new(3);
        let messages = (0..5).map(|i| Message::user(i.to_string())).collect();
        store.replace(messages);

        let kept: Vec<&str> = store.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(kept, vec!["2", "3", "4"]);
    }
}
