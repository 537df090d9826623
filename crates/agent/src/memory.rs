//! Rolling conversation memory.
//!
//! Keeps the last few question/answer pairs so follow-up questions can be
//! answered with the earlier exchange in view.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Interactions kept when no capacity is configured.
pub const DEFAULT_MEMORY_CAPACITY: usize = 5;

/// One completed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub query: String,
    pub response: String,
}

/// Bounded FIFO buffer of interactions.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    entries: VecDeque<Interaction>,
    capacity: usize,
}

impl ConversationMemory {
    /// Memory holding at most `capacity` interactions (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an interaction, evicting the oldest one when full.
    pub fn add_interaction(&mut self, query: impl Into<String>, response: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Interaction {
            query: query.into(),
            response: response.into(),
        });
    }

    /// Render all interactions, oldest first, as `User:` / `Assistant:`
    /// lines. Empty when there is nothing to remember.
    pub fn get_context(&self) -> String {
        self.entries
            .iter()
            .flat_map(|i| [format!("User: {}", i.query), format!("Assistant: {}", i.response)])
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.entries.iter()
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context() {
        let memory = ConversationMemory::default();
        assert_eq!(memory.get_context(), "");
        assert!(memory.is_empty());
        assert_eq!(memory.capacity(), 5);
    }

    #[test]
    fn test_single_interaction_context() {
        let mut memory = ConversationMemory::default();
        memory.add_interaction("What is a plaint?", "The document that starts a suit.");
        assert_eq!(
            memory.get_context(),
            "User: What is a plaint?\nAssistant: The document that starts a suit."
        );
    }

    #[test]
    fn test_oldest_evicted_first() {
        let mut memory = ConversationMemory::default();
        for i in 1..=6 {
            memory.add_interaction(format!("q{}", i), format!("a{}", i));
        }

        assert_eq!(memory.len(), 5);
        let queries: Vec<&str> = memory.iter().map(|i| i.query.as_str()).collect();
        assert_eq!(queries, vec!["q2", "q3", "q4", "q5", "q6"]);
        assert!(!memory.get_context().contains("q1"));
        assert!(memory.get_context().starts_with("User: q2\nAssistant: a2"));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut memory = ConversationMemory::new(3);
        for i in 0..20 {
            memory.add_interaction(i.to_string(), i.to_string());
            assert!(memory.len() <= 3);
        }
    }

    #[test]
    fn test_zero_capacity_raised_to_one() {
        let mut memory = ConversationMemory::new(0);
        memory.add_interaction("a", "b");
        memory.add_interaction("c", "d");
        assert_eq!(memory.capacity(), 1);
        assert_eq!(memory.get_context(), "User: c\nAssistant: d");
    }

    #[test]
    fn test_clear() {
        let mut memory = ConversationMemory::default();
        memory.add_interaction("q", "a");
        memory.clear();
        assert_eq!(memory.get_context(), "");
        assert_eq!(memory.len(), 0);
    }
}
