//! Conversation memory.

use crate::types::ConversationTurn;
use std::collections::VecDeque;

/// Default number of turns kept.
pub const DEFAULT_MAX_TURNS: usize = 20;

/// Ordered question/answer history with an optional turn window.
///
/// When the window is full, appending evicts the oldest turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    max_turns: Option<usize>,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MAX_TURNS))
    }
}

impl ConversationMemory {
    /// `None` keeps every turn for the session lifetime.
    pub fn new(max_turns: Option<usize>) -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        if let Some(max) = self.max_turns {
            while self.turns.len() > max {
                self.turns.pop_front();
            }
        }
    }

    /// History oldest-first, for inclusion in the next prompt.
    pub fn as_context(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    /// Render as `Human:`/`Assistant:` lines; empty when there is no history.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("Human: {}\nAssistant: {}", turn.question, turn.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }
}
