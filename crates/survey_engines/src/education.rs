#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use survey_kernel_contracts::role::CreditRole;

use crate::catalog::credit_definitions;

/// Flashcards shown before the assignment page. Purely informational: moving
/// on to the assignment page never depends on this state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardDeck {
    cards: Vec<CreditRole>,
    current: usize,
    flipped: BTreeSet<usize>,
    viewed_all: bool,
}

impl Default for FlashcardDeck {
    fn default() -> Self {
        Self::new(credit_definitions())
    }
}

impl FlashcardDeck {
    pub fn new(cards: Vec<CreditRole>) -> Self {
        Self {
            cards,
            current: 0,
            flipped: BTreeSet::new(),
            viewed_all: false,
        }
    }

    pub fn current_card(&self) -> Option<&CreditRole> {
        self.cards.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Moving past the last card marks the deck as viewed.
    pub fn next(&mut self) {
        if self.current + 1 < self.cards.len() {
            self.current += 1;
        } else {
            self.viewed_all = true;
        }
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn go_to(&mut self, index: usize) {
        if index < self.cards.len() {
            self.current = index;
        }
    }

    pub fn toggle_flip(&mut self, index: usize) {
        if index >= self.cards.len() {
            return;
        }
        if !self.flipped.remove(&index) {
            self.flipped.insert(index);
        }
    }

    pub fn is_flipped(&self, index: usize) -> bool {
        self.flipped.contains(&index)
    }

    pub fn viewed_all(&self) -> bool {
        self.viewed_all
    }

    pub fn reset(&mut self) {
        self.current = 0;
        self.flipped.clear();
        self.viewed_all = false;
    }
}
