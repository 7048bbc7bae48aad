//! Shuffled deck construction.

use crate::types::{Card, CardRole, WordPair};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Build the face-down deck for a round.
///
/// Each pair yields one term card and one translation card sharing the term as
/// `pair_id`. Slots are assigned by a uniform shuffle and `position` always
/// equals the card's index in the returned vector. Repeated terms are dropped
/// so every pair id appears exactly twice.
pub fn build<R: Rng + ?Sized>(pairs: &[WordPair], rng: &mut R) -> Vec<Card> {
    let mut seen = HashSet::new();
    let mut cards = Vec::with_capacity(pairs.len() * 2);

    for pair in pairs {
        if !seen.insert(pair.term.as_str()) {
            tracing::warn!(term = %pair.term, "duplicate term skipped while building deck");
            continue;
        }
        cards.push(Card {
            pair_id: pair.term.clone(),
            face: pair.term.clone(),
            role: CardRole::Term,
            position: 0,
        });
        cards.push(Card {
            pair_id: pair.term.clone(),
            face: pair.translation.clone(),
            role: CardRole::Translation,
            position: 0,
        });
    }

    // SliceRandom::shuffle is Fisher-Yates
    cards.shuffle(rng);
    for (position, card) in cards.iter_mut().enumerate() {
        card.position = position;
    }

    cards
}
