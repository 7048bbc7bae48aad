//! Core game library for the word-matching vocabulary game.
//!
//! Provides:
//! - Word pair catalog (built-in tier tables, generator padding, remedial sampling)
//! - Deck building with an unbiased shuffle
//! - Flip/match state machine and round clock
//! - Mastery tracking with two-phase graduation
//! - Round controller tying the above together
//! - Story prompt and fallback text for collected words

pub mod catalog;
pub mod clock;
pub mod controller;
pub mod deck;
pub mod engine;
pub mod error;
pub mod mastery;
pub mod story;
pub mod types;

pub use catalog::{parse_generated_pairs, quiz_prompt, static_table, CatalogEntry, CatalogRequest, WordPairCatalog};
pub use clock::SessionClock;
pub use controller::{FlipReport, RoundController, Stage};
pub use engine::{FlipOutcome, RoundState};
pub use error::{CatalogError, FlipRejection, MasteryError, Result, RoundError, SettingsError, StoreError};
pub use mastery::{MasteryStore, MasteryTracker, MemoryMasteryStore};
pub use story::{fallback_story, story_prompt, StoryOutcome, StorySource};
pub use types::{
    Card, CardRole, GameSettings, MasteryRecord, PairId, Phase, RoundMode, RoundSummary, Tier,
    WordPair, GRADUATION_THRESHOLD,
};
