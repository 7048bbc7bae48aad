//! Core types for the card-matching game.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::SettingsError;

/// Number of successful remedial matches after which a word is proposed for graduation.
pub const GRADUATION_THRESHOLD: u32 = 10;

/// Identity key of a pair. Always equal to the pair's term.
pub type PairId = String;

/// A vocabulary entry: a term and its translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPair {
    pub term: String,
    pub translation: String,
}

impl WordPair {
    pub fn new(term: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            translation: translation.into(),
        }
    }

    pub fn pair_id(&self) -> &str {
        &self.term
    }
}

/// Which side of a pair a card shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardRole {
    Term,
    Translation,
}

/// A face-down card at a fixed slot in the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub pair_id: PairId,
    pub face: String,
    pub role: CardRole,
    pub position: usize,
}

/// Whether a round is ordinary play or a review of previously missed words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundMode {
    Normal,
    Remedial,
}

/// Match engine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Active,
    Expired,
    Complete,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Complete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Complete => "complete",
        }
    }
}

/// Difficulty tier for normal rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Beginner,
    Intermediate,
    Advanced,
}

impl Default for Tier {
    fn default() -> Self {
        Self::Beginner
    }
}

impl Tier {
    /// Get the tier name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// Persisted review progress for a word that was missed in normal play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub pair_id: PairId,
    pub translation: String,
    pub success_count: u32,
}

impl MasteryRecord {
    /// Fresh record as created on a first miss.
    pub fn new(pair_id: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            pair_id: pair_id.into(),
            translation: translation.into(),
            success_count: 0,
        }
    }

    pub fn to_pair(&self) -> WordPair {
        WordPair::new(self.pair_id.clone(), self.translation.clone())
    }
}

/// Result of a round, handed to the caller once the round ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// Pairs matched this round, in first-collection order.
    pub collected_pair_ids: Vec<PairId>,
    pub missed_pair_ids: BTreeSet<PairId>,
    /// Graduation candidates; deletion still needs explicit confirmation.
    pub graduated: BTreeSet<PairId>,
    /// Set when the round was abandoned before reaching a terminal phase.
    #[serde(default)]
    pub retired: bool,
}

impl RoundSummary {
    pub(crate) fn collect(&mut self, pair_id: &str) -> bool {
        if self.collected_pair_ids.iter().any(|id| id == pair_id) {
            return false;
        }
        self.collected_pair_ids.push(pair_id.to_string());
        true
    }
}

/// Gameplay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    pub time_limit_secs: u32,
    pub pairs_per_round: usize,
    pub remedial_sample_size: usize,
    pub graduation_threshold: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: 60,
            pairs_per_round: 6,
            remedial_sample_size: 8,
            graduation_threshold: GRADUATION_THRESHOLD,
        }
    }
}

impl GameSettings {
    /// Largest tier round the static tables can always fill.
    pub const MAX_PAIRS_PER_ROUND: usize = 8;

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.time_limit_secs == 0 {
            return Err(SettingsError::OutOfRange {
                field: "time_limit_secs",
                value: 0,
            });
        }
        if self.pairs_per_round == 0 || self.pairs_per_round > Self::MAX_PAIRS_PER_ROUND {
            return Err(SettingsError::OutOfRange {
                field: "pairs_per_round",
                value: self.pairs_per_round as u64,
            });
        }
        if self.remedial_sample_size == 0 {
            return Err(SettingsError::OutOfRange {
                field: "remedial_sample_size",
                value: 0,
            });
        }
        if self.graduation_threshold == 0 {
            return Err(SettingsError::OutOfRange {
                field: "graduation_threshold",
                value: 0,
            });
        }
        Ok(())
    }

    pub fn time_limit(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.time_limit_secs))
    }
}
