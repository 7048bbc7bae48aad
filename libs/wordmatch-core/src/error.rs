//! Error types for wordmatch-core.

use crate::types::Phase;
use serde::Serialize;
use thiserror::Error;

/// Result type alias using RoundError.
pub type Result<T> = std::result::Result<T, RoundError>;

/// Why a flip was not accepted. These are user-input no-ops, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlipRejection {
    #[error("position {position} is out of range or already resolved")]
    InvalidPosition { position: usize },

    #[error("two cards are already face-up")]
    PairPending,

    #[error("round is not active ({phase:?})")]
    RoundNotActive { phase: Phase },
}

impl FlipRejection {
    /// Short machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidPosition { .. } => "invalid_position",
            Self::PairPending => "pair_pending",
            Self::RoundNotActive { .. } => "round_not_active",
        }
    }
}

/// Failure reported by a mastery store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mastery store error: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self(message.to_string())
    }
}

/// Errors from the mastery tracker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MasteryError {
    /// A success was recorded for a word that was never missed.
    #[error("no mastery record for {0}")]
    RecordNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors when fetching word pairs for a round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("no mastery records to review")]
    CatalogEmpty,

    #[error("only {got} unique word pairs available, wanted {wanted}")]
    Underpopulated { wanted: usize, got: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the round controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("nothing to review")]
    NothingToReview,

    #[error("no round has been started")]
    NotStarted,

    #[error("round is still in progress")]
    RoundInProgress,

    #[error("round already finished")]
    AlreadyFinished,

    #[error(transparent)]
    Catalog(CatalogError),

    #[error(transparent)]
    Mastery(#[from] MasteryError),
}

impl From<CatalogError> for RoundError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::CatalogEmpty => Self::NothingToReview,
            other => Self::Catalog(other),
        }
    }
}

/// Invalid gameplay settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u64 },
}
