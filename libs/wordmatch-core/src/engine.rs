//! Flip and judge state machine for a single round.
//!
//! A [`RoundState`] is an explicit value owned by whoever runs the round. All
//! mutation goes through [`RoundState::flip`] and [`RoundState::tick`]; there
//! is no shared session object.
//!
//! Judging happens synchronously on the second flip, so at most two cards are
//! ever face-up and both are cleared before `flip` returns.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::clock::SessionClock;
use crate::error::FlipRejection;
use crate::types::{Card, PairId, Phase, RoundMode, RoundSummary};

/// What an accepted flip did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlipOutcome {
    /// First card of a pair is now face-up.
    Revealed { position: usize },
    /// Second card matched the first.
    Matched {
        pair_id: PairId,
        positions: [usize; 2],
        /// True when this match finished the round.
        completed: bool,
    },
    /// Second card did not match; both are face-down again. The pair ids are
    /// kept off the wire so a mismatch does not reveal which words the cards
    /// belong to.
    Mismatched {
        positions: [usize; 2],
        #[serde(skip_serializing)]
        pair_ids: [PairId; 2],
    },
}

/// Mutable state of one round.
#[derive(Debug, Clone)]
pub struct RoundState {
    deck: Vec<Card>,
    face_up: Vec<usize>,
    matched_pair_ids: BTreeSet<PairId>,
    mode: RoundMode,
    clock: SessionClock,
    phase: Phase,
    summary: RoundSummary,
}

impl RoundState {
    /// Create an idle round over `deck`.
    pub fn new(deck: Vec<Card>, mode: RoundMode, started_at: DateTime<Utc>, time_limit: Duration) -> Self {
        Self {
            deck,
            face_up: Vec::with_capacity(2),
            matched_pair_ids: BTreeSet::new(),
            mode,
            clock: SessionClock::new(started_at, time_limit),
            phase: Phase::Idle,
            summary: RoundSummary::default(),
        }
    }

    /// Move an idle round to active play.
    pub fn activate(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Active;
        }
    }

    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    pub fn face_up(&self) -> &[usize] {
        &self.face_up
    }

    pub fn matched_pair_ids(&self) -> &BTreeSet<PairId> {
        &self.matched_pair_ids
    }

    pub fn mode(&self) -> RoundMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn summary(&self) -> &RoundSummary {
        &self.summary
    }

    pub(crate) fn into_summary(self) -> RoundSummary {
        self.summary
    }

    /// Whether the card at `position` has been matched.
    pub fn is_matched(&self, position: usize) -> bool {
        self.deck
            .get(position)
            .is_some_and(|card| self.matched_pair_ids.contains(&card.pair_id))
    }

    pub fn is_face_up(&self, position: usize) -> bool {
        self.face_up.contains(&position)
    }

    /// Turn a card face-up, judging the pair when it is the second one.
    pub fn flip(&mut self, position: usize) -> Result<FlipOutcome, FlipRejection> {
        if self.phase != Phase::Active {
            return Err(FlipRejection::RoundNotActive { phase: self.phase });
        }
        if self.face_up.len() >= 2 {
            return Err(FlipRejection::PairPending);
        }
        if position >= self.deck.len() || self.is_matched(position) || self.is_face_up(position) {
            return Err(FlipRejection::InvalidPosition { position });
        }

        self.face_up.push(position);
        if self.face_up.len() < 2 {
            tracing::debug!(position, "card revealed");
            return Ok(FlipOutcome::Revealed { position });
        }

        Ok(self.judge())
    }

    fn judge(&mut self) -> FlipOutcome {
        let positions = [self.face_up[0], self.face_up[1]];
        self.face_up.clear();

        let first = self.deck[positions[0]].pair_id.clone();
        let second = self.deck[positions[1]].pair_id.clone();

        if first == second {
            self.matched_pair_ids.insert(first.clone());
            self.summary.collect(&first);
            let completed = self.matched_pair_ids.len() * 2 == self.deck.len();
            if completed {
                self.phase = Phase::Complete;
            }
            tracing::debug!(pair_id = %first, completed, "pair matched");
            FlipOutcome::Matched {
                pair_id: first,
                positions,
                completed,
            }
        } else {
            // Remedial misses are not fed back into the miss list.
            if self.mode == RoundMode::Normal {
                self.summary.missed_pair_ids.insert(first.clone());
                self.summary.missed_pair_ids.insert(second.clone());
            }
            tracing::debug!(first = %first, second = %second, "pair mismatched");
            FlipOutcome::Mismatched {
                positions,
                pair_ids: [first, second],
            }
        }
    }

    /// Expire the round once its time limit has passed. Returns the phase after
    /// the check; calling it on a finished round changes nothing.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Phase {
        if self.phase == Phase::Active && self.clock.expired(now) {
            tracing::debug!("round expired");
            self.phase = Phase::Expired;
        }
        self.phase
    }
}
