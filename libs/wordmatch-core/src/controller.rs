//! Round lifecycle orchestration.
//!
//! A [`RoundController`] moves through `Setup -> Playing -> Finished` for each
//! round. It draws pairs from the catalog, builds the deck, drives the match
//! engine and routes match outcomes to the mastery tracker. Finishing a
//! remedial round turns the accumulated success counters into graduation
//! candidates, which stay pending until the caller confirms or denies them.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{CatalogEntry, CatalogRequest, WordPairCatalog};
use crate::deck;
use crate::engine::{FlipOutcome, RoundState};
use crate::error::{FlipRejection, MasteryError, Result, RoundError};
use crate::mastery::{MasteryStore, MasteryTracker};
use crate::types::{GameSettings, PairId, Phase, RoundMode, RoundSummary, Tier, WordPair};

/// Controller lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Setup,
    Playing,
    Finished,
}

/// Answer to a flip request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlipReport {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FlipRejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<FlipOutcome>,
    pub phase: Phase,
}

impl FlipReport {
    fn accepted(outcome: FlipOutcome, phase: Phase) -> Self {
        Self {
            accepted: true,
            reason: None,
            outcome: Some(outcome),
            phase,
        }
    }

    fn rejected(reason: FlipRejection, phase: Phase) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            outcome: None,
            phase,
        }
    }
}

pub struct RoundController<S> {
    settings: GameSettings,
    catalog: WordPairCatalog,
    tracker: MasteryTracker<S>,
    stage: Stage,
    round: Option<RoundState>,
    entries: Vec<CatalogEntry>,
    success_counts: BTreeMap<PairId, u32>,
    last_summary: Option<RoundSummary>,
    pending_graduation: BTreeSet<PairId>,
}

impl<S: MasteryStore> RoundController<S> {
    pub fn new(settings: GameSettings, store: S) -> Self {
        Self {
            catalog: WordPairCatalog::new(&settings),
            tracker: MasteryTracker::with_threshold(store, settings.graduation_threshold),
            settings,
            stage: Stage::Setup,
            round: None,
            entries: Vec::new(),
            success_counts: BTreeMap::new(),
            last_summary: None,
            pending_graduation: BTreeSet::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn tracker(&self) -> &MasteryTracker<S> {
        &self.tracker
    }

    /// The round being played, if any.
    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    /// Pairs drawn for the current or last round.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn last_summary(&self) -> Option<&RoundSummary> {
        self.last_summary.as_ref()
    }

    pub fn pending_graduation(&self) -> &BTreeSet<PairId> {
        &self.pending_graduation
    }

    /// Start a normal round from the tier's built-in table.
    pub fn start_normal<R: Rng + ?Sized>(
        &mut self,
        tier: Tier,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<&RoundState> {
        self.start(CatalogRequest::Tier(tier), RoundMode::Normal, rng, now)
    }

    /// Start a normal round from text-generator words, padded from the table.
    pub fn start_generated<R: Rng + ?Sized>(
        &mut self,
        tier: Tier,
        pairs: Vec<WordPair>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<&RoundState> {
        self.start(CatalogRequest::Generated { tier, pairs }, RoundMode::Normal, rng, now)
    }

    /// Start a review round over previously missed words. Fails with
    /// [`RoundError::NothingToReview`] when there are none.
    pub fn start_remedial<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<&RoundState> {
        self.start(CatalogRequest::Remedial, RoundMode::Remedial, rng, now)
    }

    fn start<R: Rng + ?Sized>(
        &mut self,
        request: CatalogRequest,
        mode: RoundMode,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<&RoundState> {
        if self.stage == Stage::Playing {
            return Err(RoundError::RoundInProgress);
        }

        let entries = self.catalog.fetch(request, self.tracker.store(), rng)?;
        let pairs: Vec<WordPair> = entries.iter().map(|e| e.pair.clone()).collect();
        let cards = deck::build(&pairs, rng);

        let mut round = RoundState::new(cards, mode, now, self.settings.time_limit());
        round.activate();

        tracing::info!(?mode, pairs = pairs.len(), "round started");

        self.entries = entries;
        self.success_counts.clear();
        self.pending_graduation.clear();
        self.stage = Stage::Playing;
        Ok(&*self.round.insert(round))
    }

    fn playing_round(&mut self) -> Result<&mut RoundState> {
        match self.stage {
            Stage::Setup => Err(RoundError::NotStarted),
            Stage::Finished => Err(RoundError::AlreadyFinished),
            Stage::Playing => self.round.as_mut().ok_or(RoundError::NotStarted),
        }
    }

    /// Flip the card at `position`. The clock is checked first so late flips
    /// are rejected. Mastery writes are best-effort: a failing store never
    /// undoes the match result.
    pub fn flip(&mut self, position: usize, now: DateTime<Utc>) -> Result<FlipReport> {
        let round = self.playing_round()?;
        round.tick(now);
        let mode = round.mode();

        let outcome = match round.flip(position) {
            Ok(outcome) => outcome,
            Err(reason) => {
                tracing::debug!(position, reason = reason.reason(), "flip rejected");
                return Ok(FlipReport::rejected(reason, round.phase()));
            }
        };
        let phase = round.phase();

        match (&outcome, mode) {
            (FlipOutcome::Matched { pair_id, .. }, RoundMode::Remedial) => {
                self.record_success(pair_id)?;
            }
            (FlipOutcome::Mismatched { pair_ids, .. }, RoundMode::Normal) => {
                for pair_id in pair_ids.iter().collect::<BTreeSet<_>>() {
                    self.record_miss(pair_id);
                }
            }
            _ => {}
        }

        Ok(FlipReport::accepted(outcome, phase))
    }

    fn record_success(&mut self, pair_id: &str) -> Result<()> {
        match self.tracker.record_success(pair_id) {
            Ok(count) => {
                self.success_counts.insert(pair_id.to_string(), count);
                Ok(())
            }
            Err(MasteryError::Store(err)) => {
                tracing::warn!(pair_id, error = %err, "failed to record review success");
                Ok(())
            }
            Err(err @ MasteryError::RecordNotFound(_)) => {
                tracing::error!(pair_id, "remedial match for a word with no mastery record");
                Err(err.into())
            }
        }
    }

    fn record_miss(&self, pair_id: &str) {
        let Some(entry) = self.entries.iter().find(|e| e.pair.term == pair_id) else {
            return;
        };
        if let Err(err) = self.tracker.record_miss(pair_id, &entry.pair.translation) {
            tracing::warn!(pair_id, error = %err, "failed to record miss");
        }
    }

    /// Re-evaluate the clock.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Phase> {
        Ok(self.playing_round()?.tick(now))
    }

    /// Time left in the current round.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self.stage {
            Stage::Playing => self.round.as_ref().map(|r| r.clock().remaining(now)),
            _ => None,
        }
    }

    /// Close a round that reached `Complete` or `Expired` and return its summary.
    /// Calling it again returns the same summary.
    pub fn finish(&mut self) -> Result<RoundSummary> {
        match self.stage {
            Stage::Setup => Err(RoundError::NotStarted),
            Stage::Finished => self.last_summary.clone().ok_or(RoundError::NotStarted),
            Stage::Playing => {
                let terminal = self.round.as_ref().is_some_and(|r| r.phase().is_terminal());
                if !terminal {
                    return Err(RoundError::RoundInProgress);
                }
                Ok(self.close(false))
            }
        }
    }

    /// Abandon the round now and return what was accumulated so far.
    pub fn retire(&mut self) -> Result<RoundSummary> {
        let round = self.playing_round()?;
        let retired = !round.phase().is_terminal();
        Ok(self.close(retired))
    }

    fn close(&mut self, retired: bool) -> RoundSummary {
        let Some(round) = self.round.take() else {
            return RoundSummary::default();
        };
        let mode = round.mode();
        let phase = round.phase();
        let mut summary = round.into_summary();
        summary.retired = retired;

        if mode == RoundMode::Remedial {
            summary.graduated = self
                .success_counts
                .iter()
                .filter(|(_, &count)| self.tracker.graduation_candidate(count))
                .map(|(pair_id, _)| pair_id.clone())
                .collect();
            self.pending_graduation = summary.graduated.clone();
        }

        tracing::info!(
            ?mode,
            phase = phase.as_str(),
            retired,
            collected = summary.collected_pair_ids.len(),
            missed = summary.missed_pair_ids.len(),
            graduation_candidates = summary.graduated.len(),
            "round finished"
        );

        self.stage = Stage::Finished;
        self.last_summary = Some(summary.clone());
        summary
    }

    /// Graduate the given candidates, deleting their records. Ids that are not
    /// pending candidates of the last round are skipped. Returns the ids that
    /// were graduated.
    pub fn confirm_graduation<I, T>(&mut self, pair_ids: I) -> Result<Vec<PairId>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut graduated = Vec::new();
        for pair_id in pair_ids {
            let pair_id = pair_id.as_ref();
            if !self.pending_graduation.remove(pair_id) {
                tracing::debug!(pair_id, "not a pending graduation candidate");
                continue;
            }
            self.tracker.confirm_graduation(pair_id)?;
            graduated.push(pair_id.to_string());
        }
        Ok(graduated)
    }

    /// Decline graduation for the given candidates; their progress is kept.
    /// Returns the ids that were resolved.
    pub fn deny_graduation<I, T>(&mut self, pair_ids: I) -> Vec<PairId>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut resolved = Vec::new();
        for pair_id in pair_ids {
            let pair_id = pair_id.as_ref();
            if self.pending_graduation.remove(pair_id) {
                self.tracker.deny_graduation(pair_id);
                resolved.push(pair_id.to_string());
            }
        }
        resolved
    }
}
