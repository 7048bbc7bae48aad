//! API request and response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export shared types from wordmatch-core
pub use wordmatch_core::{
    Card, CardRole, CatalogEntry, FlipOutcome, FlipRejection, FlipReport, MasteryRecord, Phase,
    RoundMode, RoundState, RoundSummary, Stage, StoryOutcome, Tier,
};

use crate::services::rounds::Controller;

// === Request Types ===

#[derive(Debug, Default, Deserialize)]
pub struct StartRoundRequest {
    #[serde(default)]
    pub tier: Tier,
    /// Ask the text generator for words when it is configured.
    #[serde(default = "default_true")]
    pub use_generator: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlipRequest {
    pub position: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GraduationRequest {
    #[serde(default)]
    pub confirm: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

// === Response Types ===

/// A card as the player may see it. Face details are only present for
/// face-up or matched cards, or for the card revealed by a flip. The pair a
/// card belongs to is never sent; matches are reported by the flip outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardView {
    pub position: usize,
    pub face_up: bool,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<CardRole>,
}

impl CardView {
    /// Full view of a card, regardless of whether it is still face-up.
    pub fn revealed(card: &Card, round: &RoundState) -> Self {
        Self {
            position: card.position,
            face_up: round.is_face_up(card.position),
            matched: round.is_matched(card.position),
            face: Some(card.face.clone()),
            role: Some(card.role),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundView {
    pub round_id: Uuid,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RoundMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<i64>,
    pub cards: Vec<CardView>,
    /// The round's word list, only sent once the round is finished.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<CatalogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RoundSummary>,
}

impl RoundView {
    pub fn from_controller(round_id: Uuid, controller: &Controller, now: chrono::DateTime<chrono::Utc>) -> Self {
        let Some(round) = controller.round() else {
            return Self {
                round_id,
                stage: controller.stage(),
                mode: None,
                phase: None,
                remaining_ms: None,
                cards: Vec::new(),
                words: finished_words(controller),
                summary: controller.last_summary().cloned(),
            };
        };

        let cards = round
            .deck()
            .iter()
            .map(|card| {
                let face_up = round.is_face_up(card.position);
                let matched = round.is_matched(card.position);
                let visible = face_up || matched;
                CardView {
                    position: card.position,
                    face_up,
                    matched,
                    face: visible.then(|| card.face.clone()),
                    role: visible.then_some(card.role),
                }
            })
            .collect();

        Self {
            round_id,
            stage: controller.stage(),
            mode: Some(round.mode()),
            phase: Some(round.phase()),
            remaining_ms: controller.remaining(now).map(|d| d.num_milliseconds()),
            cards,
            words: Vec::new(),
            summary: None,
        }
    }
}

fn finished_words(controller: &Controller) -> Vec<CatalogEntry> {
    match controller.stage() {
        Stage::Finished => controller.entries().to_vec(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Serialize)]
pub struct FlipResponse {
    #[serde(flatten)]
    pub report: FlipReport,
    /// The flipped card, face shown, when the flip was accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardView>,
    pub round: RoundView,
}

#[derive(Debug, Serialize)]
pub struct TickResponse {
    pub phase: Phase,
    pub remaining_ms: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GraduationResponse {
    pub graduated: Vec<String>,
    pub kept: Vec<String>,
    pub pending: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MasteryListResponse {
    pub records: Vec<MasteryRecord>,
    pub count: usize,
    pub graduation_threshold: u32,
}

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    #[serde(flatten)]
    pub story: StoryOutcome,
    pub words: Vec<String>,
}
