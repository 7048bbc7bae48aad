//! Round endpoints
//!
//! Controllers live in the round registry. Every handler runs one controller
//! operation under the registry lock; generator calls happen outside it.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use wordmatch_core::{CatalogError, RoundError};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::rounds::Controller;
use crate::AppState;

/// POST /api/rounds
pub async fn start(
    State(state): State<AppState>,
    Json(payload): Json<StartRoundRequest>,
) -> Result<Json<RoundView>> {
    let tier = payload.tier;
    let generated = if payload.use_generator && state.llm.is_available() {
        match state
            .llm
            .generate_quiz_words(tier, state.settings.pairs_per_round)
            .await
        {
            Ok(pairs) => Some(pairs),
            Err(err) => {
                tracing::warn!(error = %err, tier = tier.as_str(), "quiz word generation failed, using built-in words");
                None
            }
        }
    } else {
        None
    };

    let now = Utc::now();
    let mut controller = new_controller(&state);
    {
        let mut rng = rand::thread_rng();
        let started = match generated {
            Some(pairs) => controller
                .start_generated(tier, pairs, &mut rng, now)
                .map(|_| ()),
            None => controller.start_normal(tier, &mut rng, now).map(|_| ()),
        };
        match started {
            Err(RoundError::Catalog(err @ CatalogError::Underpopulated { .. })) => {
                tracing::warn!(error = %err, tier = tier.as_str(), "generated words unusable, using built-in words");
                controller.start_normal(tier, &mut rng, now)?;
            }
            other => other?,
        }
    }

    register(&state, controller, now)
}

/// POST /api/rounds/remedial
pub async fn start_remedial(State(state): State<AppState>) -> Result<Json<RoundView>> {
    let now = Utc::now();
    let mut controller = new_controller(&state);
    controller.start_remedial(&mut rand::thread_rng(), now)?;
    register(&state, controller, now)
}

/// GET /api/rounds/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<RoundView>> {
    let now = Utc::now();
    let view = state.rounds.with_round(id, |controller| {
        if controller.stage() == Stage::Playing {
            controller.tick(now).ok();
        }
        RoundView::from_controller(id, controller, now)
    })?;
    Ok(Json(view))
}

/// DELETE /api/rounds/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if !state.rounds.remove(id)? {
        return Err(ApiError::NotFound(format!("Round {id}")));
    }
    tracing::debug!(%id, "round discarded");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/rounds/:id/flip
pub async fn flip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FlipRequest>,
) -> Result<Json<FlipResponse>> {
    let now = Utc::now();
    let response = state.rounds.with_round(id, |controller| -> Result<FlipResponse> {
        let report = controller.flip(payload.position, now)?;
        let card = if report.accepted {
            controller.round().and_then(|round| {
                round
                    .deck()
                    .get(payload.position)
                    .map(|card| CardView::revealed(card, round))
            })
        } else {
            None
        };
        Ok(FlipResponse {
            report,
            card,
            round: RoundView::from_controller(id, controller, now),
        })
    })??;
    Ok(Json(response))
}

/// POST /api/rounds/:id/tick
pub async fn tick(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<TickResponse>> {
    let now = Utc::now();
    let response = state.rounds.with_round(id, |controller| -> Result<TickResponse> {
        let phase = controller.tick(now)?;
        let remaining_ms = controller
            .remaining(now)
            .map(|d| d.num_milliseconds())
            .unwrap_or(0);
        Ok(TickResponse { phase, remaining_ms })
    })??;
    Ok(Json(response))
}

/// POST /api/rounds/:id/finish
pub async fn finish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSummary>> {
    let now = Utc::now();
    let summary = state.rounds.with_round(id, |controller| {
        if controller.stage() == Stage::Playing {
            controller.tick(now)?;
        }
        controller.finish()
    })??;
    Ok(Json(summary))
}

/// POST /api/rounds/:id/retire
pub async fn retire(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSummary>> {
    let (summary, pending) = state.rounds.with_round(id, |controller| {
        let summary = controller.retire()?;
        Ok::<_, RoundError>((summary, !controller.pending_graduation().is_empty()))
    })??;
    // A retired round is discarded unless graduation still awaits an answer.
    if !pending {
        state.rounds.remove(id)?;
    }
    Ok(Json(summary))
}

/// POST /api/rounds/:id/graduation
pub async fn graduation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GraduationRequest>,
) -> Result<Json<GraduationResponse>> {
    let response = state.rounds.with_round(id, |controller| -> Result<GraduationResponse> {
        let graduated = controller.confirm_graduation(&payload.confirm)?;
        let kept = controller.deny_graduation(&payload.deny);
        Ok(GraduationResponse {
            graduated,
            kept,
            pending: controller.pending_graduation().iter().cloned().collect(),
        })
    })??;
    Ok(Json(response))
}

/// POST /api/rounds/:id/story
pub async fn story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoryResponse>> {
    let words = state.rounds.with_round(id, |controller| {
        let summary = match controller.stage() {
            Stage::Playing => controller.round().map(|round| round.summary()),
            _ => controller.last_summary(),
        };
        summary
            .map(|s| s.collected_pair_ids.clone())
            .unwrap_or_default()
    })?;

    let story = if state.llm.is_available() {
        StoryOutcome::resolve(state.llm.generate_story(&words).await, &words)
    } else {
        StoryOutcome::fallback(&words, "LLM_API_KEY is not set")
    };
    Ok(Json(StoryResponse { story, words }))
}

fn new_controller(state: &AppState) -> Controller {
    Controller::new(state.settings.clone(), Arc::clone(&state.store))
}

fn register(state: &AppState, controller: Controller, now: DateTime<Utc>) -> Result<Json<RoundView>> {
    let id = state.rounds.insert(controller)?;
    let view = state
        .rounds
        .with_round(id, |controller| RoundView::from_controller(id, controller, now))?;
    Ok(Json(view))
}
