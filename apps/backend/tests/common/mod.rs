//! Common test utilities for integration tests.
//!
//! Every context gets its own in-memory SQLite store and has text
//! generation switched off, so rounds use the built-in word tables and
//! stories fall back to the canned text.

#![allow(dead_code)]

pub mod fixtures;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use wordmatch_backend::db::SqliteMasteryStore;
use wordmatch_backend::services::llm::{LlmClient, LlmConfig};
use wordmatch_backend::{router, AppState};
use wordmatch_core::{GameSettings, MasteryRecord, WordPair};

/// Test context holding the shared state and router.
pub struct TestContext {
    pub state: AppState,
    app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(GameSettings::default())
    }

    pub fn with_settings(settings: GameSettings) -> Self {
        let store = SqliteMasteryStore::open_in_memory().expect("Failed to open in-memory store");
        let llm = LlmClient::new(LlmConfig::disabled());
        let state = AppState::new(store, llm, settings);
        let app = router(state.clone());
        Self { state, app }
    }

    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).expect("Failed to create test server")
    }

    pub fn store(&self) -> Arc<SqliteMasteryStore> {
        Arc::clone(&self.state.store)
    }

    /// Put a mastery record with the given progress directly into the store.
    pub fn seed_record(&self, pair_id: &str, translation: &str, success_count: u32) {
        self.state
            .store
            .put(&MasteryRecord {
                pair_id: pair_id.to_string(),
                translation: translation.to_string(),
                success_count,
            })
            .expect("Failed to seed mastery record");
    }
}

/// Flip one card and return the response body.
pub async fn flip(server: &TestServer, round_id: &str, position: usize) -> Value {
    let response = server
        .post(&format!("/api/rounds/{round_id}/flip"))
        .json(&json!({ "position": position }))
        .await;
    response.assert_status_ok();
    response.json()
}

/// Clear the board using `pairs` as the answer key. Cards are flipped in
/// neighbouring pairs to learn where each face lives, then the remaining
/// pairs are matched directly.
///
/// Returns the flip responses in order.
pub async fn solve_round(
    server: &TestServer,
    round_id: &str,
    card_count: usize,
    pairs: &[WordPair],
) -> Vec<Value> {
    let mut responses = Vec::new();
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut matched: BTreeSet<usize> = BTreeSet::new();

    for first in (0..card_count).step_by(2) {
        for position in [first, first + 1] {
            let body = flip(server, round_id, position).await;
            assert_eq!(body["accepted"], true, "flip of {position} rejected: {body}");

            let face = body["card"]["face"].as_str().unwrap().to_string();
            seen.insert(face, position);
            if body["outcome"]["kind"] == "matched" {
                for p in body["outcome"]["positions"].as_array().unwrap() {
                    matched.insert(p.as_u64().unwrap() as usize);
                }
            }
            responses.push(body);
        }
    }

    for pair in pairs {
        let (Some(&term), Some(&translation)) = (seen.get(&pair.term), seen.get(&pair.translation))
        else {
            continue;
        };
        if matched.contains(&term) {
            continue;
        }
        flip(server, round_id, term).await;
        let body = flip(server, round_id, translation).await;
        assert_eq!(body["outcome"]["kind"], "matched", "{} did not match: {body}", pair.term);
        matched.extend([term, translation]);
        responses.push(body);
    }

    assert_eq!(matched.len(), card_count, "board not cleared");
    responses
}
