//! Request bodies and small helpers for building test data.

use serde_json::{json, Value};
use wordmatch_core::{static_table, GameSettings, Tier, WordPair};

/// Start-round body for a tier with the generator turned off.
pub fn start_request(tier: &str) -> Value {
    json!({ "tier": tier, "use_generator": false })
}

pub fn graduation_request(confirm: &[&str], deny: &[&str]) -> Value {
    json!({ "confirm": confirm, "deny": deny })
}

/// Round id from a round view body.
pub fn round_id(body: &Value) -> String {
    body["round_id"].as_str().unwrap().to_string()
}

/// Number of cards in a round view body.
pub fn card_count(body: &Value) -> usize {
    body["cards"].as_array().unwrap().len()
}

/// Sorted string values of a JSON array.
pub fn sorted_strings(value: &Value) -> Vec<String> {
    let mut items: Vec<String> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    items.sort();
    items
}

/// Answer key for a default-sized beginner round.
pub fn beginner_pairs() -> Vec<WordPair> {
    let mut pairs = static_table(Tier::Beginner);
    pairs.truncate(GameSettings::default().pairs_per_round);
    pairs
}

/// Sorted terms of `pairs`.
pub fn sorted_terms(pairs: &[WordPair]) -> Vec<String> {
    let mut terms: Vec<String> = pairs.iter().map(|p| p.term.clone()).collect();
    terms.sort();
    terms
}

pub fn pair(term: &str, translation: &str) -> WordPair {
    WordPair::new(term, translation)
}
