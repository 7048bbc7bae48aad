//! Word pair sources for a round.
//!
//! Tier rounds come from a built-in table or from words produced by an external
//! text generator; generator output is cleaned, deduplicated and padded
//! from the table so a round is never short. Remedial rounds sample the
//! persisted mastery records.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CatalogError;
use crate::mastery::MasteryStore;
use crate::types::{GameSettings, Tier, WordPair};

const BEGINNER: &[(&str, &str)] = &[
    ("cat", "猫"),
    ("dog", "犬"),
    ("apple", "りんご"),
    ("water", "水"),
    ("book", "本"),
    ("train", "電車"),
    ("flower", "花"),
    ("school", "学校"),
];

const INTERMEDIATE: &[(&str, &str)] = &[
    ("journey", "旅"),
    ("whisper", "ささやく"),
    ("ancient", "古代の"),
    ("harvest", "収穫"),
    ("borrow", "借りる"),
    ("neighbor", "隣人"),
    ("weather", "天気"),
    ("promise", "約束"),
];

const ADVANCED: &[(&str, &str)] = &[
    ("ephemeral", "はかない"),
    ("meticulous", "几帳面な"),
    ("ubiquitous", "至る所にある"),
    ("reluctant", "気が進まない"),
    ("serendipity", "思わぬ幸運"),
    ("resilient", "回復力のある"),
    ("ambiguous", "曖昧な"),
    ("diligent", "勤勉な"),
];

/// Built-in word table for a tier.
pub fn static_table(tier: Tier) -> Vec<WordPair> {
    let table = match tier {
        Tier::Beginner => BEGINNER,
        Tier::Intermediate => INTERMEDIATE,
        Tier::Advanced => ADVANCED,
    };
    table
        .iter()
        .map(|(term, translation)| WordPair::new(*term, *translation))
        .collect()
}

/// What to draw pairs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogRequest {
    /// Built-in table for the tier.
    Tier(Tier),
    /// Words returned by the text generator for the tier.
    Generated { tier: Tier, pairs: Vec<WordPair> },
    /// Sample of un-graduated mastery records.
    Remedial,
}

/// A pair drawn for a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub pair: WordPair,
    /// Current review progress, for display in remedial rounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_count: Option<u32>,
}

impl CatalogEntry {
    fn fresh(pair: WordPair) -> Self {
        Self {
            pair,
            success_count: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WordPairCatalog {
    pairs_per_round: usize,
    remedial_sample_size: usize,
}

impl Default for WordPairCatalog {
    fn default() -> Self {
        Self::new(&GameSettings::default())
    }
}

impl WordPairCatalog {
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            pairs_per_round: settings.pairs_per_round,
            remedial_sample_size: settings.remedial_sample_size,
        }
    }

    pub fn pairs_per_round(&self) -> usize {
        self.pairs_per_round
    }

    /// Draw the pairs for a round.
    pub fn fetch<S, R>(
        &self,
        request: CatalogRequest,
        store: &S,
        rng: &mut R,
    ) -> Result<Vec<CatalogEntry>, CatalogError>
    where
        S: MasteryStore + ?Sized,
        R: Rng + ?Sized,
    {
        match request {
            CatalogRequest::Tier(tier) => Ok(self
                .tier_pairs(tier)
                .into_iter()
                .map(CatalogEntry::fresh)
                .collect()),
            CatalogRequest::Generated { tier, pairs } => Ok(self
                .fill_generated(tier, pairs)?
                .into_iter()
                .map(CatalogEntry::fresh)
                .collect()),
            CatalogRequest::Remedial => self.remedial(store, rng),
        }
    }

    fn tier_pairs(&self, tier: Tier) -> Vec<WordPair> {
        let mut pairs = static_table(tier);
        pairs.truncate(self.pairs_per_round);
        pairs
    }

    /// Clean generator output and pad it from the tier table.
    ///
    /// Terms and translations must both be unique so no two cards in a
    /// round show the same face.
    pub fn fill_generated(
        &self,
        tier: Tier,
        generated: Vec<WordPair>,
    ) -> Result<Vec<WordPair>, CatalogError> {
        let wanted = self.pairs_per_round;
        let mut terms = HashSet::new();
        let mut translations = HashSet::new();
        let mut pairs = Vec::with_capacity(wanted);

        for pair in generated {
            let term = pair.term.trim();
            let translation = pair.translation.trim();
            if term.is_empty()
                || translation.is_empty()
                || terms.contains(term)
                || translations.contains(translation)
            {
                continue;
            }
            terms.insert(term.to_string());
            translations.insert(translation.to_string());
            pairs.push(WordPair::new(term, translation));
            if pairs.len() == wanted {
                return Ok(pairs);
            }
        }

        let generated_count = pairs.len();
        for pair in static_table(tier) {
            if pairs.len() == wanted {
                break;
            }
            if terms.contains(&pair.term) || translations.contains(&pair.translation) {
                continue;
            }
            terms.insert(pair.term.clone());
            translations.insert(pair.translation.clone());
            pairs.push(pair);
        }
        if generated_count < wanted {
            tracing::warn!(
                tier = tier.as_str(),
                generated = generated_count,
                wanted,
                "generator returned too few unique words, padded from static table"
            );
        }

        if pairs.len() < wanted {
            return Err(CatalogError::Underpopulated {
                wanted,
                got: pairs.len(),
            });
        }
        Ok(pairs)
    }

    fn remedial<S, R>(&self, store: &S, rng: &mut R) -> Result<Vec<CatalogEntry>, CatalogError>
    where
        S: MasteryStore + ?Sized,
        R: Rng + ?Sized,
    {
        let records = store.list_all()?;
        if records.is_empty() {
            return Err(CatalogError::CatalogEmpty);
        }

        Ok(records
            .choose_multiple(rng, self.remedial_sample_size)
            .map(|record| CatalogEntry {
                pair: record.to_pair(),
                success_count: Some(record.success_count),
            })
            .collect())
    }
}

/// Prompt asking the text generator for `count` quiz words.
pub fn quiz_prompt(tier: Tier, count: usize) -> String {
    format!(
        "List {count} distinct English vocabulary words for {level} learners of English, \
         each with its Japanese meaning. Respond with only a JSON array of objects \
         shaped like {{\"term\": \"word\", \"translation\": \"意味\"}}.",
        level = tier.as_str(),
    )
}

/// Parse generator output into pairs.
///
/// Accepts a bare JSON array or one wrapped in prose or a fenced code block.
pub fn parse_generated_pairs(text: &str) -> Result<Vec<WordPair>, serde_json::Error> {
    let body = match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text.trim(),
    };
    serde_json::from_str(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mastery::MemoryMasteryStore;
    use crate::types::MasteryRecord;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn terms(pairs: &[WordPair]) -> Vec<&str> {
        pairs.iter().map(|p| p.term.as_str()).collect()
    }

    #[test]
    fn static_tables_fill_largest_round() {
        for tier in [Tier::Beginner, Tier::Intermediate, Tier::Advanced] {
            let table = static_table(tier);
            assert_eq!(table.len(), GameSettings::MAX_PAIRS_PER_ROUND);
            let unique: HashSet<_> = table.iter().map(|p| p.term.as_str()).collect();
            assert_eq!(unique.len(), table.len());
        }
    }

    #[test]
    fn tier_request_returns_configured_set() {
        let catalog = WordPairCatalog::default();
        let store = MemoryMasteryStore::new();
        let first = catalog
            .fetch(CatalogRequest::Tier(Tier::Beginner), &store, &mut rng())
            .unwrap();
        let second = catalog
            .fetch(CatalogRequest::Tier(Tier::Beginner), &store, &mut rng())
            .unwrap();
        assert_eq!(first.len(), 6);
        assert_eq!(first, second);
        assert!(first.iter().all(|e| e.success_count.is_none()));
    }

    #[test]
    fn generated_words_are_deduplicated_and_padded() {
        let catalog = WordPairCatalog::default();
        let generated = vec![
            WordPair::new("river", "川"),
            WordPair::new(" river ", "河"),
            WordPair::new("cat", "猫"),
            WordPair::new("", "空"),
            WordPair::new("moon", "  "),
        ];
        let pairs = catalog.fill_generated(Tier::Beginner, generated).unwrap();
        assert_eq!(
            terms(&pairs),
            vec!["river", "cat", "dog", "apple", "water", "book"]
        );
        assert_eq!(pairs[0].translation, "川");
    }

    #[test]
    fn generated_words_with_shared_translation_are_dropped() {
        let catalog = WordPairCatalog::default();
        let generated = vec![
            WordPair::new("river", "川"),
            WordPair::new("stream", "川"),
            WordPair::new("kitty", "猫"),
        ];
        let pairs = catalog.fill_generated(Tier::Beginner, generated).unwrap();

        // "stream" repeats a translation; "cat" from the table would repeat "猫".
        assert_eq!(
            terms(&pairs),
            vec!["river", "kitty", "dog", "apple", "water", "book"]
        );
        let faces: HashSet<&str> = pairs.iter().map(|p| p.translation.as_str()).collect();
        assert_eq!(faces.len(), pairs.len());
    }

    #[test]
    fn padding_short_of_round_is_underpopulated() {
        let catalog = WordPairCatalog::new(&GameSettings {
            pairs_per_round: 8,
            ..Default::default()
        });
        // Blocks "cat" by term and "dog" by translation, leaving 1 + 6 pairs.
        let generated = vec![WordPair::new("cat", "犬")];
        assert_eq!(
            catalog.fill_generated(Tier::Beginner, generated),
            Err(CatalogError::Underpopulated { wanted: 8, got: 7 })
        );
    }

    #[test]
    fn generated_words_are_capped() {
        let catalog = WordPairCatalog::new(&GameSettings {
            pairs_per_round: 2,
            ..Default::default()
        });
        let generated = vec![
            WordPair::new("a", "1"),
            WordPair::new("b", "2"),
            WordPair::new("c", "3"),
        ];
        let pairs = catalog.fill_generated(Tier::Advanced, generated).unwrap();
        assert_eq!(terms(&pairs), vec!["a", "b"]);
    }

    #[test]
    fn empty_generator_output_falls_back_to_table() {
        let catalog = WordPairCatalog::default();
        let pairs = catalog.fill_generated(Tier::Intermediate, vec![]).unwrap();
        assert_eq!(pairs, static_table(Tier::Intermediate)[..6].to_vec());
    }

    #[test]
    fn remedial_without_records_is_empty_error() {
        let catalog = WordPairCatalog::default();
        let store = MemoryMasteryStore::new();
        assert_eq!(
            catalog.fetch(CatalogRequest::Remedial, &store, &mut rng()),
            Err(CatalogError::CatalogEmpty)
        );
    }

    #[test]
    fn remedial_samples_records_with_progress() {
        let records = (0..12).map(|i| MasteryRecord {
            pair_id: format!("word{i}"),
            translation: format!("訳{i}"),
            success_count: i,
        });
        let store = MemoryMasteryStore::with_records(records);
        let catalog = WordPairCatalog::default();

        let entries = catalog
            .fetch(CatalogRequest::Remedial, &store, &mut rng())
            .unwrap();
        assert_eq!(entries.len(), 8);
        let unique: HashSet<_> = entries.iter().map(|e| e.pair.term.clone()).collect();
        assert_eq!(unique.len(), 8);
        for entry in &entries {
            let record = store.get(&entry.pair.term).unwrap().unwrap();
            assert_eq!(entry.success_count, Some(record.success_count));
            assert_eq!(entry.pair.translation, record.translation);
        }
    }

    #[test]
    fn remedial_sample_is_bounded_by_pool() {
        let store = MemoryMasteryStore::with_records([MasteryRecord::new("cat", "猫")]);
        let catalog = WordPairCatalog::default();
        let entries = catalog
            .fetch(CatalogRequest::Remedial, &store, &mut rng())
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].success_count, Some(0));
    }

    #[test]
    fn parse_plain_json() {
        let pairs = parse_generated_pairs(r#"[{"term":"cat","translation":"猫"}]"#).unwrap();
        assert_eq!(pairs, vec![WordPair::new("cat", "猫")]);
    }

    #[test]
    fn parse_fenced_json() {
        let text = "Here you go:\n```json\n[\n  {\"term\": \"dog\", \"translation\": \"犬\"}\n]\n```";
        let pairs = parse_generated_pairs(text).unwrap();
        assert_eq!(pairs, vec![WordPair::new("dog", "犬")]);
    }

    #[test]
    fn parse_rejects_prose() {
        assert!(parse_generated_pairs("sorry, I can't help with that").is_err());
    }

    #[test]
    fn quiz_prompt_mentions_count_and_level() {
        let prompt = quiz_prompt(Tier::Advanced, 7);
        assert!(prompt.contains("7"));
        assert!(prompt.contains("advanced"));
    }
}
