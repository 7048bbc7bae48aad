//! Short reading passage built from the words collected in a round.

use serde::{Deserialize, Serialize};

/// Where the story text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorySource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryOutcome {
    pub text: String,
    pub source: StorySource,
    /// Why the generator was not used, when it wasn't.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl StoryOutcome {
    /// Use the generator's text, or the canned story if generation failed or
    /// came back empty.
    pub fn resolve<E: std::fmt::Display>(result: Result<String, E>, words: &[String]) -> Self {
        match result {
            Ok(text) if !text.trim().is_empty() => Self {
                text,
                source: StorySource::Generated,
                notice: None,
            },
            Ok(_) => Self::fallback(words, "story generator returned no text"),
            Err(err) => {
                tracing::warn!(error = %err, "story generation failed, using fallback");
                Self::fallback(words, err)
            }
        }
    }

    pub fn fallback(words: &[String], notice: impl std::fmt::Display) -> Self {
        Self {
            text: fallback_story(words),
            source: StorySource::Fallback,
            notice: Some(notice.to_string()),
        }
    }
}

/// Prompt asking for a short Japanese story that embeds every word in English.
pub fn story_prompt(words: &[String]) -> String {
    format!(
        "以下の英単語すべてを使って、短い興味深い物語（日本語）を作ってください。\n\
         単語は英語のまま文中に埋め込み、その直後にカッコ書きで日本語の意味を補足してください。\n\n\
         使用単語: {}",
        words.join(", ")
    )
}

/// Canned story that mentions every word.
pub fn fallback_story(words: &[String]) -> String {
    if words.is_empty() {
        return "今日はまだ単語を集めていません。次のラウンドで挑戦しましょう！".to_string();
    }
    let mut story = String::from("ある日、小さな旅人が不思議な森に迷い込みました。");
    for word in words {
        story.push_str(&format!("道の途中で「{word}」に出会い、"));
    }
    story.push_str("最後には全部の言葉を覚えて、笑顔で家に帰りました。");
    story
}
