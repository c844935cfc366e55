//! Card and deck-chain value types shared by every stage of generation.

use serde::{Deserialize, Serialize};

/// A single question/answer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub front: String,
    pub back: String,
}

impl Card {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

/// One link in the ancestor path from the root deck down to the current deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckChainEntry {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl DeckChainEntry {
    pub fn new(title: impl Into<String>, topic: Option<String>) -> Self {
        Self {
            title: title.into(),
            topic,
        }
    }

    /// The deck topic, falling back to the title when unset or blank.
    pub fn topic(&self) -> &str {
        match self.topic.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => &self.title,
        }
    }

    /// Parse `title` or `title:topic` as given on the command line.
    pub fn parse(arg: &str) -> Self {
        match arg.split_once(':') {
            Some((title, topic)) => Self::new(title.trim(), Some(topic.trim().to_string())),
            None => Self::new(arg.trim(), None),
        }
    }
}

/// Display titles of a chain, root first.
pub fn titles(chain: &[DeckChainEntry]) -> Vec<String> {
    chain.iter().map(|e| e.title.clone()).collect()
}

/// Topic labels of a chain, root first, parallel to [`titles`].
pub fn topics(chain: &[DeckChainEntry]) -> Vec<String> {
    chain.iter().map(|e| e.topic().to_string()).collect()
}

/// Breadcrumb string such as `Korean > Food > Slang`.
pub fn full_path(chain: &[DeckChainEntry]) -> String {
    chain
        .iter()
        .map(|e| e.title.as_str())
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Outcome of comparing one candidate card against a corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateVerdict {
    pub is_duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_card: Option<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl DuplicateVerdict {
    pub fn not_duplicate() -> Self {
        Self {
            is_duplicate: false,
            similar_card: None,
            similarity: None,
        }
    }

    pub fn matched(card: &Card, similarity: f64) -> Self {
        Self {
            is_duplicate: true,
            similar_card: Some(card.clone()),
            similarity: Some(similarity),
        }
    }
}
