//! Parsing of the model's flashcard reply.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::cards::Card;
use crate::error::{truncate_chars, ErrorCode, GenerationError};

lazy_static! {
    static ref FENCED_JSON_RE: Regex =
        Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").expect("valid fenced JSON regex");
    static ref FLASHCARDS_JSON_RE: Regex =
        Regex::new(r#"(?s)(\{\s*"flashcards".*\})"#).expect("valid flashcards object regex");
    static ref BARE_JSON_RE: Regex = Regex::new(r"(?s)(\{.*\})").expect("valid JSON object regex");
}

/// Card as the model returns it; either side may be missing.
#[derive(Debug, Deserialize)]
struct RawCard {
    #[serde(default)]
    front: Option<String>,
    #[serde(default)]
    back: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlashcardResponse {
    flashcards: Vec<RawCard>,
}

/// Parse the model's reply into cards.
///
/// Accepts bare JSON or JSON wrapped in a markdown code block. Prose around
/// the object may contain braces as long as the object itself opens with the
/// `flashcards` key; braces in prose after the object still break parsing.
/// Cards with a blank front or back are dropped.
pub fn parse_flashcard_response(response: &str) -> Result<Vec<Card>, GenerationError> {
    if response.trim().is_empty() {
        return Err(GenerationError::new(
            ErrorCode::EmptyResponse,
            "Model response was empty",
        ));
    }

    let json_str = extract_json(response);

    let raw = match serde_json::from_str::<FlashcardResponse>(json_str) {
        Ok(parsed) => parsed.flashcards,
        Err(e) if e.is_eof() => recover_truncated(json_str).ok_or_else(|| {
            GenerationError::new(
                ErrorCode::ParseError,
                format!(
                    "Response was truncated. Error: {}. Response length: {} chars",
                    e,
                    json_str.chars().count()
                ),
            )
            .with_details(truncate_chars(json_str, 500))
        })?,
        Err(e) if e.is_data() => {
            return Err(GenerationError::new(
                ErrorCode::InvalidResponse,
                format!("Response JSON has no flashcards array: {}", e),
            )
            .with_details(truncate_chars(json_str, 500)))
        }
        Err(e) => {
            return Err(GenerationError::new(
                ErrorCode::ParseError,
                format!("Failed to parse flashcard JSON: {}", e),
            )
            .with_details(truncate_chars(json_str, 500)))
        }
    };

    let total = raw.len();
    let cards: Vec<Card> = raw
        .into_iter()
        .filter_map(|c| match (c.front, c.back) {
            (Some(front), Some(back)) if !front.trim().is_empty() && !back.trim().is_empty() => {
                Some(Card::new(front.trim(), back.trim()))
            }
            _ => None,
        })
        .collect();

    if cards.len() < total {
        warn!(
            "Dropped {} generated cards missing a front or back",
            total - cards.len()
        );
    }

    Ok(cards)
}

// The model might wrap the JSON in markdown or surround it with prose
fn extract_json(response: &str) -> &str {
    if let Some(m) = FENCED_JSON_RE.captures(response).and_then(|c| c.get(1)) {
        m.as_str()
    } else if let Some(m) = FLASHCARDS_JSON_RE.captures(response).and_then(|c| c.get(1)) {
        m.as_str()
    } else if let Some(m) = BARE_JSON_RE.captures(response).and_then(|c| c.get(1)) {
        m.as_str()
    } else {
        response.trim()
    }
}

/// Close a cut-off flashcards array after the last complete card.
fn recover_truncated(json_str: &str) -> Option<Vec<RawCard>> {
    let last_complete = json_str.rfind('}')?;
    let candidate = format!("{}\n]\n}}", json_str[..=last_complete].trim_end_matches(','));
    let parsed = serde_json::from_str::<FlashcardResponse>(&candidate).ok()?;
    warn!(
        "Recovered {} cards from truncated response",
        parsed.flashcards.len()
    );
    Some(parsed.flashcards)
}
