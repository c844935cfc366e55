// Deduplication module for generated flashcards
//
// Compares card fronts by normalized exact match, Levenshtein similarity
// and, for Korean text, a suffix-stripped stem comparison.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strsim::levenshtein;
use tracing::{debug, info};

use crate::cards::{Card, DuplicateVerdict};
use crate::korean::{contains_hangul, is_hangul_syllable, strip_suffixes, suffix_of};

lazy_static! {
    static ref PUNCTUATION_RE: Regex = Regex::new(r"[^\w\s]").expect("valid punctuation regex");
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
}

/// Words too common to be reported as a repeated pattern.
const STOPWORDS: &[&str] = &[
    "what", "which", "when", "where", "does", "mean", "meaning", "with", "that", "this", "from",
    "into", "your", "have", "there", "their", "about",
];

/// Maximum number of entries reported per pattern line.
const MAX_PATTERN_ENTRIES: usize = 5;

/// Thresholds for duplicate detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    /// Normalized fronts shorter than this (in characters) are never compared
    pub min_length: usize,
    /// Pairs whose lengths differ by more than this factor are skipped
    pub max_length_ratio: f64,
    /// Edit-distance similarity must exceed this to count as a duplicate
    pub similarity_threshold: f64,
    /// Similarity reported for a Korean stem match
    pub stem_similarity: f64,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            min_length: 2,
            max_length_ratio: 2.0,
            similarity_threshold: 0.9,
            stem_similarity: 0.95,
        }
    }
}

/// Normalize text for comparison (lowercase, strip punctuation, collapse whitespace)
pub fn normalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let stripped = PUNCTUATION_RE.replace_all(&lower, "");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// Calculate similarity ratio between two strings (0.0 - 1.0)
/// as `1 - levenshtein / max_len` over the normalized text.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    edit_similarity(&a, a.chars().count(), &b, b.chars().count())
}

fn edit_similarity(a: &str, a_len: usize, b: &str, b_len: usize) -> f64 {
    let longest = a_len.max(b_len);
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn exceeds_length_ratio(a_len: usize, b_len: usize, ratio: f64) -> bool {
    let (a, b) = (a_len as f64, b_len as f64);
    a > b * ratio || b > a * ratio
}

// A lone Hangul syllable is a complete verb root (먹, 가); any other stem
// needs at least two characters.
fn is_comparable_stem(stem: &str) -> bool {
    let mut chars = stem.chars();
    match (chars.next(), chars.next()) {
        (Some(_), Some(_)) => true,
        (Some(c), None) => is_hangul_syllable(c),
        _ => false,
    }
}

/// Check whether `new_card` duplicates any of `existing`, using default thresholds.
pub fn is_duplicate(new_card: &Card, existing: &[Card]) -> DuplicateVerdict {
    is_duplicate_with(new_card, existing, &DedupSettings::default())
}

/// Check whether `new_card` duplicates any of `existing`.
///
/// An exact normalized match anywhere in the corpus takes precedence; after
/// that the first card passing the similarity or stem check is reported.
pub fn is_duplicate_with(
    new_card: &Card,
    existing: &[Card],
    settings: &DedupSettings,
) -> DuplicateVerdict {
    let candidate = normalize(&new_card.front);
    let candidate_len = candidate.chars().count();
    if candidate_len < settings.min_length {
        debug!("Skipping duplicate check for short front '{}'", new_card.front);
        return DuplicateVerdict::not_duplicate();
    }

    let corpus: Vec<(&Card, String)> = existing
        .iter()
        .map(|card| (card, normalize(&card.front)))
        .collect();

    if let Some((card, _)) = corpus.iter().find(|(_, front)| *front == candidate) {
        info!(
            "Duplicate detected: '{}' matches '{}' exactly",
            new_card.front, card.front
        );
        return DuplicateVerdict::matched(card, 1.0);
    }

    let candidate_is_korean = contains_hangul(&new_card.front);
    let candidate_stem = strip_suffixes(&candidate);

    for (card, front) in &corpus {
        let front_len = front.chars().count();
        if front_len < settings.min_length
            || exceeds_length_ratio(candidate_len, front_len, settings.max_length_ratio)
        {
            continue;
        }

        let sim = edit_similarity(&candidate, candidate_len, front, front_len);
        if sim > settings.similarity_threshold {
            info!(
                "Duplicate detected: '{}' similar to '{}' (similarity: {:.2})",
                new_card.front, card.front, sim
            );
            return DuplicateVerdict::matched(card, sim);
        }

        if candidate_is_korean && contains_hangul(&card.front) {
            let stem = strip_suffixes(front);
            if is_comparable_stem(candidate_stem) && candidate_stem == stem {
                info!(
                    "Duplicate detected via Korean stem '{}': '{}' vs '{}'",
                    stem, new_card.front, card.front
                );
                return DuplicateVerdict::matched(card, settings.stem_similarity);
            }
        }
    }

    DuplicateVerdict::not_duplicate()
}

/// A candidate rejected by [`filter_duplicates`], with the verdict that rejected it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedCard {
    pub card: Card,
    pub verdict: DuplicateVerdict,
}

/// Result of filtering a batch of generated cards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub accepted: Vec<Card>,
    pub rejected: Vec<RejectedCard>,
}

/// Filter out duplicate cards from newly generated ones.
/// Accepted cards join the comparison corpus, so repeats within the batch are caught too.
pub fn filter_duplicates(
    candidates: Vec<Card>,
    existing: &[Card],
    settings: &DedupSettings,
) -> FilterOutcome {
    let mut corpus: Vec<Card> = existing.to_vec();
    let mut outcome = FilterOutcome::default();

    for card in candidates {
        let verdict = is_duplicate_with(&card, &corpus, settings);
        if verdict.is_duplicate {
            outcome.rejected.push(RejectedCard { card, verdict });
        } else {
            corpus.push(card.clone());
            outcome.accepted.push(card);
        }
    }

    if !outcome.rejected.is_empty() {
        info!(
            "Deduplication: removed {} duplicate cards, kept {} (threshold: {:.2})",
            outcome.rejected.len(),
            outcome.accepted.len(),
            settings.similarity_threshold
        );
    }

    outcome
}

/// Summarize recurring patterns in existing cards so the model can avoid them.
///
/// Corpora with Hangul report common endings and stems; others report words
/// repeated across several fronts.
pub fn analyze_patterns(existing: &[Card]) -> Vec<String> {
    if existing.is_empty() {
        return Vec::new();
    }

    if existing.iter().any(|c| contains_hangul(&c.front)) {
        korean_patterns(existing)
    } else {
        repeated_word_patterns(existing)
    }
}

fn korean_patterns(existing: &[Card]) -> Vec<String> {
    let mut endings: BTreeMap<String, usize> = BTreeMap::new();
    let mut stems: BTreeMap<String, usize> = BTreeMap::new();

    for card in existing.iter().filter(|c| contains_hangul(&c.front)) {
        let front = normalize(&card.front);
        let Some(last_word) = front.split_whitespace().last() else {
            continue;
        };
        if let Some(suffix) = suffix_of(last_word) {
            *endings.entry(format!("-{}", suffix)).or_insert(0) += 1;
        }
        let stem = strip_suffixes(last_word);
        if !stem.is_empty() {
            *stems.entry(stem.to_string()).or_insert(0) += 1;
        }
    }

    let mut lines = Vec::new();
    if !endings.is_empty() {
        lines.push(format!("Common endings: {}", format_counts(top_counts(endings))));
    }
    if !stems.is_empty() {
        let used: Vec<String> = top_counts(stems).into_iter().map(|(s, _)| s).collect();
        lines.push(format!("Word stems already covered: {}", used.join(", ")));
    }
    lines
}

fn repeated_word_patterns(existing: &[Card]) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for card in existing {
        let front = normalize(&card.front);
        // count each word once per card
        let words: BTreeSet<&str> = front
            .split_whitespace()
            .filter(|w| w.chars().count() > 3 && !STOPWORDS.contains(w))
            .collect();
        for word in words {
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }

    counts.retain(|_, count| *count >= 2);
    if counts.is_empty() {
        return Vec::new();
    }

    vec![format!(
        "Frequently repeated words: {}",
        format_counts(top_counts(counts))
    )]
}

/// Highest counts first, ties alphabetical, capped.
fn top_counts(counts: BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(MAX_PATTERN_ENTRIES);
    entries
}

fn format_counts(entries: Vec<(String, usize)>) -> String {
    entries
        .iter()
        .map(|(key, count)| format!("{} ({})", key, count))
        .collect::<Vec<_>>()
        .join(", ")
}
