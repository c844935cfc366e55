//! Prompt composition for flashcard generation.
//!
//! Combines the subject template, deck hierarchy rules, topic-specific
//! constraints and a summary of existing cards into the instruction string
//! sent to the model. Section order is fixed and the output is deterministic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cards::{self, Card, DeckChainEntry};
use crate::classifier::{detect_subject_type, template_for};
use crate::context::build_contextual_constraints;
use crate::dedup::analyze_patterns;

/// The JSON shape the model must answer with.
pub const RESPONSE_SHAPE: &str = r#"{"flashcards":[{"front":"","back":""}]}"#;

/// Upper bound on cards requested when no count is given.
const DEFAULT_MAX_CARDS: usize = 10;

/// How much detail each card should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardFormat {
    #[default]
    Simple,
    Complex,
}

impl CardFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardFormat::Simple => "simple",
            CardFormat::Complex => "complex",
        }
    }

    fn guidance(&self) -> &'static str {
        match self {
            CardFormat::Simple => {
                "- Front: a single word, term or short phrase\n- Back: a concise answer on one line"
            }
            CardFormat::Complex => {
                "- Front: a full question or expression in context\n- Back: the answer followed by a short explanation and one example"
            }
        }
    }
}

impl std::str::FromStr for CardFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" | "basic" => Ok(CardFormat::Simple),
            "complex" | "detailed" => Ok(CardFormat::Complex),
            other => Err(format!(
                "Unknown card format: {}. Use simple, basic, complex or detailed",
                other
            )),
        }
    }
}

/// Limits on how much of the existing deck is echoed back into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub max_format_examples: usize,
    pub max_listed_cards: usize,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            max_format_examples: 3,
            max_listed_cards: 30,
        }
    }
}

/// Everything needed to compose one generation prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptParams {
    pub main_topic: String,
    pub subtopic: String,
    pub deck_chain: Vec<String>,
    pub deck_topics: Vec<String>,
    pub full_path: String,
    pub existing_cards: Vec<Card>,
    pub format: CardFormat,
    pub card_count: Option<usize>,
}

impl PromptParams {
    /// Derive params from a deck chain: the root topic is the main topic and
    /// the current deck's topic the subtopic.
    pub fn from_chain(chain: &[DeckChainEntry], existing_cards: Vec<Card>, format: CardFormat) -> Self {
        let main_topic = chain.first().map(|e| e.topic().to_string()).unwrap_or_default();
        let subtopic = chain.last().map(|e| e.topic().to_string()).unwrap_or_default();
        Self {
            main_topic,
            subtopic,
            deck_chain: cards::titles(chain),
            deck_topics: cards::topics(chain),
            full_path: cards::full_path(chain),
            existing_cards,
            format,
            card_count: None,
        }
    }

    pub fn with_card_count(mut self, count: usize) -> Self {
        self.card_count = Some(count);
        self
    }
}

/// A row of the topic constraint table.
#[derive(Debug)]
pub struct ConstraintRule {
    /// Literal substrings that must each appear in some deck topic
    pub deck_topics_contain: &'static [&'static str],
    /// Case-insensitive substring the subtopic must contain, if set
    pub subtopic_contains: Option<&'static str>,
    pub constraints: &'static [&'static str],
}

/// Topic-specific constraints. Every matching row applies, in order.
pub const CONSTRAINT_RULES: &[ConstraintRule] = &[
    ConstraintRule {
        deck_topics_contain: &["Korean"],
        subtopic_contains: None,
        constraints: &[
            "Write the Korean side in Hangul, never romanization alone",
            "Add romanization in parentheses on the back",
            "Use expressions Koreans actually say today",
        ],
    },
    ConstraintRule {
        deck_topics_contain: &["Korean", "Food"],
        subtopic_contains: None,
        constraints: &[
            "Every card must relate to Korean food, dishes, ingredients, eating or dining",
            "Do NOT include general vocabulary unrelated to food",
        ],
    },
    ConstraintRule {
        deck_topics_contain: &["Korean", "Food"],
        subtopic_contains: Some("slang"),
        constraints: &[
            "Only Korean food slang: informal expressions such as 존맛, 먹방, 꿀맛, 배터지다",
            "Do NOT include standard dish names or formal food vocabulary",
            "Explain on the back when and with whom the slang is used",
        ],
    },
    ConstraintRule {
        deck_topics_contain: &["Japanese"],
        subtopic_contains: None,
        constraints: &[
            "Write the Japanese side with kanji and kana as natives would",
            "Add the reading in hiragana and romaji on the back",
        ],
    },
    ConstraintRule {
        deck_topics_contain: &["Spanish"],
        subtopic_contains: None,
        constraints: &["Mark the gender of nouns (el/la) on the back"],
    },
    ConstraintRule {
        deck_topics_contain: &["Grammar"],
        subtopic_contains: None,
        constraints: &[
            "Each card tests one grammar point with an example sentence",
            "Do NOT create plain vocabulary cards",
        ],
    },
];

/// Collect the bullet constraints whose rules match the deck topics and subtopic.
pub fn topic_constraints(deck_topics: &[String], subtopic: &str) -> Vec<&'static str> {
    let subtopic = subtopic.to_lowercase();
    CONSTRAINT_RULES
        .iter()
        .filter(|rule| {
            rule.deck_topics_contain
                .iter()
                .all(|needle| deck_topics.iter().any(|t| t.contains(needle)))
        })
        .filter(|rule| match rule.subtopic_contains {
            Some(needle) => subtopic.contains(needle),
            None => true,
        })
        .flat_map(|rule| rule.constraints.iter().copied())
        .collect()
}

/// Warning block describing the cards already in the deck.
/// Empty when there are no existing cards.
pub fn build_existing_cards_block(existing: &[Card], settings: &PromptSettings) -> String {
    if existing.is_empty() {
        return String::new();
    }

    let mut block = format!(
        "EXISTING CARDS ({} already in this deck - do NOT duplicate them):\n\nFormat examples (match this style, but do not repeat these cards):",
        existing.len()
    );
    for (i, card) in existing.iter().take(settings.max_format_examples).enumerate() {
        block.push_str(&format!(
            "\n{}. Front: \"{}\" | Back: \"{}\"",
            i + 1,
            card.front,
            card.back
        ));
    }

    let patterns = analyze_patterns(existing);
    if !patterns.is_empty() {
        block.push_str("\n\nPatterns to avoid:");
        for line in &patterns {
            block.push_str(&format!("\n- {}", line));
        }
    }

    if existing.len() > settings.max_format_examples {
        let covered: Vec<&str> = existing
            .iter()
            .skip(settings.max_format_examples)
            .take(settings.max_listed_cards)
            .map(|c| c.front.as_str())
            .collect();
        block.push_str(&format!("\n\nAlso already covered: {}", covered.join("; ")));
    }

    block.push_str(
        "\n\nGenerate only NEW cards. Do not rephrase, conjugate or slightly reword existing fronts.",
    );
    block
}

/// Build the full instruction string with default prompt settings.
pub fn get_system_prompt(params: &PromptParams) -> String {
    get_system_prompt_with(params, &PromptSettings::default())
}

/// Build the full instruction string for one generation request.
pub fn get_system_prompt_with(params: &PromptParams, settings: &PromptSettings) -> String {
    let category = detect_subject_type(&params.main_topic);
    let template = template_for(category);

    let focus = if params.subtopic.trim().is_empty() || params.subtopic == params.main_topic {
        format!("\"{}\"", params.main_topic)
    } else {
        format!("\"{}\" within \"{}\"", params.subtopic, params.main_topic)
    };
    let count = match params.card_count {
        Some(n) => format!("Generate exactly {} flashcards", n),
        None => format!("Generate up to {} flashcards", DEFAULT_MAX_CARDS),
    };

    let mut sections = vec![format!(
        "You are an expert flashcard creator. {} about {}.",
        count, focus
    )];

    let subject_rules: Vec<String> = template
        .context_rules
        .iter()
        .map(|r| format!("- {}", r))
        .collect();
    sections.push(format!(
        "SUBJECT TYPE: {}\nFORMAT: {}\nExample:\nFront: \"{}\"\nBack: \"{}\"\nIMPORTANT: {}\n{}",
        category,
        template.format,
        template.example_front,
        template.example_back,
        template.avoid,
        subject_rules.join("\n")
    ));

    sections.push(format!(
        "CARD FORMAT ({}):\n{}",
        params.format.as_str(),
        params.format.guidance()
    ));

    let hierarchy =
        build_contextual_constraints(&params.deck_chain, &params.deck_topics, &params.full_path);
    if !hierarchy.is_empty() {
        sections.push(hierarchy);
    }

    let constraints = topic_constraints(&params.deck_topics, &params.subtopic);
    if !constraints.is_empty() {
        let bullets: Vec<String> = constraints.iter().map(|c| format!("- {}", c)).collect();
        sections.push(format!("TOPIC CONSTRAINTS:\n{}", bullets.join("\n")));
    }

    let existing = build_existing_cards_block(&params.existing_cards, settings);
    if !existing.is_empty() {
        sections.push(existing);
    }

    sections.push(format!(
        "Return ONLY valid JSON in this exact format:\n{}",
        RESPONSE_SHAPE
    ));

    let prompt = sections.join("\n\n");
    debug!(
        "Composed {} prompt for '{}' ({} chars, {} existing cards)",
        category,
        params.main_topic,
        prompt.len(),
        params.existing_cards.len()
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn korean_slang_params(existing: Vec<Card>) -> PromptParams {
        let chain = vec![
            DeckChainEntry::new("Korean", None),
            DeckChainEntry::new("Food", None),
            DeckChainEntry::new("Slang", None),
        ];
        PromptParams::from_chain(&chain, existing, CardFormat::Simple)
    }

    #[test]
    fn test_card_format_aliases() {
        assert_eq!("basic".parse::<CardFormat>().unwrap(), CardFormat::Simple);
        assert_eq!("Detailed".parse::<CardFormat>().unwrap(), CardFormat::Complex);
        assert_eq!("complex".parse::<CardFormat>().unwrap(), CardFormat::Complex);
        assert!("fancy".parse::<CardFormat>().is_err());
    }

    #[test]
    fn test_from_chain() {
        let params = korean_slang_params(vec![]);
        assert_eq!(params.main_topic, "Korean");
        assert_eq!(params.subtopic, "Slang");
        assert_eq!(params.full_path, "Korean > Food > Slang");
        assert_eq!(params.deck_topics, strings(&["Korean", "Food", "Slang"]));
    }

    #[test]
    fn test_topic_constraints_layer() {
        let korean = topic_constraints(&strings(&["Korean"]), "Korean");
        assert_eq!(korean.len(), 3);

        let food = topic_constraints(&strings(&["Korean", "Food"]), "Food");
        assert_eq!(food.len(), 5);
        assert_eq!(food[0], korean[0]);

        let slang = topic_constraints(&strings(&["Korean", "Food", "Slang"]), "Food Slang");
        assert_eq!(slang.len(), 8);
        assert!(slang[5].starts_with("Only Korean food slang"));
    }

    #[test]
    fn test_topic_constraints_literal_match() {
        // deck topic checks are case-sensitive literal substrings
        assert!(topic_constraints(&strings(&["korean"]), "").is_empty());
        assert!(topic_constraints(&strings(&["Biology"]), "Cells").is_empty());
        assert_eq!(
            topic_constraints(&strings(&["Korean Grammar"]), "particles").len(),
            5
        );
    }

    #[test]
    fn test_prompt_section_order() {
        let prompt = get_system_prompt(&korean_slang_params(vec![Card::new("존맛", "delicious")]));

        let positions: Vec<usize> = [
            "You are an expert flashcard creator.",
            "SUBJECT TYPE: language",
            "CARD FORMAT (simple)",
            "DECK HIERARCHY:",
            "TOPIC CONSTRAINTS:",
            "EXISTING CARDS (1 already",
            "Return ONLY valid JSON",
        ]
        .iter()
        .map(|needle| prompt.find(needle).unwrap())
        .collect();

        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
        assert!(prompt.ends_with(RESPONSE_SHAPE));
    }

    #[test]
    fn test_prompt_contains_existing_examples() {
        let existing = vec![
            Card::new("존맛탱", "extremely delicious"),
            Card::new("먹방", "eating broadcast"),
        ];
        let prompt = get_system_prompt(&korean_slang_params(existing));

        assert!(prompt.contains("Format examples"));
        assert!(prompt.contains("Front: \"존맛탱\" | Back: \"extremely delicious\""));
        assert!(prompt.contains("Front: \"먹방\" | Back: \"eating broadcast\""));
        assert!(!prompt.contains("Also already covered"));
    }

    #[test]
    fn test_existing_block_limits_examples() {
        let existing: Vec<Card> = (1..=6)
            .map(|i| Card::new(format!("term number {}", i), format!("answer {}", i)))
            .collect();
        let block = build_existing_cards_block(&existing, &PromptSettings::default());

        assert!(block.contains("3. Front: \"term number 3\""));
        assert!(!block.contains("4. Front:"));
        assert!(block.contains("Also already covered: term number 4; term number 5; term number 6"));
        assert!(block.contains("Frequently repeated words: number (6), term (6)"));
    }

    #[test]
    fn test_existing_block_empty() {
        assert_eq!(build_existing_cards_block(&[], &PromptSettings::default()), "");
    }

    #[test]
    fn test_prompt_without_hierarchy_or_cards() {
        let params = PromptParams {
            main_topic: "Photosynthesis".to_string(),
            ..PromptParams::default()
        };
        let prompt = get_system_prompt(&params);

        assert!(prompt.contains("about \"Photosynthesis\""));
        assert!(prompt.contains("SUBJECT TYPE: general"));
        assert!(!prompt.contains("DECK HIERARCHY"));
        assert!(!prompt.contains("TOPIC CONSTRAINTS"));
        assert!(!prompt.contains("EXISTING CARDS"));
        assert!(prompt.contains("Generate up to 10 flashcards"));
    }

    #[test]
    fn test_prompt_card_count_and_format() {
        let params = PromptParams {
            main_topic: "Calculus".to_string(),
            subtopic: "Derivatives".to_string(),
            format: CardFormat::Complex,
            ..PromptParams::default()
        }
        .with_card_count(5);
        let prompt = get_system_prompt(&params);

        assert!(prompt.contains("Generate exactly 5 flashcards about \"Derivatives\" within \"Calculus\""));
        assert!(prompt.contains("SUBJECT TYPE: mathematics"));
        assert!(prompt.contains("CARD FORMAT (complex)"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let existing = vec![Card::new("먹었어요", "ate"), Card::new("맛있다", "tasty")];
        let params = korean_slang_params(existing);
        assert_eq!(get_system_prompt(&params), get_system_prompt(&params));
    }
}
