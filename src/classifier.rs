//! Subject classification and the per-subject card templates.
//!
//! Topics are matched by raw substring containment on the lower-cased text,
//! so Hangul tokens match inside larger words without any tokenization.

use serde::{Deserialize, Serialize};

/// Subject domains a topic can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Language,
    Science,
    Mathematics,
    History,
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Language,
        Category::Science,
        Category::Mathematics,
        Category::History,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Language => "language",
            Category::Science => "science",
            Category::Mathematics => "mathematics",
            Category::History => "history",
            Category::General => "general",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Unknown subject category: {}", s))
    }
}

/// Keyword lists in priority order. The first category with a hit wins.
pub const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Language,
        &[
            "language",
            "korean",
            "japanese",
            "chinese",
            "mandarin",
            "spanish",
            "french",
            "german",
            "italian",
            "portuguese",
            "russian",
            "arabic",
            "english",
            "vocabulary",
            "grammar",
            "slang",
            "idiom",
            "phrase",
            "conjugation",
            "pronunciation",
            "hangul",
            "kanji",
            "한국어",
            "단어",
            "문법",
            "표현",
            "일본어",
            "영어",
        ],
    ),
    (
        Category::Science,
        &[
            "science",
            "biology",
            "chemistry",
            "physics",
            "anatomy",
            "astronomy",
            "geology",
            "ecology",
            "genetics",
            "molecule",
            "cellular",
            "organism",
            "evolution",
            "과학",
            "화학",
            "생물",
            "물리",
        ],
    ),
    (
        Category::Mathematics,
        &[
            "math",
            "algebra",
            "calculus",
            "geometry",
            "trigonometry",
            "statistics",
            "probability",
            "equation",
            "theorem",
            "arithmetic",
            "수학",
        ],
    ),
    (
        Category::History,
        &[
            "history",
            "historical",
            "world war",
            "civil war",
            "warfare",
            "empire",
            "dynasty",
            "revolution",
            "ancient",
            "medieval",
            "civilization",
            "century",
            "monarch",
            "역사",
            "조선",
        ],
    ),
];

/// Classify a free-text topic. Always returns one of the five categories.
pub fn detect_subject_type(topic: &str) -> Category {
    let lower = topic.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

/// Static guidance for generating cards in one subject category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubjectTemplate {
    pub format: &'static str,
    pub example_front: &'static str,
    pub example_back: &'static str,
    pub avoid: &'static str,
    pub context_rules: &'static [&'static str],
}

const TEMPLATES: &[(Category, SubjectTemplate)] = &[
    (
        Category::Language,
        SubjectTemplate {
            format: "Front: a word or expression in the target language. Back: its meaning, pronunciation and a short usage note",
            example_front: "배고파요",
            example_back: "I'm hungry (bae-go-pa-yo) - polite form, used with people you don't know well",
            avoid: "Avoid general definitions and grammar lectures; teach one concrete word or expression per card",
            context_rules: &[
                "Use natural, commonly used expressions rather than textbook-only phrases",
                "Include romanization or pronunciation when the script is non-Latin",
                "Note the politeness level or register when it matters",
            ],
        },
    ),
    (
        Category::Science,
        SubjectTemplate {
            format: "Front: a specific concept, process or term. Back: a precise explanation with the key mechanism",
            example_front: "What does ATP synthase do?",
            example_back: "It uses the proton gradient across a membrane to produce ATP from ADP and phosphate",
            avoid: "Avoid general definitions of the whole field; focus on specific mechanisms and facts",
            context_rules: &[
                "Prefer cause-and-effect questions over bare term recall",
                "Use correct units and standard notation",
            ],
        },
    ),
    (
        Category::Mathematics,
        SubjectTemplate {
            format: "Front: a problem, formula or theorem to recall. Back: the answer with the key step or statement",
            example_front: "Derivative of sin(x)?",
            example_back: "cos(x)",
            avoid: "Avoid general definitions of mathematics; each card tests one formula, rule or technique",
            context_rules: &[
                "Write formulas in plain text notation",
                "Keep each card to a single step or fact",
            ],
        },
    ),
    (
        Category::History,
        SubjectTemplate {
            format: "Front: an event, person or date question. Back: the answer with brief significance",
            example_front: "When did the Joseon dynasty begin?",
            example_back: "1392, founded by Yi Seong-gye after the fall of Goryeo",
            avoid: "Avoid general definitions and vague summaries; ask about concrete events, people and dates",
            context_rules: &[
                "Include dates or periods where relevant",
                "Explain significance in one sentence",
            ],
        },
    ),
    (
        Category::General,
        SubjectTemplate {
            format: "Front: a clear, specific question. Back: a concise, accurate answer",
            example_front: "What is the main ingredient of guacamole?",
            example_back: "Avocado",
            avoid: "Avoid general definitions and trivia unrelated to the topic",
            context_rules: &["Each card covers exactly one fact or idea"],
        },
    ),
];

/// Look up the static template for a category.
pub fn template_for(category: Category) -> &'static SubjectTemplate {
    TEMPLATES
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, t)| t)
        .unwrap_or(&TEMPLATES[TEMPLATES.len() - 1].1)
}
