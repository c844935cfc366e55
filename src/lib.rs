// GenCards Library - Flashcard generation engine
//
// Builds LLM prompts from a deck hierarchy and filters generated cards
// against the ones a deck already holds. Everything here is pure and
// synchronous; the model call itself belongs to the host application.

pub mod cards;
pub mod classifier;
pub mod config;
pub mod context;
pub mod dedup;
pub mod error;
pub mod korean;
pub mod prompt;
pub mod response;

// Re-export key types for convenience
pub use cards::{Card, DeckChainEntry, DuplicateVerdict};
pub use classifier::{detect_subject_type, template_for, Category, SubjectTemplate};
pub use config::{read_settings, set_setting, write_settings, GenerationSettings};
pub use context::build_contextual_constraints;
pub use dedup::{
    analyze_patterns, filter_duplicates, is_duplicate, is_duplicate_with, DedupSettings,
    FilterOutcome,
};
pub use error::{ErrorCode, GenerationError};
pub use prompt::{
    get_system_prompt, get_system_prompt_with, CardFormat, PromptParams, PromptSettings,
};
pub use response::parse_flashcard_response;
