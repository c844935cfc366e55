// GenCards CLI - Inspect prompts and duplicate checks for flashcard generation
//
// Usage: gencards <command> [options]

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use gencards::{
    build_contextual_constraints, cards, config, detect_subject_type, filter_duplicates,
    get_system_prompt_with, is_duplicate_with, parse_flashcard_response, read_settings,
    set_setting, template_for, write_settings, Card, CardFormat, DeckChainEntry,
    GenerationError, PromptParams,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Helper to safely serialize JSON for output. Returns error JSON if serialization fails.
fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"JSON serialization failed: {}\"}}", e))
}

#[derive(Parser)]
#[command(
    name = "gencards",
    version = VERSION,
    about = "Build flashcard generation prompts and check generated cards for duplicates",
    long_about = None
)]
struct Cli {
    /// Output as JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a topic into a subject category
    Classify {
        /// Topic text
        topic: String,
    },

    /// Show the hierarchy rules for a deck chain
    Context {
        /// Deck from root to current, as TITLE or TITLE:TOPIC (repeatable)
        #[arg(short, long = "deck", required = true)]
        decks: Vec<String>,
    },

    /// Compose the system prompt for a generation request
    Prompt {
        /// Deck from root to current, as TITLE or TITLE:TOPIC (repeatable)
        #[arg(short, long = "deck", required = true)]
        decks: Vec<String>,
        /// JSON file with the deck's existing cards
        #[arg(short, long)]
        existing: Option<PathBuf>,
        /// Card format: simple, basic, complex or detailed
        #[arg(short, long)]
        format: Option<String>,
        /// Number of cards to request
        #[arg(short, long)]
        count: Option<usize>,
    },

    /// Check one card against existing cards
    Check {
        /// Front of the candidate card
        #[arg(short, long)]
        front: String,
        /// Back of the candidate card
        #[arg(short, long, default_value = "")]
        back: String,
        /// JSON file with the deck's existing cards
        #[arg(short, long)]
        existing: PathBuf,
    },

    /// Parse a model reply and drop duplicate cards
    Filter {
        /// File containing the raw model reply
        #[arg(short, long)]
        response: PathBuf,
        /// JSON file with the deck's existing cards
        #[arg(short, long)]
        existing: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g. dedup.similarity_threshold)
        key: String,
        /// Value to set
        value: String,
    },
    /// Print the settings file path
    Path,
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Classify { topic } => handle_classify(&topic, cli.json),
        Commands::Context { decks } => handle_context(&decks, cli.json),
        Commands::Prompt {
            decks,
            existing,
            format,
            count,
        } => handle_prompt(&decks, existing.as_deref(), format.as_deref(), count, cli.json),
        Commands::Check {
            front,
            back,
            existing,
        } => handle_check(Card::new(front, back), &existing, cli.json),
        Commands::Filter { response, existing } => {
            handle_filter(&response, existing.as_deref(), cli.json)
        }
        Commands::Config { action } => handle_config(action, cli.json),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

// ============================================================================
// Input Helpers
// ============================================================================

/// Card files are either a bare array or the model's `{"flashcards": [...]}` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum CardFile {
    List(Vec<Card>),
    Envelope { flashcards: Vec<Card> },
}

fn read_text(path: &Path) -> Result<String, GenerationError> {
    std::fs::read_to_string(path)
        .map_err(|e| GenerationError::io(&format!("Failed to read {}", path.display()), e))
}

fn load_cards(path: &Path) -> Result<Vec<Card>, GenerationError> {
    let content = read_text(path)?;
    let file: CardFile = serde_json::from_str(&content).map_err(|e| {
        GenerationError::new(
            gencards::ErrorCode::ParseError,
            format!("Failed to parse cards in {}: {}", path.display(), e),
        )
    })?;
    Ok(match file {
        CardFile::List(cards) => cards,
        CardFile::Envelope { flashcards } => flashcards,
    })
}

fn parse_chain(decks: &[String]) -> Vec<DeckChainEntry> {
    decks.iter().map(|d| DeckChainEntry::parse(d)).collect()
}

fn cards_table(cards: &[Card]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Front", "Back"]);
    for (i, card) in cards.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), card.front.clone(), card.back.clone()]);
    }
    table
}

// ============================================================================
// Handlers
// ============================================================================

fn handle_classify(topic: &str, json: bool) -> Result<(), GenerationError> {
    let category = detect_subject_type(topic);
    let template = template_for(category);

    if json {
        println!(
            "{}",
            to_json(&serde_json::json!({
                "topic": topic,
                "category": category,
                "template": template,
            }))
        );
    } else {
        println!("{} {}", "Category:".bold(), category.to_string().cyan());
        println!("{} {}", "Format:".bold(), template.format);
        println!(
            "{} {} → {}",
            "Example:".bold(),
            template.example_front,
            template.example_back
        );
        println!("{} {}", "Avoid:".bold(), template.avoid.dimmed());
    }
    Ok(())
}

fn handle_context(decks: &[String], json: bool) -> Result<(), GenerationError> {
    let chain = parse_chain(decks);
    let constraints = build_contextual_constraints(
        &cards::titles(&chain),
        &cards::topics(&chain),
        &cards::full_path(&chain),
    );

    if json {
        println!(
            "{}",
            to_json(&serde_json::json!({
                "chain": chain,
                "constraints": constraints,
            }))
        );
    } else {
        println!("{}", constraints);
    }
    Ok(())
}

fn handle_prompt(
    decks: &[String],
    existing: Option<&Path>,
    format: Option<&str>,
    count: Option<usize>,
    json: bool,
) -> Result<(), GenerationError> {
    let settings = read_settings()?;
    let format: CardFormat = match format {
        Some(f) => f
            .parse()
            .map_err(|e: String| GenerationError::new(gencards::ErrorCode::ConfigError, e))?,
        None => settings.default_format,
    };
    let existing_cards = match existing {
        Some(path) => load_cards(path)?,
        None => Vec::new(),
    };

    let chain = parse_chain(decks);
    let mut params = PromptParams::from_chain(&chain, existing_cards, format);
    params.card_count = count.or(settings.card_count);

    let prompt = get_system_prompt_with(&params, &settings.prompt);

    if json {
        println!(
            "{}",
            to_json(&serde_json::json!({
                "params": params,
                "prompt": prompt,
            }))
        );
    } else {
        println!("{}", prompt);
    }
    Ok(())
}

fn handle_check(card: Card, existing: &Path, json: bool) -> Result<(), GenerationError> {
    let settings = read_settings()?;
    let existing_cards = load_cards(existing)?;
    let verdict = is_duplicate_with(&card, &existing_cards, &settings.dedup);

    if json {
        println!("{}", to_json(&verdict));
    } else if verdict.is_duplicate {
        println!("{} '{}' is a duplicate", "✗".red(), card.front);
        if let (Some(similar), Some(sim)) = (&verdict.similar_card, verdict.similarity) {
            println!(
                "  Similar to: {} → {} ({:.0}% similar)",
                similar.front.cyan(),
                similar.back,
                sim * 100.0
            );
        }
    } else {
        println!(
            "{} '{}' is new ({} existing cards checked)",
            "✓".green(),
            card.front,
            existing_cards.len()
        );
    }
    Ok(())
}

fn handle_filter(response: &Path, existing: Option<&Path>, json: bool) -> Result<(), GenerationError> {
    let settings = read_settings()?;
    let reply = read_text(response)?;
    let candidates = parse_flashcard_response(&reply)?;
    let existing_cards = match existing {
        Some(path) => load_cards(path)?,
        None => Vec::new(),
    };

    let outcome = filter_duplicates(candidates, &existing_cards, &settings.dedup);

    if json {
        println!("{}", to_json(&outcome));
        return Ok(());
    }

    if outcome.accepted.is_empty() {
        println!("{}", "No new cards in the response.".yellow());
    } else {
        println!("{}", "Accepted cards:".green().bold());
        println!("{}", cards_table(&outcome.accepted));
    }

    if !outcome.rejected.is_empty() {
        println!();
        println!("{}", "Rejected duplicates:".red().bold());
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Front", "Similar to", "Similarity"]);
        for rejected in &outcome.rejected {
            let similar = rejected
                .verdict
                .similar_card
                .as_ref()
                .map(|c| c.front.clone())
                .unwrap_or_else(|| "-".to_string());
            let sim = rejected
                .verdict
                .similarity
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![rejected.card.front.clone(), similar, sim]);
        }
        println!("{table}");
    }

    println!(
        "\n{} accepted, {} rejected",
        outcome.accepted.len(),
        outcome.rejected.len()
    );
    Ok(())
}

fn handle_config(action: ConfigAction, json: bool) -> Result<(), GenerationError> {
    match action {
        ConfigAction::Show => {
            let settings = read_settings()?;
            if json {
                println!("{}", to_json(&settings));
            } else {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["Setting", "Value"]);
                let count = settings
                    .card_count
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "auto".to_string());
                table.add_row(vec!["default_format".to_string(), settings.default_format.as_str().to_string()]);
                table.add_row(vec!["card_count".to_string(), count]);
                table.add_row(vec!["dedup.min_length".to_string(), settings.dedup.min_length.to_string()]);
                table.add_row(vec!["dedup.max_length_ratio".to_string(), settings.dedup.max_length_ratio.to_string()]);
                table.add_row(vec!["dedup.similarity_threshold".to_string(), settings.dedup.similarity_threshold.to_string()]);
                table.add_row(vec!["dedup.stem_similarity".to_string(), settings.dedup.stem_similarity.to_string()]);
                table.add_row(vec!["prompt.max_format_examples".to_string(), settings.prompt.max_format_examples.to_string()]);
                table.add_row(vec!["prompt.max_listed_cards".to_string(), settings.prompt.max_listed_cards.to_string()]);
                println!("{table}");
            }
        }

        ConfigAction::Set { key, value } => {
            let mut settings = read_settings()?;
            set_setting(&mut settings, &key, &value)?;
            write_settings(&settings)?;

            if json {
                println!("{}", to_json(&settings));
            } else {
                println!("{} Set {} = {}", "✓".green(), key, value);
            }
        }

        ConfigAction::Path => {
            let path = config::get_preferences_path()?;
            if json {
                println!("{}", serde_json::json!({ "path": path }));
            } else {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
