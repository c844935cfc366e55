// Configuration helpers - shared between the CLI and host services
//
// Settings live in ~/.gencards/preferences.json (or $GENCARDS_CONFIG_DIR).
// Missing files and missing fields fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::dedup::DedupSettings;
use crate::error::{ErrorCode, GenerationError};
use crate::prompt::{CardFormat, PromptSettings};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "GENCARDS_CONFIG_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub default_format: CardFormat,
    pub card_count: Option<usize>, // None = let the model decide
    pub dedup: DedupSettings,
    pub prompt: PromptSettings,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            default_format: CardFormat::Simple,
            card_count: None,
            dedup: DedupSettings::default(),
            prompt: PromptSettings::default(),
        }
    }
}

pub fn get_config_dir() -> Result<PathBuf, GenerationError> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".gencards"))
        .ok_or_else(|| {
            GenerationError::new(ErrorCode::ConfigError, "Could not find home directory")
        })
}

pub fn get_preferences_path() -> Result<PathBuf, GenerationError> {
    Ok(get_config_dir()?.join("preferences.json"))
}

// ============================================================================
// Generation Settings
// ============================================================================

pub fn read_settings() -> Result<GenerationSettings, GenerationError> {
    read_settings_from(&get_preferences_path()?)
}

pub fn write_settings(settings: &GenerationSettings) -> Result<(), GenerationError> {
    write_settings_to(&get_preferences_path()?, settings)
}

pub fn read_settings_from(path: &Path) -> Result<GenerationSettings, GenerationError> {
    if !path.exists() {
        return Ok(GenerationSettings::default());
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| GenerationError::io("Failed to read settings", e))?;
    serde_json::from_str(&content).map_err(|e| {
        GenerationError::new(
            ErrorCode::ConfigError,
            format!("Failed to parse settings: {}", e),
        )
    })
}

pub fn write_settings_to(path: &Path, settings: &GenerationSettings) -> Result<(), GenerationError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| GenerationError::io("Failed to create config directory", e))?;
    }
    let content = serde_json::to_string_pretty(settings).map_err(|e| {
        GenerationError::new(
            ErrorCode::ConfigError,
            format!("Failed to serialize settings: {}", e),
        )
    })?;
    std::fs::write(path, content).map_err(|e| GenerationError::io("Failed to write settings", e))
}

/// Keys accepted by [`set_setting`].
pub const SETTING_KEYS: &[&str] = &[
    "default_format",
    "card_count",
    "dedup.min_length",
    "dedup.max_length_ratio",
    "dedup.similarity_threshold",
    "dedup.stem_similarity",
    "prompt.max_format_examples",
    "prompt.max_listed_cards",
];

/// Update one setting by dotted key, validating the value.
pub fn set_setting(
    settings: &mut GenerationSettings,
    key: &str,
    value: &str,
) -> Result<(), GenerationError> {
    let invalid = |msg: String| GenerationError::new(ErrorCode::ConfigError, msg);

    match key {
        "default_format" => settings.default_format = value.parse().map_err(invalid)?,
        "card_count" => {
            settings.card_count = match value {
                "none" | "auto" => None,
                _ => Some(parse_count(key, value)?),
            }
        }
        "dedup.min_length" => settings.dedup.min_length = parse_usize(key, value)?,
        "dedup.max_length_ratio" => {
            let ratio = parse_f64(key, value)?;
            if ratio < 1.0 {
                return Err(invalid(format!("{} must be at least 1.0", key)));
            }
            settings.dedup.max_length_ratio = ratio;
        }
        "dedup.similarity_threshold" => settings.dedup.similarity_threshold = parse_unit(key, value)?,
        "dedup.stem_similarity" => settings.dedup.stem_similarity = parse_unit(key, value)?,
        "prompt.max_format_examples" => {
            settings.prompt.max_format_examples = parse_usize(key, value)?
        }
        "prompt.max_listed_cards" => settings.prompt.max_listed_cards = parse_usize(key, value)?,
        _ => {
            return Err(invalid(format!(
                "Unknown setting: {}. Valid keys: {}",
                key,
                SETTING_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, GenerationError> {
    value.trim().parse().map_err(|_| {
        GenerationError::new(
            ErrorCode::ConfigError,
            format!("{} must be a non-negative integer, got '{}'", key, value),
        )
    })
}

fn parse_count(key: &str, value: &str) -> Result<usize, GenerationError> {
    match parse_usize(key, value)? {
        0 => Err(GenerationError::new(
            ErrorCode::ConfigError,
            format!("{} must be at least 1", key),
        )),
        n => Ok(n),
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64, GenerationError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            GenerationError::new(
                ErrorCode::ConfigError,
                format!("{} must be a number, got '{}'", key, value),
            )
        })
}

fn parse_unit(key: &str, value: &str) -> Result<f64, GenerationError> {
    let v = parse_f64(key, value)?;
    if !(0.0..=1.0).contains(&v) {
        return Err(GenerationError::new(
            ErrorCode::ConfigError,
            format!("{} must be between 0.0 and 1.0", key),
        ));
    }
    Ok(v)
}
