//! Settings loaded from `sqlsift.toml`.
//!
//! Example configuration:
//!
//! ```toml
//! [engine]
//! workers = 8
//! unit_timeout_ms = 10000
//!
//! [recognizer]
//! append_methods = ["append"]
//! builder_types = ["StringBuilder", "StringBuffer"]
//! format_functions = ["String.format", "MessageFormat.format", "format"]
//! max_nesting = 128
//!
//! [filter]
//! min_confidence = 0.5
//! syntax_check = true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Root settings structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub recognizer: RecognizerSettings,
    pub filter: FilterSettings,
}

/// Worker pool and per-unit limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum number of units analysed concurrently.
    pub workers: usize,

    /// Deadline for a single unit, in milliseconds.
    pub unit_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            workers: 8,
            unit_timeout_ms: 10_000,
        }
    }
}

impl EngineSettings {
    pub fn unit_timeout(&self) -> Duration {
        Duration::from_millis(self.unit_timeout_ms)
    }
}

/// Names the recognizer treats as string-building operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecognizerSettings {
    /// Builder methods that append their argument.
    pub append_methods: Vec<String>,

    /// Types whose instances accumulate text.
    pub builder_types: Vec<String>,

    /// Calls whose first argument is a formatting template, matched on the
    /// dotted callee path as written.
    pub format_functions: Vec<String>,

    /// Deepest bracket nesting a unit may have before it is skipped.
    pub max_nesting: usize,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            append_methods: vec!["append".to_string()],
            builder_types: vec!["StringBuilder".to_string(), "StringBuffer".to_string()],
            format_functions: vec![
                "String.format".to_string(),
                "MessageFormat.format".to_string(),
                "format".to_string(),
            ],
            max_nesting: 128,
        }
    }
}

/// Confidence scoring and false-positive rejection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Minimum confidence (0.0 to 1.0) for a statement to be emitted.
    pub min_confidence: f64,

    /// Offer assembled text to a SQL parser as a soft signal.
    pub syntax_check: bool,

    /// Lowercase words that mark prose when they precede a keyword.
    pub narrative_verbs: Vec<String>,

    /// Words that cannot be table names.
    pub prose_words: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            syntax_check: true,
            narrative_verbs: [
                "please", "kindly", "must", "should", "will", "would", "can", "could", "cannot",
                "you", "we",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            prose_words: [
                "the", "a", "an", "your", "my", "our", "their", "this", "that", "these", "those",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SQLSIFT_CONFIG`
    /// 2. `./sqlsift.toml`
    /// 3. `~/.config/sqlsift/config.toml`
    pub fn load() -> SettingsResult<Self> {
        if let Ok(path) = env::var("SQLSIFT_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("sqlsift.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sqlsift").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Check values that deserialize fine but cannot run.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.engine.workers == 0 {
            return Err(SettingsError::InvalidConfig(
                "engine.workers must be at least 1".to_string(),
            ));
        }
        if self.recognizer.max_nesting == 0 {
            return Err(SettingsError::InvalidConfig(
                "recognizer.max_nesting must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.filter.min_confidence) {
            return Err(SettingsError::InvalidConfig(format!(
                "filter.min_confidence must be within [0, 1], got {}",
                self.filter.min_confidence
            )));
        }
        Ok(())
    }
}
