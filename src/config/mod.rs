//! Configuration for the analysis engine.
//!
//! Settings are read from a TOML file and every section falls back to its
//! defaults, so an empty file (or no file at all) is a valid configuration.

mod settings;

pub use settings::{
    EngineSettings, FilterSettings, RecognizerSettings, Settings, SettingsError, SettingsResult,
};
