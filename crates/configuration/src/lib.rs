//! # Configuration
//!
//! Loads and validates the JSON run description that drives a backtest:
//! the replay window, the ticker, the starting cash, and the strategy
//! specifications with their parameter lists.
//!
//! The typed [`Settings`] carry the recognized top-level keys; the raw
//! document is kept alongside because strategy parameter blocks are
//! free-form and only expanded into concrete variants by the backtester.

use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{AnalyzeSpec, Settings};

/// Loads a run description from a JSON file.
///
/// This function is the primary entry point for this crate. It reads the
/// file, deserializes the recognized keys into [`Settings`], stashes the
/// complete raw document for downstream expansion, and validates the result.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .build()?;

    // Keep the whole document; unrecognized keys are strategy parameters.
    let document = builder.try_deserialize::<serde_json::Value>()?;
    let mut settings: Settings = serde_json::from_value(document.clone())?;
    settings.document = document;
    settings.validate()?;

    tracing::info!(
        "Loaded run description from {}: {} in [{}, {})",
        path.display(),
        settings.ticker,
        settings.from_date,
        settings.to_date
    );
    Ok(settings)
}
