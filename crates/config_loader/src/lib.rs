//! # Config Loader
//!
//! Loads the learner configuration: which learners run at session end,
//! their sample thresholds and percentiles, the blend rate and where the
//! parameter model and lane-change dataset live.
//!
//! Every entry point validates before returning, so a `LearnerConfig`
//! obtained here is ready for `LearningSession::open`.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("learner.toml")).unwrap();
//! println!("Model: {}", config.storage.model_path.display());
//! ```

mod parser;
mod validator;

pub use contracts::LearnerConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Learner configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a learner configuration file (`.toml` or `.json`)
    ///
    /// Missing sections fall back to their defaults, so an empty file yields
    /// `LearnerConfig::default()` with every learner disabled. Beyond the
    /// per-field ranges (`max_change_rate` and percentiles in `[0, 1]`,
    /// sample and segment counts of at least 2), the loaded config must
    /// satisfy:
    /// - `trajectory.lateral_threshold < 0`, since only leftward lane
    ///   changes are extracted
    /// - finite gap sentinels and a positive `target_speed.speed_scale`
    /// - `storage.model_path` ending in `.json` or `.bin`
    /// - a non-empty `storage.dataset_path` distinct from the model path
    ///
    /// # Errors
    /// `ConfigParse` for an unreadable file, unknown extension or syntax
    /// error; `ConfigValidation` naming the first offending field otherwise.
    pub fn load_from_path(path: &Path) -> Result<LearnerConfig, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Parse and validate configuration text
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<LearnerConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Check a config built in code, with the same rules as `load_from_path`
    pub fn validate(config: &LearnerConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Render a config as TOML, e.g. to write out the defaults
    pub fn to_toml(config: &LearnerConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(config: &LearnerConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}
