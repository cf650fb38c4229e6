//! TOML-backed rate definition configuration.
//!
//! A [`LimitsConfig`] holds named rate definitions, e.g.:
//!
//! ```toml
//! [definitions.global_submissions]
//! per_hour = 17000.0
//! per_minute = 400.0
//! per_second = 30.0
//!
//! [definitions.submissions]
//! per_day = 50.0
//! ```
//!
//! Loading validates every definition and logs advisory warnings for
//! disproportionate window thresholds. The config implements
//! [`RateDefinitionSource`] so limiters can resolve definitions by name.

use crate::application::ports::RateDefinitionSource;
use crate::domain::rate::{RateDefinition, RateDefinitionError, RateWindow};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Error loading or validating a limits configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    Parse(toml::de::Error),
    /// A named definition carried an invalid threshold.
    Definition {
        /// The definition's name in the config file.
        key: String,
        /// The underlying threshold error.
        source: RateDefinitionError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "invalid limits config: {}", e),
            ConfigError::Definition { key, source } => {
                write!(f, "invalid rate definition '{}': {}", key, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::Definition { source, .. } => Some(source),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Named rate definitions loaded from configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Definitions by lookup key.
    pub definitions: HashMap<String, RateDefinition>,
}

impl LimitsConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: LimitsConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every definition; advisory proportionality findings are
    /// logged as warnings, not errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, definition) in &self.definitions {
            definition
                .validate()
                .map_err(|source| ConfigError::Definition {
                    key: key.clone(),
                    source,
                })?;
            for warning in proportionality_warnings(definition) {
                tracing::warn!(definition = key.as_str(), "{}", warning);
            }
        }
        Ok(())
    }
}

impl RateDefinitionSource for LimitsConfig {
    fn definition(&self, key: &str) -> Option<RateDefinition> {
        self.definitions.get(key).copied()
    }
}

/// Advisory check: a finer window's threshold, extrapolated over a coarser
/// window's length, should be able to reach the coarser threshold.
/// Otherwise the coarser limit can never be hit and is dead configuration.
pub fn proportionality_warnings(definition: &RateDefinition) -> Vec<String> {
    let mut warnings = Vec::new();
    let limited: Vec<(RateWindow, f64)> = definition.limited_windows().collect();

    for (i, &(fine, fine_threshold)) in limited.iter().enumerate() {
        for &(coarse, coarse_threshold) in &limited[i + 1..] {
            let scale = coarse.duration().as_secs_f64() / fine.duration().as_secs_f64();
            let reachable = fine_threshold * scale;
            if reachable < coarse_threshold {
                warnings.push(format!(
                    "per-{} threshold {} is unreachable: per-{} threshold {} caps usage at {} per {}",
                    coarse, coarse_threshold, fine, fine_threshold, reachable, coarse
                ));
            }
        }
    }
    warnings
}
