//! Environment lookups with fail-fast errors.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

/// Missing or malformed configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable {name} is required but not set")]
    Missing { name: String },

    #[error("Environment variable {name} is invalid: {reason}")]
    Invalid { name: String, reason: String },

    #[error("Environment variable {name} is not valid JSON: {reason}")]
    InvalidJson { name: String, reason: String },
}

impl ConfigError {
    pub fn invalid(name: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Variable the error refers to.
    pub fn name(&self) -> &str {
        match self {
            Self::Missing { name }
            | Self::Invalid { name, .. }
            | Self::InvalidJson { name, .. } => name,
        }
    }
}

/// Where configuration values come from.
pub trait VarSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl VarSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Value of `name`, trimmed. Absent or blank is an error.
pub fn require_env(source: &impl VarSource, name: &str) -> Result<String, ConfigError> {
    optional_env(source, name).ok_or_else(|| ConfigError::Missing {
        name: name.to_string(),
    })
}

/// Value of `name` parsed as JSON.
pub fn require_json_env<T: DeserializeOwned>(
    source: &impl VarSource,
    name: &str,
) -> Result<T, ConfigError> {
    let raw = require_env(source, name)?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidJson {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Value of `name`, or `None` when absent or blank.
pub fn optional_env(source: &impl VarSource, name: &str) -> Option<String> {
    source
        .var(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Boolean flag: true/false, 1/0, yes/no, on/off. Absent yields `default`.
pub fn flag_env(source: &impl VarSource, name: &str, default: bool) -> Result<bool, ConfigError> {
    match optional_env(source, name) {
        None => Ok(default),
        Some(v) => match v.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigError::invalid(
                name,
                format!("expected a boolean, got '{other}'"),
            )),
        },
    }
}
