//! View configuration.
//!
//! Loading order: defaults, then an optional TOML file, then `LEDGERVIEW_*`
//! environment variables, then validation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ViewError;
use crate::view::list::DEFAULT_SEARCH_PLACEHOLDER;
use crate::view::router::is_valid_base_path;

/// Prefix of environment overrides (`LEDGERVIEW_BASE_PATH`, ...).
pub const ENV_PREFIX: &str = "LEDGERVIEW_";

/// Settings shared by the views of one screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewsConfig {
    /// Path the list view is mounted at
    pub base_path: String,
    /// Search box placeholder
    pub search_placeholder: String,
    /// Text shown for empty field values
    pub empty_value: String,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            base_path: "/bills".to_string(),
            search_placeholder: DEFAULT_SEARCH_PLACEHOLDER.to_string(),
            empty_value: String::new(),
            log_filter: "info".to_string(),
        }
    }
}

impl ViewsConfig {
    /// Load configuration from a TOML file. Missing keys take defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ViewError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ViewError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| ViewError::config(format!("Invalid TOML in {}: {e}", path.display())))
    }

    /// Merge `LEDGERVIEW_*` variables from the process environment.
    pub fn merge_with_env(&mut self) -> Result<(), ViewError> {
        self.merge_with_env_from(std::env::vars())
    }

    /// Merge `LEDGERVIEW_*` variables from `vars`.
    pub fn merge_with_env_from<I>(&mut self, vars: I) -> Result<(), ViewError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            self.set_from_string(&name.to_lowercase(), value)?;
        }
        Ok(())
    }

    /// Set one setting by key.
    pub fn set_from_string(&mut self, key: &str, value: impl Into<String>) -> Result<(), ViewError> {
        let value = value.into();
        match key {
            "base_path" => self.base_path = value,
            "search_placeholder" => self.search_placeholder = value,
            "empty_value" => self.empty_value = value,
            "log_filter" => self.log_filter = value,
            other => return Err(ViewError::config(format!("Unknown setting: {other}"))),
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ViewError> {
        if !is_valid_base_path(&self.base_path) {
            return Err(ViewError::config(format!(
                "base_path must be '/' or start with '/' and not end with '/': {:?}",
                self.base_path
            )));
        }
        if self.log_filter.trim().is_empty() {
            return Err(ViewError::config("log_filter must not be empty"));
        }
        Ok(())
    }

    /// Defaults, optional file, environment, validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ViewError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }
}
