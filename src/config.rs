use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::page::PAGE_CAPACITY;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// What `insert` does when the key is already present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with `KeyExists`
    #[default]
    Error,
    /// Log and leave the stored value untouched
    Ignore,
}

/// Engine settings, passed explicitly when opening a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Route debug messages to the log sink
    pub debug: bool,
    pub on_duplicate: DuplicatePolicy,
    /// Payload characters written per page
    pub page_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            on_duplicate: DuplicatePolicy::Error,
            page_capacity: PAGE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(&self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.page_capacity == 0 {
            return Err(ConfigError::Invalid(
                "page_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.on_duplicate = policy;
        self
    }

    pub fn with_page_capacity(mut self, capacity: usize) -> Self {
        self.page_capacity = capacity;
        self
    }
}

/// Destination for engine debug messages
pub trait LogSink: Send + Sync {
    /// `scope` is `catalog` or the name of the database the message is about
    fn log(&self, scope: &str, message: &str);
}

/// Forwards debug messages to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, scope: &str, message: &str) {
        tracing::debug!(target: "pagechain", scope, "{}", message);
    }
}

/// Debug switch paired with its sink
#[derive(Clone)]
pub(crate) struct DebugLog {
    enabled: bool,
    sink: Arc<dyn LogSink>,
}

impl DebugLog {
    pub(crate) fn new(enabled: bool, sink: Arc<dyn LogSink>) -> Self {
        Self { enabled, sink }
    }

    pub(crate) fn log(&self, scope: &str, args: fmt::Arguments<'_>) {
        if !self.enabled {
            return;
        }
        self.sink.log(scope, &args.to_string());
    }
}
