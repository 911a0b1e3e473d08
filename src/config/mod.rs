//! Configuration (layered: defaults < TOML file < environment < CLI flags).
//!
//! Everything the agents and runner need is carried in an explicit
//! [`AgentreeConfig`] value handed to the constructors. Nothing is written
//! back into the process environment.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::GenerationSettings;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_PLANNER_MODEL: &str = "gemini-2.5-pro-exp-03-25";
pub const DEFAULT_APP_NAME: &str = "report_writer_app";
pub const DEFAULT_USER_ID: &str = "Admin_01";
pub const DEFAULT_SESSION_ID: &str = "session_001";

/// Environment variables consulted for the model credential, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];
pub const BASE_URL_ENV_VAR: &str = "AGENTREE_BASE_URL";

/// Explicit configuration for a run.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentreeConfig {
    /// Model API credential. Not validated locally; a bad or missing key
    /// surfaces as an authentication error from the provider.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub planner_model: String,
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    /// Model turns allowed per agent invocation before escalating.
    pub max_turns: usize,
    /// How many agents deep a delegation chain may go.
    pub max_delegation_depth: usize,
    pub request_timeout_secs: u64,
    pub generation: GenerationSettings,
}

impl fmt::Debug for AgentreeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentreeConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("planner_model", &self.planner_model)
            .field("app_name", &self.app_name)
            .field("user_id", &self.user_id)
            .field("session_id", &self.session_id)
            .field("max_turns", &self.max_turns)
            .field("max_delegation_depth", &self.max_delegation_depth)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Default for AgentreeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            planner_model: DEFAULT_PLANNER_MODEL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            max_turns: 20,
            max_delegation_depth: 8,
            request_timeout_secs: 120,
            generation: GenerationSettings::default(),
        }
    }
}

impl AgentreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Defaults plus environment (including a `.env` file if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::new();
        config.apply_env_with(|key| std::env::var(key).ok());
        config
    }

    /// Full layered load: defaults, then `path` (or the per-user config file
    /// when it exists), then environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "loading user config");
                    Self::from_toml_file(&path)?
                }
                None => Self::new(),
            },
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay environment values using `lookup` as the variable source.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .find_map(|var| lookup(var).filter(|v| !v.is_empty()))
        {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(BASE_URL_ENV_VAR).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// `<config dir>/agentree/config.toml` for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "agentree")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
