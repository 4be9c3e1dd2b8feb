//! Runtime configuration
//!
//! Loaded from `undercover.toml` in the OS config directory. Every field has
//! a default, so a missing or broken file just means default settings.
//! Environment variables override the file.

use crate::game::judge::{ExactJudge, FallbackJudge, GuessJudge, RemoteJudge};
use crate::game::round::{RoundSettings, DEFAULT_GUESS_SECONDS, DEFAULT_VERDICT_DISPLAY_SECONDS};
use crate::game::words::WordBank;
use crate::game::RoleConfig;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Name of the settings file inside the config directory
pub const CONFIG_FILE: &str = "undercover.toml";

/// Env var holding the judge service bearer token
pub const JUDGE_TOKEN_ENV: &str = "UNDERCOVER_JUDGE_TOKEN";

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds Mr. White has to guess after being captured
    pub guess_seconds: u32,
    /// Seconds a guess verdict stays on screen before the game moves on
    pub verdict_display_seconds: u32,
    pub default_mr_white: usize,
    pub default_undercover: usize,
    /// Custom `common|undercover` catalogue replacing the built-in one
    pub word_bank_path: Option<PathBuf>,
    pub judge: JudgeConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            guess_seconds: DEFAULT_GUESS_SECONDS,
            verdict_display_seconds: DEFAULT_VERDICT_DISPLAY_SECONDS,
            default_mr_white: 1,
            default_undercover: 1,
            word_bank_path: None,
            judge: JudgeConfig::default(),
        }
    }
}

/// Remote guess judge. Without an endpoint guesses are judged offline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub token: Option<String>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 10,
            token: None,
        }
    }
}

/// OS-standard directories for this application
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "undercover")
}

/// Full path of the settings file, if the OS exposes a config directory
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Directory the log file is written to
pub fn log_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

impl Settings {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Self {
        let mut settings = match config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::info!("No config directory available, using defaults");
                Self::default()
            }
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    /// Read `path`, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Settings>(&content) {
                Ok(settings) => {
                    tracing::info!(path = %path.display(), "Loaded configuration");
                    settings
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to parse config: {e}, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Apply `UNDERCOVER_*` overrides. `lookup` is `std::env::var` in
    /// production; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(n) = get("UNDERCOVER_GUESS_SECONDS").and_then(|v| v.trim().parse().ok()) {
            self.guess_seconds = n;
        }
        if let Some(path) = get("UNDERCOVER_WORD_BANK") {
            self.word_bank_path = Some(PathBuf::from(path));
        }
        if let Some(endpoint) = get("UNDERCOVER_JUDGE_ENDPOINT") {
            self.judge.endpoint = Some(endpoint);
        }
        if let Some(token) = get(JUDGE_TOKEN_ENV) {
            self.judge.token = Some(token);
        }
    }

    /// Check the settings, logging and returning a warning per problem.
    /// Nothing here is fatal; the game still runs.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.guess_seconds == 0 {
            warnings.push("guess_seconds is 0, Mr. White guesses time out immediately".to_string());
        }
        if self.role_config().impostor_count() == 0 {
            warnings.push(
                "default role counts have no impostors, the first vote ends the game".to_string(),
            );
        }
        if let Err(e) = self.role_config().validate(crate::game::MIN_PLAYERS) {
            warnings.push(format!(
                "default role counts do not fit a minimal table ({e}), adjust them at setup"
            ));
        }
        if let Some(endpoint) = &self.judge.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                warnings.push(format!("judge.endpoint {endpoint:?} is not an http(s) URL"));
            }
            if self.judge.timeout_secs == 0 {
                warnings.push("judge.timeout_secs is 0, every remote verdict will fail".to_string());
            }
        }
        if self.judge.token.is_some() && std::env::var(JUDGE_TOKEN_ENV).is_err() {
            warnings.push(format!(
                "judge.token is set in the config file, prefer the {JUDGE_TOKEN_ENV} env var"
            ));
        }

        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        warnings
    }

    pub fn round_settings(&self) -> RoundSettings {
        RoundSettings {
            guess_seconds: self.guess_seconds,
            verdict_display_seconds: self.verdict_display_seconds,
        }
    }

    pub fn role_config(&self) -> RoleConfig {
        RoleConfig {
            mr_white_count: self.default_mr_white,
            undercover_count: self.default_undercover,
        }
    }

    /// The configured catalogue, or the built-in one if none is set or it
    /// cannot be used.
    pub fn word_bank(&self) -> WordBank {
        let Some(path) = &self.word_bank_path else {
            return WordBank::builtin().clone();
        };
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| WordBank::parse(&text).map_err(|e| e.to_string()));
        match loaded {
            Ok(bank) => {
                tracing::info!(path = %path.display(), pairs = bank.len(), "Loaded word catalogue");
                bank
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Cannot use word catalogue: {e}, using built-in");
                WordBank::builtin().clone()
            }
        }
    }

    /// Remote judge with exact-match fallback when an endpoint is set,
    /// otherwise exact match only.
    pub fn build_judge(&self) -> Arc<dyn GuessJudge> {
        let Some(endpoint) = &self.judge.endpoint else {
            return Arc::new(ExactJudge);
        };
        let timeout = Duration::from_secs(self.judge.timeout_secs);
        match RemoteJudge::new(endpoint.clone(), self.judge.token.clone(), timeout) {
            Ok(remote) => {
                tracing::info!(endpoint = %remote.endpoint(), "Using remote guess judge");
                Arc::new(FallbackJudge::new(remote))
            }
            Err(e) => {
                tracing::warn!("Cannot build remote judge: {e}, using exact match");
                Arc::new(ExactJudge)
            }
        }
    }
}
