use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyMode;
use crate::error::SettingsError;
use crate::scoring::CORRECT_ANSWER_BONUS_DEFAULT;
use crate::session::{DEFAULT_TOPIC, SessionConfig};

pub const SETTINGS_PATH_ENV: &str = "BLOCKQUIZ_SETTINGS_PATH";
pub const QUESTION_ENDPOINT_ENV: &str = "BLOCKQUIZ_QUESTION_ENDPOINT";
pub const QUESTION_REQUEST_TIMEOUT_MS_DEFAULT: u64 = 5_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameSettings {
    pub version: u32,
    pub topic: String,
    pub difficulty_mode: DifficultyMode,
    pub correct_answer_bonus: u32,
    pub seed: u64,
    /// `None` (or 0) disables the answer timer.
    pub answer_timeout_ms: Option<u64>,
    /// 0 waits for the question service indefinitely.
    pub question_request_timeout_ms: u64,
    /// Plain-HTTP question service; the built-in bank is used when unset.
    pub question_endpoint: Option<String>,
    pub question_bank_path: Option<PathBuf>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            topic: DEFAULT_TOPIC.to_string(),
            difficulty_mode: DifficultyMode::Adaptive,
            correct_answer_bonus: CORRECT_ANSWER_BONUS_DEFAULT,
            seed: 1,
            answer_timeout_ms: None,
            question_request_timeout_ms: QUESTION_REQUEST_TIMEOUT_MS_DEFAULT,
            question_endpoint: None,
            question_bank_path: None,
        }
    }
}

impl GameSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        let topic = self.topic.trim();
        self.topic = if topic.is_empty() {
            DEFAULT_TOPIC.to_string()
        } else {
            topic.to_string()
        };
        self.answer_timeout_ms = self.answer_timeout_ms.filter(|ms| *ms > 0);
        self.question_endpoint = self
            .question_endpoint
            .map(|endpoint| endpoint.trim().to_string())
            .filter(|endpoint| !endpoint.is_empty());
        self
    }

    pub fn with_env_overrides<F>(mut self, get_env: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(endpoint) = get_env(QUESTION_ENDPOINT_ENV) {
            self.question_endpoint = Some(endpoint.to_string_lossy().into_owned());
        }
        self.sanitized()
    }

    pub fn answer_timeout(&self) -> Option<Duration> {
        self.answer_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn question_request_timeout(&self) -> Option<Duration> {
        (self.question_request_timeout_ms > 0)
            .then(|| Duration::from_millis(self.question_request_timeout_ms))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            topic: self.topic.clone(),
            difficulty_mode: self.difficulty_mode,
            correct_answer_bonus: self.correct_answer_bonus,
            seed: self.seed,
            answer_timeout: self.answer_timeout(),
        }
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        Self::from_env_with(|name| std::env::var_os(name))
    }

    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(explicit) = get_env(SETTINGS_PATH_ENV) {
            return Self {
                path: PathBuf::from(explicit),
            };
        }

        let base = get_env("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| get_env("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            path: base.join("blockquiz").join("settings.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable settings fall back to defaults.
    pub fn load(&self) -> GameSettings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(SettingsError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                GameSettings::default()
            }
            Err(err) => {
                tracing::warn!(%err, "using default settings");
                GameSettings::default()
            }
        }
    }

    pub fn try_load(&self) -> Result<GameSettings, SettingsError> {
        let bytes = fs::read(&self.path).map_err(|source| SettingsError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_slice::<GameSettings>(&bytes)
            .map(GameSettings::sanitized)
            .map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    pub fn save(&self, settings: &GameSettings) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let text = serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, text).map_err(write_err)
    }
}
