use crate::session::{BreathingSettings, SessionSummary, SettingsError};
use chrono::Utc;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";
const HISTORY_LIMIT: usize = 50;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_USER_ID: &str = "user_breathing_session";
pub const DEFAULT_MOOD_NOTE: &str = "Post-breathing exercise mood";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETURN_DELAY_MS: u64 = 1500;

pub const ENV_CONFIG_PATH: &str = "BREATHE_CONFIG";
pub const ENV_API_URL: &str = "BREATHE_API_URL";
pub const ENV_USER_ID: &str = "BREATHE_USER_ID";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("No config directory available on this platform")]
    NoConfigDir,

    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub user_id: String,
    pub mood_note: String,
    pub request_timeout_secs: u64,
    pub return_delay_ms: u64,
    pub settings: BreathingSettings,
    pub stats: Stats,
    pub history: Vec<HistoryItem>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            mood_note: DEFAULT_MOOD_NOTE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            return_delay_ms: DEFAULT_RETURN_DELAY_MS,
            settings: BreathingSettings::default(),
            stats: Stats::default(),
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Stats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub total_rounds: u64,
    pub total_breathing_secs: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub session_id: String,
    pub timestamp: String,
    pub completed: bool,
    pub rounds_completed: u32,
    pub total_rounds: u32,
    pub breathing_secs: f32,
}

/// `BREATHE_CONFIG` if set, otherwise the platform config directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    let dirs = ProjectDirs::from("app", "breathe", "breathe").ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}

pub fn load_or_create(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let config = AppConfig::default();
        save(path, &config)?;
        return Ok(config);
    }

    let raw = fs::read_to_string(path)?;
    match serde_json::from_str::<AppConfig>(&raw) {
        Ok(mut config) => {
            normalize_config(&mut config);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!("Config at {:?} is unreadable ({}), starting fresh", path, e);
            let backup = path.with_extension("json.bak");
            let _ = fs::copy(path, backup);
            let config = AppConfig::default();
            save(path, &config)?;
            Ok(config)
        }
    }
}

pub fn save(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

/// Applies `BREATHE_API_URL` / `BREATHE_USER_ID` style overrides from `lookup`.
pub fn apply_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(ENV_API_URL) {
        config.api_base_url = normalize_url(&url);
    }

    if let Some(user_id) = lookup(ENV_USER_ID) {
        let trimmed = user_id.trim();
        if !trimmed.is_empty() {
            config.user_id = trimmed.to_string();
        }
    }
}

/// Persists preferred settings. Out-of-set values are rejected, not clamped.
pub fn update_settings(path: &Path, settings: BreathingSettings) -> Result<AppConfig, ConfigError> {
    settings.validate()?;

    let mut config = load_or_create(path)?;
    config.settings = settings;
    save(path, &config)?;
    Ok(config)
}

pub fn record_session(path: &Path, summary: &SessionSummary) -> Result<(), ConfigError> {
    // Sessions closed before a single tick carry nothing worth keeping.
    if summary.breathing_secs <= 0.0 {
        return Ok(());
    }

    let mut config = load_or_create(path)?;
    let item = HistoryItem {
        session_id: summary.session_id.clone(),
        timestamp: Utc::now().to_rfc3339(),
        completed: summary.completed,
        rounds_completed: summary.rounds_completed,
        total_rounds: summary.total_rounds,
        breathing_secs: summary.breathing_secs,
    };

    config.history.insert(0, item);
    if config.history.len() > HISTORY_LIMIT {
        config.history.truncate(HISTORY_LIMIT);
    }

    recompute_stats(&mut config);
    save(path, &config)
}

pub fn clear_history(path: &Path) -> Result<(), ConfigError> {
    let mut config = load_or_create(path)?;
    config.history.clear();
    recompute_stats(&mut config);
    save(path, &config)
}

fn normalize_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

fn normalize_config(config: &mut AppConfig) {
    config.api_base_url = normalize_url(&config.api_base_url);
    if config.user_id.trim().is_empty() {
        config.user_id = DEFAULT_USER_ID.to_string();
    }
    if config.request_timeout_secs == 0 {
        config.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
    }

    let normalized = config.settings.normalized();
    if normalized != config.settings {
        tracing::warn!(
            "Unsupported settings in config {:?}, using {:?}",
            config.settings,
            normalized
        );
        config.settings = normalized;
    }

    recompute_stats(config);
}

fn recompute_stats(config: &mut AppConfig) {
    config.stats = Stats {
        total_sessions: config.history.len() as u64,
        completed_sessions: config.history.iter().filter(|item| item.completed).count() as u64,
        total_rounds: config
            .history
            .iter()
            .map(|item| item.rounds_completed as u64)
            .sum(),
        total_breathing_secs: config.history.iter().map(|item| item.breathing_secs).sum(),
    };
}
