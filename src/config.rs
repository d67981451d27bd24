use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::solver::retry::RetryBudget;
use crate::solver::SolverSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bot_token: String,
    pub api_key: String,
    pub api_url: String,
    pub telegram_api_url: String,
    pub port: u16,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub rate_limit_seconds: u64,
    pub submission_poll_attempts: u32,
    pub submission_poll_delay_secs: u64,
    pub job_poll_attempts: u32,
    pub job_poll_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_key: String::new(),
            api_url: "http://nova.astrometry.net/api".to_string(),
            telegram_api_url: "https://api.telegram.org".to_string(),
            port: 8080,
            webhook_url: None,
            webhook_secret: None,
            rate_limit_seconds: 60,
            submission_poll_attempts: 12,
            submission_poll_delay_secs: 5,
            job_poll_attempts: 60,
            job_poll_delay_secs: 10,
        }
    }
}

impl Config {
    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            submission: RetryBudget::new(
                self.submission_poll_attempts,
                Duration::from_secs(self.submission_poll_delay_secs),
            ),
            job: RetryBudget::new(
                self.job_poll_attempts,
                Duration::from_secs(self.job_poll_delay_secs),
            ),
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_seconds)
    }

    /// Web front-end of the solver, used for annotated images and status pages.
    pub fn site_url(&self) -> String {
        let trimmed = self.api_url.trim_end_matches('/');
        trimmed
            .strip_suffix("/api")
            .unwrap_or(trimmed)
            .to_string()
    }
}

fn get_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("ASTROMETRY_BOT_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let default_path = dirs::config_dir()?.join("astrometry-bot").join("config.json");
    if default_path.exists() {
        Some(default_path)
    } else {
        None
    }
}

/// Load the configuration file (if any), then apply environment overrides.
pub fn load_config() -> AppResult<Config> {
    let mut config = match get_config_path() {
        Some(config_path) => {
            let config_str = fs::read_to_string(&config_path)?;
            log::info!("Loading configuration from {}", config_path.display());
            serde_json::from_str(&config_str).unwrap_or_else(|e| {
                log::warn!("Failed to parse config file: {}. Using defaults.", e);
                Config::default()
            })
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config)?;

    Ok(config)
}

pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("TELEGRAM_BOT_TOKEN") {
        config.bot_token = value;
    }
    if let Some(value) = lookup("ASTROMETRY_API_KEY") {
        config.api_key = value;
    }
    if let Some(value) = lookup("ASTROMETRY_API_URL") {
        config.api_url = value;
    }
    if let Some(value) = lookup("TELEGRAM_API_URL") {
        config.telegram_api_url = value;
    }
    if let Some(value) = lookup("WEBHOOK_URL") {
        config.webhook_url = Some(value);
    }
    if let Some(value) = lookup("WEBHOOK_SECRET") {
        config.webhook_secret = Some(value);
    }
    if let Some(value) = lookup("PORT") {
        config.port = parse_env("PORT", &value)?;
    }
    if let Some(value) = lookup("RATE_LIMIT_SECONDS") {
        config.rate_limit_seconds = parse_env("RATE_LIMIT_SECONDS", &value)?;
    }
    if let Some(value) = lookup("SUBMISSION_POLL_ATTEMPTS") {
        config.submission_poll_attempts = parse_env("SUBMISSION_POLL_ATTEMPTS", &value)?;
    }
    if let Some(value) = lookup("SUBMISSION_POLL_DELAY_SECS") {
        config.submission_poll_delay_secs = parse_env("SUBMISSION_POLL_DELAY_SECS", &value)?;
    }
    if let Some(value) = lookup("JOB_POLL_ATTEMPTS") {
        config.job_poll_attempts = parse_env("JOB_POLL_ATTEMPTS", &value)?;
    }
    if let Some(value) = lookup("JOB_POLL_DELAY_SECS") {
        config.job_poll_delay_secs = parse_env("JOB_POLL_DELAY_SECS", &value)?;
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, value)))
}

pub fn validate_config(config: &Config) -> AppResult<()> {
    if config.bot_token.trim().is_empty() {
        return Err(AppError::validation("bot_token", "TELEGRAM_BOT_TOKEN must be set"));
    }

    let token_pattern = Regex::new(r"^\d+:[\w-]{20,}$")
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !token_pattern.is_match(config.bot_token.trim()) {
        return Err(AppError::validation("bot_token", "Malformed Telegram bot token"));
    }

    if config.api_key.trim().is_empty() {
        return Err(AppError::validation("api_key", "ASTROMETRY_API_KEY must be set"));
    }

    if !config.api_url.starts_with("http://") && !config.api_url.starts_with("https://") {
        return Err(AppError::validation("api_url", "Must be an http(s) URL"));
    }

    if config.port == 0 {
        return Err(AppError::validation("port", "Must be greater than 0"));
    }

    if config.submission_poll_attempts == 0 {
        return Err(AppError::validation("submission_poll_attempts", "Must be greater than 0"));
    }

    if config.job_poll_attempts == 0 {
        return Err(AppError::validation("job_poll_attempts", "Must be greater than 0"));
    }

    // solving takes minutes, job assignment takes seconds
    if config.job_poll_delay_secs < config.submission_poll_delay_secs {
        return Err(AppError::validation(
            "job_poll_delay_secs",
            "Must not be shorter than submission_poll_delay_secs",
        ));
    }

    Ok(())
}

/// Level for the logger, read before any configuration file is touched.
pub fn log_level_from_env() -> log::LevelFilter {
    parse_log_level(std::env::var("LOG_LEVEL").ok().as_deref())
}

fn parse_log_level(value: Option<&str>) -> log::LevelFilter {
    let valid_log_levels = ["off", "error", "warn", "info", "debug", "trace"];
    match value.map(|v| v.trim().to_lowercase()) {
        Some(level) if valid_log_levels.contains(&level.as_str()) => {
            level.parse().unwrap_or(log::LevelFilter::Info)
        }
        _ => log::LevelFilter::Info,
    }
}
