use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{error::RequestError, extract::air_quality::DEFAULT_AQI_TIERS, history::params};

/// Where the current-conditions pages live and which AQI tiers the rules accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub air_url: Option<String>,
    pub weather_url: Option<String>,

    /// Example TOML:
    /// aqi_tiers = ["aqi-yellow", "aqi-orange"]
    pub aqi_tiers: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            air_url: None,
            weather_url: None,
            aqi_tiers: owned(DEFAULT_AQI_TIERS),
        }
    }
}

/// Historical archive endpoint, fixed location and column lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub hourly_columns: Vec<String>,
    pub daily_columns: Vec<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            url: params::ARCHIVE_URL.to_string(),
            latitude: params::HANOI.latitude,
            longitude: params::HANOI.longitude,
            timezone: params::HANOI.timezone.to_string(),
            hourly_columns: owned(params::HOURLY_COLUMNS),
            daily_columns: owned(params::DAILY_COLUMNS),
        }
    }
}

impl ArchiveConfig {
    /// The configured timezone. Local midnights in this zone bound each bucket.
    pub fn zone(&self) -> Result<Tz, RequestError> {
        self.timezone
            .parse()
            .map_err(|_| RequestError::UnknownTimezone {
                name: self.timezone.clone(),
            })
    }
}

/// Transport policy: bounded retries with exponential backoff, optional response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub retries: u32,
    pub backoff_base_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub cache: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            retries: 5,
            backoff_base_ms: 200,
            timeout_secs: 30,
            user_agent: concat!("skystats/", env!("CARGO_PKG_VERSION")).to_string(),
            cache: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run range checks on top of format validation.
    pub plausibility: bool,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub archive: ArchiveConfig,
    pub http: HttpConfig,
    pub validation: ValidationConfig,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Both page URLs, resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrls {
    pub air_url: String,
    pub weather_url: String,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        cfg.archive
            .zone()
            .with_context(|| format!("Invalid [archive] section in {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "skystats", "skystats")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding cached archive responses.
    pub fn cache_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.cache_dir().join("http"))
    }

    /// Apply `AIR_URL` / `WEATHER_URL` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("AIR_URL").ok(),
            std::env::var("WEATHER_URL").ok(),
        )
    }

    /// Replace page URLs with the given values where present.
    pub fn with_overrides(mut self, air_url: Option<String>, weather_url: Option<String>) -> Self {
        if let Some(url) = air_url.filter(|u| !u.trim().is_empty()) {
            self.sources.air_url = Some(url);
        }
        if let Some(url) = weather_url.filter(|u| !u.trim().is_empty()) {
            self.sources.weather_url = Some(url);
        }
        self
    }

    /// Both page URLs, or an error naming whichever is missing.
    pub fn source_urls(&self) -> Result<SourceUrls> {
        let missing = |name: &str, env: &str| {
            anyhow!(
                "No {name} URL configured.\n\
                 Hint: run `skystats configure` or set the {env} environment variable."
            )
        };

        let air_url = self
            .sources
            .air_url
            .clone()
            .ok_or_else(|| missing("air-quality", "AIR_URL"))?;
        let weather_url = self
            .sources
            .weather_url
            .clone()
            .ok_or_else(|| missing("weather", "WEATHER_URL"))?;

        Ok(SourceUrls {
            air_url,
            weather_url,
        })
    }
}
