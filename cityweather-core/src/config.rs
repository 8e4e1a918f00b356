use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Environment variable that takes precedence over the configured key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// base_url = "https://api.openweathermap.org"
/// debounce_ms = 500
/// request_timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Quiet period before typed input is acted on.
    pub debounce_ms: u64,
    /// No timeout when absent.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    pub fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// API key from the environment, falling back to the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        pick_api_key(from_env, self.api_key.as_deref())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key).filter(|k| !k.trim().is_empty());
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn pick_api_key(from_env: Option<String>, from_config: Option<&str>) -> Option<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| from_config.map(str::to_string))
        .filter(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_openweather() {
        let cfg = Config::default();
        assert_eq!(cfg.base_url, "https://api.openweathermap.org");
        assert_eq!(cfg.debounce(), Duration::from_millis(500));
        assert_eq!(cfg.request_timeout(), None);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str("api_key = \"OPEN_KEY\"\n").expect("valid toml");
        assert_eq!(cfg.api_key.as_deref(), Some("OPEN_KEY"));
        assert_eq!(cfg.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn env_key_wins_over_config() {
        assert_eq!(
            pick_api_key(Some("ENV".into()), Some("FILE")).as_deref(),
            Some("ENV")
        );
        assert_eq!(pick_api_key(Some("  ".into()), Some("FILE")).as_deref(), Some("FILE"));
        assert_eq!(pick_api_key(None, Some("")), None);
        assert_eq!(pick_api_key(None, None), None);
    }

    #[test]
    fn set_api_key_ignores_blank() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert!(cfg.api_key.is_none());

        cfg.set_api_key("KEY".into());
        assert_eq!(cfg.api_key.as_deref(), Some("KEY"));
    }

    #[test]
    fn save_and_load_roundtrip_through_file() {
        let path = std::env::temp_dir()
            .join(format!("cityweather-config-{}", std::process::id()))
            .join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.request_timeout_secs = Some(10);
        cfg.save_to(&path).expect("save config");

        let loaded = Config::load_from(&path).expect("load config");
        assert_eq!(loaded.api_key.as_deref(), Some("KEY"));
        assert_eq!(loaded.request_timeout(), Some(Duration::from_secs(10)));

        let _ = fs::remove_dir_all(path.parent().expect("has parent"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("cityweather-does-not-exist/config.toml");
        let cfg = Config::load_from(&path).expect("defaults");
        assert_eq!(cfg.debounce_ms, DEFAULT_DEBOUNCE_MS);
    }
}
