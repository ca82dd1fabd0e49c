use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use marquee_api::TmdbAuth;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::query_cache::RetryPolicy;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

const DEFAULT_LANGUAGE: &str = "en-US";

const TOKEN_ENV: &str = "TMDB_TOKEN";
const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub image_base_url: String,
    pub language: Option<String>,
    pub access_token: Option<String>,
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: marquee_api::tmdb::client::DEFAULT_BASE_URL.into(),
            image_base_url: marquee_api::image::TMDB_IMAGE_BASE_URL.into(),
            language: Some(DEFAULT_LANGUAGE.into()),
            access_token: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub favorites_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load config: the user file if it exists, otherwise the built-in defaults.
    pub fn load() -> Result<Self, CoreError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)
                .map_err(|e| CoreError::Config(e.to_string()))?;
            Self::from_toml(&user_str)
        } else {
            Self::from_toml(DEFAULT_CONFIG)
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), CoreError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Resolve API credentials. Environment variables win over the config file,
    /// and a bearer token wins over an API key.
    pub fn auth(&self) -> Option<TmdbAuth> {
        Self::resolve_auth(
            std::env::var(TOKEN_ENV).ok(),
            std::env::var(API_KEY_ENV).ok(),
            &self.api,
        )
    }

    fn resolve_auth(
        env_token: Option<String>,
        env_key: Option<String>,
        api: &ApiConfig,
    ) -> Option<TmdbAuth> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        non_empty(env_token)
            .or_else(|| non_empty(api.access_token.clone()))
            .map(TmdbAuth::Bearer)
            .or_else(|| {
                non_empty(env_key)
                    .or_else(|| non_empty(api.api_key.clone()))
                    .map(TmdbAuth::ApiKey)
            })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.cache.retries,
            base_delay: Duration::from_millis(self.cache.base_delay_ms),
            max_delay: Duration::from_millis(self.cache.max_delay_ms),
        }
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the favorites file, honouring `storage.favorites_path`.
    pub fn favorites_path(&self) -> PathBuf {
        self.storage.favorites_path.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|d| d.data_dir().join(crate::favorites::FAVORITES_FILE))
                .unwrap_or_else(|| PathBuf::from(crate::favorites::FAVORITES_FILE))
        })
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "marquee")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.api.language.as_deref(), Some("en-US"));
        assert!(config.api.access_token.is_none());
        assert_eq!(config.cache.retries, 3);
        assert!(config.storage.favorites_path.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.cache.max_delay_ms, config.cache.max_delay_ms);
        assert_eq!(deserialized.api.image_base_url, config.api.image_base_url);
    }

    #[test]
    fn test_partial_user_file_fills_sections() {
        let config = AppConfig::from_toml(
            r#"
            [storage]
            favorites_path = "/tmp/favs.json"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.storage.favorites_path,
            Some(PathBuf::from("/tmp/favs.json"))
        );
        assert_eq!(config.cache.retries, 3);
        assert_eq!(config.favorites_path(), PathBuf::from("/tmp/favs.json"));
    }

    #[test]
    fn test_partial_sections_keep_other_keys() {
        let config = AppConfig::from_toml("[api]\naccess_token = \"tok\"\n").unwrap();
        assert_eq!(config.api.access_token.as_deref(), Some("tok"));
        assert_eq!(config.api.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.api.image_base_url, "https://image.tmdb.org/t/p");
        assert_eq!(config.api.language.as_deref(), Some("en-US"));
        assert_eq!(
            AppConfig::resolve_auth(None, None, &config.api),
            Some(TmdbAuth::Bearer("tok".into()))
        );

        let config = AppConfig::from_toml("[cache]\nretries = 5\n").unwrap();
        assert_eq!(config.cache.retries, 5);
        assert_eq!(config.cache.base_delay_ms, 1000);
        assert_eq!(config.cache.max_delay_ms, 30_000);
    }

    #[test]
    fn test_section_defaults_match_builtin_file() {
        let builtin = AppConfig::default();
        let api = ApiConfig::default();
        assert_eq!(api.base_url, builtin.api.base_url);
        assert_eq!(api.image_base_url, builtin.api.image_base_url);
        assert_eq!(api.language, builtin.api.language);
        let cache = CacheConfig::default();
        assert_eq!(cache.retries, builtin.cache.retries);
        assert_eq!(cache.base_delay_ms, builtin.cache.base_delay_ms);
        assert_eq!(cache.max_delay_ms, builtin.cache.max_delay_ms);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::from_toml("[cache]\nretries = \"many\"").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_retry_policy_from_cache_section() {
        let mut config = AppConfig::default();
        config.cache.retries = 1;
        config.cache.base_delay_ms = 250;
        let policy = config.retry_policy();
        assert_eq!(policy.retries, 1);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_auth_precedence() {
        let mut api = ApiConfig::default();
        assert_eq!(AppConfig::resolve_auth(None, None, &api), None);

        api.api_key = Some("file-key".into());
        assert_eq!(
            AppConfig::resolve_auth(None, None, &api),
            Some(TmdbAuth::ApiKey("file-key".into()))
        );

        api.access_token = Some("file-token".into());
        assert_eq!(
            AppConfig::resolve_auth(None, Some("env-key".into()), &api),
            Some(TmdbAuth::Bearer("file-token".into()))
        );

        assert_eq!(
            AppConfig::resolve_auth(Some("env-token".into()), None, &api),
            Some(TmdbAuth::Bearer("env-token".into()))
        );

        api.access_token = Some("  ".into());
        assert_eq!(
            AppConfig::resolve_auth(None, Some("env-key".into()), &api),
            Some(TmdbAuth::ApiKey("env-key".into()))
        );
    }
}
