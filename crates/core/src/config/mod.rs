//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (EXAMDL_*)
//! 2. Explicit TOML file (`--config` or EXAMDL_CONFIG_FILE)
//! 3. Project file `./examdl.toml` (if present)
//! 4. Built-in defaults
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::model::FileFormat;

mod validation;

pub use validation::ConfigError;

/// Name of the optional project-level config file.
pub const PROJECT_CONFIG_FILE: &str = "examdl.toml";

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the certification catalog CSV.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Provider name, e.g. `microsoft` or `amazon`.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Directory for rendered question files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for per-certification link lists.
    #[serde(default = "default_links_dir")]
    pub links_dir: PathBuf,

    /// Include community discussion in rendered output.
    #[serde(default)]
    pub include_discussion: bool,

    /// Rendered output format.
    #[serde(default)]
    pub file_format: FileFormat,

    /// Whether to look up the remote cache before crawling.
    ///
    /// Set via EXAMDL_CACHE_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Base URL of the remote cache. Entries live at `{cache_url}/{provider}/{slug}.json`.
    #[serde(default)]
    pub cache_url: Option<String>,

    /// Bearer token for the cache service. Raises its rate-limit ceiling.
    ///
    /// Set via EXAMDL_ACCESS_TOKEN environment variable.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Delay between certifications that hit the provider, in seconds.
    #[serde(default = "default_sleep_secs")]
    pub sleep_secs: u64,

    /// Base URL of the question-bank provider.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries for transient provider failures (429, 5xx, timeouts).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds, doubled per attempt.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Upper bound on crawled listing pages; 0 means unbounded.
    #[serde(default)]
    pub max_pages: u32,

    /// Export each live crawl as a cache-format snapshot under `output_dir/snapshots`.
    #[serde(default)]
    pub save_snapshots: bool,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("catalog.csv")
}

fn default_provider() -> String {
    "microsoft".into()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results/raw")
}

fn default_links_dir() -> PathBuf {
    PathBuf::from("results/saved-links")
}

fn default_true() -> bool {
    true
}

fn default_sleep_secs() -> u64 {
    3
}

fn default_provider_url() -> String {
    "https://www.examtopics.com".into()
}

fn default_user_agent() -> String {
    concat!("examdl/", env!("CARGO_PKG_VERSION")).into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_backoff_ms() -> u64 {
    1_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            provider: default_provider(),
            output_dir: default_output_dir(),
            links_dir: default_links_dir(),
            include_discussion: false,
            file_format: FileFormat::default(),
            cache_enabled: true,
            cache_url: None,
            access_token: None,
            sleep_secs: default_sleep_secs(),
            provider_url: default_provider_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_pages: 0,
            save_snapshots: false,
        }
    }
}

/// The immutable slice of configuration the retrieval pipeline runs on.
///
/// Built once per run and threaded through the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalConfig {
    pub provider: String,
    pub cache_enabled: bool,
    pub access_token: Option<String>,
    pub delay: Duration,
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        AppConfig::default().retrieval()
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Initial retry backoff as Duration.
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    /// Access token, with blank values treated as absent.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Project the settings the orchestrator consumes.
    ///
    /// The cache is only enabled when a cache URL is configured.
    pub fn retrieval(&self) -> RetrievalConfig {
        RetrievalConfig {
            provider: self.provider.trim().to_lowercase(),
            cache_enabled: self.cache_enabled && self.cache_url.is_some(),
            access_token: self.token().map(str::to_string),
            delay: Duration::from_secs(self.sleep_secs),
            snapshot_dir: self.save_snapshots.then(|| self.output_dir.join("snapshots")),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. `overrides`, typically command-line flags
    /// 2. Environment variables prefixed with `EXAMDL_`
    /// 3. `explicit` TOML file, else the file named by `EXAMDL_CONFIG_FILE`
    /// 4. `./examdl.toml` when it exists
    /// 5. Built-in defaults via `Default::default()`
    ///
    /// Validation runs once, after `overrides` is applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - An explicit configuration file does not exist or cannot be parsed
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load(explicit: Option<&Path>, overrides: impl FnOnce(&mut Self)) -> Result<Self, ConfigError> {
        let mut config: Self = Self::figment(explicit)?
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Build the layered figment without extracting it.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let project = Path::new(PROJECT_CONFIG_FILE);
        if project.exists() {
            figment = figment.merge(Toml::file(project));
        }

        let file = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("EXAMDL_CONFIG_FILE").map(PathBuf::from));
        if let Some(path) = file {
            if !path.exists() {
                return Err(ConfigError::LoadFailed(format!("config file not found: {}", path.display())));
            }
            figment = figment.merge(Toml::file(&path));
        }

        Ok(figment.merge(Env::prefixed("EXAMDL_").ignore(&["config_file"])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.catalog_path, PathBuf::from("catalog.csv"));
        assert_eq!(config.provider, "microsoft");
        assert_eq!(config.output_dir, PathBuf::from("results/raw"));
        assert_eq!(config.links_dir, PathBuf::from("results/saved-links"));
        assert_eq!(config.file_format, FileFormat::Md);
        assert_eq!(config.sleep_secs, 3);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_retries, 2);
        assert!(config.cache_enabled);
        assert!(config.cache_url.is_none());
        assert!(!config.include_discussion);
        assert!(!config.save_snapshots);
    }

    #[test]
    fn test_retrieval_requires_cache_url() {
        let config = AppConfig::default();
        assert!(!config.retrieval().cache_enabled);

        let config = AppConfig { cache_url: Some("https://cache.example.com".into()), ..Default::default() };
        assert!(config.retrieval().cache_enabled);

        let config = AppConfig {
            cache_url: Some("https://cache.example.com".into()),
            cache_enabled: false,
            ..Default::default()
        };
        assert!(!config.retrieval().cache_enabled);
    }

    #[test]
    fn test_retrieval_blank_token_is_absent() {
        let config = AppConfig { access_token: Some("   ".into()), ..Default::default() };
        assert_eq!(config.retrieval().access_token, None);

        let config = AppConfig { access_token: Some(" ghp_abc ".into()), ..Default::default() };
        assert_eq!(config.retrieval().access_token.as_deref(), Some("ghp_abc"));
    }

    #[test]
    fn test_retrieval_delay_and_snapshot_dir() {
        let config = AppConfig { sleep_secs: 5, save_snapshots: true, ..Default::default() };
        let retrieval = config.retrieval();
        assert_eq!(retrieval.delay, Duration::from_secs(5));
        assert_eq!(retrieval.snapshot_dir, Some(PathBuf::from("results/raw/snapshots")));
    }

    #[test]
    fn test_load_layers_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                provider = "amazon"
                sleep_secs = 10
                file_format = "json"
                "#,
            )?;
            jail.set_env("EXAMDL_SLEEP_SECS", "1");
            jail.set_env("EXAMDL_CACHE_ENABLED", "false");

            let config = AppConfig::load(Some(Path::new("custom.toml")), |_| {}).expect("config should load");
            assert_eq!(config.provider, "amazon");
            assert_eq!(config.file_format, FileFormat::Json);
            assert_eq!(config.sleep_secs, 1);
            assert!(!config.cache_enabled);
            Ok(())
        });
    }

    #[test]
    fn test_load_project_file() {
        Jail::expect_with(|jail| {
            jail.create_file(PROJECT_CONFIG_FILE, r#"include_discussion = true"#)?;
            let config = AppConfig::load(None, |_| {}).expect("config should load");
            assert!(config.include_discussion);
            Ok(())
        });
    }

    #[test]
    fn test_load_missing_explicit_file() {
        Jail::expect_with(|_jail| {
            let result = AppConfig::load(Some(Path::new("nope.toml")), |_| {});
            assert!(matches!(result, Err(ConfigError::LoadFailed(msg)) if msg.contains("nope.toml")));
            Ok(())
        });
    }

    #[test]
    fn test_load_validates_after_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(PROJECT_CONFIG_FILE, "timeout_ms = 50")?;

            let result = AppConfig::load(None, |_| {});
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

            let config = AppConfig::load(None, |config| config.timeout_ms = 2_000).expect("override should fix timeout");
            assert_eq!(config.timeout_ms, 2_000);

            let result = AppConfig::load(None, |config| {
                config.timeout_ms = 2_000;
                config.provider = String::new();
            });
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "provider"));
            Ok(())
        });
    }
}
