use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::platform::Platform;
use crate::safety::{Trigger, default_triggers};

/// Name of the per-project override file in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".promptlab";

/// Status of config file loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLoadStatus {
    /// Config loaded successfully from existing file
    Loaded,
    /// Created default config file (first run)
    Created,
    /// Error occurred during loading, using defaults.
    Error(String),
}

impl ConfigLoadStatus {
    pub fn label(&self) -> String {
        match self {
            ConfigLoadStatus::Loaded => "loaded".to_string(),
            ConfigLoadStatus::Created => "created".to_string(),
            ConfigLoadStatus::Error(e) => format!("defaults ({})", e),
        }
    }
}

/// Backend connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Sent as `userId` when set.
    pub user_id: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            user_id: None,
            timeout_secs: 30,
        }
    }
}

/// Offline demo mode configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Answer analyze/optimize locally instead of calling the backend.
    pub enabled: bool,
    /// Artificial "thinking" delay applied to every tool in demo mode.
    pub delay_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ms: 1500,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Startup defaults for the workbench
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub platform: Platform,
    /// Request volume used by the cost calculator.
    pub requests_per_day: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Claude,
            requests_per_day: 100,
        }
    }
}

/// Safety checker configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Replaces the built-in trigger table when set.
    pub triggers: Option<Vec<Trigger>>,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

impl Config {
    /// Trigger table in effect: the configured one, or the built-in table.
    pub fn trigger_table(&self) -> Vec<Trigger> {
        self.safety
            .triggers
            .clone()
            .unwrap_or_else(default_triggers)
    }

    /// Artificial delay for local tools; zero outside demo mode.
    pub fn demo_delay(&self) -> Duration {
        if self.demo.enabled {
            Duration::from_millis(self.demo.delay_ms)
        } else {
            Duration::ZERO
        }
    }
}

/// Partial backend configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialApiConfig {
    pub base_url: Option<String>,
    pub user_id: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Partial demo configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialDemoConfig {
    pub enabled: Option<bool>,
    pub delay_ms: Option<u64>,
}

/// Partial logging configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialLoggingConfig {
    pub level: Option<String>,
}

/// Partial defaults configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialDefaultsConfig {
    pub platform: Option<Platform>,
    pub requests_per_day: Option<u32>,
}

/// Project-specific configuration where every field is optional.
/// Parsed from `.promptlab` files. Fields that are `None` inherit from the global config.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialConfig {
    pub api: PartialApiConfig,
    pub demo: PartialDemoConfig,
    pub logging: PartialLoggingConfig,
    pub defaults: PartialDefaultsConfig,
    pub safety: SafetyConfig,
}

/// Merge a global config with a project-level partial config.
/// Project values override global values where present.
pub fn merge_config(global: &Config, project: &PartialConfig) -> Config {
    Config {
        api: ApiConfig {
            base_url: project
                .api
                .base_url
                .clone()
                .unwrap_or_else(|| global.api.base_url.clone()),
            user_id: project
                .api
                .user_id
                .clone()
                .or_else(|| global.api.user_id.clone()),
            timeout_secs: project
                .api
                .timeout_secs
                .unwrap_or(global.api.timeout_secs),
        },
        demo: DemoConfig {
            enabled: project.demo.enabled.unwrap_or(global.demo.enabled),
            delay_ms: project.demo.delay_ms.unwrap_or(global.demo.delay_ms),
        },
        logging: LoggingConfig {
            level: project
                .logging
                .level
                .clone()
                .unwrap_or_else(|| global.logging.level.clone()),
        },
        defaults: DefaultsConfig {
            platform: project
                .defaults
                .platform
                .unwrap_or(global.defaults.platform),
            requests_per_day: project
                .defaults
                .requests_per_day
                .unwrap_or(global.defaults.requests_per_day),
        },
        safety: SafetyConfig {
            triggers: project
                .safety
                .triggers
                .clone()
                .or_else(|| global.safety.triggers.clone()),
        },
    }
}

/// Loaded configuration with metadata
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_path: PathBuf,
    pub project_config_path: Option<PathBuf>,
    pub status: ConfigLoadStatus,
    /// Why the project file was ignored, if it was.
    pub project_error: Option<String>,
}

/// Get the platform-appropriate config directory
fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "promptlab", "promptlab").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the full path to the config file
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.promptlab in current working directory).
pub fn get_project_config_path() -> Option<PathBuf> {
    let path = std::env::current_dir().ok()?.join(PROJECT_CONFIG_FILE);
    if path.exists() { Some(path) } else { None }
}

/// Load a project config (.promptlab) from the given path.
fn load_project_config(path: &Path) -> Result<PartialConfig, String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_read_failed");
        format!("Failed to read {}: {}", PROJECT_CONFIG_FILE, e)
    })?;

    toml::from_str::<PartialConfig>(&contents).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_parse_failed");
        format!("Invalid {}: {}", PROJECT_CONFIG_FILE, e)
    })
}

/// Load configuration from file, environment, and defaults
pub fn load_config() -> LoadedConfig {
    let Some(config_path) = get_config_path() else {
        warn!("Could not determine config directory, using defaults");
        return LoadedConfig {
            config: apply_env_overrides(Config::default()),
            config_path: PathBuf::from("config.toml"),
            project_config_path: None,
            status: ConfigLoadStatus::Error("Could not determine config directory".to_string()),
            project_error: None,
        };
    };

    load_config_from(config_path, get_project_config_path())
}

/// Load the global config at `config_path`, then merge the project file over it.
pub fn load_config_from(config_path: PathBuf, project_config_path: Option<PathBuf>) -> LoadedConfig {
    debug!("Config path: {:?}", config_path);

    let (mut config, status) = load_or_create_config(&config_path);

    let mut project_error = None;
    if let Some(ref project_path) = project_config_path {
        match load_project_config(project_path) {
            Ok(partial) => {
                config = merge_config(&config, &partial);
                info!(path = ?project_path, "project_config_loaded");
            }
            Err(e) => {
                warn!(path = ?project_path, error = %e, "project_config_error");
                project_error = Some(e);
            }
        }
    }

    let config = apply_env_overrides(config);

    LoadedConfig {
        config,
        config_path,
        project_config_path,
        status,
        project_error,
    }
}

/// Reload configuration from the global and optional project config paths.
/// On a global parse/read failure the previous config should be kept by the caller.
pub fn reload_config(config_path: &Path, project_config_path: Option<&Path>) -> Result<Config, String> {
    let contents = fs::read_to_string(config_path).map_err(|e| {
        warn!(path = ?config_path, error = %e, "config_reload_read_failed");
        format!("Failed to read config: {}", e)
    })?;

    let mut config = toml::from_str::<Config>(&contents).map_err(|e| {
        warn!(path = ?config_path, error = %e, "config_reload_parse_failed");
        format!("Invalid config: {}", e)
    })?;

    // A deleted project file just means global-only
    if let Some(project_path) = project_config_path
        && project_path.exists()
    {
        let partial = load_project_config(project_path)?;
        config = merge_config(&config, &partial);
    }

    info!(path = ?config_path, "config_reloaded");
    Ok(apply_env_overrides(config))
}

/// Load config from file, or create default if not exists
fn load_or_create_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    match fs::read_to_string(config_path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                info!("Loaded config from {:?}", config_path);
                (config, ConfigLoadStatus::Loaded)
            }
            Err(e) => {
                warn!(
                    "Config file malformed at {:?}: {}. Using defaults.",
                    config_path, e
                );
                (
                    Config::default(),
                    ConfigLoadStatus::Error(format!("Malformed TOML: {}", e)),
                )
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => create_default_config(config_path),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(
                "Permission denied reading config at {:?}. Using defaults.",
                config_path
            );
            (
                Config::default(),
                ConfigLoadStatus::Error("Permission denied reading config".to_string()),
            )
        }
        Err(e) => {
            warn!(
                "Error reading config at {:?}: {}. Using defaults.",
                config_path, e
            );
            (
                Config::default(),
                ConfigLoadStatus::Error(format!("Read error: {}", e)),
            )
        }
    }
}

/// Create the default config file
fn create_default_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    let config = Config::default();

    if let Some(parent) = config_path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!(
            "Could not create config directory {:?}: {}. Continuing without file.",
            parent, e
        );
        return (
            config,
            ConfigLoadStatus::Error(format!("Could not create config directory: {}", e)),
        );
    }

    let toml_content = match toml::to_string_pretty(&config) {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not serialize default config: {}", e);
            return (
                config,
                ConfigLoadStatus::Error(format!("Serialization error: {}", e)),
            );
        }
    };

    match fs::write(config_path, &toml_content) {
        Ok(()) => {
            info!("Created default config at {:?}", config_path);
            (config, ConfigLoadStatus::Created)
        }
        Err(e) => {
            warn!(
                "Could not write default config to {:?}: {}. Continuing without file.",
                config_path, e
            );
            (
                config,
                ConfigLoadStatus::Error(format!("Write error: {}", e)),
            )
        }
    }
}

/// Apply environment variable overrides to config
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides_from(config, |key| env::var(key).ok())
}

fn apply_overrides_from(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(url) = lookup("PROMPTLAB_API_URL") {
        debug!("Overriding api.base_url from PROMPTLAB_API_URL");
        config.api.base_url = url;
    }

    if let Some(user_id) = lookup("PROMPTLAB_USER_ID") {
        debug!("Overriding api.user_id from PROMPTLAB_USER_ID");
        config.api.user_id = Some(user_id);
    }

    if let Some(platform) = lookup("PROMPTLAB_PLATFORM") {
        match Platform::parse(&platform) {
            Some(p) => {
                debug!("Overriding defaults.platform from PROMPTLAB_PLATFORM");
                config.defaults.platform = p;
            }
            None => warn!(value = %platform, "unknown_platform_override_ignored"),
        }
    }

    if let Some(level) = lookup("PROMPTLAB_LOG") {
        debug!("Overriding logging.level from PROMPTLAB_LOG");
        config.logging.level = level;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::TriggerRisk;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert!(config.api.user_id.is_none());
        assert_eq!(config.api.timeout_secs, 30);
        assert!(!config.demo.enabled);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.platform, Platform::Claude);
        assert!(config.safety.triggers.is_none());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
[api]
base_url = "https://prompts.example.com"
user_id = "user-7"
timeout_secs = 5

[demo]
enabled = true
delay_ms = 250

[logging]
level = "debug"

[defaults]
platform = "gemini"
requests_per_day = 1000
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://prompts.example.com");
        assert_eq!(config.api.user_id.as_deref(), Some("user-7"));
        assert_eq!(config.api.timeout_secs, 5);
        assert!(config.demo.enabled);
        assert_eq!(config.demo.delay_ms, 250);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.defaults.platform, Platform::Gemini);
        assert_eq!(config.defaults.requests_per_day, 1000);
    }

    #[test]
    fn test_config_partial_deserialization() {
        let toml_str = r#"
[api]
base_url = "http://127.0.0.1:9000"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.demo, DemoConfig::default());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let toml_str = r#"
[api]
base_url = "http://x"
unknown_key = "should be ignored"

[unknown_section]
foo = "bar"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "http://x");
    }

    #[test]
    fn test_custom_trigger_table() {
        let toml_str = r#"
[[safety.triggers]]
word = "exploit"
risk = "high"
suggestion = "Try \"use\" instead"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        let table = config.trigger_table();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].word, "exploit");
        assert_eq!(table[0].risk, TriggerRisk::High);
    }

    #[test]
    fn test_trigger_table_defaults() {
        assert_eq!(Config::default().trigger_table(), default_triggers());
    }

    #[test]
    fn test_demo_delay_only_in_demo_mode() {
        let mut config = Config::default();
        assert_eq!(config.demo_delay(), Duration::ZERO);
        config.demo.enabled = true;
        assert_eq!(config.demo_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_empty() {
        let partial: PartialConfig = toml::from_str("").unwrap();
        assert!(partial.api.base_url.is_none());
        assert!(partial.api.user_id.is_none());
        assert!(partial.demo.enabled.is_none());
        assert!(partial.logging.level.is_none());
        assert!(partial.defaults.platform.is_none());
        assert!(partial.safety.triggers.is_none());
    }

    #[test]
    fn test_partial_config_comment_only() {
        let partial: PartialConfig =
            toml::from_str("# Project-specific promptlab settings\n").unwrap();
        assert!(partial.api.base_url.is_none());
    }

    #[test]
    fn test_merge_config_no_overrides() {
        let global = Config::default();
        let merged = merge_config(&global, &PartialConfig::default());
        assert_eq!(merged, global);
    }

    #[test]
    fn test_merge_config_partial_overrides() {
        let global = Config::default();
        let partial: PartialConfig = toml::from_str(
            r#"
[demo]
enabled = true

[defaults]
platform = "gpt"
"#,
        )
        .unwrap();
        let merged = merge_config(&global, &partial);

        assert!(merged.demo.enabled);
        assert_eq!(merged.defaults.platform, Platform::Gpt);

        assert_eq!(merged.demo.delay_ms, global.demo.delay_ms);
        assert_eq!(merged.api, global.api);
        assert_eq!(merged.logging, global.logging);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PROMPTLAB_API_URL", "https://api.test"),
            ("PROMPTLAB_USER_ID", "abc"),
            ("PROMPTLAB_PLATFORM", "gemini"),
            ("PROMPTLAB_LOG", "trace"),
        ]
        .into_iter()
        .collect();

        let config = apply_overrides_from(Config::default(), |k| {
            vars.get(k).map(|v| v.to_string())
        });
        assert_eq!(config.api.base_url, "https://api.test");
        assert_eq!(config.api.user_id.as_deref(), Some("abc"));
        assert_eq!(config.defaults.platform, Platform::Gemini);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_unknown_platform_override_ignored() {
        let config = apply_overrides_from(Config::default(), |k| {
            (k == "PROMPTLAB_PLATFORM").then(|| "llama".to_string())
        });
        assert_eq!(config.defaults.platform, Platform::Claude);
    }

    #[test]
    fn test_load_or_create_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let (config, status) = load_or_create_config(&path);
        assert_eq!(status, ConfigLoadStatus::Created);
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let (_, status) = load_or_create_config(&path);
        assert_eq!(status, ConfigLoadStatus::Loaded);
    }

    #[test]
    fn test_load_or_create_malformed_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api\nbase_url = ").unwrap();

        let (config, status) = load_or_create_config(&path);
        assert_eq!(config, Config::default());
        assert!(matches!(status, ConfigLoadStatus::Error(ref m) if m.starts_with("Malformed TOML")));
    }

    #[test]
    fn test_reload_config_merges_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("config.toml");
        let project = dir.path().join(PROJECT_CONFIG_FILE);
        fs::write(&global, "[api]\ntimeout_secs = 9\n").unwrap();
        fs::write(&project, "[demo]\nenabled = true\n").unwrap();

        let config = reload_config(&global, Some(&project)).unwrap();
        assert_eq!(config.api.timeout_secs, 9);
        assert!(config.demo.enabled);
    }

    #[test]
    fn test_reload_config_missing_project_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("config.toml");
        fs::write(&global, "").unwrap();
        let missing = dir.path().join(PROJECT_CONFIG_FILE);

        assert!(reload_config(&global, Some(&missing)).is_ok());
    }

    #[test]
    fn test_reload_config_invalid_global_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("config.toml");
        fs::write(&global, "not = [valid").unwrap();

        let err = reload_config(&global, None).unwrap_err();
        assert!(err.starts_with("Invalid config"));
    }

    #[test]
    fn test_load_config_from_records_malformed_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("config.toml");
        let project = dir.path().join(PROJECT_CONFIG_FILE);
        fs::write(&project, "[demo\nenabled = true").unwrap();

        let loaded = load_config_from(global, Some(project));
        assert_eq!(loaded.status, ConfigLoadStatus::Created);
        assert!(!loaded.config.demo.enabled);
        let error = loaded.project_error.unwrap();
        assert!(error.starts_with("Invalid .promptlab"), "{error}");
    }

    #[test]
    fn test_load_config_from_merges_valid_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("config.toml");
        let project = dir.path().join(PROJECT_CONFIG_FILE);
        fs::write(&global, "[api]\ntimeout_secs = 9\n").unwrap();
        fs::write(&project, "[demo]\nenabled = true\n").unwrap();

        let loaded = load_config_from(global, Some(project));
        assert_eq!(loaded.status, ConfigLoadStatus::Loaded);
        assert_eq!(loaded.project_error, None);
        assert!(loaded.config.demo.enabled);
        assert_eq!(loaded.config.api.timeout_secs, 9);
    }
}
