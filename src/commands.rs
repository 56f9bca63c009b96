//! Non-interactive subcommands. Each prints its result as pretty JSON.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;

use crate::backend::Backend;
use crate::cli::{Command, PromptArgs};
use crate::config::{Config, LoadedConfig};
use crate::platform::Platform;
use crate::quality::analyze_prompt;
use crate::safety::check_prompt;
use crate::templates::{self, PromptTemplate};
use crate::tokens::estimate_cost;
use crate::validators::validate_config;

/// Resolve the prompt text from `--text`, a file, or stdin.
pub fn read_prompt(args: &PromptArgs) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }

    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    Ok(input)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn platform_for(args: &PromptArgs, config: &Config) -> Platform {
    args.platform.unwrap_or(config.defaults.platform)
}

/// Remote tools refuse blank prompts, matching the disabled button in the TUI.
fn require_text(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        bail!("Prompt is empty");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateListing {
    pub platform: Platform,
    pub templates: &'static [PromptTemplate],
}

pub fn template_listings(platform: Option<Platform>) -> Vec<TemplateListing> {
    let platforms: Vec<Platform> = match platform {
        Some(p) => vec![p],
        None => Platform::ALL.to_vec(),
    };
    platforms
        .into_iter()
        .map(|platform| TemplateListing {
            platform,
            templates: templates::for_platform(platform),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ConfigProblem {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigReport<'a> {
    pub config_path: PathBuf,
    pub project_config_path: Option<PathBuf>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_error: Option<String>,
    pub backend: &'static str,
    pub config: &'a Config,
    pub problems: Vec<ConfigProblem>,
}

pub fn config_report(loaded: &LoadedConfig) -> ConfigReport<'_> {
    let config = &loaded.config;
    ConfigReport {
        config_path: loaded.config_path.clone(),
        project_config_path: loaded.project_config_path.clone(),
        status: loaded.status.label(),
        project_error: loaded.project_error.clone(),
        backend: if config.demo.enabled { "demo" } else { "remote" },
        config,
        problems: validate_config(config)
            .into_iter()
            .map(|(field, message)| ConfigProblem { field, message })
            .collect(),
    }
}

/// Run a non-interactive subcommand.
pub async fn run(command: Command, loaded: &LoadedConfig) -> Result<()> {
    let config = &loaded.config;

    match command {
        Command::Tui => bail!("The workbench needs an interactive terminal"),
        Command::Check(args) => {
            let prompt = read_prompt(&args)?;
            print_json(&check_prompt(&prompt, &config.trigger_table()))
        }
        Command::Score(args) => {
            let prompt = read_prompt(&args)?;
            print_json(&analyze_prompt(&prompt))
        }
        Command::Tokens {
            prompt: args,
            requests_per_day,
        } => {
            let prompt = read_prompt(&args)?;
            let rate = requests_per_day.unwrap_or(config.defaults.requests_per_day);
            print_json(&estimate_cost(&prompt, platform_for(&args, config), rate))
        }
        Command::Analyze(args) => {
            let prompt = read_prompt(&args)?;
            require_text(&prompt)?;
            let platform = platform_for(&args, config);
            let backend = Backend::from_config(config)?;
            info!(backend = backend.label(), platform = %platform, "cli_analyze");
            let result = backend.analyze(&prompt, platform).await?;
            print_json(&result)
        }
        Command::Optimize(args) => {
            let prompt = read_prompt(&args)?;
            require_text(&prompt)?;
            let platform = platform_for(&args, config);
            let backend = Backend::from_config(config)?;
            info!(backend = backend.label(), platform = %platform, "cli_optimize");
            let result = backend.optimize(&prompt, platform).await?;
            print_json(&result)
        }
        Command::Templates { platform } => print_json(&template_listings(platform)),
        Command::Config => print_json(&config_report(loaded)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoadStatus;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args(text: Option<&str>, file: Option<PathBuf>) -> PromptArgs {
        PromptArgs {
            file,
            text: text.map(String::from),
            platform: None,
        }
    }

    fn loaded(config: Config) -> LoadedConfig {
        LoadedConfig {
            config,
            config_path: PathBuf::from("/tmp/promptlab/config.toml"),
            project_config_path: None,
            status: ConfigLoadStatus::Loaded,
            project_error: None,
        }
    }

    #[test]
    fn test_read_prompt_prefers_text() {
        assert_eq!(read_prompt(&args(Some("hello"), None)).unwrap(), "hello");
    }

    #[test]
    fn test_read_prompt_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Write a haiku").unwrap();
        let prompt = read_prompt(&args(None, Some(file.path().to_path_buf()))).unwrap();
        assert_eq!(prompt, "Write a haiku");
    }

    #[test]
    fn test_read_prompt_missing_file_names_path() {
        let err = read_prompt(&args(None, Some(PathBuf::from("/nonexistent/prompt.txt"))))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/prompt.txt"));
    }

    #[test]
    fn test_platform_falls_back_to_config() {
        let mut config = Config::default();
        config.defaults.platform = Platform::Gemini;
        assert_eq!(platform_for(&args(Some("x"), None), &config), Platform::Gemini);

        let mut explicit = args(Some("x"), None);
        explicit.platform = Some(Platform::Gpt);
        assert_eq!(platform_for(&explicit, &config), Platform::Gpt);
    }

    #[test]
    fn test_template_listings() {
        assert_eq!(template_listings(None).len(), 3);
        let only = template_listings(Some(Platform::Gpt));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].platform, Platform::Gpt);
    }

    #[test]
    fn test_config_report_lists_problems() {
        let mut config = Config::default();
        config.api.timeout_secs = 0;
        let loaded = loaded(config);
        let report = config_report(&loaded);
        assert_eq!(report.backend, "remote");
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].field, "api.timeout_secs");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["configPath"], "/tmp/promptlab/config.toml");
        assert!(json["projectConfigPath"].is_null());
        assert!(json.get("projectError").is_none());
    }

    #[test]
    fn test_config_report_shows_malformed_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join(".promptlab");
        std::fs::write(&project_path, "[demo\nenabled = true").unwrap();

        let loaded = crate::config::load_config_from(
            dir.path().join("config.toml"),
            Some(project_path),
        );
        let json = serde_json::to_value(config_report(&loaded)).unwrap();
        assert_eq!(json["backend"], "remote");
        assert!(
            json["projectError"]
                .as_str()
                .unwrap()
                .starts_with("Invalid .promptlab")
        );
    }

    #[tokio::test]
    async fn test_remote_commands_reject_blank_prompt() {
        let loaded = loaded(Config::default());
        let err = run(Command::Optimize(args(Some("  \n"), None)), &loaded)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Prompt is empty");
    }

    #[tokio::test]
    async fn test_analyze_in_demo_mode_succeeds() {
        let mut config = Config::default();
        config.demo.enabled = true;
        config.demo.delay_ms = 0;
        let loaded = loaded(config);
        run(Command::Analyze(args(Some("Write a poem"), None)), &loaded)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_propagates() {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:1".to_string();
        config.api.timeout_secs = 2;
        let loaded = loaded(config);
        let result = run(Command::Analyze(args(Some("Write a poem"), None)), &loaded).await;
        assert!(result.is_err());
    }
}
