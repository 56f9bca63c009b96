//! Validation functions for configuration values.

use reqwest::Url;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::safety::Trigger;

/// Validate the backend base URL.
/// Returns an error message if validation fails, None if valid.
pub fn validate_base_url(url: &str) -> Option<String> {
    if url.trim().is_empty() {
        return Some("URL cannot be empty".to_string());
    }

    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
            if parsed.host_str().is_none() {
                Some("URL has no host".to_string())
            } else {
                None
            }
        }
        Ok(parsed) => Some(format!("Unsupported scheme: {}", parsed.scheme())),
        Err(e) => Some(format!("Invalid URL: {}", e)),
    }
}

/// Validate the request timeout.
pub fn validate_timeout(secs: u64) -> Option<String> {
    if secs == 0 {
        Some("Timeout must be at least 1 second".to_string())
    } else {
        None
    }
}

/// Validate a log level / filter directive.
pub fn validate_log_level(level: &str) -> Option<String> {
    match EnvFilter::try_new(level) {
        Ok(_) => None,
        Err(e) => Some(format!("Invalid log level: {}", e)),
    }
}

/// Validate a custom trigger table.
pub fn validate_triggers(triggers: &[Trigger]) -> Option<String> {
    if triggers.is_empty() {
        return Some("Trigger table is empty".to_string());
    }

    if let Some(index) = triggers.iter().position(|t| t.word.trim().is_empty()) {
        return Some(format!("Trigger {} has an empty word", index + 1));
    }

    None
}

/// Check every field, returning `(field, message)` pairs for failures.
pub fn validate_config(config: &Config) -> Vec<(&'static str, String)> {
    let mut problems = Vec::new();

    // Unused outside demo mode, so only checked when it matters
    if !config.demo.enabled
        && let Some(e) = validate_base_url(&config.api.base_url)
    {
        problems.push(("api.base_url", e));
    }
    if let Some(e) = validate_timeout(config.api.timeout_secs) {
        problems.push(("api.timeout_secs", e));
    }
    if let Some(e) = validate_log_level(&config.logging.level) {
        problems.push(("logging.level", e));
    }
    if let Some(triggers) = &config.safety.triggers
        && let Some(e) = validate_triggers(triggers)
    {
        problems.push(("safety.triggers", e));
    }

    problems
}
