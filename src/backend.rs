//! Source of analyze/optimize results: the remote backend or the offline demo.

use std::time::Duration;

use tracing::info;

use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::models::{AnalysisMetrics, AnalysisResult, Improvements, OptimizationResult};
use crate::platform::Platform;
use crate::quality::{Issue, analyze_prompt};
use crate::tokens::estimate_tokens;

#[derive(Debug, Clone)]
pub enum Backend {
    Remote(ApiClient),
    Demo(DemoBackend),
}

impl Backend {
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        if config.demo.enabled {
            info!(delay_ms = config.demo.delay_ms, "demo_backend_selected");
            Ok(Backend::Demo(DemoBackend::new(Duration::from_millis(
                config.demo.delay_ms,
            ))))
        } else {
            let client = ApiClient::from_config(&config.api)?;
            info!(base_url = client.base_url(), "remote_backend_selected");
            Ok(Backend::Remote(client))
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Backend::Remote(_) => "remote",
            Backend::Demo(_) => "demo",
        }
    }

    pub async fn analyze(&self, prompt: &str, platform: Platform) -> Result<AnalysisResult, ApiError> {
        match self {
            Backend::Remote(client) => client.analyze(prompt, platform).await,
            Backend::Demo(demo) => Ok(demo.analyze(prompt, platform).await),
        }
    }

    pub async fn optimize(
        &self,
        prompt: &str,
        platform: Platform,
    ) -> Result<OptimizationResult, ApiError> {
        match self {
            Backend::Remote(client) => client.optimize(prompt, platform).await,
            Backend::Demo(demo) => Ok(demo.optimize(prompt, platform).await),
        }
    }
}

/// Offline stand-in that derives its answers from the local heuristics
/// after a fixed artificial delay.
#[derive(Debug, Clone)]
pub struct DemoBackend {
    delay: Duration,
}

impl DemoBackend {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    pub async fn analyze(&self, prompt: &str, platform: Platform) -> AnalysisResult {
        self.pause().await;
        demo_analysis(prompt, platform)
    }

    pub async fn optimize(&self, prompt: &str, platform: Platform) -> OptimizationResult {
        self.pause().await;
        demo_optimization(prompt, platform)
    }
}

fn demo_analysis(prompt: &str, platform: Platform) -> AnalysisResult {
    let quality = analyze_prompt(prompt);
    let has = |issue: Issue| quality.issues.contains(&issue);

    AnalysisResult {
        prompt: prompt.to_string(),
        platform: platform.wire_name().to_string(),
        strength_score: quality.score as f64,
        suggestions: quality.suggestions.clone(),
        metrics: AnalysisMetrics {
            clarity: if has(Issue::Vague) { 40.0 } else { 80.0 },
            specificity: quality.score as f64,
            context: if has(Issue::MissingContext) { 30.0 } else { 85.0 },
            actionability: if has(Issue::OnlyNegative) { 35.0 } else { 90.0 },
        },
    }
}

fn framing_line(platform: Platform) -> &'static str {
    match platform {
        Platform::Claude => {
            "Think through the task step by step, then give your final answer in <answer> tags."
        }
        Platform::Gemini => "Answer concisely and use a bulleted list where it helps.",
        Platform::Gpt => "You are an expert assistant. Follow the instructions below exactly.",
    }
}

fn demo_optimization(prompt: &str, platform: Platform) -> OptimizationResult {
    let collapsed = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    let optimized = format!("{}\n\n{}", framing_line(platform), collapsed);

    let before = analyze_prompt(prompt).score;
    let after = analyze_prompt(&optimized).score;

    OptimizationResult {
        original_prompt: prompt.to_string(),
        optimized_prompt: optimized.clone(),
        improvements: Improvements {
            clarity: after as f64 - before as f64,
            tokens_saved: estimate_tokens(prompt) as i64 - estimate_tokens(&optimized) as i64,
            improvement_score: after as f64,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_analysis_uses_quality_score() {
        let demo = DemoBackend::new(Duration::ZERO);
        let result = demo.analyze("Help", Platform::Gemini).await;
        assert_eq!(result.platform, "gemini");
        assert_eq!(result.strength_score, 20.0);
        assert_eq!(result.metrics.clarity, 40.0);
        assert_eq!(result.metrics.context, 30.0);
        assert_eq!(result.suggestions.len(), 3);
    }

    #[tokio::test]
    async fn test_demo_optimization_collapses_whitespace_and_frames() {
        let demo = DemoBackend::new(Duration::ZERO);
        let result = demo.optimize("write   a\n\n poem", Platform::Claude).await;
        assert_eq!(result.original_prompt, "write   a\n\n poem");
        assert!(result.optimized_prompt.ends_with("write a poem"));
        assert!(result.optimized_prompt.starts_with(framing_line(Platform::Claude)));
    }

    #[tokio::test]
    async fn test_demo_delay_is_applied() {
        let demo = DemoBackend::new(Duration::from_millis(50));
        let start = tokio::time::Instant::now();
        demo.analyze("Help", Platform::Claude).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_backend_from_config_selects_demo() {
        let mut config = Config::default();
        config.demo.enabled = true;
        let backend = Backend::from_config(&config).unwrap();
        assert_eq!(backend.label(), "demo");

        config.demo.enabled = false;
        let backend = Backend::from_config(&config).unwrap();
        assert_eq!(backend.label(), "remote");
    }
}
