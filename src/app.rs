//! Application state and core logic.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use anyhow::Result;
use ratatui::style::Color;
use ratatui::widgets::BorderType;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::clipboard;
use crate::config::{Config, ConfigLoadStatus, LoadedConfig, reload_config};
use crate::logging::{self, ReloadHandle};
use crate::models::{AnalysisResult, OptimizationResult};
use crate::modals::TemplatePickerState;
use crate::platform::Platform;
use crate::quality::{PromptQuality, analyze_prompt};
use crate::safety::{SafetyCheckResult, check_prompt};
use crate::templates::PromptTemplate;
use crate::tokens::{CostEstimate, estimate_cost};
use crate::widget::{RequestId, Widget};

/// How long the "Copied" / "Reloaded" notices stay visible.
pub const NOTICE_DURATION: Duration = Duration::from_secs(2);

/// Get a file's modification time, if it exists.
pub fn get_file_mtime(path: &std::path::Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok()?.modified().ok()
}

/// The tools hosted by the workbench, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Safety,
    Quality,
    Tokens,
    Analyze,
    Optimize,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Safety,
        Tool::Quality,
        Tool::Tokens,
        Tool::Analyze,
        Tool::Optimize,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Safety => "Safety",
            Tool::Quality => "Quality",
            Tool::Tokens => "Tokens",
            Tool::Analyze => "Analyze",
            Tool::Optimize => "Optimize",
        }
    }

    /// Verb shown while the tool is loading.
    pub fn progress_label(&self) -> &'static str {
        match self {
            Tool::Safety => "Checking",
            Tool::Quality => "Scoring",
            Tool::Tokens => "Counting",
            Tool::Analyze => "Analyzing",
            Tool::Optimize => "Optimizing",
        }
    }

    /// Whether results come from the backend rather than local heuristics.
    pub fn is_remote(&self) -> bool {
        matches!(self, Tool::Analyze | Tool::Optimize)
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Coarse status of the active tool, for the command panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

impl ToolStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ToolStatus::Idle => "IDLE",
            ToolStatus::Loading => "LOADING",
            ToolStatus::Ready => "READY",
            ToolStatus::Error => "ERROR",
        }
    }

    pub fn border_type(&self) -> BorderType {
        match self {
            ToolStatus::Idle | ToolStatus::Ready => BorderType::Rounded,
            ToolStatus::Loading | ToolStatus::Error => BorderType::Double,
        }
    }

    /// Returns the color for this status, with pulsing effect for Error state.
    /// The pulse alternates between red and dark red every 15 frames.
    pub fn pulsing_color(&self, frame_count: u64) -> Color {
        match self {
            ToolStatus::Idle => Color::Cyan,
            ToolStatus::Loading => Color::Yellow,
            ToolStatus::Ready => Color::Green,
            ToolStatus::Error => {
                if (frame_count / 15).is_multiple_of(2) {
                    Color::Red
                } else {
                    Color::Rgb(128, 0, 0)
                }
            }
        }
    }
}

/// Result delivered from a background task.
#[derive(Debug)]
pub enum Completion {
    Safety(RequestId, SafetyCheckResult),
    Quality(RequestId, PromptQuality),
    Tokens(RequestId, CostEstimate),
    Analysis(RequestId, Result<AnalysisResult, String>),
    Optimization(RequestId, Result<OptimizationResult, String>),
}

/// Main application state.
pub struct App {
    /// Prompt being edited.
    pub input: String,
    /// Cursor position in `input`, in chars.
    pub cursor: usize,
    pub tool: Tool,
    pub platform: Platform,
    pub safety: Widget<SafetyCheckResult>,
    pub quality: Widget<PromptQuality>,
    pub tokens: Widget<CostEstimate>,
    pub analysis: Widget<AnalysisResult>,
    pub optimization: Widget<OptimizationResult>,
    pub backend: Backend,
    runtime: Handle,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    /// Session ID for this invocation (always populated).
    pub session_id: String,
    /// Directory where logs are written.
    pub log_directory: Option<PathBuf>,
    pub config: Config,
    pub config_path: PathBuf,
    pub project_config_path: Option<PathBuf>,
    pub config_status: ConfigLoadStatus,
    /// Why `.promptlab` was ignored at startup, if it was.
    pub project_config_error: Option<String>,
    /// Last known mtime of the config file for change detection.
    pub config_mtime: Option<SystemTime>,
    pub project_config_mtime: Option<SystemTime>,
    pub last_config_poll: Instant,
    pub config_reloaded_at: Option<Instant>,
    /// Error message if config reload failed (invalid TOML, etc.).
    pub config_reload_error: Option<String>,
    pub log_level_handle: Option<Arc<Mutex<ReloadHandle>>>,
    pub current_log_level: String,
    /// Transient message and when it was shown.
    pub notice: Option<(String, Instant)>,
    pub results_scroll: u16,
    pub results_pane_height: u16,
    pub results_pane_width: u16,
    /// Visual line count of the results pane at last draw.
    pub results_line_count: u16,
    pub show_help: bool,
    pub template_picker: Option<TemplatePickerState>,
    /// Frame counter for animations (incremented each render cycle).
    pub frame_count: u64,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        loaded_config: LoadedConfig,
        runtime: Handle,
        session_id: String,
        log_directory: Option<PathBuf>,
        log_level_handle: Option<Arc<Mutex<ReloadHandle>>>,
    ) -> Result<Self> {
        let config = loaded_config.config;
        let backend = Backend::from_config(&config)?;
        let (completion_tx, completion_rx) = mpsc::channel();

        Ok(Self {
            input: String::new(),
            cursor: 0,
            tool: Tool::default(),
            platform: config.defaults.platform,
            safety: Widget::new(),
            quality: Widget::new(),
            tokens: Widget::new(),
            analysis: Widget::new(),
            optimization: Widget::new(),
            backend,
            runtime,
            completion_tx,
            completion_rx,
            session_id,
            log_directory,
            current_log_level: config.logging.level.clone(),
            config_mtime: get_file_mtime(&loaded_config.config_path),
            project_config_mtime: loaded_config
                .project_config_path
                .as_deref()
                .and_then(get_file_mtime),
            project_config_error: loaded_config.project_error,
            config_path: loaded_config.config_path,
            project_config_path: loaded_config.project_config_path,
            config_status: loaded_config.status,
            config,
            // Initialize to "long ago" so we poll immediately on start
            last_config_poll: Instant::now() - Duration::from_secs(10),
            config_reloaded_at: None,
            config_reload_error: None,
            log_level_handle,
            notice: None,
            results_scroll: 0,
            results_pane_height: 0,
            results_pane_width: 0,
            results_line_count: 0,
            show_help: false,
            template_picker: None,
            frame_count: 0,
            should_quit: false,
        })
    }

    // ----- editor -----

    fn byte_index(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn char_len(&self) -> usize {
        self.input.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.input.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_index(self.cursor - 1);
        self.input.remove(at);
        self.cursor -= 1;
    }

    /// Delete the character at the cursor position (delete key).
    pub fn delete_char_at(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    /// Move to the start of the current line.
    pub fn cursor_home(&mut self) {
        let (line, _) = self.cursor_line_col();
        self.cursor = self
            .input
            .split('\n')
            .take(line)
            .map(|l| l.chars().count() + 1)
            .sum();
    }

    /// Move to the end of the current line.
    pub fn cursor_end(&mut self) {
        let (line, col) = self.cursor_line_col();
        let line_len = self
            .input
            .split('\n')
            .nth(line)
            .map(|l| l.chars().count())
            .unwrap_or(0);
        self.cursor += line_len - col;
    }

    /// Zero-based (line, column) of the cursor, in chars.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for c in self.input.chars().take(self.cursor) {
            if c == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    pub fn load_template(&mut self, template: &PromptTemplate) {
        info!(title = template.title, platform = %self.platform, "template_loaded");
        self.input = template.body.to_string();
        self.cursor = self.char_len();
    }

    // ----- tools -----

    pub fn next_tool(&mut self) {
        self.tool = self.tool.next();
        self.results_scroll = 0;
    }

    pub fn prev_tool(&mut self) {
        self.tool = self.tool.prev();
        self.results_scroll = 0;
    }

    pub fn cycle_platform(&mut self) {
        self.platform = self.platform.next();
        debug!(platform = %self.platform, "platform_changed");
    }

    fn is_tool_loading(&self, tool: Tool) -> bool {
        match tool {
            Tool::Safety => self.safety.is_loading(),
            Tool::Quality => self.quality.is_loading(),
            Tool::Tokens => self.tokens.is_loading(),
            Tool::Analyze => self.analysis.is_loading(),
            Tool::Optimize => self.optimization.is_loading(),
        }
    }

    /// Whether the active tool's run action is enabled.
    pub fn can_submit(&self) -> bool {
        match self.tool {
            Tool::Safety => self.safety.can_submit(&self.input),
            Tool::Quality => self.quality.can_submit(&self.input),
            Tool::Tokens => self.tokens.can_submit(&self.input),
            Tool::Analyze => self.analysis.can_submit(&self.input),
            Tool::Optimize => self.optimization.can_submit(&self.input),
        }
    }

    pub fn tool_status(&self, tool: Tool) -> ToolStatus {
        fn status_of<T>(widget: &Widget<T>) -> ToolStatus {
            if widget.is_loading() {
                ToolStatus::Loading
            } else if widget.error().is_some() {
                ToolStatus::Error
            } else if widget.result().is_some() {
                ToolStatus::Ready
            } else {
                ToolStatus::Idle
            }
        }

        match tool {
            Tool::Safety => status_of(&self.safety),
            Tool::Quality => status_of(&self.quality),
            Tool::Tokens => status_of(&self.tokens),
            Tool::Analyze => status_of(&self.analysis),
            Tool::Optimize => status_of(&self.optimization),
        }
    }

    /// Elapsed loading time of the active tool.
    pub fn loading_elapsed(&self) -> Option<Duration> {
        match self.tool {
            Tool::Safety => self.safety.loading_elapsed(),
            Tool::Quality => self.quality.loading_elapsed(),
            Tool::Tokens => self.tokens.loading_elapsed(),
            Tool::Analyze => self.analysis.loading_elapsed(),
            Tool::Optimize => self.optimization.loading_elapsed(),
        }
    }

    /// Run the active tool on the current prompt.
    pub fn submit(&mut self) {
        if !self.can_submit() {
            debug!(tool = self.tool.label(), loading = self.is_tool_loading(self.tool), "submit_ignored");
            return;
        }

        self.results_scroll = 0;
        let prompt = self.input.clone();
        let platform = self.platform;
        let delay = self.config.demo_delay();
        info!(tool = self.tool.label(), platform = %platform, chars = prompt.len(), "tool_submitted");

        match self.tool {
            Tool::Safety => {
                let result = check_prompt(&prompt, &self.config.trigger_table());
                if delay.is_zero() {
                    self.safety.complete_now(result);
                } else {
                    let id = self.safety.begin();
                    self.deliver_after(delay, Completion::Safety(id, result));
                }
            }
            Tool::Quality => {
                let result = analyze_prompt(&prompt);
                if delay.is_zero() {
                    self.quality.complete_now(result);
                } else {
                    let id = self.quality.begin();
                    self.deliver_after(delay, Completion::Quality(id, result));
                }
            }
            Tool::Tokens => {
                let result = estimate_cost(&prompt, platform, self.config.defaults.requests_per_day);
                if delay.is_zero() {
                    self.tokens.complete_now(result);
                } else {
                    let id = self.tokens.begin();
                    self.deliver_after(delay, Completion::Tokens(id, result));
                }
            }
            Tool::Analyze => {
                let id = self.analysis.begin();
                let backend = self.backend.clone();
                let tx = self.completion_tx.clone();
                self.runtime.spawn(async move {
                    let outcome = backend
                        .analyze(&prompt, platform)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(Completion::Analysis(id, outcome));
                });
            }
            Tool::Optimize => {
                let id = self.optimization.begin();
                let backend = self.backend.clone();
                let tx = self.completion_tx.clone();
                self.runtime.spawn(async move {
                    let outcome = backend
                        .optimize(&prompt, platform)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(Completion::Optimization(id, outcome));
                });
            }
        }
    }

    /// Return the active tool to idle. A request still in flight is
    /// orphaned and its completion dropped.
    pub fn clear_result(&mut self) {
        match self.tool {
            Tool::Safety => self.safety.reset(),
            Tool::Quality => self.quality.reset(),
            Tool::Tokens => self.tokens.reset(),
            Tool::Analyze => self.analysis.reset(),
            Tool::Optimize => self.optimization.reset(),
        }
        self.results_scroll = 0;
    }

    /// Deliver an already-computed local result after the demo delay.
    fn deliver_after(&self, delay: Duration, completion: Completion) {
        let tx = self.completion_tx.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(completion);
        });
    }

    /// Drain finished background work into the widgets.
    pub fn poll_completions(&mut self) {
        loop {
            match self.completion_rx.try_recv() {
                Ok(completion) => self.apply_completion(completion),
                Err(TryRecvError::Empty) => break,
                // We hold a sender ourselves, so this cannot happen while the app lives
                Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn apply_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Safety(id, result) => {
                self.safety.finish(id, Ok(result));
            }
            Completion::Quality(id, result) => {
                self.quality.finish(id, Ok(result));
            }
            Completion::Tokens(id, result) => {
                self.tokens.finish(id, Ok(result));
            }
            Completion::Analysis(id, outcome) => {
                if let Err(e) = &outcome {
                    warn!(error = %e, "analyze_failed");
                } else {
                    info!("analyze_completed");
                }
                self.analysis.finish(id, outcome);
            }
            Completion::Optimization(id, outcome) => {
                if let Err(e) = &outcome {
                    warn!(error = %e, "optimize_failed");
                } else {
                    info!("optimize_completed");
                }
                self.optimization.finish(id, outcome);
            }
        }
    }

    // ----- clipboard -----

    /// Text the copy action puts on the clipboard for the active tool.
    /// Falls back to the prompt itself when the tool has no result.
    pub fn copy_text(&self) -> Option<String> {
        let from_result = match self.tool {
            Tool::Optimize => self
                .optimization
                .result()
                .map(|r| r.optimized_prompt.clone()),
            Tool::Analyze => self
                .analysis
                .result()
                .filter(|r| !r.suggestions.is_empty())
                .map(|r| r.suggestions.join("\n")),
            Tool::Quality => self
                .quality
                .result()
                .filter(|r| !r.suggestions.is_empty())
                .map(|r| r.suggestions.join("\n")),
            Tool::Safety => self.safety.result().map(|r| {
                format!(
                    "Risk: {} | Score: {}/100 | Triggers: {}",
                    r.risk_level.label(),
                    r.score,
                    r.triggers
                        .iter()
                        .map(|t| t.word.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }),
            Tool::Tokens => self.tokens.result().map(|r| {
                format!(
                    "~{} tokens on {} | {} requests/day",
                    r.tokens, r.platform, r.requests_per_day
                )
            }),
        };

        from_result.or_else(|| {
            if self.input.trim().is_empty() {
                None
            } else {
                Some(self.input.clone())
            }
        })
    }

    pub fn copy_to_clipboard(&mut self) {
        let Some(text) = self.copy_text() else {
            return;
        };
        if clipboard::copy(&text) {
            self.show_notice("Copied to clipboard");
        }
    }

    pub fn show_notice(&mut self, message: &str) {
        self.notice = Some((message.to_string(), Instant::now()));
    }

    /// Current notice, if it hasn't expired yet.
    pub fn active_notice(&self) -> Option<&str> {
        match &self.notice {
            Some((message, shown)) if shown.elapsed() < NOTICE_DURATION => Some(message),
            _ => None,
        }
    }

    // ----- scrolling -----

    pub fn max_results_scroll(&self) -> u16 {
        self.results_line_count
            .saturating_sub(self.results_pane_height)
    }

    pub fn scroll_results_up(&mut self, amount: u16) {
        self.results_scroll = self.results_scroll.saturating_sub(amount);
    }

    pub fn scroll_results_down(&mut self, amount: u16) {
        self.results_scroll = self
            .results_scroll
            .saturating_add(amount)
            .min(self.max_results_scroll());
    }

    // ----- modals -----

    pub fn open_template_picker(&mut self) {
        self.template_picker = Some(TemplatePickerState::new(self.platform));
    }

    pub fn close_template_picker(&mut self) {
        self.template_picker = None;
    }

    // ----- config -----

    pub fn poll_config(&mut self) {
        // Throttle: poll every 2 seconds
        if self.last_config_poll.elapsed() < Duration::from_secs(2) {
            return;
        }
        self.last_config_poll = Instant::now();

        let current_mtime = match get_file_mtime(&self.config_path) {
            Some(mtime) => mtime,
            None => {
                debug!(path = ?self.config_path, "config_mtime_check_failed");
                return;
            }
        };
        // A deleted .promptlab counts as a change too
        let project_mtime = self
            .project_config_path
            .as_deref()
            .and_then(get_file_mtime);

        if self.config_mtime == Some(current_mtime) && self.project_config_mtime == project_mtime {
            return;
        }
        self.config_mtime = Some(current_mtime);
        self.project_config_mtime = project_mtime;

        match reload_config(&self.config_path, self.project_config_path.as_deref()) {
            Ok(new_config) => self.apply_config(new_config),
            Err(error) => {
                // Keep previous config, show error
                self.config_reload_error = Some(error);
            }
        }
    }

    /// Swap in a freshly loaded config.
    pub fn apply_config(&mut self, new_config: Config) {
        let new_log_level = &new_config.logging.level;
        if new_log_level != &self.current_log_level
            && let Some(ref handle) = self.log_level_handle
        {
            match logging::update_log_level(handle, new_log_level) {
                Ok(()) => {
                    debug!(
                        old_level = %self.current_log_level,
                        new_level = %new_log_level,
                        "log_level_updated"
                    );
                    self.current_log_level = new_log_level.clone();
                }
                Err(e) => {
                    warn!(error = %e, "log_level_update_failed");
                }
            }
        }

        match Backend::from_config(&new_config) {
            Ok(backend) => self.backend = backend,
            Err(e) => {
                warn!(error = %e, "backend_rebuild_failed");
                self.config_reload_error = Some(e.to_string());
                return;
            }
        }

        self.config = new_config;
        self.config_reload_error = None;
        self.project_config_error = None;
        self.config_reloaded_at = Some(Instant::now());
        self.show_notice("Config reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::Issue;
    use crate::safety::RiskLevel;
    use crate::widget::WidgetState;

    fn loaded(config: Config) -> LoadedConfig {
        LoadedConfig {
            config,
            config_path: PathBuf::from("/nonexistent/promptlab/config.toml"),
            project_config_path: None,
            status: ConfigLoadStatus::Loaded,
            project_error: None,
        }
    }

    fn app_with(config: Config) -> App {
        App::new(
            loaded(config),
            Handle::current(),
            "abc123".to_string(),
            None,
            None,
        )
        .unwrap()
    }

    fn demo_config(delay_ms: u64) -> Config {
        let mut config = Config::default();
        config.demo.enabled = true;
        config.demo.delay_ms = delay_ms;
        config
    }

    /// Poll until the active tool stops loading.
    async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.poll_completions();
            if !app.is_tool_loading(app.tool) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("tool {:?} never finished loading", app.tool);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.insert_char(c);
        }
    }

    #[tokio::test]
    async fn test_blank_prompt_disables_submit() {
        let mut app = app_with(Config::default());
        for tool in Tool::ALL {
            app.tool = tool;
            assert!(!app.can_submit(), "{:?} enabled on blank input", tool);
        }

        type_text(&mut app, "   ");
        assert!(!app.can_submit());

        type_text(&mut app, "hi");
        assert!(app.can_submit());
    }

    #[tokio::test]
    async fn test_submit_on_blank_is_ignored() {
        let mut app = app_with(Config::default());
        app.submit();
        assert_eq!(app.tool_status(Tool::Safety), ToolStatus::Idle);
    }

    #[tokio::test]
    async fn test_local_tool_without_delay_completes_immediately() {
        let mut app = app_with(Config::default());
        type_text(&mut app, "How can I hack this?");
        app.submit();

        let result = app.safety.result().unwrap();
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.score, 75);
        assert_eq!(app.tool_status(Tool::Safety), ToolStatus::Ready);
    }

    #[tokio::test]
    async fn test_local_tool_with_demo_delay_loads_first() {
        let mut app = app_with(demo_config(30));
        app.tool = Tool::Quality;
        type_text(&mut app, "Help");
        app.submit();

        assert_eq!(app.tool_status(Tool::Quality), ToolStatus::Loading);
        assert!(!app.can_submit());

        settle(&mut app).await;
        let result = app.quality.result().unwrap();
        assert!(result.issues.contains(&Issue::Vague));
        assert!(app.can_submit());
    }

    #[tokio::test]
    async fn test_demo_analyze_round_trip() {
        let mut app = app_with(demo_config(0));
        app.tool = Tool::Analyze;
        type_text(&mut app, "Write a detailed summary of this situation");
        app.submit();
        assert!(app.analysis.is_loading());

        settle(&mut app).await;
        let result = app.analysis.result().unwrap();
        assert_eq!(result.platform, "claude");
        assert_eq!(result.prompt, "Write a detailed summary of this situation");
    }

    #[tokio::test]
    async fn test_remote_failure_shows_error_and_reenables_submit() {
        let mut config = Config::default();
        // Nothing listens on port 1
        config.api.base_url = "http://127.0.0.1:1".to_string();
        config.api.timeout_secs = 2;
        let mut app = app_with(config);
        app.tool = Tool::Optimize;
        type_text(&mut app, "Make this better");
        app.submit();
        assert!(!app.can_submit());

        settle(&mut app).await;
        assert_eq!(app.tool_status(Tool::Optimize), ToolStatus::Error);
        assert!(app.optimization.error().is_some());
        assert!(app.can_submit());
    }

    #[tokio::test]
    async fn test_double_submit_while_loading_is_ignored() {
        let mut app = app_with(demo_config(50));
        app.tool = Tool::Optimize;
        type_text(&mut app, "Make this better");
        app.submit();
        let first = app.optimization.state().clone();
        app.submit();
        assert_eq!(app.optimization.state(), &first);
        settle(&mut app).await;
        assert!(app.optimization.result().is_some());
    }

    #[tokio::test]
    async fn test_editing_handles_multibyte_chars() {
        let mut app = app_with(Config::default());
        type_text(&mut app, "héllo");
        app.cursor_left();
        app.cursor_left();
        app.delete_char_before();
        assert_eq!(app.input, "hélo");
        app.delete_char_at();
        assert_eq!(app.input, "héo");
        assert_eq!(app.cursor, 2);
    }

    #[tokio::test]
    async fn test_home_end_are_line_based() {
        let mut app = app_with(Config::default());
        type_text(&mut app, "first\nsecond");
        assert_eq!(app.cursor_line_col(), (1, 6));
        app.cursor_home();
        assert_eq!(app.cursor_line_col(), (1, 0));
        assert_eq!(app.cursor, 6);
        app.cursor_end();
        assert_eq!(app.cursor, 12);
    }

    #[tokio::test]
    async fn test_clear_result_orphans_pending_request() {
        let mut app = app_with(demo_config(20));
        app.tool = Tool::Analyze;
        type_text(&mut app, "Write a poem");
        app.submit();
        app.clear_result();
        assert_eq!(app.tool_status(Tool::Analyze), ToolStatus::Idle);

        tokio::time::sleep(Duration::from_millis(80)).await;
        app.poll_completions();
        assert_eq!(app.tool_status(Tool::Analyze), ToolStatus::Idle);
    }

    #[tokio::test]
    async fn test_tool_cycling_wraps() {
        let mut app = app_with(Config::default());
        app.prev_tool();
        assert_eq!(app.tool, Tool::Optimize);
        app.next_tool();
        assert_eq!(app.tool, Tool::Safety);
    }

    #[tokio::test]
    async fn test_platform_starts_from_config() {
        let mut config = Config::default();
        config.defaults.platform = Platform::Gpt;
        let mut app = app_with(config);
        assert_eq!(app.platform, Platform::Gpt);
        app.cycle_platform();
        assert_eq!(app.platform, Platform::Claude);
    }

    #[tokio::test]
    async fn test_copy_text_prefers_result_then_prompt() {
        let mut app = app_with(Config::default());
        assert_eq!(app.copy_text(), None);

        type_text(&mut app, "hack the planet");
        assert_eq!(app.copy_text().as_deref(), Some("hack the planet"));

        app.submit();
        let text = app.copy_text().unwrap();
        assert!(text.starts_with("Risk: HIGH | Score: 75/100"));
        assert!(text.ends_with("hack"));
    }

    #[tokio::test]
    async fn test_load_template_moves_cursor_to_end() {
        let mut app = app_with(Config::default());
        let template = crate::templates::for_platform(Platform::Claude)[0];
        app.load_template(&template);
        assert_eq!(app.input, template.body);
        assert_eq!(app.cursor, template.body.chars().count());
    }

    #[tokio::test]
    async fn test_apply_config_switches_backend() {
        let mut app = app_with(Config::default());
        assert_eq!(app.backend.label(), "remote");
        app.apply_config(demo_config(0));
        assert_eq!(app.backend.label(), "demo");
        assert!(app.config_reloaded_at.is_some());
        assert_eq!(app.active_notice(), Some("Config reloaded"));
    }

    #[tokio::test]
    async fn test_custom_trigger_table_from_config() {
        let mut config = Config::default();
        config.safety.triggers = Some(vec![crate::safety::Trigger {
            word: "exploit".to_string(),
            risk: crate::safety::TriggerRisk::Medium,
            suggestion: "Try \"use\"".to_string(),
        }]);
        let mut app = app_with(config);
        type_text(&mut app, "hack and exploit");
        app.submit();
        let result = app.safety.result().unwrap();
        assert_eq!(result.triggers.len(), 1);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_results_scroll_is_clamped() {
        let mut app = app_with(Config::default());
        app.results_line_count = 30;
        app.results_pane_height = 10;
        app.scroll_results_down(100);
        assert_eq!(app.results_scroll, 20);
        app.scroll_results_up(5);
        assert_eq!(app.results_scroll, 15);
        assert!(matches!(app.safety.state(), WidgetState::Idle));
    }

    #[tokio::test]
    async fn test_results_scroll_saturates_at_u16_max() {
        let mut app = app_with(Config::default());
        app.results_line_count = u16::MAX;
        app.results_pane_height = 1;
        app.scroll_results_down(u16::MAX);
        app.scroll_results_down(u16::MAX);
        assert_eq!(app.results_scroll, u16::MAX - 1);
    }

    #[tokio::test]
    async fn test_poll_config_picks_up_project_file_edit() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let project_path = dir.path().join(".promptlab");
        std::fs::write(&config_path, toml::to_string(&Config::default()).unwrap()).unwrap();
        std::fs::write(&project_path, "[logging]\nlevel = \"info\"\n").unwrap();

        let loaded = LoadedConfig {
            config: Config::default(),
            config_path,
            project_config_path: Some(project_path.clone()),
            status: ConfigLoadStatus::Loaded,
            project_error: None,
        };
        let mut app = App::new(loaded, Handle::current(), "abc123".to_string(), None, None).unwrap();
        assert_eq!(app.backend.label(), "remote");

        // Only the project file changes
        std::fs::write(&project_path, "[demo]\nenabled = true\n").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&project_path)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();
        app.last_config_poll = Instant::now() - Duration::from_secs(10);
        app.poll_config();

        assert_eq!(app.backend.label(), "demo");
        assert!(app.config.demo.enabled);
        assert!(app.config_reload_error.is_none());
    }

    #[tokio::test]
    async fn test_project_error_carried_into_app() {
        let mut loaded = loaded(Config::default());
        loaded.project_error = Some("Invalid .promptlab: expected `]`".to_string());
        let mut app = App::new(loaded, Handle::current(), "abc123".to_string(), None, None).unwrap();
        assert!(app.project_config_error.as_deref().unwrap().starts_with("Invalid .promptlab"));

        app.apply_config(Config::default());
        assert!(app.project_config_error.is_none());
    }
}
