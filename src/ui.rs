//! UI rendering functions.

use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Tabs, Wrap,
};

use crate::app::{App, Tool, ToolStatus};
use crate::modal_ui::{draw_help_modal, draw_template_picker};
use crate::models::{AnalysisResult, OptimizationResult, display_score};
use crate::quality::{PromptQuality, word_count};
use crate::safety::{RiskLevel, SafetyCheckResult};
use crate::tokens::{CostEstimate, estimate_tokens, format_usd};
use crate::widget::{Widget, WidgetState};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Width of the score bar in cells.
const SCORE_BAR_WIDTH: usize = 20;

/// Formats a duration as M:SS (under 1 hour) or H:MM:SS (1+ hours).
pub fn format_elapsed(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Truncates a string to the given maximum length, appending "..." if truncated.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    // Replace newlines with spaces for single-line display
    let single_line: String = s.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();

    if single_line.chars().count() <= max_len {
        single_line
    } else {
        let kept: String = single_line.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Calculate a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

pub fn spinner_frame(frame_count: u64) -> &'static str {
    SPINNER[(frame_count / 3) as usize % SPINNER.len()]
}

pub fn score_color(score: u8) -> Color {
    match score {
        80.. => Color::Green,
        60..=79 => Color::Yellow,
        _ => Color::Red,
    }
}

pub fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Low => Color::Green,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High => Color::Red,
    }
}

/// Horizontal bar for a 0-100 score.
pub fn score_bar(score: u8) -> String {
    let filled = (score.min(100) as usize * SCORE_BAR_WIDTH).div_ceil(100);
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(SCORE_BAR_WIDTH - filled)
    )
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))
}

fn score_line(label: &str, score: u8) -> Line<'static> {
    let color = score_color(score);
    Line::from(vec![
        Span::styled(format!("{:<14}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(score_bar(score), Style::default().fg(color)),
        Span::styled(format!(" {:>3}/100", score), Style::default().fg(color)),
    ])
}

fn bullet(text: &str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled("  • ", Style::default().fg(color)),
        Span::raw(text.to_string()),
    ])
}

pub fn safety_lines(result: &SafetyCheckResult) -> Vec<Line<'static>> {
    let color = risk_color(result.risk_level);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Risk          ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                result.risk_level.label(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]),
        score_line("Safety score", result.score),
        Line::from(""),
    ];

    if result.triggers.is_empty() {
        lines.push(Line::from(Span::styled(
            "✓ No trigger words found",
            Style::default().fg(Color::Green),
        )));
        return lines;
    }

    lines.push(heading(&format!("Triggers ({})", result.triggers.len())));
    for trigger in &result.triggers {
        lines.push(Line::from(vec![
            Span::styled("  ✗ ", Style::default().fg(color)),
            Span::styled(
                format!("\"{}\"", trigger.word),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("  {}", trigger.suggestion),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    if !result.is_likely_safe {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Likely to be refused. Rephrase before sending.",
            Style::default().fg(Color::Red),
        )));
    }
    lines
}

pub fn quality_lines(result: &PromptQuality) -> Vec<Line<'static>> {
    let mut lines = vec![
        score_line("Quality", result.score),
        Line::from(vec![
            Span::styled("Words         ", Style::default().fg(Color::DarkGray)),
            Span::raw(result.word_count.to_string()),
        ]),
        Line::from(""),
    ];

    if !result.issues.is_empty() {
        lines.push(heading("Issues"));
        for issue in &result.issues {
            lines.push(Line::from(vec![
                Span::styled("  ! ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{}: ", issue.label()),
                    Style::default().fg(Color::White),
                ),
                Span::styled(issue.description(), Style::default().fg(Color::DarkGray)),
            ]));
        }
        lines.push(Line::from(""));
    }

    if !result.suggestions.is_empty() {
        lines.push(heading("Suggestions"));
        for suggestion in &result.suggestions {
            lines.push(bullet(suggestion, Color::Cyan));
        }
    }
    lines
}

pub fn tokens_lines(result: &CostEstimate) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::DarkGray);
    vec![
        Line::from(vec![
            Span::styled("Tokens        ", label),
            Span::styled(
                format!("~{}", result.tokens),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Platform      ", label),
            Span::raw(result.platform.label()),
        ]),
        Line::from(vec![
            Span::styled("Per request   ", label),
            Span::raw(format_usd(result.cost_per_request_usd)),
        ]),
        Line::from(vec![
            Span::styled("Per month     ", label),
            Span::styled(
                format_usd(result.monthly_cost_usd),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!("  at {} requests/day", result.requests_per_day),
                label,
            ),
        ]),
    ]
}

pub fn analysis_lines(result: &AnalysisResult) -> Vec<Line<'static>> {
    let metrics = &result.metrics;
    let mut lines = vec![
        score_line("Strength", display_score(result.strength_score)),
        Line::from(""),
        heading("Metrics"),
        score_line("  Clarity", display_score(metrics.clarity)),
        score_line("  Specificity", display_score(metrics.specificity)),
        score_line("  Context", display_score(metrics.context)),
        score_line("  Actionable", display_score(metrics.actionability)),
    ];

    if !result.suggestions.is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("Suggestions"));
        for suggestion in &result.suggestions {
            lines.push(bullet(suggestion, Color::Cyan));
        }
    }
    lines
}

pub fn optimization_lines(result: &OptimizationResult) -> Vec<Line<'static>> {
    let improvements = &result.improvements;
    let label = Style::default().fg(Color::DarkGray);
    let clarity_color = if improvements.clarity >= 0.0 {
        Color::Green
    } else {
        Color::Red
    };

    let mut lines = vec![
        score_line("Improvement", display_score(improvements.improvement_score)),
        Line::from(vec![
            Span::styled("Clarity       ", label),
            Span::styled(
                format!("{:+.0}", improvements.clarity),
                Style::default().fg(clarity_color),
            ),
            Span::styled("   Tokens saved  ", label),
            Span::raw(improvements.tokens_saved.to_string()),
        ]),
        Line::from(""),
        heading("Optimized prompt"),
    ];
    lines.extend(
        result
            .optimized_prompt
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::White)))),
    );
    lines
}

fn idle_hint(tool: Tool) -> &'static str {
    match tool {
        Tool::Safety => "Check the prompt for words that trigger refusals.",
        Tool::Quality => "Score the prompt for context, examples, and constraints.",
        Tool::Tokens => "Estimate tokens and what the prompt costs to run.",
        Tool::Analyze => "Send the prompt to the backend for a full analysis.",
        Tool::Optimize => "Ask the backend to rewrite the prompt for the platform.",
    }
}

fn widget_lines<T>(
    widget: &Widget<T>,
    tool: Tool,
    frame_count: u64,
    render: impl Fn(&T) -> Vec<Line<'static>>,
) -> Vec<Line<'static>> {
    match widget.state() {
        WidgetState::Idle => vec![Line::from(Span::styled(
            idle_hint(tool),
            Style::default().fg(Color::DarkGray),
        ))],
        WidgetState::Loading { started, .. } => vec![Line::from(vec![
            Span::styled(
                format!("{} ", spinner_frame(frame_count)),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(format!("{}... ", tool.progress_label())),
            Span::styled(
                format_elapsed(started.elapsed()),
                Style::default().fg(Color::DarkGray),
            ),
        ])],
        WidgetState::Ready(value) => render(value),
        WidgetState::Failed(message) => vec![
            Line::from(Span::styled(
                format!("✗ {}", message),
                Style::default().fg(Color::Red),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Ctrl+R to try again.",
                Style::default().fg(Color::DarkGray),
            )),
        ],
    }
}

/// Lines for the results pane of the active tool.
pub fn result_lines(app: &App) -> Vec<Line<'static>> {
    let frame = app.frame_count;
    match app.tool {
        Tool::Safety => widget_lines(&app.safety, app.tool, frame, safety_lines),
        Tool::Quality => widget_lines(&app.quality, app.tool, frame, quality_lines),
        Tool::Tokens => widget_lines(&app.tokens, app.tool, frame, tokens_lines),
        Tool::Analyze => widget_lines(&app.analysis, app.tool, frame, analysis_lines),
        Tool::Optimize => widget_lines(&app.optimization, app.tool, frame, optimization_lines),
    }
}

/// Draw the main UI.
pub fn draw_ui(f: &mut Frame, app: &mut App) {
    // Increment frame counter for animations
    app.frame_count = app.frame_count.wrapping_add(1);

    let status = app.tool_status(app.tool);
    let status_color = status.pulsing_color(app.frame_count);

    // Tabs (fixed) + body (flexible) + command panel (fixed)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    draw_editor(f, app, body[0]);
    draw_results(f, app, body[1], status, status_color);
    draw_command_panel(f, app, chunks[2], status, status_color);

    if let Some(state) = &mut app.template_picker {
        draw_template_picker(f, state);
    }

    if app.show_help {
        draw_help_modal(f, app);
    }
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tool::ALL
        .iter()
        .map(|tool| {
            let marker = match app.tool_status(*tool) {
                ToolStatus::Loading => "◌ ",
                ToolStatus::Ready => "● ",
                ToolStatus::Error => "✗ ",
                ToolStatus::Idle => "",
            };
            Line::from(format!("{}{}", marker, tool.label()))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.tool.index())
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Line::from(" promptlab ").left_aligned())
                .title(Line::from(format!(" {} ", app.platform.label())).right_aligned()),
        );

    f.render_widget(tabs, area);
}

/// Hard-wrap the editor text at `width` columns.
///
/// Returns the visual rows and the cursor's (row, col) among them. A cursor
/// sitting just past a full row lands at the start of a fresh row.
fn wrap_editor(input: &str, cursor: (usize, usize), width: usize) -> (Vec<String>, (usize, usize)) {
    let width = width.max(1);
    let mut rows: Vec<String> = Vec::new();
    let mut cursor_pos = (0, 0);

    for (line_idx, line) in input.split('\n').enumerate() {
        let first_row = rows.len();
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(String::new());
        } else {
            rows.extend(chars.chunks(width).map(|chunk| chunk.iter().collect::<String>()));
        }

        if line_idx == cursor.0 {
            cursor_pos = (first_row + cursor.1 / width, cursor.1 % width);
            if cursor_pos.0 >= rows.len() {
                rows.push(String::new());
            }
        }
    }

    (rows, cursor_pos)
}

fn draw_editor(f: &mut Frame, app: &App, area: Rect) {
    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2) as usize;
    let (rows, (cursor_row, cursor_col)) =
        wrap_editor(&app.input, app.cursor_line_col(), inner_width);
    let top = cursor_row.saturating_sub(inner_height.saturating_sub(1));

    let content: Vec<Line> = if app.input.is_empty() {
        vec![Line::from(Span::styled(
            "Type a prompt, or press Ctrl+T for a template",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        rows.into_iter().map(Line::raw).collect()
    };

    let stats = format!(
        " {} words · ~{} tokens ",
        word_count(&app.input),
        estimate_tokens(&app.input)
    );

    let editor = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(ratatui::widgets::BorderType::Rounded)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Line::from(" Prompt ").left_aligned())
                .title_bottom(Line::from(stats).right_aligned()),
        )
        .scroll((u16::try_from(top).unwrap_or(u16::MAX), 0));

    f.render_widget(editor, area);

    // Hide the cursor when a modal is covering the editor
    if app.template_picker.is_none() && !app.show_help {
        let col = u16::try_from(cursor_col).unwrap_or(u16::MAX);
        let row = u16::try_from(cursor_row - top).unwrap_or(u16::MAX);
        let x = area.x.saturating_add(1).saturating_add(col);
        let y = area.y.saturating_add(1).saturating_add(row);
        if x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1) {
            f.set_cursor_position(Position::new(x, y));
        }
    }
}

fn draw_results(f: &mut Frame, app: &mut App, area: Rect, status: ToolStatus, color: Color) {
    // Update results pane dimensions for scroll calculations
    app.results_pane_height = area.height.saturating_sub(2);
    app.results_pane_width = area.width;

    let content = result_lines(app);
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(status.border_type())
        .border_style(Style::default().fg(color))
        .title(Line::from(format!(" {} ", app.tool.label())).left_aligned());

    if app.tool.is_remote() {
        block = block.title(Line::from(format!(" {} ", app.backend.label())).right_aligned());
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });

    app.results_line_count =
        u16::try_from(paragraph.line_count(app.results_pane_width)).unwrap_or(u16::MAX);
    app.results_scroll = app.results_scroll.min(app.max_results_scroll());

    f.render_widget(paragraph.scroll((app.results_scroll, 0)), area);

    // Scrollbar - only visible when content exceeds viewport
    if app.results_line_count > app.results_pane_height {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));

        let mut scrollbar_state = ScrollbarState::default()
            .content_length(app.results_line_count as usize)
            .position(app.results_scroll as usize)
            .viewport_content_length(app.results_pane_height as usize);

        f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

fn draw_command_panel(f: &mut Frame, app: &App, area: Rect, status: ToolStatus, color: Color) {
    let dim = Style::default().fg(Color::DarkGray);
    let run_style = if app.can_submit() {
        Style::default().fg(Color::White)
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    };

    let shortcuts = vec![
        Span::styled("[^R] Run", run_style),
        Span::styled(
            "  [Tab] Tool  [^P] Platform  [^T] Templates  [^Y] Copy  [F1] Help  [^Q] Quit",
            dim,
        ),
    ];
    let shortcuts_len: usize = shortcuts.iter().map(|s| s.content.chars().count()).sum();

    // Status indicator: notice, reload error, or tool status
    let (status_text, status_style) = if let Some(notice) = app.active_notice() {
        (format!("✓ {}", notice), Style::default().fg(Color::Green))
    } else if let Some(error) = &app.config_reload_error {
        (
            format!("Config error: {}", truncate_str(error, 40)),
            Style::default().fg(Color::Yellow),
        )
    } else {
        let text = match app.loading_elapsed() {
            Some(elapsed) => format_elapsed(elapsed),
            None => status.label().to_string(),
        };
        (format!("● {}", text), Style::default().fg(color))
    };

    // Calculate spacing to right-align the status indicator
    let inner_width = area.width.saturating_sub(2) as usize;
    let spacing = inner_width.saturating_sub(shortcuts_len + status_text.chars().count());

    let mut spans = shortcuts;
    spans.push(Span::raw(" ".repeat(spacing)));
    spans.push(Span::styled(status_text, status_style));

    let command_panel = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(status.border_type())
            .border_style(Style::default().fg(color)),
    );

    f.render_widget(command_panel, area);
}
