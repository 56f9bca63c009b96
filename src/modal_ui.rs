//! Modal UI rendering functions.

use std::path::Path;

use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::App;
use crate::modals::TemplatePickerState;
use crate::ui::{centered_rect, format_elapsed, truncate_str};
use crate::validators::validate_config;

/// Contract a path by replacing the home directory with `~` for display.
fn contract_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(suffix) = path.strip_prefix(&home)
    {
        return format!("~/{}", suffix.display());
    }
    path.display().to_string()
}

/// Draw the template picker modal.
pub fn draw_template_picker(f: &mut Frame, state: &mut TemplatePickerState) {
    let modal_width: u16 = 70;
    let modal_height: u16 = 22;
    let modal_area = centered_rect(modal_width, modal_height, f.area());

    // Clear the area behind the modal
    f.render_widget(Clear, modal_area);

    // Calculate inner area (minus borders)
    let inner_height = modal_height.saturating_sub(2) as usize;
    let inner_width = modal_width.saturating_sub(2) as usize;

    // Split layout: list (~30%), separator (1), preview (rest), hint (1)
    let list_area_height = (inner_height * 30 / 100).max(3);
    let preview_area_height = inner_height.saturating_sub(list_area_height + 2);

    // Ensure selected item is visible
    state.ensure_visible(list_area_height);

    let templates = state.templates();
    let mut content: Vec<Line> = Vec::new();

    let visible_start = state.scroll_offset;
    let visible_end = (state.scroll_offset + list_area_height).min(templates.len());

    for (idx, template) in templates
        .iter()
        .enumerate()
        .take(visible_end)
        .skip(visible_start)
    {
        let line_style = if idx == state.selected {
            Style::default().fg(Color::Black).bg(Color::White)
        } else {
            Style::default().fg(Color::White)
        };

        // Pad for full-width selection highlight
        let title = truncate_str(template.title, inner_width.saturating_sub(4));
        let padding = inner_width.saturating_sub(title.chars().count() + 2);
        content.push(Line::from(vec![
            Span::styled("  ", line_style),
            Span::styled(title, line_style),
            Span::styled(" ".repeat(padding), line_style),
        ]));
    }

    // Fill remaining list space if list is shorter than allocated height
    for _ in (visible_end - visible_start)..list_area_height {
        content.push(Line::from(""));
    }

    content.push(Line::from(Span::styled(
        "\u{2500}".repeat(inner_width),
        Style::default().fg(Color::DarkGray),
    )));

    // Preview pane
    let preview: Vec<String> = state
        .selected_template()
        .map(|t| t.body.lines().map(String::from).collect())
        .unwrap_or_default();
    for line in preview.iter().take(preview_area_height) {
        let display_line: String = line.chars().take(inner_width).collect();
        content.push(Line::from(Span::styled(
            display_line,
            Style::default().fg(Color::DarkGray),
        )));
    }
    for _ in preview.len().min(preview_area_height)..preview_area_height {
        content.push(Line::from(""));
    }

    content.push(Line::from(Span::styled(
        "  [↑↓] Select  [Tab] Platform  [Enter] Load  [Esc] Cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let modal = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Templates · {} ", state.platform.label()))
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(Color::White)),
    );

    f.render_widget(modal, modal_area);
}

const KEY_BINDINGS: [(&str, &str); 11] = [
    ("Ctrl+R", "Run the active tool"),
    ("Tab / Shift+Tab", "Next / previous tool"),
    ("Ctrl+P", "Cycle target platform"),
    ("Ctrl+T", "Open template library"),
    ("Ctrl+Y", "Copy result (or prompt) to clipboard"),
    ("Ctrl+L", "Clear the prompt"),
    ("Ctrl+X", "Clear the active tool's result"),
    ("PgUp / PgDn", "Scroll results"),
    ("Enter", "New line"),
    ("F1", "Toggle this help"),
    ("Ctrl+Q / Ctrl+C", "Quit"),
];

/// Draw the help modal: key bindings and the effective configuration.
pub fn draw_help_modal(f: &mut Frame, app: &App) {
    let modal_width: u16 = 72;
    let modal_height: u16 = 30;
    let modal_area = centered_rect(modal_width, modal_height, f.area());

    // Clear the area behind the modal
    f.render_widget(Clear, modal_area);

    let label_style = Style::default().fg(Color::DarkGray);
    let heading_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let separator = "─".repeat(modal_width.saturating_sub(4) as usize);

    let mut content: Vec<Line> = vec![Line::from(Span::styled("Keys", heading_style))];
    for (keys, action) in KEY_BINDINGS {
        content.push(Line::from(vec![
            Span::styled(format!("  {:<18}", keys), Style::default().fg(Color::White)),
            Span::styled(action, label_style),
        ]));
    }

    content.push(Line::from(Span::styled(separator, label_style)));
    content.push(Line::from(Span::styled("Configuration", heading_style)));

    let project_display = app
        .project_config_path
        .as_ref()
        .map(|p| contract_path(p))
        .unwrap_or_else(|| "(none)".to_string());
    let log_dir_display = app
        .log_directory
        .as_ref()
        .map(|p| contract_path(p))
        .unwrap_or_else(|| "(not configured)".to_string());
    let backend_display = match app.backend.label() {
        "demo" => format!("demo ({} ms delay)", app.config.demo.delay_ms),
        other => format!("{} ({})", other, app.config.api.base_url),
    };

    let status_display = match app.config_reloaded_at {
        Some(at) => format!("Reloaded {} ago", format_elapsed(at.elapsed())),
        None => app.config_status.label(),
    };

    let rows = [
        ("Config", contract_path(&app.config_path)),
        ("Status", status_display),
        ("Project", project_display),
        ("Backend", backend_display),
        ("Log level", app.current_log_level.clone()),
        ("Logs", log_dir_display),
        ("Session", app.session_id.clone()),
    ];
    for (label, value) in rows {
        content.push(Line::from(vec![
            Span::styled(format!("  {:<11}", label), label_style),
            Span::styled(value, Style::default().fg(Color::White)),
        ]));
    }

    let problems = validate_config(&app.config);
    if let Some(error) = &app.project_config_error {
        content.push(Line::from(Span::styled(
            format!("  Project config ignored: {}", error),
            Style::default().fg(Color::Red),
        )));
    }
    if let Some(error) = &app.config_reload_error {
        content.push(Line::from(Span::styled(
            format!("  Reload failed: {}", error),
            Style::default().fg(Color::Red),
        )));
    }
    for (field, message) in problems {
        content.push(Line::from(Span::styled(
            format!("  {}: {}", field, message),
            Style::default().fg(Color::Yellow),
        )));
    }

    let modal = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .title_alignment(Alignment::Center)
                .style(Style::default().fg(Color::White)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(modal, modal_area);
}
