mod api;
mod app;
mod backend;
mod cli;
mod clipboard;
mod commands;
mod config;
mod logging;
mod modal_ui;
mod modals;
mod models;
mod platform;
mod quality;
mod safety;
mod templates;
mod tokens;
mod ui;
mod validators;
mod widget;

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event,
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{DefaultTerminal, Terminal};
use tracing::{debug, info, warn};

use crate::app::App;
use crate::cli::{Cli, Command};
use crate::config::LoadedConfig;
use crate::logging::ReloadHandle;
use crate::modals::{handle_help_input, handle_template_picker_input};
use crate::ui::draw_ui;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    // Logging first at the default level so config loading is recorded
    let default_level = config::LoggingConfig::default().level;
    let (session_id, log_directory, reload_handle, _guard) = match logging::init(&default_level) {
        Ok(ctx) => (
            ctx.session_id,
            Some(ctx.log_directory),
            Some(ctx.reload_handle),
            Some(ctx._guard),
        ),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            (logging::generate_session_id(), None, None, None)
        }
    };

    let loaded_config = config::load_config();

    // RUST_LOG already won in the initial filter
    let level = &loaded_config.config.logging.level;
    if std::env::var_os("RUST_LOG").is_none()
        && *level != default_level
        && let Some(handle) = &reload_handle
        && let Err(e) = logging::update_log_level(handle, level)
    {
        warn!(error = %e, level = %level, "log_level_update_failed");
    }

    debug!(
        config_path = %loaded_config.config_path.display(),
        status = ?loaded_config.status,
        "config_loaded"
    );

    if let Some(log_dir) = &log_directory {
        let removed = logging::cleanup_old_logs(log_dir);
        if removed > 0 {
            debug!(removed, "old_logs_removed");
        }
    }

    for (field, message) in validators::validate_config(&loaded_config.config) {
        warn!(field, message = %message, "config_invalid");
    }

    let runtime = tokio::runtime::Runtime::new()?;

    let result = match cli.command {
        None | Some(Command::Tui) => run_tui(
            runtime.handle().clone(),
            session_id.clone(),
            log_directory,
            reload_handle,
            loaded_config,
        ),
        Some(command) => runtime.block_on(commands::run(command, &loaded_config)),
    };

    let duration = start_time.elapsed();
    info!(
        session_id = %session_id,
        duration_secs = duration.as_secs_f64(),
        "session_end"
    );

    result
}

fn run_tui(
    runtime: tokio::runtime::Handle,
    session_id: String,
    log_directory: Option<PathBuf>,
    reload_handle: Option<Arc<Mutex<ReloadHandle>>>,
    loaded_config: LoadedConfig,
) -> Result<()> {
    let app = App::new(
        loaded_config,
        runtime,
        session_id,
        log_directory,
        reload_handle,
    )?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let terminal = Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

    let result = run_app(terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;

    result
}

fn run_app(mut terminal: DefaultTerminal, mut app: App) -> Result<()> {
    loop {
        // Pick up finished requests and config edits
        app.poll_completions();
        app.poll_config();

        // Draw UI
        terminal.draw(|f| draw_ui(f, &mut app))?;

        // Poll for events with a short timeout to keep animations and results flowing
        if crossterm::event::poll(Duration::from_millis(50))? {
            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                Event::Paste(text) => {
                    if app.template_picker.is_none() && !app.show_help {
                        app.insert_str(&text.replace('\r', ""));
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => {
                        app.scroll_results_up(3);
                    }
                    MouseEventKind::ScrollDown => {
                        app.scroll_results_down(3);
                    }
                    _ => {}
                },
                Event::Resize(_, _) => {
                    // Terminal resized, will be handled in next draw
                }
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Quit works from anywhere
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        app.should_quit = true;
        return;
    }

    if app.template_picker.is_some() {
        handle_template_picker_input(app, key.code);
        return;
    }

    if app.show_help {
        handle_help_input(app, key.code);
        return;
    }

    match key.code {
        KeyCode::Char('r') if ctrl => app.submit(),
        KeyCode::Char('p') if ctrl => app.cycle_platform(),
        KeyCode::Char('t') if ctrl => app.open_template_picker(),
        KeyCode::Char('y') if ctrl => app.copy_to_clipboard(),
        KeyCode::Char('l') if ctrl => app.clear_input(),
        KeyCode::Char('x') if ctrl => app.clear_result(),
        KeyCode::Char('u') if ctrl => {
            let half_page = app.results_pane_height / 2;
            app.scroll_results_up(half_page);
        }
        KeyCode::Char('d') if ctrl => {
            let half_page = app.results_pane_height / 2;
            app.scroll_results_down(half_page);
        }
        KeyCode::Char(c) if !ctrl => app.insert_char(c),
        KeyCode::Enter => app.insert_char('\n'),
        KeyCode::Backspace => app.delete_char_before(),
        KeyCode::Delete => app.delete_char_at(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Tab => app.next_tool(),
        KeyCode::BackTab => app.prev_tool(),
        KeyCode::PageUp => app.scroll_results_up(app.results_pane_height),
        KeyCode::PageDown => app.scroll_results_down(app.results_pane_height),
        KeyCode::F(1) => app.show_help = true,
        _ => {}
    }
}
