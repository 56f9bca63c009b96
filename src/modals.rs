//! Modal state and input handling.

use crossterm::event::KeyCode;

use crate::app::App;
use crate::platform::Platform;
use crate::templates::{self, PromptTemplate};

/// State for the template picker modal.
#[derive(Debug)]
pub struct TemplatePickerState {
    /// Platform whose library is shown.
    pub platform: Platform,
    /// Currently selected index.
    pub selected: usize,
    /// Scroll offset for the list.
    pub scroll_offset: usize,
}

impl TemplatePickerState {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            selected: 0,
            scroll_offset: 0,
        }
    }

    pub fn templates(&self) -> &'static [PromptTemplate] {
        templates::for_platform(self.platform)
    }

    pub fn selected_template(&self) -> Option<&'static PromptTemplate> {
        self.templates().get(self.selected)
    }

    /// Move selection up.
    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    /// Move selection down.
    pub fn select_next(&mut self) {
        let count = self.templates().len();
        if count > 0 && self.selected < count - 1 {
            self.selected += 1;
        }
    }

    /// Show another platform's library.
    pub fn cycle_platform(&mut self) {
        self.platform = self.platform.next();
        self.selected = 0;
        self.scroll_offset = 0;
    }

    /// Ensure selected item is visible, adjusting scroll_offset if needed.
    pub fn ensure_visible(&mut self, visible_height: usize) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected - visible_height + 1;
        }
    }
}

/// Handle keyboard input for the template picker.
pub fn handle_template_picker_input(app: &mut App, key_code: KeyCode) {
    let Some(state) = &mut app.template_picker else {
        return;
    };

    match key_code {
        KeyCode::Esc => {
            app.close_template_picker();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.select_prev();
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.select_next();
        }
        KeyCode::Tab => {
            state.cycle_platform();
        }
        KeyCode::Enter => {
            let platform = state.platform;
            if let Some(template) = state.selected_template() {
                // Loading a template also switches to its platform
                app.platform = platform;
                app.load_template(template);
            }
            app.close_template_picker();
        }
        _ => {}
    }
}

/// Handle keyboard input while the help modal is open.
pub fn handle_help_input(app: &mut App, key_code: KeyCode) {
    if matches!(
        key_code,
        KeyCode::Esc | KeyCode::Enter | KeyCode::F(1) | KeyCode::Char('q')
    ) {
        app.show_help = false;
    }
}
