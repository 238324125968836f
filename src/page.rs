mod selector;
mod table_page;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::Theme;
use crate::commands::Command;
use crate::ui::{EventResult, Keybinding, Result};

pub use selector::PageSelectorView;
pub use table_page::{TablePage, TableSchema};

pub enum PageMsg {
    /// No action needed
    Idle,
    /// Run one or more commands
    Run(Vec<Box<dyn Command>>),
    /// Close this page (go back to page selection)
    Close,
}

impl<T: Command> From<T> for PageMsg {
    fn from(value: T) -> Self {
        Self::Run(vec![Box::new(value)])
    }
}

/// An admin page.
///
/// Pages manage their own internal state and message queue. The App calls
/// methods in this order:
///
/// 1. `init()` - once when the page becomes active
/// 2. `update()` - immediately after init to process startup messages
/// 3. For each event:
///    - `handle_tick()` if tick event
///    - `handle_key()` if key event, then `update()` if consumed
/// 4. When a command completes: `update()`
/// 5. `destroy()` - when the page is closing
pub trait Page {
    /// Initialize the page by queuing startup message(s).
    fn init(&mut self) {}

    /// Clean up when the page is closing.
    fn destroy(&mut self) {}

    /// Handle a tick event for animations.
    fn handle_tick(&mut self) {}

    /// Handle a key event.
    fn handle_key(&mut self, key: KeyEvent) -> EventResult<()>;

    /// Process all queued messages and return the result.
    ///
    /// # Errors
    /// Returns an error if message processing fails.
    /// In this case, the App will display the error and keep the page open.
    fn update(&mut self) -> Result<PageMsg>;

    /// Render the page to the frame.
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Breadcrumb segments for the status bar.
    fn breadcrumbs(&self) -> Vec<String>;

    /// Returns the keybindings for the current view of this page.
    fn keybindings(&self) -> Vec<Keybinding> {
        vec![]
    }

    /// Whether text entry or a dialog owns the keyboard, so global keys
    /// must not fire.
    fn is_capturing_input(&self) -> bool {
        false
    }
}
