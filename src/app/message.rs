//! Application-level messages.
//!
//! Messages are the internal traffic of the app: lifecycle signals from the
//! event loop, feedback from commands, and route changes. Page-specific
//! messages stay on each page's own channel (e.g. `TablePageMsg`).

use crate::registry::PageId;
use crate::ui::ToastType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMessage {
    // === Lifecycle ===
    /// Periodic tick for animations and toast expiry
    Tick,
    Render,
    Resize(u16, u16),
    /// Suspend the application (Ctrl+Z)
    Suspend,
    Resume,
    Quit,
    ClearScreen,

    // === Feedback ===
    DisplayError(String),
    DisplayHelp,
    DisplayThemeSelector,
    /// Close whatever overlay is open
    ClosePopup,
    ShowToast {
        message: String,
        toast_type: ToastType,
    },

    // === Page ===
    /// A command finished; the page should drain its queue
    CommandCompleted { name: String, success: bool },
    /// The page queued messages outside of a command result
    PageChanged,

    // === Routing ===
    SelectPage(PageId),
    /// Leave the open page for the selector
    GoBack,
}
