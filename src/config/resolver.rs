use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::config::actions::{
    BrowserAction, DialogAction, EditorAction, GlobalAction, NavAction, SearchAction,
};
use crate::config::keybindings::KeybindingsConfig;

/// Maps key events to actions through the configured keybindings.
pub struct KeyResolver {
    pub keybindings: Arc<KeybindingsConfig>,
}

impl KeyResolver {
    pub const fn new(keybindings: Arc<KeybindingsConfig>) -> Self {
        Self { keybindings }
    }

    // Global actions
    pub fn matches_global(&self, event: &KeyEvent, action: GlobalAction) -> bool {
        let kb = &self.keybindings.global;
        match action {
            GlobalAction::Quit => kb.quit.matches(event),
            GlobalAction::Help => kb.help.matches(event),
            GlobalAction::Theme => kb.theme.matches(event),
            GlobalAction::Back => kb.back.matches(event),
        }
    }

    pub fn display_global(&self, action: GlobalAction) -> String {
        let kb = &self.keybindings.global;
        match action {
            GlobalAction::Quit => kb.quit.display(),
            GlobalAction::Help => kb.help.display(),
            GlobalAction::Theme => kb.theme.display(),
            GlobalAction::Back => kb.back.display(),
        }
    }

    // Navigation actions
    pub fn matches_nav(&self, event: &KeyEvent, action: NavAction) -> bool {
        let kb = &self.keybindings.navigation;
        match action {
            NavAction::Up => kb.up.matches(event),
            NavAction::Down => kb.down.matches(event),
            NavAction::PageUp => kb.page_up.matches(event),
            NavAction::PageDown => kb.page_down.matches(event),
            NavAction::Home => kb.home.matches(event),
            NavAction::End => kb.end.matches(event),
            NavAction::Select => kb.select.matches(event),
        }
    }

    pub fn display_nav(&self, action: NavAction) -> String {
        let kb = &self.keybindings.navigation;
        match action {
            NavAction::Up => kb.up.display(),
            NavAction::Down => kb.down.display(),
            NavAction::PageUp => kb.page_up.display(),
            NavAction::PageDown => kb.page_down.display(),
            NavAction::Home => kb.home.display(),
            NavAction::End => kb.end.display(),
            NavAction::Select => kb.select.display(),
        }
    }

    // Search actions
    pub fn matches_search(&self, event: &KeyEvent, action: SearchAction) -> bool {
        let kb = &self.keybindings.search;
        match action {
            SearchAction::Toggle => kb.toggle.matches(event),
            SearchAction::Exit => kb.exit.matches(event),
        }
    }

    pub fn display_search(&self, action: SearchAction) -> String {
        let kb = &self.keybindings.search;
        match action {
            SearchAction::Toggle => kb.toggle.display(),
            SearchAction::Exit => kb.exit.display(),
        }
    }

    // Browser actions
    pub fn matches_browser(&self, event: &KeyEvent, action: BrowserAction) -> bool {
        let kb = &self.keybindings.browser;
        match action {
            BrowserAction::Add => kb.add.matches(event),
            BrowserAction::Refresh => kb.refresh.matches(event),
            BrowserAction::Export => kb.export.matches(event),
            BrowserAction::Edit => kb.edit.matches(event),
            BrowserAction::Delete => kb.delete.matches(event),
            BrowserAction::Actions => kb.actions.matches(event),
            BrowserAction::Filter => kb.filter.matches(event),
            BrowserAction::ClearFilters => kb.clear_filters.matches(event),
            BrowserAction::NextPage => kb.next_page.matches(event),
            BrowserAction::PreviousPage => kb.previous_page.matches(event),
        }
    }

    pub fn display_browser(&self, action: BrowserAction) -> String {
        let kb = &self.keybindings.browser;
        match action {
            BrowserAction::Add => kb.add.display(),
            BrowserAction::Refresh => kb.refresh.display(),
            BrowserAction::Export => kb.export.display(),
            BrowserAction::Edit => kb.edit.display(),
            BrowserAction::Delete => kb.delete.display(),
            BrowserAction::Actions => kb.actions.display(),
            BrowserAction::Filter => kb.filter.display(),
            BrowserAction::ClearFilters => kb.clear_filters.display(),
            BrowserAction::NextPage => kb.next_page.display(),
            BrowserAction::PreviousPage => kb.previous_page.display(),
        }
    }

    // Editor actions
    pub fn matches_editor(&self, event: &KeyEvent, action: EditorAction) -> bool {
        let kb = &self.keybindings.editor;
        match action {
            EditorAction::NextField => kb.next_field.matches(event),
            EditorAction::PreviousField => kb.previous_field.matches(event),
            EditorAction::Submit => kb.submit.matches(event),
            EditorAction::Cancel => kb.cancel.matches(event),
        }
    }

    pub fn display_editor(&self, action: EditorAction) -> String {
        let kb = &self.keybindings.editor;
        match action {
            EditorAction::NextField => kb.next_field.display(),
            EditorAction::PreviousField => kb.previous_field.display(),
            EditorAction::Submit => kb.submit.display(),
            EditorAction::Cancel => kb.cancel.display(),
        }
    }

    // Dialog actions
    pub fn matches_dialog(&self, event: &KeyEvent, action: DialogAction) -> bool {
        let kb = &self.keybindings.dialog;
        match action {
            DialogAction::Confirm => kb.confirm.matches(event),
            DialogAction::Cancel => kb.cancel.matches(event),
            DialogAction::Dismiss => kb.dismiss.matches(event),
        }
    }

    pub fn display_dialog(&self, action: DialogAction) -> String {
        let kb = &self.keybindings.dialog;
        match action {
            DialogAction::Confirm => kb.confirm.display(),
            DialogAction::Cancel => kb.cancel.display(),
            DialogAction::Dismiss => kb.dismiss.display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;

    fn resolver() -> KeyResolver {
        KeyResolver::new(Arc::new(KeybindingsConfig::default()))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_default_browser_keys() {
        let resolver = resolver();
        assert!(resolver.matches_browser(&key(KeyCode::Char('n')), BrowserAction::Add));
        assert!(resolver.matches_browser(&key(KeyCode::Right), BrowserAction::NextPage));
        assert!(resolver.matches_browser(&key(KeyCode::Char('[')), BrowserAction::PreviousPage));
        assert!(resolver.matches_browser(&key(KeyCode::Enter), BrowserAction::Edit));
        assert!(!resolver.matches_browser(&key(KeyCode::Char('f')), BrowserAction::ClearFilters));
        assert!(resolver.matches_browser(
            &KeyEvent::new(KeyCode::Char('F'), KeyModifiers::SHIFT),
            BrowserAction::ClearFilters
        ));
    }

    #[test]
    fn test_editor_back_tab() {
        let resolver = resolver();
        assert!(resolver.matches_editor(
            &KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT),
            EditorAction::PreviousField
        ));
        assert_eq!(resolver.display_editor(EditorAction::Submit), "Enter");
    }
}
