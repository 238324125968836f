use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::prelude::{Modifier, Style};
use ratatui::widgets::{List as RatatuiList, ListItem, ListState};

use crate::Theme;
use crate::config::{KeyResolver, NavAction};
use crate::ui::{Component, EventResult, Result};

pub enum ListEvent<T> {
    Changed(T),
    Activated(T),
}

pub trait ListRow {
    fn render_row(&self, theme: &Theme) -> ListItem<'static>;
}

pub struct List<T: ListRow + Clone> {
    items: Vec<T>,
    state: ListState,
    resolver: Arc<KeyResolver>,
}

impl<T: ListRow + Clone> List<T> {
    pub fn new(items: Vec<T>, resolver: Arc<KeyResolver>) -> Self {
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(0));
        }
        Self {
            items,
            state,
            resolver,
        }
    }

    pub fn selected(&self) -> Option<&T> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn get_change_event(&self, before: Option<usize>) -> EventResult<ListEvent<T>> {
        if let Some(selected) = self.state.selected()
            && Some(selected) != before
            && let Some(item) = self.items.get(selected)
        {
            return ListEvent::Changed(item.clone()).into();
        }
        EventResult::Consumed
    }
}

impl<T: ListRow + Clone> Component for List<T> {
    type Output = ListEvent<T>;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        let before = self.state.selected();

        if self.resolver.matches_nav(&key, NavAction::Down) {
            let last = self.items.len().saturating_sub(1);
            if !self.items.is_empty() {
                self.state
                    .select(Some(self.state.selected().map_or(0, |i| (i + 1).min(last))));
            }
            return Ok(self.get_change_event(before));
        }
        if self.resolver.matches_nav(&key, NavAction::Up) {
            self.state.select_previous();
            return Ok(self.get_change_event(before));
        }
        if self.resolver.matches_nav(&key, NavAction::Home) {
            self.state.select_first();
            return Ok(self.get_change_event(before));
        }
        if self.resolver.matches_nav(&key, NavAction::End) {
            self.state.select(self.items.len().checked_sub(1));
            return Ok(self.get_change_event(before));
        }
        if self.resolver.matches_nav(&key, NavAction::PageDown) {
            let step = 5;
            let new_index = match self.state.selected() {
                Some(i) => usize::min(i + step, self.items.len().saturating_sub(1)),
                None => 0,
            };
            self.state.select(Some(new_index));
            return Ok(self.get_change_event(before));
        }
        if self.resolver.matches_nav(&key, NavAction::PageUp) {
            let step = 5;
            let new_index = self.state.selected().map_or(0, |i| i.saturating_sub(step));
            self.state.select(Some(new_index));
            return Ok(self.get_change_event(before));
        }
        if self.resolver.matches_nav(&key, NavAction::Select) {
            return Ok(self
                .selected()
                .map_or(EventResult::Ignored, |item| ListEvent::Activated(item.clone()).into()));
        }

        Ok(EventResult::Ignored)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let items: Vec<ListItem> = self.items.iter().map(|i| i.render_row(theme)).collect();

        let list = RatatuiList::new(items)
            .highlight_style(
                Style::default()
                    .bg(theme.selection_bg())
                    .fg(theme.lavender())
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::config::keybindings::KeybindingsConfig;

    #[derive(Clone, Debug, PartialEq)]
    struct Ward(&'static str);

    impl ListRow for Ward {
        fn render_row(&self, _theme: &Theme) -> ListItem<'static> {
            ListItem::new(self.0)
        }
    }

    fn list() -> List<Ward> {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        List::new(vec![Ward("North"), Ward("South"), Ward("East")], resolver)
    }

    fn press(list: &mut List<Ward>, code: KeyCode) -> EventResult<ListEvent<Ward>> {
        list.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    #[test]
    fn test_navigation_reports_changes() {
        let mut list = list();
        assert!(matches!(
            press(&mut list, KeyCode::Down),
            EventResult::Event(ListEvent::Changed(Ward("South")))
        ));
        assert!(matches!(
            press(&mut list, KeyCode::End),
            EventResult::Event(ListEvent::Changed(Ward("East")))
        ));
        assert!(matches!(press(&mut list, KeyCode::End), EventResult::Consumed));
    }

    #[test]
    fn test_select_activates_current_item() {
        let mut list = list();
        press(&mut list, KeyCode::Down);
        assert!(matches!(
            press(&mut list, KeyCode::Enter),
            EventResult::Event(ListEvent::Activated(Ward("South")))
        ));
    }
}
