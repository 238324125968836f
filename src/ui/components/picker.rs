use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Clear, ListItem};

use crate::Theme;
use crate::config::{GlobalAction, KeyResolver};
use crate::ui::{Component, EventResult, List, ListEvent, ListRow, Result};

pub enum PickerEvent {
    Picked(usize),
    Cancelled,
}

#[derive(Clone)]
struct PickerItem {
    index: usize,
    label: String,
    current: bool,
}

impl ListRow for PickerItem {
    fn render_row(&self, theme: &Theme) -> ListItem<'static> {
        let style = if self.current {
            Style::default().fg(theme.green()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text())
        };
        ListItem::new(Span::styled(self.label.clone(), style))
    }
}

/// Popup list that picks one of a few labelled options.
pub struct Picker {
    title: String,
    list: List<PickerItem>,
    resolver: Arc<KeyResolver>,
}

impl Picker {
    pub fn new(title: impl Into<String>, labels: Vec<String>, resolver: Arc<KeyResolver>) -> Self {
        Self::with_current(title, labels, None, resolver)
    }

    /// Like [`Picker::new`], highlighting the option that is currently in effect.
    pub fn with_current(
        title: impl Into<String>,
        labels: Vec<String>,
        current: Option<usize>,
        resolver: Arc<KeyResolver>,
    ) -> Self {
        let items = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| PickerItem {
                index,
                label,
                current: current == Some(index),
            })
            .collect();
        Self {
            title: title.into(),
            list: List::new(items, resolver.clone()),
            resolver,
        }
    }
}

impl Component for Picker {
    type Output = PickerEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if self.resolver.matches_global(&key, GlobalAction::Back) {
            return Ok(PickerEvent::Cancelled.into());
        }
        Ok(match self.list.handle_key(key)? {
            EventResult::Event(ListEvent::Activated(item)) => PickerEvent::Picked(item.index).into(),
            // Modal: everything else stays here
            _ => EventResult::Consumed,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let height = u16::try_from(self.list.len()).unwrap_or(u16::MAX).saturating_add(2);
        let popup_area = area.centered(Constraint::Percentage(40), Constraint::Length(height.min(area.height)));
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.lavender()))
            .style(Style::default().bg(theme.base()));

        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);
        self.list.render(frame, inner, theme);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::config::keybindings::KeybindingsConfig;

    fn picker() -> Picker {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        Picker::new(
            "Status",
            vec!["All".into(), "Scheduled".into(), "Completed".into()],
            resolver,
        )
    }

    fn press(picker: &mut Picker, code: KeyCode) -> EventResult<PickerEvent> {
        picker.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    #[test]
    fn test_pick_second_option() {
        let mut picker = picker();
        press(&mut picker, KeyCode::Down);
        assert!(matches!(
            press(&mut picker, KeyCode::Enter),
            EventResult::Event(PickerEvent::Picked(1))
        ));
    }

    #[test]
    fn test_escape_cancels_and_other_keys_are_swallowed() {
        let mut picker = picker();
        assert!(matches!(press(&mut picker, KeyCode::Char('x')), EventResult::Consumed));
        assert!(matches!(
            press(&mut picker, KeyCode::Esc),
            EventResult::Event(PickerEvent::Cancelled)
        ));
    }
}
