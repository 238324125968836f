use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, ListItem, Paragraph};

use crate::Theme;
use crate::config::{KeyResolver, NavAction, SearchAction};
use crate::registry::{PageId, PageProvider, PageRegistry};
use crate::search::Matcher;
use crate::ui::{
    Component, EventResult, Keybinding, List, ListEvent, ListRow, Result, TextInput,
    TextInputEvent,
};

#[derive(Clone)]
struct PageItem {
    provider: Arc<dyn PageProvider>,
}

impl PageItem {
    fn matches(&self, query: &str) -> bool {
        Matcher::new().matches_any(
            [
                self.provider.display_name(),
                self.provider.key(),
                self.provider.description(),
            ],
            query,
        )
    }
}

impl ListRow for PageItem {
    fn render_row(&self, theme: &Theme) -> ListItem<'static> {
        let name = self.provider.icon().map_or_else(
            || self.provider.display_name().to_string(),
            |icon| format!("{icon} {}", self.provider.display_name()),
        );
        ListItem::new(Line::from(vec![
            Span::styled(
                format!("{name:<24}"),
                Style::default().fg(theme.text()).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.provider.description().to_string(),
                Style::default().fg(theme.subtext0()),
            ),
        ]))
    }
}

/// Searchable list of the registered pages.
pub struct PageSelectorView {
    items: Vec<PageItem>,
    list: List<PageItem>,
    search: TextInput,
    searching: bool,
    resolver: Arc<KeyResolver>,
}

impl PageSelectorView {
    #[must_use]
    pub fn new(registry: &PageRegistry, resolver: Arc<KeyResolver>) -> Self {
        let items: Vec<PageItem> = registry
            .providers()
            .iter()
            .map(|provider| PageItem {
                provider: provider.clone(),
            })
            .collect();

        Self {
            list: List::new(items.clone(), resolver.clone()),
            items,
            search: TextInput::new().with_placeholder("type to search"),
            searching: false,
            resolver,
        }
    }

    pub const fn is_searching(&self) -> bool {
        self.searching
    }

    fn apply_query(&mut self) {
        let query = self.search.value();
        let visible = self
            .items
            .iter()
            .filter(|item| item.matches(query))
            .cloned()
            .collect();
        self.list = List::new(visible, self.resolver.clone());
    }

    pub fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        vec![
            Keybinding::hint(r.display_nav(NavAction::Select), "Open"),
            Keybinding::hint(r.display_search(SearchAction::Toggle), "Search"),
        ]
    }
}

impl Component for PageSelectorView {
    type Output = PageId;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if self.searching {
            match self.search.handle_key(key)? {
                EventResult::Event(TextInputEvent::Changed(_)) => self.apply_query(),
                EventResult::Event(TextInputEvent::Submitted(_)) => self.searching = false,
                EventResult::Event(TextInputEvent::Cancelled) => {
                    self.searching = false;
                    self.search.clear();
                    self.apply_query();
                }
                EventResult::Consumed | EventResult::Ignored => {}
            }
            return Ok(EventResult::Consumed);
        }

        if self.resolver.matches_search(&key, SearchAction::Toggle) {
            self.searching = true;
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_search(&key, SearchAction::Exit) && !self.search.value().is_empty() {
            self.search.clear();
            self.apply_query();
            return Ok(EventResult::Consumed);
        }

        Ok(match self.list.handle_key(key)? {
            EventResult::Event(ListEvent::Activated(item)) => item.provider.page_id().into(),
            EventResult::Consumed | EventResult::Event(ListEvent::Changed(_)) => {
                EventResult::Consumed
            }
            EventResult::Ignored => EventResult::Ignored,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .title(" Pages ")
            .title_style(Style::default().fg(theme.mauve()).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let show_search = self.searching || !self.search.value().is_empty();
        let [list_area, search_area] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(u16::from(show_search)),
        ])
        .areas(inner);

        if self.list.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "No pages match your search",
                    Style::default().fg(theme.subtext0()),
                )),
                list_area,
            );
        } else {
            self.list.render(frame, list_area, theme);
        }

        if show_search {
            let mut line = vec![Span::styled("/ ", Style::default().fg(theme.yellow()))];
            line.extend(self.search.line(theme, self.searching).spans);
            frame.render_widget(Paragraph::new(Line::from(line)), search_area);
        }
    }
}
