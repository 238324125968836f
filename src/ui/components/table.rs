use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use crate::Theme;
use crate::browser::{
    ALL, BrowserState, BrowserView, ColumnDef, FilterDef, FilterOption, RowAction, RowCommand,
    Tone, derive,
};
use crate::config::{BrowserAction, KeyResolver, NavAction, SearchAction};
use crate::record::Record;
use crate::ui::{
    Component, EventResult, Keybinding, Picker, PickerEvent, Result, Spinner, TextInput,
    TextInputEvent,
};

const PLACEHOLDER: &str = "░░░░░░░░";

pub enum TableEvent<R: Record> {
    Refresh,
    Add,
    /// Every row passing search and filters, sorted, ignoring pagination.
    Export(Vec<R>),
    Edit(R),
    Delete(R),
    Action {
        label: &'static str,
        row: R,
        command: RowCommand<R::Field>,
    },
}

enum Overlay<R: Record> {
    Filters {
        filters: Vec<FilterDef<R::Field>>,
        picker: Picker,
    },
    FilterValues {
        filter: FilterDef<R::Field>,
        options: Vec<FilterOption>,
        picker: Picker,
    },
    Actions {
        row: R,
        actions: Vec<RowAction<R>>,
        picker: Picker,
    },
}

/// Record browser: search, filters, sort and paging over a shared row set.
///
/// The table never fetches or mutates anything itself. It reports what the
/// user asked for as a [`TableEvent`] and its page decides what to run.
pub struct DataTable<R: Record> {
    title: String,
    columns: Vec<ColumnDef<R>>,
    filters: Vec<FilterDef<R::Field>>,
    actions: Vec<RowAction<R>>,
    rows: Arc<[R]>,
    state: BrowserState<R::Field>,
    page_size: usize,
    loading: bool,
    refreshing: bool,
    error: Option<String>,
    searching: bool,
    search_input: TextInput,
    table_state: TableState,
    overlay: Option<Overlay<R>>,
    spinner: Spinner,
    resolver: Arc<KeyResolver>,
}

impl<R: Record> DataTable<R> {
    pub fn new(title: impl Into<String>, columns: Vec<ColumnDef<R>>, resolver: Arc<KeyResolver>) -> Self {
        let mut spinner = Spinner::new();
        spinner.set_label("Loading...");
        Self {
            title: title.into(),
            columns,
            filters: Vec::new(),
            actions: Vec::new(),
            rows: Arc::from(Vec::new()),
            state: BrowserState::new(),
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            loading: true,
            refreshing: false,
            error: None,
            searching: false,
            search_input: TextInput::new().with_placeholder("type to search"),
            table_state: TableState::default(),
            overlay: None,
            spinner,
            resolver,
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: Vec<FilterDef<R::Field>>) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_actions(mut self, actions: Vec<RowAction<R>>) -> Self {
        self.actions = actions;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Replace the row set after a successful fetch.
    pub fn set_rows(&mut self, rows: Arc<[R]>) {
        self.rows = rows;
        self.loading = false;
        self.refreshing = false;
        self.error = None;
        let total_pages = self.view().total_pages();
        self.state.clamp(total_pages);
        self.clamp_selection();
    }

    /// First load: nothing to show yet.
    pub fn set_loading(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Reload while the current rows stay visible.
    pub const fn set_refreshing(&mut self) {
        self.refreshing = true;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.loading = false;
        self.refreshing = false;
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[cfg(test)]
    pub const fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub const fn state(&self) -> &BrowserState<R::Field> {
        &self.state
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn view(&self) -> BrowserView<'_, R> {
        derive(&self.rows, &self.columns, &self.state, self.page_size)
    }

    /// Whether a popup or the search bar currently owns the keyboard.
    pub const fn is_capturing_input(&self) -> bool {
        self.searching || self.overlay.is_some()
    }

    pub fn selected(&self) -> Option<R> {
        let index = self.table_state.selected()?;
        self.view().page_rows().get(index).map(|row| (*row).clone())
    }

    /// Declared filters plus one derived from the rows for every filterable
    /// column that has none.
    pub fn filter_defs(&self) -> Vec<FilterDef<R::Field>> {
        let mut defs = self.filters.clone();
        for column in self.columns.iter().filter(|c| c.filterable) {
            if !defs.iter().any(|d| d.key == column.key) {
                defs.push(FilterDef::from_rows(column.key, column.label, &self.rows));
            }
        }
        defs
    }

    fn clamp_selection(&mut self) {
        let count = self.view().page_rows().len();
        let selected = match (count, self.table_state.selected()) {
            (0, _) => None,
            (_, None) => Some(0),
            (n, Some(i)) => Some(i.min(n - 1)),
        };
        self.table_state.select(selected);
    }

    fn reset_selection(&mut self) {
        self.table_state.select(None);
        self.clamp_selection();
    }

    fn has_data(&self) -> bool {
        !self.loading && self.error.is_none()
    }

    fn open_filter_picker(&mut self) -> EventResult<TableEvent<R>> {
        let mut filters = self.filter_defs();
        match filters.len() {
            0 => EventResult::Ignored,
            1 => {
                let filter = filters.remove(0);
                self.open_filter_values(filter);
                EventResult::Consumed
            }
            _ => {
                let labels = filters
                    .iter()
                    .map(|f| format!("{}: {}", f.label, self.current_filter_label(f)))
                    .collect();
                let picker = Picker::new("Filter by", labels, self.resolver.clone());
                self.overlay = Some(Overlay::Filters { filters, picker });
                EventResult::Consumed
            }
        }
    }

    fn open_filter_values(&mut self, filter: FilterDef<R::Field>) {
        let options = filter.picker_options();
        let current = self.state.filter_value(filter.key);
        let current_index = options.iter().position(|o| o.value == current);
        let labels = options.iter().map(|o| o.label.clone()).collect();
        let picker = Picker::with_current(&filter.label, labels, current_index, self.resolver.clone());
        self.overlay = Some(Overlay::FilterValues {
            filter,
            options,
            picker,
        });
    }

    fn current_filter_label(&self, filter: &FilterDef<R::Field>) -> String {
        match self.state.filter_value(filter.key) {
            ALL | "" => "All".to_string(),
            value => filter.label_for(value),
        }
    }

    fn open_action_menu(&mut self) -> EventResult<TableEvent<R>> {
        let Some(row) = self.selected() else {
            return EventResult::Ignored;
        };
        let actions: Vec<RowAction<R>> = self
            .actions
            .iter()
            .filter(|action| action.is_shown(&row))
            .cloned()
            .collect();
        if actions.is_empty() {
            return EventResult::Consumed;
        }
        let labels = actions.iter().map(|a| a.label.to_string()).collect();
        let picker = Picker::new("Actions", labels, self.resolver.clone());
        self.overlay = Some(Overlay::Actions {
            row,
            actions,
            picker,
        });
        EventResult::Consumed
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> Result<EventResult<TableEvent<R>>> {
        let Some(overlay) = self.overlay.as_mut() else {
            return Ok(EventResult::Ignored);
        };
        let picker = match overlay {
            Overlay::Filters { picker, .. }
            | Overlay::FilterValues { picker, .. }
            | Overlay::Actions { picker, .. } => picker,
        };
        let EventResult::Event(event) = picker.handle_key(key)? else {
            return Ok(EventResult::Consumed);
        };
        let Some(overlay) = self.overlay.take() else {
            return Ok(EventResult::Consumed);
        };

        let PickerEvent::Picked(index) = event else {
            return Ok(EventResult::Consumed);
        };
        match overlay {
            Overlay::Filters { mut filters, .. } => {
                if index < filters.len() {
                    let filter = filters.swap_remove(index);
                    self.open_filter_values(filter);
                }
                Ok(EventResult::Consumed)
            }
            Overlay::FilterValues {
                filter, options, ..
            } => {
                if let Some(option) = options.get(index) {
                    self.state.set_filter(filter.key, option.value.clone());
                    self.reset_selection();
                }
                Ok(EventResult::Consumed)
            }
            Overlay::Actions { row, actions, .. } => Ok(actions.get(index).map_or(
                EventResult::Consumed,
                |action| {
                    TableEvent::Action {
                        label: action.label,
                        command: (action.run)(&row),
                        row,
                    }
                    .into()
                },
            )),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<EventResult<TableEvent<R>>> {
        match self.search_input.handle_key(key)? {
            EventResult::Event(TextInputEvent::Changed(query)) => {
                self.state.set_search_query(query);
                self.reset_selection();
            }
            EventResult::Event(TextInputEvent::Submitted(_)) => self.searching = false,
            EventResult::Event(TextInputEvent::Cancelled) => {
                self.searching = false;
                self.search_input.clear();
                self.state.set_search_query("");
                self.reset_selection();
            }
            EventResult::Consumed | EventResult::Ignored => {}
        }
        // Search mode owns every key
        Ok(EventResult::Consumed)
    }

    fn move_selection(&mut self, key: KeyEvent) -> bool {
        let count = self.view().page_rows().len();
        if count == 0 {
            return false;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = if self.resolver.matches_nav(&key, NavAction::Down) {
            (current + 1).min(count - 1)
        } else if self.resolver.matches_nav(&key, NavAction::Up) {
            current.saturating_sub(1)
        } else if self.resolver.matches_nav(&key, NavAction::Home) {
            0
        } else if self.resolver.matches_nav(&key, NavAction::End) {
            count - 1
        } else {
            return false;
        };
        self.table_state.select(Some(next));
        true
    }

    fn sort_column(key: KeyEvent) -> Option<usize> {
        match (key.code, key.modifiers) {
            (KeyCode::Char(c @ '1'..='9'), KeyModifiers::NONE) => {
                c.to_digit(10).and_then(|d| usize::try_from(d).ok()).map(|d| d - 1)
            }
            _ => None,
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> EventResult<TableEvent<R>> {
        let r = self.resolver.clone();

        if let Some(index) = Self::sort_column(key) {
            if let Some(column) = self.columns.get(index).filter(|c| c.sortable) {
                self.state.toggle_sort(column.key);
                self.reset_selection();
            }
            return EventResult::Consumed;
        }
        if r.matches_search(&key, SearchAction::Toggle) {
            self.searching = true;
            self.search_input.set_value(self.state.search_query());
            return EventResult::Consumed;
        }
        if r.matches_search(&key, SearchAction::Exit) && !self.state.search_query().is_empty() {
            self.search_input.clear();
            self.state.set_search_query("");
            self.reset_selection();
            return EventResult::Consumed;
        }
        if r.matches_browser(&key, BrowserAction::Refresh) {
            return TableEvent::Refresh.into();
        }
        if r.matches_browser(&key, BrowserAction::Add) {
            return TableEvent::Add.into();
        }
        if r.matches_browser(&key, BrowserAction::Filter) {
            return self.open_filter_picker();
        }
        if r.matches_browser(&key, BrowserAction::ClearFilters) {
            if !self.state.has_active_filters() {
                return EventResult::Ignored;
            }
            self.state.clear_filters();
            self.reset_selection();
            return EventResult::Consumed;
        }

        if !self.has_data() {
            return EventResult::Ignored;
        }

        if r.matches_browser(&key, BrowserAction::Export) {
            let rows = self.view().matched().iter().map(|row| (*row).clone()).collect();
            return TableEvent::Export(rows).into();
        }
        if r.matches_browser(&key, BrowserAction::NextPage) {
            let total_pages = self.view().total_pages();
            self.state.next_page(total_pages);
            self.reset_selection();
            return EventResult::Consumed;
        }
        if r.matches_browser(&key, BrowserAction::PreviousPage) {
            self.state.previous_page();
            self.reset_selection();
            return EventResult::Consumed;
        }
        if r.matches_browser(&key, BrowserAction::Edit) {
            return self.selected().map_or(EventResult::Ignored, |row| TableEvent::Edit(row).into());
        }
        if r.matches_browser(&key, BrowserAction::Delete) {
            return self.selected().map_or(EventResult::Ignored, |row| TableEvent::Delete(row).into());
        }
        if r.matches_browser(&key, BrowserAction::Actions) {
            return self.open_action_menu();
        }
        if self.move_selection(key) {
            return EventResult::Consumed;
        }

        EventResult::Ignored
    }

    pub fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        let mut keybindings = vec![
            Keybinding::hint(r.display_search(SearchAction::Toggle), "Search"),
            Keybinding::hint(r.display_browser(BrowserAction::Filter), "Filter"),
            Keybinding::new("1-9", "Sort by column"),
            Keybinding::hint(r.display_browser(BrowserAction::Add), "Add"),
            Keybinding::hint(r.display_browser(BrowserAction::Edit), "Edit"),
            Keybinding::hint(r.display_browser(BrowserAction::Delete), "Delete"),
            Keybinding::hint(r.display_browser(BrowserAction::Actions), "Actions"),
            Keybinding::new(r.display_browser(BrowserAction::Refresh), "Refresh"),
            Keybinding::new(r.display_browser(BrowserAction::Export), "Export CSV"),
            Keybinding::new(r.display_browser(BrowserAction::NextPage), "Next page"),
            Keybinding::new(r.display_browser(BrowserAction::PreviousPage), "Previous page"),
        ];
        if self.state.has_active_filters() {
            keybindings.insert(
                2,
                Keybinding::hint(r.display_browser(BrowserAction::ClearFilters), "Clear filters"),
            );
        }
        keybindings
    }

    fn tone_color(tone: Tone, theme: &Theme) -> Color {
        match tone {
            Tone::Good => theme.green(),
            Tone::Warn => theme.peach(),
            Tone::Bad => theme.red(),
            Tone::Info => theme.blue(),
            Tone::Muted => theme.overlay1(),
        }
    }

    fn header_row(&self, theme: &Theme) -> Row<'static> {
        let sort = self.state.sort();
        let cells: Vec<Cell> = self
            .columns
            .iter()
            .map(|column| {
                let label = match sort {
                    Some(s) if s.key == column.key => format!("{} {}", column.label, s.direction.arrow()),
                    _ => column.label.to_string(),
                };
                Cell::from(label).style(Style::default().fg(theme.header()).add_modifier(Modifier::BOLD))
            })
            .collect();
        Row::new(cells).height(1).style(Style::default().bg(theme.surface0()))
    }

    fn widths(&self) -> Vec<Constraint> {
        self.columns.iter().map(|c| c.width).collect()
    }

    fn render_error(&self, frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Failed to load data",
                Style::default().fg(theme.red()).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(message.to_string(), Style::default().fg(theme.text()))),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "Press {} to retry",
                    self.resolver.display_browser(BrowserAction::Refresh)
                ),
                Style::default().fg(theme.overlay1()),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }

    fn render_loading(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let placeholder_style = Style::default().fg(theme.surface1());
        let rows = (0..self.page_size).map(|_| {
            Row::new(
                self.columns
                    .iter()
                    .map(|_| Cell::from(PLACEHOLDER).style(placeholder_style)),
            )
        });
        let table = Table::new(rows, self.widths()).header(self.header_row(theme));
        frame.render_widget(table, area);

        let [_, spinner_area, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);
        self.spinner.render(frame, spinner_area, theme);
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let guidance = if self.state.has_criteria() {
            "No records match your filters"
        } else {
            "No records exist yet"
        };
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "No data available",
                Style::default().fg(theme.subtext1()).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(guidance, Style::default().fg(theme.overlay1()))),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }

    fn render_rows(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let header = self.header_row(theme);
        let widths = self.widths();
        let view = derive(&self.rows, &self.columns, &self.state, self.page_size);
        let rows: Vec<Row> = view
            .page_rows()
            .iter()
            .map(|row| {
                Row::new(self.columns.iter().map(|column| {
                    let style = column
                        .tone_of(row)
                        .map_or_else(|| Style::default().fg(theme.text()), |tone| {
                            Style::default().fg(Self::tone_color(tone, theme))
                        });
                    Cell::from(column.display(row)).style(style)
                }))
            })
            .collect();

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(
                Style::default()
                    .bg(theme.selection_bg())
                    .fg(theme.lavender())
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_filter_bar(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut spans = vec![Span::styled("Filters: ", Style::default().fg(theme.overlay1()))];
        for filter in self.filter_defs() {
            let value = self.state.filter_value(filter.key);
            if value.is_empty() || value == ALL {
                continue;
            }
            spans.push(Span::styled(
                format!("{}={}", filter.label, filter.label_for(value)),
                Style::default().fg(theme.base()).bg(theme.lavender()),
            ));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!("({} to clear)", self.resolver.display_browser(BrowserAction::ClearFilters)),
            Style::default().fg(theme.overlay0()),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_search_bar(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let line = if self.searching {
            let mut spans = vec![Span::styled("/", Style::default().fg(theme.yellow()))];
            spans.extend(self.search_input.line(theme, true).spans);
            Line::from(spans)
        } else {
            Line::from(Span::styled(
                format!("/{}", self.state.search_query()),
                Style::default().fg(theme.subtext0()),
            ))
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let view = self.view();
        let enabled = Style::default().fg(theme.lavender()).add_modifier(Modifier::BOLD);
        let disabled = Style::default().fg(theme.surface2());

        let [results_area, pager_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(36)]).areas(area);

        frame.render_widget(
            Paragraph::new(view.results_line()).style(Style::default().fg(theme.subtext0())),
            results_area,
        );

        let pager = Line::from(vec![
            Span::styled("◀ Prev", if view.has_previous() { enabled } else { disabled }),
            Span::styled(
                format!("  {}  ", view.pager_line()),
                Style::default().fg(theme.text()),
            ),
            Span::styled("Next ▶", if view.has_next() { enabled } else { disabled }),
        ]);
        frame.render_widget(Paragraph::new(pager).alignment(Alignment::Right), pager_area);
    }
}

impl<R: Record> Component for DataTable<R> {
    type Output = TableEvent<R>;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if self.overlay.is_some() {
            return self.handle_overlay_key(key);
        }
        if self.searching {
            return self.handle_search_key(key);
        }
        Ok(self.handle_browse_key(key))
    }

    fn handle_tick(&mut self) {
        self.spinner.handle_tick();
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut title = vec![Span::styled(
            format!(" {} ", self.title),
            Style::default().fg(theme.mauve()).add_modifier(Modifier::BOLD),
        )];
        if self.refreshing {
            title.push(Span::styled("⟳ refreshing ", Style::default().fg(theme.yellow())));
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()))
            .title(Line::from(title));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let show_filters = self.state.has_active_filters();
        let show_search = self.searching || !self.state.search_query().is_empty();
        let [filter_area, body_area, search_area, footer_area] = Layout::vertical([
            Constraint::Length(u16::from(show_filters)),
            Constraint::Min(0),
            Constraint::Length(u16::from(show_search)),
            Constraint::Length(1),
        ])
        .areas(inner);

        if show_filters {
            self.render_filter_bar(frame, filter_area, theme);
        }
        if show_search {
            self.render_search_bar(frame, search_area, theme);
        }

        if let Some(message) = self.error.clone() {
            self.render_error(frame, body_area, &message, theme);
            return;
        }
        if self.loading {
            self.render_loading(frame, body_area, theme);
            return;
        }
        if self.view().matched_count() == 0 {
            self.render_empty(frame, body_area, theme);
        } else {
            self.render_rows(frame, body_area, theme);
        }
        self.render_footer(frame, footer_area, theme);

        if let Some(overlay) = self.overlay.as_mut() {
            match overlay {
                Overlay::Filters { picker, .. }
                | Overlay::FilterValues { picker, .. }
                | Overlay::Actions { picker, .. } => picker.render(frame, area, theme),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::eyre;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::browser::state::{Sort, SortDirection};
    use crate::config::keybindings::KeybindingsConfig;
    use crate::record::{FieldKey, Patch, Value};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Field {
        Name,
        Ward,
        Age,
    }

    impl FieldKey for Field {
        fn name(self) -> &'static str {
            match self {
                Self::Name => "name",
                Self::Ward => "ward",
                Self::Age => "age",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Patient {
        id: String,
        name: String,
        ward: String,
        age: u32,
    }

    impl Record for Patient {
        type Field = Field;

        fn id(&self) -> &str {
            &self.id
        }

        fn value(&self, field: Field) -> Option<Value> {
            Some(match field {
                Field::Name => Value::text(&self.name),
                Field::Ward => Value::text(&self.ward),
                Field::Age => Value::from(self.age),
            })
        }

        fn from_patch(_id: String, _patch: &Patch<Field>) -> color_eyre::Result<Self> {
            Err(eyre!("not used"))
        }

        fn apply(&mut self, _patch: &Patch<Field>) -> color_eyre::Result<()> {
            Ok(())
        }
    }

    fn patient(n: u32, name: &str, ward: &str) -> Patient {
        Patient {
            id: format!("p-{n}"),
            name: name.to_string(),
            ward: ward.to_string(),
            age: 20 + n,
        }
    }

    fn patients() -> Arc<[Patient]> {
        Arc::from(vec![
            patient(1, "Ada Lovelace", "North"),
            patient(2, "Alan Turing", "South"),
            patient(3, "Grace Hopper", "North"),
            patient(4, "Edsger Dijkstra", "East"),
            patient(5, "Barbara Liskov", "South"),
        ])
    }

    fn table() -> DataTable<Patient> {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        let columns = vec![
            ColumnDef::new(Field::Name, "Name", Constraint::Fill(2)),
            ColumnDef::new(Field::Ward, "Ward", Constraint::Fill(1)).filterable(),
            ColumnDef::new(Field::Age, "Age", Constraint::Length(5)),
        ];
        let actions = vec![
            RowAction::edit(),
            RowAction::new("Move to East", |_| {
                RowCommand::Update(Patch::from([(Field::Ward, Value::text("East"))]))
            })
            .when(|p: &Patient| p.ward != "East"),
            RowAction::delete(),
        ];
        DataTable::new("Patients", columns, resolver)
            .with_actions(actions)
            .with_page_size(2)
    }

    fn loaded() -> DataTable<Patient> {
        let mut table = table();
        table.set_rows(patients());
        table
    }

    fn press(table: &mut DataTable<Patient>, code: KeyCode) -> EventResult<TableEvent<Patient>> {
        let modifiers = match code {
            KeyCode::Char(c) if c.is_ascii_uppercase() => KeyModifiers::SHIFT,
            _ => KeyModifiers::NONE,
        };
        table.handle_key(KeyEvent::new(code, modifiers)).unwrap()
    }

    fn type_text(table: &mut DataTable<Patient>, text: &str) {
        for c in text.chars() {
            press(table, KeyCode::Char(c));
        }
    }

    fn screen(table: &mut DataTable<Patient>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 16)).unwrap();
        terminal
            .draw(|frame| table.render(frame, frame.area(), &Theme::default()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[test]
    fn test_loading_never_renders_rows() {
        let mut table = loaded();
        table.set_loading();

        let text = screen(&mut table);
        assert!(text.contains("Loading..."));
        assert!(!text.contains("Ada Lovelace"));
        assert!(!text.contains("Showing"));
    }

    #[test]
    fn test_error_state_differs_from_empty_state() {
        let mut table = table();
        table.set_error("connection refused");
        let error = screen(&mut table);
        assert!(error.contains("Failed to load data"));
        assert!(error.contains("connection refused"));
        assert!(error.contains("Press r to retry"));
        assert!(!error.contains("No data available"));

        table.set_rows(Arc::from(Vec::new()));
        let empty = screen(&mut table);
        assert!(empty.contains("No data available"));
        assert!(empty.contains("No records exist yet"));
        assert!(!empty.contains("Failed to load data"));
        assert_eq!(empty, screen(&mut table));
    }

    #[test]
    fn test_search_without_matches_explains_why() {
        let mut table = loaded();
        press(&mut table, KeyCode::Char('/'));
        type_text(&mut table, "zzz");
        let text = screen(&mut table);
        assert!(text.contains("No records match your filters"));
    }

    #[test]
    fn test_rows_and_result_lines() {
        let mut table = loaded();
        let text = screen(&mut table);
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("Alan Turing"));
        assert!(!text.contains("Grace Hopper"));
        assert!(text.contains("Showing 2 of 5 results"));
        assert!(text.contains("Page 1 of 3"));

        press(&mut table, KeyCode::Char('/'));
        type_text(&mut table, "RA");
        press(&mut table, KeyCode::Enter);
        let text = screen(&mut table);
        assert!(text.contains("Showing 2 of 3 results (filtered from 5)"));
        assert_eq!(table.state().search_query(), "RA");
        assert!(!table.is_capturing_input());
    }

    #[test]
    fn test_escape_in_search_clears_query() {
        let mut table = loaded();
        press(&mut table, KeyCode::Char('/'));
        type_text(&mut table, "grace");
        assert_eq!(table.view().matched_count(), 1);

        press(&mut table, KeyCode::Esc);
        assert_eq!(table.state().search_query(), "");
        assert_eq!(table.view().matched_count(), 5);
        assert!(!table.is_capturing_input());
    }

    #[test]
    fn test_number_keys_sort_and_toggle() {
        let mut table = loaded();
        press(&mut table, KeyCode::Char('1'));
        assert_eq!(
            table.state().sort(),
            Some(Sort {
                key: Field::Name,
                direction: SortDirection::Asc
            })
        );
        assert_eq!(table.selected().map(|p| p.name), Some("Ada Lovelace".into()));

        press(&mut table, KeyCode::Char('1'));
        assert_eq!(table.selected().map(|p| p.name), Some("Grace Hopper".into()));
        assert!(screen(&mut table).contains("Name ▼"));

        // No fourth column
        assert!(matches!(press(&mut table, KeyCode::Char('4')), EventResult::Consumed));
    }

    #[test]
    fn test_paging_keys_stop_at_bounds() {
        let mut table = loaded();
        press(&mut table, KeyCode::Char('['));
        assert_eq!(table.state().current_page(), 1);

        for _ in 0..5 {
            press(&mut table, KeyCode::Char(']'));
        }
        assert_eq!(table.state().current_page(), 3);
        assert_eq!(table.selected().map(|p| p.id), Some("p-5".into()));
    }

    #[test]
    fn test_filter_picker_sets_and_clears_filter() {
        let mut table = loaded();
        press(&mut table, KeyCode::Char(']'));

        // Single filter opens its values directly: All, East, North, South
        press(&mut table, KeyCode::Char('f'));
        assert!(table.is_capturing_input());
        press(&mut table, KeyCode::Down);
        press(&mut table, KeyCode::Down);
        press(&mut table, KeyCode::Enter);

        assert_eq!(table.state().filter_value(Field::Ward), "North");
        assert_eq!(table.state().current_page(), 1);
        assert_eq!(table.view().matched_count(), 2);
        assert!(screen(&mut table).contains("Ward=North"));

        assert!(matches!(press(&mut table, KeyCode::Char('F')), EventResult::Consumed));
        assert_eq!(table.view().matched_count(), 5);
        assert!(matches!(press(&mut table, KeyCode::Char('F')), EventResult::Ignored));
    }

    #[test]
    fn test_export_ignores_pagination() {
        let mut table = loaded();
        press(&mut table, KeyCode::Char('3'));
        press(&mut table, KeyCode::Char('3'));

        let EventResult::Event(TableEvent::Export(rows)) = press(&mut table, KeyCode::Char('x'))
        else {
            panic!("expected an export");
        };
        let ids: Vec<_> = rows.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p-5", "p-4", "p-3", "p-2", "p-1"]);
    }

    #[test]
    fn test_row_events() {
        let mut table = loaded();
        press(&mut table, KeyCode::Down);
        assert!(matches!(
            press(&mut table, KeyCode::Char('e')),
            EventResult::Event(TableEvent::Edit(p)) if p.id == "p-2"
        ));
        assert!(matches!(
            press(&mut table, KeyCode::Char('d')),
            EventResult::Event(TableEvent::Delete(p)) if p.id == "p-2"
        ));
        assert!(matches!(press(&mut table, KeyCode::Char('n')), EventResult::Event(TableEvent::Add)));
        assert!(matches!(
            press(&mut table, KeyCode::Char('r')),
            EventResult::Event(TableEvent::Refresh)
        ));
    }

    #[test]
    fn test_action_menu_lists_only_shown_actions() {
        let mut table = loaded();
        // Edsger is already in East, so the move action is hidden
        table.set_rows(Arc::from(vec![patient(4, "Edsger Dijkstra", "East")]));
        press(&mut table, KeyCode::Char('a'));
        press(&mut table, KeyCode::Down);
        assert!(matches!(
            press(&mut table, KeyCode::Enter),
            EventResult::Event(TableEvent::Action { label: "Delete", command: RowCommand::Delete, .. })
        ));

        table.set_rows(patients());
        press(&mut table, KeyCode::Char('a'));
        press(&mut table, KeyCode::Down);
        let EventResult::Event(TableEvent::Action { row, command, .. }) =
            press(&mut table, KeyCode::Enter)
        else {
            panic!("expected an action");
        };
        assert_eq!(row.id, "p-1");
        assert_eq!(
            command,
            RowCommand::Update(Patch::from([(Field::Ward, Value::text("East"))]))
        );
    }

    #[test]
    fn test_refresh_clamps_page() {
        let mut table = loaded();
        press(&mut table, KeyCode::Char(']'));
        press(&mut table, KeyCode::Char(']'));
        assert_eq!(table.state().current_page(), 3);

        table.set_refreshing();
        assert!(screen(&mut table).contains("refreshing"));
        table.set_rows(Arc::from(vec![patient(1, "Ada Lovelace", "North")]));
        assert_eq!(table.state().current_page(), 1);
        assert!(!table.is_refreshing());
    }
}
