use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::Theme;
use crate::config::{EditorAction, KeyResolver};
use crate::editor::{Editor, FieldDef, FieldKind, Input, Mode, SessionId, Submission};
use crate::record::{FieldKey, Record};
use crate::ui::{Component, EventResult, Keybinding, Result};

const LABEL_WIDTH: usize = 16;

pub enum EditorEvent<K> {
    Submit {
        session: SessionId,
        submission: Submission<K>,
    },
    Cancelled,
}

/// Modal form around an [`Editor`].
pub struct EditorDialog<K> {
    noun: &'static str,
    editor: Editor<K>,
    resolver: Arc<KeyResolver>,
}

impl<K: FieldKey> EditorDialog<K> {
    pub const fn new(noun: &'static str, fields: Vec<FieldDef<K>>, resolver: Arc<KeyResolver>) -> Self {
        Self {
            noun,
            editor: Editor::new(fields),
            resolver,
        }
    }

    pub fn open_create(&mut self) -> SessionId {
        self.editor.open_create()
    }

    pub fn open_edit<R: Record<Field = K>>(&mut self, record: &R) -> SessionId {
        self.editor.open_edit(record)
    }

    pub const fn is_open(&self) -> bool {
        self.editor.is_open()
    }

    pub const fn editor(&self) -> &Editor<K> {
        &self.editor
    }

    pub const fn editor_mut(&mut self) -> &mut Editor<K> {
        &mut self.editor
    }

    fn edit_focused(&mut self, key: KeyEvent) -> Result<EventResult<EditorEvent<K>>> {
        let focus = self.editor.focus();
        let Some(draft) = self.editor.draft_mut() else {
            return Ok(EventResult::Ignored);
        };
        let kind = draft.fields().get(focus).map(|(def, _)| def.kind);
        let Some(input) = draft.input_mut(focus) else {
            return Ok(EventResult::Consumed);
        };

        match (input, kind) {
            (Input::Text(text), _) => {
                text.handle_key(key)?;
            }
            (Input::Toggle(on), _) => {
                if matches!(key.code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                    *on = !*on;
                }
            }
            (Input::Choice(index), Some(FieldKind::Choice(options))) => {
                let count = options.len().max(1);
                match key.code {
                    KeyCode::Left => *index = (*index + count - 1) % count,
                    KeyCode::Right | KeyCode::Char(' ') => *index = (*index + 1) % count,
                    _ => {}
                }
            }
            (Input::Choice(_), _) => {}
        }
        Ok(EventResult::Consumed)
    }

    fn field_line(&self, def: &FieldDef<K>, input: &Input, focused: bool, theme: &Theme) -> Line<'static> {
        let marker = if focused { "▶ " } else { "  " };
        let label = if def.required {
            format!("{}*", def.label)
        } else {
            def.label.to_string()
        };
        let label_style = if focused {
            Style::default().fg(theme.lavender()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.subtext0())
        };

        let mut spans = vec![
            Span::styled(marker, Style::default().fg(theme.lavender())),
            Span::styled(format!("{label:>LABEL_WIDTH$}"), label_style),
            Span::raw("  "),
        ];

        match (input, def.kind) {
            (Input::Text(text), _) => spans.extend(text.line(theme, focused).spans),
            (Input::Toggle(on), _) => {
                let (mark, text, color) = if *on {
                    ("[x]", "Yes", theme.green())
                } else {
                    ("[ ]", "No", theme.overlay1())
                };
                spans.push(Span::styled(format!("{mark} {text}"), Style::default().fg(color)));
            }
            (Input::Choice(index), FieldKind::Choice(options)) => {
                let label = options.get(*index).map_or("", |(_, l)| l);
                spans.push(Span::styled(
                    format!("◀ {label} ▶"),
                    Style::default().fg(theme.text()),
                ));
            }
            (Input::Choice(_), _) => {}
        }
        Line::from(spans)
    }

    pub fn keybindings(&self) -> Vec<Keybinding> {
        vec![
            Keybinding::hint(self.resolver.display_editor(EditorAction::Submit), "Save"),
            Keybinding::hint(self.resolver.display_editor(EditorAction::Cancel), "Cancel"),
            Keybinding::hint(self.resolver.display_editor(EditorAction::NextField), "Next field"),
            Keybinding::new(
                self.resolver.display_editor(EditorAction::PreviousField),
                "Previous field",
            ),
            Keybinding::new("Left/Right", "Change choice"),
        ]
    }
}

impl<K: FieldKey> Component for EditorDialog<K> {
    type Output = EditorEvent<K>;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if !self.editor.is_open() {
            return Ok(EventResult::Ignored);
        }

        if self.resolver.matches_editor(&key, EditorAction::Cancel) {
            self.editor.cancel();
            return Ok(EditorEvent::Cancelled.into());
        }
        if self.resolver.matches_editor(&key, EditorAction::Submit) {
            return Ok(match self.editor.submit() {
                Some((session, submission)) => EditorEvent::Submit { session, submission }.into(),
                None => EventResult::Consumed,
            });
        }
        if self.editor.is_submitting() {
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_editor(&key, EditorAction::NextField) {
            self.editor.focus_next();
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_editor(&key, EditorAction::PreviousField) {
            self.editor.focus_previous();
            return Ok(EventResult::Consumed);
        }

        self.edit_focused(key)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let Some(draft) = self.editor.draft() else {
            return;
        };

        let field_count = u16::try_from(draft.fields().len()).unwrap_or(u16::MAX);
        let popup_area = area.centered(
            Constraint::Percentage(60),
            Constraint::Length(field_count.saturating_add(7)),
        );
        frame.render_widget(Clear, popup_area);

        let focus = self.editor.focus();
        let mut lines = vec![Line::from("")];
        lines.extend(
            draft
                .fields()
                .iter()
                .enumerate()
                .map(|(i, (def, input))| self.field_line(def, input, i == focus, theme)),
        );
        lines.push(Line::from(""));

        if self.editor.is_submitting() {
            lines.push(Line::from(Span::styled(
                "  Saving...",
                Style::default().fg(theme.yellow()),
            )));
        } else if let Some(error) = self.editor.error() {
            lines.push(Line::from(Span::styled(
                format!("  {error}"),
                Style::default().fg(theme.red()).add_modifier(Modifier::BOLD),
            )));
        } else {
            lines.push(Line::from(""));
        }

        let hint_style = Style::default().fg(theme.overlay1());
        let submit_style = if self.editor.is_submitting() {
            Style::default().fg(theme.overlay0())
        } else {
            Style::default().fg(theme.green()).add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("  [{}]", self.resolver.display_editor(EditorAction::Submit)),
                Style::default().fg(theme.peach()),
            ),
            Span::styled(" Save", submit_style),
            Span::styled(
                format!("    [{}] Cancel", self.resolver.display_editor(EditorAction::Cancel)),
                hint_style,
            ),
        ]));

        let title = match self.editor.mode() {
            Some(Mode::Edit { id }) => format!(" Edit {} {id} ", self.noun),
            _ => format!(" New {} ", self.noun),
        };
        let block = Block::default()
            .title(title)
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.lavender()))
            .style(Style::default().bg(theme.base()));

        frame.render_widget(Paragraph::new(lines).block(block), popup_area);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::config::keybindings::KeybindingsConfig;
    use crate::record::Value;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Field {
        Name,
        Level,
        Urgent,
    }

    impl FieldKey for Field {
        fn name(self) -> &'static str {
            match self {
                Self::Name => "name",
                Self::Level => "level",
                Self::Urgent => "urgent",
            }
        }
    }

    const LEVELS: &[(&str, &str)] = &[("low", "Low"), ("mid", "Medium"), ("high", "High")];

    fn dialog() -> EditorDialog<Field> {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        EditorDialog::new(
            "Ticket",
            vec![
                FieldDef::text(Field::Name, "Name").required(),
                FieldDef::choice(Field::Level, "Level", LEVELS),
                FieldDef::toggle(Field::Urgent, "Urgent"),
            ],
            resolver,
        )
    }

    fn press(dialog: &mut EditorDialog<Field>, code: KeyCode) -> EventResult<EditorEvent<Field>> {
        dialog.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[test]
    fn test_keys_edit_the_draft_and_submit() {
        let mut dialog = dialog();
        dialog.open_create();

        for c in "Leak".chars() {
            press(&mut dialog, KeyCode::Char(c));
        }
        press(&mut dialog, KeyCode::Tab);
        press(&mut dialog, KeyCode::Right);
        press(&mut dialog, KeyCode::Right);
        press(&mut dialog, KeyCode::Down);
        press(&mut dialog, KeyCode::Char(' '));

        let EventResult::Event(EditorEvent::Submit { submission, .. }) =
            press(&mut dialog, KeyCode::Enter)
        else {
            panic!("expected a submit");
        };
        let Submission::Create(patch) = submission else {
            panic!("expected a create");
        };
        assert_eq!(patch.get(&Field::Name), Some(&Value::text("Leak")));
        assert_eq!(patch.get(&Field::Level), Some(&Value::text("high")));
        assert_eq!(patch.get(&Field::Urgent), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_second_enter_is_ignored_while_saving() {
        let mut dialog = dialog();
        dialog.open_create();
        press(&mut dialog, KeyCode::Char('x'));

        assert!(matches!(press(&mut dialog, KeyCode::Enter), EventResult::Event(_)));
        assert!(matches!(press(&mut dialog, KeyCode::Enter), EventResult::Consumed));
    }

    #[test]
    fn test_escape_cancels() {
        let mut dialog = dialog();
        dialog.open_create();
        assert!(matches!(
            press(&mut dialog, KeyCode::Esc),
            EventResult::Event(EditorEvent::Cancelled)
        ));
        assert!(!dialog.is_open());
    }

    #[test]
    fn test_failure_message_is_rendered() {
        let mut dialog = dialog();
        let session = dialog.open_create();
        press(&mut dialog, KeyCode::Char('x'));
        press(&mut dialog, KeyCode::Enter);
        dialog.editor_mut().fail(session, "Server rejected the record");

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| dialog.render(frame, frame.area(), &Theme::default()))
            .unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Server rejected the record"));
        assert!(text.contains("New Ticket"));
    }
}
