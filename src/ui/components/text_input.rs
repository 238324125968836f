use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::Theme;
use crate::ui::{Component, EventResult, Result};

pub enum TextInputEvent {
    Changed(String),
    Submitted(String),
    Cancelled,
}

/// Single-line text input with a cursor.
///
/// The cursor is a char index, so multi-byte input edits correctly.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
    placeholder: Option<String>,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value);
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    fn delete_char_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    fn delete_char_at_cursor(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    fn delete_word_before_cursor(&mut self) {
        let chars: Vec<char> = self.value.chars().collect();
        let mut pos = self.cursor;
        while pos > 0 && chars[pos - 1] == ' ' {
            pos -= 1;
        }
        while pos > 0 && chars[pos - 1] != ' ' {
            pos -= 1;
        }
        let (start, end) = (self.byte_index(pos), self.byte_index(self.cursor));
        self.value.drain(start..end);
        self.cursor = pos;
    }

    /// The input as a single styled line, with a block cursor when focused.
    pub fn line(&self, theme: &Theme, focused: bool) -> Line<'static> {
        let input_style = Style::default().fg(theme.text());
        let cursor_style = Style::default()
            .fg(theme.base())
            .bg(theme.text())
            .add_modifier(Modifier::BOLD);
        let placeholder_style = Style::default().fg(theme.overlay0());

        if self.value.is_empty() {
            let placeholder = self.placeholder.clone().unwrap_or_default();
            return if focused {
                Line::from(vec![
                    Span::styled(" ", cursor_style),
                    Span::styled(placeholder, placeholder_style),
                ])
            } else {
                Line::from(Span::styled(placeholder, placeholder_style))
            };
        }

        if !focused {
            return Line::from(Span::styled(self.value.clone(), input_style));
        }

        let before: String = self.value.chars().take(self.cursor).collect();
        let at = self.value.chars().nth(self.cursor).unwrap_or(' ');
        let after: String = self.value.chars().skip(self.cursor + 1).collect();

        Line::from(vec![
            Span::styled(before, input_style),
            Span::styled(at.to_string(), cursor_style),
            Span::styled(after, input_style),
        ])
    }
}

impl Component for TextInput {
    type Output = TextInputEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        let before = self.value.clone();
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => return Ok(TextInputEvent::Submitted(self.value.clone()).into()),
            (KeyCode::Esc, _) => return Ok(TextInputEvent::Cancelled.into()),

            (KeyCode::Backspace, KeyModifiers::ALT) => self.delete_word_before_cursor(),
            (KeyCode::Backspace, _) => self.delete_char_before_cursor(),
            (KeyCode::Delete, _) => self.delete_char_at_cursor(),

            (KeyCode::Left, _) => self.cursor = self.cursor.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor = (self.cursor + 1).min(self.len()),
            (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => self.cursor = 0,
            (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                self.cursor = self.len();
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.clear(),

            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => self.insert_char(c),

            _ => return Ok(EventResult::Ignored),
        }

        if self.value == before {
            Ok(EventResult::Consumed)
        } else {
            Ok(TextInputEvent::Changed(self.value.clone()).into())
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        frame.render_widget(Paragraph::new(self.line(theme, true)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut TextInput, code: KeyCode) -> EventResult<TextInputEvent> {
        input
            .handle_key(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn test_typing_and_editing() {
        let mut input = TextInput::new();
        for c in "amoxicilin".chars() {
            press(&mut input, KeyCode::Char(c));
        }
        assert_eq!(input.value(), "amoxicilin");

        // Insert the missing 'l' before the final "in"
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Char('l'));
        assert_eq!(input.value(), "amoxicillin");

        press(&mut input, KeyCode::End);
        press(&mut input, KeyCode::Backspace);
        assert_eq!(input.value(), "amoxicilli");
    }

    #[test]
    fn test_multibyte_input() {
        let mut input = TextInput::new().with_value("Zoë");
        press(&mut input, KeyCode::Backspace);
        press(&mut input, KeyCode::Char('é'));
        assert_eq!(input.value(), "Zoé");
    }

    #[test]
    fn test_change_events() {
        let mut input = TextInput::new();
        assert!(matches!(
            press(&mut input, KeyCode::Char('a')),
            EventResult::Event(TextInputEvent::Changed(v)) if v == "a"
        ));
        assert!(matches!(press(&mut input, KeyCode::Left), EventResult::Consumed));
        assert!(matches!(
            press(&mut input, KeyCode::Enter),
            EventResult::Event(TextInputEvent::Submitted(v)) if v == "a"
        ));
        assert!(matches!(press(&mut input, KeyCode::Tab), EventResult::Ignored));
    }
}
