use crossterm::event::KeyCode;
use serde::{Deserialize, Serialize};

use crate::config::key::{Key, KeyBinding};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalKeybindings {
    pub quit: KeyBinding,
    pub help: KeyBinding,
    pub theme: KeyBinding,
    pub back: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationKeybindings {
    pub up: KeyBinding,
    pub down: KeyBinding,
    pub page_up: KeyBinding,
    pub page_down: KeyBinding,
    pub home: KeyBinding,
    pub end: KeyBinding,
    pub select: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchKeybindings {
    pub toggle: KeyBinding,
    pub exit: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserKeybindings {
    pub add: KeyBinding,
    pub refresh: KeyBinding,
    pub export: KeyBinding,
    pub edit: KeyBinding,
    pub delete: KeyBinding,
    pub actions: KeyBinding,
    pub filter: KeyBinding,
    pub clear_filters: KeyBinding,
    pub next_page: KeyBinding,
    pub previous_page: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorKeybindings {
    pub next_field: KeyBinding,
    pub previous_field: KeyBinding,
    pub submit: KeyBinding,
    pub cancel: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogKeybindings {
    pub confirm: KeyBinding,
    pub cancel: KeyBinding,
    pub dismiss: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub global: GlobalKeybindings,
    pub navigation: NavigationKeybindings,
    pub search: SearchKeybindings,
    pub browser: BrowserKeybindings,
    pub editor: EditorKeybindings,
    pub dialog: DialogKeybindings,
}

impl Default for GlobalKeybindings {
    fn default() -> Self {
        Self {
            quit: Key::new(KeyCode::Char('q')).into(),
            help: Key::new(KeyCode::Char('?')).into(),
            theme: Key::new(KeyCode::Char('t')).into(),
            back: Key::new(KeyCode::Esc).into(),
        }
    }
}

impl Default for NavigationKeybindings {
    fn default() -> Self {
        Self {
            up: KeyBinding::multiple(vec![Key::new(KeyCode::Char('k')), Key::new(KeyCode::Up)]),
            down: KeyBinding::multiple(vec![Key::new(KeyCode::Char('j')), Key::new(KeyCode::Down)]),
            page_up: Key::new(KeyCode::PageUp).into(),
            page_down: Key::new(KeyCode::PageDown).into(),
            home: KeyBinding::multiple(vec![Key::new(KeyCode::Char('g')), Key::new(KeyCode::Home)]),
            end: KeyBinding::multiple(vec![Key::new(KeyCode::Char('G')), Key::new(KeyCode::End)]),
            select: Key::new(KeyCode::Enter).into(),
        }
    }
}

impl Default for SearchKeybindings {
    fn default() -> Self {
        Self {
            toggle: Key::new(KeyCode::Char('/')).into(),
            exit: Key::new(KeyCode::Esc).into(),
        }
    }
}

impl Default for BrowserKeybindings {
    fn default() -> Self {
        Self {
            add: Key::new(KeyCode::Char('n')).into(),
            refresh: Key::new(KeyCode::Char('r')).into(),
            export: Key::new(KeyCode::Char('x')).into(),
            edit: KeyBinding::multiple(vec![Key::new(KeyCode::Char('e')), Key::new(KeyCode::Enter)]),
            delete: KeyBinding::multiple(vec![
                Key::new(KeyCode::Char('d')),
                Key::new(KeyCode::Delete),
            ]),
            actions: Key::new(KeyCode::Char('a')).into(),
            filter: Key::new(KeyCode::Char('f')).into(),
            clear_filters: Key::new(KeyCode::Char('F')).into(),
            next_page: KeyBinding::multiple(vec![
                Key::new(KeyCode::Char(']')),
                Key::new(KeyCode::Right),
            ]),
            previous_page: KeyBinding::multiple(vec![
                Key::new(KeyCode::Char('[')),
                Key::new(KeyCode::Left),
            ]),
        }
    }
}

impl Default for EditorKeybindings {
    fn default() -> Self {
        Self {
            next_field: KeyBinding::multiple(vec![Key::new(KeyCode::Tab), Key::new(KeyCode::Down)]),
            previous_field: KeyBinding::multiple(vec![
                Key::with_shift(KeyCode::BackTab),
                Key::new(KeyCode::BackTab),
                Key::new(KeyCode::Up),
            ]),
            submit: Key::new(KeyCode::Enter).into(),
            cancel: Key::new(KeyCode::Esc).into(),
        }
    }
}

impl Default for DialogKeybindings {
    fn default() -> Self {
        Self {
            confirm: KeyBinding::multiple(vec![
                Key::new(KeyCode::Char('y')),
                Key::new(KeyCode::Char('Y')),
                Key::new(KeyCode::Enter),
            ]),
            cancel: KeyBinding::multiple(vec![
                Key::new(KeyCode::Char('n')),
                Key::new(KeyCode::Char('N')),
                Key::new(KeyCode::Esc),
            ]),
            dismiss: KeyBinding::multiple(vec![
                Key::new(KeyCode::Enter),
                Key::new(KeyCode::Esc),
                Key::new(KeyCode::Char('q')),
            ]),
        }
    }
}
