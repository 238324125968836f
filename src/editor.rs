//! Record editor: draft state, validation and submission sessions.
//!
//! An [`Editor`] holds at most one open session. Each open gets a fresh
//! [`SessionId`] so results of a save that finished after the user moved on
//! can be recognised and ignored. The key handling and drawing live in
//! [`dialog`].

pub mod dialog;

use chrono::{NaiveDate, NaiveDateTime};

use crate::record::{DATE_FORMAT, DATE_TIME_FORMAT, FieldKey, Patch, Record, Value};
use crate::ui::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Toggle,
    /// One of `(value, label)`.
    Choice(&'static [(&'static str, &'static str)]),
    Date,
    DateTime,
}

/// One editable field of the editor form.
#[derive(Debug, Clone)]
pub struct FieldDef<K> {
    pub key: K,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default: Option<Value>,
    pub required: bool,
    pub placeholder: Option<&'static str>,
}

impl<K: FieldKey> FieldDef<K> {
    pub const fn new(key: K, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            default: None,
            required: false,
            placeholder: None,
        }
    }

    pub const fn text(key: K, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    pub const fn number(key: K, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Number)
    }

    pub const fn toggle(key: K, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Toggle)
    }

    pub const fn choice(
        key: K,
        label: &'static str,
        options: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self::new(key, label, FieldKind::Choice(options))
    }

    pub const fn date(key: K, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Date).placeholder("YYYY-MM-DD")
    }

    pub const fn date_time(key: K, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::DateTime).placeholder("YYYY-MM-DD HH:MM")
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub const fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

/// Current input of one field.
#[derive(Debug, Clone)]
pub enum Input {
    Text(TextInput),
    Toggle(bool),
    Choice(usize),
}

impl Input {
    fn from_value<K>(def: &FieldDef<K>, value: Option<&Value>) -> Self {
        match def.kind {
            FieldKind::Toggle => Self::Toggle(value.and_then(Value::as_bool).unwrap_or(false)),
            FieldKind::Choice(options) => {
                let wanted = value.map(ToString::to_string);
                let index = wanted
                    .and_then(|w| options.iter().position(|(v, _)| *v == w))
                    .unwrap_or(0);
                Self::Choice(index)
            }
            FieldKind::Text | FieldKind::Number | FieldKind::Date | FieldKind::DateTime => {
                let mut input = TextInput::new();
                if let Some(placeholder) = def.placeholder {
                    input = input.with_placeholder(placeholder);
                }
                if let Some(value) = value {
                    input.set_value(value.to_string());
                }
                Self::Text(input)
            }
        }
    }
}

/// The mutable field inputs of an open editor.
#[derive(Debug, Clone)]
pub struct Draft<K> {
    fields: Vec<(FieldDef<K>, Input)>,
}

impl<K: FieldKey> Draft<K> {
    fn from_defaults(defs: &[FieldDef<K>]) -> Self {
        Self {
            fields: defs
                .iter()
                .map(|def| (def.clone(), Input::from_value(def, def.default.as_ref())))
                .collect(),
        }
    }

    fn from_record<R: Record<Field = K>>(defs: &[FieldDef<K>], record: &R) -> Self {
        Self {
            fields: defs
                .iter()
                .map(|def| {
                    let value = record.value(def.key);
                    (def.clone(), Input::from_value(def, value.as_ref()))
                })
                .collect(),
        }
    }

    pub fn fields(&self) -> &[(FieldDef<K>, Input)] {
        &self.fields
    }

    pub fn input_mut(&mut self, index: usize) -> Option<&mut Input> {
        self.fields.get_mut(index).map(|(_, input)| input)
    }

    /// Text currently entered for `key`, as the user sees it.
    #[cfg(test)]
    pub fn text(&self, key: K) -> Option<String> {
        self.fields
            .iter()
            .find(|(def, _)| def.key == key)
            .map(|(def, input)| match (input, def.kind) {
                (Input::Text(text), _) => text.value().to_string(),
                (Input::Toggle(on), _) => on.to_string(),
                (Input::Choice(i), FieldKind::Choice(options)) => {
                    options.get(*i).map(|(v, _)| (*v).to_string()).unwrap_or_default()
                }
                (Input::Choice(_), _) => String::new(),
            })
    }

    #[cfg(test)]
    pub fn set_text(&mut self, key: K, value: &str) {
        if let Some((_, Input::Text(input))) = self.fields.iter_mut().find(|(def, _)| def.key == key) {
            input.set_value(value);
        }
    }

    /// Validate every field and collect the values into one patch.
    ///
    /// Empty optional number and date fields are left out of the patch;
    /// empty optional text is submitted as an empty string.
    pub fn to_patch(&self) -> Result<Patch<K>, String> {
        let mut patch = Patch::new();
        for (def, input) in &self.fields {
            if let Some(value) = parse_field(def, input)? {
                patch.insert(def.key, value);
            }
        }
        Ok(patch)
    }
}

fn parse_field<K>(def: &FieldDef<K>, input: &Input) -> Result<Option<Value>, String> {
    let raw = match input {
        Input::Toggle(on) => return Ok(Some(Value::Bool(*on))),
        Input::Choice(index) => {
            let FieldKind::Choice(options) = def.kind else {
                return Ok(None);
            };
            return Ok(options.get(*index).map(|(v, _)| Value::text(*v)));
        }
        Input::Text(text) => text.value().trim(),
    };

    if raw.is_empty() {
        if def.required {
            return Err(format!("{} is required", def.label));
        }
        return Ok(match def.kind {
            FieldKind::Text => Some(Value::text("")),
            _ => None,
        });
    }

    let value = match def.kind {
        FieldKind::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .ok_or_else(|| format!("{} must be a number", def.label))?,
        FieldKind::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|_| format!("{} must be a date (YYYY-MM-DD)", def.label))?,
        FieldKind::DateTime => NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
            .map(Value::DateTime)
            .map_err(|_| format!("{} must be a date and time (YYYY-MM-DD HH:MM)", def.label))?,
        FieldKind::Text | FieldKind::Toggle | FieldKind::Choice(_) => Value::text(raw),
    };
    Ok(Some(value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Create,
    Edit { id: String },
}

/// What a valid submit asks the page to call.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<K> {
    Create(Patch<K>),
    Update { id: String, patch: Patch<K> },
}

#[derive(Debug)]
struct Session<K> {
    id: SessionId,
    mode: Mode,
    draft: Draft<K>,
    focus: usize,
    submitting: bool,
    error: Option<String>,
}

/// Editor form state for records keyed by `K`.
#[derive(Debug)]
pub struct Editor<K> {
    fields: Vec<FieldDef<K>>,
    session: Option<Session<K>>,
    next_session: u64,
}

impl<K: FieldKey> Editor<K> {
    pub const fn new(fields: Vec<FieldDef<K>>) -> Self {
        Self {
            fields,
            session: None,
            next_session: 0,
        }
    }

    fn open(&mut self, mode: Mode, draft: Draft<K>) -> SessionId {
        self.next_session += 1;
        let id = SessionId(self.next_session);
        self.session = Some(Session {
            id,
            mode,
            draft,
            focus: 0,
            submitting: false,
            error: None,
        });
        id
    }

    /// Open with the declared defaults.
    pub fn open_create(&mut self) -> SessionId {
        let draft = Draft::from_defaults(&self.fields);
        self.open(Mode::Create, draft)
    }

    /// Open pre-populated from `record`.
    pub fn open_edit<R: Record<Field = K>>(&mut self, record: &R) -> SessionId {
        let draft = Draft::from_record(&self.fields, record);
        self.open(
            Mode::Edit {
                id: record.id().to_string(),
            },
            draft,
        )
    }

    pub const fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn mode(&self) -> Option<&Mode> {
        self.session.as_ref().map(|s| &s.mode)
    }

    pub fn is_submitting(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.submitting)
    }

    pub fn error(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.error.as_deref())
    }

    pub fn draft(&self) -> Option<&Draft<K>> {
        self.session.as_ref().map(|s| &s.draft)
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft<K>> {
        self.session.as_mut().map(|s| &mut s.draft)
    }

    pub fn focus(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.focus)
    }

    pub fn focus_next(&mut self) {
        if let Some(session) = &mut self.session {
            let count = session.draft.fields.len().max(1);
            session.focus = (session.focus + 1) % count;
        }
    }

    pub fn focus_previous(&mut self) {
        if let Some(session) = &mut self.session {
            let count = session.draft.fields.len().max(1);
            session.focus = (session.focus + count - 1) % count;
        }
    }

    /// Validate the draft and hand out exactly one create or update.
    ///
    /// Returns `None` while a previous submit is in flight or when validation
    /// fails; in the latter case the message is kept for display and the
    /// draft stays as the user left it.
    pub fn submit(&mut self) -> Option<(SessionId, Submission<K>)> {
        let session = self.session.as_mut()?;
        if session.submitting {
            return None;
        }

        match session.draft.to_patch() {
            Ok(patch) => {
                session.submitting = true;
                session.error = None;
                let submission = match &session.mode {
                    Mode::Create => Submission::Create(patch),
                    Mode::Edit { id } => Submission::Update {
                        id: id.clone(),
                        patch,
                    },
                };
                Some((session.id, submission))
            }
            Err(message) => {
                session.error = Some(message);
                None
            }
        }
    }

    /// The save of `session` went through: close and drop the draft.
    ///
    /// Returns false when `session` is no longer the open one.
    pub fn succeed(&mut self, session: SessionId) -> bool {
        if self.session_id() != Some(session) {
            return false;
        }
        self.session = None;
        true
    }

    /// The save of `session` failed: stay open, keep the draft, show `message`.
    pub fn fail(&mut self, session: SessionId, message: impl Into<String>) -> bool {
        match &mut self.session {
            Some(open) if open.id == session => {
                open.submitting = false;
                open.error = Some(message.into());
                true
            }
            _ => false,
        }
    }

    /// Discard the draft.
    pub fn cancel(&mut self) {
        self.session = None;
    }
}
