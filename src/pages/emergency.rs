use std::time::Duration;

use chrono::NaiveDateTime;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use ratatui::layout::Constraint;

use crate::browser::{ColumnDef, FilterDef, Format, RowAction, RowCommand, Tone};
use crate::editor::FieldDef;
use crate::page::TableSchema;
use crate::pages::{Choice, TableProvider, at, patch_choice};
use crate::record::{
    FieldKey, Patch, Record, Value, patch_date_time, patch_number, patch_text, require,
};
use crate::source::InMemorySource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Caller,
    Location,
    Kind,
    Priority,
    Status,
    Reported,
    Response,
}

impl FieldKey for Field {
    fn name(self) -> &'static str {
        match self {
            Self::Caller => "caller_name",
            Self::Location => "location",
            Self::Kind => "incident_type",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::Reported => "reported_at",
            Self::Response => "response_time_minutes",
        }
    }
}

choice! {
    pub enum Kind {
        Cardiac => ("cardiac", "Cardiac"),
        Trauma => ("trauma", "Trauma"),
        Respiratory => ("respiratory", "Respiratory"),
        Stroke => ("stroke", "Stroke"),
        Other => ("other", "Other"),
    }
}

choice! {
    pub enum Priority {
        Critical => ("critical", "Critical"),
        High => ("high", "High"),
        Medium => ("medium", "Medium"),
        Low => ("low", "Low"),
    }
}

choice! {
    pub enum Status {
        Pending => ("pending", "Pending"),
        Dispatched => ("dispatched", "Dispatched"),
        Resolved => ("resolved", "Resolved"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub id: String,
    pub caller: String,
    pub location: String,
    pub kind: Kind,
    pub priority: Priority,
    pub status: Status,
    pub reported: NaiveDateTime,
    /// Minutes until a unit arrived; unknown until dispatched.
    pub response_minutes: Option<f64>,
}

fn patch_minutes(patch: &Patch<Field>) -> Result<Option<f64>> {
    match patch_number(patch, Field::Response)? {
        Some(minutes) if minutes < 0.0 => Err(eyre!("Response time cannot be negative")),
        minutes => Ok(minutes),
    }
}

impl Record for Incident {
    type Field = Field;

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::Caller => Value::text(&self.caller),
            Field::Location => Value::text(&self.location),
            Field::Kind => Value::text(self.kind.as_str()),
            Field::Priority => Value::text(self.priority.as_str()),
            Field::Status => Value::text(self.status.as_str()),
            Field::Reported => Value::from(self.reported),
            Field::Response => Value::from(self.response_minutes?),
        })
    }

    fn from_patch(id: String, patch: &Patch<Field>) -> Result<Self> {
        Ok(Self {
            id,
            caller: require(patch_text(patch, Field::Caller)?, Field::Caller)?,
            location: require(patch_text(patch, Field::Location)?, Field::Location)?,
            kind: patch_choice(patch, Field::Kind)?.unwrap_or(Kind::Other),
            priority: require(patch_choice(patch, Field::Priority)?, Field::Priority)?,
            status: patch_choice(patch, Field::Status)?.unwrap_or(Status::Pending),
            reported: require(patch_date_time(patch, Field::Reported)?, Field::Reported)?,
            response_minutes: patch_minutes(patch)?,
        })
    }

    fn apply(&mut self, patch: &Patch<Field>) -> Result<()> {
        let caller = patch_text(patch, Field::Caller)?;
        let location = patch_text(patch, Field::Location)?;
        let kind = patch_choice(patch, Field::Kind)?;
        let priority = patch_choice(patch, Field::Priority)?;
        let status = patch_choice(patch, Field::Status)?;
        let reported = patch_date_time(patch, Field::Reported)?;
        let response = patch_minutes(patch)?;

        if let Some(caller) = caller {
            self.caller = caller;
        }
        if let Some(location) = location {
            self.location = location;
        }
        if let Some(kind) = kind {
            self.kind = kind;
        }
        if let Some(priority) = priority {
            self.priority = priority;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(reported) = reported {
            self.reported = reported;
        }
        if response.is_some() {
            self.response_minutes = response;
        }
        Ok(())
    }
}

fn priority_tone(value: &Value) -> Tone {
    match Priority::of(value) {
        Some(Priority::Critical) => Tone::Bad,
        Some(Priority::High) => Tone::Warn,
        Some(Priority::Medium) => Tone::Info,
        Some(Priority::Low) | None => Tone::Muted,
    }
}

fn status_tone(value: &Value) -> Tone {
    match Status::of(value) {
        Some(Status::Pending) => Tone::Warn,
        Some(Status::Dispatched) => Tone::Info,
        Some(Status::Resolved) => Tone::Good,
        None => Tone::Muted,
    }
}

fn kind_label(value: &Value, _row: &Incident) -> String {
    Kind::of(value).map_or_else(|| value.to_string(), |kind| kind.label().to_string())
}

fn set_status(status: Status) -> RowCommand<Field> {
    RowCommand::Update(Patch::from([(Field::Status, Value::text(status.as_str()))]))
}

impl TableSchema for Incident {
    const KEY: &'static str = "emergency";
    const TITLE: &'static str = "Emergency";
    const NOUN: &'static str = "Incident";

    fn columns() -> Vec<ColumnDef<Self>> {
        vec![
            ColumnDef::new(Field::Caller, "Caller", Constraint::Fill(2)),
            ColumnDef::new(Field::Location, "Location", Constraint::Fill(2)),
            ColumnDef::new(Field::Kind, "Type", Constraint::Length(12)).render_with(kind_label),
            ColumnDef::new(Field::Priority, "Priority", Constraint::Length(9))
                .format(Format::Upper)
                .tone(priority_tone),
            ColumnDef::new(Field::Status, "Status", Constraint::Length(11))
                .format(Format::Upper)
                .tone(status_tone),
            ColumnDef::new(Field::Reported, "Reported", Constraint::Length(16)),
            ColumnDef::new(Field::Response, "Response", Constraint::Length(9))
                .format(Format::Minutes),
        ]
    }

    fn filters() -> Vec<FilterDef<Field>> {
        vec![
            FilterDef::new(Field::Priority, "Priority", Priority::OPTIONS),
            FilterDef::new(Field::Status, "Status", Status::OPTIONS),
            FilterDef::new(Field::Kind, "Type", Kind::OPTIONS),
        ]
    }

    fn fields() -> Vec<FieldDef<Field>> {
        vec![
            FieldDef::text(Field::Caller, "Caller").required(),
            FieldDef::text(Field::Location, "Location").required(),
            FieldDef::choice(Field::Kind, "Type", Kind::OPTIONS),
            FieldDef::choice(Field::Priority, "Priority", Priority::OPTIONS).required(),
            FieldDef::choice(Field::Status, "Status", Status::OPTIONS),
            FieldDef::date_time(Field::Reported, "Reported").required(),
            FieldDef::number(Field::Response, "Response (min)"),
        ]
    }

    fn actions() -> Vec<RowAction<Self>> {
        vec![
            RowAction::edit(),
            RowAction::new("Dispatch", |_| set_status(Status::Dispatched))
                .when(|i: &Self| i.status == Status::Pending),
            RowAction::new("Resolve", |_| set_status(Status::Resolved))
                .when(|i: &Self| i.status != Status::Resolved),
            RowAction::delete(),
        ]
    }
}

pub fn provider(latency: Duration) -> TableProvider<Incident> {
    TableProvider::new(
        InMemorySource::new("er", fixtures()).with_latency(latency),
        "Incoming incidents, dispatch and response times",
        "🚑",
    )
}

#[allow(clippy::too_many_arguments)]
fn incident(
    n: u32,
    caller: &str,
    location: &str,
    kind: Kind,
    priority: Priority,
    status: Status,
    reported: NaiveDateTime,
    response_minutes: Option<f64>,
) -> Incident {
    Incident {
        id: format!("er-{n}"),
        caller: caller.to_string(),
        location: location.to_string(),
        kind,
        priority,
        status,
        reported,
        response_minutes,
    }
}

fn fixtures() -> Vec<Incident> {
    use Kind::{Cardiac, Other, Respiratory, Stroke, Trauma};
    use Priority::{Critical, High, Low, Medium};
    use Status::{Dispatched, Pending, Resolved};

    vec![
        incident(1, "John Miller", "14 Harbor St", Cardiac, Critical, Resolved, at(2024, 6, 10, 7, 42), Some(6.0)),
        incident(2, "Anna Rossi", "Central Station, Platform 3", Trauma, High, Resolved, at(2024, 6, 10, 9, 15), Some(11.0)),
        incident(3, "Unknown", "Route 9 near exit 22", Trauma, Critical, Dispatched, at(2024, 6, 11, 17, 5), Some(8.0)),
        incident(4, "Peter Lang", "Oak Ridge Retirement Home", Respiratory, High, Dispatched, at(2024, 6, 11, 18, 30), None),
        incident(5, "Mei Tanaka", "221 Elm Ave, Apt 4B", Stroke, Critical, Pending, at(2024, 6, 11, 19, 2), None),
        incident(6, "Carlos Vega", "Riverside Park", Other, Low, Pending, at(2024, 6, 11, 19, 20), None),
        incident(7, "Helen Ward", "City Library", Respiratory, Medium, Resolved, at(2024, 6, 9, 14, 0), Some(14.5)),
        incident(8, "Sam Osei", "North Mall food court", Cardiac, High, Pending, at(2024, 6, 11, 19, 41), None),
    ]
}
