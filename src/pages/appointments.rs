use std::time::Duration;

use chrono::NaiveDateTime;
use color_eyre::Result;
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
    Patient,
    Doctor,
    Department,
    Time,
    Kind,
    Status,
    Fee,
}

impl FieldKey for Field {
    fn name(self) -> &'static str {
        match self {
            Self::Patient => "patient_name",
            Self::Doctor => "doctor_name",
            Self::Department => "department",
            Self::Time => "appointment_time",
            Self::Kind => "appointment_type",
            Self::Status => "status",
            Self::Fee => "fee",
        }
    }
}

choice! {
    pub enum Kind {
        Consultation => ("consultation", "Consultation"),
        FollowUp => ("follow_up", "Follow-up"),
        Checkup => ("checkup", "Check-up"),
        Procedure => ("procedure", "Procedure"),
    }
}

choice! {
    pub enum Status {
        Scheduled => ("scheduled", "Scheduled"),
        Confirmed => ("confirmed", "Confirmed"),
        Completed => ("completed", "Completed"),
        Cancelled => ("cancelled", "Cancelled"),
        NoShow => ("no_show", "No-show"),
    }
}

impl Status {
    const fn tone(self) -> Tone {
        match self {
            Self::Scheduled => Tone::Info,
            Self::Confirmed | Self::Completed => Tone::Good,
            Self::Cancelled => Tone::Bad,
            Self::NoShow => Tone::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub patient: String,
    pub doctor: String,
    pub department: String,
    pub time: NaiveDateTime,
    pub kind: Kind,
    pub status: Status,
    pub fee: f64,
}

impl Record for Appointment {
    type Field = Field;

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::Patient => Value::text(&self.patient),
            Field::Doctor => Value::text(&self.doctor),
            Field::Department => Value::text(&self.department),
            Field::Time => Value::from(self.time),
            Field::Kind => Value::text(self.kind.as_str()),
            Field::Status => Value::text(self.status.as_str()),
            Field::Fee => Value::from(self.fee),
        })
    }

    fn from_patch(id: String, patch: &Patch<Field>) -> Result<Self> {
        Ok(Self {
            id,
            patient: require(patch_text(patch, Field::Patient)?, Field::Patient)?,
            doctor: require(patch_text(patch, Field::Doctor)?, Field::Doctor)?,
            department: patch_text(patch, Field::Department)?.unwrap_or_default(),
            time: require(patch_date_time(patch, Field::Time)?, Field::Time)?,
            kind: patch_choice(patch, Field::Kind)?.unwrap_or(Kind::Consultation),
            status: patch_choice(patch, Field::Status)?.unwrap_or(Status::Scheduled),
            fee: patch_number(patch, Field::Fee)?.unwrap_or(0.0),
        })
    }

    fn apply(&mut self, patch: &Patch<Field>) -> Result<()> {
        // Validate everything before touching the record
        let patient = patch_text(patch, Field::Patient)?;
        let doctor = patch_text(patch, Field::Doctor)?;
        let department = patch_text(patch, Field::Department)?;
        let time = patch_date_time(patch, Field::Time)?;
        let kind = patch_choice(patch, Field::Kind)?;
        let status = patch_choice(patch, Field::Status)?;
        let fee = patch_number(patch, Field::Fee)?;

        if let Some(patient) = patient {
            self.patient = patient;
        }
        if let Some(doctor) = doctor {
            self.doctor = doctor;
        }
        if let Some(department) = department {
            self.department = department;
        }
        if let Some(time) = time {
            self.time = time;
        }
        if let Some(kind) = kind {
            self.kind = kind;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(fee) = fee {
            self.fee = fee;
        }
        Ok(())
    }
}

fn status_tone(value: &Value) -> Tone {
    Status::of(value).map_or(Tone::Muted, Status::tone)
}

fn kind_label(value: &Value, _row: &Appointment) -> String {
    Kind::of(value).map_or_else(|| value.to_string(), |kind| kind.label().to_string())
}

fn set_status(status: Status) -> RowCommand<Field> {
    RowCommand::Update(Patch::from([(Field::Status, Value::text(status.as_str()))]))
}

impl TableSchema for Appointment {
    const KEY: &'static str = "appointments";
    const TITLE: &'static str = "Appointments";
    const NOUN: &'static str = "Appointment";

    fn columns() -> Vec<ColumnDef<Self>> {
        vec![
            ColumnDef::new(Field::Patient, "Patient", Constraint::Fill(2)),
            ColumnDef::new(Field::Doctor, "Doctor", Constraint::Fill(2)),
            ColumnDef::new(Field::Department, "Department", Constraint::Fill(1)).filterable(),
            ColumnDef::new(Field::Time, "Time", Constraint::Length(16)),
            ColumnDef::new(Field::Kind, "Type", Constraint::Length(12)).render_with(kind_label),
            ColumnDef::new(Field::Status, "Status", Constraint::Length(10))
                .format(Format::Upper)
                .tone(status_tone),
            ColumnDef::new(Field::Fee, "Fee", Constraint::Length(10)).format(Format::Currency),
        ]
    }

    fn filters() -> Vec<FilterDef<Field>> {
        vec![
            FilterDef::new(Field::Status, "Status", Status::OPTIONS),
            FilterDef::new(Field::Kind, "Type", Kind::OPTIONS),
        ]
    }

    fn fields() -> Vec<FieldDef<Field>> {
        vec![
            FieldDef::text(Field::Patient, "Patient").required(),
            FieldDef::text(Field::Doctor, "Doctor").required(),
            FieldDef::text(Field::Department, "Department").placeholder("e.g. Cardiology"),
            FieldDef::date_time(Field::Time, "Time").required(),
            FieldDef::choice(Field::Kind, "Type", Kind::OPTIONS),
            FieldDef::choice(Field::Status, "Status", Status::OPTIONS),
            FieldDef::number(Field::Fee, "Fee").default_value(0.0),
        ]
    }

    fn actions() -> Vec<RowAction<Self>> {
        vec![
            RowAction::edit(),
            RowAction::new("Mark completed", |_| set_status(Status::Completed))
                .when(|a: &Self| !matches!(a.status, Status::Completed | Status::Cancelled)),
            RowAction::new("Cancel appointment", |_| set_status(Status::Cancelled))
                .when(|a: &Self| a.status != Status::Cancelled),
            RowAction::delete(),
        ]
    }
}

pub fn provider(latency: Duration) -> TableProvider<Appointment> {
    TableProvider::new(
        InMemorySource::new("apt", fixtures()).with_latency(latency),
        "Schedule visits and track their status",
        "📅",
    )
}

#[allow(clippy::too_many_arguments)]
fn appointment(
    n: u32,
    patient: &str,
    doctor: &str,
    department: &str,
    time: NaiveDateTime,
    kind: Kind,
    status: Status,
    fee: f64,
) -> Appointment {
    Appointment {
        id: format!("apt-{n}"),
        patient: patient.to_string(),
        doctor: doctor.to_string(),
        department: department.to_string(),
        time,
        kind,
        status,
        fee,
    }
}

fn fixtures() -> Vec<Appointment> {
    use Kind::{Checkup, Consultation, FollowUp, Procedure};
    use Status::{Cancelled, Completed, Confirmed, NoShow, Scheduled};

    vec![
        appointment(1, "Maria Gonzalez", "Dr. Amy Chen", "Cardiology", at(2024, 6, 3, 9, 0), Consultation, Completed, 150.0),
        appointment(2, "James Okafor", "Dr. Robert Hale", "Orthopedics", at(2024, 6, 3, 10, 30), FollowUp, Completed, 90.0),
        appointment(3, "Li Wei", "Dr. Amy Chen", "Cardiology", at(2024, 6, 4, 11, 0), Procedure, Cancelled, 1250.0),
        appointment(4, "Sarah Johnson", "Dr. Priya Nair", "Pediatrics", at(2024, 6, 5, 8, 45), Checkup, Confirmed, 75.0),
        appointment(5, "Ahmed Hassan", "Dr. Robert Hale", "Orthopedics", at(2024, 6, 5, 14, 15), Consultation, Scheduled, 150.0),
        appointment(6, "Emily Carter", "Dr. Lena Fischer", "Neurology", at(2024, 6, 6, 9, 30), Consultation, NoShow, 180.0),
        appointment(7, "Tomás Ribeiro", "Dr. Priya Nair", "Pediatrics", at(2024, 6, 6, 13, 0), FollowUp, Scheduled, 60.0),
        appointment(8, "Grace Kim", "Dr. Amy Chen", "Cardiology", at(2024, 6, 7, 10, 0), FollowUp, Confirmed, 90.0),
        appointment(9, "Daniel Novak", "Dr. Lena Fischer", "Neurology", at(2024, 6, 7, 15, 30), Procedure, Scheduled, 980.0),
        appointment(10, "Fatima Zahra", "Dr. Samuel Ortiz", "Dermatology", at(2024, 6, 10, 9, 15), Checkup, Scheduled, 85.0),
        appointment(11, "Oliver Brown", "Dr. Samuel Ortiz", "Dermatology", at(2024, 6, 10, 11, 45), Consultation, Confirmed, 120.0),
        appointment(12, "Hannah Schmidt", "Dr. Robert Hale", "Orthopedics", at(2024, 6, 11, 16, 0), Checkup, Scheduled, 75.0),
    ]
}
