use std::time::Duration;

use chrono::NaiveDate;
use color_eyre::Result;
use ratatui::layout::Constraint;

use crate::browser::{ColumnDef, FilterDef, Format, RowAction, RowCommand, Tone};
use crate::editor::FieldDef;
use crate::page::TableSchema;
use crate::pages::{Choice, TableProvider, on, patch_choice};
use crate::record::{FieldKey, Patch, Record, Value, patch_date, patch_text, require};
use crate::source::InMemorySource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Role,
    Department,
    Shift,
    Status,
    Hired,
}

impl FieldKey for Field {
    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Role => "role",
            Self::Department => "department",
            Self::Shift => "shift",
            Self::Status => "status",
            Self::Hired => "hire_date",
        }
    }
}

choice! {
    pub enum Role {
        Doctor => ("doctor", "Doctor"),
        Nurse => ("nurse", "Nurse"),
        Technician => ("technician", "Technician"),
        Admin => ("admin", "Admin"),
    }
}

choice! {
    pub enum Shift {
        Morning => ("morning", "Morning"),
        Evening => ("evening", "Evening"),
        Night => ("night", "Night"),
    }
}

choice! {
    pub enum Status {
        OnDuty => ("on_duty", "On duty"),
        OffDuty => ("off_duty", "Off duty"),
        OnLeave => ("on_leave", "On leave"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub department: String,
    pub shift: Shift,
    pub status: Status,
    pub hired: NaiveDate,
}

impl Record for StaffMember {
    type Field = Field;

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::Name => Value::text(&self.name),
            Field::Role => Value::text(self.role.as_str()),
            Field::Department => Value::text(&self.department),
            Field::Shift => Value::text(self.shift.as_str()),
            Field::Status => Value::text(self.status.as_str()),
            Field::Hired => Value::from(self.hired),
        })
    }

    fn from_patch(id: String, patch: &Patch<Field>) -> Result<Self> {
        Ok(Self {
            id,
            name: require(patch_text(patch, Field::Name)?, Field::Name)?,
            role: require(patch_choice(patch, Field::Role)?, Field::Role)?,
            department: patch_text(patch, Field::Department)?.unwrap_or_default(),
            shift: patch_choice(patch, Field::Shift)?.unwrap_or(Shift::Morning),
            status: patch_choice(patch, Field::Status)?.unwrap_or(Status::OffDuty),
            hired: require(patch_date(patch, Field::Hired)?, Field::Hired)?,
        })
    }

    fn apply(&mut self, patch: &Patch<Field>) -> Result<()> {
        let name = patch_text(patch, Field::Name)?;
        let role = patch_choice(patch, Field::Role)?;
        let department = patch_text(patch, Field::Department)?;
        let shift = patch_choice(patch, Field::Shift)?;
        let status = patch_choice(patch, Field::Status)?;
        let hired = patch_date(patch, Field::Hired)?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(role) = role {
            self.role = role;
        }
        if let Some(department) = department {
            self.department = department;
        }
        if let Some(shift) = shift {
            self.shift = shift;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(hired) = hired {
            self.hired = hired;
        }
        Ok(())
    }
}

fn status_tone(value: &Value) -> Tone {
    match Status::of(value) {
        Some(Status::OnDuty) => Tone::Good,
        Some(Status::OnLeave) => Tone::Warn,
        Some(Status::OffDuty) | None => Tone::Muted,
    }
}

fn role_label(value: &Value, _row: &StaffMember) -> String {
    Role::of(value).map_or_else(|| value.to_string(), |role| role.label().to_string())
}

fn toggle_duty(member: &StaffMember) -> RowCommand<Field> {
    let next = match member.status {
        Status::OnDuty => Status::OffDuty,
        Status::OffDuty | Status::OnLeave => Status::OnDuty,
    };
    RowCommand::Update(Patch::from([(Field::Status, Value::text(next.as_str()))]))
}

impl TableSchema for StaffMember {
    const KEY: &'static str = "staff";
    const TITLE: &'static str = "Staff";
    const NOUN: &'static str = "Staff member";

    fn columns() -> Vec<ColumnDef<Self>> {
        vec![
            ColumnDef::new(Field::Name, "Name", Constraint::Fill(2)),
            ColumnDef::new(Field::Role, "Role", Constraint::Length(11)).render_with(role_label),
            ColumnDef::new(Field::Department, "Department", Constraint::Fill(1)).filterable(),
            ColumnDef::new(Field::Shift, "Shift", Constraint::Length(8)).format(Format::Upper),
            ColumnDef::new(Field::Status, "Status", Constraint::Length(9))
                .format(Format::Upper)
                .tone(status_tone),
            ColumnDef::new(Field::Hired, "Hired", Constraint::Length(12)).format(Format::Date),
        ]
    }

    fn filters() -> Vec<FilterDef<Field>> {
        vec![
            FilterDef::new(Field::Role, "Role", Role::OPTIONS),
            FilterDef::new(Field::Status, "Status", Status::OPTIONS),
            FilterDef::new(Field::Shift, "Shift", Shift::OPTIONS),
        ]
    }

    fn fields() -> Vec<FieldDef<Field>> {
        vec![
            FieldDef::text(Field::Name, "Name").required(),
            FieldDef::choice(Field::Role, "Role", Role::OPTIONS).required(),
            FieldDef::text(Field::Department, "Department"),
            FieldDef::choice(Field::Shift, "Shift", Shift::OPTIONS),
            FieldDef::choice(Field::Status, "Status", Status::OPTIONS),
            FieldDef::date(Field::Hired, "Hired").required(),
        ]
    }

    fn actions() -> Vec<RowAction<Self>> {
        vec![
            RowAction::edit(),
            RowAction::new("Toggle duty", toggle_duty)
                .when(|m: &Self| m.status != Status::OnLeave),
            RowAction::delete(),
        ]
    }
}

pub fn provider(latency: Duration) -> TableProvider<StaffMember> {
    TableProvider::new(
        InMemorySource::new("stf", fixtures()).with_latency(latency),
        "Doctors, nurses and shift rosters",
        "🩺",
    )
}

fn member(
    n: u32,
    name: &str,
    role: Role,
    department: &str,
    shift: Shift,
    status: Status,
    hired: NaiveDate,
) -> StaffMember {
    StaffMember {
        id: format!("stf-{n}"),
        name: name.to_string(),
        role,
        department: department.to_string(),
        shift,
        status,
        hired,
    }
}

fn fixtures() -> Vec<StaffMember> {
    use Role::{Admin, Doctor, Nurse, Technician};
    use Shift::{Evening, Morning, Night};
    use Status::{OffDuty, OnDuty, OnLeave};

    vec![
        member(1, "Dr. Amy Chen", Doctor, "Cardiology", Morning, OnDuty, on(2015, 9, 1)),
        member(2, "Dr. Robert Hale", Doctor, "Orthopedics", Morning, OnDuty, on(2012, 3, 15)),
        member(3, "Dr. Priya Nair", Doctor, "Pediatrics", Evening, OffDuty, on(2018, 7, 23)),
        member(4, "Dr. Lena Fischer", Doctor, "Neurology", Morning, OnLeave, on(2016, 1, 11)),
        member(5, "Dr. Samuel Ortiz", Doctor, "Dermatology", Evening, OnDuty, on(2020, 10, 5)),
        member(6, "Nina Petrova", Nurse, "Cardiology", Night, OnDuty, on(2019, 4, 8)),
        member(7, "Kwame Mensah", Nurse, "Emergency", Night, OffDuty, on(2021, 2, 1)),
        member(8, "Rosa Delgado", Nurse, "Pediatrics", Morning, OnDuty, on(2017, 6, 19)),
        member(9, "Ethan Park", Technician, "Radiology", Evening, OnDuty, on(2022, 8, 29)),
        member(10, "Aisha Bello", Technician, "Laboratory", Morning, OffDuty, on(2020, 1, 13)),
        member(11, "Mark Jensen", Admin, "Front Desk", Morning, OnDuty, on(2014, 11, 3)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserState, derive};

    fn row(n: usize) -> StaffMember {
        fixtures().remove(n)
    }

    fn toggled(mut member: StaffMember) -> Status {
        let RowCommand::Update(patch) = toggle_duty(&member) else {
            panic!("expected an update");
        };
        member.apply(&patch).unwrap();
        member.status
    }

    #[test]
    fn test_toggle_duty_flips_status() {
        assert_eq!(toggled(row(0)), Status::OffDuty);
        assert_eq!(toggled(row(2)), Status::OnDuty);
    }

    #[test]
    fn test_toggle_hidden_while_on_leave() {
        let actions = StaffMember::actions();
        assert!(!actions[1].is_shown(&row(3)));
        assert!(actions[1].is_shown(&row(0)));
    }

    #[test]
    fn test_create_requires_role() {
        let patch = Patch::from([
            (Field::Name, Value::text("Jo Lee")),
            (Field::Hired, Value::from(on(2024, 6, 1))),
        ]);
        assert!(StaffMember::from_patch("stf-12".into(), &patch).is_err());

        let mut patch = patch;
        patch.insert(Field::Role, Value::text("nurse"));
        let member = StaffMember::from_patch("stf-12".into(), &patch).unwrap();
        assert_eq!(member.role, Role::Nurse);
        assert_eq!(member.status, Status::OffDuty);
    }

    #[test]
    fn test_night_nurses_on_duty() {
        let rows = fixtures();
        let columns = StaffMember::columns();
        let mut state = BrowserState::new();
        state.set_filter(Field::Role, "nurse");
        state.set_filter(Field::Shift, "night");
        state.set_filter(Field::Status, "on_duty");

        let view = derive(&rows, &columns, &state, 10);
        let ids: Vec<&str> = view.page_rows().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["stf-6"]);
    }

    #[test]
    fn test_display_formats() {
        let columns = StaffMember::columns();
        let member = row(3);
        assert_eq!(columns[1].display(&member), "Doctor");
        assert_eq!(columns[4].display(&member), "ON LEAVE");
        assert_eq!(columns[4].tone_of(&member), Some(Tone::Warn));
    }
}
