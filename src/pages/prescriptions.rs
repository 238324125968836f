use std::time::Duration;

use chrono::NaiveDate;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use ratatui::layout::Constraint;

use crate::browser::{ColumnDef, FilterDef, Format, RowAction, RowCommand, Tone};
use crate::editor::FieldDef;
use crate::page::TableSchema;
use crate::pages::{Choice, TableProvider, on, patch_choice};
use crate::record::{FieldKey, Patch, Record, Value, patch_date, patch_number, patch_text, require};
use crate::source::InMemorySource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Patient,
    Medication,
    Dosage,
    Prescriber,
    Refills,
    Status,
    Issued,
}

impl FieldKey for Field {
    fn name(self) -> &'static str {
        match self {
            Self::Patient => "patient_name",
            Self::Medication => "medication",
            Self::Dosage => "dosage",
            Self::Prescriber => "prescribed_by",
            Self::Refills => "refills_remaining",
            Self::Status => "status",
            Self::Issued => "issued_date",
        }
    }
}

choice! {
    pub enum Status {
        Active => ("active", "Active"),
        Completed => ("completed", "Completed"),
        Discontinued => ("discontinued", "Discontinued"),
    }
}

impl Status {
    const fn tone(self) -> Tone {
        match self {
            Self::Active => Tone::Good,
            Self::Completed => Tone::Muted,
            Self::Discontinued => Tone::Bad,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prescription {
    pub id: String,
    pub patient: String,
    pub medication: String,
    pub dosage: String,
    pub prescriber: String,
    pub refills: u32,
    pub status: Status,
    pub issued: NaiveDate,
}

impl Prescription {
    const fn can_refill(&self) -> bool {
        self.refills > 0 && matches!(self.status, Status::Active)
    }
}

/// Refill counts arrive as numbers; only whole, non-negative ones are valid.
fn patch_refills(patch: &Patch<Field>) -> Result<Option<u32>> {
    patch_number(patch, Field::Refills)?
        .map(|n| {
            if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let whole = n as u32;
                Ok(whole)
            } else {
                Err(eyre!("Refills must be a whole number of at least 0, got {n}"))
            }
        })
        .transpose()
}

impl Record for Prescription {
    type Field = Field;

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::Patient => Value::text(&self.patient),
            Field::Medication => Value::text(&self.medication),
            Field::Dosage => Value::text(&self.dosage),
            Field::Prescriber => Value::text(&self.prescriber),
            Field::Refills => Value::from(self.refills),
            Field::Status => Value::text(self.status.as_str()),
            Field::Issued => Value::from(self.issued),
        })
    }

    fn from_patch(id: String, patch: &Patch<Field>) -> Result<Self> {
        Ok(Self {
            id,
            patient: require(patch_text(patch, Field::Patient)?, Field::Patient)?,
            medication: require(patch_text(patch, Field::Medication)?, Field::Medication)?,
            dosage: patch_text(patch, Field::Dosage)?.unwrap_or_default(),
            prescriber: patch_text(patch, Field::Prescriber)?.unwrap_or_default(),
            refills: patch_refills(patch)?.unwrap_or(0),
            status: patch_choice(patch, Field::Status)?.unwrap_or(Status::Active),
            issued: require(patch_date(patch, Field::Issued)?, Field::Issued)?,
        })
    }

    fn apply(&mut self, patch: &Patch<Field>) -> Result<()> {
        let patient = patch_text(patch, Field::Patient)?;
        let medication = patch_text(patch, Field::Medication)?;
        let dosage = patch_text(patch, Field::Dosage)?;
        let prescriber = patch_text(patch, Field::Prescriber)?;
        let refills = patch_refills(patch)?;
        let status = patch_choice(patch, Field::Status)?;
        let issued = patch_date(patch, Field::Issued)?;

        if let Some(patient) = patient {
            self.patient = patient;
        }
        if let Some(medication) = medication {
            self.medication = medication;
        }
        if let Some(dosage) = dosage {
            self.dosage = dosage;
        }
        if let Some(prescriber) = prescriber {
            self.prescriber = prescriber;
        }
        if let Some(refills) = refills {
            self.refills = refills;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(issued) = issued {
            self.issued = issued;
        }
        Ok(())
    }
}

fn status_tone(value: &Value) -> Tone {
    Status::of(value).map_or(Tone::Muted, Status::tone)
}

fn refill(rx: &Prescription) -> RowCommand<Field> {
    RowCommand::Update(Patch::from([(
        Field::Refills,
        Value::from(rx.refills.saturating_sub(1)),
    )]))
}

impl TableSchema for Prescription {
    const KEY: &'static str = "prescriptions";
    const TITLE: &'static str = "Prescriptions";
    const NOUN: &'static str = "Prescription";

    fn columns() -> Vec<ColumnDef<Self>> {
        vec![
            ColumnDef::new(Field::Patient, "Patient", Constraint::Fill(2)),
            ColumnDef::new(Field::Medication, "Medication", Constraint::Fill(2)),
            ColumnDef::new(Field::Dosage, "Dosage", Constraint::Fill(2)).unsortable(),
            ColumnDef::new(Field::Prescriber, "Prescriber", Constraint::Fill(2)).filterable(),
            ColumnDef::new(Field::Refills, "Refills", Constraint::Length(8)).format(Format::Count),
            ColumnDef::new(Field::Status, "Status", Constraint::Length(13))
                .format(Format::Upper)
                .tone(status_tone),
            ColumnDef::new(Field::Issued, "Issued", Constraint::Length(12)).format(Format::Date),
        ]
    }

    fn filters() -> Vec<FilterDef<Field>> {
        vec![FilterDef::new(Field::Status, "Status", Status::OPTIONS)]
    }

    fn fields() -> Vec<FieldDef<Field>> {
        vec![
            FieldDef::text(Field::Patient, "Patient").required(),
            FieldDef::text(Field::Medication, "Medication").required(),
            FieldDef::text(Field::Dosage, "Dosage").placeholder("e.g. 10mg twice daily"),
            FieldDef::text(Field::Prescriber, "Prescriber"),
            FieldDef::number(Field::Refills, "Refills").default_value(0u32),
            FieldDef::choice(Field::Status, "Status", Status::OPTIONS),
            FieldDef::date(Field::Issued, "Issued").required(),
        ]
    }

    fn actions() -> Vec<RowAction<Self>> {
        vec![
            RowAction::edit(),
            RowAction::new("Refill", refill).when(Self::can_refill),
            RowAction::delete(),
        ]
    }
}

pub fn provider(latency: Duration) -> TableProvider<Prescription> {
    TableProvider::new(
        InMemorySource::new("rx", fixtures()).with_latency(latency),
        "Active medications, refills and prescribers",
        "💊",
    )
}

#[allow(clippy::too_many_arguments)]
fn prescription(
    n: u32,
    patient: &str,
    medication: &str,
    dosage: &str,
    prescriber: &str,
    refills: u32,
    status: Status,
    issued: NaiveDate,
) -> Prescription {
    Prescription {
        id: format!("rx-{n}"),
        patient: patient.to_string(),
        medication: medication.to_string(),
        dosage: dosage.to_string(),
        prescriber: prescriber.to_string(),
        refills,
        status,
        issued,
    }
}

fn fixtures() -> Vec<Prescription> {
    use Status::{Active, Completed, Discontinued};

    vec![
        prescription(1, "Maria Gonzalez", "Atorvastatin", "20mg once daily", "Dr. Amy Chen", 3, Active, on(2024, 5, 2)),
        prescription(2, "James Okafor", "Ibuprofen", "400mg every 8 hours", "Dr. Robert Hale", 0, Completed, on(2024, 4, 18)),
        prescription(3, "Sarah Johnson", "Amoxicillin", "250mg three times daily", "Dr. Priya Nair", 0, Active, on(2024, 6, 5)),
        prescription(4, "Emily Carter", "Sumatriptan", "50mg as needed", "Dr. Lena Fischer", 2, Active, on(2024, 3, 27)),
        prescription(5, "Li Wei", "Metoprolol", "25mg twice daily", "Dr. Amy Chen", 5, Active, on(2024, 2, 14)),
        prescription(6, "Daniel Novak", "Gabapentin", "300mg at night", "Dr. Lena Fischer", 1, Discontinued, on(2024, 1, 9)),
        prescription(7, "Fatima Zahra", "Tretinoin cream", "Apply nightly", "Dr. Samuel Ortiz", 4, Active, on(2024, 5, 30)),
        prescription(8, "Grace Kim", "Lisinopril", "10mg once daily", "Dr. Amy Chen", 6, Active, on(2024, 6, 7)),
        prescription(9, "Tomás Ribeiro", "Cetirizine", "5mg once daily", "Dr. Priya Nair", 0, Completed, on(2024, 3, 3)),
        prescription(10, "Oliver Brown", "Doxycycline", "100mg twice daily", "Dr. Samuel Ortiz", 1, Active, on(2024, 6, 10)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(n: usize) -> Prescription {
        fixtures().remove(n)
    }

    fn shown(row: &Prescription) -> Vec<&'static str> {
        Prescription::actions()
            .into_iter()
            .filter(|a| a.is_shown(row))
            .map(|a| a.label)
            .collect()
    }

    #[test]
    fn test_refill_needs_active_with_refills_left() {
        assert_eq!(shown(&row(0)), vec!["Edit", "Refill", "Delete"]);
        // active but out of refills
        assert_eq!(shown(&row(2)), vec!["Edit", "Delete"]);
        // refills left but discontinued
        assert_eq!(shown(&row(5)), vec!["Edit", "Delete"]);
    }

    #[test]
    fn test_refill_decrements() {
        let mut rx = row(9);
        let RowCommand::Update(patch) = refill(&rx) else {
            panic!("expected an update");
        };
        rx.apply(&patch).unwrap();
        assert_eq!(rx.refills, 0);
        assert!(!rx.can_refill());
    }

    #[test]
    fn test_refills_must_be_whole() {
        let mut rx = row(0);
        for bad in [-1.0, 1.5] {
            let patch = Patch::from([(Field::Refills, Value::from(bad))]);
            assert!(rx.apply(&patch).is_err());
        }
        assert_eq!(rx.refills, 3);
    }

    #[test]
    fn test_create_defaults() {
        let patch = Patch::from([
            (Field::Patient, Value::text("Hannah Schmidt")),
            (Field::Medication, Value::text("Naproxen")),
            (Field::Issued, Value::from(on(2024, 6, 12))),
        ]);
        let rx = Prescription::from_patch("rx-11".into(), &patch).unwrap();
        assert_eq!(rx.status, Status::Active);
        assert_eq!(rx.refills, 0);
        assert_eq!(rx.dosage, "");
    }

    #[test]
    fn test_display_formats() {
        let columns = Prescription::columns();
        let rx = row(5);
        assert_eq!(columns[4].display(&rx), "1 left");
        assert_eq!(columns[5].display(&rx), "DISCONTINUED");
        assert_eq!(columns[5].tone_of(&rx), Some(Tone::Bad));
        assert_eq!(columns[6].display(&rx), "Jan 9, 2024");
        assert!(!columns[2].sortable);
    }
}
