use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use ratatui::layout::Constraint;

use crate::browser::{ColumnDef, FilterDef, Format, RowAction, RowCommand, Tone};
use crate::editor::FieldDef;
use crate::page::TableSchema;
use crate::pages::{Choice, TableProvider, patch_choice};
use crate::record::{FieldKey, Patch, Record, Value, patch_bool, patch_number, patch_text, require};
use crate::source::InMemorySource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Category,
    Department,
    Price,
    Turnaround,
    Available,
}

impl FieldKey for Field {
    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Department => "department",
            Self::Price => "price",
            Self::Turnaround => "turnaround_hours",
            Self::Available => "is_available",
        }
    }
}

choice! {
    pub enum Category {
        Lab => ("lab", "Lab test"),
        Scan => ("scan", "Scan"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabTest {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub department: String,
    pub price: f64,
    pub turnaround_hours: f64,
    pub available: bool,
}

fn non_negative(value: Option<f64>, what: &str) -> Result<Option<f64>> {
    match value {
        Some(n) if n < 0.0 => Err(eyre!("{what} cannot be negative")),
        other => Ok(other),
    }
}

impl Record for LabTest {
    type Field = Field;

    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::Name => Value::text(&self.name),
            Field::Category => Value::text(self.category.as_str()),
            Field::Department => Value::text(&self.department),
            Field::Price => Value::from(self.price),
            Field::Turnaround => Value::from(self.turnaround_hours),
            Field::Available => Value::from(self.available),
        })
    }

    fn from_patch(id: String, patch: &Patch<Field>) -> Result<Self> {
        Ok(Self {
            id,
            name: require(patch_text(patch, Field::Name)?, Field::Name)?,
            category: require(patch_choice(patch, Field::Category)?, Field::Category)?,
            department: patch_text(patch, Field::Department)?.unwrap_or_default(),
            price: non_negative(patch_number(patch, Field::Price)?, "Price")?.unwrap_or(0.0),
            turnaround_hours: non_negative(patch_number(patch, Field::Turnaround)?, "Turnaround")?
                .unwrap_or(24.0),
            available: patch_bool(patch, Field::Available)?.unwrap_or(true),
        })
    }

    fn apply(&mut self, patch: &Patch<Field>) -> Result<()> {
        let name = patch_text(patch, Field::Name)?;
        let category = patch_choice(patch, Field::Category)?;
        let department = patch_text(patch, Field::Department)?;
        let price = non_negative(patch_number(patch, Field::Price)?, "Price")?;
        let turnaround = non_negative(patch_number(patch, Field::Turnaround)?, "Turnaround")?;
        let available = patch_bool(patch, Field::Available)?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(department) = department {
            self.department = department;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(turnaround) = turnaround {
            self.turnaround_hours = turnaround;
        }
        if let Some(available) = available {
            self.available = available;
        }
        Ok(())
    }
}

fn hours(value: &Value, _row: &LabTest) -> String {
    format!("{value} h")
}

fn category_label(value: &Value, _row: &LabTest) -> String {
    Category::of(value).map_or_else(|| value.to_string(), |c| c.label().to_string())
}

fn available_tone(value: &Value) -> Tone {
    if value.as_bool().unwrap_or(false) {
        Tone::Good
    } else {
        Tone::Muted
    }
}

fn toggle_available(test: &LabTest) -> RowCommand<Field> {
    RowCommand::Update(Patch::from([(Field::Available, Value::from(!test.available))]))
}

impl TableSchema for LabTest {
    const KEY: &'static str = "lab-tests";
    const TITLE: &'static str = "Lab Tests & Scans";
    const NOUN: &'static str = "Test";

    fn columns() -> Vec<ColumnDef<Self>> {
        vec![
            ColumnDef::new(Field::Name, "Name", Constraint::Fill(2)),
            ColumnDef::new(Field::Category, "Category", Constraint::Length(9))
                .render_with(category_label),
            ColumnDef::new(Field::Department, "Department", Constraint::Fill(1)).filterable(),
            ColumnDef::new(Field::Price, "Price", Constraint::Length(10)).format(Format::Currency),
            ColumnDef::new(Field::Turnaround, "Turnaround", Constraint::Length(10))
                .render_with(hours),
            ColumnDef::new(Field::Available, "Available", Constraint::Length(9))
                .format(Format::YesNo)
                .tone(available_tone),
        ]
    }

    fn filters() -> Vec<FilterDef<Field>> {
        vec![
            FilterDef::new(Field::Category, "Category", Category::OPTIONS),
            FilterDef::new(Field::Available, "Available", &[("true", "Yes"), ("false", "No")]),
        ]
    }

    fn fields() -> Vec<FieldDef<Field>> {
        vec![
            FieldDef::text(Field::Name, "Name").required(),
            FieldDef::choice(Field::Category, "Category", Category::OPTIONS).required(),
            FieldDef::text(Field::Department, "Department"),
            FieldDef::number(Field::Price, "Price").default_value(0.0),
            FieldDef::number(Field::Turnaround, "Turnaround (h)").default_value(24.0),
            FieldDef::toggle(Field::Available, "Available").default_value(true),
        ]
    }

    fn actions() -> Vec<RowAction<Self>> {
        vec![
            RowAction::edit(),
            RowAction::new("Toggle availability", toggle_available),
            RowAction::delete(),
        ]
    }
}

pub fn provider(latency: Duration) -> TableProvider<LabTest> {
    TableProvider::new(
        InMemorySource::new("lab", fixtures()).with_latency(latency),
        "Catalog of lab tests and imaging scans",
        "🧪",
    )
}

fn lab_test(
    n: u32,
    name: &str,
    category: Category,
    department: &str,
    price: f64,
    turnaround_hours: f64,
    available: bool,
) -> LabTest {
    LabTest {
        id: format!("lab-{n}"),
        name: name.to_string(),
        category,
        department: department.to_string(),
        price,
        turnaround_hours,
        available,
    }
}

fn fixtures() -> Vec<LabTest> {
    use Category::{Lab, Scan};

    vec![
        lab_test(1, "Complete Blood Count", Lab, "Hematology", 35.0, 4.0, true),
        lab_test(2, "Lipid Panel", Lab, "Chemistry", 48.0, 24.0, true),
        lab_test(3, "HbA1c", Lab, "Chemistry", 42.0, 24.0, true),
        lab_test(4, "Thyroid Panel", Lab, "Endocrinology", 65.0, 48.0, false),
        lab_test(5, "Urinalysis", Lab, "Pathology", 20.0, 2.0, true),
        lab_test(6, "Chest X-Ray", Scan, "Radiology", 120.0, 1.0, true),
        lab_test(7, "Brain MRI", Scan, "Radiology", 1450.0, 72.0, true),
        lab_test(8, "Abdominal Ultrasound", Scan, "Radiology", 260.0, 6.0, false),
        lab_test(9, "CT Angiography", Scan, "Cardiology", 980.0, 24.0, true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserState, derive};

    #[test]
    fn test_toggle_availability() {
        let mut lab = fixtures().remove(3);
        let RowCommand::Update(patch) = toggle_available(&lab) else {
            panic!("expected an update");
        };
        lab.apply(&patch).unwrap();
        assert!(lab.available);
    }

    #[test]
    fn test_unavailable_scans() {
        let rows = fixtures();
        let columns = LabTest::columns();
        let mut state = BrowserState::new();
        state.set_filter(Field::Category, "scan");
        state.set_filter(Field::Available, "false");

        let view = derive(&rows, &columns, &state, 10);
        let ids: Vec<&str> = view.page_rows().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["lab-8"]);
    }

    #[test]
    fn test_display_formats() {
        let columns = LabTest::columns();
        let mri = fixtures().remove(6);
        assert_eq!(columns[1].display(&mri), "Scan");
        assert_eq!(columns[3].display(&mri), "$1,450.00");
        assert_eq!(columns[4].display(&mri), "72 h");
        assert_eq!(columns[5].display(&mri), "Yes");
        assert_eq!(columns[5].tone_of(&mri), Some(Tone::Good));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut lab = fixtures().remove(0);
        let patch = Patch::from([
            (Field::Name, Value::text("CBC")),
            (Field::Price, Value::from(-1.0)),
        ]);
        assert!(lab.apply(&patch).is_err());
        assert_eq!(lab.name, "Complete Blood Count");
    }

    #[test]
    fn test_create_defaults() {
        let patch = Patch::from([
            (Field::Name, Value::text("Vitamin D")),
            (Field::Category, Value::text("lab")),
        ]);
        let lab = LabTest::from_patch("lab-10".into(), &patch).unwrap();
        assert!(lab.available);
        assert!((lab.turnaround_hours - 24.0).abs() < f64::EPSILON);
    }
}
