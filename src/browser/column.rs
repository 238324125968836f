use ratatui::layout::Constraint;

use crate::record::{FieldKey, Patch, Record, Value};

/// Reserved filter option value meaning "no constraint on this field".
pub const ALL: &str = "all";

const DISPLAY_DATE: &str = "%b %-d, %Y";

/// Display formats resolved at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `$1,250.00`
    Currency,
    /// `Jan 9, 2024`, dropping the time of date-time values.
    Date,
    /// `45 min`
    Minutes,
    /// `Yes` / `No`
    YesNo,
    /// `3 left`
    Count,
    /// Upper-cased text, used for status badges.
    Upper,
}

impl Format {
    pub fn apply(self, value: &Value) -> String {
        match (self, value) {
            (Self::Currency, Value::Number(n)) => format_currency(*n),
            (Self::Date, Value::Date(d)) => d.format(DISPLAY_DATE).to_string(),
            (Self::Date, Value::DateTime(dt)) => dt.format(DISPLAY_DATE).to_string(),
            (Self::Minutes, Value::Number(_)) => format!("{value} min"),
            (Self::YesNo, Value::Bool(b)) => if *b { "Yes" } else { "No" }.to_string(),
            (Self::Count, Value::Number(_)) => format!("{value} left"),
            (Self::Upper, Value::Text(s)) => s.replace('_', " ").to_uppercase(),
            _ => value.to_string(),
        }
    }
}

fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-${grouped}.{cents}")
    } else {
        format!("${grouped}.{cents}")
    }
}

/// How a column turns a raw value into display text.
pub enum Renderer<R> {
    Raw,
    Format(Format),
    Custom(fn(&Value, &R) -> String),
}

impl<R> Clone for Renderer<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Renderer<R> {}

/// Semantic colour of a cell, mapped to the theme when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Warn,
    Bad,
    Info,
    Muted,
}

/// Declares how one field of a record is displayed, sorted and filtered.
pub struct ColumnDef<R: Record> {
    pub key: R::Field,
    pub label: &'static str,
    pub render: Renderer<R>,
    pub sortable: bool,
    pub filterable: bool,
    pub width: Constraint,
    pub tone: Option<fn(&Value) -> Tone>,
}

impl<R: Record> Clone for ColumnDef<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            label: self.label,
            render: self.render,
            sortable: self.sortable,
            filterable: self.filterable,
            width: self.width,
            tone: self.tone,
        }
    }
}

impl<R: Record> ColumnDef<R> {
    pub const fn new(key: R::Field, label: &'static str, width: Constraint) -> Self {
        Self {
            key,
            label,
            render: Renderer::Raw,
            sortable: true,
            filterable: false,
            width,
            tone: None,
        }
    }

    pub const fn format(mut self, format: Format) -> Self {
        self.render = Renderer::Format(format);
        self
    }

    pub const fn render_with(mut self, render: fn(&Value, &R) -> String) -> Self {
        self.render = Renderer::Custom(render);
        self
    }

    pub const fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub const fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub const fn tone(mut self, tone: fn(&Value) -> Tone) -> Self {
        self.tone = Some(tone);
        self
    }

    /// Display text for this column of `row`. Missing values render as a dash.
    pub fn display(&self, row: &R) -> String {
        match row.value(self.key) {
            None => "—".to_string(),
            Some(value) => match self.render {
                Renderer::Raw => value.to_string(),
                Renderer::Format(format) => format.apply(&value),
                Renderer::Custom(render) => render(&value, row),
            },
        }
    }

    pub fn tone_of(&self, row: &R) -> Option<Tone> {
        let tone = self.tone?;
        row.value(self.key).map(|v| tone(&v))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A discrete-valued filter control bound to one field.
#[derive(Debug, Clone)]
pub struct FilterDef<K> {
    pub key: K,
    pub label: String,
    pub options: Vec<FilterOption>,
}

impl<K: FieldKey> FilterDef<K> {
    pub fn new(key: K, label: impl Into<String>, options: &[(&str, &str)]) -> Self {
        Self {
            key,
            label: label.into(),
            options: options
                .iter()
                .map(|(value, label)| FilterOption::new(*value, *label))
                .collect(),
        }
    }

    /// Derive a filter from the distinct values present in `rows`.
    pub fn from_rows<R: Record<Field = K>>(key: K, label: &str, rows: &[R]) -> Self {
        let mut values: Vec<String> = rows
            .iter()
            .filter_map(|row| row.value(key))
            .map(|v| v.to_string())
            .filter(|v| !v.is_empty())
            .collect();
        values.sort();
        values.dedup();

        Self {
            key,
            label: label.to_string(),
            options: values
                .into_iter()
                .map(|v| FilterOption::new(v.clone(), v))
                .collect(),
        }
    }

    /// Options as offered by the picker: "All" first, then the declared ones.
    pub fn picker_options(&self) -> Vec<FilterOption> {
        let mut options = vec![FilterOption::new(ALL, "All")];
        options.extend(self.options.iter().filter(|o| o.value != ALL).cloned());
        options
    }

    pub fn label_for(&self, value: &str) -> String {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map_or_else(|| value.to_string(), |o| o.label.clone())
    }
}

/// What a row action asks the page to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RowCommand<K> {
    Edit,
    Delete,
    Update(Patch<K>),
}

/// An action offered for a single row.
pub struct RowAction<R: Record> {
    pub label: &'static str,
    pub show: Option<fn(&R) -> bool>,
    pub run: fn(&R) -> RowCommand<R::Field>,
}

impl<R: Record> Clone for RowAction<R> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            show: self.show,
            run: self.run,
        }
    }
}

impl<R: Record> RowAction<R> {
    pub const fn new(label: &'static str, run: fn(&R) -> RowCommand<R::Field>) -> Self {
        Self {
            label,
            show: None,
            run,
        }
    }

    pub const fn edit() -> Self {
        Self::new("Edit", |_| RowCommand::Edit)
    }

    pub const fn delete() -> Self {
        Self::new("Delete", |_| RowCommand::Delete)
    }

    pub const fn when(mut self, show: fn(&R) -> bool) -> Self {
        self.show = Some(show);
        self
    }

    pub fn is_shown(&self, row: &R) -> bool {
        self.show.is_none_or(|show| show(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_format() {
        assert_eq!(Format::Currency.apply(&Value::Number(1250.0)), "$1,250.00");
        assert_eq!(Format::Currency.apply(&Value::Number(75.5)), "$75.50");
        assert_eq!(Format::Currency.apply(&Value::Number(-1_000_000.0)), "-$1,000,000.00");
    }

    #[test]
    fn test_format_falls_back_to_raw() {
        assert_eq!(Format::Currency.apply(&Value::text("n/a")), "n/a");
        assert_eq!(Format::YesNo.apply(&Value::Bool(false)), "No");
        assert_eq!(Format::Upper.apply(&Value::text("in_progress")), "IN PROGRESS");
    }

    #[test]
    fn test_date_format_drops_time() {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Format::Date.apply(&Value::Date(day)), "Mar 9, 2024");
        let moment = day.and_hms_opt(14, 5, 0).unwrap();
        assert_eq!(Format::Date.apply(&Value::DateTime(moment)), "Mar 9, 2024");
    }
}
