use crate::browser::ColumnDef;
use crate::record::{FieldKey, Record};

/// Render `rows` as comma-separated text, one line per record.
///
/// The header line is the column keys. Cells hold raw values, not the
/// display text, and nothing is quoted or escaped: a comma or newline inside
/// a value corrupts that line.
pub fn to_delimited<R: Record>(columns: &[ColumnDef<R>], rows: &[&R]) -> String {
    let mut out = columns
        .iter()
        .map(|c| c.key.name())
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for row in rows {
        let line = columns
            .iter()
            .map(|c| row.value(c.key).map(|v| v.to_string()).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use ratatui::layout::Constraint;

    use super::*;
    use crate::browser::Format;
    use crate::record::{Patch, Value};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Field {
        Item,
        Price,
        Note,
    }

    impl FieldKey for Field {
        fn name(self) -> &'static str {
            match self {
                Self::Item => "item",
                Self::Price => "price",
                Self::Note => "note",
            }
        }
    }

    #[derive(Debug, Clone)]
    struct Line {
        id: String,
        item: String,
        price: f64,
        note: Option<String>,
    }

    impl Record for Line {
        type Field = Field;

        fn id(&self) -> &str {
            &self.id
        }

        fn value(&self, field: Field) -> Option<Value> {
            match field {
                Field::Item => Some(Value::text(&self.item)),
                Field::Price => Some(Value::Number(self.price)),
                Field::Note => self.note.clone().map(Value::Text),
            }
        }

        fn from_patch(_id: String, _patch: &Patch<Field>) -> color_eyre::Result<Self> {
            unreachable!()
        }

        fn apply(&mut self, _patch: &Patch<Field>) -> color_eyre::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_export_uses_raw_values_without_escaping() {
        let columns = vec![
            ColumnDef::new(Field::Item, "Item", Constraint::Min(5)),
            ColumnDef::new(Field::Price, "Price", Constraint::Length(8)).format(Format::Currency),
            ColumnDef::new(Field::Note, "Note", Constraint::Min(5)),
        ];
        let rows = [
            Line {
                id: "1".into(),
                item: "MRI".into(),
                price: 1250.0,
                note: Some("fasting, 4h".into()),
            },
            Line {
                id: "2".into(),
                item: "CBC".into(),
                price: 35.5,
                note: None,
            },
        ];
        let refs: Vec<&Line> = rows.iter().collect();

        let csv = to_delimited(&columns, &refs);
        assert_eq!(csv, "item,price,note\nMRI,1250,fasting, 4h\nCBC,35.5,\n");
    }
}
