//! The search, filter, sort and paginate passes over a cached row set.

use std::cmp::Ordering;

use crate::browser::{ALL, BrowserState, ColumnDef, SortDirection};
use crate::record::Record;
use crate::search::Matcher;

/// A projection of the cached rows for one render.
pub struct BrowserView<'a, R> {
    matched: Vec<&'a R>,
    total: usize,
    current_page: usize,
    page_size: usize,
}

/// Run all four passes in order.
///
/// `columns` decides which fields the search looks at. Filters and sort act
/// on fields directly, so they work for keys without a visible column too.
pub fn derive<'a, R: Record>(
    rows: &'a [R],
    columns: &[ColumnDef<R>],
    state: &BrowserState<R::Field>,
    page_size: usize,
) -> BrowserView<'a, R> {
    let matcher = Matcher::new();
    let query = state.search_query();

    let mut matched: Vec<&R> = rows
        .iter()
        .filter(|row| {
            query.is_empty()
                || columns.iter().any(|column| {
                    row.value(column.key)
                        .is_some_and(|value| matcher.matches(&value.to_string(), query))
                })
        })
        .filter(|row| {
            state
                .active_filters()
                .iter()
                .filter(|(_, wanted)| !wanted.is_empty() && wanted.as_str() != ALL)
                .all(|(key, wanted)| {
                    row.value(*key)
                        .is_some_and(|value| value.equals_option(wanted))
                })
        })
        .collect();

    if let Some(sort) = state.sort() {
        // Rows without a value go last in both directions.
        matched.sort_by(|a, b| match (a.value(sort.key), b.value(sort.key)) {
            (Some(a), Some(b)) => match sort.direction {
                SortDirection::Asc => a.compare(&b),
                SortDirection::Desc => b.compare(&a),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    BrowserView {
        matched,
        total: rows.len(),
        current_page: state.current_page(),
        page_size: page_size.max(1),
    }
}

impl<'a, R> BrowserView<'a, R> {
    /// Every row that passed search and filters, sorted, before pagination.
    pub fn matched(&self) -> &[&'a R] {
        &self.matched
    }

    /// The rows of the current page.
    pub fn page_rows(&self) -> &[&'a R] {
        let start = (self.current_page.saturating_sub(1) * self.page_size).min(self.matched.len());
        let end = (start + self.page_size).min(self.matched.len());
        &self.matched[start..end]
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    #[cfg(test)]
    pub const fn total(&self) -> usize {
        self.total
    }

    #[cfg(test)]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.matched.len().div_ceil(self.page_size)
    }

    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// `Showing X of Y results`, plus `(filtered from Z)` when criteria hid rows.
    pub fn results_line(&self) -> String {
        let shown = self.page_rows().len();
        let matched = self.matched_count();
        if matched == self.total {
            format!("Showing {shown} of {matched} results")
        } else {
            format!(
                "Showing {shown} of {matched} results (filtered from {})",
                self.total
            )
        }
    }

    pub fn pager_line(&self) -> String {
        format!("Page {} of {}", self.current_page, self.total_pages().max(1))
    }
}

#[cfg(test)]
mod tests {
    use ratatui::layout::Constraint;

    use super::*;
    use crate::browser::state::Sort;
    use crate::record::{FieldKey, Patch, Value};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Field {
        Name,
        Status,
        Age,
    }

    impl FieldKey for Field {
        fn name(self) -> &'static str {
            match self {
                Self::Name => "name",
                Self::Status => "status",
                Self::Age => "age",
            }
        }
    }

    #[derive(Debug, Clone)]
    struct Row {
        id: String,
        name: String,
        status: String,
        age: Option<f64>,
    }

    impl Record for Row {
        type Field = Field;

        fn id(&self) -> &str {
            &self.id
        }

        fn value(&self, field: Field) -> Option<Value> {
            match field {
                Field::Name => Some(Value::text(&self.name)),
                Field::Status => Some(Value::text(&self.status)),
                Field::Age => self.age.map(Value::Number),
            }
        }

        fn from_patch(_id: String, _patch: &Patch<Field>) -> color_eyre::Result<Self> {
            unreachable!()
        }

        fn apply(&mut self, _patch: &Patch<Field>) -> color_eyre::Result<()> {
            Ok(())
        }
    }

    fn row(id: usize, name: &str, status: &str, age: Option<f64>) -> Row {
        Row {
            id: format!("r-{id}"),
            name: name.to_string(),
            status: status.to_string(),
            age,
        }
    }

    fn columns() -> Vec<ColumnDef<Row>> {
        vec![
            ColumnDef::new(Field::Name, "Name", Constraint::Min(10)),
            ColumnDef::new(Field::Status, "Status", Constraint::Length(10)),
            ColumnDef::new(Field::Age, "Age", Constraint::Length(5)),
        ]
    }

    fn ids<R: Record>(rows: &[&R]) -> Vec<String> {
        rows.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let rows = vec![
            row(1, "Ann Smith", "active", Some(40.0)),
            row(2, "Bob Jones", "inactive", None),
            row(3, "Joanna Hill", "active", Some(31.0)),
        ];
        let mut state = BrowserState::new();
        state.set_search_query("ANN");

        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(ids(view.matched()), vec!["r-1", "r-3"]);

        state.set_search_query("31");
        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(ids(view.matched()), vec!["r-3"]);
    }

    #[test]
    fn test_search_skips_missing_values() {
        let rows = vec![row(1, "Ann", "active", None)];
        let mut state = BrowserState::new();
        state.set_search_query("none");
        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(view.matched_count(), 0);
    }

    #[test]
    fn test_filters_compose_with_and() {
        let rows = vec![
            row(1, "Ann", "active", Some(30.0)),
            row(2, "Bob", "inactive", Some(30.0)),
            row(3, "Cid", "active", Some(45.0)),
        ];
        let mut state = BrowserState::new();
        state.set_filter(Field::Status, "active");
        state.set_filter(Field::Age, "30");

        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(ids(view.matched()), vec!["r-1"]);
    }

    #[test]
    fn test_all_filter_is_a_no_op() {
        let rows = vec![
            row(1, "Ann", "active", None),
            row(2, "Bob", "inactive", None),
        ];
        let mut state = BrowserState::new();
        state.set_filter(Field::Status, ALL);
        state.set_filter(Field::Name, "");

        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(view.matched_count(), 2);
        assert_eq!(view.results_line(), "Showing 2 of 2 results");
    }

    #[test]
    fn test_filter_is_exact_match() {
        let rows = vec![
            row(1, "Ann", "active", None),
            row(2, "Bob", "inactive", None),
        ];
        let mut state = BrowserState::new();
        state.set_filter(Field::Status, "active");

        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(ids(view.matched()), vec!["r-1"]);
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let rows = vec![
            row(1, "Ann", "b", None),
            row(2, "Bob", "a", None),
            row(3, "Cid", "b", None),
            row(4, "Dee", "a", None),
        ];
        let mut state = BrowserState::new();
        state.toggle_sort(Field::Status);

        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(ids(view.matched()), vec!["r-2", "r-4", "r-1", "r-3"]);

        state.toggle_sort(Field::Status);
        assert_eq!(
            state.sort(),
            Some(Sort { key: Field::Status, direction: SortDirection::Desc })
        );
        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(ids(view.matched()), vec!["r-1", "r-3", "r-2", "r-4"]);
    }

    #[test]
    fn test_sort_numbers_naturally() {
        let rows = vec![
            row(1, "Ann", "x", Some(9.0)),
            row(2, "Bob", "x", Some(10.0)),
            row(3, "Cid", "x", Some(2.0)),
        ];
        let mut state = BrowserState::new();
        state.toggle_sort(Field::Age);
        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(ids(view.matched()), vec!["r-3", "r-1", "r-2"]);
    }

    #[test]
    fn test_sort_puts_missing_values_last_in_both_directions() {
        let rows = vec![
            row(1, "Ann", "x", None),
            row(2, "Bob", "x", Some(10.0)),
            row(3, "Cid", "x", Some(9.0)),
            row(4, "Dee", "x", None),
            row(5, "Eve", "x", Some(2.0)),
            row(6, "Fay", "x", Some(10.0)),
        ];
        let mut state = BrowserState::new();
        state.toggle_sort(Field::Age);
        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(ids(view.matched()), vec!["r-5", "r-3", "r-2", "r-6", "r-1", "r-4"]);

        state.toggle_sort(Field::Age);
        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(ids(view.matched()), vec!["r-2", "r-6", "r-3", "r-5", "r-1", "r-4"]);
    }

    #[test]
    fn test_sort_many_rows_with_gaps_stays_ordered() {
        let rows: Vec<Row> = (0..200)
            .map(|i| {
                let age = (i % 3 != 0).then(|| f64::from(u32::try_from((i * 37) % 101).unwrap()));
                row(i, "n", "s", age)
            })
            .collect();
        let mut state = BrowserState::new();
        state.toggle_sort(Field::Age);

        for descending in [false, true] {
            let view = derive(&rows, &columns(), &state, 10);
            let ages: Vec<Option<f64>> = view.matched().iter().map(|r| r.age).collect();
            let present = ages.iter().take_while(|age| age.is_some()).count();
            assert_eq!(present, rows.iter().filter(|r| r.age.is_some()).count());
            assert!(ages[present..].iter().all(Option::is_none));

            let values: Vec<f64> = ages.iter().flatten().copied().collect();
            assert!(values.windows(2).all(|pair| if descending {
                pair[0] >= pair[1]
            } else {
                pair[0] <= pair[1]
            }));
            state.toggle_sort(Field::Age);
        }
    }

    #[test]
    fn test_pagination_boundaries() {
        let rows: Vec<Row> = (1..=10).map(|i| row(i, "n", "s", None)).collect();
        let mut state = BrowserState::new();

        let view = derive(&rows, &columns(), &state, 3);
        assert_eq!(view.total_pages(), 4);
        assert!(!view.has_previous());
        assert!(view.has_next());
        assert_eq!(ids(view.page_rows()), vec!["r-1", "r-2", "r-3"]);

        state.next_page(view.total_pages());
        state.next_page(view.total_pages());
        let view = derive(&rows, &columns(), &state, 3);
        assert!(view.has_previous());
        assert!(view.has_next());

        state.next_page(view.total_pages());
        let view = derive(&rows, &columns(), &state, 3);
        assert_eq!(view.current_page(), 4);
        assert!(view.has_previous());
        assert!(!view.has_next());
        assert_eq!(ids(view.page_rows()), vec!["r-10"]);
        assert_eq!(view.pager_line(), "Page 4 of 4");
    }

    #[test]
    fn test_results_line_mentions_unfiltered_count() {
        let rows: Vec<Row> = (1..=12)
            .map(|i| row(i, "n", if i % 2 == 0 { "even" } else { "odd" }, None))
            .collect();
        let mut state = BrowserState::new();
        state.set_filter(Field::Status, "even");

        let view = derive(&rows, &columns(), &state, 4);
        assert_eq!(view.results_line(), "Showing 4 of 6 results (filtered from 12)");
    }

    #[test]
    fn test_empty_rows_have_one_page_label() {
        let rows: Vec<Row> = Vec::new();
        let state = BrowserState::new();
        let view = derive(&rows, &columns(), &state, 10);
        assert_eq!(view.total_pages(), 0);
        assert!(!view.has_next());
        assert!(!view.has_previous());
        assert_eq!(view.pager_line(), "Page 1 of 1");
        assert_eq!(view.results_line(), "Showing 0 of 0 results");
    }
}
