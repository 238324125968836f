use std::collections::BTreeMap;

use crate::browser::ALL;
use crate::record::FieldKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Asc => "▲",
            Self::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K> {
    pub key: K,
    pub direction: SortDirection,
}

/// User-controlled browsing criteria of one table.
///
/// `current_page` is 1-based. Any change to the filters or the search query
/// sends the user back to the first page.
#[derive(Debug, Clone)]
pub struct BrowserState<K: FieldKey> {
    search_query: String,
    current_page: usize,
    sort: Option<Sort<K>>,
    active_filters: BTreeMap<K, String>,
}

impl<K: FieldKey> Default for BrowserState<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: FieldKey> BrowserState<K> {
    pub const fn new() -> Self {
        Self {
            search_query: String::new(),
            current_page: 1,
            sort: None,
            active_filters: BTreeMap::new(),
        }
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    pub const fn sort(&self) -> Option<Sort<K>> {
        self.sort
    }

    pub const fn active_filters(&self) -> &BTreeMap<K, String> {
        &self.active_filters
    }

    pub fn filter_value(&self, key: K) -> &str {
        self.active_filters.get(&key).map_or(ALL, String::as_str)
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.search_query {
            self.search_query = query;
            self.current_page = 1;
        }
    }

    /// Header click on `key`: flip direction on the active column, otherwise
    /// make `key` the sort column in ascending order.
    pub fn toggle_sort(&mut self, key: K) {
        self.sort = Some(match self.sort {
            Some(Sort { key: active, direction }) if active == key => Sort {
                key,
                direction: match direction {
                    SortDirection::Asc => SortDirection::Desc,
                    SortDirection::Desc => SortDirection::Asc,
                },
            },
            _ => Sort {
                key,
                direction: SortDirection::Asc,
            },
        });
    }

    pub fn set_filter(&mut self, key: K, value: impl Into<String>) {
        self.active_filters.insert(key, value.into());
        self.current_page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.active_filters.clear();
        self.current_page = 1;
    }

    /// True when at least one filter actually constrains the rows.
    pub fn has_active_filters(&self) -> bool {
        self.active_filters
            .values()
            .any(|value| !value.is_empty() && value != ALL)
    }

    /// True when a search or a filter narrows the rows.
    pub fn has_criteria(&self) -> bool {
        !self.search_query.is_empty() || self.has_active_filters()
    }

    pub const fn next_page(&mut self, total_pages: usize) {
        if self.current_page < total_pages {
            self.current_page += 1;
        }
    }

    pub const fn previous_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    /// Keep the page in range after the result set shrank.
    pub fn clamp(&mut self, total_pages: usize) {
        self.current_page = self.current_page.min(total_pages.max(1));
    }
}
